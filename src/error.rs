use thiserror::Error;

use crate::catalog::BuildingKind;

/// Rejections of player (and auto-builder) actions. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{0:?} has not been unlocked yet")]
    Locked(BuildingKind),
    #[error("cannot build {0:?}")]
    NotBuildable(BuildingKind),
    #[error("footprint at ({x}, {y}) does not fit on the map")]
    OutOfBounds { x: usize, y: usize },
    #[error("tile ({x}, {y}) is already occupied")]
    Occupied { x: usize, y: usize },
    #[error("terrain under ({x}, {y}) is not flat")]
    UnevenTerrain { x: usize, y: usize },
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("nothing to demolish at ({x}, {y})")]
    NothingToDemolish { x: usize, y: usize },
    #[error("unknown technology '{0}'")]
    UnknownTech(String),
    #[error("technology '{tech}' requires '{missing}' first")]
    MissingPrerequisite { tech: String, missing: String },
    #[error("insufficient science: need {needed}, have {available}")]
    InsufficientScience { needed: i64, available: i64 },
    #[error("no goal is active")]
    NoActiveGoal,
    #[error("the current goal is not complete")]
    GoalIncomplete,
    #[error("the colony has been stopped")]
    Stopped,
}
