//! Placement validation and the only code paths that mutate grid footprints

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{catalog::BuildingKind, error::ActionError, grid::Grid, world::World};

/// Flat fee for tearing down any building, whatever its size.
pub const DEMOLISH_FEE: i64 = 25;

/// Number of cosmetic variants a renderer may pick from.
pub const VARIANT_COUNT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: BuildingKind,
    pub origin: (usize, usize),
    pub cost: i64,
    pub variant: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demolition {
    pub kind: BuildingKind,
    pub origin: (usize, usize),
    pub fee: i64,
}

/// Paving a plain road into its green variant is allowed over the road itself.
fn is_upgrade(existing: BuildingKind, incoming: BuildingKind) -> bool {
    existing == BuildingKind::Road && incoming == BuildingKind::GreenRoad
}

/// Checks bounds, occupancy and terrain flatness for a footprint.
pub fn check_site(
    grid: &Grid,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    kind: BuildingKind,
) -> Result<(), ActionError> {
    if !grid.footprint_in_bounds(x, y, width, height) {
        return Err(ActionError::OutOfBounds { x, y });
    }
    let origin_height = grid.tile(x, y).and_then(|tile| tile.height);
    for tile in grid.footprint(x, y, width, height) {
        if tile.is_occupied() && !is_upgrade(tile.kind, kind) {
            return Err(ActionError::Occupied {
                x: tile.x,
                y: tile.y,
            });
        }
        if tile.height != origin_height {
            return Err(ActionError::UnevenTerrain {
                x: tile.x,
                y: tile.y,
            });
        }
    }
    Ok(())
}

pub fn can_place(
    grid: &Grid,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    kind: BuildingKind,
) -> bool {
    check_site(grid, x, y, width, height, kind).is_ok()
}

/// Full player-facing validation: unlock state, site and funds.
pub fn validate(world: &World, kind: BuildingKind, x: usize, y: usize) -> Result<(), ActionError> {
    if kind.is_empty() {
        return Err(ActionError::NotBuildable(kind));
    }
    if !world.is_unlocked(kind) {
        return Err(ActionError::Locked(kind));
    }
    let config = kind.config();
    check_site(&world.grid, x, y, config.width, config.height, kind)?;
    if world.stats.money < config.cost {
        return Err(ActionError::InsufficientFunds {
            needed: config.cost,
            available: world.stats.money,
        });
    }
    Ok(())
}

pub fn place_building(
    world: &mut World,
    kind: BuildingKind,
    x: usize,
    y: usize,
    rng: &mut impl RngCore,
) -> Result<Placement, ActionError> {
    if let Err(err) = validate(world, kind, x, y) {
        debug!(?kind, x, y, %err, "placement rejected");
        return Err(err);
    }
    Ok(commit(world, kind, x, y, rng))
}

/// Writes an already validated building and debits its cost.
pub(crate) fn commit(
    world: &mut World,
    kind: BuildingKind,
    x: usize,
    y: usize,
    rng: &mut impl RngCore,
) -> Placement {
    let config = kind.config();
    let variant = rng.gen_range(0..VARIANT_COUNT);
    world
        .grid
        .apply_footprint(x, y, config.width, config.height, kind, variant);
    world.stats.money -= config.cost;
    debug!(?kind, x, y, cost = config.cost, "building placed");
    Placement {
        kind,
        origin: (x, y),
        cost: config.cost,
        variant,
    }
}

pub fn demolish(world: &mut World, x: usize, y: usize) -> Result<Demolition, ActionError> {
    let tile = world
        .grid
        .tile(x, y)
        .ok_or(ActionError::OutOfBounds { x, y })?;
    if !tile.is_occupied() {
        return Err(ActionError::NothingToDemolish { x, y });
    }
    let (root_x, root_y) = tile.root();
    if world.stats.money < DEMOLISH_FEE {
        return Err(ActionError::InsufficientFunds {
            needed: DEMOLISH_FEE,
            available: world.stats.money,
        });
    }
    let kind = world
        .grid
        .tile(root_x, root_y)
        .map(|root| root.kind)
        .unwrap_or(tile.kind);
    let config = kind.config();
    world
        .grid
        .clear_footprint(root_x, root_y, config.width, config.height);
    world.stats.money -= DEMOLISH_FEE;
    debug!(?kind, x = root_x, y = root_y, "building demolished");
    Ok(Demolition {
        kind,
        origin: (root_x, root_y),
        fee: DEMOLISH_FEE,
    })
}
