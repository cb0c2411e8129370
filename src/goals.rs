//! Goal state machine: active -> completed -> claimed

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    catalog::BuildingKind,
    error::ActionError,
    news::Sentiment,
    world::{CityStats, World},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalMetric {
    Population,
    Money,
    Science,
    BuildingCount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiGoal {
    pub description: String,
    #[serde(rename = "target_type")]
    pub metric: GoalMetric,
    pub target_value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_kind: Option<BuildingKind>,
    pub reward: i64,
    #[serde(default)]
    pub completed: bool,
}

impl AiGoal {
    /// A building qualifier is required for building counts and forbidden otherwise.
    pub fn is_well_formed(&self) -> bool {
        let qualifier_ok = match self.metric {
            GoalMetric::BuildingCount => self
                .building_kind
                .is_some_and(|kind| !kind.is_empty()),
            _ => self.building_kind.is_none(),
        };
        qualifier_ok && self.target_value > 0 && self.reward >= 0 && !self.completed
    }

    pub fn current_value(&self, stats: &CityStats, counts: &BTreeMap<BuildingKind, u32>) -> i64 {
        match self.metric {
            GoalMetric::Population => stats.population,
            GoalMetric::Money => stats.money,
            GoalMetric::Science => stats.science,
            GoalMetric::BuildingCount => self
                .building_kind
                .and_then(|kind| counts.get(&kind))
                .map(|count| i64::from(*count))
                .unwrap_or(0),
        }
    }

    pub fn is_met(&self, stats: &CityStats, counts: &BTreeMap<BuildingKind, u32>) -> bool {
        self.current_value(stats, counts) >= self.target_value
    }
}

/// Credits the reward of a completed goal and clears it.
pub fn claim_goal(world: &mut World) -> Result<i64, ActionError> {
    let goal = world.goal.as_ref().ok_or(ActionError::NoActiveGoal)?;
    if !goal.completed {
        return Err(ActionError::GoalIncomplete);
    }
    let reward = goal.reward;
    let description = goal.description.clone();
    world.goal = None;
    world.goals_claimed += 1;
    world.stats.money += reward;
    let day = world.stats.day;
    world.news.push(
        day,
        format!("Directive fulfilled: {description}. {reward} credits received."),
        Sentiment::Positive,
    );
    info!(reward, "goal reward claimed");
    Ok(reward)
}
