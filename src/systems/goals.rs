use anyhow::Result;
use tracing::info;

use crate::{
    engine::{System, SystemContext},
    news::Sentiment,
    rng::SystemRng,
    world::World,
};

/// Marks the active goal complete once its metric reaches the target.
/// The reward waits for an explicit claim.
pub struct GoalSystem;

impl GoalSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoalSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for GoalSystem {
    fn name(&self) -> &str {
        "goals"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.ledger.goal_completed = false;
        let Some(goal) = world.goal.as_mut() else {
            return Ok(());
        };
        if goal.completed || !goal.is_met(&world.stats, &world.ledger.building_counts) {
            return Ok(());
        }
        goal.completed = true;
        let text = format!("Directive complete: {}. Claim the reward.", goal.description);
        world.ledger.goal_completed = true;
        let day = world.stats.day;
        world.news.push(day, text, Sentiment::Positive);
        info!(day, "goal completed");
        Ok(())
    }
}
