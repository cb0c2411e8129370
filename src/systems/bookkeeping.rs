use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{World, CO2_FLOOR},
};

pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let stats = &mut world.stats;
        stats.population = stats.population.max(0);
        stats.oxygen = stats.oxygen.clamp(0.0, 100.0);
        stats.co2 = stats.co2.max(CO2_FLOOR);
        stats.food = stats.food.max(0.0);
        world.push_history();
        Ok(())
    }
}
