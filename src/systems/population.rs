use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Residents leaving per tick once no housing remains.
pub const EVACUATION_PER_TICK: i64 = 5;

pub struct PopulationSystem;

impl PopulationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PopulationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PopulationSystem {
    fn name(&self) -> &str {
        "population"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let ledger = &world.ledger;
        world.stats.population = next_population(
            world.stats.population,
            ledger.population_growth,
            ledger.death_toll,
            ledger.residential,
            ledger.max_population,
        );
        Ok(())
    }
}

/// Growth minus deaths, bounded by housing. Without any housing the colony
/// evacuates at a flat rate instead of being cut to zero at once.
pub fn next_population(
    previous: i64,
    growth: i64,
    deaths: i64,
    residential: u32,
    max_population: i64,
) -> i64 {
    if residential == 0 && previous > 0 {
        return (previous - deaths - EVACUATION_PER_TICK).max(0);
    }
    (previous + growth - deaths).clamp(0, max_population.max(0))
}
