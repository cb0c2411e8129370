use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Books the tick's income and science and advances the sol counter.
pub struct TreasurySystem;

impl TreasurySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TreasurySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TreasurySystem {
    fn name(&self) -> &str {
        "treasury"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.stats.money += world.ledger.income;
        world.stats.science += world.ledger.science;
        world.stats.day += 1;
        Ok(())
    }
}
