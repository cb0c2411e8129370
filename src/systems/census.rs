use std::collections::HashSet;

use anyhow::Result;

use crate::{
    catalog::RESIDENTIAL_CAPACITY,
    engine::{System, SystemContext},
    grid::Grid,
    rng::SystemRng,
    world::{TickLedger, World},
};

/// Aggregates every building's yields once per footprint and applies the
/// power-shortage penalty.
pub struct CensusSystem;

impl CensusSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CensusSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CensusSystem {
    fn name(&self) -> &str {
        "census"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let ledger = census(&world.grid);
        world.stats.power_supply = ledger.power_generated;
        world.stats.power_demand = ledger.power_drain;
        world.ledger = ledger;
        Ok(())
    }
}

/// Share of demand that supply covers, capped at 1. No demand means no shortage.
pub fn power_ratio(generated: i64, drain: i64) -> f64 {
    if drain > 0 {
        (generated as f64 / drain as f64).min(1.0)
    } else {
        1.0
    }
}

/// Throttles a yield by the power ratio, flooring the result.
pub fn throttle(value: i64, ratio: f64) -> i64 {
    (value as f64 * ratio).floor() as i64
}

pub fn census(grid: &Grid) -> TickLedger {
    let mut ledger = TickLedger::default();
    let mut seen = HashSet::new();
    let mut oxygen = 0.0;
    let mut co2 = 0.0;

    for tile in grid.occupied() {
        let root = tile.root();
        if !seen.insert(root) {
            continue;
        }
        let kind = grid
            .tile(root.0, root.1)
            .map(|root_tile| root_tile.kind)
            .filter(|kind| !kind.is_empty())
            .unwrap_or(tile.kind);
        let config = kind.config();

        if config.power >= 0 {
            ledger.power_generated += config.power;
        } else {
            ledger.power_drain += -config.power;
        }
        ledger.income += config.income;
        ledger.population_growth += config.population_growth;
        ledger.science += config.science;
        ledger.food += config.food;
        oxygen += config.oxygen;
        co2 += config.co2;

        *ledger.building_counts.entry(kind).or_insert(0) += 1;
        ledger.buildings += 1;
        if kind.is_residential() {
            ledger.residential += 1;
        }
    }

    ledger.power_ratio = power_ratio(ledger.power_generated, ledger.power_drain);
    ledger.low_power = ledger.power_ratio < 1.0;
    if ledger.low_power {
        ledger.income = throttle(ledger.income, ledger.power_ratio);
        ledger.science = throttle(ledger.science, ledger.power_ratio);
        ledger.food = throttle(ledger.food, ledger.power_ratio);
        ledger.population_growth = 0;
        // oxygen is scaled without flooring
        oxygen *= ledger.power_ratio;
    }
    ledger.oxygen = oxygen;
    ledger.co2 = co2;
    ledger.max_population = i64::from(ledger.residential) * RESIDENTIAL_CAPACITY;
    ledger
}
