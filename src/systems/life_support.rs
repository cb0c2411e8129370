use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{CityStats, TickLedger, World, BASELINE_CO2, BASELINE_OXYGEN, CO2_FLOOR},
};

pub const FOOD_PER_CAPITA: f64 = 0.1;
pub const OXYGEN_PER_CAPITA: f64 = 0.05;
/// ppm added per resident per tick.
pub const CO2_PER_CAPITA: f64 = 0.2;

pub const STARVATION_DEATH_RATE: f64 = 0.10;
pub const SUFFOCATION_THRESHOLD: f64 = 10.0;
pub const SUFFOCATION_DEATH_RATE: f64 = 0.05;
pub const ASPHYXIATION_THRESHOLD: f64 = 5.0;
pub const ASPHYXIATION_DEATH_RATE: f64 = 0.20;
pub const CO2_TOXIC_PPM: f64 = 2_000.0;
pub const CO2_DEATH_RATE: f64 = 0.02;

/// Food, oxygen and CO2 balances plus the deaths they cause. Extended variant only.
pub struct LifeSupportSystem;

impl LifeSupportSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LifeSupportSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for LifeSupportSystem {
    fn name(&self) -> &str {
        "life_support"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !ctx.variant.has_life_support() {
            world.ledger.starvation = 0.0;
            world.ledger.death_toll = 0;
            return Ok(());
        }
        let outcome = simulate(&world.stats, &world.ledger);
        world.stats.food = outcome.food;
        world.stats.oxygen = outcome.oxygen;
        world.stats.co2 = outcome.co2;
        world.ledger.starvation = outcome.starvation;
        world.ledger.death_toll = outcome.death_toll;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmosphere {
    pub food: f64,
    pub oxygen: f64,
    pub co2: f64,
    pub starvation: f64,
    pub death_toll: i64,
}

pub fn simulate(stats: &CityStats, ledger: &TickLedger) -> Atmosphere {
    let population = stats.population.max(0) as f64;

    let food_balance = stats.food + ledger.food as f64 - population * FOOD_PER_CAPITA;
    let (food, starvation) = if food_balance < 0.0 {
        (0.0, -food_balance)
    } else {
        (food_balance, 0.0)
    };

    let mut oxygen =
        (stats.oxygen + ledger.oxygen - population * OXYGEN_PER_CAPITA).clamp(0.0, 100.0);
    let mut co2 = (stats.co2 + population * CO2_PER_CAPITA + ledger.co2).max(CO2_FLOOR);
    if stats.population == 0 && ledger.buildings == 0 {
        oxygen = BASELINE_OXYGEN;
        co2 = BASELINE_CO2;
    }

    Atmosphere {
        food,
        oxygen,
        co2,
        starvation,
        death_toll: death_toll(stats.population, starvation, oxygen, co2),
    }
}

/// Sum of the three independent causes, each floored on its own.
pub fn death_toll(population: i64, starvation: f64, oxygen: f64, co2: f64) -> i64 {
    let population = population.max(0) as f64;
    let starved = (starvation * STARVATION_DEATH_RATE).floor();
    let suffocated = if oxygen < ASPHYXIATION_THRESHOLD {
        (population * ASPHYXIATION_DEATH_RATE).floor()
    } else if oxygen < SUFFOCATION_THRESHOLD {
        (population * SUFFOCATION_DEATH_RATE).floor()
    } else {
        0.0
    };
    let poisoned = if co2 > CO2_TOXIC_PPM {
        (population * CO2_DEATH_RATE).floor()
    } else {
        0.0
    };
    (starved + suffocated + poisoned) as i64
}
