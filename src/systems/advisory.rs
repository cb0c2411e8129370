use anyhow::Result;
use rand::Rng;

use crate::{
    engine::{System, SystemContext},
    news::Sentiment,
    rng::SystemRng,
    world::World,
};

/// Chance that a qualifying hazard produces a warning in a given tick.
pub const WARNING_CHANCE: f64 = 0.15;
/// Chance that a tick with deaths produces an alert.
pub const DEATH_ALERT_CHANCE: f64 = 0.35;
pub const CO2_WARNING_PPM: f64 = 1_500.0;
pub const OXYGEN_WARNING: f64 = 20.0;

/// Turns hazardous conditions into occasional news warnings.
pub struct AdvisorySystem;

impl AdvisorySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AdvisorySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AdvisorySystem {
    fn name(&self) -> &str {
        "advisory"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let day = world.stats.day;
        let mut warnings = Vec::new();

        if world.ledger.low_power && rng.gen_bool(WARNING_CHANCE) {
            warnings.push(format!(
                "Brownout: power grid at {:.0}% of demand.",
                world.ledger.power_ratio * 100.0
            ));
        }
        if ctx.variant.has_life_support() {
            if world.stats.co2 > CO2_WARNING_PPM && rng.gen_bool(WARNING_CHANCE) {
                warnings.push(format!(
                    "CO2 levels climbing: {:.0} ppm inside the dome.",
                    world.stats.co2
                ));
            }
            if world.stats.oxygen < OXYGEN_WARNING && rng.gen_bool(WARNING_CHANCE) {
                warnings.push(format!(
                    "Oxygen reserves critical at {:.1}%.",
                    world.stats.oxygen
                ));
            }
            if world.ledger.starvation > 0.0 && rng.gen_bool(WARNING_CHANCE) {
                warnings.push("Food stores are empty. Colonists are going hungry.".to_string());
            }
        }
        for text in warnings {
            world.news.push(day, text, Sentiment::Negative);
        }

        let deaths = world.ledger.death_toll;
        if deaths > 0 && rng.gen_bool(DEATH_ALERT_CHANCE) {
            world.news.push(
                day,
                format!("Tragedy: {deaths} colonists lost this sol."),
                Sentiment::Negative,
            );
        }
        Ok(())
    }
}
