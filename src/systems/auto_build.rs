//! Auto-builder - places at most one structure per tick when enabled
//!
//! Rules are checked in priority order and the first one that names a kind
//! wins: life support, power, housing, then a random productive pick.

use std::f64::consts::TAU;

use anyhow::Result;
use rand::{seq::SliceRandom, Rng, RngCore};
use tracing::debug;

use crate::{
    catalog::BuildingKind,
    config::Variant,
    engine::{System, SystemContext},
    placement::{self, Placement},
    rng::SystemRng,
    world::World,
};

/// Money that must remain above before the auto-builder spends anything.
pub const SAFETY_BUFFER: i64 = 200;
pub const SITE_ATTEMPTS: usize = 20;
pub const LOW_OXYGEN: f64 = 30.0;
/// Food stock per resident below which life support takes priority.
pub const FOOD_PER_RESIDENT_RESERVE: f64 = 0.5;
pub const POWER_UTILIZATION_LIMIT: f64 = 0.85;
pub const HOUSING_PRESSURE_LIMIT: f64 = 0.8;
pub const RESEARCH_LAB_CHANCE: f64 = 0.35;

pub struct AutoBuildSystem;

impl AutoBuildSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AutoBuildSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AutoBuildSystem {
    fn name(&self) -> &str {
        "auto_build"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world.ledger.auto_built = None;
        if world.auto_build {
            world.ledger.auto_built = attempt_auto_build(world, rng);
        }
        Ok(())
    }
}

/// Picks a kind and a site and builds it. Returns `None` when nothing was built.
pub fn attempt_auto_build(world: &mut World, rng: &mut impl RngCore) -> Option<Placement> {
    if world.stats.money <= SAFETY_BUFFER {
        return None;
    }
    let kind = choose_kind(world, rng)?;
    if kind.config().cost > world.stats.money {
        debug!(?kind, "auto-build cannot afford its pick");
        return None;
    }
    let (x, y) = find_site(world, kind, rng)?;
    let placement = placement::commit(world, kind, x, y, rng);
    debug!(?kind, x, y, "auto-build placed");
    Some(placement)
}

pub fn choose_kind(world: &World, rng: &mut impl RngCore) -> Option<BuildingKind> {
    life_support_pick(world)
        .or_else(|| power_pick(world))
        .or_else(|| housing_pick(world))
        .or_else(|| economic_pick(world, rng))
}

fn life_support_pick(world: &World) -> Option<BuildingKind> {
    if !world.variant.has_life_support() {
        return None;
    }
    let stats = &world.stats;
    let hungry = stats.food < stats.population as f64 * FOOD_PER_RESIDENT_RESERVE;
    if stats.oxygen >= LOW_OXYGEN && !hungry {
        return None;
    }
    [BuildingKind::Hydroponics, BuildingKind::OxygenGenerator]
        .into_iter()
        .find(|kind| world.is_unlocked(*kind))
}

fn power_pick(world: &World) -> Option<BuildingKind> {
    let stats = &world.stats;
    let utilization = if stats.power_supply > 0 {
        stats.power_demand as f64 / stats.power_supply as f64
    } else if stats.power_demand > 0 {
        f64::INFINITY
    } else {
        0.0
    };
    if utilization <= POWER_UTILIZATION_LIMIT {
        return None;
    }
    let mut producers: Vec<BuildingKind> = world
        .unlocked_kinds
        .iter()
        .copied()
        .filter(|kind| kind.is_power_producer())
        .collect();
    producers.sort_by_key(|kind| std::cmp::Reverse(kind.config().power));
    producers
        .iter()
        .copied()
        .find(|kind| kind.config().cost <= stats.money)
        .or_else(|| producers.iter().copied().min_by_key(|kind| kind.config().cost))
}

fn housing_pick(world: &World) -> Option<BuildingKind> {
    if !world.is_unlocked(BuildingKind::Habitat) {
        return None;
    }
    let capacity = world.ledger.max_population;
    let pressure = if capacity > 0 {
        world.stats.population as f64 / capacity as f64
    } else {
        1.0
    };
    (pressure > HOUSING_PRESSURE_LIMIT).then_some(BuildingKind::Habitat)
}

fn economic_pick(world: &World, rng: &mut impl RngCore) -> Option<BuildingKind> {
    let money = world.stats.money;
    let mut candidates = Vec::new();
    for kind in world.unlocked_kinds.iter().copied() {
        let cost = kind.config().cost;
        let include = match kind {
            BuildingKind::None | BuildingKind::Road | BuildingKind::GreenRoad => false,
            BuildingKind::Spaceport => money >= cost * 2,
            BuildingKind::FusionReactor => money >= cost + SAFETY_BUFFER,
            BuildingKind::ResearchLab => rng.gen_bool(RESEARCH_LAB_CHANCE),
            _ => true,
        };
        if include {
            candidates.push(kind);
        }
    }
    candidates.choose(rng).copied()
}

/// Samples candidate origins and returns the first that passes player validation.
pub fn find_site(
    world: &World,
    kind: BuildingKind,
    rng: &mut impl RngCore,
) -> Option<(usize, usize)> {
    let size = world.grid.size();
    match world.variant {
        Variant::Basic => (0..SITE_ATTEMPTS)
            .map(|_| (rng.gen_range(0..size), rng.gen_range(0..size)))
            .find(|&(x, y)| placement::validate(world, kind, x, y).is_ok()),
        Variant::Extended => {
            let occupied: Vec<(usize, usize)> =
                world.grid.occupied().map(|tile| (tile.x, tile.y)).collect();
            let hub = occupied
                .choose(rng)
                .copied()
                .unwrap_or((size / 2, size / 2));
            (0..SITE_ATTEMPTS).find_map(|attempt| {
                let angle = rng.gen_range(0.0..TAU);
                let distance = 2.0 + attempt as f64 * 0.5 + rng.gen_range(0.0..2.0);
                let x = (hub.0 as f64 + angle.cos() * distance).round();
                let y = (hub.1 as f64 + angle.sin() * distance).round();
                if x < 0.0 || y < 0.0 {
                    return None;
                }
                let (x, y) = (x as usize, y as usize);
                placement::validate(world, kind, x, y)
                    .is_ok()
                    .then_some((x, y))
            })
        }
    }
}
