//! Property tests for the grid, the tick pipeline and the auto-builder.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sol_colony::{
    catalog::{BuildingKind, RESIDENTIAL_CAPACITY},
    config::Variant,
    engine::{Engine, EngineBuilder, EngineSettings},
    grid::MapSize,
    placement,
    systems::{
        auto_build::attempt_auto_build,
        census::{census, power_ratio},
    },
    world::{World, CO2_FLOOR},
};

const BUILDABLE: [BuildingKind; 7] = [
    BuildingKind::Road,
    BuildingKind::Habitat,
    BuildingKind::SolarArray,
    BuildingKind::CombustionGenerator,
    BuildingKind::Hydroponics,
    BuildingKind::OxygenGenerator,
    BuildingKind::ResearchLab,
];

fn engine(seed: u64) -> Engine {
    EngineBuilder::new(EngineSettings {
        colony_name: "props".into(),
        seed,
    })
    .with_standard_systems()
    .build()
}

fn kind_strategy() -> impl Strategy<Value = BuildingKind> {
    (0..BUILDABLE.len()).prop_map(|index| BUILDABLE[index])
}

fn placements() -> impl Strategy<Value = Vec<(BuildingKind, usize, usize)>> {
    prop::collection::vec((kind_strategy(), 0usize..16, 0usize..16), 0..30)
}

fn variant_strategy() -> impl Strategy<Value = Variant> {
    prop_oneof![Just(Variant::Basic), Just(Variant::Extended)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn placed_footprints_are_complete(
        seed in any::<u64>(),
        variant in variant_strategy(),
        kind in kind_strategy(),
        x in 0usize..16,
        y in 0usize..16,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut world = World::new(MapSize::new(16).unwrap(), variant, 5_000, &mut rng);
        if let Ok(placed) = placement::place_building(&mut world, kind, x, y, &mut rng) {
            let config = kind.config();
            prop_assert_eq!(
                world.grid().tiles_rooted_at(placed.origin),
                config.width * config.height
            );
            let rooted: Vec<_> = world
                .grid()
                .tiles()
                .filter(|tile| tile.is_occupied() && tile.root() == placed.origin)
                .collect();
            prop_assert!(rooted.iter().all(|tile| tile.kind == kind));
            let height = rooted[0].height;
            prop_assert!(rooted.iter().all(|tile| tile.height == height));
        }
    }

    #[test]
    fn census_matches_placed_buildings(
        seed in any::<u64>(),
        requests in placements(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut world = World::new(MapSize::new(16).unwrap(), Variant::Basic, 1_000_000, &mut rng);
        let mut placed = Vec::new();
        for (kind, x, y) in requests {
            if let Ok(placement) = placement::place_building(&mut world, kind, x, y, &mut rng) {
                placed.push(placement);
            }
        }

        let ledger = census(world.grid());
        let generated: i64 = placed.iter().map(|p| p.kind.config().power.max(0)).sum();
        let drained: i64 = placed.iter().map(|p| (-p.kind.config().power).max(0)).sum();
        let raw_income: i64 = placed.iter().map(|p| p.kind.config().income).sum();

        prop_assert_eq!(ledger.buildings as usize, placed.len());
        prop_assert_eq!(ledger.power_generated, generated);
        prop_assert_eq!(ledger.power_drain, drained);
        prop_assert!((0.0..=1.0).contains(&ledger.power_ratio));
        prop_assert_eq!(ledger.power_ratio, power_ratio(generated, drained));
        prop_assert!(ledger.income <= raw_income);
        for kind in BUILDABLE {
            let expected = placed.iter().filter(|p| p.kind == kind).count() as u32;
            prop_assert_eq!(ledger.count(kind), expected);
        }
    }

    #[test]
    fn ratio_is_one_without_drain(generated in 0i64..10_000) {
        prop_assert_eq!(power_ratio(generated, 0), 1.0);
    }

    #[test]
    fn ticks_keep_stats_in_bounds(
        seed in any::<u64>(),
        variant in variant_strategy(),
        population in 0i64..2_000,
        requests in placements(),
        ticks in 1u64..25,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut world = World::new(MapSize::new(16).unwrap(), variant, 20_000, &mut rng);
        for (kind, x, y) in requests {
            let _ = placement::place_building(&mut world, kind, x, y, &mut rng);
        }
        world.stats_mut().population = population;
        let mut engine = engine(seed);

        for _ in 0..ticks {
            let before = world.stats().population;
            engine.tick(&mut world).unwrap();
            let stats = world.stats();
            let ledger = world.ledger();

            prop_assert!(stats.population >= 0);
            if ledger.residential > 0 {
                prop_assert!(stats.population <= i64::from(ledger.residential) * RESIDENTIAL_CAPACITY);
            } else {
                prop_assert!(stats.population <= before);
            }
            prop_assert!((0.0..=1.0).contains(&ledger.power_ratio));
            if variant == Variant::Extended {
                prop_assert!((0.0..=100.0).contains(&stats.oxygen));
                prop_assert!(stats.co2 >= CO2_FLOOR);
                prop_assert!(stats.food >= 0.0);
            }
        }
    }

    #[test]
    fn auto_builder_never_overspends(
        seed in any::<u64>(),
        variant in variant_strategy(),
        money in 0i64..4_000,
        attempts in 1usize..15,
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut world = World::new(MapSize::new(16).unwrap(), variant, money, &mut rng);
        for _ in 0..attempts {
            let before = world.stats().money;
            let occupied_before = world.grid().occupied().count();
            match attempt_auto_build(&mut world, &mut rng) {
                Some(placed) => {
                    let config = placed.kind.config();
                    prop_assert!(placed.cost <= before);
                    prop_assert_eq!(world.stats().money, before - placed.cost);
                    prop_assert_eq!(
                        world.grid().occupied().count(),
                        occupied_before + config.width * config.height
                    );
                    prop_assert_eq!(
                        world.grid().tiles_rooted_at(placed.origin),
                        config.width * config.height
                    );
                }
                None => {
                    prop_assert_eq!(world.stats().money, before);
                    prop_assert_eq!(world.grid().occupied().count(), occupied_before);
                }
            }
            prop_assert!(world.stats().money >= 0);
        }
    }
}
