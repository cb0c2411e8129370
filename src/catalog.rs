use serde::{Deserialize, Serialize};

/// Every structure the colony can hold. `None` marks an empty tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    None,
    Road,
    GreenRoad,
    Habitat,
    SolarArray,
    CombustionGenerator,
    FusionReactor,
    Hydroponics,
    OxygenGenerator,
    TradeHub,
    ResearchLab,
    MiningRig,
    Spaceport,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 13] = [
        BuildingKind::None,
        BuildingKind::Road,
        BuildingKind::GreenRoad,
        BuildingKind::Habitat,
        BuildingKind::SolarArray,
        BuildingKind::CombustionGenerator,
        BuildingKind::FusionReactor,
        BuildingKind::Hydroponics,
        BuildingKind::OxygenGenerator,
        BuildingKind::TradeHub,
        BuildingKind::ResearchLab,
        BuildingKind::MiningRig,
        BuildingKind::Spaceport,
    ];

    pub fn config(self) -> &'static BuildingConfig {
        config(self)
    }

    pub fn is_residential(self) -> bool {
        matches!(self, BuildingKind::Habitat)
    }

    pub fn is_power_producer(self) -> bool {
        self.config().power > 0
    }

    pub fn is_empty(self) -> bool {
        self == BuildingKind::None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildingConfig {
    pub kind: BuildingKind,
    pub display: &'static str,
    pub cost: i64,
    pub width: usize,
    pub height: usize,
    pub population_growth: i64,
    pub income: i64,
    pub science: i64,
    /// Positive values produce power, negative values consume it.
    pub power: i64,
    pub food: i64,
    pub oxygen: f64,
    /// Negative values scrub CO2 from the dome.
    pub co2: f64,
}

/// Residents housed by one residential building.
pub const RESIDENTIAL_CAPACITY: i64 = 50;

const fn empty(kind: BuildingKind, display: &'static str) -> BuildingConfig {
    BuildingConfig {
        kind,
        display,
        cost: 0,
        width: 1,
        height: 1,
        population_growth: 0,
        income: 0,
        science: 0,
        power: 0,
        food: 0,
        oxygen: 0.0,
        co2: 0.0,
    }
}

const CATALOG: &[BuildingConfig] = &[
    empty(BuildingKind::None, "Empty"),
    BuildingConfig {
        cost: 15,
        ..empty(BuildingKind::Road, "Road")
    },
    BuildingConfig {
        cost: 40,
        oxygen: 0.2,
        co2: -1.0,
        ..empty(BuildingKind::GreenRoad, "Green Walkway")
    },
    BuildingConfig {
        cost: 150,
        population_growth: 2,
        income: 2,
        power: -5,
        ..empty(BuildingKind::Habitat, "Habitation Module")
    },
    BuildingConfig {
        cost: 120,
        width: 2,
        height: 2,
        power: 20,
        ..empty(BuildingKind::SolarArray, "Solar Array")
    },
    BuildingConfig {
        cost: 60,
        power: 10,
        co2: 3.0,
        ..empty(BuildingKind::CombustionGenerator, "Combustion Generator")
    },
    BuildingConfig {
        cost: 900,
        width: 3,
        height: 3,
        power: 120,
        science: 1,
        ..empty(BuildingKind::FusionReactor, "Fusion Reactor")
    },
    BuildingConfig {
        cost: 200,
        width: 2,
        height: 1,
        power: -8,
        food: 12,
        oxygen: 1.5,
        co2: -15.0,
        ..empty(BuildingKind::Hydroponics, "Hydroponics Bay")
    },
    BuildingConfig {
        cost: 250,
        power: -12,
        oxygen: 4.0,
        co2: -5.0,
        ..empty(BuildingKind::OxygenGenerator, "Oxygen Generator")
    },
    BuildingConfig {
        cost: 200,
        width: 2,
        height: 2,
        income: 10,
        power: -10,
        ..empty(BuildingKind::TradeHub, "Trade Hub")
    },
    BuildingConfig {
        cost: 400,
        width: 2,
        height: 2,
        science: 5,
        power: -15,
        ..empty(BuildingKind::ResearchLab, "Research Lab")
    },
    BuildingConfig {
        cost: 350,
        width: 2,
        height: 2,
        income: 45,
        power: -20,
        co2: 4.0,
        ..empty(BuildingKind::MiningRig, "Mining Rig")
    },
    BuildingConfig {
        cost: 2_500,
        width: 3,
        height: 3,
        income: 150,
        science: 2,
        power: -40,
        ..empty(BuildingKind::Spaceport, "Spaceport")
    },
];

pub fn config(kind: BuildingKind) -> &'static BuildingConfig {
    CATALOG
        .iter()
        .find(|entry| entry.kind == kind)
        .unwrap_or(&CATALOG[0])
}

pub fn all() -> &'static [BuildingConfig] {
    CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_exactly_one_entry() {
        for kind in BuildingKind::ALL {
            let matches = CATALOG.iter().filter(|entry| entry.kind == kind).count();
            assert_eq!(matches, 1, "{kind:?} should appear once");
        }
    }

    #[test]
    fn footprints_are_never_empty() {
        for entry in all() {
            assert!(entry.width >= 1 && entry.height >= 1, "{:?}", entry.kind);
        }
    }

    #[test]
    fn residential_and_power_flags() {
        assert!(BuildingKind::Habitat.is_residential());
        assert!(!BuildingKind::TradeHub.is_residential());
        assert!(BuildingKind::SolarArray.is_power_producer());
        assert!(BuildingKind::FusionReactor.is_power_producer());
        assert!(!BuildingKind::MiningRig.is_power_producer());
    }
}
