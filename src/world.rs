use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::BuildingKind,
    config::Variant,
    goals::AiGoal,
    grid::{Grid, MapSize, Tile},
    news::{NewsFeed, NewsItem},
    placement::Placement,
    tech,
};

/// Per-tick history rows kept for charting.
pub const HISTORY_CAPACITY: usize = 60;

pub const BASELINE_OXYGEN: f64 = 100.0;
pub const BASELINE_CO2: f64 = 400.0;
pub const CO2_FLOOR: f64 = 300.0;
pub const STARTING_FOOD: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStats {
    pub money: i64,
    pub population: i64,
    pub day: u64,
    pub science: i64,
    pub power_supply: i64,
    pub power_demand: i64,
    /// Breathable air, 0 to 100.
    pub oxygen: f64,
    /// Dome CO2 in ppm, never below 300.
    pub co2: f64,
    pub food: f64,
}

impl Default for CityStats {
    fn default() -> Self {
        Self {
            money: 0,
            population: 0,
            day: 0,
            science: 0,
            power_supply: 0,
            power_demand: 0,
            oxygen: BASELINE_OXYGEN,
            co2: BASELINE_CO2,
            food: STARTING_FOOD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub day: u64,
    pub money: i64,
    pub population: i64,
    pub science: i64,
    pub power_supply: i64,
    pub power_demand: i64,
    pub oxygen: f64,
    pub co2: f64,
    pub food: f64,
}

impl From<&CityStats> for HistoryEntry {
    fn from(stats: &CityStats) -> Self {
        Self {
            day: stats.day,
            money: stats.money,
            population: stats.population,
            science: stats.science,
            power_supply: stats.power_supply,
            power_demand: stats.power_demand,
            oxygen: stats.oxygen,
            co2: stats.co2,
            food: stats.food,
        }
    }
}

/// Aggregates produced by the census pass and consumed by the rest of the tick.
#[derive(Debug, Clone, Default)]
pub struct TickLedger {
    pub building_counts: BTreeMap<BuildingKind, u32>,
    pub buildings: u32,
    pub income: i64,
    pub science: i64,
    pub population_growth: i64,
    pub food: i64,
    pub oxygen: f64,
    pub co2: f64,
    pub power_generated: i64,
    pub power_drain: i64,
    pub power_ratio: f64,
    pub low_power: bool,
    pub residential: u32,
    pub max_population: i64,
    pub starvation: f64,
    pub death_toll: i64,
    pub goal_completed: bool,
    pub auto_built: Option<Placement>,
}

impl TickLedger {
    pub fn count(&self, kind: BuildingKind) -> u32 {
        self.building_counts.get(&kind).copied().unwrap_or(0)
    }
}

pub struct World {
    pub(crate) variant: Variant,
    pub(crate) grid: Grid,
    pub(crate) stats: CityStats,
    pub(crate) unlocked_techs: Vec<String>,
    pub(crate) unlocked_kinds: BTreeSet<BuildingKind>,
    pub(crate) goal: Option<AiGoal>,
    pub(crate) goals_claimed: u64,
    pub(crate) news: NewsFeed,
    pub(crate) history: VecDeque<HistoryEntry>,
    pub(crate) ledger: TickLedger,
    pub(crate) auto_build: bool,
}

impl World {
    pub fn new(
        map_size: MapSize,
        variant: Variant,
        starting_money: i64,
        rng: &mut impl RngCore,
    ) -> Self {
        let grid = match variant {
            Variant::Basic => Grid::new(map_size),
            Variant::Extended => Grid::with_terrain(map_size, rng),
        };
        let unlocked_techs: Vec<String> = tech::STARTING_TECHS
            .iter()
            .map(|id| id.to_string())
            .collect();
        let unlocked_kinds = tech::unlocked_kinds(&unlocked_techs);
        Self {
            variant,
            grid,
            stats: CityStats {
                money: starting_money,
                ..CityStats::default()
            },
            unlocked_techs,
            unlocked_kinds,
            goal: None,
            goals_claimed: 0,
            news: NewsFeed::default(),
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            ledger: TickLedger::default(),
            auto_build: false,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn stats(&self) -> &CityStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut CityStats {
        &mut self.stats
    }

    pub fn unlocked_techs(&self) -> &[String] {
        &self.unlocked_techs
    }

    pub fn unlocked_kinds(&self) -> &BTreeSet<BuildingKind> {
        &self.unlocked_kinds
    }

    pub fn is_unlocked(&self, kind: BuildingKind) -> bool {
        self.unlocked_kinds.contains(&kind)
    }

    pub fn goal(&self) -> Option<&AiGoal> {
        self.goal.as_ref()
    }

    /// Installs a goal if none is active. Returns whether it was accepted.
    pub fn offer_goal(&mut self, goal: AiGoal) -> bool {
        if self.goal.is_some() || !goal.is_well_formed() {
            return false;
        }
        self.goal = Some(goal);
        true
    }

    pub fn goals_claimed(&self) -> u64 {
        self.goals_claimed
    }

    pub fn news(&self) -> &NewsFeed {
        &self.news
    }

    pub fn news_mut(&mut self) -> &mut NewsFeed {
        &mut self.news
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn ledger(&self) -> &TickLedger {
        &self.ledger
    }

    pub fn auto_build_enabled(&self) -> bool {
        self.auto_build
    }

    pub fn set_auto_build(&mut self, enabled: bool) {
        self.auto_build = enabled;
    }

    pub(crate) fn push_history(&mut self) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry::from(&self.stats));
    }

    /// Unique buildings per kind in the current grid, counted by footprint root.
    pub fn building_counts(&self) -> BTreeMap<BuildingKind, u32> {
        let mut counts = BTreeMap::new();
        for tile in self.grid.occupied() {
            if tile.root() == (tile.x, tile.y) {
                *counts.entry(tile.kind).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn snapshot(&self, colony: &str) -> ColonySnapshot {
        ColonySnapshot {
            colony: colony.to_string(),
            captured_at: Utc::now(),
            variant: self.variant,
            map_size: self.grid.size(),
            stats: self.stats.clone(),
            power_ratio: self.ledger.power_ratio,
            max_population: self.ledger.max_population,
            goal: self.goal.clone(),
            news: self.news.items().cloned().collect(),
            history: self.history.iter().cloned().collect(),
            unlocked_techs: self.unlocked_techs.clone(),
            unlocked_kinds: self.unlocked_kinds.iter().copied().collect(),
            auto_build: self.auto_build,
            tiles: self.grid.tiles().cloned().collect(),
        }
    }
}

/// Read-only view handed to renderers after each commit point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonySnapshot {
    pub colony: String,
    pub captured_at: DateTime<Utc>,
    pub variant: Variant,
    pub map_size: usize,
    pub stats: CityStats,
    pub power_ratio: f64,
    pub max_population: i64,
    pub goal: Option<AiGoal>,
    pub news: Vec<NewsItem>,
    pub history: Vec<HistoryEntry>,
    pub unlocked_techs: Vec<String>,
    pub unlocked_kinds: Vec<BuildingKind>,
    pub auto_build: bool,
    pub tiles: Vec<Tile>,
}
