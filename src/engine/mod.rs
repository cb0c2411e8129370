use std::time::Instant;

use anyhow::Result;

use crate::{
    config::Variant,
    placement::Placement,
    rng::{RngManager, SystemRng},
    systems::{
        AdvisorySystem, AutoBuildSystem, BookkeepingSystem, CensusSystem, GoalSystem,
        LifeSupportSystem, PopulationSystem, TreasurySystem,
    },
    world::World,
};

pub struct EngineSettings {
    pub colony_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// The full tick pipeline in the order the rules depend on.
    pub fn with_standard_systems(self) -> Self {
        self.with_system(CensusSystem::new())
            .with_system(LifeSupportSystem::new())
            .with_system(PopulationSystem::new())
            .with_system(TreasurySystem::new())
            .with_system(GoalSystem::new())
            .with_system(AdvisorySystem::new())
            .with_system(AutoBuildSystem::new())
            .with_system(BookkeepingSystem::new())
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            settings: self.settings,
            ticks: 0,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
    ticks: u64,
}

impl Engine {
    /// Runs every system once. The world is exclusively borrowed for the
    /// whole pipeline, so no reader can observe a half-applied tick.
    pub fn tick(&mut self, world: &mut World) -> Result<TickSummary> {
        self.ticks += 1;
        let ctx = SystemContext {
            tick: self.ticks,
            variant: world.variant(),
            colony: &self.settings.colony_name,
        };
        let mut system_reports = Vec::with_capacity(self.systems.len());
        for system in &mut self.systems {
            let start = Instant::now();
            let mut rng_stream = self.rng.stream(system.name());
            system.run(&ctx, world, &mut rng_stream)?;
            system_reports.push(SystemRunReport {
                name: system.name().to_string(),
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            });
        }

        let stats = world.stats();
        let ledger = world.ledger();
        Ok(TickSummary {
            tick: self.ticks,
            day: stats.day,
            population: stats.population,
            money: stats.money,
            science: stats.science,
            power_ratio: ledger.power_ratio,
            death_toll: ledger.death_toll,
            goal_completed: ledger.goal_completed,
            auto_built: ledger.auto_built,
            system_reports,
        })
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(TickSummary),
    {
        for _ in 0..ticks {
            let summary = self.tick(world)?;
            hook(summary);
        }
        Ok(())
    }

    /// Random stream for work done outside the tick pipeline, such as player placement.
    pub fn rng(&mut self, name: &str) -> SystemRng<'_> {
        self.rng.stream(name)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn colony_name(&self) -> &str {
        &self.settings.colony_name
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|system| system.name()).collect()
    }
}

#[derive(Clone, Debug)]
pub struct SystemRunReport {
    pub name: String,
    pub duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct TickSummary {
    pub tick: u64,
    pub day: u64,
    pub population: i64,
    pub money: i64,
    pub science: i64,
    pub power_ratio: f64,
    pub death_toll: i64,
    pub goal_completed: bool,
    pub auto_built: Option<Placement>,
    pub system_reports: Vec<SystemRunReport>,
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub variant: Variant,
    pub colony: &'a str,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
