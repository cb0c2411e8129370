//! The single writer that owns a running colony.
//!
//! Every method here is a commit point: it runs to completion against the
//! world before anything else can observe it.

use std::{sync::Arc, time::Instant};

use anyhow::Result;
use tracing::info;

use crate::{
    catalog::BuildingKind,
    config::ColonyConfig,
    engine::{Engine, EngineBuilder, EngineSettings, TickSummary},
    error::ActionError,
    goals,
    narrative::{HttpNarrator, NarrativeAdapter, NarrativeService},
    placement::{self, Demolition, Placement},
    tech::{self, ResearchOutcome},
    world::{ColonySnapshot, World},
};

pub struct Session {
    config: ColonyConfig,
    world: World,
    engine: Engine,
    narrator: NarrativeAdapter,
    stopped: bool,
}

impl Session {
    pub fn new(config: ColonyConfig, service: Option<Arc<dyn NarrativeService>>) -> Self {
        let service = service.filter(|_| config.ai_enabled);
        let narrator = NarrativeAdapter::new(service, &config.narrative);
        let (engine, world) = fresh_colony(&config);
        info!(
            colony = %config.name,
            variant = ?config.variant,
            map_size = config.map_size.get(),
            online = narrator.is_online(),
            "colony founded"
        );
        Self {
            config,
            world,
            engine,
            narrator,
            stopped: false,
        }
    }

    /// Builds the HTTP narrator when the config names a server and AI is on.
    pub fn from_config(config: ColonyConfig, offline: bool) -> Result<Self> {
        let service: Option<Arc<dyn NarrativeService>> = match &config.narrative.base_url {
            Some(url) if !offline && config.ai_enabled => {
                Some(Arc::new(HttpNarrator::new(url, &config.narrative)?))
            }
            _ => None,
        };
        Ok(Self::new(config, service))
    }

    pub fn tick(&mut self, now: Instant) -> Result<TickSummary> {
        if self.stopped {
            return Err(ActionError::Stopped.into());
        }
        let summary = self.engine.tick(&mut self.world)?;
        self.narrator.pump(&mut self.world, &self.config.name, now);
        Ok(summary)
    }

    pub fn place(&mut self, kind: BuildingKind, x: usize, y: usize) -> Result<Placement, ActionError> {
        self.ensure_running()?;
        let mut rng = self.engine.rng("player");
        placement::place_building(&mut self.world, kind, x, y, &mut rng)
    }

    pub fn demolish(&mut self, x: usize, y: usize) -> Result<Demolition, ActionError> {
        self.ensure_running()?;
        placement::demolish(&mut self.world, x, y)
    }

    pub fn research(&mut self, id: &str) -> Result<ResearchOutcome, ActionError> {
        self.ensure_running()?;
        tech::research(&mut self.world, id)
    }

    /// Credits the reward. A replacement goal is requested at the next tick.
    pub fn claim_goal(&mut self) -> Result<i64, ActionError> {
        self.ensure_running()?;
        goals::claim_goal(&mut self.world)
    }

    /// The auto-builder stays off when AI is disabled for this colony.
    pub fn set_auto_build(&mut self, enabled: bool) -> bool {
        let enabled = enabled && self.config.ai_enabled;
        self.world.set_auto_build(enabled);
        enabled
    }

    /// Throws the colony away and starts over from the configured seed.
    /// The auto-build toggle survives the restart.
    pub fn restart(&mut self) {
        let auto_build = self.world.auto_build_enabled();
        let (engine, world) = fresh_colony(&self.config);
        self.engine = engine;
        self.world = world;
        self.set_auto_build(auto_build);
        self.narrator.restart();
        self.stopped = false;
        info!(colony = %self.config.name, "colony restarted");
    }

    pub fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.narrator.stop();
            info!(colony = %self.config.name, ticks = self.engine.ticks(), "colony stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn snapshot(&self) -> ColonySnapshot {
        self.world.snapshot(&self.config.name)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn narrator(&self) -> &NarrativeAdapter {
        &self.narrator
    }

    fn ensure_running(&self) -> Result<(), ActionError> {
        if self.stopped {
            Err(ActionError::Stopped)
        } else {
            Ok(())
        }
    }
}

fn fresh_colony(config: &ColonyConfig) -> (Engine, World) {
    let mut engine = EngineBuilder::new(EngineSettings {
        colony_name: config.name.clone(),
        seed: config.seed,
    })
    .with_standard_systems()
    .build();
    let world = World::new(
        config.map_size,
        config.variant,
        config.starting_money,
        &mut engine.rng("terrain"),
    );
    (engine, world)
}
