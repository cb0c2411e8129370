pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod goals;
pub mod grid;
pub mod narrative;
pub mod news;
pub mod placement;
pub mod rng;
pub mod session;
pub mod systems;
pub mod tech;
pub mod web;
pub mod world;

pub use catalog::{BuildingConfig, BuildingKind};
pub use config::{ColonyConfig, ConfigLoader, Variant};
pub use engine::{Engine, EngineBuilder, TickSummary};
pub use error::ActionError;
pub use grid::{Grid, MapSize};
pub use session::Session;
pub use world::{ColonySnapshot, World};
