mod advisory;
pub mod auto_build;
mod bookkeeping;
pub mod census;
mod goals;
pub mod life_support;
pub mod population;
mod treasury;

pub use advisory::AdvisorySystem;
pub use auto_build::AutoBuildSystem;
pub use bookkeeping::BookkeepingSystem;
pub use census::CensusSystem;
pub use goals::GoalSystem;
pub use life_support::LifeSupportSystem;
pub use population::PopulationSystem;
pub use treasury::TreasurySystem;
