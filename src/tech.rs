use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::{catalog::BuildingKind, error::ActionError, news::Sentiment, world::World};

#[derive(Debug, Clone, Copy)]
pub struct TechNode {
    pub id: &'static str,
    pub display: &'static str,
    pub cost: i64,
    pub unlocks: &'static [BuildingKind],
    pub prerequisites: &'static [&'static str],
}

/// Technologies every colony starts with.
pub const STARTING_TECHS: &[&str] = &["settlement"];

const TECH_TREE: &[TechNode] = &[
    TechNode {
        id: "settlement",
        display: "Settlement",
        cost: 0,
        unlocks: &[
            BuildingKind::Road,
            BuildingKind::Habitat,
            BuildingKind::SolarArray,
            BuildingKind::CombustionGenerator,
            BuildingKind::Hydroponics,
            BuildingKind::OxygenGenerator,
            BuildingKind::ResearchLab,
        ],
        prerequisites: &[],
    },
    TechNode {
        id: "landscaping",
        display: "Landscaping",
        cost: 40,
        unlocks: &[BuildingKind::GreenRoad],
        prerequisites: &["settlement"],
    },
    TechNode {
        id: "commerce",
        display: "Commerce",
        cost: 60,
        unlocks: &[BuildingKind::TradeHub],
        prerequisites: &["settlement"],
    },
    TechNode {
        id: "extraction",
        display: "Regolith Extraction",
        cost: 120,
        unlocks: &[BuildingKind::MiningRig],
        prerequisites: &["commerce"],
    },
    TechNode {
        id: "fusion",
        display: "Fusion Power",
        cost: 300,
        unlocks: &[BuildingKind::FusionReactor],
        prerequisites: &["extraction"],
    },
    TechNode {
        id: "orbital",
        display: "Orbital Logistics",
        cost: 800,
        unlocks: &[BuildingKind::Spaceport],
        prerequisites: &["fusion", "commerce"],
    },
];

pub fn definition(id: &str) -> Option<&'static TechNode> {
    TECH_TREE.iter().find(|node| node.id == id)
}

pub fn all() -> &'static [TechNode] {
    TECH_TREE
}

/// `None` plus everything the unlocked technologies provide.
pub fn unlocked_kinds(unlocked: &[String]) -> BTreeSet<BuildingKind> {
    let mut kinds = BTreeSet::from([BuildingKind::None]);
    kinds.extend(
        unlocked
            .iter()
            .filter_map(|id| definition(id))
            .flat_map(|node| node.unlocks.iter().copied()),
    );
    kinds
}

/// Nodes not yet unlocked whose prerequisites are all met.
pub fn available(unlocked: &[String]) -> Vec<&'static TechNode> {
    TECH_TREE
        .iter()
        .filter(|node| !unlocked.iter().any(|id| id == node.id))
        .filter(|node| {
            node.prerequisites
                .iter()
                .all(|dep| unlocked.iter().any(|id| id == dep))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchOutcome {
    Unlocked { cost: i64 },
    AlreadyUnlocked,
}

pub fn research(world: &mut World, id: &str) -> Result<ResearchOutcome, ActionError> {
    let node = definition(id).ok_or_else(|| ActionError::UnknownTech(id.to_string()))?;
    if world.unlocked_techs.iter().any(|known| known == node.id) {
        return Ok(ResearchOutcome::AlreadyUnlocked);
    }
    let day = world.stats.day;
    if let Some(missing) = node
        .prerequisites
        .iter()
        .find(|dep| !world.unlocked_techs.iter().any(|known| known == *dep))
    {
        world.news.push(
            day,
            format!("{} research blocked: {} comes first.", node.display, missing),
            Sentiment::Negative,
        );
        debug!(tech = node.id, missing, "research rejected");
        return Err(ActionError::MissingPrerequisite {
            tech: node.id.to_string(),
            missing: missing.to_string(),
        });
    }
    if world.stats.science < node.cost {
        world.news.push(
            day,
            format!(
                "Not enough science for {}: {} of {} points.",
                node.display, world.stats.science, node.cost
            ),
            Sentiment::Negative,
        );
        debug!(tech = node.id, "research rejected for lack of science");
        return Err(ActionError::InsufficientScience {
            needed: node.cost,
            available: world.stats.science,
        });
    }

    world.stats.science -= node.cost;
    world.unlocked_techs.push(node.id.to_string());
    world.unlocked_kinds = unlocked_kinds(&world.unlocked_techs);
    world.news.push(
        day,
        format!("Breakthrough: {} researched.", node.display),
        Sentiment::Positive,
    );
    info!(tech = node.id, cost = node.cost, "technology unlocked");
    Ok(ResearchOutcome::Unlocked { cost: node.cost })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn every_prerequisite_exists() {
        for node in all() {
            for dep in node.prerequisites {
                assert!(definition(dep).is_some(), "{} -> {}", node.id, dep);
            }
        }
    }

    #[test]
    fn unlocked_kinds_always_contains_none() {
        let kinds = unlocked_kinds(&[]);
        assert_eq!(kinds, BTreeSet::from([BuildingKind::None]));
        let kinds = unlocked_kinds(&ids(&["settlement", "commerce"]));
        assert!(kinds.contains(&BuildingKind::None));
        assert!(kinds.contains(&BuildingKind::Habitat));
        assert!(kinds.contains(&BuildingKind::TradeHub));
        assert!(!kinds.contains(&BuildingKind::MiningRig));
    }

    #[test]
    fn available_respects_prerequisites() {
        let offered: Vec<_> = available(&ids(&["settlement"]))
            .into_iter()
            .map(|node| node.id)
            .collect();
        assert_eq!(offered, vec!["landscaping", "commerce"]);

        let offered: Vec<_> = available(&ids(&["settlement", "commerce", "extraction", "fusion"]))
            .into_iter()
            .map(|node| node.id)
            .collect();
        assert!(offered.contains(&"orbital"));
        assert!(!offered.contains(&"commerce"));
    }
}
