use crate::{
    catalog::BuildingKind,
    goals::{AiGoal, GoalMetric},
    news::Sentiment,
};

use super::{NarrativeContext, NewsDraft};

/// Deterministic goals and headlines built from the colony's own numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackNarrator;

impl FallbackNarrator {
    pub fn new() -> Self {
        Self
    }

    /// Rotates through the four goal metrics so consecutive goals differ.
    pub fn goal(&self, context: &NarrativeContext) -> AiGoal {
        let stats = &context.stats;
        let rotation = (context.day + context.goals_claimed) % 4;
        match rotation {
            0 => {
                let target = round_up(stats.money.max(0) + 1_500, 500);
                AiGoal {
                    description: format!("Grow the colony treasury to {target} credits"),
                    metric: GoalMetric::Money,
                    target_value: target,
                    building_kind: None,
                    reward: 300,
                    completed: false,
                }
            }
            1 => {
                let target = round_up((stats.population + 25).max(20), 5);
                AiGoal {
                    description: format!("Reach a population of {target} colonists"),
                    metric: GoalMetric::Population,
                    target_value: target,
                    building_kind: None,
                    reward: 400,
                    completed: false,
                }
            }
            2 => {
                let target = round_up(stats.science.max(0) + 50, 10);
                AiGoal {
                    description: format!("Accumulate {target} science points"),
                    metric: GoalMetric::Science,
                    target_value: target,
                    building_kind: None,
                    reward: 350,
                    completed: false,
                }
            }
            _ => {
                let kind = self.building_target(context);
                let target = i64::from(context.count(kind)) + 2;
                AiGoal {
                    description: format!("Operate {target} {}", plural(kind)),
                    metric: GoalMetric::BuildingCount,
                    target_value: target,
                    building_kind: Some(kind),
                    reward: 250 + kind.config().cost,
                    completed: false,
                }
            }
        }
    }

    pub fn news(&self, context: &NarrativeContext) -> NewsDraft {
        let stats = &context.stats;
        let day = context.day;
        if stats.power_supply < stats.power_demand {
            return NewsDraft {
                text: format!(
                    "Sol {day}: engineers ration power as demand outpaces the grid."
                ),
                sentiment: Sentiment::Negative,
            };
        }
        if context.variant.has_life_support() && stats.food < stats.population as f64 * 0.2 {
            return NewsDraft {
                text: format!("Sol {day}: hydroponics crews warn of thin food reserves."),
                sentiment: Sentiment::Negative,
            };
        }
        let text = match day % 3 {
            0 => format!(
                "Sol {day}: {} now calls {} colonists home.",
                context.colony, stats.population
            ),
            1 => format!(
                "Sol {day}: traders report the treasury at {} credits.",
                stats.money
            ),
            _ => format!(
                "Sol {day}: researchers log {} science points to date.",
                stats.science
            ),
        };
        let sentiment = if stats.population > 0 {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        };
        NewsDraft { text, sentiment }
    }

    fn building_target(&self, context: &NarrativeContext) -> BuildingKind {
        let choices: Vec<BuildingKind> = context
            .unlocked_kinds
            .iter()
            .copied()
            .filter(|kind| {
                !matches!(
                    kind,
                    BuildingKind::None | BuildingKind::Road | BuildingKind::GreenRoad
                )
            })
            .collect();
        if choices.is_empty() {
            return BuildingKind::Habitat;
        }
        choices[(context.day as usize) % choices.len()]
    }
}

fn round_up(value: i64, step: i64) -> i64 {
    ((value + step - 1) / step) * step
}

fn plural(kind: BuildingKind) -> String {
    let name = kind.config().display;
    if name.ends_with('s') {
        name.to_string()
    } else {
        format!("{name}s")
    }
}
