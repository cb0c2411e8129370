use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sol_colony::{
    config::{NarrativeConfig, Variant},
    goals::{AiGoal, GoalMetric},
    grid::MapSize,
    narrative::{
        NarrativeAdapter, NarrativeContext, NarrativeError, NarrativeFuture, NarrativeService,
        NewsDraft,
    },
    news::Sentiment,
    world::World,
};
use tokio::sync::Notify;

const COLONY: &str = "adapter";

fn council_goal() -> AiGoal {
    AiGoal {
        description: "From the council".into(),
        metric: GoalMetric::Science,
        target_value: 40,
        building_kind: None,
        reward: 200,
        completed: false,
    }
}

/// Replies with a fixed result, optionally waiting on a gate first.
struct ScriptedService {
    goal: Result<Option<AiGoal>, NarrativeError>,
    news: Result<Option<NewsDraft>, NarrativeError>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl ScriptedService {
    fn new(goal: Result<Option<AiGoal>, NarrativeError>) -> Self {
        Self {
            goal,
            news: Ok(Some(NewsDraft {
                text: "Council headline".into(),
                sentiment: Sentiment::Neutral,
            })),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn gated(goal: Result<Option<AiGoal>, NarrativeError>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(goal)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NarrativeService for ScriptedService {
    fn generate_goal(&self, _context: NarrativeContext) -> NarrativeFuture<'_, AiGoal> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.goal.clone()
        })
    }

    fn generate_news(&self, _context: NarrativeContext) -> NarrativeFuture<'_, NewsDraft> {
        Box::pin(async move { self.news.clone() })
    }
}

fn world() -> World {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    World::new(MapSize::default(), Variant::Basic, 2_000, &mut rng)
}

fn adapter(service: Arc<ScriptedService>) -> NarrativeAdapter {
    let service: Arc<dyn NarrativeService> = service;
    NarrativeAdapter::new(Some(service), &NarrativeConfig::default())
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn service_goal_is_installed_at_the_next_boundary() {
    let service = Arc::new(ScriptedService::new(Ok(Some(council_goal()))));
    let mut adapter = adapter(service.clone());
    let mut world = world();
    let now = Instant::now();

    adapter.pump(&mut world, COLONY, now);
    assert!(adapter.goal_in_flight());
    assert!(world.goal().is_none());

    settle().await;
    adapter.pump(&mut world, COLONY, now);
    assert_eq!(world.goal().unwrap().description, "From the council");
    assert!(!adapter.goal_in_flight());
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn only_one_goal_request_in_flight() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(Ok(Some(council_goal())), gate));
    let mut adapter = adapter(service.clone());
    let mut world = world();
    let now = Instant::now();

    for _ in 0..5 {
        adapter.pump(&mut world, COLONY, now);
        settle().await;
    }
    assert_eq!(service.calls(), 1);
    assert!(world.goal().is_none());
}

#[tokio::test]
async fn replies_from_before_a_restart_are_dropped() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(Ok(Some(council_goal())), gate.clone()));
    let mut adapter = adapter(service.clone());
    let mut world = world();
    let now = Instant::now();

    adapter.pump(&mut world, COLONY, now);
    settle().await;
    let old_token = adapter.token();
    adapter.restart();
    assert!(adapter.token() > old_token);

    gate.notify_one();
    settle().await;
    adapter.pump(&mut world, COLONY, now);
    assert!(world.goal().is_none());
    // the fresh session asked again
    assert!(adapter.goal_in_flight());
}

#[tokio::test]
async fn rate_limit_falls_back_and_cools_down() {
    let service = Arc::new(ScriptedService::new(Err(NarrativeError::RateLimited)));
    let mut adapter = adapter(service.clone());
    let mut world = world();
    let now = Instant::now();

    adapter.pump(&mut world, COLONY, now);
    settle().await;
    adapter.pump(&mut world, COLONY, now);

    let goal = world.goal().expect("fallback goal installed");
    assert_ne!(goal.description, "From the council");
    assert!(adapter.cooling_down(now));
    assert!(adapter.cooling_down(now + Duration::from_secs(59)));
    assert!(!adapter.cooling_down(now + Duration::from_secs(60)));
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn transient_failures_retry_before_falling_back() {
    let service = Arc::new(ScriptedService::new(Err(NarrativeError::Network(
        "connection refused".into(),
    ))));
    let mut adapter = adapter(service.clone());
    let mut world = world();
    let start = Instant::now();

    for attempt in 0..3u64 {
        let now = start + Duration::from_secs(attempt * 5);
        adapter.pump(&mut world, COLONY, now);
        settle().await;
        assert_eq!(service.calls(), attempt as usize + 1);
        adapter.pump(&mut world, COLONY, now);
        if attempt < 2 {
            assert!(world.goal().is_none());
            // still waiting out the retry delay
            adapter.pump(&mut world, COLONY, now + Duration::from_secs(1));
            settle().await;
            assert_eq!(service.calls(), attempt as usize + 1);
        }
    }
    assert!(world.goal().is_some());
    assert!(!adapter.cooling_down(start + Duration::from_secs(10)));
}

#[tokio::test]
async fn goal_and_news_failures_are_counted_apart() {
    let mut service = ScriptedService::new(Err(NarrativeError::Network("connection reset".into())));
    service.news = Err(NarrativeError::Network("timed out".into()));
    let service = Arc::new(service);
    let mut adapter = adapter(service.clone());
    let mut world = world();
    world.stats_mut().day = 10;
    let start = Instant::now();

    for attempt in 0..2u64 {
        let now = start + Duration::from_secs(attempt * 5);
        adapter.pump(&mut world, COLONY, now);
        assert!(adapter.goal_in_flight());
        assert!(adapter.news_in_flight());
        settle().await;
        adapter.pump(&mut world, COLONY, now);
        // two of each kind is still under the limit of three
        assert!(world.goal().is_none());
        assert!(world.news().is_empty());
    }

    let now = start + Duration::from_secs(10);
    adapter.pump(&mut world, COLONY, now);
    settle().await;
    adapter.pump(&mut world, COLONY, now);
    assert!(world.goal().is_some());
    assert!(!world.news().is_empty());
    assert_eq!(service.calls(), 3);
}

#[tokio::test]
async fn malformed_goal_uses_fallback() {
    let mut broken = council_goal();
    broken.metric = GoalMetric::BuildingCount;
    let service = Arc::new(ScriptedService::new(Ok(Some(broken))));
    let mut adapter = adapter(service);
    let mut world = world();
    let now = Instant::now();

    adapter.pump(&mut world, COLONY, now);
    settle().await;
    adapter.pump(&mut world, COLONY, now);
    let goal = world.goal().expect("fallback goal installed");
    assert!(goal.is_well_formed());
}

#[tokio::test]
async fn news_arrives_on_the_configured_cadence() {
    let service = Arc::new(ScriptedService::new(Ok(Some(council_goal()))));
    let mut adapter = adapter(service);
    let mut world = world();
    let now = Instant::now();

    world.stats_mut().day = 9;
    adapter.pump(&mut world, COLONY, now);
    settle().await;
    adapter.pump(&mut world, COLONY, now);
    assert!(world.news().is_empty());

    world.stats_mut().day = 10;
    adapter.pump(&mut world, COLONY, now);
    assert!(adapter.news_in_flight());
    settle().await;
    adapter.pump(&mut world, COLONY, now);
    assert_eq!(world.news().latest().unwrap().text, "Council headline");
}

#[tokio::test]
async fn stopped_adapter_goes_quiet() {
    let service = Arc::new(ScriptedService::new(Ok(Some(council_goal()))));
    let mut adapter = adapter(service.clone());
    let mut world = world();
    adapter.stop();
    adapter.pump(&mut world, COLONY, Instant::now());
    settle().await;
    assert_eq!(service.calls(), 0);
    assert!(world.goal().is_none());
}

#[tokio::test]
async fn reply_finishing_after_stop_is_ignored() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(ScriptedService::gated(Ok(Some(council_goal())), gate.clone()));
    let mut adapter = adapter(service.clone());
    let mut world = world();
    let now = Instant::now();

    adapter.pump(&mut world, COLONY, now);
    settle().await;
    assert!(adapter.goal_in_flight());
    adapter.stop();

    gate.notify_one();
    settle().await;
    adapter.pump(&mut world, COLONY, now);
    assert!(world.goal().is_none());
    assert!(!adapter.goal_in_flight());
    assert!(adapter.is_stopped());
    assert_eq!(service.calls(), 1);
}

#[test]
fn without_a_runtime_the_fallback_answers_at_once() {
    let service = Arc::new(ScriptedService::new(Ok(Some(council_goal()))));
    let mut adapter = adapter(service.clone());
    let mut world = world();
    adapter.pump(&mut world, COLONY, Instant::now());
    assert!(world.goal().is_some());
    assert!(!adapter.goal_in_flight());
    assert_eq!(service.calls(), 0);
}
