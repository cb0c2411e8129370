//! Goal and news text from an external service, with a local fallback
//!
//! The service is only ever called from spawned tasks. Replies come back
//! over a channel that [`NarrativeAdapter::pump`] drains between ticks, and
//! each reply carries the session token it was requested under so a restart
//! or stop can invalidate whatever is still in flight.

mod fallback;
mod http;

use std::{
    collections::BTreeMap,
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::{
    catalog::BuildingKind,
    config::{NarrativeConfig, Variant},
    goals::AiGoal,
    news::Sentiment,
    world::{CityStats, World},
};

pub use fallback::FallbackNarrator;
pub use http::HttpNarrator;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrativeError {
    #[error("narrative service is rate limiting requests")]
    RateLimited,
    #[error("narrative service failed with status {0}")]
    Server(u16),
    #[error("narrative service rejected the request with status {0}")]
    Http(u16),
    #[error("could not reach narrative service: {0}")]
    Network(String),
    #[error("narrative service reply was not understood: {0}")]
    Malformed(String),
}

impl NarrativeError {
    /// Errors that mean the service wants us to back off for a while.
    pub fn is_throttling(&self) -> bool {
        matches!(self, NarrativeError::RateLimited | NarrativeError::Server(_))
    }
}

/// What the service sees of the colony.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeContext {
    pub colony: String,
    pub variant: Variant,
    pub day: u64,
    pub stats: CityStats,
    pub goals_claimed: u64,
    pub building_counts: BTreeMap<BuildingKind, u32>,
    pub unlocked_kinds: Vec<BuildingKind>,
}

impl NarrativeContext {
    pub fn from_world(world: &World, colony: &str) -> Self {
        Self {
            colony: colony.to_string(),
            variant: world.variant(),
            day: world.stats().day,
            stats: world.stats().clone(),
            goals_claimed: world.goals_claimed(),
            building_counts: world.building_counts(),
            unlocked_kinds: world
                .unlocked_kinds()
                .iter()
                .copied()
                .filter(|kind| !kind.is_empty())
                .collect(),
        }
    }

    pub fn count(&self, kind: BuildingKind) -> u32 {
        self.building_counts.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsDraft {
    pub text: String,
    pub sentiment: Sentiment,
}

pub type NarrativeFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<Option<T>, NarrativeError>> + Send + 'a>>;

/// A generator of goals and news headlines. `Ok(None)` means the service had
/// nothing to offer and the caller should fall back.
pub trait NarrativeService: Send + Sync {
    fn generate_goal(&self, context: NarrativeContext) -> NarrativeFuture<'_, AiGoal>;
    fn generate_news(&self, context: NarrativeContext) -> NarrativeFuture<'_, NewsDraft>;
}

#[derive(Debug)]
enum Payload {
    Goal(Result<Option<AiGoal>, NarrativeError>),
    News(Result<Option<NewsDraft>, NarrativeError>),
}

#[derive(Debug)]
struct Reply {
    token: u64,
    payload: Payload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Goal,
    News,
}

pub struct NarrativeAdapter {
    service: Option<Arc<dyn NarrativeService>>,
    fallback: FallbackNarrator,
    cooldown: Duration,
    retry_delay: Duration,
    max_failures: u32,
    news_interval_days: u64,
    token: u64,
    goal_in_flight: bool,
    news_in_flight: bool,
    retry_at: Option<Instant>,
    cooldown_until: Option<Instant>,
    goal_failures: u32,
    news_failures: u32,
    next_news_day: u64,
    stopped: bool,
    sender: UnboundedSender<Reply>,
    receiver: UnboundedReceiver<Reply>,
}

impl NarrativeAdapter {
    pub fn new(service: Option<Arc<dyn NarrativeService>>, settings: &NarrativeConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let news_interval_days = settings.news_interval_days.max(1);
        Self {
            service,
            fallback: FallbackNarrator::new(),
            cooldown: settings.cooldown(),
            retry_delay: settings.retry_delay(),
            max_failures: settings.max_failures.max(1),
            news_interval_days,
            token: 0,
            goal_in_flight: false,
            news_in_flight: false,
            retry_at: None,
            cooldown_until: None,
            goal_failures: 0,
            news_failures: 0,
            next_news_day: news_interval_days,
            stopped: false,
            sender,
            receiver,
        }
    }

    /// An adapter that never calls out and always uses the fallback.
    pub fn offline(settings: &NarrativeConfig) -> Self {
        Self::new(None, settings)
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_online(&self) -> bool {
        self.service.is_some()
    }

    pub fn goal_in_flight(&self) -> bool {
        self.goal_in_flight
    }

    pub fn news_in_flight(&self) -> bool {
        self.news_in_flight
    }

    pub fn cooling_down(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Applies finished replies, then issues whatever requests the colony
    /// needs. Called once per tick boundary.
    pub fn pump(&mut self, world: &mut World, colony: &str, now: Instant) {
        if self.stopped {
            return;
        }
        while let Ok(reply) = self.receiver.try_recv() {
            if reply.token != self.token {
                debug!(token = reply.token, current = self.token, "dropping stale narrative reply");
                continue;
            }
            match reply.payload {
                Payload::Goal(result) => {
                    self.goal_in_flight = false;
                    self.apply_goal(world, colony, result, now);
                }
                Payload::News(result) => {
                    self.news_in_flight = false;
                    self.apply_news(world, colony, result, now);
                }
            }
        }

        if self.retry_at.is_some_and(|at| now < at) {
            return;
        }
        self.retry_at = None;

        if world.goal().is_none() && !self.goal_in_flight {
            self.request(RequestKind::Goal, world, colony, now);
        }
        if world.stats().day >= self.next_news_day && !self.news_in_flight {
            self.request(RequestKind::News, world, colony, now);
        }
    }

    /// Invalidates in-flight replies and starts the news cadence over.
    pub fn restart(&mut self) {
        self.token += 1;
        self.goal_in_flight = false;
        self.news_in_flight = false;
        self.retry_at = None;
        self.goal_failures = 0;
        self.news_failures = 0;
        self.next_news_day = self.news_interval_days;
        self.stopped = false;
        while self.receiver.try_recv().is_ok() {}
    }

    pub fn stop(&mut self) {
        self.token += 1;
        self.stopped = true;
        self.goal_in_flight = false;
        self.news_in_flight = false;
    }

    fn request(&mut self, kind: RequestKind, world: &mut World, colony: &str, now: Instant) {
        let context = NarrativeContext::from_world(world, colony);
        let cooling_down = self.cooling_down(now);
        let Some(service) = self.service.clone().filter(|_| !cooling_down) else {
            self.fall_back(kind, world, &context);
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no async runtime, using local narrative");
            self.fall_back(kind, world, &context);
            return;
        };

        let token = self.token;
        let sender = self.sender.clone();
        match kind {
            RequestKind::Goal => {
                self.goal_in_flight = true;
                runtime.spawn(async move {
                    let payload = Payload::Goal(service.generate_goal(context).await);
                    let _ = sender.send(Reply { token, payload });
                });
            }
            RequestKind::News => {
                self.news_in_flight = true;
                runtime.spawn(async move {
                    let payload = Payload::News(service.generate_news(context).await);
                    let _ = sender.send(Reply { token, payload });
                });
            }
        }
    }

    fn apply_goal(
        &mut self,
        world: &mut World,
        colony: &str,
        result: Result<Option<AiGoal>, NarrativeError>,
        now: Instant,
    ) {
        match result {
            Ok(Some(goal)) => {
                self.goal_failures = 0;
                if world.goal().is_some() {
                    return;
                }
                if !world.offer_goal(goal) {
                    warn!("narrative service produced an unusable goal");
                    let context = NarrativeContext::from_world(world, colony);
                    self.fall_back(RequestKind::Goal, world, &context);
                }
            }
            Ok(None) => {
                self.goal_failures = 0;
                let context = NarrativeContext::from_world(world, colony);
                self.fall_back(RequestKind::Goal, world, &context);
            }
            Err(err) => {
                if self.record_failure(RequestKind::Goal, &err, now) {
                    let context = NarrativeContext::from_world(world, colony);
                    self.fall_back(RequestKind::Goal, world, &context);
                }
            }
        }
    }

    fn apply_news(
        &mut self,
        world: &mut World,
        colony: &str,
        result: Result<Option<NewsDraft>, NarrativeError>,
        now: Instant,
    ) {
        match result {
            Ok(Some(draft)) if !draft.text.trim().is_empty() => {
                self.news_failures = 0;
                self.publish(world, draft);
            }
            Ok(_) => {
                self.news_failures = 0;
                let context = NarrativeContext::from_world(world, colony);
                self.fall_back(RequestKind::News, world, &context);
            }
            Err(err) => {
                if self.record_failure(RequestKind::News, &err, now) {
                    let context = NarrativeContext::from_world(world, colony);
                    self.fall_back(RequestKind::News, world, &context);
                }
            }
        }
    }

    fn failures_mut(&mut self, kind: RequestKind) -> &mut u32 {
        match kind {
            RequestKind::Goal => &mut self.goal_failures,
            RequestKind::News => &mut self.news_failures,
        }
    }

    /// Returns true when the caller should use the fallback right away
    /// rather than wait for a retry. Goal and news failures are counted
    /// separately.
    fn record_failure(&mut self, kind: RequestKind, err: &NarrativeError, now: Instant) -> bool {
        if err.is_throttling() {
            warn!(error = %err, cooldown_secs = self.cooldown.as_secs(), "narrative service throttled");
            self.cooldown_until = Some(now + self.cooldown);
            *self.failures_mut(kind) = 0;
            return true;
        }
        let max_failures = self.max_failures;
        let failures = self.failures_mut(kind);
        *failures += 1;
        let count = *failures;
        warn!(error = %err, ?kind, failures = count, "narrative request failed");
        if count >= max_failures {
            *self.failures_mut(kind) = 0;
            true
        } else {
            self.retry_at = Some(now + self.retry_delay);
            false
        }
    }

    fn fall_back(&mut self, kind: RequestKind, world: &mut World, context: &NarrativeContext) {
        match kind {
            RequestKind::Goal => {
                world.offer_goal(self.fallback.goal(context));
            }
            RequestKind::News => {
                let draft = self.fallback.news(context);
                self.publish(world, draft);
            }
        }
    }

    fn publish(&mut self, world: &mut World, draft: NewsDraft) {
        let day = world.stats().day;
        world.news_mut().push(day, draft.text, draft.sentiment);
        self.next_news_day = day + self.news_interval_days;
    }
}
