use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{
    net::TcpListener,
    sync::{broadcast, watch},
    time::MissedTickBehavior,
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    catalog::BuildingKind,
    config::ColonyConfig,
    error::ActionError,
    placement::{Demolition, Placement},
    session::Session,
    tech::ResearchOutcome,
    world::ColonySnapshot,
};

/// One SSE message: the committed state after a tick or a player action.
#[derive(Clone, Serialize)]
pub struct Frame {
    pub tick: u64,
    pub snapshot: ColonySnapshot,
}

#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<Session>>,
    broadcaster: broadcast::Sender<String>,
}

impl AppState {
    /// Runs `action` under the session lock and broadcasts the result.
    fn commit<T>(&self, action: impl FnOnce(&mut Session) -> T) -> T {
        let (result, payload) = {
            let mut session = self.session.lock().expect("session lock poisoned");
            let result = action(&mut session);
            (result, frame_payload(&session))
        };
        if let Some(payload) = payload {
            let _ = self.broadcaster.send(payload);
        }
        result
    }
}

pub struct WebServerConfig {
    pub config: ColonyConfig,
    pub offline: bool,
    pub host: String,
    pub port: u16,
}

pub async fn run(server: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        config,
        offline,
        host,
        port,
    } = server;

    let period = config.tick_interval();
    let session = Arc::new(Mutex::new(Session::from_config(config, offline)?));
    let (tx, _) = broadcast::channel::<String>(512);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ticker = tokio::spawn(drive_ticks(
        session.clone(),
        tx.clone(),
        period,
        shutdown_rx,
    ));

    let state = AppState {
        session: session.clone(),
        broadcaster: tx,
    };
    let router = Router::new()
        .route("/api/state", get(current_state))
        .route("/api/events", get(stream_events))
        .route("/api/place", post(place))
        .route("/api/demolish", post(demolish))
        .route("/api/research", post(research))
        .route("/api/claim", post(claim))
        .route("/api/auto-build", post(auto_build))
        .route("/api/restart", post(restart))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "colony server listening (Ctrl+C to stop)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    if let Err(err) = ticker.await {
        warn!(%err, "tick task ended abnormally");
    }
    session.lock().expect("session lock poisoned").stop();
    Ok(())
}

/// The only ticker. Holds the lock for a whole tick so actions land before or after it.
async fn drive_ticks(
    session: Arc<Mutex<Session>>,
    broadcaster: broadcast::Sender<String>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }
        let payload = advance(&mut session.lock().expect("session lock poisoned"));
        if let Some(payload) = payload {
            let _ = broadcaster.send(payload);
        }
    }
}

/// Runs one tick and renders the frame. A failed tick stops the colony but
/// not the ticker, so a later restart picks up again.
fn advance(session: &mut Session) -> Option<String> {
    if session.is_stopped() {
        return None;
    }
    if let Err(err) = session.tick(Instant::now()) {
        warn!(error = %err, "tick failed, stopping colony");
        session.stop();
        return None;
    }
    frame_payload(session)
}

async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down colony server");
    let _ = shutdown.send(true);
}

fn frame_payload(session: &Session) -> Option<String> {
    let frame = Frame {
        tick: session.engine().ticks(),
        snapshot: session.snapshot(),
    };
    serde_json::to_string(&frame).ok()
}

/// A refused player action, reported as 409 with a notice for the overlay.
struct Rejection(ActionError);

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (
            StatusCode::CONFLICT,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

impl From<ActionError> for Rejection {
    fn from(err: ActionError) -> Self {
        Rejection(err)
    }
}

#[derive(Deserialize)]
struct PlaceRequest {
    kind: BuildingKind,
    x: usize,
    y: usize,
}

#[derive(Deserialize)]
struct TileRequest {
    x: usize,
    y: usize,
}

#[derive(Deserialize)]
struct ResearchRequest {
    tech: String,
}

#[derive(Deserialize)]
struct AutoBuildRequest {
    enabled: bool,
}

async fn current_state(State(state): State<AppState>) -> Json<ColonySnapshot> {
    let snapshot = state
        .session
        .lock()
        .expect("session lock poisoned")
        .snapshot();
    Json(snapshot)
}

async fn place(
    State(state): State<AppState>,
    Json(request): Json<PlaceRequest>,
) -> Result<Json<Placement>, Rejection> {
    let placement =
        state.commit(|session| session.place(request.kind, request.x, request.y))?;
    Ok(Json(placement))
}

async fn demolish(
    State(state): State<AppState>,
    Json(request): Json<TileRequest>,
) -> Result<Json<Demolition>, Rejection> {
    let demolition = state.commit(|session| session.demolish(request.x, request.y))?;
    Ok(Json(demolition))
}

async fn research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let outcome = state.commit(|session| session.research(&request.tech))?;
    let body = match outcome {
        ResearchOutcome::Unlocked { cost } => json!({ "unlocked": request.tech, "cost": cost }),
        ResearchOutcome::AlreadyUnlocked => json!({ "unlocked": request.tech, "cost": 0 }),
    };
    Ok(Json(body))
}

async fn claim(State(state): State<AppState>) -> Result<impl IntoResponse, Rejection> {
    let reward = state.commit(|session| session.claim_goal())?;
    Ok(Json(json!({ "reward": reward })))
}

async fn auto_build(
    State(state): State<AppState>,
    Json(request): Json<AutoBuildRequest>,
) -> impl IntoResponse {
    let enabled = state.commit(|session| session.set_auto_build(request.enabled));
    Json(json!({ "enabled": enabled }))
}

async fn restart(State(state): State<AppState>) -> Json<ColonySnapshot> {
    Json(state.commit(|session| {
        session.restart();
        session.snapshot()
    }))
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
