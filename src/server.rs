use anyhow::{bail, Result};
use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::{net::Ipv4Addr, sync::Arc, time::Duration};
use tokio::sync::watch;
use tower::{Layer, ServiceBuilder};
use tower_http::{
    cors::CorsLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::command::Command;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::led::{LedColor, LedController};
use crate::motord::MotorLink;
use crate::netinfo;
use crate::spa::Spa;

/// Response header carrying the round-trip sequence number of a motor command.
pub const COMMAND_SEQ_HEADER: &str = "x-command-seq";

/// Set once when the control substrate fails; stops the server.
#[derive(Debug, Clone)]
pub struct FatalSignal {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl FatalSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Records the first fatal reason; later ones are ignored.
    pub fn trip(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }

    pub fn reason(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub async fn tripped(&self) -> String {
        let mut rx = self.tx.subscribe();
        let reason = rx
            .wait_for(Option::is_some)
            .await
            .map(|reason| reason.clone().unwrap_or_default());
        match reason {
            Ok(reason) => reason,
            // the sender lives as long as self
            Err(_) => std::future::pending().await,
        }
    }
}

impl Default for FatalSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    motord: Arc<MotorLink>,
    leds: Arc<LedController>,
    spa: Arc<Spa>,
    fatal: FatalSignal,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            motord: Arc::new(MotorLink::new(&config.motord_folder, config.settle)),
            leds: Arc::new(LedController::new(&config.blue_led, &config.yellow_led)),
            spa: Arc::new(Spa::new(&config.static_root, config.index_file.clone())),
            fatal: FatalSignal::new(),
            request_timeout: config.request_timeout,
        }
    }

    pub fn fatal(&self) -> &FatalSignal {
        &self.fatal
    }

    /// Logs `err` and, when it is fatal, asks the server to stop.
    fn escalate(&self, err: GatewayError) -> GatewayError {
        if err.is_fatal() {
            error!("💥 {}", err);
            self.fatal.trip(err.to_string());
        } else {
            warn!("⚠️ {}", err);
        }
        err
    }

    async fn run_command(&self, command: Command) -> Result<Response, GatewayError> {
        let trip = self
            .motord
            .execute(&command)
            .await
            .map_err(|e| self.escalate(e))?;

        Ok((
            [(COMMAND_SEQ_HEADER, trip.seq.to_string())],
            trip.status.outcome().as_str(),
        )
            .into_response())
    }
}

#[derive(Debug, Deserialize)]
struct MoveParams {
    motor: String,
    direction: String,
    steps: String,
}

#[derive(Debug, Deserialize)]
struct GotoParams {
    hor: String,
    ver: String,
}

#[derive(Debug, Deserialize)]
struct LedParams {
    color: String,
    value: String,
}

async fn motor_move_handler(
    State(state): State<AppState>,
    Path(params): Path<MoveParams>,
) -> Result<Response, GatewayError> {
    let command = Command::motor_move(&params.motor, &params.direction, &params.steps);
    state.run_command(command).await
}

async fn motor_goto_handler(
    State(state): State<AppState>,
    Path(params): Path<GotoParams>,
) -> Result<Response, GatewayError> {
    state.run_command(Command::goto(&params.hor, &params.ver)).await
}

async fn led_control_handler(
    State(state): State<AppState>,
    Path(params): Path<LedParams>,
) -> Result<StatusCode, GatewayError> {
    let color = LedColor::from_name(&params.color);
    let on = params.value == "on";

    state
        .leds
        .set(color, on)
        .await
        .map_err(|e| state.escalate(e))?;

    Ok(StatusCode::OK)
}

async fn spa_handler(State(state): State<AppState>, req: Request) -> Response {
    state.spa.serve(req).await
}

/// Routes wrapped in trailing-slash trimming, so `/motor_goto/45/-10/` still
/// reaches its handler instead of the app fallback.
pub fn build_router(state: AppState) -> NormalizePath<Router> {
    let timeout = state.request_timeout;

    let router = Router::new()
        .route("/motor_move/:motor/:direction/:steps", get(motor_move_handler))
        .route("/motor_goto/:hor/:ver", get(motor_goto_handler))
        .route("/led_control/:color/:value", get(led_control_handler))
        .fallback(spa_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state);

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn shutdown_signal(fatal: FatalSignal) {
    tokio::select! {
        reason = fatal.tripped() => {
            error!("🛑 shutting down: {}", reason);
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            info!("🛑 shutting down");
        }
    }
}

/// Binds the listener and serves until ctrl-c or a fatal substrate error.
pub async fn run(config: GatewayConfig) -> Result<()> {
    let state = AppState::new(&config);
    let fatal = state.fatal().clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;

    let host = netinfo::local_ipv4()?.unwrap_or(Ipv4Addr::UNSPECIFIED);
    info!("🚀 Server started at http://{}:{}", host, config.port);
    info!("📁 motord folder: {:?}", config.motord_folder);
    info!("🌐 static root: {:?}", config.static_root);

    axum::serve(listener, axum::ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal(fatal.clone()))
        .await?;

    if let Some(reason) = fatal.reason() {
        bail!(reason);
    }
    Ok(())
}
