//! # Server Configuration
//!
//! Router setup, shared state and the serve loop for the GitHub mirror API.
//! The leader process also runs the sync scheduler alongside the listener.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AppConfig, SchedulerRole};
use crate::handlers;
use crate::scheduler::{ScheduleHandle, SyncScheduler};
use crate::sync_executor::SyncExecutor;
use crate::telemetry::{TraceContext, with_trace_context};

/// Response header carrying the request's trace id.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    /// Next planned sync; empty on followers
    pub schedule: ScheduleHandle,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health))
        .route("/api/github/data", get(handlers::github::get_sync_data))
        .route("/api/github/sync/status", get(handlers::github::get_sync_status))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(trace_context_middleware)),
        )
}

/// Starts the server, and on the leader the sync scheduler, until Ctrl-C.
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
    role: SchedulerRole,
) -> Result<()> {
    let addr = config.bind_addr().context("Invalid server address")?;
    let config = Arc::new(config);
    let schedule = ScheduleHandle::new();
    let shutdown = CancellationToken::new();

    let scheduler_task = match role {
        SchedulerRole::Leader => {
            let executor = SyncExecutor::new(&config, Arc::new(db.clone()))
                .context("Failed to build GitHub client")?;
            let scheduler = SyncScheduler::new(
                Arc::new(executor),
                config.sync.interval(),
                schedule.clone(),
            );
            Some(tokio::spawn(scheduler.run(shutdown.clone())))
        }
        SchedulerRole::Follower => {
            info!("Running as follower; sync scheduler not started");
            None
        }
    };

    let state = AppState {
        config: config.clone(),
        db,
        schedule,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, profile = %config.profile, "Server listening");

    let signal_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
            signal_token.cancel();
        })
        .await
        .context("axum server error")?;

    shutdown.cancel();
    if let Some(task) = scheduler_task
        && let Err(err) = task.await
    {
        warn!(error = %err, "Sync scheduler task ended abnormally");
    }

    Ok(())
}

async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let context = TraceContext::generate("req");
    let trace_id = context.trace_id.clone();
    request.extensions_mut().insert(context.clone());

    let mut response = with_trace_context(context, next.run(request)).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET])
        .allow_headers(Any)
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::github::get_sync_data,
        crate::handlers::github::get_sync_status,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::SyncStatus,
            crate::handlers::HealthResponse,
            crate::handlers::github::UserInfo,
            crate::handlers::github::RepoInfo,
            crate::handlers::github::GitHubDataResponse,
            crate::handlers::github::SyncStatusResponse,
            crate::error::ApiError,
        )
    ),
    tags(
        (name = "root", description = "Service information"),
        (name = "health", description = "Liveness and database reachability"),
        (name = "github", description = "Mirrored GitHub profile and sync state"),
    ),
    info(
        title = "GitHub Mirror API",
        description = "Read API over the locally mirrored GitHub profile and repositories",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
