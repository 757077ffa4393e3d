//! Web server module with JWT authentication

pub mod auth;
pub mod http;

use anyhow::{Context, Result};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::ai::{LlmClient, Tutor};
use crate::config::Config;
use crate::server::auth::{AuthConfig, AuthState};
use crate::store::{ActiveStore, PersistenceGateway};

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub gateway: Arc<PersistenceGateway>,
    pub auth_state: Arc<AuthState>,
    pub tutor: Arc<dyn Tutor>,
}

impl ServerState {
    pub fn new(
        config: Config,
        gateway: PersistenceGateway,
        auth_state: Arc<AuthState>,
        tutor: Arc<dyn Tutor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
            auth_state,
            tutor,
        }
    }
}

/// Handlers receive the store picked for their request; the gateway is
/// consulted exactly once per request.
impl FromRequestParts<ServerState> for ActiveStore {
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        Ok(state.gateway.select().await)
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::from(Any)
    } else {
        match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!("Invalid CORS origin {:?} ({}), allowing any origin", origin, e);
                AllowOrigin::from(Any)
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router
pub fn router(state: ServerState) -> Router {
    let require_auth = middleware::from_fn_with_state(state.auth_state.clone(), auth::auth_middleware);

    // Protected routes (require JWT auth)
    let protected = Router::new()
        .route(
            "/api/students/profile",
            get(http::get_profile_handler).put(http::update_profile_handler),
        )
        .route("/api/queries/submit", post(http::submit_query_handler))
        .route("/api/queries/my-queries", get(http::my_queries_handler))
        .route("/api/queries/{id}/feedback", post(http::feedback_handler))
        .route("/api/queries/statistics", get(http::statistics_handler))
        .route("/api/queries/statistics/analysis", get(http::analysis_handler))
        .route(
            "/api/queries/recommendations/personalized",
            get(http::recommendations_handler),
        )
        .route(
            "/api/learning-materials/{id}",
            get(http::get_material_handler)
                .put(http::update_material_handler)
                .delete(http::delete_material_handler),
        )
        .layer(require_auth.clone());

    // Public routes (no auth required). Listing materials is public, adding
    // one is not.
    let public = Router::new()
        .route("/api/health", get(http::health_handler))
        .route("/api/students/register", post(http::register_handler))
        .route("/api/students/login", post(http::login_handler))
        .route(
            "/api/learning-materials",
            get(http::list_materials_handler)
                .merge(post(http::create_material_handler).route_layer(require_auth)),
        );

    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load()?;
    config.ensure_jwt_secret()?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let gateway = PersistenceGateway::from_config(&config.storage).await;
    let durable_up = gateway.probe().await;
    let auth_state = AuthState::new(AuthConfig::from_settings(&config.auth));
    let tutor: Arc<dyn Tutor> = Arc::new(LlmClient::from_config(&config.llm));

    let state = ServerState::new(config, gateway, auth_state, tutor);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid listen address")?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("     EduSmart API Server Starting");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("✓ Server binding to: {}", addr);
    if durable_up {
        println!("✓ Storage: durable (production mode)");
    } else {
        println!("⚠ Storage: in-memory (demo mode)");
        println!("  Demo login: {}", crate::store::memory::DEMO_EMAIL);
    }
    println!("✓ JWT authentication enabled");
    println!();
    println!("🚀 Listening on http://{}/api", addr);
    println!();

    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
