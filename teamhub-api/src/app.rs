/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use teamhub_api::{app::{build_router, AppState}, config::Config};
/// use teamhub_worker::scheduler::StatusScheduler;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let scheduler = StatusScheduler::new(pool.clone(), config.scheduler.clone())?;
/// let app = build_router(AppState::new(pool, config, scheduler));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use teamhub_shared::auth::middleware::{create_jwt_middleware, create_session_middleware};
use teamhub_worker::scheduler::StatusScheduler;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Status refresh, shared with the nightly loop so manual runs never overlap it
    pub scheduler: StatusScheduler,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, scheduler: StatusScheduler) -> Self {
        Self {
            db,
            config: Arc::new(config),
            scheduler,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /health                              public
/// /api/v1/auth/{login,register}        public
/// /api/v1/auth/{profile,logout}        bearer token
/// /api/v1/users/:id/profile            bearer token
/// /admin/{login,logout}                public
/// /admin/...                           admin session cookie
/// ```
///
/// Layers, outermost first: security headers, CORS, tracing, compression.
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{self, admin};

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/register", post(routes::auth::register));

    let jwt_routes = Router::new()
        .route("/auth/profile", get(routes::auth::profile))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/users/:id/profile", get(routes::users::user_profile))
        .route_layer(axum::middleware::from_fn(create_jwt_middleware(
            state.config.jwt.secret.clone(),
        )));

    let api_v1 = public_auth_routes.merge(jwt_routes);

    let admin_public = Router::new()
        .route("/login", post(admin::session::login))
        .route("/logout", post(admin::session::logout));

    let admin_protected = Router::new()
        .route(
            "/positions",
            get(admin::positions::list).post(admin::positions::create),
        )
        .route(
            "/positions/:id",
            get(admin::positions::show)
                .post(admin::positions::update)
                .put(admin::positions::update)
                .delete(admin::positions::delete),
        )
        .route("/positions/:id/edit", get(admin::positions::show))
        .route("/skills", get(admin::skills::list).post(admin::skills::create))
        .route("/skills/all", get(admin::skills::all))
        .route("/skills/import", post(admin::skills::import))
        .route("/skills/import/preview", post(admin::skills::preview))
        .route("/skills/import/sample", get(admin::skills::sample))
        .route(
            "/skills/:id",
            get(admin::skills::show)
                .post(admin::skills::update)
                .put(admin::skills::update)
                .delete(admin::skills::delete),
        )
        .route("/skills/:id/edit", get(admin::skills::show))
        .route("/teams", get(admin::teams::list).post(admin::teams::create))
        .route("/teams/export", get(admin::teams::export))
        .route("/teams/import", post(admin::teams::import))
        .route("/teams/import/preview", post(admin::teams::preview))
        .route("/teams/import/sample", get(admin::teams::sample))
        .route(
            "/teams/:id",
            get(admin::teams::show)
                .post(admin::teams::update)
                .put(admin::teams::update)
                .delete(admin::teams::delete),
        )
        .route("/teams/:id/edit", get(admin::teams::edit))
        .route("/teams/:id/statistics", get(admin::teams::statistics))
        .route("/teams/:id/members", post(admin::teams::add_members))
        .route(
            "/teams/:id/members/:user_id",
            axum::routing::delete(admin::teams::remove_member),
        )
        .route(
            "/projects",
            get(admin::projects::list).post(admin::projects::create),
        )
        .route("/projects/refresh-status", post(admin::projects::refresh_status))
        .route(
            "/projects/:id",
            get(admin::projects::show)
                .post(admin::projects::update)
                .put(admin::projects::update)
                .delete(admin::projects::delete),
        )
        .route("/projects/:id/cancel", post(admin::projects::cancel))
        .route("/users", get(admin::users::list).post(admin::users::create))
        .route(
            "/users/:id",
            get(admin::users::show)
                .post(admin::users::update)
                .put(admin::users::update)
                .delete(admin::users::delete),
        )
        .route("/activity-logs", get(admin::activity::list))
        .route_layer(axum::middleware::from_fn(create_session_middleware(
            state.db.clone(),
            state.config.session.cookie_name.clone(),
        )));

    let admin_routes = admin_public.merge(admin_protected);

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", api_v1)
        .nest("/admin", admin_routes)
        .fallback(routes::not_found)
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
