use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::IdentityService;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::models::SessionUser;
use crate::database::{RecordStore, Workspace};
use crate::handlers::{api, pages};
use crate::middleware::{require_user_middleware, session_middleware};
use crate::templates::Templates;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub identity: IdentityService,
    pub templates: Arc<Templates>,
    pub security: Arc<SecurityConfig>,
    request_logging: bool,
    max_request_size: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: &AppConfig) -> Result<Self, tera::Error> {
        Ok(Self {
            identity: IdentityService::new(store.clone(), &config.security),
            templates: Arc::new(Templates::new()?),
            security: Arc::new(config.security.clone()),
            request_logging: config.api.enable_request_logging,
            max_request_size: config.api.max_request_size_bytes,
            store,
        })
    }

    /// The signed-in user's scoped view of the store.
    pub fn workspace(&self, user: SessionUser) -> Workspace {
        Workspace::new(self.store.clone(), user)
    }
}

pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .merge(page_routes())
        .merge(auth_public_routes())
        .merge(api_routes())
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&state.security.cors_origins))
                .layer(DefaultBodyLimit::max(state.max_request_size)),
        );

    let router = if state.request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    router.with_state(state)
}

fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::auth::landing))
        .route("/login", get(pages::auth::login_form).post(pages::auth::login))
        .route("/signup", get(pages::auth::signup_form).post(pages::auth::signup))
        .route("/logout", post(pages::auth::logout))
        .route("/dashboard", get(pages::dashboard::show))
        .route("/clients", get(pages::clients::index).post(pages::clients::create))
        .route("/projects", get(pages::projects::index).post(pages::projects::create))
        .route("/projects/:id", get(pages::projects::show))
        .route("/projects/:id/tasks", post(pages::tasks::create))
        .route("/tasks/:id/toggle", post(pages::tasks::toggle))
        .route("/tasks/:id/delete", get(pages::tasks::confirm_delete).post(pages::tasks::delete))
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(api::health))
        .route("/auth/signup", post(api::auth::signup))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(api::auth::whoami))
        .route("/api/dashboard", get(api::dashboard))
        .route("/api/clients", get(api::clients::list).post(api::clients::create))
        .route("/api/projects", get(api::projects::list).post(api::projects::create))
        .route("/api/projects/:id", get(api::projects::show))
        .route("/api/projects/:id/tasks", get(api::tasks::list).post(api::tasks::create))
        .route("/api/tasks/:id/toggle", post(api::tasks::toggle))
        .route("/api/tasks/:id", axum::routing::delete(api::tasks::delete))
        .route_layer(middleware::from_fn(require_user_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(allowed))
}
