mod handlers;
pub mod middleware;

use std::sync::{Arc, Mutex};

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::groups::GroupDirectory;
use crate::permissions::Permissions;
use crate::plugin::QuarryLock;
use crate::world::World;

pub use handlers::{
    CodeEntryRequest, CodeEntryResponse, GrantRequest, GroupRequest, HookResponse, LootRequest,
    ToggleRequest,
};
pub use middleware::SecurityConfig;

/// Shared state of the HTTP bridge.
///
/// `world` and the plugin's host handle are the same mutex; handlers lock
/// one or the other, never both at once.
#[derive(Clone)]
pub struct AppState {
    pub plugin: Arc<QuarryLock>,
    pub world: Arc<Mutex<World>>,
    pub permissions: Arc<Permissions>,
    /// Membership the host pushes in; the plugin's resolver reads it.
    pub groups: GroupDirectory,
    pub db: Option<Database>,
}

pub fn create_router(state: AppState) -> Router {
    create_router_with_security(state, SecurityConfig::disabled())
}

pub fn create_router_with_security(state: AppState, security: SecurityConfig) -> Router {
    let api = Router::new()
        // Rigs
        .route("/rigs", post(handlers::create_rig))
        .route("/rigs/{id}", get(handlers::get_rig))
        // Gates
        .route("/gates", get(handlers::list_gates))
        .route("/gates/{id}", get(handlers::get_gate))
        .route("/gates/{id}/code", post(handlers::enter_code))
        // Hooks
        .route("/hooks/loot", post(handlers::loot_hook))
        .route("/hooks/toggle", post(handlers::toggle_hook))
        // Administration
        .route("/permissions/grant", post(handlers::grant_permission))
        .route("/groups/{source}", post(handlers::set_group))
        .route("/save", post(handlers::save))
        .layer(from_fn_with_state(security, middleware::auth_middleware))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
