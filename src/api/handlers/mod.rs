use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::geometry::Transform;
use crate::groups::GroupSource;
use crate::host::EntityHost;
use crate::intercept::HookResult;
use crate::models::*;

// ============================================================
// Request / Response types
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootRequest {
    pub actor: Actor,
    pub container_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub actor: Actor,
    pub rig_id: Uuid,
}

/// Answer to a hook call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookResponse {
    pub result: HookResult,
    /// The host must take one code lock from the player's active slot.
    pub consume_item: bool,
    /// Chat lines for the acting player, already localized.
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEntryRequest {
    pub player_id: PlayerId,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEntryResponse {
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRequest {
    pub player_id: PlayerId,
    pub permission: String,
}

/// One team, friend circle or clan roster. Clans need a `tag`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRequest {
    #[serde(default)]
    pub tag: Option<String>,
    pub members: Vec<PlayerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateView {
    #[serde(flatten)]
    pub gate: Gate,
    pub world_transform: Option<Transform>,
}

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn not_found(what: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Rigs
// ============================================================

pub async fn create_rig(
    State(state): State<AppState>,
    Json(input): Json<CreateRigInput>,
) -> (StatusCode, Json<Rig>) {
    let rig = state
        .world
        .lock()
        .expect("world lock poisoned")
        .spawn_rig(input);
    tracing::info!("Spawned {} rig {}", rig.variant.as_str(), rig.id);
    (StatusCode::CREATED, Json(rig))
}

pub async fn get_rig(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Rig>, (StatusCode, String)> {
    let world = state.world.lock().expect("world lock poisoned");
    world
        .rig(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Rig"))
}

// ============================================================
// Gates
// ============================================================

fn gate_view(world: &crate::world::World, gate: &Gate) -> GateView {
    GateView {
        gate: gate.clone(),
        world_transform: world.gate_world_transform(gate.id),
    }
}

pub async fn list_gates(State(state): State<AppState>) -> Json<Vec<GateView>> {
    let world = state.world.lock().expect("world lock poisoned");
    let mut gates: Vec<GateView> = world.gates().map(|g| gate_view(&world, g)).collect();
    gates.sort_by_key(|v| v.gate.created_at);
    Json(gates)
}

pub async fn get_gate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GateView>, (StatusCode, String)> {
    let world = state.world.lock().expect("world lock poisoned");
    world
        .gate(id)
        .map(|g| Json(gate_view(&world, g)))
        .ok_or_else(|| not_found("Gate"))
}

/// Keypad entry on a gate.
pub async fn enter_code(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CodeEntryRequest>,
) -> Result<Json<CodeEntryResponse>, (StatusCode, String)> {
    let mut world = state.world.lock().expect("world lock poisoned");
    let gate = world.gate_mut(id).ok_or_else(|| not_found("Gate"))?;
    let accepted = gate.enter_code(input.player_id, &input.code);
    Ok(Json(CodeEntryResponse { accepted }))
}

// ============================================================
// Hooks
// ============================================================

fn hook_response(state: &AppState, player: PlayerId, result: HookResult) -> HookResponse {
    let messages = state
        .world
        .lock()
        .expect("world lock poisoned")
        .take_messages_for(player);

    HookResponse {
        result,
        consume_item: result == HookResult::Handled,
        messages,
    }
}

pub async fn loot_hook(
    State(state): State<AppState>,
    Json(input): Json<LootRequest>,
) -> Json<HookResponse> {
    let result = state.plugin.on_loot_entity(&input.actor, input.container_id);
    Json(hook_response(&state, input.actor.id, result))
}

pub async fn toggle_hook(
    State(state): State<AppState>,
    Json(input): Json<ToggleRequest>,
) -> Json<HookResponse> {
    let result = state.plugin.on_engine_toggle(&input.actor, input.rig_id);
    Json(hook_response(&state, input.actor.id, result))
}

// ============================================================
// Administration
// ============================================================

pub async fn grant_permission(
    State(state): State<AppState>,
    Json(input): Json<GrantRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !state.permissions.is_registered(&input.permission) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Unknown permission '{}'", input.permission),
        ));
    }
    state.permissions.grant(input.player_id, &input.permission);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_group(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Json(input): Json<GroupRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let source: GroupSource = source.parse().map_err(|_| not_found("Group source"))?;
    let groups = state.groups.get(source);

    match (source, input.tag.as_deref()) {
        (GroupSource::Clan, Some(tag)) if !tag.is_empty() => groups.add_clan(tag, &input.members),
        (GroupSource::Clan, _) => {
            return Err((StatusCode::BAD_REQUEST, "Clan groups need a tag".to_string()));
        }
        _ => groups.add_group(&input.members),
    }
    tracing::info!(
        "Updated {} group of {} players",
        source.as_str(),
        input.members.len()
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn save(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    let Some(db) = &state.db else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "No database configured".to_string(),
        ));
    };
    let snapshot = state.world.lock().expect("world lock poisoned").snapshot();
    db.save_world(&snapshot).map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}
