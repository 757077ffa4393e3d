//! HTTP handlers
//!
//! Every handler returns either a `{ "success": true, ... }` body or an
//! `AppError`, which renders the matching failure envelope.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::identity::{self, Credentials, ProfileUpdate, Registration, Session};
use crate::materials::{self, MaterialQuery, NewMaterial};
use crate::pagination::PageRequest;
use crate::server::auth::Claims;
use crate::server::ServerState;
use crate::store::{ActiveStore, MaterialPatch, StoreMode};
use crate::tutoring::{queries, recommendations, statistics, FeedbackInput, NewQuery};

/// JSON body whose rejections become validation errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections become validation errors
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

fn session_body(message: &str, mode: StoreMode, session: Session) -> serde_json::Value {
    json!({
        "success": true,
        "message": message,
        "token": session.token,
        "mode": mode,
        "student": session.learner,
    })
}

/// Liveness plus the mode a request would currently be served in
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let connected = state.gateway.probe().await;
    let mode = if connected { StoreMode::Production } else { StoreMode::Demo };

    Json(json!({
        "success": true,
        "message": "EduSmart API is running",
        "databaseConnected": connected,
        "mode": mode,
        "timestamp": Utc::now(),
    }))
}

pub async fn register_handler(
    State(state): State<ServerState>,
    store: ActiveStore,
    ApiJson(input): ApiJson<Registration>,
) -> AppResult<impl IntoResponse> {
    let session = identity::register(&store, &state.auth_state, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(session_body("Student registered successfully", store.mode, session)),
    ))
}

pub async fn login_handler(
    State(state): State<ServerState>,
    store: ActiveStore,
    ApiJson(credentials): ApiJson<Credentials>,
) -> AppResult<impl IntoResponse> {
    let session = identity::login(&store, &state.auth_state, &state.config.demo, credentials).await?;
    Ok(Json(session_body("Login successful", store.mode, session)))
}

pub async fn get_profile_handler(
    Extension(claims): Extension<Claims>,
    store: ActiveStore,
) -> AppResult<impl IntoResponse> {
    let profile = identity::profile(&store, &claims.sub).await?;
    Ok(Json(json!({
        "success": true,
        "student": profile.learner,
        "recentQueries": profile.recent_queries,
    })))
}

pub async fn update_profile_handler(
    Extension(claims): Extension<Claims>,
    store: ActiveStore,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> AppResult<impl IntoResponse> {
    let learner = identity::update_profile(&store, &claims.sub, update).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "student": learner,
    })))
}

pub async fn submit_query_handler(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    store: ActiveStore,
    ApiJson(input): ApiJson<NewQuery>,
) -> AppResult<impl IntoResponse> {
    let query = queries::submit(&store, state.tutor.as_ref(), &claims.sub, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Query submitted successfully",
            "query": query,
        })),
    ))
}

pub async fn my_queries_handler(
    Extension(claims): Extension<Claims>,
    store: ActiveStore,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> AppResult<impl IntoResponse> {
    let listing = queries::list_for_learner(&store, &claims.sub, page).await?;
    Ok(Json(json!({
        "success": true,
        "queries": listing.queries,
        "pagination": listing.pagination,
    })))
}

pub async fn feedback_handler(
    Path(query_id): Path<String>,
    store: ActiveStore,
    ApiJson(input): ApiJson<FeedbackInput>,
) -> AppResult<impl IntoResponse> {
    let query = queries::submit_feedback(&store, &query_id, input).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Feedback submitted successfully",
        "query": query,
    })))
}

pub async fn statistics_handler(
    Extension(claims): Extension<Claims>,
    store: ActiveStore,
) -> AppResult<impl IntoResponse> {
    let statistics = statistics::compute(&store, &claims.sub).await?;
    Ok(Json(json!({
        "success": true,
        "statistics": statistics,
    })))
}

pub async fn analysis_handler(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    store: ActiveStore,
) -> AppResult<impl IntoResponse> {
    let analysis = statistics::analyze(&store, state.tutor.as_ref(), &claims.sub).await?;
    Ok(Json(json!({
        "success": true,
        "analysis": analysis.analysis,
        "metrics": analysis.metrics,
    })))
}

pub async fn recommendations_handler(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    store: ActiveStore,
) -> AppResult<impl IntoResponse> {
    let recommendation = recommendations::compose(&store, state.tutor.as_ref(), &claims.sub).await?;
    Ok(Json(json!({
        "success": true,
        "recommendations": recommendation,
    })))
}

pub async fn list_materials_handler(
    store: ActiveStore,
    ApiQuery(query): ApiQuery<MaterialQuery>,
) -> AppResult<impl IntoResponse> {
    let listing = materials::list(&store, query).await?;
    Ok(Json(json!({
        "success": true,
        "materials": listing.materials,
        "pagination": listing.pagination,
    })))
}

pub async fn get_material_handler(
    Path(id): Path<String>,
    store: ActiveStore,
) -> AppResult<impl IntoResponse> {
    let material = materials::get(&store, &id).await?;
    Ok(Json(json!({
        "success": true,
        "material": material,
    })))
}

pub async fn create_material_handler(
    store: ActiveStore,
    ApiJson(input): ApiJson<NewMaterial>,
) -> AppResult<impl IntoResponse> {
    let material = materials::create(&store, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Learning material created successfully",
            "material": material,
        })),
    ))
}

pub async fn update_material_handler(
    Path(id): Path<String>,
    store: ActiveStore,
    ApiJson(patch): ApiJson<MaterialPatch>,
) -> AppResult<impl IntoResponse> {
    let material = materials::update(&store, &id, patch).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Learning material updated successfully",
        "material": material,
    })))
}

pub async fn delete_material_handler(
    Path(id): Path<String>,
    store: ActiveStore,
) -> AppResult<impl IntoResponse> {
    materials::delete(&store, &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Learning material deleted successfully",
    })))
}
