//! Route handlers for the catalog API.

use crate::error::ApiError;
use crate::params::ListParams;
use crate::server::AppState;
use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use sekela_core::CatalogError;
use sekela_core::model::Institution;
use sekela_core::seed::Seeder;
use sekela_query::insights::{InsightField, histogram_to_json, insights};
use sekela_query::wizard::{WizardPreferences, recommend};
use serde_json::{Value, json};

/// All API routes, without middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/universities", get(list_universities))
        .route("/universities/", get(list_universities))
        .route("/universities/{id}", get(get_university))
        .route("/wizard/recommendations", post(recommendations))
        .route("/insights/regions", get(region_insights))
        .route("/insights/types", get(type_insights))
        .route("/insights/difficulty", get(difficulty_insights))
        .route("/scrape", post(scrape))
        .route("/scrape/", post(scrape))
        .route("/scrape/refresh", post(refresh))
        .with_state(state)
}

async fn list_universities(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Institution>>, ApiError> {
    let skip = params.skip.unwrap_or(0);
    let limit = params.limit.unwrap_or(state.config.catalog.default_limit);
    let page = state
        .with_session(move |s| s.list_all(skip, limit))
        .await?;
    Ok(Json(page))
}

async fn get_university(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Institution>, ApiError> {
    let inst = state.with_session(move |s| s.require(id)).await?;
    Ok(Json(inst))
}

async fn recommendations(
    State(state): State<AppState>,
    Json(prefs): Json<WizardPreferences>,
) -> Result<Json<Vec<Institution>>, ApiError> {
    let results = state
        .with_session(move |s| recommend(s, &prefs))
        .await?;
    tracing::debug!(matches = results.len(), "wizard recommendations");
    Ok(Json(results))
}

async fn insight(state: &AppState, field: InsightField) -> Result<Json<Value>, ApiError> {
    let counts = state.with_session(move |s| insights(s, field)).await?;
    Ok(Json(histogram_to_json(&counts)))
}

async fn region_insights(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    insight(&state, InsightField::Region).await
}

async fn type_insights(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    insight(&state, InsightField::Type).await
}

async fn difficulty_insights(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    insight(&state, InsightField::Difficulty).await
}

/// Load dataset records that are not stored yet.
async fn scrape(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let _admin = state.admin().await;
    let dataset = state.dataset.clone();
    let report = state
        .with_session(move |s| Seeder::new(&dataset).seed(s))
        .await?;
    Ok(Json(json!({ "message": report.message() })))
}

/// Clear and reload the catalog. Failures come back as `{"error": ...}`.
async fn refresh(State(state): State<AppState>) -> Json<Value> {
    let _admin = state.admin().await;
    let dataset = state.dataset.clone();
    let result = state
        .with_session(move |s| Seeder::new(&dataset).refresh(s))
        .await;

    match result {
        Ok(report) => Json(json!({ "message": report.message() })),
        Err(e) => {
            let message = match e {
                ApiError::Catalog(err @ CatalogError::RefreshTransaction(_)) => err.to_string(),
                other => CatalogError::RefreshTransaction(other.to_string()).to_string(),
            };
            tracing::error!("{message}");
            Json(json!({ "error": message }))
        }
    }
}
