use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ValidationErrors};
use crate::inquiry::{InquiryFilter, InquiryForm, InquiryListParams};
use crate::models::{InquiryStatus, Property, PropertyInquiry};
use crate::search::{SearchParams, SearchQuery};
use crate::store::ListingStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ListingStore>,
}

pub fn app(store: Arc<dyn ListingStore>) -> Router {
    Router::new()
        .route("/properties", get(search_properties))
        .route("/properties/:id/track_view", post(track_view))
        .route("/properties/:id/inquire", post(inquire))
        .route("/inquiries", get(list_inquiries))
        .route("/inquiries/:id", patch(update_inquiry_status))
        .with_state(AppState { store })
}

/// Lists available properties matching the supplied filters.
async fn search_properties(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let query = SearchQuery::from_params(&params)?;
    let results = state.store.search(&query)?;
    info!("Search returned {} listings", results.len());
    Ok(Json(results))
}

/// Records a deduplicated view event for a listing.
async fn track_view(
    State(state): State<AppState>,
    Path(property_id): Path<i32>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let ip_address = client_ip(&headers, peer);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    state.store.record_view(property_id, &ip_address, user_agent)?;
    Ok(Json(json!({"status": "view tracked"})))
}

/// Submits a prospective-buyer inquiry against a listing.
async fn inquire(
    State(state): State<AppState>,
    Path(property_id): Path<i32>,
    Json(form): Json<InquiryForm>,
) -> Result<(StatusCode, Json<PropertyInquiry>), ApiError> {
    // The listing is resolved before the form is validated, so an unknown id
    // is a 404 even when the body is also bad.
    let property = state.store.get_property(property_id)?;
    form.validate()?;

    let inquiry = state.store.create_inquiry(property.id, &form)?;
    Ok((StatusCode::CREATED, Json(inquiry)))
}

/// Lists inquiries for review, newest first.
async fn list_inquiries(
    State(state): State<AppState>,
    Query(params): Query<InquiryListParams>,
) -> Result<Json<Vec<PropertyInquiry>>, ApiError> {
    let filter = InquiryFilter::from_params(&params)?;
    Ok(Json(state.store.list_inquiries(&filter)?))
}

#[derive(Debug, Deserialize)]
struct UpdateInquiryRequest {
    #[serde(default)]
    status: String,
}

/// Advances an inquiry through its review lifecycle.
async fn update_inquiry_status(
    State(state): State<AppState>,
    Path(inquiry_id): Path<i32>,
    Json(body): Json<UpdateInquiryRequest>,
) -> Result<Json<PropertyInquiry>, ApiError> {
    let next: InquiryStatus = body.status.parse().map_err(|()| {
        ValidationErrors::single("status", format!("\"{}\" is not a valid choice.", body.status))
    })?;
    Ok(Json(state.store.update_inquiry_status(inquiry_id, next)?))
}

/// Attribution address for view tracking: first entry of `X-Forwarded-For`
/// when present, else the direct peer. The header is trusted as-is, matching
/// the original deployment's proxy convention.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}
