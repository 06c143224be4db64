use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use bloodlink::workflows::appointments::{
    appointment_router, AppointmentRepository, AppointmentService, DonationType,
    HospitalDirectory,
};
use bloodlink::workflows::appointments::eligibility::minimum_interval_days;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct IntervalEntry {
    pub(crate) donation_type: DonationType,
    pub(crate) label: &'static str,
    pub(crate) minimum_interval_days: u32,
}

pub(crate) fn with_appointment_routes<R, H>(service: Arc<AppointmentService<R, H>>) -> axum::Router
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    appointment_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/donation-intervals",
            axum::routing::get(intervals_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Published eligibility windows so clients can explain rejections up front.
pub(crate) async fn intervals_endpoint() -> Json<serde_json::Value> {
    let intervals: Vec<IntervalEntry> = DonationType::ALL
        .into_iter()
        .map(|donation_type| IntervalEntry {
            donation_type,
            label: donation_type.label(),
            minimum_interval_days: minimum_interval_days(donation_type),
        })
        .collect();

    Json(json!({
        "success": true,
        "message": "Donation intervals retrieved.",
        "data": intervals,
    }))
}
