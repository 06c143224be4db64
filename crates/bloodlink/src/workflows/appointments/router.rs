use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::access::Requester;
use super::domain::{
    parse_time_of_day, AppointmentId, AppointmentStatus, BookingRequest, DonationType, UserId,
};
use super::eligibility::not_eligible_message;
use super::repository::{AppointmentRepository, HospitalDirectory};
use super::service::{AppointmentService, BookingError};

/// Uniform response body: `{ success, message, data }`.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Raw booking body; every field is validated before reaching the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingPayload {
    pub hospital_id: u64,
    pub donation_type: String,
    pub date: String,
    pub time: String,
}

impl BookingPayload {
    pub fn into_request(self) -> Result<BookingRequest, BookingError> {
        let donation_type = self.donation_type.parse::<DonationType>()?;
        let date = chrono::NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(
            |err| {
                BookingError::InvalidArgument(format!(
                    "failed to parse '{}' as YYYY-MM-DD ({err})",
                    self.date
                ))
            },
        )?;
        let time = parse_time_of_day(&self.time).map_err(BookingError::InvalidArgument)?;

        Ok(BookingRequest {
            hospital_id: UserId(self.hospital_id),
            donation_type,
            date,
            time,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EligibilityQuery {
    pub donation_type: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HospitalQuery {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
    pub status: String,
}

/// Router builder exposing booking, history, and lifecycle endpoints.
pub fn appointment_router<R, H>(service: Arc<AppointmentService<R, H>>) -> Router
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/appointments",
            post(book_handler::<R, H>).get(list_handler::<R, H>),
        )
        .route("/api/v1/appointments/next", get(next_handler::<R, H>))
        .route(
            "/api/v1/appointments/:appointment_id/status",
            patch(status_handler::<R, H>),
        )
        .route("/api/v1/donations", get(history_handler::<R, H>))
        .route("/api/v1/eligibility", get(eligibility_handler::<R, H>))
        .route("/api/v1/hospitals", get(hospitals_handler::<R, H>))
        .with_state(service)
}

/// Extractor rejections become `InvalidArgument` so they share the JSON envelope.
fn malformed_request(rejection: impl std::fmt::Display) -> BookingError {
    BookingError::InvalidArgument(rejection.to_string())
}

pub(crate) async fn book_handler<R, H>(
    State(service): State<Arc<AppointmentService<R, H>>>,
    headers: HeaderMap,
    payload: Result<Json<BookingPayload>, JsonRejection>,
) -> Response
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    let result = Requester::from_headers(&headers)
        .map_err(BookingError::from)
        .and_then(|requester| {
            let Json(payload) = payload.map_err(malformed_request)?;
            let request = payload.into_request()?;
            service.book_appointment(&requester, request)
        });

    match result {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiEnvelope::ok("Appointment booked.", record)),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_handler<R, H>(
    State(service): State<Arc<AppointmentService<R, H>>>,
    headers: HeaderMap,
) -> Response
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    let result = Requester::from_headers(&headers)
        .map_err(BookingError::from)
        .and_then(|requester| service.list_appointments(&requester));

    match result {
        Ok(records) => Json(ApiEnvelope::ok("Appointments retrieved.", records)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn next_handler<R, H>(
    State(service): State<Arc<AppointmentService<R, H>>>,
    headers: HeaderMap,
) -> Response
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    let result = Requester::from_headers(&headers)
        .map_err(BookingError::from)
        .and_then(|requester| service.next_appointment(&requester));

    match result {
        Ok(Some(record)) => {
            Json(ApiEnvelope::ok("Next appointment retrieved.", record)).into_response()
        }
        Ok(None) => Json(ApiEnvelope::<()> {
            success: true,
            message: "No upcoming appointment.".to_string(),
            data: None,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn history_handler<R, H>(
    State(service): State<Arc<AppointmentService<R, H>>>,
    headers: HeaderMap,
) -> Response
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    let result = Requester::from_headers(&headers)
        .map_err(BookingError::from)
        .and_then(|requester| service.donation_history(&requester));

    match result {
        Ok(history) => {
            Json(ApiEnvelope::ok("Donation history retrieved.", history)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn eligibility_handler<R, H>(
    State(service): State<Arc<AppointmentService<R, H>>>,
    headers: HeaderMap,
    query: Result<Query<EligibilityQuery>, QueryRejection>,
) -> Response
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    let result = Requester::from_headers(&headers)
        .map_err(BookingError::from)
        .and_then(|requester| {
            let Query(query) = query.map_err(malformed_request)?;
            let donation_type = query.donation_type.parse::<DonationType>()?;
            service.eligibility(&requester, donation_type)
        });

    match result {
        Ok(decision) => {
            let message = decision.summary();
            Json(ApiEnvelope::ok(message, decision)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn status_handler<R, H>(
    State(service): State<Arc<AppointmentService<R, H>>>,
    headers: HeaderMap,
    appointment_id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<StatusUpdatePayload>, JsonRejection>,
) -> Response
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    let result = Requester::from_headers(&headers)
        .map_err(BookingError::from)
        .and_then(|requester| {
            let Path(appointment_id) = appointment_id.map_err(malformed_request)?;
            let Json(payload) = payload.map_err(malformed_request)?;
            let status = payload.status.parse::<AppointmentStatus>()?;
            service.update_status(&requester, AppointmentId(appointment_id), status)
        });

    match result {
        Ok(record) => {
            Json(ApiEnvelope::ok("Appointment status updated.", record)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn hospitals_handler<R, H>(
    State(service): State<Arc<AppointmentService<R, H>>>,
    headers: HeaderMap,
    query: Result<Query<HospitalQuery>, QueryRejection>,
) -> Response
where
    R: AppointmentRepository + 'static,
    H: HospitalDirectory + 'static,
{
    let result = Requester::from_headers(&headers)
        .map_err(BookingError::from)
        .and_then(|_| {
            let Query(query) = query.map_err(malformed_request)?;
            service.hospitals(query.city.as_deref())
        });

    match result {
        Ok(hospitals) => Json(ApiEnvelope::ok("Hospitals retrieved.", hospitals)).into_response(),
        Err(err) => err.into_response(),
    }
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::NotEligible { .. } => StatusCode::BAD_REQUEST,
            BookingError::InvalidArgument(_)
            | BookingError::UnknownHospital(_)
            | BookingError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            BookingError::Forbidden(_)
            | BookingError::ListingRestricted(_)
            | BookingError::ForeignAppointment(_) => StatusCode::FORBIDDEN,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = match &self {
            BookingError::NotEligible { next_eligible_date } => json!({
                "success": false,
                "message": not_eligible_message(*next_eligible_date),
                "data": { "next_eligible_date": next_eligible_date },
            }),
            BookingError::PersistenceFailure(source) => {
                error!(error = %source, "appointment storage failed");
                json!({
                    "success": false,
                    "message": "internal server error",
                    "data": null,
                })
            }
            other => json!({
                "success": false,
                "message": other.to_string(),
                "data": null,
            }),
        };

        (status, Json(payload)).into_response()
    }
}
