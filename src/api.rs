use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::engine::{BookingEngine, BookingError, Occurrence, DATE_FORMAT};
use crate::model::{BookingRequest, DeleteCriteria, Reservation};

/// Routes for the booking form and the schedule display.
pub fn router(engine: Arc<BookingEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/reservations",
            get(list_handler).post(create_handler).delete(delete_handler),
        )
        .with_state(engine)
}

async fn health() -> &'static str {
    "ok"
}

// ── Errors ───────────────────────────────────────────────

/// Failure body: `{ success: false, errorKind, message }`.
pub struct ApiError(BookingError);

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        ApiError(e)
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(e: crate::store::StoreError) -> Self {
        ApiError(e.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError(BookingError::Validation(e.body_text()))
    }
}

fn status_for(e: &BookingError) -> StatusCode {
    match e {
        BookingError::Validation(_) => StatusCode::BAD_REQUEST,
        BookingError::Unauthorized => StatusCode::UNAUTHORIZED,
        BookingError::NotFound => StatusCode::NOT_FOUND,
        BookingError::Conflict(_) => StatusCode::CONFLICT,
        BookingError::Store(_) => StatusCode::BAD_GATEWAY,
    }
}

fn failure_body(e: &BookingError) -> Value {
    let mut body = json!({
        "success": false,
        "errorKind": e.kind(),
        "message": e.to_string(),
    });
    if let BookingError::Conflict(existing) = e {
        body["conflict"] = json!(existing);
    }
    body
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("request failed: {}", self.0);
        } else {
            debug!("request rejected: {}", self.0);
        }
        (status, Json(failure_body(&self.0))).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError(BookingError::Validation(message.into()))
}

// ── Queries ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub mode: Option<String>,
    pub room: Option<String>,
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str, mode: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| bad_request(format!("{name} is required for {mode}")))
}

fn query_date(value: &str, name: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| bad_request(format!("{name} {value:?} is not YYYY-MM-DD")))
}

async fn list_handler(
    State(engine): State<Arc<BookingEngine>>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let queries = engine.queries();
    let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

    let mode = match q.mode.as_deref().map(str::trim) {
        Some("") | None if has(&q.room) && has(&q.from) => "range",
        Some("") | None if has(&q.room) && has(&q.date) => "schedule",
        Some("") | None if has(&q.room) => "room",
        Some("") | None => "all",
        Some(mode) => mode,
    };

    let body = match mode {
        "rooms" => json!({ "rooms": queries.list_rooms() }),
        "slots" => json!({ "slots": queries.list_slots() }),
        "available" => {
            let room = required(&q.room, "room", mode)?;
            let date = required(&q.date, "date", mode)?;
            json!({ "slots": queries.available_slots(room, date).await? })
        }
        "schedule" => {
            let room = required(&q.room, "room", mode)?;
            let date = required(&q.date, "date", mode)?;
            json!({ "reservations": queries.list_by_room_and_date(room, date).await? })
        }
        "range" => {
            let room = required(&q.room, "room", mode)?;
            let from = query_date(required(&q.from, "from", mode)?, "from")?;
            let to = query_date(required(&q.to, "to", mode)?, "to")?;
            json!({ "reservations": queries.list_by_room_between(room, from, to).await? })
        }
        "room" => {
            let room = required(&q.room, "room", mode)?;
            json!({ "reservations": queries.list_by_room(room).await? })
        }
        "all" => json!({ "reservations": queries.list_all().await? }),
        other => return Err(bad_request(format!("unknown mode {other:?}"))),
    };
    metrics::counter!(crate::observability::QUERIES_TOTAL, "mode" => mode.to_string()).increment(1);
    Ok(Json(body))
}

// ── Mutations ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    #[serde(flatten)]
    pub request: BookingRequest,
    pub repeat_weeks: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OccurrenceReport<'a> {
    date: &'a str,
    success: bool,
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reservation: Option<&'a Reservation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
}

impl<'a> From<&'a Occurrence> for OccurrenceReport<'a> {
    fn from(o: &'a Occurrence) -> Self {
        Self {
            date: &o.date,
            success: o.is_created(),
            summary: o.summary(),
            reservation: o.outcome.as_ref().ok(),
            error_kind: o.outcome.as_ref().err().map(BookingError::kind),
        }
    }
}

async fn create_handler(
    State(engine): State<Arc<BookingEngine>>,
    body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    match body.repeat_weeks {
        Some(weeks) => {
            let report = engine.create_repeating(&body.request, weeks).await?;
            let created = report.iter().filter(|o| o.is_created()).count();
            let results: Vec<OccurrenceReport> = report.iter().map(Into::into).collect();
            Ok(Json(json!({
                "success": created > 0,
                "created": created,
                "results": results,
            })))
        }
        None => {
            let reservation = engine.create(&body.request).await?;
            Ok(Json(json!({ "success": true, "reservation": reservation })))
        }
    }
}

async fn delete_handler(
    State(engine): State<Arc<BookingEngine>>,
    body: Result<Json<DeleteCriteria>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(criteria) = body?;
    let removed = engine.delete(&criteria).await?;
    Ok(Json(json!({ "success": true, "reservation": removed })))
}
