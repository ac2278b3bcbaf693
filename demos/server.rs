//! Simple REST API server example for the booking engine.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /shows` - Register a show
//! - `GET /shows` - List all shows
//! - `GET /shows/:id` - Get a show with its current availability
//! - `POST /reservations` - Book seats on a show
//! - `POST /reservations/:id/confirm` - Confirm a pending reservation
//! - `POST /reservations/:id/cancel` - Cancel and release the seats
//! - `POST /reservations/:id/complete` - Mark a confirmed reservation redeemed
//! - `GET /reservations` - List all reservations
//! - `GET /reservations/:id` - Get a reservation by ID
//! - `GET /reservation-events` - Audit trail, filterable by `?reservation_id=`
//!
//! ## Example Usage
//!
//! ```bash
//! # Register a show
//! curl -X POST http://localhost:3000/shows \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": 1, "movie_title": "Alien", "room": "Sala 1", "price_cents": 850, "total_seats": 50}'
//!
//! # Book two seats
//! curl -X POST http://localhost:3000/reservations \
//!   -H "Content-Type: application/json" \
//!   -d '{"show_id": 1, "customer_name": "Ana", "seats": 2, "source": "web"}'
//!
//! # Confirm the reservation
//! curl -X POST http://localhost:3000/reservations/1/confirm \
//!   -H "Content-Type: application/json" \
//!   -d '{"source": "box-office", "note": "paid in cash"}'
//!
//! # Inspect the audit trail
//! curl "http://localhost:3000/reservation-events?reservation_id=1"
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use cinema_booking_rs::{
    BookingError, Engine, EventType, Reservation, ReservationEvent, ReservationId,
    ReservationStatus, Show, ShowId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// === Request/Response DTOs ===

/// Request body for registering a show.
#[derive(Debug, Deserialize)]
pub struct CreateShowRequest {
    pub id: u32,
    pub movie_title: String,
    pub room: String,
    pub price_cents: u32,
    pub total_seats: u32,
}

/// Request body for booking seats.
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub show_id: u32,
    pub customer_name: String,
    pub seats: u32,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Request body for confirm/cancel/complete. The body may be omitted
/// entirely, in which case the source defaults to `web`.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl Default for TransitionRequest {
    fn default() -> Self {
        TransitionRequest {
            source: default_source(),
            note: None,
        }
    }
}

fn default_source() -> String {
    "web".to_string()
}

/// Response body for show information.
#[derive(Debug, Serialize)]
pub struct ShowResponse {
    pub id: u32,
    pub movie_title: String,
    pub room: String,
    pub price_cents: u32,
    pub total_seats: u32,
    pub available_seats: u32,
}

impl ShowResponse {
    /// Snapshots a show, including its current availability.
    fn from_show(show: &Show) -> Self {
        ShowResponse {
            id: show.id().0,
            movie_title: show.movie_title().to_string(),
            room: show.room().to_string(),
            price_cents: show.price_cents(),
            total_seats: show.total_seats(),
            available_seats: show.available_seats(),
        }
    }
}

/// Response body for reservation information.
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub id: u64,
    pub show_id: u32,
    pub customer_name: String,
    pub seats: u32,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReservationResponse {
    /// Snapshots a reservation under one state-lock acquisition.
    fn from_reservation(reservation: &Reservation) -> Self {
        let state = reservation.state();
        ReservationResponse {
            id: reservation.id().0,
            show_id: reservation.show_id().0,
            customer_name: reservation.customer_name().to_string(),
            seats: reservation.seats(),
            status: state.status(),
            created_at: reservation.created_at(),
            updated_at: state.updated_at(),
        }
    }
}

/// Response body for audit events.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: u64,
    pub reservation_id: u64,
    pub event_type: EventType,
    pub source: String,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl EventResponse {
    fn from_event(event: &ReservationEvent) -> Self {
        EventResponse {
            id: event.id().0,
            reservation_id: event.reservation_id().0,
            event_type: event.event_type(),
            source: event.source().to_string(),
            note: event.note().map(str::to_string),
            occurred_at: event.occurred_at(),
        }
    }
}

/// Pagination envelope for list endpoints.
///
/// Single page for now: `next` and `previous` are always null.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    fn of(results: Vec<T>) -> Self {
        Page {
            count: results.len(),
            next: None,
            previous: None,
            results,
        }
    }
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the booking engine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

// === Error Handling ===

/// Wrapper for converting `BookingError` into HTTP responses.
pub struct AppError(BookingError);

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            BookingError::ShowNotFound(_) => (StatusCode::NOT_FOUND, "SHOW_NOT_FOUND"),
            BookingError::ReservationNotFound(_) => {
                (StatusCode::NOT_FOUND, "RESERVATION_NOT_FOUND")
            }
            BookingError::DuplicateShow(_) => (StatusCode::CONFLICT, "DUPLICATE_SHOW"),
            BookingError::InvalidSeatCount => (StatusCode::BAD_REQUEST, "INVALID_SEAT_COUNT"),
            BookingError::InvalidCapacity => (StatusCode::BAD_REQUEST, "INVALID_CAPACITY"),
            BookingError::InsufficientSeats { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_SEATS")
            }
            BookingError::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION")
            }
            BookingError::InvalidRelease { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_RELEASE")
            }
            BookingError::Timeout(_) => (StatusCode::SERVICE_UNAVAILABLE, "TIMEOUT"),
            BookingError::DurabilityFault(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DURABILITY_FAULT")
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /shows - Register a new show.
async fn create_show(
    State(state): State<AppState>,
    Json(request): Json<CreateShowRequest>,
) -> Result<(StatusCode, Json<ShowResponse>), AppError> {
    let show = state.engine.add_show(
        ShowId(request.id),
        &request.movie_title,
        &request.room,
        request.price_cents,
        request.total_seats,
    )?;
    Ok((StatusCode::CREATED, Json(ShowResponse::from_show(&show))))
}

/// GET /shows - List all shows.
async fn list_shows(State(state): State<AppState>) -> Json<Page<ShowResponse>> {
    let shows = state
        .engine
        .shows()
        .iter()
        .map(|show| ShowResponse::from_show(show))
        .collect();
    Json(Page::of(shows))
}

/// GET /shows/:id - Get a show by ID.
async fn get_show(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<ShowResponse>, AppError> {
    state
        .engine
        .get_show(ShowId(id))
        .map(|show| Json(ShowResponse::from_show(&show)))
        .ok_or(AppError(BookingError::ShowNotFound(ShowId(id))))
}

/// POST /reservations - Book seats on a show.
async fn book_seats(
    State(state): State<AppState>,
    Json(request): Json<BookRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), AppError> {
    let reservation = state.engine.book_seats(
        ShowId(request.show_id),
        &request.customer_name,
        request.seats,
        &request.source,
        request.note.as_deref(),
    )?;
    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse::from_reservation(&reservation)),
    ))
}

/// GET /reservations - List all reservations.
async fn list_reservations(State(state): State<AppState>) -> Json<Page<ReservationResponse>> {
    let reservations = state
        .engine
        .reservations()
        .iter()
        .map(|reservation| ReservationResponse::from_reservation(reservation))
        .collect();
    Json(Page::of(reservations))
}

/// GET /reservations/:id - Get a reservation by ID.
async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ReservationResponse>, AppError> {
    state
        .engine
        .get_reservation(ReservationId(id))
        .map(|reservation| Json(ReservationResponse::from_reservation(&reservation)))
        .ok_or(AppError(BookingError::ReservationNotFound(ReservationId(id))))
}

/// POST /reservations/:id/confirm - Confirm a pending reservation.
async fn confirm_reservation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Option<Json<TransitionRequest>>,
) -> Result<Json<ReservationResponse>, AppError> {
    let request = body.map(|Json(body)| body).unwrap_or_default();
    let reservation = state
        .engine
        .confirm(ReservationId(id), &request.source, request.note.as_deref())?;
    Ok(Json(ReservationResponse::from_reservation(&reservation)))
}

/// POST /reservations/:id/cancel - Cancel a reservation, releasing its seats.
async fn cancel_reservation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Option<Json<TransitionRequest>>,
) -> Result<Json<ReservationResponse>, AppError> {
    let request = body.map(|Json(body)| body).unwrap_or_default();
    let reservation = state
        .engine
        .cancel(ReservationId(id), &request.source, request.note.as_deref())?;
    Ok(Json(ReservationResponse::from_reservation(&reservation)))
}

/// POST /reservations/:id/complete - Mark a confirmed reservation redeemed.
async fn complete_reservation(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Option<Json<TransitionRequest>>,
) -> Result<Json<ReservationResponse>, AppError> {
    let request = body.map(|Json(body)| body).unwrap_or_default();
    let reservation = state
        .engine
        .complete(ReservationId(id), &request.source, request.note.as_deref())?;
    Ok(Json(ReservationResponse::from_reservation(&reservation)))
}

/// Query parameters for the audit trail endpoint.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    reservation_id: Option<u64>,
}

/// GET /reservation-events - Audit trail, optionally for one reservation.
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<Page<EventResponse>> {
    let events = match query.reservation_id {
        Some(id) => state.engine.events_for(ReservationId(id)),
        None => state.engine.events(),
    };
    Json(Page::of(events.iter().map(EventResponse::from_event).collect()))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/shows", post(create_show).get(list_shows))
        .route("/shows/{id}", get(get_show))
        .route("/reservations", post(book_seats).get(list_reservations))
        .route("/reservations/{id}", get(get_reservation))
        .route("/reservations/{id}/confirm", post(confirm_reservation))
        .route("/reservations/{id}/cancel", post(cancel_reservation))
        .route("/reservations/{id}/complete", post(complete_reservation))
        .route("/reservation-events", get(list_events))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cinema_booking_rs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState {
        engine: Arc::new(Engine::new()),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Cinema booking API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /shows                       - Register a show");
    println!("  GET  /shows                       - List all shows");
    println!("  GET  /shows/:id                   - Get show by ID");
    println!("  POST /reservations                - Book seats");
    println!("  POST /reservations/:id/confirm    - Confirm a reservation");
    println!("  POST /reservations/:id/cancel     - Cancel a reservation");
    println!("  POST /reservations/:id/complete   - Complete a reservation");
    println!("  GET  /reservations                - List all reservations");
    println!("  GET  /reservations/:id            - Get reservation by ID");
    println!("  GET  /reservation-events          - Audit trail");

    axum::serve(listener, app).await.unwrap();
}
