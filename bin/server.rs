// Community Portal - Web Server
// JSON API over the seeded in-memory store

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use community_portal::{
    build_calendar_grid, check_payment_status, lookup_history, CalendarEvent, CalendarGrid, Clock,
    HistoryForm, IdentityForm, LookupOutcome, NewsItem, PaymentRecord, PortalClock, PortalConfig,
    Store,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<Store>>,
    clock: PortalClock,
    news_limit: usize,
}

impl AppState {
    fn store(&self) -> MutexGuard<'_, Store> {
        // The store is never written after startup, so a poisoned lock is still usable.
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

#[derive(Deserialize)]
struct NewsQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/news?limit=N - Latest news, newest first
async fn get_news(State(state): State<AppState>, Query(query): Query<NewsQuery>) -> Response {
    let limit = query.limit.unwrap_or(state.news_limit);
    let news: Vec<NewsItem> = state.store().latest_news(limit);
    ApiResponse::ok(news)
}

/// GET /api/events/:year/:month - Events of one month (month 1-12)
async fn get_events(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Response {
    let events: Vec<CalendarEvent> = state.store().events_for_month(month, year);
    ApiResponse::ok(events)
}

/// GET /api/calendar/:year/:month - 42-cell month grid (month 1-12)
async fn get_calendar(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Response {
    let events = state.store().events_for_month(month, year);

    match build_calendar_grid(month, year, &events) {
        Ok(grid) => ApiResponse::<CalendarGrid>::ok(grid),
        Err(e) => fail(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// POST /api/residents/status - Verify a resident and check this month's fee
async fn post_resident_status(
    State(state): State<AppState>,
    Json(form): Json<IdentityForm>,
) -> Response {
    let today = state.clock.today();

    let identity = match form.validate(today) {
        Ok(identity) => identity,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let outcome: LookupOutcome = check_payment_status(&state.store(), &identity, today);
    ApiResponse::ok(outcome)
}

/// GET /api/payments/:house/history?start=&end= - Payment history in a date range
async fn get_payment_history(
    State(state): State<AppState>,
    Path(house_code): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let form = HistoryForm {
        house_code,
        start: query.start,
        end: query.end,
    };

    let range = match form.validate(state.clock.today()) {
        Ok(range) => range,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let history: Vec<PaymentRecord> = lookup_history(&state.store(), &range);
    ApiResponse::ok(history)
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/news", get(get_news))
        .route("/events/:year/:month", get(get_events))
        .route("/calendar/:year/:month", get(get_calendar))
        .route("/residents/status", post(post_resident_status))
        .route("/payments/:house/history", get(get_payment_history))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    let clock = config.clock();

    let store = match Store::bootstrap(&clock) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to initialize the portal database");
            std::process::exit(1);
        }
    };

    let today: NaiveDate = clock.today();
    info!(%today, "store ready");

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        clock,
        news_limit: config.news_limit,
    };

    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %config.bind_addr, "server running");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}
