//! HTTP surface of the dashboard.
//!
//! - `GET /` - the page
//! - `GET /api/book` - current display state
//! - `GET|POST /api/auto-refresh` - read or set the auto-refresh flag
//! - `POST /api/refresh` - one manual refresh
//! - `GET /events` - display state updates as server-sent events
//! - `GET /health`

use aggregator::Aggregator;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use connector_bitfinex::PollControl;
use connectors_common::types::DisplayState;
use futures::Stream;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::sync::broadcast::error::RecvError;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    pub control: PollControl,
    pub symbol: String,
    pub interval_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AutoRefresh {
    pub enabled: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetAutoRefresh {
    pub enabled: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/book", get(book_handler))
        .route("/api/auto-refresh", get(get_auto_refresh).post(set_auto_refresh))
        .route("/api/refresh", post(refresh_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("dashboard running at http://{}/", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(INDEX_HTML.replace("{{SYMBOL}}", &state.symbol))
}

async fn book_handler(State(state): State<AppState>) -> Json<DisplayState> {
    Json(state.aggregator.latest())
}

async fn get_auto_refresh(State(state): State<AppState>) -> Json<AutoRefresh> {
    Json(AutoRefresh {
        enabled: state.control.auto_refresh(),
        interval_secs: state.interval_secs,
    })
}

async fn set_auto_refresh(State(state): State<AppState>, Json(req): Json<SetAutoRefresh>) -> Json<AutoRefresh> {
    state.control.set_auto_refresh(req.enabled);
    Json(AutoRefresh {
        enabled: state.control.auto_refresh(),
        interval_secs: state.interval_secs,
    })
}

async fn refresh_handler(State(state): State<AppState>) -> Response {
    if state.control.refresh_now() {
        StatusCode::ACCEPTED.into_response()
    } else {
        warn!("manual refresh rejected");
        (StatusCode::TOO_MANY_REQUESTS, "refresh already pending").into_response()
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

fn state_event(state: &DisplayState) -> Event {
    match Event::default().json_data(state) {
        Ok(ev) => ev,
        Err(e) => Event::default().event("error").data(e.to_string()),
    }
}

async fn events_handler(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.aggregator.subscribe();
    let first = state.aggregator.latest();
    let stream = async_stream::stream! {
        yield Ok(state_event(&first));
        loop {
            match rx.recv().await {
                Ok(update) => yield Ok(state_event(&update)),
                // skipped states are lost; carry on from the oldest still buffered
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}
