//! HTTP endpoint polled by the room displays.
//!
//! `GET /rooms/{room_id}` answers with the three-line status for the room.
//! The handler only reads the store; it never triggers a fetch and never
//! fails, unknown rooms get the sentinel text.

use std::future::Future;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ServerResult;
use crate::store::AvailabilityStore;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Builds the query router over `store`.
pub fn router(store: AvailabilityStore) -> Router {
    Router::new()
        .route("/rooms/{room_id}", get(get_room))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Serves queries on `listener` until `shutdown` completes.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve<F>(
    listener: TcpListener,
    store: AvailabilityStore,
    shutdown: F,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Query server listening");
    }

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Query server stopped");
    Ok(())
}

async fn get_room(
    State(store): State<AvailabilityStore>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    ([(CONTENT_TYPE, TEXT_PLAIN)], store.lookup(&room_id).await)
}
