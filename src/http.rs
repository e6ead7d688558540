//! HTTP transport for the relay: one endpoint, JSON in, JSON out.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::post,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::sql::{self, Query, QueryRelay, ResultSet};

pub const QUERY_PATH: &str = "/query";

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<QueryRelay>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MalformedRequest(serde_json::Error),

    #[error("Database Error: {}", .0.detail())]
    Execution(#[from] sql::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

pub fn create_router(relay: Arc<QueryRelay>) -> Router {
    Router::new()
        .route(QUERY_PATH, post(query))
        .with_state(AppState { relay })
        .layer(make_cors_middleware())
        .layer(TraceLayer::new_for_http())
}

pub fn make_cors_middleware() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

/// Run the submitted SQL and return every row.
///
/// The body is decoded whatever its content type says, but it has to be a
/// JSON object. OPTIONS never gets here: the CORS layer answers it.
#[tracing::instrument(level = "debug", skip(state, body), err)]
pub async fn query(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<ResultSet>> {
    let fields: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&body).map_err(ApiError::MalformedRequest)?;
    let query: Query = serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(ApiError::MalformedRequest)?;

    let rows = state.relay.execute_query(query).await.inspect_err(|e| {
        tracing::warn!(error = %e, "query execution failed");
    })?;

    tracing::info!(rows = rows.len(), "query executed");
    Ok(Json(rows))
}
