//! HTTP surface of the counter service.
//!
//! Every route resolves to one [`Operation`] on the configured counter. Anything
//! that is not a `GET` on a known path is answered with a 404.

pub mod error;

use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::handler::Handler;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tracing::{debug, info};

use crate::core::counter::{Operation, Outcome};
use crate::core::registry::CounterRegistry;

pub use error::{ApiError, NOT_FOUND_MESSAGE};

#[derive(Clone)]
struct AppState {
    registry: CounterRegistry,
    counter_name: Arc<str>,
}

impl AppState {
    async fn apply(&self, operation: Operation) -> Result<Json<Outcome>, ApiError> {
        let counter = self.registry.get(&self.counter_name).await?;
        debug!(counter = counter.name(), ?operation, "Dispatching request");
        let outcome = counter.apply(operation).await?;
        Ok(Json(outcome))
    }
}

/// Service returned by [`router`]: trailing slashes are trimmed before routing,
/// so `/counter/increment/` reaches the same handler as `/counter/increment`.
pub type CounterApp = NormalizePath<Router>;

/// Builds the router. `base_path` must already be normalised (see
/// [`crate::core::config::normalise_base_path`]); an empty one mounts at the root.
pub fn router(registry: CounterRegistry, base_path: &str, counter_name: &str) -> CounterApp {
    let state = AppState {
        registry,
        counter_name: Arc::from(counter_name),
    };

    let routes = Router::new()
        .route("/", get_only(read))
        .route("/increment", get_only(increment))
        .route("/add", get_only(add_without_operands))
        .route("/add/{a}", get_only(add_with_one_operand))
        .route("/add/{a}/{b}", get_only(add))
        .route("/reset", get_only(reset))
        .with_state(state);

    let app = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(base_path, routes)
    };

    let app = app
        .fallback(missing)
        .layer(middleware::from_fn(log_request));

    // must wrap the router from outside: path rewrites inside it happen after matching
    NormalizePathLayer::trim_trailing_slash().layer(app)
}

/// `get` alone would also answer HEAD with the GET handler, which mutates.
fn get_only<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    get(handler).head(missing).fallback(missing)
}

async fn read(State(state): State<AppState>) -> Result<Json<Outcome>, ApiError> {
    state.apply(Operation::Read).await
}

async fn increment(State(state): State<AppState>) -> Result<Json<Outcome>, ApiError> {
    state.apply(Operation::Increment).await
}

async fn reset(State(state): State<AppState>) -> Result<Json<Outcome>, ApiError> {
    state.apply(Operation::Reset).await
}

async fn add(
    State(state): State<AppState>,
    Path((a, b)): Path<(String, String)>,
) -> Result<Json<Outcome>, ApiError> {
    state.apply(add_operation(Some(&a), Some(&b))?).await
}

async fn add_with_one_operand(
    State(state): State<AppState>,
    Path(a): Path<String>,
) -> Result<Json<Outcome>, ApiError> {
    state.apply(add_operation(Some(&a), None)?).await
}

async fn add_without_operands(State(state): State<AppState>) -> Result<Json<Outcome>, ApiError> {
    state.apply(add_operation(None, None)?).await
}

async fn missing() -> ApiError {
    ApiError::NotFound
}

fn add_operation(a: Option<&str>, b: Option<&str>) -> Result<Operation, ApiError> {
    Ok(Operation::Add {
        a: parse_operand("a", a)?,
        b: parse_operand("b", b)?,
    })
}

pub fn parse_operand(operand: &'static str, raw: Option<&str>) -> Result<i64, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::InvalidOperand {
        operand,
        reason: "missing".to_owned(),
    })?;

    raw.trim().parse::<i64>().map_err(|err| ApiError::InvalidOperand {
        operand,
        reason: format!("{raw:?} is not an integer ({err})"),
    })
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "Handled request"
    );
    response
}
