//! Transport-neutral request handling.
//!
//! Maps request paths onto [`RetrievalService`] operations and shapes the
//! results into status codes and JSON bodies. Any HTTP server can mount
//! [`handle`] behind its own routing.
//!
//! | Path                            | Operation                        |
//! |---------------------------------|----------------------------------|
//! | `/eager/{category}`             | `fetch_eager`                    |
//! | `/lean/{category}`              | `fetch_lean`                     |
//! | `/eager/benchmark/{category}`   | `fetch_eager`, timed externally  |
//! | `/lean/benchmark/{category}`    | `fetch_lean`, timed externally   |
//! | `/lean/broken`                  | `fetch_misusable`, observed twice|

use crate::error::Error;
use crate::handle::SingleUseHandle;
use crate::service::{RetrievalOutcome, RetrievalService, Strategy};
use crate::store::Item;
use crate::utils::format_millis;
use crate::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

/// Memory figure reported by the eager benchmark route.
pub const EAGER_BENCHMARK_MEMORY_MB: &str = "41.2";

/// Memory figure reported by the lean benchmark route.
pub const LEAN_BENCHMARK_MEMORY_MB: &str = "20.6";

/// A recognised request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/eager/{category}`
    Eager(String),
    /// `/lean/{category}`
    Lean(String),
    /// `/eager/benchmark/{category}`
    EagerBenchmark(String),
    /// `/lean/benchmark/{category}`
    LeanBenchmark(String),
    /// `/lean/broken`
    LeanBroken,
}

impl Route {
    /// Parses a request path, ignoring any query string and surrounding slashes.
    ///
    /// `benchmark` is reserved: `/eager/benchmark` and `/lean/benchmark`
    /// without a category do not parse.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        let route = match segments.as_slice() {
            ["lean", "broken"] => Route::LeanBroken,
            // A benchmark path with its category left off is not a plain
            // retrieval of the category "benchmark".
            ["eager" | "lean", "benchmark"] => return None,
            ["eager", "benchmark", category] => Route::EagerBenchmark(category.to_string()),
            ["lean", "benchmark", category] => Route::LeanBenchmark(category.to_string()),
            ["eager", category] => Route::Eager(category.to_string()),
            ["lean", category] => Route::Lean(category.to_string()),
            _ => return None,
        };

        match &route {
            Route::Eager(c) | Route::Lean(c) | Route::EagerBenchmark(c) | Route::LeanBenchmark(c)
                if c.is_empty() =>
            {
                None
            }
            _ => Some(route),
        }
    }
}

/// Status code and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON response body.
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn bad_request(message: String) -> Self {
        Self {
            status: 400,
            body: Value::String(message),
        }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            body: json!({ "error": "no such route" }),
        }
    }

    fn internal(error: &Error) -> Self {
        tracing::error!(%error, "request failed");
        Self {
            status: 500,
            body: json!({ "error": error.to_string() }),
        }
    }

    fn from_body<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self::ok(value),
            Err(e) => Self::internal(&Error::other(e)),
        }
    }
}

/// Timing block attached to every retrieval response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    /// Wall time in milliseconds.
    pub speed_ms: String,
    /// Memory figure in megabytes.
    pub simulated_memory_mb: String,
}

/// Body of the plain retrieval routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalBody {
    /// Retrieved items.
    pub items: Vec<Item>,
    /// Cost measured inside the service.
    pub performance: Performance,
}

impl From<RetrievalOutcome> for RetrievalBody {
    fn from(outcome: RetrievalOutcome) -> Self {
        Self {
            items: outcome.items,
            performance: Performance {
                speed_ms: outcome.elapsed_ms,
                simulated_memory_mb: outcome.simulated_memory_mb,
            },
        }
    }
}

/// Body of the benchmark routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkBody {
    /// The full retrieval body as the service produced it.
    pub foods: RetrievalBody,
    /// Cost measured around the service call.
    pub performance: Performance,
}

/// Parses `path` and dispatches it, answering 404 for unknown paths.
pub async fn handle(service: &RetrievalService, path: &str) -> ApiResponse {
    match Route::parse(path) {
        Some(route) => dispatch(service, &route).await,
        None => {
            tracing::debug!(path, "unrouted request");
            ApiResponse::not_found()
        }
    }
}

/// Runs the operation behind `route` and shapes its response.
pub async fn dispatch(service: &RetrievalService, route: &Route) -> ApiResponse {
    match route {
        Route::Eager(category) => match service.fetch_eager(category).await {
            Ok(outcome) => ApiResponse::from_body(&RetrievalBody::from(outcome)),
            Err(e) => ApiResponse::internal(&e),
        },
        Route::Lean(category) => match service.fetch_lean(category).observe().await {
            Ok(outcome) => ApiResponse::from_body(&RetrievalBody::from(outcome)),
            Err(e) => ApiResponse::internal(&e),
        },
        Route::EagerBenchmark(category) => {
            let started = Instant::now();
            let result = service.fetch_eager(category).await;
            benchmark_response(result, started, EAGER_BENCHMARK_MEMORY_MB)
        }
        Route::LeanBenchmark(category) => {
            let started = Instant::now();
            let result = service.fetch_lean(category).observe().await;
            benchmark_response(result, started, LEAN_BENCHMARK_MEMORY_MB)
        }
        Route::LeanBroken => {
            let handle = service.fetch_misusable();
            match observe_twice(&handle).await {
                Ok(_) => ApiResponse::ok(json!("This should not be reached.")),
                Err(e) => {
                    if e == Error::HandleAlreadyConsumed {
                        service.record_consumption_fault(Strategy::Lean);
                    }
                    ApiResponse::bad_request(format!("{}: {}", e.kind(), e))
                }
            }
        }
    }
}

fn benchmark_response(
    result: Result<RetrievalOutcome>,
    started: Instant,
    memory_mb: &str,
) -> ApiResponse {
    let elapsed = started.elapsed();
    match result {
        Ok(outcome) => ApiResponse::from_body(&BenchmarkBody {
            foods: outcome.into(),
            performance: Performance {
                speed_ms: format_millis(elapsed),
                simulated_memory_mb: memory_mb.to_string(),
            },
        }),
        Err(e) => ApiResponse::internal(&e),
    }
}

async fn observe_twice(handle: &SingleUseHandle<Vec<Item>>) -> Result<(Vec<Item>, Vec<Item>)> {
    let first = handle.observe().await?;
    let second = handle.observe().await?;
    Ok((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse("/eager/ready"), Some(Route::Eager("ready".into())));
        assert_eq!(Route::parse("lean/soup/"), Some(Route::Lean("soup".into())));
        assert_eq!(
            Route::parse("/eager/benchmark/ready"),
            Some(Route::EagerBenchmark("ready".into()))
        );
        assert_eq!(
            Route::parse("/lean/benchmark/x?verbose=1"),
            Some(Route::LeanBenchmark("x".into()))
        );
        assert_eq!(Route::parse("/lean/broken"), Some(Route::LeanBroken));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(Route::parse("/"), None);
        assert_eq!(Route::parse("/eager"), None);
        assert_eq!(Route::parse("/eager//"), None);
        assert_eq!(Route::parse("/eager/benchmark/"), None);
        assert_eq!(Route::parse("/lean/benchmark"), None);
        assert_eq!(Route::parse("/eager/broken/extra"), None);
        assert_eq!(Route::parse("/task/ready"), None);
    }

    #[test]
    fn test_body_shape() {
        let body = RetrievalBody {
            items: crate::store::items(["Pizza"]),
            performance: Performance {
                speed_ms: "1.00".into(),
                simulated_memory_mb: "0.00".into(),
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "items": [{ "name": "Pizza" }],
                "performance": { "speedMs": "1.00", "simulatedMemoryMb": "0.00" }
            })
        );
    }
}
