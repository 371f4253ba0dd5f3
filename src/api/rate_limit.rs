//! Fixed-window request limiting per client address

use std::net::IpAddr;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use dashmap::DashMap;
use tracing::warn;

use super::types::ApiError;
use crate::errors::AskRagError;

/// Tracked clients before stale windows are swept
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    enabled: bool,
    limit: u32,
    window: Duration,
    clients: DashMap<Option<IpAddr>, Window>,
}

impl RateLimiter {
    /// Allow `per_minute` requests per client in each one-minute window
    pub fn per_minute(per_minute: u32, enabled: bool) -> Self {
        Self::new(per_minute, Duration::from_secs(60), enabled)
    }

    pub fn new(limit: u32, window: Duration, enabled: bool) -> Self {
        Self {
            enabled,
            limit,
            window,
            clients: DashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::per_minute(0, false)
    }

    /// Count one request from `client`, failing once its window is used up.
    ///
    /// Requests with no known address share one window.
    pub fn check(&self, client: Option<IpAddr>) -> Result<(), AskRagError> {
        if !self.enabled {
            return Ok(());
        }

        let now = Instant::now();
        if self.clients.len() > SWEEP_THRESHOLD {
            self.clients
                .retain(|_, window| now.duration_since(window.started) < self.window);
        }

        let mut entry = self.clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        let window = entry.value_mut();
        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.limit {
            return Err(AskRagError::RateLimited(format!(
                "{} per minute",
                self.limit
            )));
        }
        window.count += 1;
        Ok(())
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match limiter.check(client) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            warn!(
                "Rate limit exceeded for {}",
                client.map_or_else(|| "unknown".to_string(), |ip| ip.to_string())
            );
            ApiError::from(e).into_response()
        }
    }
}
