//! Per-client request throttling
//!
//! Keyed token-bucket limit applied across every route; each client
//! address gets its own quota (default 60 requests per minute).

use super::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;

const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

pub struct ClientRateLimiter {
    limiter: RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>,
    requests_per_minute: u32,
}

impl ClientRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = NonZeroU32::new(requests_per_minute)
            .unwrap_or_else(|| NonZeroU32::new(DEFAULT_REQUESTS_PER_MINUTE).unwrap());

        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(rpm)),
            requests_per_minute: rpm.get(),
        }
    }

    /// Returns true while the client is within its quota.
    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}

pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    // ConnectInfo is absent when the router is driven without a real
    // listener; those requests share one bucket.
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if state.limiter.check(client) {
        next.run(request).await
    } else {
        tracing::warn!("Rate limit exceeded for {}", client);
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "Too many requests, please try again later"
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_allows_requests_within_quota() {
        let limiter = ClientRateLimiter::new(100);
        let client = IpAddr::V4(Ipv4Addr::LOCALHOST);

        for _ in 0..10 {
            assert!(limiter.check(client));
        }
    }

    #[test]
    fn test_limiter_blocks_over_quota() {
        let limiter = ClientRateLimiter::new(2);
        let client = IpAddr::V4(Ipv4Addr::LOCALHOST);

        assert!(limiter.check(client));
        assert!(limiter.check(client));
        assert!(!limiter.check(client));
    }

    #[test]
    fn test_clients_are_limited_independently() {
        let limiter = ClientRateLimiter::new(1);
        let first = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let second = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(limiter.check(first));
        assert!(!limiter.check(first));
        assert!(limiter.check(second));
    }

    #[test]
    fn test_zero_quota_falls_back_to_default() {
        let limiter = ClientRateLimiter::new(0);
        assert_eq!(limiter.requests_per_minute(), 60);
        assert!(limiter.check(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }
}
