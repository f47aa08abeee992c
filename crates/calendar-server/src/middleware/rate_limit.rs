use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::routes::AppState;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// Fixed-window request counter keyed by client address.
///
/// The table holds at most `max_clients` entries: expired windows are swept
/// when it fills up, and if every window is still live the one closest to
/// expiry is dropped.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    max_clients: usize,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            max_clients: config.max_clients.max(1),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request from `client`; returns `false` once the client is
    /// over its allowance for the current window.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(window) = clients.get_mut(client) {
            if now <= window.resets_at {
                if window.count >= self.max_requests {
                    return false;
                }
                window.count += 1;
                return true;
            }
        } else if clients.len() >= self.max_clients {
            Self::make_room(&mut clients, now);
        }

        clients.insert(
            client.to_string(),
            Window {
                count: 1,
                resets_at: now + self.window,
            },
        );
        true
    }

    fn make_room(clients: &mut HashMap<String, Window>, now: Instant) {
        clients.retain(|_, w| now <= w.resets_at);
        if clients.is_empty() {
            return;
        }

        // Table is full of live windows
        let oldest = clients
            .iter()
            .min_by_key(|(_, w)| w.resets_at)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            tracing::debug!(client = %key, "Evicting rate limit window");
            clients.remove(&key);
        }
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&request);

    if !state.rate_limiter.check(&client) {
        tracing::warn!(client = %client, "Rate limit exceeded");
        return Err(AppError::TooManyRequests);
    }

    Ok(next.run(request).await)
}
