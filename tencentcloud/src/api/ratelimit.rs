//! Per-action request rate limiting
//!
//! Each API action owns a one-second window with its own limit. The window
//! and the number of requests started in it are packed into one `AtomicU64`,
//! so taking a permit is a compare-and-swap and callers of different actions
//! never contend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_LIMIT_PER_SECOND: u32 = 20;

const WINDOW: Duration = Duration::from_secs(1);

/// Limit for one action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionRateLimit {
    /// Maximum requests started per one-second window
    pub per_second: u32,
}

impl Default for ActionRateLimit {
    fn default() -> Self {
        Self {
            per_second: DEFAULT_LIMIT_PER_SECOND,
        }
    }
}

/// Requests started in the current window of one action
struct ActionWindow {
    limit: u32,
    /// Window number in the high half, request count in the low half
    state: AtomicU64,
}

fn pack(window: u64, count: u32) -> u64 {
    (window << 32) | u64::from(count)
}

fn unpack(state: u64) -> (u64, u32) {
    (state >> 32, (state & u64::from(u32::MAX)) as u32)
}

pub struct RateLimiter {
    default_limit: ActionRateLimit,
    limits: HashMap<String, ActionRateLimit>,
    windows: RwLock<HashMap<String, Arc<ActionWindow>>>,
    epoch: Instant,
}

impl RateLimiter {
    pub fn new(per_second: u32) -> Self {
        Self {
            default_limit: ActionRateLimit {
                per_second: per_second.max(1),
            },
            limits: HashMap::new(),
            windows: RwLock::new(HashMap::new()),
            epoch: Instant::now(),
        }
    }

    /// Sets a dedicated limit for one action
    pub fn with_limit(mut self, action: &str, per_second: u32) -> Self {
        self.set_action_limit(action, per_second);
        self
    }

    /// Takes effect for actions that have not been called yet
    pub fn set_action_limit(&mut self, action: &str, per_second: u32) {
        self.limits.insert(
            action.to_string(),
            ActionRateLimit {
                per_second: per_second.max(1),
            },
        );
    }

    pub fn limit_for(&self, action: &str) -> ActionRateLimit {
        self.limits
            .get(action)
            .copied()
            .unwrap_or(self.default_limit)
    }

    /// Takes a permit for `action` if its window has room, otherwise returns
    /// how long until the next window opens
    pub fn try_acquire(&self, action: &str) -> Result<(), Duration> {
        let window = self.window(action);
        let elapsed = self.epoch.elapsed();
        let current = elapsed.as_secs();

        let mut state = window.state.load(Ordering::Acquire);
        loop {
            let (started, count) = unpack(state);
            let next = if started != current {
                pack(current, 1)
            } else if count < window.limit {
                pack(current, count + 1)
            } else {
                let opens = WINDOW * u32::try_from(current + 1).unwrap_or(u32::MAX);
                return Err(opens.saturating_sub(elapsed));
            };

            match window.state.compare_exchange_weak(
                state,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => state = actual,
            }
        }
    }

    /// Waits until `action` may be invoked again
    pub async fn acquire(&self, action: &str) {
        while let Err(wait) = self.try_acquire(action) {
            tracing::trace!(action, wait_ms = wait.as_millis() as u64, "rate limited");
            tokio::time::sleep(wait).await;
        }
    }

    fn window(&self, action: &str) -> Arc<ActionWindow> {
        {
            let windows = self.windows.read().unwrap_or_else(|e| e.into_inner());
            if let Some(window) = windows.get(action) {
                return window.clone();
            }
        }

        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        windows
            .entry(action.to_string())
            .or_insert_with(|| {
                Arc::new(ActionWindow {
                    limit: self.limit_for(action).per_second,
                    state: AtomicU64::new(pack(0, 0)),
                })
            })
            .clone()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT_PER_SECOND)
    }
}
