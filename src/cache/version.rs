use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Process-wide cache-busting token for derived artifacts.
///
/// Time based (milliseconds since the epoch) and strictly increasing: a bump always yields a
/// value greater than every value handed out before, even when the clock stalls or steps back.
#[derive(Debug)]
pub struct VersionToken {
    current: AtomicU64,
}

impl Default for VersionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionToken {
    /// Token starting at the current wall-clock time.
    pub fn new() -> Self {
        Self::starting_at(now_millis())
    }

    /// Token starting at a fixed value.
    pub fn starting_at(value: u64) -> Self {
        Self {
            current: AtomicU64::new(value),
        }
    }

    /// Current token value.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Advance the token and return the new value.
    pub fn bump(&self) -> u64 {
        let now = now_millis();
        let mut prev = self.current.load(Ordering::Acquire);
        loop {
            let next = now.max(prev.saturating_add(1));
            match self.current.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Append the current token to `url` as a `v` query parameter.
    pub fn bust(&self, url: &str) -> String {
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{url}{sep}v={}", self.current())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/cache/version.rs"]
mod tests;
