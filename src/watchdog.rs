//! Capture time limit enforcement

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::registry::SessionRegistry;
use crate::types::Fingerprint;

pub const DEFAULT_CAPTURE_LIMIT: Duration = Duration::from_millis(5000);

/// Shortest limit the watchdog accepts.
pub const MIN_CAPTURE_LIMIT: Duration = Duration::from_millis(1000);

/// Stops captures that run longer than the configured limit.
///
/// Enforcement happens only when [`sweep`](Self::sweep) runs, so a capture
/// may overrun by up to one server poll interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureWatchdog {
    limit: Duration,
}

impl CaptureWatchdog {
    pub fn new(limit: Duration) -> Self {
        Self { limit: limit.max(MIN_CAPTURE_LIMIT) }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Set a new limit, raised to [`MIN_CAPTURE_LIMIT`] if shorter. Returns the limit in effect.
    pub fn set_limit(&mut self, limit: Duration) -> Duration {
        if limit < MIN_CAPTURE_LIMIT {
            warn!("Capture time limit {:?} too low, using {:?}", limit, MIN_CAPTURE_LIMIT);
        }
        self.limit = limit.max(MIN_CAPTURE_LIMIT);
        info!(limit_ms = self.limit.as_millis() as u64, "Capture time limit set");
        self.limit
    }

    /// Stop every capture that has run past the limit. Returns the stopped sessions.
    pub fn sweep(&self, registry: &mut SessionRegistry, now: Instant) -> Vec<Fingerprint> {
        let mut stopped = Vec::new();
        for (fingerprint, session) in registry.iter_mut() {
            let Some(elapsed) = session.capture_elapsed(now) else {
                continue;
            };
            if elapsed > self.limit {
                if let Err(code) = session.stop_capture() {
                    warn!(
                        fingerprint = %fingerprint,
                        "Stopping over-long capture reported {}",
                        code
                    );
                }
                info!(
                    "Camera {}: capture time limit reached ({} ms), capture stopped",
                    session.identity().id_string,
                    self.limit.as_millis()
                );
                stopped.push(fingerprint);
            } else {
                debug!(
                    "Camera {}: capture time remaining {} ms",
                    session.identity().id_string,
                    (self.limit - elapsed).as_millis()
                );
            }
        }
        stopped
    }
}

impl Default for CaptureWatchdog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::simulated_registry;

    #[test]
    fn limit_has_a_floor() {
        let mut watchdog = CaptureWatchdog::new(Duration::from_millis(10));
        assert_eq!(watchdog.limit(), MIN_CAPTURE_LIMIT);
        assert_eq!(watchdog.set_limit(Duration::from_millis(2500)), Duration::from_millis(2500));
        assert_eq!(watchdog.set_limit(Duration::ZERO), MIN_CAPTURE_LIMIT);
        assert_eq!(CaptureWatchdog::default().limit(), DEFAULT_CAPTURE_LIMIT);
    }

    #[test]
    fn only_overdue_captures_are_stopped() {
        let (_sdk, mut registry) = simulated_registry(2);
        let watchdog = CaptureWatchdog::new(Duration::from_millis(1000));
        let first = registry.fingerprints()[0];
        let second = registry.fingerprints()[1];

        registry.lookup_mut(first).unwrap().start_capture().unwrap();
        let now = Instant::now();
        assert!(watchdog.sweep(&mut registry, now + Duration::from_millis(900)).is_empty());
        assert!(registry.lookup(first).unwrap().is_capturing());

        let stopped = watchdog.sweep(&mut registry, now + Duration::from_millis(1500));
        assert_eq!(stopped, vec![first]);
        assert!(!registry.lookup(first).unwrap().is_capturing());
        assert!(!registry.lookup(second).unwrap().is_capturing());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_stops_exactly_the_session_past_the_limit() {
        let (_sdk, mut registry) = simulated_registry(2);
        let watchdog = CaptureWatchdog::new(Duration::from_millis(1000));
        let early = registry.fingerprints()[0];
        let late = registry.fingerprints()[1];

        registry.lookup_mut(early).unwrap().start_capture().unwrap();
        tokio::time::advance(Duration::from_millis(1000)).await;
        registry.lookup_mut(late).unwrap().start_capture().unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;

        let stopped = watchdog.sweep(&mut registry, Instant::now());
        assert_eq!(stopped, vec![early]);
        assert!(!registry.lookup(early).unwrap().is_capturing());
        assert!(registry.lookup(late).unwrap().is_capturing());
    }
}
