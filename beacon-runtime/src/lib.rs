//! # Beacon Runtime
//!
//! Clock abstractions used to time actions.
//!
//! This crate provides a unified interface for reading elapsed time across:
//! - **System**: monotonic `std::time::Instant`
//! - **Tokio**: `tokio::time::Instant`, which follows paused/advanced test time
//! - **Mock**: a manually advanced counter
//!
//! ## Feature Flags
//!
//! - `tokio` (default): Provide the Tokio clock

use core::time::Duration;

/// Monotonic millisecond clock
pub trait TelemetryClock: Send + Sync + 'static {
    /// Milliseconds since an arbitrary, fixed origin
    fn now_millis(&self) -> u64;
}

fn saturating_millis(elapsed: Duration) -> u64 {
    elapsed.as_millis().min(u64::MAX as u128) as u64
}

pub mod system_clock {
    //! Monotonic system clock

    use super::*;
    use std::time::Instant;

    /// Clock backed by `std::time::Instant`; the origin is construction time.
    #[derive(Debug, Clone)]
    pub struct SystemClock {
        origin: Instant,
    }

    impl SystemClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
            }
        }
    }

    impl Default for SystemClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TelemetryClock for SystemClock {
        fn now_millis(&self) -> u64 {
            saturating_millis(self.origin.elapsed())
        }
    }
}

#[cfg(feature = "tokio")]
pub mod tokio_clock {
    //! Tokio-based clock implementation

    use super::*;

    /// Clock backed by `tokio::time::Instant`. Under `tokio::time::pause()`
    /// it only moves when test time is advanced.
    #[derive(Debug, Clone)]
    pub struct TokioClock {
        origin: tokio::time::Instant,
    }

    impl TokioClock {
        pub fn new() -> Self {
            Self {
                origin: tokio::time::Instant::now(),
            }
        }
    }

    impl Default for TokioClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TelemetryClock for TokioClock {
        fn now_millis(&self) -> u64 {
            saturating_millis(self.origin.elapsed())
        }
    }
}

/// Mock clock for testing
pub mod mock_clock {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Manually advanced clock. Clones share the same time.
    #[derive(Debug, Clone, Default)]
    pub struct MockClock {
        current_time_ms: Arc<AtomicU64>,
    }

    impl MockClock {
        /// Create a new mock clock at time zero
        pub fn new() -> Self {
            Self::default()
        }

        /// Advance the mock clock
        pub fn advance(&self, duration: Duration) {
            self.current_time_ms
                .fetch_add(saturating_millis(duration), Ordering::SeqCst);
        }
    }

    impl TelemetryClock for MockClock {
        fn now_millis(&self) -> u64 {
            self.current_time_ms.load(Ordering::SeqCst)
        }
    }
}

pub use mock_clock::MockClock;
pub use system_clock::SystemClock;
#[cfg(feature = "tokio")]
pub use tokio_clock::TokioClock;

/// Get the default clock
pub fn default_clock() -> SystemClock {
    SystemClock::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_clones_share_time() {
        let clock = MockClock::new();
        let handle = clock.clone();
        clock.advance(Duration::from_millis(250));
        clock.advance(Duration::from_millis(250));
        assert_eq!(handle.now_millis(), 500);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = default_clock();
        let a = clock.now_millis();
        let b = clock.now_millis();
        assert!(b >= a);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        assert_eq!(clock.now_millis(), 0);
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(clock.now_millis() >= 500);
    }
}
