use std::time::Duration;

use crate::control::ControlRange;

/// Default number of frames produced by one run.
pub const DEFAULT_MAX_FRAMES: u64 = 1000;

/// Bounded retry with exponential backoff, applied to encoder spawn only.
///
/// The default makes a single attempt. A failed delivery is never retried:
/// respawning mid-run would hide a broken destination behind dropped frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }

    /// Delay before attempt `failed_attempts + 1`.
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Iterations after which the run completes. Zero is allowed.
    pub max_frames: u64,
    /// Range every control value is clamped to.
    pub control_range: ControlRange,
    /// Minimum spacing between iteration starts; `None` runs as fast as the simulation allows.
    pub pacing: Option<Duration>,
    pub spawn_retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            control_range: ControlRange::default(),
            pacing: None,
            spawn_retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }

    #[test]
    fn default_never_retries() {
        assert_eq!(RetryPolicy::default().max_attempts, 1);
        assert_eq!(PipelineConfig::default().max_frames, DEFAULT_MAX_FRAMES);
    }
}
