use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(5000);

/// Streak length that must be exceeded before the delay shrinks.
const SUCCESS_STREAK: u32 = 3;
const SPEED_UP: f64 = 0.9;
const BACK_OFF: f64 = 1.5;

/// Pacing state; advanced after every operation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterState {
    pub current_delay: Duration,
    pub success_streak: u32,
    pub error_streak: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RateLimiterState {
    /// `max_delay` is raised to `initial_delay` if it is smaller.
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            current_delay: initial_delay,
            success_streak: 0,
            error_streak: 0,
            initial_delay,
            max_delay: max_delay.max(initial_delay),
        }
    }

    pub fn record_success(&mut self) {
        self.success_streak += 1;
        self.error_streak = 0;
        if self.success_streak > SUCCESS_STREAK {
            self.current_delay = self
                .current_delay
                .mul_f64(SPEED_UP)
                .max(self.initial_delay);
            self.success_streak = 0;
        }
    }

    pub fn record_error(&mut self) {
        self.success_streak = 0;
        self.error_streak = self.error_streak.saturating_add(1);
        self.current_delay = self.current_delay.mul_f64(BACK_OFF).min(self.max_delay);
    }
}

/// Adaptive delay shared by every task of one run.
///
/// Deterministic: the same sequence of outcomes always yields the same delays.
#[derive(Debug)]
pub struct AdaptiveRateLimiter {
    state: Mutex<RateLimiterState>,
}

impl AdaptiveRateLimiter {
    pub fn new(initial_delay: Duration) -> Self {
        Self::with_max_delay(initial_delay, DEFAULT_MAX_DELAY)
    }

    pub fn with_max_delay(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            state: Mutex::new(RateLimiterState::new(initial_delay, max_delay)),
        }
    }

    pub fn on_success(&self) {
        self.with_state(RateLimiterState::record_success);
    }

    pub fn on_error(&self) {
        self.with_state(RateLimiterState::record_error);
    }

    pub fn current_delay(&self) -> Duration {
        self.snapshot().current_delay
    }

    pub fn snapshot(&self) -> RateLimiterState {
        self.with_state(|state| state.clone())
    }

    /// Suspends the caller for the current delay.
    pub async fn wait(&self) {
        let delay = self.current_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Like [`wait`](Self::wait) but returns early with `false` when `cancel` fires.
    pub async fn wait_or_cancel(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = self.wait() => true,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut RateLimiterState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{AdaptiveRateLimiter, RateLimiterState};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn assert_close(actual: Duration, expected: Duration) {
        let diff = actual.abs_diff(expected);
        assert!(diff < Duration::from_micros(1), "{actual:?} != {expected:?}");
    }

    #[test]
    fn four_successes_shrink_the_delay() {
        let mut state = RateLimiterState::new(ms(1000), ms(5000));
        state.record_error();
        state.record_error();
        assert_eq!(state.current_delay, ms(2250));

        for _ in 0..3 {
            state.record_success();
        }
        assert_eq!(state.current_delay, ms(2250));
        assert_eq!(state.success_streak, 3);

        state.record_success();
        assert_close(state.current_delay, ms(2025));
        assert_eq!(state.success_streak, 0);
    }

    #[test]
    fn delay_never_drops_below_initial() {
        let mut state = RateLimiterState::new(ms(1000), ms(5000));
        for _ in 0..40 {
            state.record_success();
        }
        assert_eq!(state.current_delay, ms(1000));
    }

    #[test]
    fn errors_grow_unconditionally_and_clamp_at_max() {
        let mut state = RateLimiterState::new(ms(1000), ms(5000));
        state.record_error();
        assert_eq!(state.current_delay, ms(1500));
        for _ in 0..20 {
            state.record_error();
        }
        assert_eq!(state.current_delay, ms(5000));
        assert_eq!(state.error_streak, 21);
    }

    #[test]
    fn error_resets_success_streak() {
        let mut state = RateLimiterState::new(ms(1000), ms(5000));
        state.record_error();
        state.record_success();
        state.record_success();
        state.record_success();
        state.record_error();
        assert_eq!(state.success_streak, 0);
        assert_eq!(state.error_streak, 1);
        let before = state.current_delay;
        state.record_success();
        assert_eq!(state.current_delay, before);
        assert_eq!(state.error_streak, 0);
    }

    #[test]
    fn bounds_hold_for_mixed_outcome_sequences() {
        // Small deterministic LCG so the sequence is varied but reproducible.
        let mut seed: u64 = 0x5eed;
        for _ in 0..50 {
            let mut state = RateLimiterState::new(ms(700), ms(4000));
            for _ in 0..200 {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                if (seed >> 33) % 3 == 0 {
                    state.record_error();
                } else {
                    state.record_success();
                }
                assert!(state.current_delay >= state.initial_delay);
                assert!(state.current_delay <= state.max_delay);
            }
        }
    }

    #[test]
    fn max_delay_is_raised_to_initial() {
        let state = RateLimiterState::new(ms(8000), ms(5000));
        assert_eq!(state.max_delay, ms(8000));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_sleeps_for_the_current_delay() {
        let limiter = AdaptiveRateLimiter::new(ms(1000));
        limiter.on_error();
        let start = tokio::time::Instant::now();
        limiter.wait().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= ms(1500) && elapsed < ms(1600), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn wait_or_cancel_returns_early() {
        let limiter = AdaptiveRateLimiter::new(ms(1000));
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        assert!(!limiter.wait_or_cancel(&token).await);
    }
}
