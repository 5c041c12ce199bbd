//! Millisecond clock and cooperative busy-wait delays
//!
//! There is no scheduler to yield to: a delay spins on the clock, optionally
//! invoking a caller-supplied poll step each iteration so other foreground
//! work (typically MIDI decoding) keeps making progress during the wait.

/// Monotonic millisecond clock. Wraps at `u32::MAX`; no calendar semantics.
pub trait MillisClock {
    fn now_ms(&self) -> u32;
}

// Wrap-safe: a deadline is reached when the signed distance to it is gone.
fn reached(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) as i32 >= 0
}

/// Busy-wait until the clock passes `deadline`.
pub fn delay_until(clock: &impl MillisClock, deadline: u32) {
    while !reached(clock.now_ms(), deadline) {
        core::hint::spin_loop();
    }
}

/// Busy-wait for `ms` milliseconds.
pub fn delay_ms(clock: &impl MillisClock, ms: u32) {
    delay_until(clock, clock.now_ms().wrapping_add(ms));
}

/// Busy-wait for `ms` milliseconds, invoking `poll` every iteration.
pub fn delay_ms_poll(clock: &impl MillisClock, ms: u32, mut poll: impl FnMut()) {
    let deadline = clock.now_ms().wrapping_add(ms);
    while !reached(clock.now_ms(), deadline) {
        poll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClock;

    #[test]
    fn delay_runs_to_the_deadline() {
        let clock = MockClock::new(1);
        delay_ms(&clock, 10);
        assert!(clock.elapsed() >= 10);
    }

    #[test]
    fn delay_poll_makes_progress_each_iteration() {
        let clock = MockClock::new(1);
        let mut polls = 0u32;
        delay_ms_poll(&clock, 10, || polls += 1);
        assert!(polls >= 9);
    }

    #[test]
    fn deadline_comparison_survives_wraparound() {
        assert!(!reached(u32::MAX - 2, 2)); // deadline 4 ticks ahead, across wrap
        assert!(reached(2, u32::MAX - 2)); // deadline 4 ticks behind
        assert!(reached(5, 5));

        let clock = MockClock::with_start(u32::MAX - 3, 1);
        delay_ms(&clock, 8);
        assert!(clock.elapsed() >= 8);
    }

    #[test]
    fn delay_until_a_past_time_returns_immediately() {
        let clock = MockClock::with_start(100, 1);
        delay_until(&clock, 50);
        assert!(clock.elapsed() <= 1);
    }
}
