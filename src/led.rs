//! LED strip frame store with dirty-prefix flushing
//!
//! The frame is mutated by any foreground caller and drained by a
//! fixed-cadence flush interrupt, so every touch of the (colors, dirty mark)
//! pair happens inside a short critical section. The dirty mark is the
//! highest index mutated since the last flush: the transport is streamed
//! without per-position addressing, so a flush always retransmits from
//! position zero up to the mark, and positions beyond it are assumed
//! unchanged on the wire. Cheaper than per-pixel addressing, paid for with
//! prefix retransmission; this policy is load-bearing and kept exactly.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::hal::LedBus;
use crate::types::Rgb;

struct Frame<const N: usize> {
    leds: [Rgb; N],
    /// Highest index mutated since the last flush, None when clean.
    dirty: Option<usize>,
}

/// Shareable frame store, sized to the physical strip. All methods take
/// `&self` so a `static` strip can be reached from both contexts.
pub struct LedStrip<const N: usize> {
    frame: Mutex<RefCell<Frame<N>>>,
}

impl<const N: usize> LedStrip<N> {
    /// All positions off, fully dirty: the first flush paints the whole
    /// strip to a known state.
    pub const fn new() -> Self {
        Self {
            frame: Mutex::new(RefCell::new(Frame {
                leds: [Rgb::BLACK; N],
                dirty: Some(N - 1),
            })),
        }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Store one color. Out-of-range indices are a silent no-op. The color
    /// write and the dirty-mark raise happen in one critical section so the
    /// flush interrupt never observes them half-applied.
    pub fn set(&self, idx: usize, color: Rgb) {
        if idx >= N {
            return;
        }
        critical_section::with(|cs| {
            let mut frame = self.frame.borrow_ref_mut(cs);
            frame.leds[idx] = color;
            match frame.dirty {
                Some(mark) if mark >= idx => {}
                _ => frame.dirty = Some(idx),
            }
        });
    }

    /// Snapshot of the stored color; black for out-of-range indices.
    pub fn get(&self, idx: usize) -> Rgb {
        if idx >= N {
            return Rgb::BLACK;
        }
        critical_section::with(|cs| self.frame.borrow_ref(cs).leds[idx])
    }

    /// Turn every position off and force a full retransmit on the next
    /// flush.
    pub fn clear_all(&self) {
        critical_section::with(|cs| {
            let mut frame = self.frame.borrow_ref_mut(cs);
            frame.leds = [Rgb::BLACK; N];
            frame.dirty = Some(N - 1);
        });
    }

    /// Current dirty high-water mark.
    pub fn dirty_mark(&self) -> Option<usize> {
        critical_section::with(|cs| self.frame.borrow_ref(cs).dirty)
    }

    /// Stream the dirty prefix to the transport and mark the frame clean.
    /// Returns immediately when nothing is pending.
    ///
    /// Interrupt-context only, on a fixed cadence. Runs to completion: it is
    /// the highest-priority context and finishes well within its period, so
    /// holding the critical section for the transfer matches the original
    /// interrupts-off ISR execution.
    pub fn flush(&self, bus: &mut impl LedBus) {
        critical_section::with(|cs| {
            let mut frame = self.frame.borrow_ref_mut(cs);
            let Some(mark) = frame.dirty else {
                return;
            };
            for led in &frame.leds[..=mark] {
                // Fixed component order on the wire: blue, red, green.
                bus.send_component(led.b);
                bus.wait_component_sent();
                bus.send_component(led.r);
                bus.wait_component_sent();
                bus.send_component(led.g);
                bus.wait_component_sent();
            }
            frame.dirty = None;
        });
    }
}

impl<const N: usize> Default for LedStrip<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NUM_LEDS;
    use crate::mock::MockLedBus;

    #[test]
    fn first_flush_paints_the_whole_strip() {
        let strip: LedStrip<NUM_LEDS> = LedStrip::new();
        let mut bus = MockLedBus::new();
        strip.flush(&mut bus);
        assert_eq!(bus.sent().len(), NUM_LEDS * 3);
        assert!(bus.sent().iter().all(|&b| b == 0));
        assert_eq!(strip.dirty_mark(), None);
    }

    #[test]
    fn clean_flush_transmits_nothing() {
        let strip: LedStrip<NUM_LEDS> = LedStrip::new();
        let mut bus = MockLedBus::new();
        strip.flush(&mut bus);
        bus.clear();
        strip.flush(&mut bus);
        assert!(bus.sent().is_empty());
    }

    #[test]
    fn single_write_retransmits_the_prefix() {
        let strip: LedStrip<NUM_LEDS> = LedStrip::new();
        let mut bus = MockLedBus::new();
        strip.flush(&mut bus);
        bus.clear();

        let k = 5;
        strip.set(k, Rgb::RED);
        assert_eq!(strip.dirty_mark(), Some(k));
        strip.flush(&mut bus);

        // Positions 0..=k go out, nothing beyond.
        assert_eq!(bus.sent().len(), (k + 1) * 3);
        // b, r, g order per position.
        assert_eq!(&bus.sent()[k * 3..], &[0x00, 0xff, 0x00]);
        assert_eq!(strip.dirty_mark(), None);
    }

    #[test]
    fn dirty_mark_is_the_maximum_touched_index() {
        let strip: LedStrip<NUM_LEDS> = LedStrip::new();
        let mut bus = MockLedBus::new();
        strip.flush(&mut bus);

        strip.set(20, Rgb::BLUE);
        strip.set(3, Rgb::GREEN);
        assert_eq!(strip.dirty_mark(), Some(20));

        bus.clear();
        strip.flush(&mut bus);
        assert_eq!(bus.sent().len(), 21 * 3);
    }

    #[test]
    fn clear_all_forces_full_retransmit() {
        let strip: LedStrip<NUM_LEDS> = LedStrip::new();
        let mut bus = MockLedBus::new();
        strip.flush(&mut bus);

        strip.set(10, Rgb::WHITE);
        strip.flush(&mut bus);
        bus.clear();

        strip.clear_all();
        strip.set(0, Rgb::YELLOW);
        strip.flush(&mut bus);

        let sent = bus.sent();
        assert_eq!(sent.len(), NUM_LEDS * 3);
        // Position 0 carries the new color...
        assert_eq!(&sent[..3], &[0x00, 0xff, 0xff]);
        // ...and the previously lit position went out cleared.
        assert_eq!(&sent[10 * 3..11 * 3], &[0x00, 0x00, 0x00]);
    }

    #[test]
    fn out_of_range_set_is_a_silent_no_op() {
        let strip: LedStrip<8> = LedStrip::new();
        let mut bus = MockLedBus::new();
        strip.flush(&mut bus);
        bus.clear();

        strip.set(8, Rgb::RED);
        strip.set(usize::MAX, Rgb::RED);
        assert_eq!(strip.dirty_mark(), None);
        strip.flush(&mut bus);
        assert!(bus.sent().is_empty());
        assert_eq!(strip.get(8), Rgb::BLACK);
    }

    #[test]
    fn get_returns_the_stored_color() {
        let strip: LedStrip<8> = LedStrip::new();
        strip.set(2, Rgb::FUCHSIA);
        assert_eq!(strip.get(2), Rgb::FUCHSIA);
        assert_eq!(strip.get(3), Rgb::BLACK);
    }
}
