//! Collaborator-facing hardware contracts
//!
//! The core never touches registers. Everything it needs from the board is
//! expressed as one of these traits; baud rates, pin directions and timer
//! prescalers are configured by the platform layer before the core runs.

use embedded_hal::spi::SpiBus;

/// Byte-level corruption reported by the serial receiver hardware.
///
/// Detected in the producer interrupt; the offending byte is counted and
/// discarded, the channel and decoder keep their prior state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    Parity,
    Framing,
    Overrun,
}

/// Serial transceiver as seen from the channel's ISR service routines.
pub trait SerialPort {
    /// True while the receiver holds at least one byte.
    fn byte_available(&self) -> bool;

    /// Take one byte out of the receiver. Only called when
    /// [`byte_available`](SerialPort::byte_available) is true; a line error
    /// consumes the byte.
    fn read_byte(&mut self) -> Result<u8, LineError>;

    /// True when the transmitter can accept another byte.
    fn transmit_ready(&self) -> bool;

    /// Hand one byte to the transmitter.
    fn write_byte(&mut self, byte: u8);
}

/// Streamed LED transport, position-addressed by send order.
///
/// The strip has no per-position addressing: every flush restarts at
/// position zero and streams one component at a time.
pub trait LedBus {
    fn send_component(&mut self, byte: u8);
    fn wait_component_sent(&mut self);
}

/// [`LedBus`] over any blocking [`SpiBus`].
///
/// The strip protocol has no acknowledge path, so bus errors cannot be
/// reported here; a failed write leaves stale pixels until the next flush.
pub struct SpiLedBus<T>(pub T);

impl<T: SpiBus<u8>> LedBus for SpiLedBus<T> {
    fn send_component(&mut self, byte: u8) {
        let _ = self.0.write(&[byte]);
    }

    fn wait_component_sent(&mut self) {
        let _ = self.0.flush();
    }
}

/// Row-multiplexed digital key matrix.
pub trait MatrixInterface {
    /// Drive the select line for `row`. Rows are selected one at a time.
    fn select_row(&mut self, row: usize);

    /// Sample every column of the currently selected row, bit 0 = column 0,
    /// bit set = switch closed.
    fn read_columns(&mut self) -> u8;
}
