//! In-memory mock collaborators for host-side tests
//!
//! Each mock implements one of the [`crate::hal`] traits (or
//! [`MillisClock`]) against heapless buffers, so the core can be exercised
//! without hardware: script the inbound bytes, press virtual keys, then
//! inspect what went out on the wire.

use core::cell::Cell;

use heapless::{Deque, Vec};

use crate::config::{KEY_COLS, KEY_ROWS};
use crate::hal::{LedBus, LineError, MatrixInterface, SerialPort};
use crate::time::MillisClock;

// ===================================================================
// Serial port
// ===================================================================

/// Scripted serial transceiver: queued receive bytes (or line errors) on one
/// side, captured transmit bytes on the other.
pub struct MockSerialPort {
    rx_script: Deque<Result<u8, LineError>, 64>,
    tx_sink: Vec<u8, 256>,
    tx_ready: bool,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self {
            rx_script: Deque::new(),
            tx_sink: Vec::new(),
            tx_ready: true,
        }
    }

    /// Append bytes to the receive script.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            assert!(
                self.rx_script.push_back(Ok(byte)).is_ok(),
                "mock rx script full"
            );
        }
    }

    /// Append a line error to the receive script.
    pub fn feed_error(&mut self, err: LineError) {
        assert!(
            self.rx_script.push_back(Err(err)).is_ok(),
            "mock rx script full"
        );
    }

    /// Everything written to the transmitter so far.
    pub fn tx_sink(&self) -> &[u8] {
        &self.tx_sink
    }

    pub fn set_transmit_ready(&mut self, ready: bool) {
        self.tx_ready = ready;
    }
}

impl Default for MockSerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPort for MockSerialPort {
    fn byte_available(&self) -> bool {
        !self.rx_script.is_empty()
    }

    fn read_byte(&mut self) -> Result<u8, LineError> {
        self.rx_script
            .pop_front()
            .expect("read_byte with no byte available")
    }

    fn transmit_ready(&self) -> bool {
        self.tx_ready
    }

    fn write_byte(&mut self, byte: u8) {
        assert!(self.tx_sink.push(byte).is_ok(), "mock tx sink full");
    }
}

// ===================================================================
// LED bus
// ===================================================================

/// Captures the component stream of a flush.
pub struct MockLedBus {
    sent: Vec<u8, 1024>,
}

impl MockLedBus {
    pub fn new() -> Self {
        Self { sent: Vec::new() }
    }

    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Default for MockLedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LedBus for MockLedBus {
    fn send_component(&mut self, byte: u8) {
        assert!(self.sent.push(byte).is_ok(), "mock led capture full");
    }

    fn wait_component_sent(&mut self) {}
}

// ===================================================================
// Key matrix
// ===================================================================

/// Virtual key matrix: per-row column levels plus a record of the row
/// selections, for asserting the scan order.
pub struct MockMatrix {
    columns: [u8; KEY_ROWS],
    selected: usize,
    selects: Vec<usize, 128>,
}

impl MockMatrix {
    pub fn new() -> Self {
        Self {
            columns: [0; KEY_ROWS],
            selected: 0,
            selects: Vec::new(),
        }
    }

    /// Press or release a key by flat index (`column * KEY_ROWS + row`).
    pub fn set_key(&mut self, key: u8, down: bool) {
        let row = key as usize % KEY_ROWS;
        let col = key as usize / KEY_ROWS;
        assert!(col < KEY_COLS, "key {key} out of range");
        if down {
            self.columns[row] |= 1 << col;
        } else {
            self.columns[row] &= !(1 << col);
        }
    }

    /// Row selections seen so far, in order.
    pub fn selects(&self) -> &[usize] {
        &self.selects
    }
}

impl Default for MockMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixInterface for MockMatrix {
    fn select_row(&mut self, row: usize) {
        self.selected = row;
        if self.selects.is_full() {
            self.selects.remove(0);
        }
        assert!(self.selects.push(row).is_ok());
    }

    fn read_columns(&mut self) -> u8 {
        self.columns[self.selected]
    }
}

// ===================================================================
// Clock
// ===================================================================

/// Clock that advances by a fixed step on every query, so busy-wait delays
/// terminate deterministically.
pub struct MockClock {
    start: u32,
    now: Cell<u32>,
    step: u32,
}

impl MockClock {
    pub fn new(step: u32) -> Self {
        Self::with_start(0, step)
    }

    pub fn with_start(start: u32, step: u32) -> Self {
        Self {
            start,
            now: Cell::new(start),
            step,
        }
    }

    /// Milliseconds ticked since construction.
    pub fn elapsed(&self) -> u32 {
        self.now.get().wrapping_sub(self.start)
    }
}

impl MillisClock for MockClock {
    fn now_ms(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }
}
