//! Interrupt-safe byte channels
//!
//! A [`ByteQueue`] is a fixed-capacity circular buffer with exactly one
//! producer context and one consumer context; on the inbound side the
//! producer is the receive ISR and the consumer is the foreground loop, on
//! the outbound side the roles reverse. Each cursor has a single writer, so
//! a release-store/acquire-load pair on the cursor is the entire
//! synchronization protocol and no interrupt masking is ever required.
//!
//! [`SerialChannel`] bundles both directions with the statistics counters
//! and the ISR service routines that move bytes to and from the hardware.

use core::cell::UnsafeCell;

use portable_atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::config::{SERIAL_RX_BUFSIZE, SERIAL_TX_BUFSIZE};
use crate::hal::{LineError, SerialPort};

// ===================================================================
// Single-producer single-consumer byte queue
// ===================================================================

/// Lock-free SPSC byte FIFO. `N` must be a power of two; `N - 1` slots are
/// usable so that full and empty are distinguishable from the cursors alone.
pub struct ByteQueue<const N: usize> {
    buf: UnsafeCell<[u8; N]>,
    /// Advanced only by the producer context.
    wr: AtomicUsize,
    /// Advanced only by the consumer context.
    rd: AtomicUsize,
    overflows: AtomicU32,
}

// One writer per cursor and slots are published by the cursor store, see
// push/try_pop. Byte order is FIFO; nothing beyond FIFO is guaranteed.
unsafe impl<const N: usize> Sync for ByteQueue<N> {}

impl<const N: usize> ByteQueue<N> {
    pub const fn new() -> Self {
        assert!(N.is_power_of_two() && N >= 2);
        Self {
            buf: UnsafeCell::new([0; N]),
            wr: AtomicUsize::new(0),
            rd: AtomicUsize::new(0),
            overflows: AtomicU32::new(0),
        }
    }

    /// Capacity in usable slots.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Producer side. Enqueues and returns true, or returns false and counts
    /// an overflow if the queue is full. Never blocks: retrying in interrupt
    /// context would extend interrupt latency without bound.
    pub fn push(&self, byte: u8) -> bool {
        let wr = self.wr.load(Ordering::Relaxed);
        let next = (wr + 1) & (N - 1);
        if next == self.rd.load(Ordering::Acquire) {
            self.overflows.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        // SAFETY: slot `wr` is outside the readable region until the store
        // below publishes it, and this context is the only producer.
        unsafe {
            (*self.buf.get())[wr] = byte;
        }
        self.wr.store(next, Ordering::Release);
        true
    }

    /// Consumer side, non-blocking.
    pub fn try_pop(&self) -> Option<u8> {
        let rd = self.rd.load(Ordering::Relaxed);
        if rd == self.wr.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: the acquire load above observed the producer's release
        // store, so slot `rd` holds published data, and this context is the
        // only consumer.
        let byte = unsafe { (*self.buf.get())[rd] };
        self.rd.store((rd + 1) & (N - 1), Ordering::Release);
        Some(byte)
    }

    /// Consumer side. Busy-waits until a byte arrives; the only blocking
    /// primitive in the system, with no timeout. Callers needing a bounded
    /// wait use [`crate::time::delay_ms_poll`] and poll instead.
    pub fn pop_blocking(&self) -> u8 {
        loop {
            if let Some(byte) = self.try_pop() {
                return byte;
            }
            core::hint::spin_loop();
        }
    }

    pub fn has_data(&self) -> bool {
        self.rd.load(Ordering::Relaxed) != self.wr.load(Ordering::Acquire)
    }

    /// Bytes dropped against a full queue since initialization.
    pub fn overflows(&self) -> u32 {
        self.overflows.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// Serial channel statistics
// ===================================================================

struct StatCounters {
    rx_interrupts: AtomicU32,
    rx_bytes: AtomicU32,
    rx_parity_errors: AtomicU32,
    rx_framing_errors: AtomicU32,
    rx_overrun_errors: AtomicU32,
    tx_interrupts: AtomicU32,
    tx_bytes: AtomicU32,
}

impl StatCounters {
    const fn new() -> Self {
        Self {
            rx_interrupts: AtomicU32::new(0),
            rx_bytes: AtomicU32::new(0),
            rx_parity_errors: AtomicU32::new(0),
            rx_framing_errors: AtomicU32::new(0),
            rx_overrun_errors: AtomicU32::new(0),
            tx_interrupts: AtomicU32::new(0),
            tx_bytes: AtomicU32::new(0),
        }
    }
}

/// Snapshot of the channel counters. Monotonic, never reset after init.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialStats {
    pub rx_interrupts: u32,
    pub rx_bytes: u32,
    pub rx_parity_errors: u32,
    pub rx_framing_errors: u32,
    pub rx_overrun_errors: u32,
    pub rx_overflows: u32,
    pub tx_interrupts: u32,
    pub tx_bytes: u32,
    pub tx_overflows: u32,
}

// ===================================================================
// Serial channel
// ===================================================================

/// Both directions of the serial link plus their statistics. Designed to
/// live in a `static`: all methods take `&self`.
pub struct SerialChannel {
    rx: ByteQueue<SERIAL_RX_BUFSIZE>,
    tx: ByteQueue<SERIAL_TX_BUFSIZE>,
    stats: StatCounters,
}

impl SerialChannel {
    pub const fn new() -> Self {
        Self {
            rx: ByteQueue::new(),
            tx: ByteQueue::new(),
            stats: StatCounters::new(),
        }
    }

    /// Receive-complete ISR body. Drains the hardware into the inbound
    /// queue. A line error counts against its class, discards the byte and
    /// stops the drain; buffered bytes and the decoder are left untouched.
    pub fn service_rx(&self, port: &mut impl SerialPort) {
        self.stats.rx_interrupts.fetch_add(1, Ordering::Relaxed);

        while port.byte_available() {
            match port.read_byte() {
                Ok(byte) => {
                    // A full queue is counted by the queue itself.
                    if self.rx.push(byte) {
                        self.stats.rx_bytes.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(err) => {
                    let counter = match err {
                        LineError::Parity => &self.stats.rx_parity_errors,
                        LineError::Framing => &self.stats.rx_framing_errors,
                        LineError::Overrun => &self.stats.rx_overrun_errors,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
        }
    }

    /// Transmitter-ready ISR body. Moves at most one byte to the hardware
    /// and returns true while more bytes remain queued; the caller masks the
    /// transmit interrupt once this returns false.
    pub fn service_tx(&self, port: &mut impl SerialPort) -> bool {
        self.stats.tx_interrupts.fetch_add(1, Ordering::Relaxed);

        if !port.transmit_ready() {
            return self.tx.has_data();
        }
        match self.tx.try_pop() {
            Some(byte) => {
                port.write_byte(byte);
                self.stats.tx_bytes.fetch_add(1, Ordering::Relaxed);
                self.tx.has_data()
            }
            None => false,
        }
    }

    /// Foreground consumer: busy-wait for the next inbound byte.
    pub fn read_blocking(&self) -> u8 {
        self.rx.pop_blocking()
    }

    /// Foreground consumer: next inbound byte if one is buffered.
    pub fn try_read(&self) -> Option<u8> {
        self.rx.try_pop()
    }

    pub fn has_rx_data(&self) -> bool {
        self.rx.has_data()
    }

    /// Foreground producer: queue one outbound byte. Returns false and
    /// counts an overflow when the queue is full; the byte is dropped, not
    /// retried.
    pub fn write(&self, byte: u8) -> bool {
        self.tx.push(byte)
    }

    pub fn has_tx_data(&self) -> bool {
        self.tx.has_data()
    }

    pub fn stats(&self) -> SerialStats {
        SerialStats {
            rx_interrupts: self.stats.rx_interrupts.load(Ordering::Relaxed),
            rx_bytes: self.stats.rx_bytes.load(Ordering::Relaxed),
            rx_parity_errors: self.stats.rx_parity_errors.load(Ordering::Relaxed),
            rx_framing_errors: self.stats.rx_framing_errors.load(Ordering::Relaxed),
            rx_overrun_errors: self.stats.rx_overrun_errors.load(Ordering::Relaxed),
            rx_overflows: self.rx.overflows(),
            tx_interrupts: self.stats.tx_interrupts.load(Ordering::Relaxed),
            tx_bytes: self.stats.tx_bytes.load(Ordering::Relaxed),
            tx_overflows: self.tx.overflows(),
        }
    }
}

impl Default for SerialChannel {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// Tests
// ===================================================================
