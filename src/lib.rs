//! MidiLights - MIDI-driven RGB light strip core
//!
//! This library provides the concurrency-safe data-acquisition and actuation
//! layer for a single-core, no-OS keyboard lighting controller: an
//! interrupt-fed serial byte channel, a MIDI note-event decoder, a debounced
//! key-matrix scanner and a dirty-tracked LED frame store.
//!
//! ## Architecture
//! - **Two contexts**: preemptive interrupt handlers and one cooperative
//!   foreground loop. ISRs feed the byte channel and drain the frame store;
//!   the foreground loop does everything else.
//! - **Minimal critical sections**: shared cursors are single-writer atomics,
//!   multi-step updates take a short `critical-section` guard. No other
//!   synchronization exists or is needed on a single core.
//! - **Hardware abstraction**: serial port, LED bus, key matrix and clock are
//!   traits in [`hal`]; register setup and pin wiring live outside this crate.

#![cfg_attr(not(test), no_std)]

pub mod channel;
pub mod config;
pub mod hal;
pub mod keys;
pub mod led;
pub mod midi;
pub mod time;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
