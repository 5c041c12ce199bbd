//! Build-time configuration for the MidiLights core

// ===================================================================
// Serial Channel Buffering
// ===================================================================

// Buffer sizes must be a power of two; one slot is sacrificed to
// distinguish full from empty without a separate counter.
pub const SERIAL_RX_BUFSIZE: usize = 16;
pub const SERIAL_TX_BUFSIZE: usize = 64;

/// MIDI wire rate. Port setup happens outside this crate.
pub const MIDI_BAUD: u32 = 31_250;

// ===================================================================
// MIDI Protocol
// ===================================================================

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;

pub const NOTES_IN_OCTAVE: usize = 12;
pub const WHITE_KEYS_IN_OCTAVE: usize = 7;

// ===================================================================
// Key Matrix (4 octaves x 7 white keys per octave)
// ===================================================================

pub const KEY_ROWS: usize = 7; // one row per white note C,D,E,F,G,A,B
pub const KEY_COLS: usize = 4; // one column per octave
pub const NUM_KEYS: usize = KEY_ROWS * KEY_COLS;

// Consecutive consistent samples needed to confirm an edge. Press and
// release bounce differently, hence the asymmetry.
pub const DEBOUNCE_COUNT_DOWN: u8 = 2;
pub const DEBOUNCE_COUNT_UP: u8 = 4;

// ===================================================================
// LED Strip
// ===================================================================

// 4 octaves, 7 white notes per octave, 2 leds per white note
pub const NUM_LEDS: usize = 56;
