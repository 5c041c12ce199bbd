//! MIDI note-event decoding and encoding
//!
//! The decoder is a three-state machine fed one byte at a time from the
//! inbound serial channel. Only note-on/note-off commands are recognized;
//! everything else is discarded while awaiting a command. A status byte
//! (high bit set) arriving mid-message re-synchronizes the machine instead
//! of desyncing it, so corruption heals within at most one further byte.

use heapless::String;

use crate::channel::SerialChannel;
use crate::config::{NOTES_IN_OCTAVE, NOTE_OFF, NOTE_ON, WHITE_KEYS_IN_OCTAVE};
use crate::types::{MidiEvent, NoteHandler};

// ===================================================================
// Decoder
// ===================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    AwaitingCommand,
    AwaitingNote,
    AwaitingVelocity,
}

/// Receive-side MIDI state machine.
///
/// Mutated only by the foreground loop as it drains the channel; events are
/// dispatched synchronously to the registered handlers, so [`poll`](Self::poll)
/// must never be called from interrupt context. An event decoded while its
/// handler is unset is dropped, not queued.
pub struct MidiRx {
    state: DecoderState,
    command: u8,
    note: u8,
    pub on_note_on: Option<NoteHandler>,
    pub on_note_off: Option<NoteHandler>,
}

impl MidiRx {
    pub const fn new() -> Self {
        Self {
            state: DecoderState::AwaitingCommand,
            command: 0,
            note: 0,
            on_note_on: None,
            on_note_off: None,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Decode one pending byte if available.
    pub fn poll(&mut self, serial: &SerialChannel) {
        let Some(byte) = serial.try_read() else {
            return;
        };
        if let Some(event) = self.step(byte) {
            self.dispatch(event);
        }
    }

    /// Advance the state machine by one byte.
    pub fn step(&mut self, byte: u8) -> Option<MidiEvent> {
        match self.state {
            DecoderState::AwaitingCommand => {
                let cmd = byte & 0xf0;
                if cmd == NOTE_ON || cmd == NOTE_OFF {
                    self.command = cmd;
                    self.state = DecoderState::AwaitingNote;
                }
                None
            }
            DecoderState::AwaitingNote => {
                if byte & 0x80 == 0 {
                    self.note = byte;
                    self.state = DecoderState::AwaitingVelocity;
                } else {
                    // Not a valid note: re-sync on the next byte.
                    self.state = DecoderState::AwaitingCommand;
                }
                None
            }
            DecoderState::AwaitingVelocity => {
                self.state = DecoderState::AwaitingCommand;
                if byte & 0x80 != 0 {
                    return None;
                }
                Some(if self.command == NOTE_ON {
                    MidiEvent::NoteOn {
                        note: self.note,
                        velocity: byte,
                    }
                } else {
                    MidiEvent::NoteOff {
                        note: self.note,
                        velocity: byte,
                    }
                })
            }
        }
    }

    fn dispatch(&self, event: MidiEvent) {
        #[cfg(feature = "defmt")]
        defmt::trace!("midi rx {}", event);

        match event {
            MidiEvent::NoteOn { note, velocity } => {
                if let Some(handler) = self.on_note_on {
                    handler(note, velocity);
                }
            }
            MidiEvent::NoteOff { note, velocity } => {
                if let Some(handler) = self.on_note_off {
                    handler(note, velocity);
                }
            }
        }
    }
}

impl Default for MidiRx {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// Encoder
// ===================================================================

/// Queue a note command on the outbound channel. Note and velocity are
/// masked to 7 bits per the wire convention; the command byte goes out as
/// given. Returns false if any byte was dropped against a full queue.
pub fn send(serial: &SerialChannel, command: u8, note: u8, velocity: u8) -> bool {
    let a = serial.write(command);
    let b = serial.write(note & 0x7f);
    let c = serial.write(velocity & 0x7f);
    a && b && c
}

// ===================================================================
// Note naming and keyboard ordinals
// ===================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accidental {
    Sharp,
    Flat,
}

const SHARPS: [&str; NOTES_IN_OCTAVE] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLATS: [&str; NOTES_IN_OCTAVE] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Name of a note in sharp or flat spelling.
pub fn note_name(note: u8, accidental: Accidental) -> &'static str {
    let idx = note as usize % NOTES_IN_OCTAVE;
    match accidental {
        Accidental::Sharp => SHARPS[idx],
        Accidental::Flat => FLATS[idx],
    }
}

/// Both spellings of a note name, e.g. `"C#/Db"`, or just `"C"` where they
/// agree.
pub fn full_note_name(note: u8) -> String<8> {
    let sharp = note_name(note, Accidental::Sharp);
    let flat = note_name(note, Accidental::Flat);
    let mut name: String<8> = String::new();
    let _ = name.push_str(sharp);
    if sharp != flat {
        let _ = name.push_str("/");
        let _ = name.push_str(flat);
    }
    name
}

/// Octave number of a MIDI note.
pub fn octave_of(note: u8) -> u8 {
    note / NOTES_IN_OCTAVE as u8
}

/// White-key ordinal 0-6 within the octave, or None for a black key.
pub fn white_index(note: u8) -> Option<u8> {
    const CONVERT: [i8; NOTES_IN_OCTAVE] = [0, -1, 1, -1, 2, 3, -1, 4, -1, 5, -1, 6];
    let idx = CONVERT[note as usize % NOTES_IN_OCTAVE];
    (idx >= 0).then_some(idx as u8)
}

/// MIDI note offset of a white-key ordinal within its octave.
pub fn white_to_midi(white: u8) -> u8 {
    const CONVERT: [u8; WHITE_KEYS_IN_OCTAVE] = [0, 2, 4, 5, 7, 9, 11];
    CONVERT[white as usize % WHITE_KEYS_IN_OCTAVE]
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSerialPort;
    use std::sync::Mutex;

    fn feed(rx: &mut MidiRx, bytes: &[u8]) -> Vec<MidiEvent> {
        bytes.iter().filter_map(|&b| rx.step(b)).collect()
    }

    #[test]
    fn decodes_note_on_triple() {
        let mut rx = MidiRx::new();
        let events = feed(&mut rx, &[0x90, 0x3c, 0x64]);
        assert_eq!(
            events,
            vec![MidiEvent::NoteOn {
                note: 60,
                velocity: 100
            }]
        );
        assert_eq!(rx.state(), DecoderState::AwaitingCommand);
    }

    #[test]
    fn decodes_note_off_and_ignores_channel_nibble() {
        let mut rx = MidiRx::new();
        let events = feed(&mut rx, &[0x83, 0x3c, 0x40]);
        assert_eq!(
            events,
            vec![MidiEvent::NoteOff {
                note: 60,
                velocity: 64
            }]
        );
    }

    #[test]
    fn invalid_velocity_emits_nothing() {
        let mut rx = MidiRx::new();
        let events = feed(&mut rx, &[0x90, 0x3c, 0xff]);
        assert!(events.is_empty());
        assert_eq!(rx.state(), DecoderState::AwaitingCommand);
    }

    #[test]
    fn status_byte_during_note_resyncs() {
        let mut rx = MidiRx::new();
        // The second status byte is discarded and the machine waits for a
        // fresh command, so the following data pair is ignored too.
        let events = feed(&mut rx, &[0x90, 0xff, 0x3c, 0x64]);
        assert!(events.is_empty());
        assert_eq!(rx.state(), DecoderState::AwaitingCommand);

        // A new valid command gets things moving again.
        let events = feed(&mut rx, &[0x90, 0x3c, 0x64]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn non_note_commands_are_discarded() {
        let mut rx = MidiRx::new();
        // 0xb0 (control change) is not recognized; its data bytes fall
        // through as non-commands as well.
        let events = feed(&mut rx, &[0xb0, 0x07, 0x7f, 0x90, 0x40, 0x01]);
        assert_eq!(
            events,
            vec![MidiEvent::NoteOn {
                note: 0x40,
                velocity: 1
            }]
        );
    }

    static SEEN_ON: Mutex<Vec<(u8, u8)>> = Mutex::new(Vec::new());

    #[test]
    fn poll_drains_channel_and_dispatches() {
        fn on_note_on(note: u8, velocity: u8) {
            SEEN_ON.lock().unwrap().push((note, velocity));
        }

        let ch = SerialChannel::new();
        let mut port = MockSerialPort::new();
        port.feed(&[0x90, 0x3c, 0x64]);
        ch.service_rx(&mut port);

        let mut rx = MidiRx::new();
        rx.on_note_on = Some(on_note_on);
        // note-off handler stays unset; nothing to observe, nothing queued.
        for _ in 0..4 {
            rx.poll(&ch);
        }

        assert_eq!(SEEN_ON.lock().unwrap().as_slice(), &[(60, 100)]);
        assert!(!ch.has_rx_data());
    }

    #[test]
    fn unset_handler_drops_event() {
        let ch = SerialChannel::new();
        let mut port = MockSerialPort::new();
        port.feed(&[0x80, 0x3c, 0x40]);
        ch.service_rx(&mut port);

        let mut rx = MidiRx::new();
        for _ in 0..3 {
            rx.poll(&ch);
        }
        // Decoder returned to idle without panicking or queuing anything.
        assert_eq!(rx.state(), DecoderState::AwaitingCommand);
    }

    #[test]
    fn send_masks_data_bytes() {
        let ch = SerialChannel::new();
        assert!(send(&ch, NOTE_ON, 0xbc, 0xe4));
        let mut port = MockSerialPort::new();
        while ch.service_tx(&mut port) {}
        assert_eq!(port.tx_sink(), &[0x90, 0x3c, 0x64]);
    }

    #[test]
    fn note_names() {
        assert_eq!(note_name(60, Accidental::Sharp), "C");
        assert_eq!(note_name(61, Accidental::Sharp), "C#");
        assert_eq!(note_name(61, Accidental::Flat), "Db");
        assert_eq!(full_note_name(60).as_str(), "C");
        assert_eq!(full_note_name(61).as_str(), "C#/Db");
    }

    #[test]
    fn keyboard_ordinals() {
        assert_eq!(octave_of(60), 5);
        assert_eq!(white_index(60), Some(0));
        assert_eq!(white_index(61), None);
        assert_eq!(white_index(71), Some(6));
        assert_eq!(white_to_midi(0), 0);
        assert_eq!(white_to_midi(3), 5);
        assert_eq!(white_to_midi(6), 11);
    }
}
