//! Common types shared across the MidiLights core

/// One RGB color triple, one per physical LED position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const RED: Rgb = Rgb::new(0xff, 0x00, 0x00);
    pub const GREEN: Rgb = Rgb::new(0x00, 0xff, 0x00);
    pub const BLUE: Rgb = Rgb::new(0x00, 0x00, 0xff);
    pub const SILVER: Rgb = Rgb::new(0xc0, 0xc0, 0xc0);
    pub const GRAY: Rgb = Rgb::new(0x80, 0x80, 0x80);
    pub const MAROON: Rgb = Rgb::new(0x80, 0x00, 0x00);
    pub const YELLOW: Rgb = Rgb::new(0xff, 0xff, 0x00);
    pub const OLIVE: Rgb = Rgb::new(0x80, 0x80, 0x00);
    pub const AQUA: Rgb = Rgb::new(0x00, 0xff, 0xff);
    pub const TEAL: Rgb = Rgb::new(0x00, 0x80, 0x80);
    pub const NAVY: Rgb = Rgb::new(0x00, 0x00, 0x80);
    pub const FUCHSIA: Rgb = Rgb::new(0xff, 0x00, 0xff);
    pub const PURPLE: Rgb = Rgb::new(0x80, 0x00, 0x80);
}

/// A decoded MIDI note event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MidiEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
}

/// Application callback for a decoded note event.
///
/// Handlers are plain function pointers; registration is a settable/unsettable
/// capability and dispatch is a conditional call from foreground polling code,
/// never from an interrupt.
pub type NoteHandler = fn(note: u8, velocity: u8);

/// Application callback for a debounced key edge. The argument is the flat
/// key index (`column * KEY_ROWS + row`).
pub type KeyHandler = fn(key: u8);
