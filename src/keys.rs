//! Key matrix scanning with per-key software debounce
//!
//! One row is selected at a time; every scan tick consumes the column
//! samples of the row selected on the *previous* tick (the select-then-read
//! is pipelined one tick behind so the lines settle electrically), advances
//! each of that row's keys through the debounce machine, then moves the row
//! selection round-robin. A given key is therefore sampled once per full
//! sweep of the rows.
//!
//! Time-multiplexed software debounce: scan latency traded for component
//! count.

use crate::config::{DEBOUNCE_COUNT_DOWN, DEBOUNCE_COUNT_UP, KEY_COLS, KEY_ROWS, NUM_KEYS};
use crate::hal::MatrixInterface;
use crate::types::KeyHandler;

/// Logical state of one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyState {
    /// Before the first sample; resolves immediately, without an event.
    Unknown,
    AwaitingDown,
    Down,
    AwaitingUp,
    Up,
}

#[derive(Clone, Copy)]
struct KeyDebounce {
    state: KeyState,
    count: u8,
}

enum Edge {
    Down,
    Up,
}

/// One step of the five-state debounce table. An edge fires only after the
/// configured run of consistent samples; an inconsistent sample while
/// awaiting flips straight back to the stable state.
fn step_debounce(key: KeyDebounce, down: bool) -> (KeyDebounce, Option<Edge>) {
    let (state, count, edge) = match key.state {
        KeyState::AwaitingDown => {
            if !down {
                (KeyState::Up, 0, None)
            } else if key.count >= DEBOUNCE_COUNT_DOWN {
                (KeyState::Down, 0, Some(Edge::Down))
            } else {
                (KeyState::AwaitingDown, key.count + 1, None)
            }
        }
        KeyState::Down => {
            if down {
                (KeyState::Down, 0, None)
            } else {
                (KeyState::AwaitingUp, 0, None)
            }
        }
        KeyState::AwaitingUp => {
            if down {
                (KeyState::Down, 0, None)
            } else if key.count >= DEBOUNCE_COUNT_UP {
                (KeyState::Up, 0, Some(Edge::Up))
            } else {
                (KeyState::AwaitingUp, key.count + 1, None)
            }
        }
        KeyState::Up => {
            if down {
                (KeyState::AwaitingDown, 0, None)
            } else {
                (KeyState::Up, 0, None)
            }
        }
        KeyState::Unknown => (if down { KeyState::Down } else { KeyState::Up }, 0, None),
    };
    (KeyDebounce { state, count }, edge)
}

/// Round-robin matrix scanner. Foreground context only; no reentrancy.
pub struct KeyScanner {
    row: usize,
    keys: [KeyDebounce; NUM_KEYS],
    pub on_key_down: Option<KeyHandler>,
    pub on_key_up: Option<KeyHandler>,
}

impl KeyScanner {
    pub const fn new() -> Self {
        Self {
            row: 0,
            keys: [KeyDebounce {
                state: KeyState::Unknown,
                count: 0,
            }; NUM_KEYS],
            on_key_down: None,
            on_key_up: None,
        }
    }

    /// Drive the initial row selection so the first [`scan`](Self::scan) has
    /// settled columns to read.
    pub fn begin(&self, matrix: &mut impl MatrixInterface) {
        matrix.select_row(self.row);
    }

    /// One scan tick: consume the current row's columns, debounce, fire edge
    /// callbacks synchronously in column order, then select the next row.
    pub fn scan(&mut self, matrix: &mut impl MatrixInterface) {
        let mut cols = matrix.read_columns();
        let mut key = self.row;

        for _ in 0..KEY_COLS {
            let down = cols & 1 != 0;
            let (next, edge) = step_debounce(self.keys[key], down);
            self.keys[key] = next;
            match edge {
                Some(Edge::Down) => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("key {} down", key);
                    if let Some(handler) = self.on_key_down {
                        handler(key as u8);
                    }
                }
                Some(Edge::Up) => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("key {} up", key);
                    if let Some(handler) = self.on_key_up {
                        handler(key as u8);
                    }
                }
                None => {}
            }
            cols >>= 1;
            key += KEY_ROWS;
        }

        self.row += 1;
        if self.row == KEY_ROWS {
            self.row = 0;
        }
        matrix.select_row(self.row);
    }

    /// Debounced state of a key, None if the index is out of range.
    pub fn key_state(&self, key: usize) -> Option<KeyState> {
        self.keys.get(key).map(|k| k.state)
    }
}

impl Default for KeyScanner {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// Tests
// ===================================================================
