//! Electrical model of a 4x4 key matrix.
//!
//! Column lines record which columns are being driven; a row line reads
//! asserted when a pressed key connects it to an active column. This lets the
//! real [`MatrixKeypad`](crate::keypad::MatrixKeypad) scanner run against
//! simulated key presses.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use keylock_core::{
    Keymap,
    constants::{KEYPAD_COLUMNS, KEYPAD_ROWS},
};

use super::lock;
use crate::{
    HardwareError, Result,
    traits::{InputLine, OutputLine},
};

#[derive(Debug, Default)]
struct MatrixState {
    active_columns: [bool; KEYPAD_COLUMNS],
    pressed: [[bool; KEYPAD_COLUMNS]; KEYPAD_ROWS],
}

/// Constructor for a simulated key matrix.
#[derive(Debug)]
pub struct MockMatrix;

impl MockMatrix {
    /// Create the column lines, row lines and a control handle sharing one
    /// matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use keylock_core::Keymap;
    /// use keylock_hardware::mock::MockMatrix;
    /// use keylock_hardware::traits::{InputLine, OutputLine};
    ///
    /// let (mut columns, rows, matrix) = MockMatrix::new(Keymap::default());
    /// matrix.press('5').unwrap();
    ///
    /// assert!(!rows[1].read());
    /// columns[1].write(true);
    /// assert!(rows[1].read());
    /// ```
    #[allow(clippy::new_ret_no_self)]
    pub fn new(
        keymap: Keymap,
    ) -> (
        [MockColumnLine; KEYPAD_COLUMNS],
        [MockRowLine; KEYPAD_ROWS],
        MockMatrixHandle,
    ) {
        let state = Arc::new(Mutex::new(MatrixState::default()));
        let columns = std::array::from_fn(|index| MockColumnLine {
            index,
            state: Arc::clone(&state),
        });
        let rows = std::array::from_fn(|index| MockRowLine {
            index,
            state: Arc::clone(&state),
        });
        (columns, rows, MockMatrixHandle { keymap, state })
    }
}

/// Driven column line of the simulated matrix.
#[derive(Debug)]
pub struct MockColumnLine {
    index: usize,
    state: Arc<Mutex<MatrixState>>,
}

impl OutputLine for MockColumnLine {
    fn write(&mut self, level: bool) {
        lock(&self.state).active_columns[self.index] = level;
    }
}

/// Sampled row line of the simulated matrix.
#[derive(Debug)]
pub struct MockRowLine {
    index: usize,
    state: Arc<Mutex<MatrixState>>,
}

impl InputLine for MockRowLine {
    fn read(&self) -> bool {
        let state = lock(&self.state);
        state.pressed[self.index]
            .iter()
            .zip(state.active_columns.iter())
            .any(|(&pressed, &active)| pressed && active)
    }
}

/// Handle for pressing and releasing keys on the simulated matrix.
#[derive(Debug, Clone)]
pub struct MockMatrixHandle {
    keymap: Keymap,
    state: Arc<Mutex<MatrixState>>,
}

impl MockMatrixHandle {
    /// Hold a key down.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is not on the keymap.
    pub fn press(&self, symbol: char) -> Result<()> {
        self.set(symbol, true)
    }

    /// Release a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is not on the keymap.
    pub fn release(&self, symbol: char) -> Result<()> {
        self.set(symbol, false)
    }

    /// Release every key.
    pub fn release_all(&self) {
        lock(&self.state).pressed = Default::default();
    }

    /// Press a key, hold it for `hold`, then release it.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is not on the keymap.
    pub async fn tap(&self, symbol: char, hold: Duration) -> Result<()> {
        self.press(symbol)?;
        tokio::time::sleep(hold).await;
        self.release(symbol)
    }

    /// Returns `true` if the scanner left any column driven.
    pub fn any_column_active(&self) -> bool {
        lock(&self.state)
            .active_columns
            .iter()
            .any(|&active| active)
    }

    fn set(&self, symbol: char, pressed: bool) -> Result<()> {
        let (row, column) = self.keymap.position_of(symbol).ok_or_else(|| {
            HardwareError::invalid_data(format!("symbol '{symbol}' is not on the keypad"))
        })?;
        lock(&self.state).pressed[row][column] = pressed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_reads_only_with_column_driven() {
        let (mut columns, rows, matrix) = MockMatrix::new(Keymap::default());
        matrix.press('#').unwrap(); // row 3, column 2

        assert!(!rows[3].read());
        columns[0].write(true);
        assert!(!rows[3].read());
        columns[0].write(false);
        columns[2].write(true);
        assert!(rows[3].read());
        assert!(!rows[2].read());
    }

    #[test]
    fn test_release_all() {
        let (mut columns, rows, matrix) = MockMatrix::new(Keymap::default());
        matrix.press('1').unwrap();
        matrix.press('4').unwrap();
        matrix.release_all();

        columns[0].write(true);
        assert!(rows.iter().all(|row| !row.read()));
    }

    #[test]
    fn test_unknown_symbol_is_rejected() {
        let (_columns, _rows, matrix) = MockMatrix::new(Keymap::default());
        let error = matrix.press('x').unwrap_err();
        assert!(matches!(error, HardwareError::InvalidData { .. }));
    }
}
