//! 4x4 matrix keypad scanner.
//!
//! # Theory of operation
//!
//! The four column lines are outputs and the four row lines are inputs. To
//! scan, one column is driven active while the others stay inactive; after a
//! settle delay the rows are sampled, and any asserted row means the key at
//! that (row, column) intersection is down.
//!
//! Columns are visited 0..3 and rows checked 0..3 within each column. The
//! first asserted intersection wins, so with several keys held the key in the
//! lowest column (then lowest row) is reported. This is a documented
//! tie-break, not something the hardware guarantees.
//!
//! The settle delay is the only filtering. A bouncing contact can be
//! reported twice; callers pace their reads instead.

use std::time::Duration;

use keylock_core::{
    KeyEvent, Keymap,
    constants::{KEYPAD_COLUMNS, KEYPAD_ROWS},
};
use tracing::trace;

use crate::traits::{Delay, InputLine, KeypadDevice, OutputLine};

/// Matrix keypad driven through digital lines.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use keylock_core::{KeyEvent, Keymap};
/// use keylock_hardware::keypad::MatrixKeypad;
/// use keylock_hardware::mock::MockMatrix;
/// use keylock_hardware::traits::TokioDelay;
///
/// #[tokio::main(flavor = "current_thread", start_paused = true)]
/// async fn main() -> keylock_hardware::Result<()> {
///     let (columns, rows, matrix) = MockMatrix::new(Keymap::default());
///     let mut keypad = MatrixKeypad::new(
///         columns,
///         rows,
///         Keymap::default(),
///         TokioDelay,
///         Duration::from_millis(5),
///     );
///
///     assert_eq!(keypad.scan().await, None);
///
///     matrix.press('8')?;
///     assert_eq!(keypad.scan().await, Some(KeyEvent::Digit(8)));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MatrixKeypad<C, R, D> {
    columns: [C; KEYPAD_COLUMNS],
    rows: [R; KEYPAD_ROWS],
    keymap: Keymap,
    delay: D,
    settle: Duration,
}

impl<C, R, D> MatrixKeypad<C, R, D>
where
    C: OutputLine,
    R: InputLine,
    D: Delay,
{
    /// Create a scanner. All columns start inactive.
    pub fn new(
        mut columns: [C; KEYPAD_COLUMNS],
        rows: [R; KEYPAD_ROWS],
        keymap: Keymap,
        delay: D,
        settle: Duration,
    ) -> Self {
        for column in &mut columns {
            column.write(false);
        }
        Self {
            columns,
            rows,
            keymap,
            delay,
            settle,
        }
    }

    /// Run one scan pass over all columns.
    ///
    /// Takes `KEYPAD_COLUMNS * settle` when no key is down. All columns are
    /// left inactive on return.
    pub async fn scan(&mut self) -> Option<KeyEvent> {
        for column in 0..KEYPAD_COLUMNS {
            self.drive(Some(column));
            self.delay.delay(self.settle).await;

            if let Some(row) = self.rows.iter().position(|line| line.read()) {
                self.drive(None);
                let event = self.keymap.event_at(row, column);
                trace!(row, column, ?event, "key asserted");
                return event;
            }
        }

        self.drive(None);
        None
    }

    /// Time a pass takes when no key is pressed.
    pub fn pass_duration(&self) -> Duration {
        self.settle * KEYPAD_COLUMNS as u32
    }

    fn drive(&mut self, active: Option<usize>) {
        for (index, line) in self.columns.iter_mut().enumerate() {
            line.write(Some(index) == active);
        }
    }
}

impl<C, R, D> KeypadDevice for MatrixKeypad<C, R, D>
where
    C: OutputLine,
    R: InputLine,
    D: Delay,
{
    async fn poll_keypad(&mut self) -> Option<KeyEvent> {
        self.scan().await
    }
}
