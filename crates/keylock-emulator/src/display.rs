//! Virtual character LCD.
//!
//! This module provides a 2-line × 16-column character buffer that stands in
//! for the HD44780-style display of the access panel, and a shared
//! [`DisplayHandle`] that plugs the buffer into the output controller while
//! still letting tests and the simulator read what is on screen.
//!
//! # Character Encoding - ASCII Only
//!
//! The panel's character ROM only covers printable ASCII. Control characters
//! are dropped and anything outside ASCII is rendered as `?`, so a message
//! that looks right here looks right on the panel.
//!
//! # Examples
//!
//! ```
//! use keylock_emulator::VirtualDisplay;
//!
//! let mut display = VirtualDisplay::new(2, 16);
//! display.write_at(0, 0, "Press Key:").unwrap();
//! display.write_at(1, 0, "3").unwrap();
//!
//! assert_eq!(display.get_line(0).unwrap(), "Press Key:      ");
//! assert_eq!(display.get_line(1).unwrap().trim_end(), "3");
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keylock_core::{
    Error, Result,
    constants::{LCD_COLUMNS, LCD_LINES},
};
use keylock_hardware::TextDisplay;
use tracing::trace;

/// Character cell buffer of a fixed-size LCD.
///
/// # Thread Safety
///
/// This struct is not synchronized. Share it through a [`DisplayHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDisplay {
    /// Number of lines in the display.
    lines: usize,

    /// Number of columns per line.
    columns: usize,

    /// One space-padded ASCII string per line.
    buffer: Vec<String>,
}

impl VirtualDisplay {
    /// Create a blank display with the given dimensions.
    pub fn new(lines: usize, columns: usize) -> Self {
        Self {
            lines,
            columns,
            buffer: vec![" ".repeat(columns); lines],
        }
    }

    /// Create a builder for constructing a display with custom dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use keylock_emulator::VirtualDisplay;
    ///
    /// let display = VirtualDisplay::builder().with_size(4, 20).build();
    /// assert_eq!(display.get_all_lines().len(), 4);
    /// ```
    pub fn builder() -> VirtualDisplayBuilder {
        VirtualDisplayBuilder::default()
    }

    /// Overwrite cells starting at `(line, column)`.
    ///
    /// Cells outside the text are left untouched. Text running past the
    /// right edge is truncated; there is no wrap to the next line.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLine` if `line` is out of bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use keylock_emulator::VirtualDisplay;
    ///
    /// let mut display = VirtualDisplay::new(2, 16);
    /// display.write_at(0, 12, "motor").unwrap();
    /// assert_eq!(display.get_line(0).unwrap(), "            moto");
    /// ```
    pub fn write_at(&mut self, line: usize, column: usize, text: &str) -> Result<()> {
        if line >= self.lines {
            return Err(Error::InvalidLine {
                line,
                max: self.lines.saturating_sub(1),
            });
        }

        let available = self.columns.saturating_sub(column);
        let text = truncate_text(&sanitize_text(text), available);
        if !text.is_empty() {
            self.buffer[line].replace_range(column..column + text.len(), &text);
        }
        Ok(())
    }

    /// Fill every cell with a space.
    pub fn clear(&mut self) {
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns);
        }
    }

    /// Get the content of a line, padded to the column width.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLine` if `line` is out of bounds.
    pub fn get_line(&self, line: usize) -> Result<&str> {
        self.buffer
            .get(line)
            .map(String::as_str)
            .ok_or(Error::InvalidLine {
                line,
                max: self.lines.saturating_sub(1),
            })
    }

    /// Get all lines as a vector.
    pub fn get_all_lines(&self) -> Vec<&str> {
        self.buffer.iter().map(String::as_str).collect()
    }

    /// Returns `true` if every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.buffer.iter().all(|line| line.trim().is_empty())
    }
}

impl Default for VirtualDisplay {
    fn default() -> Self {
        Self::new(LCD_LINES, LCD_COLUMNS)
    }
}

/// Builder for constructing `VirtualDisplay` instances.
#[derive(Debug)]
pub struct VirtualDisplayBuilder {
    lines: usize,
    columns: usize,
}

impl VirtualDisplayBuilder {
    /// Set the display size (lines and columns).
    pub fn with_size(mut self, lines: usize, columns: usize) -> Self {
        self.lines = lines;
        self.columns = columns;
        self
    }

    /// Build the virtual display with configured parameters.
    pub fn build(self) -> VirtualDisplay {
        VirtualDisplay::new(self.lines, self.columns)
    }
}

impl Default for VirtualDisplayBuilder {
    fn default() -> Self {
        Self {
            lines: LCD_LINES,
            columns: LCD_COLUMNS,
        }
    }
}

/// Shared handle to a [`VirtualDisplay`].
///
/// One clone is handed to the output controller as its [`TextDisplay`];
/// other clones read the screen. Writes to rows the display does not have
/// are dropped, as the LCD controller would.
#[derive(Debug, Clone, Default)]
pub struct DisplayHandle {
    inner: Arc<Mutex<VirtualDisplay>>,
}

impl DisplayHandle {
    /// Wrap a display.
    pub fn new(display: VirtualDisplay) -> Self {
        Self {
            inner: Arc::new(Mutex::new(display)),
        }
    }

    /// Content of one line, trailing padding removed. Empty for rows the
    /// display does not have.
    pub fn line(&self, line: usize) -> String {
        self.lock()
            .get_line(line)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_default()
    }

    /// Copy of the whole display.
    pub fn snapshot(&self) -> VirtualDisplay {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, VirtualDisplay> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TextDisplay for DisplayHandle {
    fn clear(&mut self) {
        self.lock().clear();
    }

    fn write_text(&mut self, row: usize, column: usize, text: &str) {
        if let Err(error) = self.lock().write_at(row, column, text) {
            trace!(%error, "display write dropped");
        }
    }
}

/// Truncate ASCII text to a maximum number of characters.
///
/// # Examples
///
/// ```
/// use keylock_emulator::truncate_text;
///
/// assert_eq!(truncate_text("Wrong Code", 5), "Wrong");
/// assert_eq!(truncate_text("motor", 16), "motor");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Drop control characters and replace non-ASCII characters with `?`.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}
