//! # Barcode Scanner Buffer
//!
//! USB scanners type like a keyboard, only much faster. This buffer tells a
//! scanner burst from a person typing by the gap between keys.
//!
//! ```text
//!  key   '2'   '0'   '0'   '1'   Enter
//!  gap    -    12ms  9ms   11ms  10ms    → Scanned("2001")
//!
//!  key   '2'   '0'         '0'   Enter
//!  gap    -    12ms  180ms ...           → buffer reset at '0' (human typing)
//! ```
//!
//! The caller supplies the instant of every key so the buffer stays free
//! of clocks.

use std::time::{Duration, Instant};

/// Largest gap between keystrokes that still counts as one scan.
pub const DEFAULT_MAX_GAP: Duration = Duration::from_millis(50);

/// Shortest code accepted as a scan.
pub const DEFAULT_MIN_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKey {
    Char(char),
    Enter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Key buffered, burst still in progress.
    Pending,
    /// A complete scan.
    Scanned(String),
    /// Key did not complete a scan (too short, or not printable).
    Ignored,
}

#[derive(Debug, Clone)]
pub struct BarcodeScanner {
    buffer: String,
    last_key: Option<Instant>,
    max_gap: Duration,
    min_len: usize,
}

impl Default for BarcodeScanner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_GAP, DEFAULT_MIN_LEN)
    }
}

impl BarcodeScanner {
    pub fn new(max_gap: Duration, min_len: usize) -> Self {
        BarcodeScanner {
            buffer: String::new(),
            last_key: None,
            max_gap,
            min_len,
        }
    }

    /// Feeds one keystroke that arrived at `at`.
    pub fn push(&mut self, key: ScanKey, at: Instant) -> ScanEvent {
        if let Some(last) = self.last_key {
            if at.saturating_duration_since(last) > self.max_gap {
                self.buffer.clear();
            }
        }
        self.last_key = Some(at);

        match key {
            ScanKey::Enter => {
                let code = std::mem::take(&mut self.buffer);
                if code.chars().count() >= self.min_len {
                    ScanEvent::Scanned(code)
                } else {
                    ScanEvent::Ignored
                }
            }
            ScanKey::Char(c) if c.is_control() => {
                self.buffer.clear();
                ScanEvent::Ignored
            }
            ScanKey::Char(c) => {
                self.buffer.push(c);
                ScanEvent::Pending
            }
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_key = None;
    }
}
