//! Status display backed by the log output.
//!
//! The controller has no screen, so status lines go to the log. Line 0 holds
//! the run clock and changes every tick; it is kept but only logged together
//! with a change on a later line.

use auton_core::io::StatusDisplay;
use auton_core::sequence::STATUS_LINE_CAPACITY;
use heapless::String;

use crate::telemetry::log_status;

pub const STATUS_LINES: usize = 2;

#[derive(Debug, Default)]
pub struct LogDisplay {
    lines: [String<STATUS_LINE_CAPACITY>; STATUS_LINES],
    emitted: usize,
}

impl LogDisplay {
    pub const fn new() -> Self {
        Self {
            lines: [String::new(), String::new()],
            emitted: 0,
        }
    }

    /// Number of lines written to the log so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }
}

impl StatusDisplay for LogDisplay {
    fn set_status_line(&mut self, line: u8, text: &str) {
        let index = usize::from(line);
        let Some(slot) = self.lines.get_mut(index) else {
            return;
        };
        if slot.as_str() == text {
            return;
        }

        slot.clear();
        // Longer text is cut at the display width.
        for ch in text.chars() {
            if slot.push(ch).is_err() {
                break;
            }
        }

        if index > 0 {
            log_status(self.lines[0].as_str(), self.lines[index].as_str());
            self.emitted += 1;
        }
    }
}
