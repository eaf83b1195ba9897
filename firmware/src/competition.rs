//! Field-control mode shared between the field task and the auton task.
//!
//! The field task is the only writer. The auton task polls
//! [`autonomous_cancelled`] once per tick, which is what
//! `RobotIo::cancel_requested` reports to the sequencer.

use portable_atomic::{AtomicU8, Ordering};

/// Mode reported by the field controller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum CompetitionMode {
    Disabled,
    Autonomous,
    Operator,
}

impl CompetitionMode {
    const fn to_raw(self) -> u8 {
        match self {
            CompetitionMode::Disabled => 0,
            CompetitionMode::Autonomous => 1,
            CompetitionMode::Operator => 2,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => CompetitionMode::Autonomous,
            2 => CompetitionMode::Operator,
            _ => CompetitionMode::Disabled,
        }
    }

    /// Decodes the two field-control lines. A disabled robot ignores the
    /// autonomous line.
    #[must_use]
    pub const fn from_field_lines(enabled: bool, autonomous: bool) -> Self {
        match (enabled, autonomous) {
            (false, _) => CompetitionMode::Disabled,
            (true, true) => CompetitionMode::Autonomous,
            (true, false) => CompetitionMode::Operator,
        }
    }
}

static MODE: AtomicU8 = AtomicU8::new(CompetitionMode::Disabled.to_raw());

/// Current field mode.
pub fn mode() -> CompetitionMode {
    CompetitionMode::from_raw(MODE.load(Ordering::Acquire))
}

/// Publishes a new mode; returns the previous one.
pub fn set_mode(mode: CompetitionMode) -> CompetitionMode {
    CompetitionMode::from_raw(MODE.swap(mode.to_raw(), Ordering::AcqRel))
}

/// `true` once the field has left autonomous mode.
pub fn autonomous_cancelled() -> bool {
    mode() != CompetitionMode::Autonomous
}

/// Consecutive identical samples needed before a mode change is accepted.
pub const DEBOUNCE_SAMPLES: u8 = 3;

/// Filters contact bounce on the field-control lines.
#[derive(Debug)]
pub struct FieldDebouncer {
    candidate: CompetitionMode,
    streak: u8,
}

impl FieldDebouncer {
    pub const fn new() -> Self {
        Self {
            candidate: CompetitionMode::Disabled,
            streak: 0,
        }
    }

    /// Feeds one sample of the two lines. Returns the mode once it has been
    /// stable for [`DEBOUNCE_SAMPLES`] samples in a row.
    pub fn sample(&mut self, enabled: bool, autonomous: bool) -> Option<CompetitionMode> {
        let mode = CompetitionMode::from_field_lines(enabled, autonomous);
        if mode == self.candidate {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.candidate = mode;
            self.streak = 1;
        }
        (self.streak >= DEBOUNCE_SAMPLES).then_some(mode)
    }
}

impl Default for FieldDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lines_decode_to_modes() {
        assert_eq!(
            CompetitionMode::from_field_lines(false, true),
            CompetitionMode::Disabled
        );
        assert_eq!(
            CompetitionMode::from_field_lines(true, true),
            CompetitionMode::Autonomous
        );
        assert_eq!(
            CompetitionMode::from_field_lines(true, false),
            CompetitionMode::Operator
        );
    }

    #[test]
    fn glitches_shorter_than_the_window_are_ignored() {
        let mut debouncer = FieldDebouncer::new();
        assert_eq!(debouncer.sample(true, true), None);
        assert_eq!(debouncer.sample(true, true), None);
        assert_eq!(debouncer.sample(false, true), None);
        assert_eq!(debouncer.sample(true, true), None);
        assert_eq!(debouncer.sample(true, true), None);
        assert_eq!(
            debouncer.sample(true, true),
            Some(CompetitionMode::Autonomous)
        );
        assert_eq!(
            debouncer.sample(true, true),
            Some(CompetitionMode::Autonomous)
        );
    }

    #[test]
    fn leaving_autonomous_cancels() {
        set_mode(CompetitionMode::Autonomous);
        assert!(!autonomous_cancelled());
        assert_eq!(
            set_mode(CompetitionMode::Operator),
            CompetitionMode::Autonomous
        );
        assert!(autonomous_cancelled());
        set_mode(CompetitionMode::Disabled);
    }
}
