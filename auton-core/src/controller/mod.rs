//! Memoryless proportional target controllers.
//!
//! Every controller here is a pure function of `(current, target)` plus its
//! configuration. There is no integral or derivative state and no retry
//! logic: an action whose controller never reaches tolerance simply keeps
//! running until its timeout (if any) or until the sequence is cancelled.

use crate::devices::clamp_motor;

/// Output of a single controller evaluation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Seek {
    /// `target - current` as seen by [`seek`].
    pub error: i32,
    /// Motor command, already clamped to the motor range.
    pub command: i16,
    /// `|error| < tolerance`.
    pub arrived: bool,
}

/// Proportional-gain seek.
///
/// `error = target - current`, `command = -gain * error` and the action has
/// arrived once `|error|` is strictly below `tolerance`. Gains are signed;
/// axes whose positive command increases the reading use negative gains.
#[must_use]
pub fn seek(current: i32, target: i32, gain: i32, tolerance: i32) -> Seek {
    let error = target.saturating_sub(current);
    let command = clamp_motor(gain.saturating_neg().saturating_mul(error));
    Seek {
        error,
        command,
        arrived: error.saturating_abs() < tolerance,
    }
}

/// Control law applied by a [`SeekController`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SeekLaw {
    /// [`seek`] with the given signed gain.
    Proportional { gain: i32 },
    /// Raw difference form: the command is the negated `current - target`,
    /// with no gain multiplier. Used by the distance and turn controllers.
    Unit,
}

impl SeekLaw {
    /// Signed gain fed to [`seek`] for this law.
    #[must_use]
    pub const fn gain(self) -> i32 {
        match self {
            SeekLaw::Proportional { gain } => gain,
            SeekLaw::Unit => -1,
        }
    }
}

/// Per-axis controller configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SeekController {
    pub law: SeekLaw,
    pub tolerance: i32,
}

impl SeekController {
    pub const fn new(law: SeekLaw, tolerance: i32) -> Self {
        Self { law, tolerance }
    }

    /// Proportional controller with the given gain and tolerance.
    pub const fn proportional(gain: i32, tolerance: i32) -> Self {
        Self::new(SeekLaw::Proportional { gain }, tolerance)
    }

    /// Unit-gain controller with the given tolerance.
    pub const fn unit(tolerance: i32) -> Self {
        Self::new(SeekLaw::Unit, tolerance)
    }

    /// Evaluates the controller once.
    #[must_use]
    pub fn step(&self, current: i32, target: i32) -> Seek {
        seek(current, target, self.law.gain(), self.tolerance)
    }
}

/// Turns in place until the differential between two channels reaches `target`.
///
/// `current` is `left - right`, so positive targets rotate toward the left
/// encoder leading.
#[must_use]
pub fn turn_to_target(left: i32, right: i32, target: i32, controller: &SeekController) -> Seek {
    controller.step(left.saturating_sub(right), target)
}

/// Coupled output of [`drive_to_target`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DriveSeek {
    /// Forward motion command from the averaged distance.
    pub forward: i16,
    /// Heading correction from the left/right differential.
    pub heading: i16,
    pub error: i32,
    pub arrived: bool,
}

/// Drives straight until the averaged encoder distance reaches `target`.
///
/// The differential between the channels is fed back to the turn axis in the
/// same call so the chassis holds its heading while driving.
#[must_use]
pub fn drive_to_target(
    left: i32,
    right: i32,
    target: i32,
    controller: &SeekController,
) -> DriveSeek {
    let average = midpoint(left, right);
    let diff = left.saturating_sub(right);
    let forward = controller.step(average, target);
    DriveSeek {
        forward: forward.command,
        heading: clamp_motor(diff.saturating_neg()),
        error: forward.error,
        arrived: forward.arrived,
    }
}

/// Open-loop approach: drive at `power` until `reading <= limit`.
#[must_use]
pub fn drive_until_below(reading: i32, limit: i32, power: i16) -> Seek {
    let arrived = reading <= limit;
    Seek {
        error: limit.saturating_sub(reading),
        command: if arrived { 0 } else { power },
        arrived,
    }
}

fn midpoint(left: i32, right: i32) -> i32 {
    let sum = i64::from(left) + i64::from(right);
    // Mean of two i32 values always fits in i32.
    #[allow(clippy::cast_possible_truncation)]
    let average = (sum / 2) as i32;
    average
}
