//! Status surface for the emulator REPL.
//!
//! The `status` command renders a [`StatusSnapshot`] through
//! [`StatusFormatter`], one line per concern.

use core::fmt;
use core::time::Duration;

use crate::actions::{ActionId, MAX_ACTIONS};
use crate::devices::ActuatorCommandSet;
use crate::orchestrator::AutonomousSession;
use crate::routines::RoutineKind;
use crate::sequence::{LoopState, Sequence};
use crate::timers::{MAX_TIMERS, TimerId};

/// Where the reported run is in its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Finished,
}

/// Compact copy of a run's observable state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub routine: Option<RoutineKind>,
    pub phase: RunPhase,
    pub elapsed: Duration,
    pub ticks: u32,
    /// Bit `n` set when action `n` is active.
    pub active_actions: u16,
    pub action_count: usize,
    /// Bit `n` set when timer `n` is armed.
    pub armed_timers: u16,
    pub timer_count: usize,
    pub commands: ActuatorCommandSet,
    pub last_diagnostic: Option<i32>,
}

const _: () = assert!(MAX_ACTIONS <= 16 && MAX_TIMERS <= 16);

impl StatusSnapshot {
    /// Snapshot used when no routine has run yet.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            routine: None,
            phase: RunPhase::Idle,
            elapsed: Duration::ZERO,
            ticks: 0,
            active_actions: 0,
            action_count: 0,
            armed_timers: 0,
            timer_count: 0,
            commands: ActuatorCommandSet::new(),
            last_diagnostic: None,
        }
    }

    #[must_use]
    pub fn from_sequence(sequence: &Sequence) -> Self {
        let mut active_actions = 0;
        for index in 0..sequence.action_count().min(MAX_ACTIONS) {
            if u8::try_from(index).is_ok_and(|raw| sequence.action_active(ActionId(raw))) {
                active_actions |= 1 << index;
            }
        }
        let mut armed_timers = 0;
        for index in 0..sequence.timer_count().min(MAX_TIMERS) {
            if u8::try_from(index).is_ok_and(|raw| sequence.timer_armed(TimerId(raw))) {
                armed_timers |= 1 << index;
            }
        }

        Self {
            routine: Some(sequence.kind()),
            phase: match sequence.state() {
                LoopState::Running => RunPhase::Running,
                LoopState::Terminated => RunPhase::Finished,
            },
            elapsed: sequence.elapsed(),
            ticks: sequence.ticks(),
            active_actions,
            action_count: sequence.action_count(),
            armed_timers,
            timer_count: sequence.timer_count(),
            commands: *sequence.commands(),
            last_diagnostic: sequence.last_diagnostic(),
        }
    }

    /// Snapshot of the session's active run, or its last finished one.
    #[must_use]
    pub fn from_session<const CAPACITY: usize>(session: &AutonomousSession<CAPACITY>) -> Self {
        session.latest().map_or(Self::idle(), Self::from_sequence)
    }
}

/// Helper that renders a [`StatusSnapshot`] into human-readable lines.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a StatusSnapshot,
}

impl<'a> StatusFormatter<'a> {
    #[must_use]
    pub const fn new(snapshot: &'a StatusSnapshot) -> Self {
        Self { snapshot }
    }

    /// Writes the run line (e.g. `run score state=running t=+1.2s ticks=1200 diag=1`).
    pub fn write_run_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let Some(routine) = self.snapshot.routine else {
            return writer.write_str("run none state=idle");
        };
        write!(writer, "run {} state=", routine.tag())?;
        writer.write_str(match self.snapshot.phase {
            RunPhase::Idle => "idle",
            RunPhase::Running => "running",
            RunPhase::Finished => "finished",
        })?;
        writer.write_str(" t=")?;
        write_duration(writer, self.snapshot.elapsed)?;
        write!(writer, " ticks={}", self.snapshot.ticks)?;
        if let Some(value) = self.snapshot.last_diagnostic {
            write!(writer, " diag={value}")?;
        }
        Ok(())
    }

    /// Writes the action line (e.g. `actions a0 a3 (2/7 active)`).
    pub fn write_actions_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("actions")?;
        let count = write_members(
            writer,
            'a',
            self.snapshot.active_actions,
            self.snapshot.action_count,
        )?;
        write!(writer, " ({count}/{} active)", self.snapshot.action_count)
    }

    /// Writes the timer line (e.g. `timers t2 (1/6 armed)`).
    pub fn write_timers_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("timers")?;
        let count = write_members(
            writer,
            't',
            self.snapshot.armed_timers,
            self.snapshot.timer_count,
        )?;
        write!(writer, " ({count}/{} armed)", self.snapshot.timer_count)
    }

    /// Writes every pending actuator command (e.g. `outputs strafe=0 forward=127 ...`).
    pub fn write_outputs_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("outputs")?;
        for (id, value) in self.snapshot.commands.iter() {
            write!(writer, " {}={value}", id.name())?;
        }
        Ok(())
    }
}

fn write_members<W: fmt::Write>(
    writer: &mut W,
    prefix: char,
    mask: u16,
    len: usize,
) -> Result<usize, fmt::Error> {
    let mut count = 0;
    for index in 0..len.min(16) {
        if mask & (1 << index) != 0 {
            write!(writer, " {prefix}{index}")?;
            count += 1;
        }
    }
    Ok(count)
}

fn write_duration<W: fmt::Write>(writer: &mut W, value: Duration) -> fmt::Result {
    if value >= Duration::from_secs(1) {
        let seconds = value.as_secs();
        let tenths = value.subsec_millis() / 100;
        write!(writer, "+{seconds}.{tenths}s")
    } else {
        write!(writer, "+{}ms", value.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use heapless::String;

    use super::*;
    use crate::devices::ActuatorId;

    fn render<F>(snapshot: &StatusSnapshot, line: F) -> String<128>
    where
        F: Fn(&StatusFormatter<'_>, &mut String<128>) -> fmt::Result,
    {
        let mut out = String::new();
        line(&StatusFormatter::new(snapshot), &mut out).expect("line fits");
        out
    }

    #[test]
    fn idle_snapshot_renders_placeholder() {
        let snapshot = StatusSnapshot::idle();
        assert_eq!(
            render(&snapshot, |f, out| f.write_run_line(out)).as_str(),
            "run none state=idle"
        );
        assert_eq!(
            render(&snapshot, |f, out| f.write_actions_line(out)).as_str(),
            "actions (0/0 active)"
        );
    }

    #[test]
    fn running_snapshot_lists_members() {
        let mut commands = ActuatorCommandSet::new();
        commands.set(ActuatorId::DriveForward, 127);
        commands.set(ActuatorId::Led, 1);
        let snapshot = StatusSnapshot {
            routine: Some(RoutineKind::ScoreCube),
            phase: RunPhase::Running,
            elapsed: Duration::from_millis(1_250),
            ticks: 1_251,
            active_actions: 0b1001,
            action_count: 7,
            armed_timers: 0b10,
            timer_count: 5,
            commands,
            last_diagnostic: Some(2),
        };

        assert_eq!(
            render(&snapshot, |f, out| f.write_run_line(out)).as_str(),
            "run score state=running t=+1.2s ticks=1251 diag=2"
        );
        assert_eq!(
            render(&snapshot, |f, out| f.write_actions_line(out)).as_str(),
            "actions a0 a3 (2/7 active)"
        );
        assert_eq!(
            render(&snapshot, |f, out| f.write_timers_line(out)).as_str(),
            "timers t1 (1/5 armed)"
        );
        assert_eq!(
            render(&snapshot, |f, out| f.write_outputs_line(out)).as_str(),
            "outputs strafe=0 forward=127 turn=0 lift=0 arm=0 claw=0 led=1"
        );
    }

    #[test]
    fn short_runs_report_milliseconds() {
        let snapshot = StatusSnapshot {
            routine: Some(RoutineKind::BlinkDemo),
            phase: RunPhase::Finished,
            elapsed: Duration::from_millis(40),
            ..StatusSnapshot::idle()
        };
        assert_eq!(
            render(&snapshot, |f, out| f.write_run_line(out)).as_str(),
            "run blink state=finished t=+40ms ticks=0"
        );
    }
}
