//! A single autonomous run: timer table, action table, command set and the
//! tick function that drives them.
//!
//! The host calls [`Sequence::tick`] on its own schedule. Each tick reads the
//! clock, fires due timers, steps active actions, flushes every actuator
//! command, refreshes the status display and finally polls for
//! cancellation. Once [`LoopState::Terminated`] is returned the sequence is
//! spent; a new run needs a new `Sequence`.

use core::fmt::{self, Write as _};
use core::time::Duration;

use heapless::String;

use crate::actions::{ActionId, ActionOutcome, ActionTable, MAX_ACTIONS};
use crate::devices::{ActuatorCommandSet, SensorId};
use crate::io::{RobotIo, SensorSnapshot, StatusDisplay};
use crate::routines::{RoutineKind, RoutineTemplate};
use crate::telemetry::{
    TelemetryEventKind, TelemetryPayload, TelemetryRecorder, TerminationReason,
};
use crate::timers::{TimerContext, TimerEvent, TimerId, TimerTable};

/// Host sleep between ticks during autonomous mode.
pub const TICK_PERIOD: Duration = Duration::from_millis(1);

/// Widest `i32` rendered in decimal.
const DIAGNOSTIC_WIDTH: usize = 11;

/// Width of a rendered status line: room for `act `, one digit per action
/// slot and ` d=` followed by the widest diagnostic.
pub const STATUS_LINE_CAPACITY: usize = 4 + MAX_ACTIONS + 3 + DIAGNOSTIC_WIDTH;

/// Records retained by each sequence's telemetry ring.
pub const SEQUENCE_TELEMETRY_CAPACITY: usize = 64;

/// Where in a routine a configuration problem was found.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigLocation {
    Timer(TimerId),
    Action(ActionId),
}

impl fmt::Display for ConfigLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLocation::Timer(timer) => write!(f, "timer {timer}"),
            ConfigLocation::Action(action) => write!(f, "action {action}"),
        }
    }
}

/// Specific problem found while validating a routine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigFault {
    UnknownAction(ActionId),
    UnknownTimer(TimerId),
    /// A runtime target was supplied to a slot with a fixed target.
    FixedTarget(ActionId),
    SensorNotResettable(SensorId),
    /// Controller tolerance must be positive or the action can never arrive.
    NonPositiveTolerance,
    /// Timeouts and reschedule periods must be non-zero.
    ZeroDuration,
}

impl fmt::Display for ConfigFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFault::UnknownAction(action) => write!(f, "unknown action {action}"),
            ConfigFault::UnknownTimer(timer) => write!(f, "unknown timer {timer}"),
            ConfigFault::FixedTarget(action) => {
                write!(f, "action {action} does not accept a runtime target")
            }
            ConfigFault::SensorNotResettable(sensor) => {
                write!(f, "sensor {sensor} cannot be reset")
            }
            ConfigFault::NonPositiveTolerance => f.write_str("tolerance must be positive"),
            ConfigFault::ZeroDuration => f.write_str("duration must be non-zero"),
        }
    }
}

/// Errors detected while building a [`Sequence`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    TooManyTimers { count: usize },
    TooManyActions { count: usize },
    InvalidConfiguration {
        location: ConfigLocation,
        fault: ConfigFault,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn invalid(location: ConfigLocation, fault: ConfigFault) -> Self {
        ConfigError::InvalidConfiguration { location, fault }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TooManyTimers { count } => write!(
                f,
                "{count} timers exceed the table capacity of {}",
                crate::timers::MAX_TIMERS
            ),
            ConfigError::TooManyActions { count } => write!(
                f,
                "{count} actions exceed the table capacity of {}",
                crate::actions::MAX_ACTIONS
            ),
            ConfigError::InvalidConfiguration { location, fault } => {
                write!(f, "invalid configuration at {location}: {fault}")
            }
        }
    }
}

/// Sequencer state reported after every tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// One autonomous run of a routine.
#[derive(Debug)]
pub struct Sequence {
    kind: RoutineKind,
    name: &'static str,
    elapsed: Duration,
    ticks: u32,
    state: LoopState,
    timers: TimerTable,
    actions: ActionTable,
    commands: ActuatorCommandSet,
    last_diagnostic: Option<i32>,
    telemetry: TelemetryRecorder<SEQUENCE_TELEMETRY_CAPACITY>,
}

impl Sequence {
    /// Validates the routine tables and builds a fresh run at `elapsed = 0`.
    pub fn new(template: &RoutineTemplate) -> Result<Self, ConfigError> {
        let actions = ActionTable::new(template.actions)?;
        let timers = TimerTable::new(template.timers, &actions)?;

        Ok(Self {
            kind: template.kind,
            name: template.name,
            elapsed: Duration::ZERO,
            ticks: 0,
            state: LoopState::Running,
            timers,
            actions,
            commands: ActuatorCommandSet::new(),
            last_diagnostic: None,
            telemetry: TelemetryRecorder::new(),
        })
    }

    /// Runs one iteration of the sequencer loop.
    pub fn tick<IO, D>(&mut self, io: &mut IO, display: &mut D) -> LoopState
    where
        IO: RobotIo + ?Sized,
        D: StatusDisplay + ?Sized,
    {
        if self.state == LoopState::Terminated {
            return LoopState::Terminated;
        }

        self.elapsed = self.elapsed.max(io.elapsed_time());
        self.ticks = self.ticks.saturating_add(1);
        let now = self.elapsed;

        {
            let telemetry = &mut self.telemetry;
            let last_diagnostic = &mut self.last_diagnostic;
            let mut ctx = TimerContext {
                now,
                actions: &mut self.actions,
                commands: &mut self.commands,
                io: &mut *io,
            };
            self.timers.step_all(&mut ctx, |event| match event {
                TimerEvent::Fired(timer) => {
                    telemetry.record(
                        TelemetryEventKind::TimerFired(timer),
                        TelemetryPayload::None,
                        now,
                    );
                }
                TimerEvent::Activated(action) => {
                    telemetry.record(
                        TelemetryEventKind::ActionActivated(action),
                        TelemetryPayload::None,
                        now,
                    );
                }
                TimerEvent::Deactivated(action) => {
                    telemetry.record(
                        TelemetryEventKind::ActionDeactivated(action),
                        TelemetryPayload::None,
                        now,
                    );
                }
                TimerEvent::Diagnostic(value) => {
                    *last_diagnostic = Some(value);
                    telemetry.record_diagnostic(value, now);
                }
            });
        }

        let mut sensors = SensorSnapshot::new();
        let reports = self
            .actions
            .step_all(now, &mut sensors, io, &mut self.commands);
        for report in &reports {
            match report.outcome {
                ActionOutcome::Arrived => {
                    self.telemetry.record(
                        TelemetryEventKind::ActionArrived(report.action),
                        TelemetryPayload::None,
                        now,
                    );
                }
                ActionOutcome::TimedOut => {
                    self.telemetry.record(
                        TelemetryEventKind::ActionTimedOut(report.action),
                        TelemetryPayload::None,
                        now,
                    );
                }
                ActionOutcome::SensorUnavailable(sensor) => {
                    self.telemetry
                        .record_sensor_unavailable(sensor, report.action, now);
                }
                ActionOutcome::Running | ActionOutcome::Fired => {}
            }
        }

        for (actuator, command) in self.commands.iter() {
            io.write_actuator(actuator, command);
        }

        self.render_status(display);

        if io.cancel_requested() {
            self.terminate(io, TerminationReason::Cancelled);
        }

        self.state
    }

    /// Ends the run immediately, stopping every output.
    ///
    /// Has no effect on a sequence that already terminated.
    pub fn abort<IO>(&mut self, io: &mut IO)
    where
        IO: RobotIo + ?Sized,
    {
        if self.state == LoopState::Running {
            self.terminate(io, TerminationReason::Aborted);
        }
    }

    fn terminate<IO>(&mut self, io: &mut IO, reason: TerminationReason)
    where
        IO: RobotIo + ?Sized,
    {
        self.state = LoopState::Terminated;
        self.commands.clear();
        io.stop_all();
        self.telemetry
            .record_termination(self.kind, reason, self.ticks, self.elapsed);
    }

    fn render_status<D>(&self, display: &mut D)
    where
        D: StatusDisplay + ?Sized,
    {
        let mut line: String<STATUS_LINE_CAPACITY> = String::new();
        // Overflow only truncates the line.
        let _ = write!(line, "{} t={}ms", self.name, self.elapsed.as_millis());
        display.set_status_line(0, &line);

        line.clear();
        let _ = line.push_str("act ");
        for index in 0..self.actions.len() {
            let active = u8::try_from(index)
                .is_ok_and(|raw| self.actions.is_active(ActionId(raw)));
            let _ = line.push(if active { '1' } else { '0' });
        }
        if let Some(value) = self.last_diagnostic {
            let _ = write!(line, " d={value}");
        }
        display.set_status_line(1, &line);
    }

    #[must_use]
    pub const fn kind(&self) -> RoutineKind {
        self.kind
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Clock value observed by the most recent tick.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of ticks executed so far.
    #[must_use]
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Commands flushed by the most recent tick.
    #[must_use]
    pub const fn commands(&self) -> &ActuatorCommandSet {
        &self.commands
    }

    #[must_use]
    pub fn action_active(&self, id: ActionId) -> bool {
        self.actions.is_active(id)
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn action_name(&self, id: ActionId) -> Option<&'static str> {
        self.actions.spec(id).map(|spec| spec.name)
    }

    #[must_use]
    pub fn target(&self, id: ActionId) -> Option<i32> {
        self.actions.target(id)
    }

    #[must_use]
    pub fn timer_armed(&self, id: TimerId) -> bool {
        self.timers.is_armed(id)
    }

    #[must_use]
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn trigger_time(&self, id: TimerId) -> Option<Duration> {
        self.timers.trigger_time(id)
    }

    /// Re-arms a timer from outside the table (REPL `arm`).
    pub fn arm_timer(&mut self, id: TimerId) -> bool {
        self.state == LoopState::Running && self.timers.arm(id)
    }

    /// Disarms a timer from outside the table (REPL `disarm`).
    pub fn disarm_timer(&mut self, id: TimerId) -> bool {
        self.state == LoopState::Running && self.timers.disarm(id)
    }

    #[must_use]
    pub const fn last_diagnostic(&self) -> Option<i32> {
        self.last_diagnostic
    }

    #[must_use]
    pub const fn telemetry(&self) -> &TelemetryRecorder<SEQUENCE_TELEMETRY_CAPACITY> {
        &self.telemetry
    }
}
