//! Routine selection and the lifetime of the active run.
//!
//! [`AutonomousSession`] is what the firmware's autonomous task and the
//! emulator hold on to. It owns the routine registry and at most one
//! running [`Sequence`]; when that run terminates it is kept around for
//! inspection until the next `begin`.

use core::fmt;

use crate::io::{RobotIo, StatusDisplay};
use crate::routines::{
    ROUTINE_KIND_COUNT, RegistryError, RoutineKind, RoutineRegistry, register_default_routines,
};
use crate::sequence::{ConfigError, LoopState, Sequence};

/// Reasons a run could not be started.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StartError {
    /// Another routine is still running.
    Busy(RoutineKind),
    /// No template is registered for the requested routine.
    MissingRoutine(RoutineKind),
    /// The registered template failed validation.
    Config(ConfigError),
}

impl From<ConfigError> for StartError {
    fn from(value: ConfigError) -> Self {
        StartError::Config(value)
    }
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::Busy(kind) => write!(f, "routine {kind} is already running"),
            StartError::MissingRoutine(kind) => write!(f, "routine {kind} is not registered"),
            StartError::Config(err) => write!(f, "{err}"),
        }
    }
}

/// Owner of the routine registry and the current run.
#[derive(Debug)]
pub struct AutonomousSession<const CAPACITY: usize = ROUTINE_KIND_COUNT> {
    routines: RoutineRegistry<CAPACITY>,
    active: Option<Sequence>,
    finished: Option<Sequence>,
}

impl<const CAPACITY: usize> AutonomousSession<CAPACITY> {
    /// Creates a session with an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            routines: RoutineRegistry::new(),
            active: None,
            finished: None,
        }
    }

    /// Creates a session with every built-in routine registered.
    pub fn with_default_routines() -> Result<Self, RegistryError> {
        let mut session = Self::new();
        register_default_routines(&mut session.routines)?;
        Ok(session)
    }

    #[must_use]
    pub fn routines(&self) -> &RoutineRegistry<CAPACITY> {
        &self.routines
    }

    pub fn routines_mut(&mut self) -> &mut RoutineRegistry<CAPACITY> {
        &mut self.routines
    }

    /// Builds a fresh sequence for `kind` and makes it the active run.
    pub fn begin(&mut self, kind: RoutineKind) -> Result<(), StartError> {
        if let Some(active) = &self.active {
            return Err(StartError::Busy(active.kind()));
        }
        let template = self
            .routines
            .get(kind)
            .ok_or(StartError::MissingRoutine(kind))?;
        let sequence = Sequence::new(template)?;

        self.finished = None;
        self.active = Some(sequence);
        Ok(())
    }

    /// Ticks the active run. Returns `None` when nothing is running.
    pub fn tick<IO, D>(&mut self, io: &mut IO, display: &mut D) -> Option<LoopState>
    where
        IO: RobotIo + ?Sized,
        D: StatusDisplay + ?Sized,
    {
        let state = self.active.as_mut()?.tick(io, display);
        if state == LoopState::Terminated {
            self.finished = self.active.take();
        }
        Some(state)
    }

    /// Stops the active run. Returns `false` when nothing was running.
    pub fn abort<IO>(&mut self, io: &mut IO) -> bool
    where
        IO: RobotIo + ?Sized,
    {
        match self.active.take() {
            Some(mut sequence) => {
                sequence.abort(io);
                self.finished = Some(sequence);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// The running sequence, if any.
    #[must_use]
    pub fn active(&self) -> Option<&Sequence> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut Sequence> {
        self.active.as_mut()
    }

    /// The most recently terminated run, kept until the next `begin`.
    #[must_use]
    pub fn finished(&self) -> Option<&Sequence> {
        self.finished.as_ref()
    }

    /// Active run if there is one, otherwise the last finished run.
    #[must_use]
    pub fn latest(&self) -> Option<&Sequence> {
        self.active.as_ref().or(self.finished.as_ref())
    }
}

impl<const CAPACITY: usize> Default for AutonomousSession<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;
    use crate::devices::{ActuatorId, SensorId};
    use crate::io::{NoopDisplay, SensorUnavailable};

    #[derive(Default)]
    struct IdleIo {
        now: Duration,
        cancel: bool,
    }

    impl RobotIo for IdleIo {
        fn read_sensor(&mut self, _: SensorId) -> Result<i32, SensorUnavailable> {
            Ok(1_000)
        }

        fn write_actuator(&mut self, _: ActuatorId, _: i16) {}

        fn reset_sensor(&mut self, _: SensorId) {}

        fn elapsed_time(&self) -> Duration {
            self.now
        }

        fn cancel_requested(&self) -> bool {
            self.cancel
        }
    }

    #[test]
    fn rejects_second_begin_while_running() {
        let mut session = AutonomousSession::<3>::with_default_routines().expect("defaults");
        session.begin(RoutineKind::BlinkDemo).expect("first run");
        assert_eq!(
            session.begin(RoutineKind::ScoreCube),
            Err(StartError::Busy(RoutineKind::BlinkDemo))
        );
    }

    #[test]
    fn missing_routine_is_reported() {
        let mut session = AutonomousSession::<3>::new();
        assert_eq!(
            session.begin(RoutineKind::SonarApproach),
            Err(StartError::MissingRoutine(RoutineKind::SonarApproach))
        );
        let mut io = IdleIo::default();
        assert_eq!(session.tick(&mut io, &mut NoopDisplay::new()), None);
    }

    #[test]
    fn terminated_run_is_retained_until_next_begin() {
        let mut session = AutonomousSession::<3>::with_default_routines().expect("defaults");
        let mut io = IdleIo::default();
        session.begin(RoutineKind::SonarApproach).expect("start");
        assert_eq!(
            session.tick(&mut io, &mut NoopDisplay::new()),
            Some(LoopState::Running)
        );

        io.cancel = true;
        assert_eq!(
            session.tick(&mut io, &mut NoopDisplay::new()),
            Some(LoopState::Terminated)
        );
        assert!(!session.is_running());
        let finished = session.finished().expect("kept for inspection");
        assert_eq!(finished.kind(), RoutineKind::SonarApproach);
        assert_eq!(finished.ticks(), 2);

        session.begin(RoutineKind::SonarApproach).expect("fresh run");
        let active = session.active().expect("running");
        assert_eq!(active.ticks(), 0);
        assert!(session.finished().is_none());
    }

    #[test]
    fn abort_stops_active_run() {
        let mut session = AutonomousSession::<3>::with_default_routines().expect("defaults");
        let mut io = IdleIo::default();
        assert!(!session.abort(&mut io));

        session.begin(RoutineKind::ScoreCube).expect("start");
        session.tick(&mut io, &mut NoopDisplay::new());
        assert!(session.abort(&mut io));
        assert_eq!(
            session.finished().map(Sequence::state),
            Some(LoopState::Terminated)
        );
    }
}
