//! Timer table: time-triggered, closed-set effects.
//!
//! Entries are polled once per tick in index order. An armed entry whose
//! trigger time has passed fires exactly once for that tick and runs its
//! effect list front to back. One-shot entries disarm themselves; periodic
//! entries push their trigger time forward with [`TimerEffect::Reschedule`].

use core::fmt;
use core::time::Duration;

use heapless::Vec;

use crate::actions::{ActionId, ActionTable};
use crate::devices::{ActuatorCommandSet, ActuatorId, SensorId, sensor_by_id};
use crate::io::RobotIo;
use crate::sequence::{ConfigError, ConfigFault, ConfigLocation};

/// Largest timer table a routine may declare.
pub const MAX_TIMERS: usize = 16;

/// Index handle into a [`TimerTable`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct TimerId(pub u8);

impl TimerId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Side effect performed when a timer fires.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimerEffect {
    Activate(ActionId),
    /// Stores a runtime target on the slot, then activates it.
    ActivateWithTarget { action: ActionId, target: i32 },
    Deactivate(ActionId),
    Arm(TimerId),
    Disarm(TimerId),
    DisarmSelf,
    /// Moves this entry's trigger time forward by `period` and leaves it armed.
    Reschedule { period: Duration },
    SetCommand { actuator: ActuatorId, value: i16 },
    ResetSensor(SensorId),
    Diagnostic(i32),
}

/// Declarative description of one timer entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimerSpec {
    pub trigger_time: Duration,
    pub armed: bool,
    pub effects: &'static [TimerEffect],
}

impl TimerSpec {
    /// Armed entry firing at `trigger_time`.
    pub const fn at(trigger_time: Duration, effects: &'static [TimerEffect]) -> Self {
        Self {
            trigger_time,
            armed: true,
            effects,
        }
    }

    /// Same entry, but starting disarmed.
    #[must_use]
    pub const fn disarmed(mut self) -> Self {
        self.armed = false;
        self
    }

    fn validate(&self, id: TimerId, timer_count: usize, actions: &ActionTable) -> Result<(), ConfigError> {
        let location = ConfigLocation::Timer(id);
        let fail = |fault| Err(ConfigError::invalid(location, fault));

        for effect in self.effects {
            match *effect {
                TimerEffect::Activate(action) | TimerEffect::Deactivate(action) => {
                    if !actions.contains(action) {
                        return fail(ConfigFault::UnknownAction(action));
                    }
                }
                TimerEffect::ActivateWithTarget { action, .. } => {
                    let Some(spec) = actions.spec(action) else {
                        return fail(ConfigFault::UnknownAction(action));
                    };
                    if !spec.target().is_some_and(crate::actions::TargetSource::accepts_runtime) {
                        return fail(ConfigFault::FixedTarget(action));
                    }
                }
                TimerEffect::Arm(timer) | TimerEffect::Disarm(timer) => {
                    if timer.index() >= timer_count {
                        return fail(ConfigFault::UnknownTimer(timer));
                    }
                }
                TimerEffect::Reschedule { period } => {
                    if period.is_zero() {
                        return fail(ConfigFault::ZeroDuration);
                    }
                }
                TimerEffect::ResetSensor(sensor) => {
                    if !sensor_by_id(sensor).is_resettable() {
                        return fail(ConfigFault::SensorNotResettable(sensor));
                    }
                }
                TimerEffect::DisarmSelf
                | TimerEffect::SetCommand { .. }
                | TimerEffect::Diagnostic(_) => {}
            }
        }
        Ok(())
    }
}

/// Notable things that happened while stepping the table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimerEvent {
    Fired(TimerId),
    /// An idle slot was switched on by a timer effect.
    Activated(ActionId),
    /// An active slot was switched off by a timer effect.
    Deactivated(ActionId),
    Diagnostic(i32),
}

/// Everything a firing timer is allowed to touch.
pub struct TimerContext<'a, IO: RobotIo + ?Sized> {
    pub now: Duration,
    pub actions: &'a mut ActionTable,
    pub commands: &'a mut ActuatorCommandSet,
    pub io: &'a mut IO,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct TimerEntry {
    trigger_time: Duration,
    armed: bool,
    effects: &'static [TimerEffect],
}

/// Fixed-size table of timer entries owned by a sequence.
#[derive(Clone, Debug)]
pub struct TimerTable {
    entries: Vec<TimerEntry, MAX_TIMERS>,
}

impl TimerTable {
    /// Builds the table, checking every index an effect refers to.
    pub fn new(specs: &[TimerSpec], actions: &ActionTable) -> Result<Self, ConfigError> {
        if specs.len() > MAX_TIMERS {
            return Err(ConfigError::TooManyTimers { count: specs.len() });
        }

        let mut entries = Vec::new();
        for (index, spec) in specs.iter().enumerate() {
            let id = TimerId(
                u8::try_from(index).map_err(|_| ConfigError::TooManyTimers { count: specs.len() })?,
            );
            spec.validate(id, specs.len(), actions)?;
            let entry = TimerEntry {
                trigger_time: spec.trigger_time,
                armed: spec.armed,
                effects: spec.effects,
            };
            if entries.push(entry).is_err() {
                return Err(ConfigError::TooManyTimers { count: specs.len() });
            }
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.entries.get(id.index()).is_some_and(|entry| entry.armed)
    }

    #[must_use]
    pub fn trigger_time(&self, id: TimerId) -> Option<Duration> {
        self.entries.get(id.index()).map(|entry| entry.trigger_time)
    }

    /// Re-arms an entry. Returns `true` if it was disarmed.
    pub fn arm(&mut self, id: TimerId) -> bool {
        match self.entries.get_mut(id.index()) {
            Some(entry) if !entry.armed => {
                entry.armed = true;
                true
            }
            _ => false,
        }
    }

    /// Disarms an entry. Returns `true` if it was armed.
    pub fn disarm(&mut self, id: TimerId) -> bool {
        match self.entries.get_mut(id.index()) {
            Some(entry) if entry.armed => {
                entry.armed = false;
                true
            }
            _ => false,
        }
    }

    /// Polls every entry once, in index order.
    ///
    /// `on_event` observes each firing and each state change it causes.
    pub fn step_all<IO, F>(&mut self, ctx: &mut TimerContext<'_, IO>, mut on_event: F)
    where
        IO: RobotIo + ?Sized,
        F: FnMut(TimerEvent),
    {
        for index in 0..self.entries.len() {
            let entry = self.entries[index];
            if !entry.armed || ctx.now < entry.trigger_time {
                continue;
            }
            let Ok(raw) = u8::try_from(index) else {
                continue;
            };
            let id = TimerId(raw);
            on_event(TimerEvent::Fired(id));
            for effect in entry.effects {
                self.apply(id, *effect, ctx, &mut on_event);
            }
        }
    }

    fn apply<IO, F>(
        &mut self,
        id: TimerId,
        effect: TimerEffect,
        ctx: &mut TimerContext<'_, IO>,
        on_event: &mut F,
    ) where
        IO: RobotIo + ?Sized,
        F: FnMut(TimerEvent),
    {
        match effect {
            TimerEffect::Activate(action) => {
                if ctx.actions.activate(action, ctx.now) {
                    on_event(TimerEvent::Activated(action));
                }
            }
            TimerEffect::ActivateWithTarget { action, target } => {
                if ctx.actions.activate_with_target(action, target, ctx.now) {
                    on_event(TimerEvent::Activated(action));
                }
            }
            TimerEffect::Deactivate(action) => {
                if ctx.actions.deactivate(action) {
                    on_event(TimerEvent::Deactivated(action));
                }
            }
            TimerEffect::Arm(timer) => {
                self.arm(timer);
            }
            TimerEffect::Disarm(timer) => {
                self.disarm(timer);
            }
            TimerEffect::DisarmSelf => {
                self.disarm(id);
            }
            TimerEffect::Reschedule { period } => {
                if let Some(entry) = self.entries.get_mut(id.index()) {
                    entry.trigger_time = entry.trigger_time.saturating_add(period);
                }
            }
            TimerEffect::SetCommand { actuator, value } => {
                ctx.commands.set(actuator, value.into());
            }
            TimerEffect::ResetSensor(sensor) => ctx.io.reset_sensor(sensor),
            TimerEffect::Diagnostic(value) => on_event(TimerEvent::Diagnostic(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionSpec, Effect};
    use crate::io::SensorUnavailable;

    struct NullIo {
        resets: usize,
    }

    impl RobotIo for NullIo {
        fn read_sensor(&mut self, _: SensorId) -> Result<i32, SensorUnavailable> {
            Ok(0)
        }

        fn write_actuator(&mut self, _: ActuatorId, _: i16) {}

        fn reset_sensor(&mut self, _: SensorId) {
            self.resets += 1;
        }

        fn elapsed_time(&self) -> Duration {
            Duration::ZERO
        }

        fn cancel_requested(&self) -> bool {
            false
        }
    }

    const LED: ActionSpec =
        ActionSpec::fire_and_forget("led", &[Effect::Toggle(ActuatorId::Led)]);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn run(
        timers: &mut TimerTable,
        actions: &mut ActionTable,
        now: Duration,
    ) -> heapless::Vec<TimerEvent, 32> {
        let mut io = NullIo { resets: 0 };
        let mut commands = ActuatorCommandSet::new();
        let mut ctx = TimerContext {
            now,
            actions,
            commands: &mut commands,
            io: &mut io,
        };
        let mut events = heapless::Vec::new();
        timers.step_all(&mut ctx, |event| {
            let _ = events.push(event);
        });
        events
    }

    #[test]
    fn late_poll_fires_once() {
        static EFFECTS: [TimerEffect; 2] =
            [TimerEffect::Activate(ActionId(0)), TimerEffect::DisarmSelf];
        let mut actions = ActionTable::new(&[LED]).expect("actions");
        let mut timers =
            TimerTable::new(&[TimerSpec::at(ms(10), &EFFECTS)], &actions).expect("timers");

        assert!(run(&mut timers, &mut actions, ms(9)).is_empty());

        let events = run(&mut timers, &mut actions, ms(45));
        assert_eq!(
            events.as_slice(),
            &[
                TimerEvent::Fired(TimerId(0)),
                TimerEvent::Activated(ActionId(0))
            ]
        );
        assert!(!timers.is_armed(TimerId(0)));
        assert!(run(&mut timers, &mut actions, ms(1_000)).is_empty());
    }

    #[test]
    fn reschedule_keeps_entry_periodic() {
        static EFFECTS: [TimerEffect; 1] = [TimerEffect::Reschedule { period: Duration::from_millis(500) }];
        let mut actions = ActionTable::new(&[]).expect("actions");
        let mut timers =
            TimerTable::new(&[TimerSpec::at(ms(250), &EFFECTS)], &actions).expect("timers");

        run(&mut timers, &mut actions, ms(250));
        assert_eq!(timers.trigger_time(TimerId(0)), Some(ms(750)));
        assert!(run(&mut timers, &mut actions, ms(600)).is_empty());
        run(&mut timers, &mut actions, ms(750));
        assert_eq!(timers.trigger_time(TimerId(0)), Some(ms(1_250)));
    }

    #[test]
    fn arming_follows_table_order() {
        static FIRST: [TimerEffect; 2] = [TimerEffect::Arm(TimerId(1)), TimerEffect::DisarmSelf];
        static SECOND: [TimerEffect; 2] = [TimerEffect::Diagnostic(2), TimerEffect::DisarmSelf];
        static THIRD: [TimerEffect; 2] = [TimerEffect::Arm(TimerId(0)), TimerEffect::DisarmSelf];
        let mut actions = ActionTable::new(&[]).expect("actions");
        let specs = [
            TimerSpec::at(ms(0), &FIRST).disarmed(),
            TimerSpec::at(ms(0), &SECOND).disarmed(),
            TimerSpec::at(ms(0), &THIRD),
        ];
        let mut timers = TimerTable::new(&specs, &actions).expect("timers");

        // Entry 2 arms entry 0, which was already passed over this tick.
        let events = run(&mut timers, &mut actions, ms(0));
        assert_eq!(events.as_slice(), &[TimerEvent::Fired(TimerId(2))]);

        // Entry 0 arms entry 1, which fires later in the same tick.
        let events = run(&mut timers, &mut actions, ms(1));
        assert_eq!(
            events.as_slice(),
            &[
                TimerEvent::Fired(TimerId(0)),
                TimerEvent::Fired(TimerId(1)),
                TimerEvent::Diagnostic(2)
            ]
        );
    }

    #[test]
    fn disarm_is_permanent_until_rearmed() {
        static EFFECTS: [TimerEffect; 1] = [TimerEffect::Diagnostic(7)];
        let mut actions = ActionTable::new(&[]).expect("actions");
        let mut timers =
            TimerTable::new(&[TimerSpec::at(ms(0), &EFFECTS)], &actions).expect("timers");

        assert!(timers.disarm(TimerId(0)));
        for step in 0..50 {
            assert!(run(&mut timers, &mut actions, ms(step * 100)).is_empty());
        }
        assert!(timers.arm(TimerId(0)));
        assert_eq!(run(&mut timers, &mut actions, ms(5_000)).len(), 2);
    }

    #[test]
    fn rejects_unknown_action() {
        static EFFECTS: [TimerEffect; 1] = [TimerEffect::Activate(ActionId(3))];
        let actions = ActionTable::new(&[LED]).expect("actions");
        let err = TimerTable::new(&[TimerSpec::at(ms(0), &EFFECTS)], &actions)
            .expect_err("out of range action");
        assert_eq!(
            err,
            ConfigError::invalid(
                ConfigLocation::Timer(TimerId(0)),
                ConfigFault::UnknownAction(ActionId(3))
            )
        );
    }

    #[test]
    fn rejects_reset_of_absolute_sensor() {
        static EFFECTS: [TimerEffect; 1] = [TimerEffect::ResetSensor(SensorId::ArmPot)];
        let actions = ActionTable::new(&[]).expect("actions");
        let err = TimerTable::new(&[TimerSpec::at(ms(0), &EFFECTS)], &actions)
            .expect_err("potentiometers cannot be re-zeroed");
        assert!(matches!(
            err,
            ConfigError::InvalidConfiguration {
                fault: ConfigFault::SensorNotResettable(SensorId::ArmPot),
                ..
            }
        ));
    }
}
