//! Action table: long-lived behaviors stepped once per tick.
//!
//! An action is either *monitored* (a target controller call that
//! deactivates itself on arrival) or *fire-and-forget* (a fixed set of
//! command writes applied once). Slots are evaluated in increasing index
//! order and write straight into the shared [`ActuatorCommandSet`], so a
//! later slot overwrites an earlier slot's command for the same actuator.

use core::fmt;
use core::time::Duration;

use heapless::Vec;

use crate::controller::{SeekController, drive_to_target, drive_until_below, turn_to_target};
use crate::devices::{ActuatorCommandSet, ActuatorId, SensorId};
use crate::io::{RobotIo, SensorSnapshot, SensorUnavailable};
use crate::sequence::{ConfigError, ConfigFault, ConfigLocation};

/// Largest action table a routine may declare.
pub const MAX_ACTIONS: usize = 16;

/// Index handle into an [`ActionTable`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct ActionId(pub u8);

impl ActionId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// Where a monitored action gets its target from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TargetSource {
    /// Target baked into the routine table.
    Fixed(i32),
    /// Target supplied by the timer effect that activates the slot.
    Runtime { default: i32 },
}

impl TargetSource {
    /// Value the slot starts with before any timer supplies one.
    #[must_use]
    pub const fn initial(self) -> i32 {
        match self {
            TargetSource::Fixed(value) | TargetSource::Runtime { default: value } => value,
        }
    }

    #[must_use]
    pub const fn accepts_runtime(self) -> bool {
        matches!(self, TargetSource::Runtime { .. })
    }
}

/// Closed-loop behaviors that deactivate themselves on arrival.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MonitoredAction {
    /// Single sensor, single actuator (arm, lift, claw position).
    Seek {
        sensor: SensorId,
        actuator: ActuatorId,
        target: TargetSource,
        controller: SeekController,
    },
    /// Rotate until `left - right` reaches the target differential.
    TurnToTarget {
        left: SensorId,
        right: SensorId,
        actuator: ActuatorId,
        target: TargetSource,
        controller: SeekController,
    },
    /// Drive the averaged distance to target while holding heading.
    DriveToTarget {
        left: SensorId,
        right: SensorId,
        forward: ActuatorId,
        heading: ActuatorId,
        target: TargetSource,
        controller: SeekController,
    },
    /// Drive at fixed power until a range reading drops to `limit`.
    DriveUntilBelow {
        sensor: SensorId,
        actuator: ActuatorId,
        limit: i32,
        power: i16,
    },
}

impl MonitoredAction {
    /// Target configuration, if the behavior uses one.
    #[must_use]
    pub const fn target(&self) -> Option<TargetSource> {
        match self {
            MonitoredAction::Seek { target, .. }
            | MonitoredAction::TurnToTarget { target, .. }
            | MonitoredAction::DriveToTarget { target, .. } => Some(*target),
            MonitoredAction::DriveUntilBelow { .. } => None,
        }
    }

    /// Tolerance of the embedded controller, if any.
    #[must_use]
    pub const fn tolerance(&self) -> Option<i32> {
        match self {
            MonitoredAction::Seek { controller, .. }
            | MonitoredAction::TurnToTarget { controller, .. }
            | MonitoredAction::DriveToTarget { controller, .. } => Some(controller.tolerance),
            MonitoredAction::DriveUntilBelow { .. } => None,
        }
    }

    /// Stops every actuator this behavior drives.
    fn zero_outputs(&self, commands: &mut ActuatorCommandSet) {
        match *self {
            MonitoredAction::Seek { actuator, .. }
            | MonitoredAction::TurnToTarget { actuator, .. }
            | MonitoredAction::DriveUntilBelow { actuator, .. } => commands.zero(actuator),
            MonitoredAction::DriveToTarget {
                forward, heading, ..
            } => {
                commands.zero(forward);
                commands.zero(heading);
            }
        }
    }

    /// Evaluates the controller once; `Ok(true)` when the target is reached.
    fn evaluate<IO>(
        &self,
        target: i32,
        sensors: &mut SensorSnapshot,
        io: &mut IO,
        commands: &mut ActuatorCommandSet,
    ) -> Result<bool, SensorUnavailable>
    where
        IO: RobotIo + ?Sized,
    {
        match *self {
            MonitoredAction::Seek {
                sensor,
                actuator,
                controller,
                ..
            } => {
                let current = sensors.read(io, sensor)?;
                let result = controller.step(current, target);
                commands.set(actuator, result.command.into());
                Ok(result.arrived)
            }
            MonitoredAction::TurnToTarget {
                left,
                right,
                actuator,
                controller,
                ..
            } => {
                let left = sensors.read(io, left)?;
                let right = sensors.read(io, right)?;
                let result = turn_to_target(left, right, target, &controller);
                commands.set(actuator, result.command.into());
                Ok(result.arrived)
            }
            MonitoredAction::DriveToTarget {
                left,
                right,
                forward,
                heading,
                controller,
                ..
            } => {
                let left = sensors.read(io, left)?;
                let right = sensors.read(io, right)?;
                let result = drive_to_target(left, right, target, &controller);
                commands.set(forward, result.forward.into());
                commands.set(heading, result.heading.into());
                Ok(result.arrived)
            }
            MonitoredAction::DriveUntilBelow {
                sensor,
                actuator,
                limit,
                power,
            } => {
                let reading = sensors.read(io, sensor)?;
                let result = drive_until_below(reading, limit, power);
                commands.set(actuator, result.command.into());
                Ok(result.arrived)
            }
        }
    }
}

/// Unconditional command write applied by a fire-and-forget action.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    Set { actuator: ActuatorId, value: i16 },
    Toggle(ActuatorId),
    Zero(ActuatorId),
}

impl Effect {
    fn apply(self, commands: &mut ActuatorCommandSet) {
        match self {
            Effect::Set { actuator, value } => commands.set(actuator, value.into()),
            Effect::Toggle(actuator) => commands.toggle(actuator),
            Effect::Zero(actuator) => commands.zero(actuator),
        }
    }
}

/// Behavior bound to an action slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActionBehavior {
    Monitored(MonitoredAction),
    FireAndForget(&'static [Effect]),
}

/// Declarative description of one action slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ActionSpec {
    pub name: &'static str,
    pub behavior: ActionBehavior,
    /// Force-deactivates a monitored action that has not arrived in time.
    pub timeout: Option<Duration>,
    /// Slot is already running when the sequence starts.
    pub active: bool,
}

impl ActionSpec {
    pub const fn monitored(name: &'static str, action: MonitoredAction) -> Self {
        Self {
            name,
            behavior: ActionBehavior::Monitored(action),
            timeout: None,
            active: false,
        }
    }

    pub const fn fire_and_forget(name: &'static str, effects: &'static [Effect]) -> Self {
        Self {
            name,
            behavior: ActionBehavior::FireAndForget(effects),
            timeout: None,
            active: false,
        }
    }

    /// Same slot, but running from the first tick. Its timeout counts from
    /// zero.
    #[must_use]
    pub const fn active(mut self) -> Self {
        self.active = true;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Target configuration for monitored actions.
    #[must_use]
    pub const fn target(&self) -> Option<TargetSource> {
        match &self.behavior {
            ActionBehavior::Monitored(action) => action.target(),
            ActionBehavior::FireAndForget(_) => None,
        }
    }

    fn validate(&self, id: ActionId) -> Result<(), ConfigError> {
        let location = ConfigLocation::Action(id);
        if let ActionBehavior::Monitored(action) = &self.behavior
            && let Some(tolerance) = action.tolerance()
            && tolerance <= 0
        {
            return Err(ConfigError::invalid(
                location,
                ConfigFault::NonPositiveTolerance,
            ));
        }
        if let Some(timeout) = self.timeout
            && timeout.is_zero()
        {
            return Err(ConfigError::invalid(location, ConfigFault::ZeroDuration));
        }
        Ok(())
    }
}

/// Result of stepping one active slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActionOutcome {
    /// Controller ran but has not reached tolerance.
    Running,
    /// Controller reached tolerance; the slot deactivated this tick.
    Arrived,
    /// Fire-and-forget effects were applied; the slot deactivated.
    Fired,
    /// Timeout elapsed before arrival; the slot was force-deactivated.
    TimedOut,
    /// A required sensor could not be read; commands were left untouched.
    SensorUnavailable(SensorId),
}

impl ActionOutcome {
    /// Returns `true` when the slot went idle as a result of this step.
    #[must_use]
    pub const fn deactivated(self) -> bool {
        matches!(
            self,
            ActionOutcome::Arrived | ActionOutcome::Fired | ActionOutcome::TimedOut
        )
    }
}

/// Outcome of one slot during [`ActionTable::step_all`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ActionReport {
    pub action: ActionId,
    pub outcome: ActionOutcome,
}

/// Per-tick collection of [`ActionReport`]s, in table order.
pub type ActionReports = Vec<ActionReport, MAX_ACTIONS>;

#[derive(Copy, Clone, Debug)]
struct ActionSlot {
    spec: ActionSpec,
    active: bool,
    activated_at: Option<Duration>,
    target: i32,
}

impl ActionSlot {
    fn new(spec: ActionSpec) -> Self {
        Self {
            spec,
            active: spec.active,
            activated_at: spec.active.then_some(Duration::ZERO),
            target: spec.target().map_or(0, TargetSource::initial),
        }
    }

    fn timed_out(&self, now: Duration) -> bool {
        match (self.spec.timeout, self.activated_at) {
            (Some(timeout), Some(started)) => now.saturating_sub(started) >= timeout,
            _ => false,
        }
    }

    fn step<IO>(
        &mut self,
        now: Duration,
        sensors: &mut SensorSnapshot,
        io: &mut IO,
        commands: &mut ActuatorCommandSet,
    ) -> ActionOutcome
    where
        IO: RobotIo + ?Sized,
    {
        match self.spec.behavior {
            ActionBehavior::FireAndForget(effects) => {
                for effect in effects {
                    effect.apply(commands);
                }
                self.go_idle();
                ActionOutcome::Fired
            }
            ActionBehavior::Monitored(action) => {
                if self.timed_out(now) {
                    action.zero_outputs(commands);
                    self.go_idle();
                    return ActionOutcome::TimedOut;
                }

                match action.evaluate(self.target, sensors, io, commands) {
                    Ok(true) => {
                        action.zero_outputs(commands);
                        self.go_idle();
                        ActionOutcome::Arrived
                    }
                    Ok(false) => ActionOutcome::Running,
                    Err(err) => ActionOutcome::SensorUnavailable(err.sensor),
                }
            }
        }
    }

    fn go_idle(&mut self) {
        self.active = false;
        self.activated_at = None;
    }
}

/// Fixed-size table of action slots owned by a sequence.
#[derive(Clone, Debug)]
pub struct ActionTable {
    slots: Vec<ActionSlot, MAX_ACTIONS>,
}

impl ActionTable {
    /// Builds a table with each slot in its declared initial state.
    pub fn new(specs: &[ActionSpec]) -> Result<Self, ConfigError> {
        if specs.len() > MAX_ACTIONS {
            return Err(ConfigError::TooManyActions { count: specs.len() });
        }

        let mut slots = Vec::new();
        for (index, spec) in specs.iter().enumerate() {
            let id = ActionId(u8::try_from(index).map_err(|_| ConfigError::TooManyActions {
                count: specs.len(),
            })?);
            spec.validate(id)?;
            if slots.push(ActionSlot::new(*spec)).is_err() {
                return Err(ConfigError::TooManyActions { count: specs.len() });
            }
        }

        Ok(Self { slots })
    }

    /// Number of slots in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when the table has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns `true` when `id` names a slot in this table.
    #[must_use]
    pub fn contains(&self, id: ActionId) -> bool {
        id.index() < self.slots.len()
    }

    /// Returns the declarative spec for a slot.
    #[must_use]
    pub fn spec(&self, id: ActionId) -> Option<&ActionSpec> {
        self.slots.get(id.index()).map(|slot| &slot.spec)
    }

    /// Returns `true` when the slot is active.
    #[must_use]
    pub fn is_active(&self, id: ActionId) -> bool {
        self.slots.get(id.index()).is_some_and(|slot| slot.active)
    }

    /// Current target for a slot.
    #[must_use]
    pub fn target(&self, id: ActionId) -> Option<i32> {
        self.slots.get(id.index()).map(|slot| slot.target)
    }

    /// Marks a slot active. Returns `true` if the slot was idle.
    ///
    /// Activating an already-active slot changes nothing; in particular its
    /// timeout keeps counting from the original activation.
    pub fn activate(&mut self, id: ActionId, now: Duration) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(slot) if !slot.active => {
                slot.active = true;
                slot.activated_at = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Stores a runtime target and activates the slot.
    ///
    /// A slot that is already running picks up the new target on its next
    /// step without restarting its timeout.
    pub fn activate_with_target(&mut self, id: ActionId, target: i32, now: Duration) -> bool {
        if let Some(slot) = self.slots.get_mut(id.index())
            && slot.spec.target().is_some_and(TargetSource::accepts_runtime)
        {
            slot.target = target;
        }
        self.activate(id, now)
    }

    /// Marks a slot idle. Returns `true` if the slot was active.
    pub fn deactivate(&mut self, id: ActionId) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.active => {
                slot.go_idle();
                true
            }
            _ => false,
        }
    }

    /// Iterates over active slot identifiers in table order.
    pub fn active_ids(&self) -> impl Iterator<Item = ActionId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .filter_map(|(index, _)| u8::try_from(index).ok().map(ActionId))
    }

    /// Steps every active slot once, in increasing index order.
    pub fn step_all<IO>(
        &mut self,
        now: Duration,
        sensors: &mut SensorSnapshot,
        io: &mut IO,
        commands: &mut ActuatorCommandSet,
    ) -> ActionReports
    where
        IO: RobotIo + ?Sized,
    {
        let mut reports = ActionReports::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.active {
                continue;
            }
            let outcome = slot.step(now, sensors, io, commands);
            if let Ok(raw) = u8::try_from(index) {
                // Capacity matches MAX_ACTIONS, so the push cannot fail.
                let _ = reports.push(ActionReport {
                    action: ActionId(raw),
                    outcome,
                });
            }
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SeekController;

    struct FixedIo {
        values: [i32; crate::devices::SENSOR_COUNT],
        unavailable: Option<SensorId>,
        reads: usize,
    }

    impl FixedIo {
        fn new() -> Self {
            Self {
                values: [0; crate::devices::SENSOR_COUNT],
                unavailable: None,
                reads: 0,
            }
        }

        fn with(mut self, sensor: SensorId, value: i32) -> Self {
            self.values[sensor.as_index()] = value;
            self
        }
    }

    impl RobotIo for FixedIo {
        fn read_sensor(&mut self, sensor: SensorId) -> Result<i32, SensorUnavailable> {
            self.reads += 1;
            if self.unavailable == Some(sensor) {
                return Err(SensorUnavailable::new(sensor));
            }
            Ok(self.values[sensor.as_index()])
        }

        fn write_actuator(&mut self, _: ActuatorId, _: i16) {}

        fn reset_sensor(&mut self, sensor: SensorId) {
            self.values[sensor.as_index()] = 0;
        }

        fn elapsed_time(&self) -> Duration {
            Duration::ZERO
        }

        fn cancel_requested(&self) -> bool {
            false
        }
    }

    const ARM_UP: ActionSpec = ActionSpec::monitored(
        "arm up",
        MonitoredAction::Seek {
            sensor: SensorId::ArmPot,
            actuator: ActuatorId::Arm,
            target: TargetSource::Fixed(1670),
            controller: SeekController::proportional(-3, 10),
        },
    );

    const CLAW_OPEN: ActionSpec = ActionSpec::fire_and_forget(
        "claw open",
        &[Effect::Set {
            actuator: ActuatorId::Claw,
            value: 110,
        }],
    );

    const CLAW_CLOSE: ActionSpec = ActionSpec::fire_and_forget(
        "claw close",
        &[Effect::Set {
            actuator: ActuatorId::Claw,
            value: -110,
        }],
    );

    fn step(
        table: &mut ActionTable,
        io: &mut FixedIo,
        commands: &mut ActuatorCommandSet,
        now: Duration,
    ) -> ActionReports {
        let mut sensors = SensorSnapshot::new();
        table.step_all(now, &mut sensors, io, commands)
    }

    #[test]
    fn activation_is_idempotent() {
        let mut table = ActionTable::new(&[ARM_UP]).expect("table");
        assert!(table.activate(ActionId(0), Duration::ZERO));
        assert!(!table.activate(ActionId(0), Duration::from_millis(5)));
        assert!(table.deactivate(ActionId(0)));
        assert!(!table.deactivate(ActionId(0)));
        assert!(!table.activate(ActionId(7), Duration::ZERO));
    }

    #[test]
    fn monitored_action_runs_until_arrival() {
        let mut table = ActionTable::new(&[ARM_UP]).expect("table");
        let mut commands = ActuatorCommandSet::new();
        let mut io = FixedIo::new().with(SensorId::ArmPot, 1600);
        table.activate(ActionId(0), Duration::ZERO);

        let reports = step(&mut table, &mut io, &mut commands, Duration::ZERO);
        assert_eq!(reports[0].outcome, ActionOutcome::Running);
        assert_eq!(commands.get(ActuatorId::Arm), 127);
        assert!(table.is_active(ActionId(0)));

        io = io.with(SensorId::ArmPot, 1665);
        let reports = step(&mut table, &mut io, &mut commands, Duration::from_millis(1));
        assert_eq!(reports[0].outcome, ActionOutcome::Arrived);
        assert_eq!(commands.get(ActuatorId::Arm), 0);
        assert!(!table.is_active(ActionId(0)));

        let reports = step(&mut table, &mut io, &mut commands, Duration::from_millis(2));
        assert!(reports.is_empty());
    }

    #[test]
    fn later_slot_wins_shared_actuator() {
        let mut table = ActionTable::new(&[CLAW_OPEN, CLAW_CLOSE]).expect("table");
        let mut commands = ActuatorCommandSet::new();
        let mut io = FixedIo::new();
        table.activate(ActionId(1), Duration::ZERO);
        table.activate(ActionId(0), Duration::ZERO);

        let reports = step(&mut table, &mut io, &mut commands, Duration::ZERO);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].action, ActionId(0));
        assert_eq!(reports[1].action, ActionId(1));
        assert_eq!(commands.get(ActuatorId::Claw), -110);
    }

    #[test]
    fn sensor_failure_holds_last_command() {
        let mut table = ActionTable::new(&[ARM_UP]).expect("table");
        let mut commands = ActuatorCommandSet::new();
        let mut io = FixedIo::new().with(SensorId::ArmPot, 1650);
        table.activate(ActionId(0), Duration::ZERO);
        step(&mut table, &mut io, &mut commands, Duration::ZERO);
        assert_eq!(commands.get(ActuatorId::Arm), 60);

        io.unavailable = Some(SensorId::ArmPot);
        let reports = step(&mut table, &mut io, &mut commands, Duration::from_millis(1));
        assert_eq!(
            reports[0].outcome,
            ActionOutcome::SensorUnavailable(SensorId::ArmPot)
        );
        assert_eq!(commands.get(ActuatorId::Arm), 60);
        assert!(table.is_active(ActionId(0)));
    }

    #[test]
    fn timeout_force_deactivates() {
        let spec = ARM_UP.with_timeout(Duration::from_millis(100));
        let mut table = ActionTable::new(&[spec]).expect("table");
        let mut commands = ActuatorCommandSet::new();
        let mut io = FixedIo::new().with(SensorId::ArmPot, 0);
        table.activate(ActionId(0), Duration::from_millis(50));

        let reports = step(&mut table, &mut io, &mut commands, Duration::from_millis(149));
        assert_eq!(reports[0].outcome, ActionOutcome::Running);

        let reports = step(&mut table, &mut io, &mut commands, Duration::from_millis(150));
        assert_eq!(reports[0].outcome, ActionOutcome::TimedOut);
        assert_eq!(commands.get(ActuatorId::Arm), 0);
        assert!(!table.is_active(ActionId(0)));
    }

    #[test]
    fn initially_active_slot_runs_and_times_out_from_zero() {
        let spec = ARM_UP.active().with_timeout(Duration::from_millis(20));
        let mut table = ActionTable::new(&[spec, ARM_UP]).expect("table");
        let mut commands = ActuatorCommandSet::new();
        let mut io = FixedIo::new().with(SensorId::ArmPot, 0);
        assert!(table.is_active(ActionId(0)));
        assert!(!table.is_active(ActionId(1)));

        let reports = step(&mut table, &mut io, &mut commands, Duration::from_millis(19));
        assert_eq!(reports[0].outcome, ActionOutcome::Running);
        assert_eq!(commands.get(ActuatorId::Arm), 127);

        let reports = step(&mut table, &mut io, &mut commands, Duration::from_millis(20));
        assert_eq!(reports[0].outcome, ActionOutcome::TimedOut);
        assert_eq!(commands.get(ActuatorId::Arm), 0);
    }

    #[test]
    fn runtime_target_only_applies_to_runtime_slots() {
        let runtime = ActionSpec::monitored(
            "lift",
            MonitoredAction::Seek {
                sensor: SensorId::LiftPot,
                actuator: ActuatorId::Lift,
                target: TargetSource::Runtime { default: 400 },
                controller: SeekController::proportional(-2, 20),
            },
        );
        let mut table = ActionTable::new(&[ARM_UP, runtime]).expect("table");
        assert_eq!(table.target(ActionId(1)), Some(400));

        table.activate_with_target(ActionId(0), 10, Duration::ZERO);
        table.activate_with_target(ActionId(1), 900, Duration::ZERO);
        assert_eq!(table.target(ActionId(0)), Some(1670));
        assert_eq!(table.target(ActionId(1)), Some(900));
    }

    #[test]
    fn snapshot_reads_each_sensor_once_per_tick() {
        let drive = ActionSpec::monitored(
            "drive",
            MonitoredAction::DriveToTarget {
                left: SensorId::LeftEncoder,
                right: SensorId::RightEncoder,
                forward: ActuatorId::DriveForward,
                heading: ActuatorId::DriveTurn,
                target: TargetSource::Fixed(300),
                controller: SeekController::unit(10),
            },
        );
        let turn = ActionSpec::monitored(
            "turn",
            MonitoredAction::TurnToTarget {
                left: SensorId::LeftEncoder,
                right: SensorId::RightEncoder,
                actuator: ActuatorId::DriveTurn,
                target: TargetSource::Fixed(0),
                controller: SeekController::unit(10),
            },
        );
        let mut table = ActionTable::new(&[drive, turn]).expect("table");
        let mut commands = ActuatorCommandSet::new();
        let mut io = FixedIo::new()
            .with(SensorId::LeftEncoder, 10)
            .with(SensorId::RightEncoder, 10);
        table.activate(ActionId(0), Duration::ZERO);
        table.activate(ActionId(1), Duration::ZERO);

        step(&mut table, &mut io, &mut commands, Duration::ZERO);
        assert_eq!(io.reads, 2);
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let spec = ActionSpec::monitored(
            "broken",
            MonitoredAction::Seek {
                sensor: SensorId::ArmPot,
                actuator: ActuatorId::Arm,
                target: TargetSource::Fixed(0),
                controller: SeekController::proportional(-1, 0),
            },
        );
        let err = ActionTable::new(&[spec]).expect_err("zero tolerance must be rejected");
        assert_eq!(
            err,
            ConfigError::invalid(
                ConfigLocation::Action(ActionId(0)),
                ConfigFault::NonPositiveTolerance
            )
        );
    }
}
