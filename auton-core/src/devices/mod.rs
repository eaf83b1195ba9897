//! Sensor and actuator catalog shared by firmware and host targets.
//!
//! Channels are identified by small closed enums so routine tables can name
//! them in `const` data and the command set can be stored as a flat array.
//! Wiring details (ports, orientation) live in [`crate::drive`]; the
//! sequencing engine only ever speaks in these logical channels.

use core::fmt;

/// Largest magnitude accepted by a motor output.
pub const MOTOR_LIMIT: i16 = 127;

/// Number of distinct [`SensorId`] variants.
pub const SENSOR_COUNT: usize = 6;

/// Number of distinct [`ActuatorId`] variants.
pub const ACTUATOR_COUNT: usize = 7;

/// Logical sensor channels read by the autonomous engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SensorId {
    LeftEncoder,
    RightEncoder,
    LiftPot,
    ArmPot,
    ClawPot,
    Sonar,
}

impl SensorId {
    /// Deterministic index for lookups into [`ALL_SENSORS`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            SensorId::LeftEncoder => 0,
            SensorId::RightEncoder => 1,
            SensorId::LiftPot => 2,
            SensorId::ArmPot => 3,
            SensorId::ClawPot => 4,
            SensorId::Sonar => 5,
        }
    }

    /// Attempts to construct a [`SensorId`] from a raw index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SensorId::LeftEncoder),
            1 => Some(SensorId::RightEncoder),
            2 => Some(SensorId::LiftPot),
            3 => Some(SensorId::ArmPot),
            4 => Some(SensorId::ClawPot),
            5 => Some(SensorId::Sonar),
            _ => None,
        }
    }

    /// Short name used by the REPL and status output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        sensor_by_id(self).name
    }

    /// Case-insensitive lookup by catalog name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_SENSORS
            .iter()
            .find(|sensor| sensor.name.eq_ignore_ascii_case(name))
            .map(|sensor| sensor.id)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a sensor channel measures.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SensorKind {
    /// Cumulative quadrature count; can be re-zeroed.
    Encoder,
    /// Absolute potentiometer level (0..4095).
    Potentiometer,
    /// Ultrasonic range in centimetres.
    Range,
}

/// Metadata describing a sensor channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SensorChannel {
    pub id: SensorId,
    pub name: &'static str,
    pub kind: SensorKind,
}

impl SensorChannel {
    pub const fn new(id: SensorId, name: &'static str, kind: SensorKind) -> Self {
        Self { id, name, kind }
    }

    /// Returns `true` when the channel accumulates and supports re-zeroing.
    #[must_use]
    pub const fn is_resettable(&self) -> bool {
        matches!(self.kind, SensorKind::Encoder)
    }
}

/// Compile-time catalog of every sensor channel.
pub const ALL_SENSORS: [SensorChannel; SENSOR_COUNT] = [
    SensorChannel::new(SensorId::LeftEncoder, "left", SensorKind::Encoder),
    SensorChannel::new(SensorId::RightEncoder, "right", SensorKind::Encoder),
    SensorChannel::new(SensorId::LiftPot, "lift", SensorKind::Potentiometer),
    SensorChannel::new(SensorId::ArmPot, "arm", SensorKind::Potentiometer),
    SensorChannel::new(SensorId::ClawPot, "claw", SensorKind::Potentiometer),
    SensorChannel::new(SensorId::Sonar, "sonar", SensorKind::Range),
];

/// Retrieve sensor metadata by identifier.
#[must_use]
pub const fn sensor_by_id(id: SensorId) -> SensorChannel {
    ALL_SENSORS[id.as_index()]
}

/// Logical actuator channels written by the autonomous engine.
///
/// The three drive axes are chassis intents, not wheels; the actuator
/// interface mixes them into per-port motor power.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActuatorId {
    DriveStrafe,
    DriveForward,
    DriveTurn,
    Lift,
    Arm,
    Claw,
    Led,
}

impl ActuatorId {
    /// Deterministic index for lookups into [`ALL_ACTUATORS`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            ActuatorId::DriveStrafe => 0,
            ActuatorId::DriveForward => 1,
            ActuatorId::DriveTurn => 2,
            ActuatorId::Lift => 3,
            ActuatorId::Arm => 4,
            ActuatorId::Claw => 5,
            ActuatorId::Led => 6,
        }
    }

    /// Attempts to construct an [`ActuatorId`] from a raw index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ActuatorId::DriveStrafe),
            1 => Some(ActuatorId::DriveForward),
            2 => Some(ActuatorId::DriveTurn),
            3 => Some(ActuatorId::Lift),
            4 => Some(ActuatorId::Arm),
            5 => Some(ActuatorId::Claw),
            6 => Some(ActuatorId::Led),
            _ => None,
        }
    }

    /// Short name used by the REPL and status output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        actuator_by_id(self).name
    }

    /// Returns how commands for this channel are interpreted.
    #[must_use]
    pub const fn kind(self) -> ActuatorKind {
        actuator_by_id(self).kind
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How an actuator interprets its command value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActuatorKind {
    /// Signed power in `[-MOTOR_LIMIT, MOTOR_LIMIT]`.
    Motor,
    /// Digital output, `0` (off) or `1` (on).
    Digital,
}

impl ActuatorKind {
    /// Forces a raw command into the range accepted by this kind of output.
    #[must_use]
    pub fn constrain(self, value: i32) -> i16 {
        match self {
            ActuatorKind::Motor => clamp_motor(value),
            ActuatorKind::Digital => i16::from(value != 0),
        }
    }
}

/// Metadata describing an actuator channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ActuatorChannel {
    pub id: ActuatorId,
    pub name: &'static str,
    pub kind: ActuatorKind,
}

impl ActuatorChannel {
    pub const fn new(id: ActuatorId, name: &'static str, kind: ActuatorKind) -> Self {
        Self { id, name, kind }
    }
}

/// Compile-time catalog of every actuator channel.
pub const ALL_ACTUATORS: [ActuatorChannel; ACTUATOR_COUNT] = [
    ActuatorChannel::new(ActuatorId::DriveStrafe, "strafe", ActuatorKind::Motor),
    ActuatorChannel::new(ActuatorId::DriveForward, "forward", ActuatorKind::Motor),
    ActuatorChannel::new(ActuatorId::DriveTurn, "turn", ActuatorKind::Motor),
    ActuatorChannel::new(ActuatorId::Lift, "lift", ActuatorKind::Motor),
    ActuatorChannel::new(ActuatorId::Arm, "arm", ActuatorKind::Motor),
    ActuatorChannel::new(ActuatorId::Claw, "claw", ActuatorKind::Motor),
    ActuatorChannel::new(ActuatorId::Led, "led", ActuatorKind::Digital),
];

/// Retrieve actuator metadata by identifier.
#[must_use]
pub const fn actuator_by_id(id: ActuatorId) -> ActuatorChannel {
    ALL_ACTUATORS[id.as_index()]
}

/// Clamps a raw command into the motor range.
#[must_use]
pub fn clamp_motor(value: i32) -> i16 {
    let limit = i32::from(MOTOR_LIMIT);
    // The clamp guarantees the value fits.
    #[allow(clippy::cast_possible_truncation)]
    let clamped = value.clamp(-limit, limit) as i16;
    clamped
}

/// Pending command for every actuator.
///
/// Values persist between ticks: an actuator keeps its last command until a
/// timer effect or action overwrites it. Within a tick the last writer wins.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ActuatorCommandSet {
    values: [i16; ACTUATOR_COUNT],
}

impl ActuatorCommandSet {
    /// Creates a command set with every actuator stopped.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: [0; ACTUATOR_COUNT],
        }
    }

    /// Writes a command, constraining it to the actuator's range.
    pub fn set(&mut self, id: ActuatorId, value: i32) {
        self.values[id.as_index()] = id.kind().constrain(value);
    }

    /// Returns the pending command for an actuator.
    #[must_use]
    pub const fn get(&self, id: ActuatorId) -> i16 {
        self.values[id.as_index()]
    }

    /// Flips a digital output; motors are toggled between stopped and full forward.
    pub fn toggle(&mut self, id: ActuatorId) {
        let next = match (id.kind(), self.get(id)) {
            (ActuatorKind::Digital, 0) => 1,
            (ActuatorKind::Motor, 0) => i32::from(MOTOR_LIMIT),
            _ => 0,
        };
        self.set(id, next);
    }

    /// Stops a single actuator.
    pub fn zero(&mut self, id: ActuatorId) {
        self.values[id.as_index()] = 0;
    }

    /// Stops every actuator.
    pub fn clear(&mut self) {
        self.values = [0; ACTUATOR_COUNT];
    }

    /// Iterates over every actuator with its pending command, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (ActuatorId, i16)> + '_ {
        ALL_ACTUATORS
            .iter()
            .map(|channel| (channel.id, self.get(channel.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_indices_round_trip() {
        for (index, sensor) in ALL_SENSORS.iter().enumerate() {
            assert_eq!(sensor.id.as_index(), index);
            assert_eq!(SensorId::from_index(index), Some(sensor.id));
        }
        for (index, actuator) in ALL_ACTUATORS.iter().enumerate() {
            assert_eq!(actuator.id.as_index(), index);
            assert_eq!(ActuatorId::from_index(index), Some(actuator.id));
        }
        assert_eq!(SensorId::from_index(SENSOR_COUNT), None);
        assert_eq!(ActuatorId::from_index(ACTUATOR_COUNT), None);
    }

    #[test]
    fn sensor_lookup_ignores_case() {
        assert_eq!(SensorId::from_name("LEFT"), Some(SensorId::LeftEncoder));
        assert_eq!(SensorId::from_name("sonar"), Some(SensorId::Sonar));
        assert_eq!(SensorId::from_name("gyro"), None);
        assert!(sensor_by_id(SensorId::RightEncoder).is_resettable());
        assert!(!sensor_by_id(SensorId::ArmPot).is_resettable());
    }

    #[test]
    fn command_set_clamps_motor_range() {
        let mut commands = ActuatorCommandSet::new();
        commands.set(ActuatorId::DriveForward, 300);
        commands.set(ActuatorId::Arm, -900);
        commands.set(ActuatorId::Led, 42);

        assert_eq!(commands.get(ActuatorId::DriveForward), 127);
        assert_eq!(commands.get(ActuatorId::Arm), -127);
        assert_eq!(commands.get(ActuatorId::Led), 1);
    }

    #[test]
    fn toggle_flips_digital_output() {
        let mut commands = ActuatorCommandSet::new();
        commands.toggle(ActuatorId::Led);
        assert_eq!(commands.get(ActuatorId::Led), 1);
        commands.toggle(ActuatorId::Led);
        assert_eq!(commands.get(ActuatorId::Led), 0);
    }

    #[test]
    fn later_writes_overwrite_earlier_ones() {
        let mut commands = ActuatorCommandSet::new();
        commands.set(ActuatorId::Claw, 40);
        commands.set(ActuatorId::Claw, -60);
        assert_eq!(commands.get(ActuatorId::Claw), -60);

        commands.clear();
        assert!(commands.iter().all(|(_, value)| value == 0));
    }
}
