//! Motor port normalization and chassis mixing.
//!
//! The sequencing engine speaks in chassis intents (strafe, forward, turn).
//! This module turns those into per-port wheel power, applying the port
//! orientation table so positive power always means "forward" for the
//! mechanism.

use crate::devices::{ActuatorCommandSet, ActuatorId, clamp_motor};

/// Commands with a smaller magnitude are latched to zero to stop drift.
pub const DEADBAND: i16 = 10;

/// Number of motor ports on the controller.
pub const MOTOR_PORT_COUNT: usize = 10;

/// Clamps to the motor range and latches small values to zero.
#[must_use]
pub fn normalize_power(power: i32) -> i16 {
    let clamped = clamp_motor(power);
    if clamped.abs() < DEADBAND { 0 } else { clamped }
}

/// Mounting direction of a motor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PortOrientation {
    Forward,
    Reversed,
}

impl PortOrientation {
    /// Converts mechanism power into the raw value written to the port.
    #[must_use]
    pub const fn apply(self, power: i16) -> i16 {
        match self {
            PortOrientation::Forward => power,
            PortOrientation::Reversed => power.saturating_neg(),
        }
    }
}

/// One-based motor port number.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct MotorPort(u8);

impl MotorPort {
    /// Returns `None` outside `1..=MOTOR_PORT_COUNT`.
    #[must_use]
    pub const fn new(port: u8) -> Option<Self> {
        if port >= 1 && port as usize <= MOTOR_PORT_COUNT {
            Some(Self(port))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    const fn slot(self) -> usize {
        self.0 as usize - 1
    }
}

/// Orientation of every motor port.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PortMap {
    orientations: [PortOrientation; MOTOR_PORT_COUNT],
}

impl PortMap {
    pub const fn new(orientations: [PortOrientation; MOTOR_PORT_COUNT]) -> Self {
        Self { orientations }
    }

    #[must_use]
    pub const fn orientation(&self, port: MotorPort) -> PortOrientation {
        self.orientations[port.slot()]
    }

    /// Raw value for `port` given mechanism power.
    #[must_use]
    pub const fn apply(&self, port: MotorPort, power: i16) -> i16 {
        self.orientation(port).apply(power)
    }
}

/// Orientation table for the competition robot.
pub const DEFAULT_PORT_MAP: PortMap = PortMap::new([
    PortOrientation::Reversed,
    PortOrientation::Forward,
    PortOrientation::Reversed,
    PortOrientation::Forward,
    PortOrientation::Reversed,
    PortOrientation::Reversed,
    PortOrientation::Reversed,
    PortOrientation::Forward,
    PortOrientation::Forward,
    PortOrientation::Forward,
]);

const fn port(number: u8) -> MotorPort {
    MotorPort(number)
}

/// Which port drives each mechanism.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PortAssignments {
    pub front_left: MotorPort,
    pub front_right: MotorPort,
    pub back_left: MotorPort,
    pub back_right: MotorPort,
    pub lift: MotorPort,
    pub arm: MotorPort,
    pub claw: MotorPort,
}

pub const DEFAULT_PORTS: PortAssignments = PortAssignments {
    front_left: port(9),
    front_right: port(7),
    back_left: port(8),
    back_right: port(6),
    lift: port(2),
    arm: port(3),
    claw: port(4),
};

/// Power for each wheel of a four-motor base.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct WheelPowers {
    pub front_left: i16,
    pub front_right: i16,
    pub back_left: i16,
    pub back_right: i16,
}

/// How chassis intents map onto wheels.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DriveMixer {
    /// Skid steer; strafe is ignored.
    Tank,
    /// Holonomic base with mecanum wheels.
    Mecanum,
}

impl DriveMixer {
    #[must_use]
    pub fn mix(self, strafe: i16, forward: i16, turn: i16) -> WheelPowers {
        match self {
            DriveMixer::Tank => {
                let (left, right) = Self::tank(forward, turn);
                WheelPowers {
                    front_left: left,
                    front_right: right,
                    back_left: left,
                    back_right: right,
                }
            }
            DriveMixer::Mecanum => Self::mecanum(strafe, forward, turn),
        }
    }

    /// `(forward + turn / 2, forward - turn / 2)` after normalizing both inputs.
    #[must_use]
    pub fn tank(forward: i16, turn: i16) -> (i16, i16) {
        let forward = i32::from(normalize_power(forward.into()));
        let half_turn = i32::from(normalize_power(turn.into())) / 2;
        (
            clamp_motor(forward + half_turn),
            clamp_motor(forward - half_turn),
        )
    }

    #[must_use]
    pub fn mecanum(strafe: i16, forward: i16, turn: i16) -> WheelPowers {
        let (x, y, a) = (i32::from(strafe), i32::from(forward), i32::from(turn));
        WheelPowers {
            front_left: normalize_power(y - x + a),
            front_right: normalize_power(y + x - a),
            back_left: normalize_power(y + x + a),
            back_right: normalize_power(y - x - a),
        }
    }
}

/// Raw value destined for one motor port.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PortWrite {
    pub port: MotorPort,
    pub value: i16,
}

/// Turns a command set into oriented per-port writes.
#[must_use]
pub fn port_writes(
    commands: &ActuatorCommandSet,
    mixer: DriveMixer,
    ports: &PortAssignments,
    map: &PortMap,
) -> [PortWrite; 7] {
    let wheels = mixer.mix(
        commands.get(ActuatorId::DriveStrafe),
        commands.get(ActuatorId::DriveForward),
        commands.get(ActuatorId::DriveTurn),
    );
    let write = |port: MotorPort, power: i16| PortWrite {
        port,
        value: map.apply(port, power),
    };
    [
        write(ports.front_left, wheels.front_left),
        write(ports.front_right, wheels.front_right),
        write(ports.back_left, wheels.back_left),
        write(ports.back_right, wheels.back_right),
        write(ports.lift, commands.get(ActuatorId::Lift)),
        write(ports.arm, commands.get(ActuatorId::Arm)),
        write(ports.claw, commands.get(ActuatorId::Claw)),
    ]
}
