//! Board support for the robot controller.
//!
//! The scaling helpers here are plain arithmetic and build everywhere; the
//! drivers that touch Embassy peripherals only build for the controller.

use auton_core::drive::{DEFAULT_PORT_MAP, DEFAULT_PORTS, DriveMixer, PortWrite, port_writes};
use auton_core::devices::{ActuatorCommandSet, MOTOR_LIMIT};

#[cfg(target_os = "none")]
pub mod encoders;
#[cfg(target_os = "none")]
pub mod motors;
#[cfg(target_os = "none")]
pub mod sensors;

#[cfg(target_os = "none")]
pub use robot::RobotHardware;

/// The competition base has mecanum wheels.
pub const DRIVE_MIXER: DriveMixer = DriveMixer::Mecanum;

/// Full-scale reading of the 12-bit ADC.
pub const ADC_FULL_SCALE: u16 = 4_095;

/// Sonar range at full scale, in centimetres.
pub const SONAR_RANGE_CM: u32 = 500;

/// Turns the current command set into raw per-port motor values.
pub fn motor_writes(commands: &ActuatorCommandSet) -> [PortWrite; 7] {
    port_writes(commands, DRIVE_MIXER, &DEFAULT_PORTS, &DEFAULT_PORT_MAP)
}

/// Rotation sense requested from an H-bridge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Splits a signed motor value into a duty fraction over [`MOTOR_LIMIT`] and a
/// direction.
pub fn duty_for(value: i16) -> (u16, Direction) {
    let magnitude = value.unsigned_abs().min(MOTOR_LIMIT.unsigned_abs());
    let direction = if value < 0 {
        Direction::Reverse
    } else {
        Direction::Forward
    };
    (magnitude, direction)
}

/// Quadrature step from the level of channel B when channel A changes.
///
/// Counting both edges of A gives two counts per cycle.
pub const fn quadrature_step(a_high: bool, b_high: bool) -> i32 {
    if a_high == b_high { -1 } else { 1 }
}

/// Converts a raw sonar sample into centimetres.
///
/// A sample pinned at full scale means the sensor is unplugged and the pull-up
/// wins, so it reads as unavailable.
pub fn sonar_centimeters(raw: u16) -> Option<i32> {
    if raw >= ADC_FULL_SCALE {
        return None;
    }
    let scaled = u32::from(raw) * SONAR_RANGE_CM / u32::from(ADC_FULL_SCALE);
    i32::try_from(scaled).ok()
}

#[cfg(target_os = "none")]
mod robot {
    use core::time::Duration;

    use auton_core::devices::{ActuatorCommandSet, ActuatorId, SensorId};
    use auton_core::io::{RobotIo, SensorUnavailable};
    use embassy_stm32::gpio::{Level, Output};
    use embassy_time::Instant;

    use super::motor_writes;
    use super::motors::MotorBank;
    use super::sensors::SensorBank;
    use crate::competition;

    /// [`RobotIo`] backed by the controller's motor, sensor, and LED pins.
    pub struct RobotHardware<'d> {
        motors: MotorBank<'d>,
        sensors: SensorBank<'d>,
        led: Output<'d>,
        commands: ActuatorCommandSet,
        started_at: Instant,
    }

    impl<'d> RobotHardware<'d> {
        pub fn new(motors: MotorBank<'d>, sensors: SensorBank<'d>, led: Output<'d>) -> Self {
            Self {
                motors,
                sensors,
                led,
                commands: ActuatorCommandSet::new(),
                started_at: Instant::now(),
            }
        }

        /// Restarts the run clock at zero.
        pub fn start_run(&mut self) {
            self.started_at = Instant::now();
        }
    }

    impl RobotIo for RobotHardware<'_> {
        fn read_sensor(&mut self, sensor: SensorId) -> Result<i32, SensorUnavailable> {
            self.sensors
                .read(sensor)
                .ok_or(SensorUnavailable::new(sensor))
        }

        fn write_actuator(&mut self, actuator: ActuatorId, command: i16) {
            if actuator == ActuatorId::Led {
                let level = if command == 0 { Level::Low } else { Level::High };
                self.led.set_level(level);
                return;
            }
            if self.commands.get(actuator) == command {
                return;
            }
            self.commands.set(actuator, command.into());
            self.motors.apply(&motor_writes(&self.commands));
        }

        fn reset_sensor(&mut self, sensor: SensorId) {
            self.sensors.reset(sensor);
        }

        fn elapsed_time(&self) -> Duration {
            let elapsed = Instant::now().saturating_duration_since(self.started_at);
            Duration::from_micros(elapsed.as_micros())
        }

        fn cancel_requested(&self) -> bool {
            competition::autonomous_cancelled()
        }

        fn stop_all(&mut self) {
            self.commands.clear();
            self.motors.stop();
            self.led.set_low();
        }
    }
}

#[cfg(test)]
mod tests {
    use auton_core::devices::ActuatorId;

    use super::*;

    #[test]
    fn duty_saturates_at_full_power() {
        assert_eq!(duty_for(0), (0, Direction::Forward));
        assert_eq!(duty_for(-64), (64, Direction::Reverse));
        assert_eq!(duty_for(i16::MIN), (127, Direction::Reverse));
    }

    #[test]
    fn quadrature_direction_follows_phase() {
        assert_eq!(quadrature_step(true, false), 1);
        assert_eq!(quadrature_step(false, true), 1);
        assert_eq!(quadrature_step(true, true), -1);
    }

    #[test]
    fn pinned_sonar_reads_unavailable() {
        assert_eq!(sonar_centimeters(0), Some(0));
        assert_eq!(sonar_centimeters(2_047), Some(249));
        assert_eq!(sonar_centimeters(ADC_FULL_SCALE), None);
    }

    #[test]
    fn arm_command_reaches_its_port() {
        let mut commands = ActuatorCommandSet::new();
        commands.set(ActuatorId::Arm, 100);
        let writes = motor_writes(&commands);
        let arm = writes
            .iter()
            .find(|write| write.port == DEFAULT_PORTS.arm)
            .expect("arm port");
        assert_eq!(arm.value, DEFAULT_PORT_MAP.apply(DEFAULT_PORTS.arm, 100));
    }
}
