use std::time::Duration;

use auton_core::devices::{ACTUATOR_COUNT, ActuatorId, SENSOR_COUNT, SensorId};
use auton_core::io::{RobotIo, SensorUnavailable};
use auton_core::repl::grammar::SensorOverride;
use auton_core::sequence::TICK_PERIOD;

/// Sensor change per millisecond at a command of 1, in thousandths.
const ENCODER_RATE: i64 = 2;
const POT_RATE: i64 = 4;
const SONAR_RATE: i64 = 2;

const MILLI: i64 = 1_000;

pub const ARM_REST: i32 = 1_200;
pub const CLAW_REST: i32 = 1_500;
pub const LIFT_REST: i32 = 400;
pub const SONAR_START: i32 = 300;

/// Clock that only moves when the emulator ticks.
#[derive(Clone, Copy, Debug)]
pub struct SimClock {
    now: Duration,
    period: Duration,
}

impl SimClock {
    pub const fn new(period: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            period,
        }
    }

    pub const fn now(&self) -> Duration {
        self.now
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    pub fn advance(&mut self) {
        self.now += self.period;
    }

    pub fn restart(&mut self) {
        self.now = Duration::ZERO;
    }

    /// Ticks needed to cover `span`, rounded up.
    pub fn ticks_for(&self, span: Duration) -> u32 {
        let period = self.period.as_micros().max(1);
        let ticks = span.as_micros().div_ceil(period);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }
}

/// Simulated robot driven by the command set.
///
/// Sensor state is held in thousandths so slow commands still move the
/// readings over many ticks.
#[derive(Debug)]
pub struct Plant {
    clock: SimClock,
    state: [i64; SENSOR_COUNT],
    offline: [bool; SENSOR_COUNT],
    outputs: [i16; ACTUATOR_COUNT],
    cancel: bool,
    stops: usize,
}

impl Plant {
    pub fn new() -> Self {
        let mut plant = Self {
            clock: SimClock::new(TICK_PERIOD),
            state: [0; SENSOR_COUNT],
            offline: [false; SENSOR_COUNT],
            outputs: [0; ACTUATOR_COUNT],
            cancel: false,
            stops: 0,
        };
        plant.place(SensorId::ArmPot, ARM_REST);
        plant.place(SensorId::ClawPot, CLAW_REST);
        plant.place(SensorId::LiftPot, LIFT_REST);
        plant.place(SensorId::Sonar, SONAR_START);
        plant
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Prepares for a new run: time restarts at zero and cancellation clears.
    pub fn start_run(&mut self) {
        self.clock.restart();
        self.cancel = false;
    }

    pub fn request_cancel(&mut self) {
        self.cancel = true;
    }

    pub fn stop_count(&self) -> usize {
        self.stops
    }

    pub fn apply_override(&mut self, sensor: SensorId, reading: SensorOverride) {
        match reading {
            SensorOverride::Value(value) => {
                self.offline[sensor.as_index()] = false;
                self.place(sensor, value);
            }
            SensorOverride::Off => self.offline[sensor.as_index()] = true,
        }
    }

    /// Current physical value, ignoring whether the sensor is online.
    pub fn reading(&self, sensor: SensorId) -> i32 {
        let value = self.state[sensor.as_index()] / MILLI;
        i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
    }

    pub fn is_offline(&self, sensor: SensorId) -> bool {
        self.offline[sensor.as_index()]
    }

    pub fn output(&self, actuator: ActuatorId) -> i16 {
        self.outputs[actuator.as_index()]
    }

    /// Integrates one clock period of motion, then advances the clock.
    pub fn step(&mut self) {
        let millis = i64::try_from(self.clock.period().as_millis()).unwrap_or(i64::MAX);
        let forward = i64::from(self.output(ActuatorId::DriveForward));
        let turn = i64::from(self.output(ActuatorId::DriveTurn));

        self.integrate(SensorId::LeftEncoder, (forward + turn) * ENCODER_RATE * millis);
        self.integrate(SensorId::RightEncoder, (forward - turn) * ENCODER_RATE * millis);
        for (sensor, actuator) in [
            (SensorId::ArmPot, ActuatorId::Arm),
            (SensorId::ClawPot, ActuatorId::Claw),
            (SensorId::LiftPot, ActuatorId::Lift),
        ] {
            let command = i64::from(self.output(actuator));
            self.integrate(sensor, command * POT_RATE * millis);
        }
        self.integrate(SensorId::Sonar, -forward * SONAR_RATE * millis);
        let sonar = &mut self.state[SensorId::Sonar.as_index()];
        *sonar = (*sonar).max(0);

        self.clock.advance();
    }

    fn place(&mut self, sensor: SensorId, value: i32) {
        self.state[sensor.as_index()] = i64::from(value) * MILLI;
    }

    fn integrate(&mut self, sensor: SensorId, delta: i64) {
        let slot = &mut self.state[sensor.as_index()];
        *slot = slot.saturating_add(delta);
    }
}

impl Default for Plant {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotIo for Plant {
    fn read_sensor(&mut self, sensor: SensorId) -> Result<i32, SensorUnavailable> {
        if self.is_offline(sensor) {
            return Err(SensorUnavailable::new(sensor));
        }
        Ok(self.reading(sensor))
    }

    fn write_actuator(&mut self, actuator: ActuatorId, command: i16) {
        self.outputs[actuator.as_index()] = command;
    }

    fn reset_sensor(&mut self, sensor: SensorId) {
        self.state[sensor.as_index()] = 0;
    }

    fn elapsed_time(&self) -> Duration {
        self.clock.now()
    }

    fn cancel_requested(&self) -> bool {
        self.cancel
    }

    fn stop_all(&mut self) {
        self.stops += 1;
        self.outputs = [0; ACTUATOR_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_forward_moves_both_encoders() {
        let mut plant = Plant::new();
        plant.write_actuator(ActuatorId::DriveForward, 127);
        for _ in 0..1_000 {
            plant.step();
        }
        assert_eq!(plant.reading(SensorId::LeftEncoder), 254);
        assert_eq!(plant.reading(SensorId::RightEncoder), 254);
        assert_eq!(plant.reading(SensorId::Sonar), SONAR_START - 254);
        assert_eq!(plant.clock().now(), Duration::from_secs(1));
    }

    #[test]
    fn turning_splits_the_encoders() {
        let mut plant = Plant::new();
        plant.write_actuator(ActuatorId::DriveTurn, 50);
        for _ in 0..100 {
            plant.step();
        }
        assert_eq!(plant.reading(SensorId::LeftEncoder), 10);
        assert_eq!(plant.reading(SensorId::RightEncoder), -10);
    }

    #[test]
    fn offline_sensor_reports_unavailable_until_set() {
        let mut plant = Plant::new();
        plant.apply_override(SensorId::Sonar, SensorOverride::Off);
        assert_eq!(
            plant.read_sensor(SensorId::Sonar),
            Err(SensorUnavailable::new(SensorId::Sonar))
        );

        plant.apply_override(SensorId::Sonar, SensorOverride::Value(65));
        assert_eq!(plant.read_sensor(SensorId::Sonar), Ok(65));
    }

    #[test]
    fn sonar_never_reads_negative() {
        let mut plant = Plant::new();
        plant.apply_override(SensorId::Sonar, SensorOverride::Value(1));
        plant.write_actuator(ActuatorId::DriveForward, 127);
        for _ in 0..100 {
            plant.step();
        }
        assert_eq!(plant.reading(SensorId::Sonar), 0);
    }

    #[test]
    fn ticks_round_up_to_cover_span() {
        let clock = SimClock::new(Duration::from_millis(20));
        assert_eq!(clock.ticks_for(Duration::from_millis(50)), 3);
        assert_eq!(clock.ticks_for(Duration::from_millis(60)), 3);
    }
}
