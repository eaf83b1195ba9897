//! Hardware-facing seams consumed by the sequencing engine.
//!
//! The firmware implements [`RobotIo`] on top of real PWM, encoder and ADC
//! peripherals; the emulator implements it over a simulated plant; tests use
//! scripted mocks. The engine never touches hardware through any other path.

use core::fmt;
use core::time::Duration;

use crate::devices::{ActuatorId, SensorId};

/// Reported when a sensor cannot produce a trustworthy reading.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SensorUnavailable {
    pub sensor: SensorId,
}

impl SensorUnavailable {
    #[must_use]
    pub const fn new(sensor: SensorId) -> Self {
        Self { sensor }
    }
}

impl fmt::Display for SensorUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sensor {} unavailable", self.sensor)
    }
}

/// Actuator/sensor interface the sequencer drives once per tick.
pub trait RobotIo {
    /// Returns the raw scalar for a sensor channel (ticks, pot level, range).
    fn read_sensor(&mut self, sensor: SensorId) -> Result<i32, SensorUnavailable>;

    /// Applies an already-constrained command to an actuator channel.
    fn write_actuator(&mut self, actuator: ActuatorId, command: i16);

    /// Zeroes a cumulative sensor.
    fn reset_sensor(&mut self, sensor: SensorId);

    /// Monotonic time since the sequence started.
    fn elapsed_time(&self) -> Duration;

    /// Polled once per tick; `true` once the host leaves autonomous mode.
    fn cancel_requested(&self) -> bool;

    /// Stops every output. Called once when a sequence terminates.
    fn stop_all(&mut self) {
        for channel in &crate::devices::ALL_ACTUATORS {
            self.write_actuator(channel.id, 0);
        }
    }
}

/// Per-tick cache of sensor readings.
///
/// Each channel is read from the hardware at most once per tick; every
/// action evaluated in that tick sees the same value. A snapshot must be
/// dropped at the end of its tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SensorSnapshot {
    readings: [Option<Result<i32, SensorUnavailable>>; crate::devices::SENSOR_COUNT],
}

impl SensorSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            readings: [None; crate::devices::SENSOR_COUNT],
        }
    }

    /// Returns the cached reading, sampling the hardware on first use.
    pub fn read<IO>(&mut self, io: &mut IO, sensor: SensorId) -> Result<i32, SensorUnavailable>
    where
        IO: RobotIo + ?Sized,
    {
        let slot = &mut self.readings[sensor.as_index()];
        match slot {
            Some(reading) => *reading,
            None => {
                let reading = io.read_sensor(sensor);
                *slot = Some(reading);
                reading
            }
        }
    }
}

/// Optional status display (LCD or console).
///
/// Writes are best effort: implementations must not block and swallow
/// their own failures.
pub trait StatusDisplay {
    fn set_status_line(&mut self, line: u8, text: &str);
}

/// Display that discards every line.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopDisplay;

impl NoopDisplay {
    /// Creates a new no-op display.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StatusDisplay for NoopDisplay {
    fn set_status_line(&mut self, _: u8, _: &str) {}
}
