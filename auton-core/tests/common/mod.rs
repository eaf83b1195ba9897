#![allow(dead_code)]

use core::time::Duration;

use auton_core::devices::{ACTUATOR_COUNT, ActuatorId, SENSOR_COUNT, SensorId};
use auton_core::io::{RobotIo, SensorUnavailable, StatusDisplay};

/// Host-side robot with pinned sensor values and a hand-driven clock.
pub struct ScriptedIo {
    pub now: Duration,
    pub cancel: bool,
    readings: [Result<i32, SensorUnavailable>; SENSOR_COUNT],
    outputs: [i16; ACTUATOR_COUNT],
    pub writes: Vec<(ActuatorId, i16)>,
    pub resets: Vec<SensorId>,
    pub stops: usize,
}

impl ScriptedIo {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            cancel: false,
            readings: [Ok(0); SENSOR_COUNT],
            outputs: [0; ACTUATOR_COUNT],
            writes: Vec::new(),
            resets: Vec::new(),
            stops: 0,
        }
    }

    pub fn set(&mut self, sensor: SensorId, value: i32) {
        self.readings[sensor.as_index()] = Ok(value);
    }

    pub fn unplug(&mut self, sensor: SensorId) {
        self.readings[sensor.as_index()] = Err(SensorUnavailable::new(sensor));
    }

    pub fn at_millis(&mut self, millis: u64) {
        self.now = Duration::from_millis(millis);
    }

    /// Last value written to an actuator.
    pub fn output(&self, actuator: ActuatorId) -> i16 {
        self.outputs[actuator.as_index()]
    }
}

impl RobotIo for ScriptedIo {
    fn read_sensor(&mut self, sensor: SensorId) -> Result<i32, SensorUnavailable> {
        self.readings[sensor.as_index()]
    }

    fn write_actuator(&mut self, actuator: ActuatorId, command: i16) {
        self.outputs[actuator.as_index()] = command;
        self.writes.push((actuator, command));
    }

    fn reset_sensor(&mut self, sensor: SensorId) {
        self.resets.push(sensor);
        self.readings[sensor.as_index()] = Ok(0);
    }

    fn elapsed_time(&self) -> Duration {
        self.now
    }

    fn cancel_requested(&self) -> bool {
        self.cancel
    }

    fn stop_all(&mut self) {
        self.stops += 1;
        for index in 0..ACTUATOR_COUNT {
            if let Some(actuator) = ActuatorId::from_index(index) {
                self.write_actuator(actuator, 0);
            }
        }
    }
}

/// Display that keeps the two most recent status lines.
#[derive(Default)]
pub struct CapturedDisplay {
    pub lines: [String; 2],
}

impl StatusDisplay for CapturedDisplay {
    fn set_status_line(&mut self, line: u8, text: &str) {
        if let Some(slot) = self.lines.get_mut(usize::from(line)) {
            *slot = text.to_owned();
        }
    }
}
