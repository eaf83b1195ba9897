//! Clawbot approach: wait 200 ms, then drive full ahead until the sonar
//! reads 70 cm or less.

use core::time::Duration;

use super::{RoutineKind, RoutineTemplate};
use crate::actions::{ActionId, ActionSpec, MonitoredAction};
use crate::devices::{ActuatorId, MOTOR_LIMIT, SensorId};
use crate::timers::{TimerEffect, TimerSpec};

pub const APPROACH: ActionId = ActionId(0);

pub const START_DELAY: Duration = Duration::from_millis(200);
/// Range at which the approach stops.
pub const STOP_RANGE: i32 = 70;

pub const SONAR_APPROACH_ACTIONS: [ActionSpec; 1] = [ActionSpec::monitored(
    "approach",
    MonitoredAction::DriveUntilBelow {
        sensor: SensorId::Sonar,
        actuator: ActuatorId::DriveForward,
        limit: STOP_RANGE,
        power: MOTOR_LIMIT,
    },
)];

pub const SONAR_APPROACH_TIMERS: [TimerSpec; 1] = [TimerSpec::at(
    START_DELAY,
    &[TimerEffect::Activate(APPROACH), TimerEffect::DisarmSelf],
)];

pub const SONAR_APPROACH_TEMPLATE: RoutineTemplate = RoutineTemplate::new(
    RoutineKind::SonarApproach,
    "sonar approach",
    &SONAR_APPROACH_TIMERS,
    &SONAR_APPROACH_ACTIONS,
);

#[must_use]
pub const fn sonar_approach_template() -> RoutineTemplate {
    SONAR_APPROACH_TEMPLATE
}
