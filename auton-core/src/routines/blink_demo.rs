//! Timer/action demonstration routine.
//!
//! Drives ahead for half a second, stops, reverses at one second, and blinks
//! the LED every 500 ms starting at 250 ms. The blink timer is disarmed at
//! 1250 ms; a separate one-shot entry reuses the blink action at 1500 ms.

use core::time::Duration;

use super::{RoutineKind, RoutineTemplate};
use crate::actions::{ActionId, ActionSpec, Effect};
use crate::devices::{ActuatorId, MOTOR_LIMIT};
use crate::timers::{TimerEffect, TimerId, TimerSpec};

pub const AHEAD_FULL: ActionId = ActionId(0);
pub const ALL_STOP: ActionId = ActionId(1);
pub const BLINK: ActionId = ActionId(2);
pub const BACK_FULL: ActionId = ActionId(3);

/// Periodic LED timer.
pub const BLINK_TIMER: TimerId = TimerId(2);
/// Spacing between LED toggles.
pub const BLINK_PERIOD: Duration = Duration::from_millis(500);

pub const BLINK_DEMO_ACTIONS: [ActionSpec; 4] = [
    ActionSpec::fire_and_forget(
        "ahead full",
        &[
            Effect::Zero(ActuatorId::DriveStrafe),
            Effect::Set {
                actuator: ActuatorId::DriveForward,
                value: MOTOR_LIMIT,
            },
            Effect::Zero(ActuatorId::DriveTurn),
        ],
    ),
    ActionSpec::fire_and_forget(
        "all stop",
        &[
            Effect::Zero(ActuatorId::DriveStrafe),
            Effect::Zero(ActuatorId::DriveForward),
            Effect::Zero(ActuatorId::DriveTurn),
        ],
    ),
    ActionSpec::fire_and_forget("blink", &[Effect::Toggle(ActuatorId::Led)]),
    ActionSpec::fire_and_forget(
        "back full",
        &[
            Effect::Zero(ActuatorId::DriveStrafe),
            Effect::Set {
                actuator: ActuatorId::DriveForward,
                value: -MOTOR_LIMIT,
            },
            Effect::Zero(ActuatorId::DriveTurn),
        ],
    ),
];

pub const BLINK_DEMO_TIMERS: [TimerSpec; 6] = [
    TimerSpec::at(
        Duration::ZERO,
        &[TimerEffect::Activate(AHEAD_FULL), TimerEffect::DisarmSelf],
    ),
    TimerSpec::at(
        Duration::from_millis(500),
        &[TimerEffect::Activate(ALL_STOP), TimerEffect::DisarmSelf],
    ),
    TimerSpec::at(
        Duration::from_millis(250),
        &[
            TimerEffect::Activate(BLINK),
            TimerEffect::Reschedule {
                period: BLINK_PERIOD,
            },
        ],
    ),
    TimerSpec::at(
        Duration::from_millis(1_000),
        &[TimerEffect::Activate(BACK_FULL), TimerEffect::DisarmSelf],
    ),
    TimerSpec::at(
        Duration::from_millis(1_500),
        &[TimerEffect::Activate(BLINK), TimerEffect::DisarmSelf],
    ),
    TimerSpec::at(
        Duration::from_millis(1_250),
        &[TimerEffect::Disarm(BLINK_TIMER), TimerEffect::DisarmSelf],
    ),
];

pub const BLINK_DEMO_TEMPLATE: RoutineTemplate = RoutineTemplate::new(
    RoutineKind::BlinkDemo,
    "blink demo",
    &BLINK_DEMO_TIMERS,
    &BLINK_DEMO_ACTIONS,
);

#[must_use]
pub const fn blink_demo_template() -> RoutineTemplate {
    BLINK_DEMO_TEMPLATE
}
