//! Competition routine: drive up to the goal, raise the arm, release the
//! cube, turn away and back off.
//!
//! Every closed-loop step carries a timeout so a stalled mechanism cannot
//! hold the chassis for the rest of the period.

use core::time::Duration;

use super::{RoutineKind, RoutineTemplate};
use crate::actions::{ActionId, ActionSpec, Effect, MonitoredAction, TargetSource};
use crate::controller::SeekController;
use crate::devices::{ActuatorId, MOTOR_LIMIT, SensorId};
use crate::timers::{TimerEffect, TimerSpec};

pub const DRIVE: ActionId = ActionId(0);
pub const ARM_UP: ActionId = ActionId(1);
pub const CLAW_OPEN: ActionId = ActionId(2);
pub const TURN: ActionId = ActionId(3);
pub const BACK_OFF: ActionId = ActionId(4);
pub const ALL_STOP: ActionId = ActionId(5);
pub const LIFT: ActionId = ActionId(6);

/// Encoder ticks from the start tile to the goal.
pub const DRIVE_DISTANCE: i32 = 300;
pub const DRIVE_TOLERANCE: i32 = 10;
/// Arm potentiometer level with the cube above the goal wall.
pub const ARM_SCORE_LEVEL: i32 = 1_670;
pub const ARM_GAIN: i32 = -3;
pub const ARM_TOLERANCE: i32 = 10;
pub const CLAW_OPEN_LEVEL: i32 = 1_200;
pub const CLAW_GAIN: i32 = -2;
pub const CLAW_TOLERANCE: i32 = 50;
pub const LIFT_DEFAULT_LEVEL: i32 = 400;
pub const LIFT_SCORE_LEVEL: i32 = 900;
pub const LIFT_GAIN: i32 = -2;
pub const LIFT_TOLERANCE: i32 = 20;
/// Encoder differential for roughly a quarter turn.
pub const TURN_DIFFERENTIAL: i32 = 200;
pub const TURN_TOLERANCE: i32 = 15;
pub const BACK_OFF_POWER: i16 = MOTOR_LIMIT / 2;

pub const SCORE_CUBE_ACTIONS: [ActionSpec; 7] = [
    ActionSpec::monitored(
        "drive to goal",
        MonitoredAction::DriveToTarget {
            left: SensorId::LeftEncoder,
            right: SensorId::RightEncoder,
            forward: ActuatorId::DriveForward,
            heading: ActuatorId::DriveTurn,
            target: TargetSource::Runtime {
                default: DRIVE_DISTANCE,
            },
            controller: SeekController::unit(DRIVE_TOLERANCE),
        },
    )
    .with_timeout(Duration::from_millis(3_000)),
    ActionSpec::monitored(
        "arm up",
        MonitoredAction::Seek {
            sensor: SensorId::ArmPot,
            actuator: ActuatorId::Arm,
            target: TargetSource::Fixed(ARM_SCORE_LEVEL),
            controller: SeekController::proportional(ARM_GAIN, ARM_TOLERANCE),
        },
    )
    .with_timeout(Duration::from_millis(2_000)),
    ActionSpec::monitored(
        "claw open",
        MonitoredAction::Seek {
            sensor: SensorId::ClawPot,
            actuator: ActuatorId::Claw,
            target: TargetSource::Fixed(CLAW_OPEN_LEVEL),
            controller: SeekController::proportional(CLAW_GAIN, CLAW_TOLERANCE),
        },
    )
    .with_timeout(Duration::from_millis(1_000)),
    ActionSpec::monitored(
        "turn away",
        MonitoredAction::TurnToTarget {
            left: SensorId::LeftEncoder,
            right: SensorId::RightEncoder,
            actuator: ActuatorId::DriveTurn,
            target: TargetSource::Fixed(TURN_DIFFERENTIAL),
            controller: SeekController::unit(TURN_TOLERANCE),
        },
    )
    .with_timeout(Duration::from_millis(2_000)),
    ActionSpec::fire_and_forget(
        "back off",
        &[Effect::Set {
            actuator: ActuatorId::DriveForward,
            value: -BACK_OFF_POWER,
        }],
    ),
    ActionSpec::fire_and_forget(
        "all stop",
        &[
            Effect::Zero(ActuatorId::DriveStrafe),
            Effect::Zero(ActuatorId::DriveForward),
            Effect::Zero(ActuatorId::DriveTurn),
        ],
    ),
    ActionSpec::monitored(
        "lift",
        MonitoredAction::Seek {
            sensor: SensorId::LiftPot,
            actuator: ActuatorId::Lift,
            target: TargetSource::Runtime {
                default: LIFT_DEFAULT_LEVEL,
            },
            controller: SeekController::proportional(LIFT_GAIN, LIFT_TOLERANCE),
        },
    )
    .with_timeout(Duration::from_millis(1_500)),
];

pub const SCORE_CUBE_TIMERS: [TimerSpec; 5] = [
    TimerSpec::at(
        Duration::ZERO,
        &[
            TimerEffect::ResetSensor(SensorId::LeftEncoder),
            TimerEffect::ResetSensor(SensorId::RightEncoder),
            TimerEffect::ActivateWithTarget {
                action: DRIVE,
                target: DRIVE_DISTANCE,
            },
            TimerEffect::Activate(ARM_UP),
            TimerEffect::DisarmSelf,
        ],
    ),
    TimerSpec::at(
        Duration::from_millis(2_000),
        &[
            TimerEffect::Activate(CLAW_OPEN),
            TimerEffect::ActivateWithTarget {
                action: LIFT,
                target: LIFT_SCORE_LEVEL,
            },
            TimerEffect::DisarmSelf,
        ],
    ),
    TimerSpec::at(
        Duration::from_millis(3_000),
        &[
            TimerEffect::ResetSensor(SensorId::LeftEncoder),
            TimerEffect::ResetSensor(SensorId::RightEncoder),
            TimerEffect::Activate(TURN),
            TimerEffect::DisarmSelf,
        ],
    ),
    TimerSpec::at(
        Duration::from_millis(5_000),
        &[
            TimerEffect::Activate(BACK_OFF),
            TimerEffect::Diagnostic(1),
            TimerEffect::DisarmSelf,
        ],
    ),
    TimerSpec::at(
        Duration::from_millis(6_000),
        &[
            TimerEffect::Deactivate(TURN),
            TimerEffect::Activate(ALL_STOP),
            TimerEffect::Diagnostic(2),
            TimerEffect::DisarmSelf,
        ],
    ),
];

pub const SCORE_CUBE_TEMPLATE: RoutineTemplate = RoutineTemplate::new(
    RoutineKind::ScoreCube,
    "score cube",
    &SCORE_CUBE_TIMERS,
    &SCORE_CUBE_ACTIONS,
);

#[must_use]
pub const fn score_cube_template() -> RoutineTemplate {
    SCORE_CUBE_TEMPLATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_loop_steps_have_timeouts() {
        for spec in &SCORE_CUBE_ACTIONS {
            if let crate::actions::ActionBehavior::Monitored(_) = spec.behavior {
                assert!(spec.timeout.is_some(), "{} has no timeout", spec.name);
            }
        }
    }

    #[test]
    fn timers_are_one_shot() {
        assert!(
            SCORE_CUBE_TIMERS
                .iter()
                .all(|timer| timer.effects.contains(&TimerEffect::DisarmSelf))
        );
    }
}
