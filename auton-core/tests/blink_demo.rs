mod common;

use auton_core::devices::ActuatorId;
use auton_core::routines::blink_demo_template;
use auton_core::sequence::{LoopState, Sequence};
use auton_core::telemetry::TelemetryEventKind;
use auton_core::timers::TimerId;
use common::{CapturedDisplay, ScriptedIo};

/// Runs the demo at a 1 ms tick and records every LED change as `(ms, level)`.
fn led_changes(until_ms: u64) -> (Sequence, ScriptedIo, Vec<(u64, i16)>) {
    let mut sequence = Sequence::new(&blink_demo_template()).expect("demo tables are valid");
    let mut io = ScriptedIo::new();
    let mut display = CapturedDisplay::default();
    let mut changes = Vec::new();
    let mut led = 0;

    for millis in 0..=until_ms {
        io.at_millis(millis);
        assert_eq!(sequence.tick(&mut io, &mut display), LoopState::Running);
        let now = io.output(ActuatorId::Led);
        if now != led {
            changes.push((millis, now));
            led = now;
        }
    }
    (sequence, io, changes)
}

#[test]
fn led_blinks_until_the_blink_timer_is_disarmed() {
    let (sequence, _, changes) = led_changes(2_500);

    assert_eq!(changes, vec![(250, 1), (750, 0), (1_250, 1), (1_500, 0)]);
    assert!(!sequence.timer_armed(TimerId(2)));
    assert_eq!(sequence.trigger_time(TimerId(2)).map(|t| t.as_millis()), Some(1_750));
}

#[test]
fn chassis_follows_the_drive_timers() {
    let mut sequence = Sequence::new(&blink_demo_template()).expect("demo tables are valid");
    let mut io = ScriptedIo::new();
    let mut display = CapturedDisplay::default();

    let mut forward_at = |sequence: &mut Sequence, io: &mut ScriptedIo, millis| {
        io.at_millis(millis);
        sequence.tick(io, &mut display);
        io.output(ActuatorId::DriveForward)
    };

    assert_eq!(forward_at(&mut sequence, &mut io, 0), 127);
    assert_eq!(forward_at(&mut sequence, &mut io, 499), 127);
    assert_eq!(forward_at(&mut sequence, &mut io, 500), 0);
    assert_eq!(forward_at(&mut sequence, &mut io, 1_000), -127);
    assert_eq!(forward_at(&mut sequence, &mut io, 2_000), -127);
}

#[test]
fn late_poll_fires_each_due_timer_once() {
    let mut sequence = Sequence::new(&blink_demo_template()).expect("demo tables are valid");
    let mut io = ScriptedIo::new();
    let mut display = CapturedDisplay::default();

    io.at_millis(1_100);
    sequence.tick(&mut io, &mut display);

    let fired = sequence
        .telemetry()
        .oldest_first()
        .filter(|record| matches!(record.event, TelemetryEventKind::TimerFired(_)))
        .count();
    assert_eq!(fired, 4, "timers 0..=3 were all due at 1.1s");
    assert_eq!(io.output(ActuatorId::DriveForward), -127);
    assert_eq!(io.output(ActuatorId::Led), 1);
    assert_eq!(
        sequence.trigger_time(TimerId(2)).map(|t| t.as_millis()),
        Some(750),
        "a reschedule advances one period per firing"
    );
    assert_eq!(display.lines[0], "blink demo t=1100ms");
}
