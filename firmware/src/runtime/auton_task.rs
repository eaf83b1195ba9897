use auton_core::orchestrator::AutonomousSession;
use auton_core::routines::RoutineKind;
use auton_core::sequence::{LoopState, TICK_PERIOD};
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Ticker};

use super::MODE_CHANGED;
use crate::competition::{self, CompetitionMode};
use crate::display::LogDisplay;
use crate::hw::RobotHardware;
use crate::telemetry::TelemetryMirror;

/// Routine started when the field enters autonomous mode.
const AUTONOMOUS_ROUTINE: RoutineKind = RoutineKind::ScoreCube;

#[embassy_executor::task]
pub async fn run(
    session: &'static mut AutonomousSession,
    mut hardware: RobotHardware<'static>,
) -> ! {
    let mut display = LogDisplay::new();
    let mut mirror = TelemetryMirror::new();
    let period = Duration::from_micros(
        u64::try_from(TICK_PERIOD.as_micros()).unwrap_or(1_000),
    );

    loop {
        wait_for_mode(|mode| mode == CompetitionMode::Autonomous).await;

        hardware.start_run();
        if let Err(err) = session.begin(AUTONOMOUS_ROUTINE) {
            defmt::error!("auton: cannot start: {}", defmt::Display2Format(&err));
            wait_for_mode(|mode| mode != CompetitionMode::Autonomous).await;
            continue;
        }
        mirror.restart();
        defmt::info!("auton: {} started", AUTONOMOUS_ROUTINE.tag());

        let mut ticker = Ticker::every(period);
        loop {
            // A mode change ticks early so cancellation lands without waiting
            // out the period.
            match select(ticker.next(), MODE_CHANGED.wait()).await {
                Either::First(()) | Either::Second(_) => {}
            }

            let state = session.tick(&mut hardware, &mut display);
            if let Some(sequence) = session.latest() {
                mirror.drain_sequence(sequence);
            }
            if state != Some(LoopState::Running) {
                break;
            }
        }

        let ticks = session.latest().map_or(0, |sequence| sequence.ticks());
        defmt::info!("auton: finished after {} ticks", ticks);

        // A routine that ends early does not restart within the same period.
        wait_for_mode(|mode| mode != CompetitionMode::Autonomous).await;
    }
}

async fn wait_for_mode(accept: impl Fn(CompetitionMode) -> bool) {
    while !accept(competition::mode()) {
        MODE_CHANGED.wait().await;
    }
}
