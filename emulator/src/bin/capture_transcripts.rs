use std::io;

#[allow(dead_code)]
#[path = "../plant.rs"]
mod plant;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use auton_core::routines::RoutineKind;
use session::{Session, TranscriptProfile};

fn main() -> io::Result<()> {
    record_profile(RoutineKind::BlinkDemo)?;
    record_profile(RoutineKind::ScoreCube)?;
    record_profile(RoutineKind::SonarApproach)?;
    Ok(())
}

fn record_profile(routine: RoutineKind) -> io::Result<()> {
    let mut session = Session::new(TranscriptProfile::new(routine))?;
    match routine {
        RoutineKind::BlinkDemo => record_blink(&mut session)?,
        RoutineKind::ScoreCube => record_score(&mut session)?,
        RoutineKind::SonarApproach => record_sonar(&mut session)?,
    }
    session.record_telemetry()
}

fn record_blink(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("help")?;
    let _ = session.handle_command("run blink")?;
    let _ = session.handle_command("tick")?;
    for _ in 0..4 {
        let _ = session.handle_command("advance 250ms")?;
    }
    let _ = session.handle_command("advance 1s")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("cancel")?;
    let _ = session.handle_command("tick")?;
    Ok(())
}

fn record_score(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("run score")?;
    let _ = session.handle_command("advance 2s")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("sensor claw off")?;
    let _ = session.handle_command("advance 1s")?;
    let _ = session.handle_command("sensor claw 1200")?;
    let _ = session.handle_command("advance 4s")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("run sonar")?;
    let _ = session.handle_command("cancel")?;
    let _ = session.handle_command("tick")?;
    Ok(())
}

fn record_sonar(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("sensor sonar 180")?;
    let _ = session.handle_command("run sonar")?;
    let _ = session.handle_command("advance 150ms")?;
    let _ = session.handle_command("sensor sonar off")?;
    let _ = session.handle_command("advance 100ms")?;
    let _ = session.handle_command("sensor sonar 180")?;
    let _ = session.handle_command("advance 1s")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("cancel")?;
    let _ = session.handle_command("tick 3")?;
    Ok(())
}
