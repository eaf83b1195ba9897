use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant as HostInstant};

use auton_core::io::StatusDisplay;
use auton_core::orchestrator::AutonomousSession;
use auton_core::repl::grammar::{self, Command, SensorCommand};
use auton_core::repl::status::{StatusFormatter, StatusSnapshot};
use auton_core::repl::write_help;
use auton_core::routines::RoutineKind;
use auton_core::sequence::LoopState;
use auton_core::telemetry::EventId;
use auton_core::timers::TimerId;

use crate::plant::Plant;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TranscriptProfile {
    pub routine: RoutineKind,
}

impl TranscriptProfile {
    pub const fn new(routine: RoutineKind) -> Self {
        Self { routine }
    }

    pub fn log_path(self) -> PathBuf {
        PathBuf::from(format!("transcripts/emulator-{}.log", self.routine.tag()))
    }

    pub fn header(self) -> String {
        format!("Autonomous emulator {} transcript", self.routine)
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        RoutineKind::from_tag(tag)
            .map(Self::new)
            .ok_or_else(|| format!("Unknown transcript profile `{tag}`"))
    }
}

/// Keeps the latest status lines the sequence rendered.
#[derive(Default)]
struct LineDisplay {
    lines: [String; 2],
}

impl StatusDisplay for LineDisplay {
    fn set_status_line(&mut self, line: u8, text: &str) {
        if let Some(slot) = self.lines.get_mut(usize::from(line)) {
            slot.clear();
            slot.push_str(text);
        }
    }
}

pub struct Session {
    autonomous: AutonomousSession,
    plant: Plant,
    display: LineDisplay,
    transcript: TranscriptLogger,
    started_at: HostInstant,
    next_event: EventId,
}

impl Session {
    pub fn new(profile: TranscriptProfile) -> io::Result<Self> {
        let transcript = TranscriptLogger::create(profile)?;
        Self::with_transcript(transcript)
    }

    fn with_transcript(transcript: TranscriptLogger) -> io::Result<Self> {
        let autonomous = AutonomousSession::with_default_routines()
            .map_err(|err| io::Error::other(err.to_string()))?;

        Ok(Self {
            autonomous,
            plant: Plant::new(),
            display: LineDisplay::default(),
            transcript,
            started_at: HostInstant::now(),
            next_event: 0,
        })
    }

    #[cfg(test)]
    pub fn plant(&self) -> &Plant {
        &self.plant
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let elapsed = self.started_at.elapsed();
        self.transcript
            .append_line(elapsed, TranscriptRole::Host, trimmed)?;

        let lines = match grammar::parse(trimmed) {
            Ok(command) => self.execute(command),
            Err(err) => vec![format!("ERR syntax {err}")],
        };

        self.record_output(elapsed, &lines)?;
        Ok(lines)
    }

    /// Chronological dump of the latest run's telemetry ring.
    pub fn telemetry_lines(&self) -> Vec<String> {
        self.autonomous
            .latest()
            .map(|sequence| {
                sequence
                    .telemetry()
                    .to_vec()
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn record_telemetry(&mut self) -> io::Result<()> {
        let elapsed = self.started_at.elapsed();
        let lines = self.telemetry_lines();
        self.record_output(elapsed, &lines)
    }

    fn execute(&mut self, command: Command<'_>) -> Vec<String> {
        match command {
            Command::Run(kind) => self.handle_run(kind),
            Command::Tick(count) => self.handle_ticks(count),
            Command::Advance(span) => {
                let count = self.plant.clock().ticks_for(span);
                self.handle_ticks(count)
            }
            Command::Sensor(SensorCommand { sensor, reading }) => {
                self.plant.apply_override(sensor, reading);
                let state = if self.plant.is_offline(sensor) {
                    "off".to_string()
                } else {
                    self.plant.reading(sensor).to_string()
                };
                vec![format!("OK sensor {sensor}={state}")]
            }
            Command::Cancel => {
                if self.autonomous.is_running() {
                    self.plant.request_cancel();
                    vec!["OK cancel requested; run stops on next tick".to_string()]
                } else {
                    vec!["ERR idle no routine running".to_string()]
                }
            }
            Command::Arm(timer) => self.handle_timer(timer, true),
            Command::Disarm(timer) => self.handle_timer(timer, false),
            Command::Status => self.status_lines(),
            Command::Help(help) => {
                let mut text = String::new();
                // Writing into a String cannot fail.
                let _ = write_help(&mut text, help.topic);
                text.lines().map(str::to_string).collect()
            }
        }
    }

    fn handle_timer(&mut self, timer: TimerId, arm: bool) -> Vec<String> {
        let Some(sequence) = self.autonomous.active_mut() else {
            return vec!["ERR idle no routine running".to_string()];
        };
        if timer.index() >= sequence.timer_count() {
            return vec![format!("ERR timer {timer} not in routine")];
        }

        let (changed, verb) = if arm {
            (sequence.arm_timer(timer), "armed")
        } else {
            (sequence.disarm_timer(timer), "disarmed")
        };
        if changed {
            vec![format!("OK {verb} {timer}")]
        } else {
            vec![format!("OK {timer} already {verb}")]
        }
    }

    fn handle_run(&mut self, kind: RoutineKind) -> Vec<String> {
        match self.autonomous.begin(kind) {
            Ok(()) => {
                self.plant.start_run();
                self.next_event = 0;
                let (actions, timers) = self
                    .autonomous
                    .active()
                    .map_or((0, 0), |sequence| {
                        (sequence.action_count(), sequence.timer_count())
                    });
                vec![format!(
                    "OK run {} actions={actions} timers={timers}",
                    kind.tag()
                )]
            }
            Err(err) => vec![format!("ERR start {err}")],
        }
    }

    fn handle_ticks(&mut self, count: u32) -> Vec<String> {
        if !self.autonomous.is_running() {
            return vec!["ERR idle no routine running".to_string()];
        }

        let mut ran = 0;
        let mut state = LoopState::Running;
        for _ in 0..count {
            let Some(next) = self.autonomous.tick(&mut self.plant, &mut self.display) else {
                break;
            };
            ran += 1;
            state = next;
            if state == LoopState::Terminated {
                break;
            }
            self.plant.step();
        }

        let mut lines = vec![format!(
            "OK ticked {ran} t=+{}ms {}",
            self.plant.clock().now().as_millis(),
            match state {
                LoopState::Running => "running",
                LoopState::Terminated => "terminated",
            }
        )];
        lines.extend(
            self.display
                .lines
                .iter()
                .filter(|line| !line.is_empty())
                .map(|line| format!("  lcd {line}")),
        );
        lines.extend(self.drain_events());
        lines
    }

    fn drain_events(&mut self) -> Vec<String> {
        let Some(sequence) = self.autonomous.latest() else {
            return Vec::new();
        };
        let telemetry = sequence.telemetry();
        let lines = telemetry
            .since(self.next_event)
            .map(|record| format!("  {record}"))
            .collect();
        self.next_event = telemetry.next_id();
        lines
    }

    fn status_lines(&self) -> Vec<String> {
        let snapshot = StatusSnapshot::from_session(&self.autonomous);
        let formatter = StatusFormatter::new(&snapshot);
        let mut lines = Vec::new();

        let mut line = String::new();
        // Writing into a String cannot fail.
        let _ = formatter.write_run_line(&mut line);
        lines.push(line);
        if snapshot.routine.is_some() {
            let mut actions = String::new();
            let _ = formatter.write_actions_line(&mut actions);
            let mut timers = String::new();
            let _ = formatter.write_timers_line(&mut timers);
            let mut outputs = String::new();
            let _ = formatter.write_outputs_line(&mut outputs);
            lines.extend([actions, timers, outputs]);
        }
        lines.push(self.plant_line());
        lines
    }

    fn plant_line(&self) -> String {
        let mut line = String::from("plant");
        for sensor in auton_core::devices::ALL_SENSORS.iter().map(|channel| channel.id) {
            if self.plant.is_offline(sensor) {
                let _ = write!(line, " {sensor}=off");
            } else {
                let _ = write!(line, " {sensor}={}", self.plant.reading(sensor));
            }
        }
        line
    }

    fn record_output(&mut self, elapsed: Duration, lines: &[String]) -> io::Result<()> {
        for line in lines {
            self.transcript
                .append_line(elapsed, TranscriptRole::Emulator, line)?;
        }
        Ok(())
    }
}

struct TranscriptLogger {
    writer: Box<dyn Write>,
}

impl TranscriptLogger {
    fn create(profile: TranscriptProfile) -> io::Result<Self> {
        let path = profile.log_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut logger = Self {
            writer: Box::new(BufWriter::new(file)),
        };

        logger.write_header(profile)?;
        Ok(logger)
    }

    #[cfg(test)]
    fn discard() -> Self {
        Self {
            writer: Box::new(io::sink()),
        }
    }

    fn write_header(&mut self, profile: TranscriptProfile) -> io::Result<()> {
        writeln!(self.writer, "# {}", profile.header())?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

#[cfg(test)]
mod tests {
    use auton_core::devices::{ActuatorId, SensorId};

    use super::*;

    fn session() -> Session {
        Session::with_transcript(TranscriptLogger::discard()).expect("session")
    }

    fn run(session: &mut Session, line: &str) -> Vec<String> {
        session.handle_command(line).expect("transcript write")
    }

    #[test]
    fn ticking_without_a_run_is_an_error() {
        let mut session = session();
        assert_eq!(run(&mut session, "tick"), vec!["ERR idle no routine running"]);
    }

    #[test]
    fn syntax_errors_are_reported() {
        let mut session = session();
        let lines = run(&mut session, "run skills");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ERR syntax unknown routine"));
    }

    #[test]
    fn sonar_approach_stops_short_of_the_wall() {
        let mut session = session();
        assert_eq!(
            run(&mut session, "run sonar"),
            vec!["OK run sonar actions=1 timers=1"]
        );

        let lines = run(&mut session, "advance 2s");
        assert!(lines[0].starts_with("OK ticked 2000 t=+2000ms running"));
        assert!(lines.iter().any(|line| line.contains("arrived a0")));
        assert_eq!(session.plant().output(ActuatorId::DriveForward), 0);
        assert!(session.plant().reading(SensorId::Sonar) <= 70);

        let status = run(&mut session, "status");
        assert!(status[0].starts_with("run sonar state=running"));
        assert_eq!(status[1], "actions (0/1 active)");
    }

    #[test]
    fn cancel_terminates_on_the_next_tick() {
        let mut session = session();
        run(&mut session, "run score");
        run(&mut session, "tick 10");
        assert_eq!(
            run(&mut session, "cancel"),
            vec!["OK cancel requested; run stops on next tick"]
        );

        let lines = run(&mut session, "tick 5");
        assert!(lines[0].starts_with("OK ticked 1 "));
        assert!(lines[0].ends_with("terminated"));
        assert_eq!(session.plant().stop_count(), 1);
        assert!(
            session
                .telemetry_lines()
                .last()
                .is_some_and(|line| line.contains("cancelled after 11 ticks"))
        );

        let status = run(&mut session, "status");
        assert!(status[0].starts_with("run score state=finished"));
    }

    #[test]
    fn score_routine_reaches_the_goal() {
        let mut session = session();
        run(&mut session, "run score");
        run(&mut session, "advance 3s");
        let telemetry = session.telemetry_lines();
        assert!(telemetry.iter().any(|line| line.contains("arrived a0")));
        assert!(telemetry.iter().any(|line| line.contains("arrived a1")));
    }

    #[test]
    fn disarmed_timer_holds_until_rearmed() {
        let mut session = session();
        assert_eq!(run(&mut session, "disarm t0"), vec!["ERR idle no routine running"]);

        run(&mut session, "run blink");
        assert_eq!(run(&mut session, "disarm t0"), vec!["OK disarmed t0"]);
        assert_eq!(run(&mut session, "disarm 0"), vec!["OK t0 already disarmed"]);
        run(&mut session, "tick 5");
        assert_eq!(session.plant().output(ActuatorId::DriveForward), 0);

        assert_eq!(run(&mut session, "arm t0"), vec!["OK armed t0"]);
        run(&mut session, "tick");
        assert_eq!(session.plant().output(ActuatorId::DriveForward), 127);
        assert_eq!(
            run(&mut session, "arm t9"),
            vec!["ERR timer t9 not in routine"]
        );
    }

    #[test]
    fn offline_sensor_is_reported_in_status() {
        let mut session = session();
        assert_eq!(run(&mut session, "sensor claw off"), vec!["OK sensor claw=off"]);
        let status = run(&mut session, "status");
        assert_eq!(status[0], "run none state=idle");
        assert!(status[1].contains("claw=off"));
    }
}
