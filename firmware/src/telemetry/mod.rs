//! Log mirror for the sequencer's telemetry ring.
//!
//! Records stay in the core's ring; this module forwards the ones the log has
//! not seen yet to `defmt` on the controller and to stdout on host builds.

use auton_core::sequence::Sequence;
use auton_core::telemetry::{EventId, TelemetryRecorder};

/// Tracks which telemetry records already went to the log.
#[derive(Debug, Default)]
pub struct TelemetryMirror {
    next: EventId,
}

impl TelemetryMirror {
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Starts over for a fresh sequence; its ids begin at zero again.
    pub fn restart(&mut self) {
        self.next = 0;
    }

    /// Logs every record newer than the last call. Returns how many were
    /// emitted.
    pub fn drain<const CAPACITY: usize>(&mut self, recorder: &TelemetryRecorder<CAPACITY>) -> usize {
        let oldest = recorder.oldest_first().next().map_or(self.next, |record| record.id);
        if oldest > self.next {
            emit_dropped(oldest - self.next);
        }

        let mut emitted = 0;
        for record in recorder.since(self.next) {
            emit_record(record);
            emitted += 1;
        }
        self.next = recorder.next_id();
        emitted
    }

    pub fn drain_sequence(&mut self, sequence: &Sequence) -> usize {
        self.drain(sequence.telemetry())
    }
}

#[cfg(target_os = "none")]
fn emit_record(record: &auton_core::telemetry::TelemetryRecord) {
    defmt::info!("telemetry:auton {}", defmt::Display2Format(record));
}

#[cfg(not(target_os = "none"))]
fn emit_record(record: &auton_core::telemetry::TelemetryRecord) {
    println!("telemetry:auton {record}");
}

#[cfg(target_os = "none")]
fn emit_dropped(count: EventId) {
    defmt::warn!("telemetry:auton {} records overwritten", count);
}

#[cfg(not(target_os = "none"))]
fn emit_dropped(count: EventId) {
    println!("telemetry:auton {count} records overwritten");
}

#[cfg(target_os = "none")]
pub fn log_status(clock: &str, line: &str) {
    defmt::info!("status:auton {} | {}", clock, line);
}

#[cfg(not(target_os = "none"))]
pub fn log_status(clock: &str, line: &str) {
    println!("status:auton {clock} | {line}");
}
