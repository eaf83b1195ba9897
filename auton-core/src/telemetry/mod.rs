//! Telemetry event catalog and ring buffer shared by firmware and host targets.
//!
//! The core never logs. Instead every sequence records what its timers and
//! actions did into a bounded ring, and the host drains it: the emulator
//! prints the records, the firmware mirrors them to `defmt`. Event kinds
//! encode to compact numeric codes so they can travel over narrow links.

use core::{fmt, time::Duration};

use heapless::{HistoryBuf, OldestOrdered};

use crate::actions::ActionId;
use crate::devices::SensorId;
use crate::routines::RoutineKind;
use crate::timers::TimerId;

/// Monotonic identifier assigned to each record.
pub type EventId = u32;

/// Default number of records retained per sequence.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Discriminated telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    TimerFired(TimerId),
    ActionActivated(ActionId),
    ActionDeactivated(ActionId),
    ActionArrived(ActionId),
    ActionTimedOut(ActionId),
    SensorUnavailable(SensorId),
    Diagnostic,
    SequenceTerminated(RoutineKind),
    Custom(u16),
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::TimerFired(timer) => write!(f, "timer-fired {timer}"),
            TelemetryEventKind::ActionActivated(action) => write!(f, "action-activated {action}"),
            TelemetryEventKind::ActionDeactivated(action) => {
                write!(f, "action-deactivated {action}")
            }
            TelemetryEventKind::ActionArrived(action) => write!(f, "action-arrived {action}"),
            TelemetryEventKind::ActionTimedOut(action) => write!(f, "action-timed-out {action}"),
            TelemetryEventKind::SensorUnavailable(sensor) => {
                write!(f, "sensor-unavailable {sensor}")
            }
            TelemetryEventKind::Diagnostic => f.write_str("diagnostic"),
            TelemetryEventKind::SequenceTerminated(kind) => {
                write!(f, "sequence-terminated {kind}")
            }
            TelemetryEventKind::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

impl TelemetryEventKind {
    const TIMER_FIRED_BASE: u16 = 0x0000;
    const ACTION_ACTIVATED_BASE: u16 = 0x0010;
    const ACTION_DEACTIVATED_BASE: u16 = 0x0020;
    const ACTION_ARRIVED_BASE: u16 = 0x0030;
    const ACTION_TIMED_OUT_BASE: u16 = 0x0040;
    const SENSOR_UNAVAILABLE_BASE: u16 = 0x0050;
    const DIAGNOSTIC_CODE: u16 = 0x0060;
    const SEQUENCE_TERMINATED_BASE: u16 = 0x0070;
    const BLOCK: u16 = 0x0010;

    /// Encodes the event into a compact transport-friendly discriminant.
    #[must_use]
    pub fn to_raw(self) -> u16 {
        match self {
            TelemetryEventKind::TimerFired(timer) => Self::TIMER_FIRED_BASE + u16::from(timer.0),
            TelemetryEventKind::ActionActivated(action) => {
                Self::ACTION_ACTIVATED_BASE + u16::from(action.0)
            }
            TelemetryEventKind::ActionDeactivated(action) => {
                Self::ACTION_DEACTIVATED_BASE + u16::from(action.0)
            }
            TelemetryEventKind::ActionArrived(action) => {
                Self::ACTION_ARRIVED_BASE + u16::from(action.0)
            }
            TelemetryEventKind::ActionTimedOut(action) => {
                Self::ACTION_TIMED_OUT_BASE + u16::from(action.0)
            }
            TelemetryEventKind::SensorUnavailable(sensor) => {
                Self::SENSOR_UNAVAILABLE_BASE + block_offset(sensor.as_index())
            }
            TelemetryEventKind::Diagnostic => Self::DIAGNOSTIC_CODE,
            TelemetryEventKind::SequenceTerminated(kind) => {
                Self::SEQUENCE_TERMINATED_BASE + block_offset(kind.as_index())
            }
            TelemetryEventKind::Custom(code) => code,
        }
    }

    /// Decodes a raw discriminant, falling back to [`TelemetryEventKind::Custom`].
    #[must_use]
    pub fn from_raw(code: u16) -> Self {
        let base = code - code % Self::BLOCK;
        let offset = code % Self::BLOCK;
        let slot = u8::try_from(offset).unwrap_or(u8::MAX);
        let decoded = match base {
            Self::TIMER_FIRED_BASE => Some(TelemetryEventKind::TimerFired(TimerId(slot))),
            Self::ACTION_ACTIVATED_BASE => {
                Some(TelemetryEventKind::ActionActivated(ActionId(slot)))
            }
            Self::ACTION_DEACTIVATED_BASE => {
                Some(TelemetryEventKind::ActionDeactivated(ActionId(slot)))
            }
            Self::ACTION_ARRIVED_BASE => Some(TelemetryEventKind::ActionArrived(ActionId(slot))),
            Self::ACTION_TIMED_OUT_BASE => {
                Some(TelemetryEventKind::ActionTimedOut(ActionId(slot)))
            }
            Self::SENSOR_UNAVAILABLE_BASE => SensorId::from_index(usize::from(offset))
                .map(TelemetryEventKind::SensorUnavailable),
            Self::DIAGNOSTIC_CODE if offset == 0 => Some(TelemetryEventKind::Diagnostic),
            Self::SEQUENCE_TERMINATED_BASE => RoutineKind::from_index(usize::from(offset))
                .map(TelemetryEventKind::SequenceTerminated),
            _ => None,
        };
        decoded.unwrap_or(TelemetryEventKind::Custom(code))
    }
}

fn block_offset(index: usize) -> u16 {
    u16::try_from(index).unwrap_or(TelemetryEventKind::BLOCK - 1)
}

/// Why a sequence left the running state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TerminationReason {
    /// The host cleared autonomous mode.
    Cancelled,
    /// The operator aborted the run.
    Aborted,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Cancelled => f.write_str("cancelled"),
            TerminationReason::Aborted => f.write_str("aborted"),
        }
    }
}

/// Summary attached to a [`TelemetryEventKind::SequenceTerminated`] record.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TerminationTelemetry {
    pub reason: TerminationReason,
    pub ticks: u32,
}

/// Payloads carried alongside telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryPayload {
    None,
    /// Slot that observed the event (sensor failures).
    Action(ActionId),
    /// Raw diagnostic value.
    Value(i32),
    Termination(TerminationTelemetry),
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TelemetryRecord {
    pub id: EventId,
    /// Time since the sequence started.
    pub timestamp: Duration,
    pub event: TelemetryEventKind,
    pub details: TelemetryPayload,
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} +{}ms {}",
            self.id,
            self.timestamp.as_millis(),
            self.event
        )?;
        match self.details {
            TelemetryPayload::None => Ok(()),
            TelemetryPayload::Action(action) => write!(f, " ({action})"),
            TelemetryPayload::Value(value) => write!(f, " value={value}"),
            TelemetryPayload::Termination(details) => {
                write!(f, " {} after {} ticks", details.reason, details.ticks)
            }
        }
    }
}

/// Records telemetry events into a fixed-size ring buffer.
///
/// Once full, the oldest record is overwritten; ids keep increasing so a
/// reader can tell how many were lost.
pub struct TelemetryRecorder<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<TelemetryRecord, CAPACITY>,
    next_event_id: EventId,
}

impl<const CAPACITY: usize> TelemetryRecorder<CAPACITY> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Records in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord> {
        self.ring.oldest_ordered()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Id the next record will receive.
    #[must_use]
    pub const fn next_id(&self) -> EventId {
        self.next_event_id
    }

    /// Records an arbitrary telemetry event with the supplied payload.
    pub fn record(
        &mut self,
        event: TelemetryEventKind,
        payload: TelemetryPayload,
        timestamp: Duration,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
            details: payload,
        });

        id
    }

    /// Records a sensor failure seen by an action.
    pub fn record_sensor_unavailable(
        &mut self,
        sensor: SensorId,
        action: ActionId,
        timestamp: Duration,
    ) -> EventId {
        self.record(
            TelemetryEventKind::SensorUnavailable(sensor),
            TelemetryPayload::Action(action),
            timestamp,
        )
    }

    /// Records a diagnostic value emitted by a timer.
    pub fn record_diagnostic(&mut self, value: i32, timestamp: Duration) -> EventId {
        self.record(
            TelemetryEventKind::Diagnostic,
            TelemetryPayload::Value(value),
            timestamp,
        )
    }

    /// Records the end of a sequence run.
    pub fn record_termination(
        &mut self,
        kind: RoutineKind,
        reason: TerminationReason,
        ticks: u32,
        timestamp: Duration,
    ) -> EventId {
        self.record(
            TelemetryEventKind::SequenceTerminated(kind),
            TelemetryPayload::Termination(TerminationTelemetry { reason, ticks }),
            timestamp,
        )
    }

    /// Iterates over records with ids at or after `since`.
    pub fn since(&self, since: EventId) -> impl Iterator<Item = &TelemetryRecord> + '_ {
        self.ring
            .oldest_ordered()
            .filter(move |record| record.id >= since)
    }

    /// Copies the ring out in chronological order.
    #[cfg(feature = "alloc")]
    #[must_use]
    pub fn to_vec(&self) -> alloc::vec::Vec<TelemetryRecord> {
        self.ring.oldest_ordered().copied().collect()
    }
}

impl<const CAPACITY: usize> Default for TelemetryRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAPACITY: usize> fmt::Debug for TelemetryRecorder<CAPACITY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryRecorder")
            .field("len", &self.ring.len())
            .field("next_event_id", &self.next_event_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_codes_round_trip() {
        let fixtures = [
            (TelemetryEventKind::TimerFired(TimerId(3)), 0x0003),
            (TelemetryEventKind::ActionActivated(ActionId(0)), 0x0010),
            (TelemetryEventKind::ActionDeactivated(ActionId(2)), 0x0022),
            (TelemetryEventKind::ActionArrived(ActionId(15)), 0x003F),
            (TelemetryEventKind::ActionTimedOut(ActionId(1)), 0x0041),
            (
                TelemetryEventKind::SensorUnavailable(SensorId::Sonar),
                0x0055,
            ),
            (TelemetryEventKind::Diagnostic, 0x0060),
            (
                TelemetryEventKind::SequenceTerminated(RoutineKind::ScoreCube),
                0x0071,
            ),
        ];

        for (event, code) in fixtures {
            assert_eq!(event.to_raw(), code);
            assert_eq!(TelemetryEventKind::from_raw(code), event);
        }
    }

    #[test]
    fn unknown_codes_decode_as_custom() {
        assert_eq!(
            TelemetryEventKind::from_raw(0x0058),
            TelemetryEventKind::Custom(0x0058)
        );
        assert_eq!(
            TelemetryEventKind::from_raw(0x0061),
            TelemetryEventKind::Custom(0x0061)
        );
        assert_eq!(
            TelemetryEventKind::from_raw(0x0400),
            TelemetryEventKind::Custom(0x0400)
        );
    }

    #[test]
    fn ring_keeps_newest_records() {
        let mut recorder = TelemetryRecorder::<4>::new();
        for step in 0..6_u8 {
            recorder.record(
                TelemetryEventKind::TimerFired(TimerId(step)),
                TelemetryPayload::None,
                Duration::from_millis(u64::from(step)),
            );
        }

        assert_eq!(recorder.len(), 4);
        assert_eq!(recorder.next_id(), 6);
        let ids: heapless::Vec<EventId, 4> =
            recorder.oldest_first().map(|record| record.id).collect();
        assert_eq!(ids.as_slice(), &[2, 3, 4, 5]);
        assert_eq!(recorder.since(4).count(), 2);
    }

    #[test]
    fn termination_payload_carries_tick_count() {
        let mut recorder = TelemetryRecorder::<8>::new();
        recorder.record_termination(
            RoutineKind::BlinkDemo,
            TerminationReason::Cancelled,
            1_500,
            Duration::from_millis(1_500),
        );

        let record = recorder.latest().copied().expect("record");
        assert_eq!(
            record.event,
            TelemetryEventKind::SequenceTerminated(RoutineKind::BlinkDemo)
        );
        match record.details {
            TelemetryPayload::Termination(details) => {
                assert_eq!(details.reason, TerminationReason::Cancelled);
                assert_eq!(details.ticks, 1_500);
            }
            other => panic!("expected termination payload, got {other:?}"),
        }
    }
}
