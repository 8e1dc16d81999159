//! # Diagnostic Events
//!
//! Side-channel for condition transitions and gain changes. The detector
//! core only returns values; [`DelayController`](crate::controller::DelayController)
//! turns them into [`ControllerEvent`]s and hands them to an [`EventSink`].
//! Where they end up (tracing, a test buffer, nowhere) is the host's call.

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::congestion::{Condition, Detection, GainAdjustment, Transition};

/// Metrics attached to every classified sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConditionSnapshot {
    pub condition: Condition,
    pub rtt: u32,
    pub target: u32,
    pub setpoint: u32,
    pub gain: f64,
    pub min_rtt: u32,
    pub avg_rtt: u32,
}

impl From<&Detection> for ConditionSnapshot {
    fn from(d: &Detection) -> Self {
        ConditionSnapshot {
            condition: d.condition,
            rtt: d.rtt,
            target: d.target,
            setpoint: d.setpoint,
            gain: d.gain,
            min_rtt: d.min_rtt,
            avg_rtt: d.avg_rtt,
        }
    }
}

/// A diagnostic event emitted by the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// Parameters were (re)applied.
    Configured {
        enabled: bool,
        gain: f64,
        target: u32,
    },
    /// A gain tuning pass completed.
    GainAdjusted(GainAdjustment),
    /// The sample produced a GOOD, NORMAL or BAD transition.
    Transition(ConditionSnapshot),
    /// The sample was classified but nothing changed.
    Unchanged(ConditionSnapshot),
}

impl ControllerEvent {
    /// Events for one detection step, in emission order.
    pub fn from_detection(d: &Detection) -> impl Iterator<Item = ControllerEvent> {
        let gain = d.gain_adjustment.map(ControllerEvent::GainAdjusted);
        let snapshot = ConditionSnapshot::from(d);
        let classified = match d.transition {
            Transition::Unchanged => ControllerEvent::Unchanged(snapshot),
            _ => ControllerEvent::Transition(snapshot),
        };
        gain.into_iter().chain(std::iter::once(classified))
    }
}

/// Receiver for controller diagnostics.
pub trait EventSink {
    fn emit(&mut self, event: ControllerEvent);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: ControllerEvent) {
        (**self).emit(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: ControllerEvent) {
        (**self).emit(event)
    }
}

// ─── Sinks ──────────────────────────────────────────────────────────────────

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    /// Conversation id attached to every record.
    pub conv: u32,
}

impl TracingSink {
    pub fn new(conv: u32) -> Self {
        TracingSink { conv }
    }
}

impl EventSink for TracingSink {
    fn emit(&mut self, event: ControllerEvent) {
        let conv = self.conv;
        match event {
            ControllerEvent::Configured {
                enabled,
                gain,
                target,
            } => {
                info!(conv, enabled, gain, target, "delay controller configured");
            }
            ControllerEvent::GainAdjusted(adj) => {
                debug!(
                    conv,
                    previous = adj.previous,
                    gain = adj.current,
                    avg_rtt = adj.avg_rtt,
                    "gain adjusted"
                );
            }
            ControllerEvent::Transition(s) => {
                debug!(
                    conv,
                    condition = s.condition.as_str(),
                    rtt = s.rtt,
                    target = s.target,
                    setpoint = s.setpoint,
                    gain = s.gain,
                    min_rtt = s.min_rtt,
                    avg_rtt = s.avg_rtt,
                    "condition detected"
                );
            }
            ControllerEvent::Unchanged(s) => {
                trace!(
                    conv,
                    condition = s.condition.as_str(),
                    rtt = s.rtt,
                    setpoint = s.setpoint,
                    gain = s.gain,
                    "condition unchanged"
                );
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: ControllerEvent) {}
}

/// Buffers events in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<ControllerEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ControllerEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> impl Iterator<Item = ControllerEvent> + '_ {
        self.events.drain(..)
    }

    /// Conditions of every GOOD/NORMAL/BAD transition, in order.
    pub fn transitions(&self) -> Vec<Condition> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ControllerEvent::Transition(s) => Some(s.condition),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: ControllerEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(transition: Transition, adj: Option<GainAdjustment>) -> Detection {
        Detection {
            transition,
            condition: Condition::Normal,
            rtt: 120,
            target: 100,
            setpoint: 101,
            gain: 2.0,
            min_rtt: 50,
            avg_rtt: 110,
            gain_adjustment: adj,
        }
    }

    #[test]
    fn unchanged_detection_yields_single_event() {
        let d = detection(Transition::Unchanged, None);
        let events: Vec<_> = ControllerEvent::from_detection(&d).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ControllerEvent::Unchanged(_)));
    }

    #[test]
    fn gain_adjustment_precedes_transition() {
        let adj = GainAdjustment {
            previous: 2.0,
            current: 1.6,
            avg_rtt: 110,
        };
        let d = detection(Transition::Normal, Some(adj));
        let events: Vec<_> = ControllerEvent::from_detection(&d).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ControllerEvent::GainAdjusted(adj));
        assert!(matches!(events[1], ControllerEvent::Transition(_)));
    }

    #[test]
    fn recording_sink_collects_transitions() {
        let mut sink = RecordingSink::new();
        for e in ControllerEvent::from_detection(&detection(Transition::Normal, None)) {
            sink.emit(e);
        }
        for e in ControllerEvent::from_detection(&detection(Transition::Unchanged, None)) {
            sink.emit(e);
        }
        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.transitions(), vec![Condition::Normal]);
        assert_eq!(sink.drain().count(), 2);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = ControllerEvent::Configured {
            enabled: true,
            gain: 2.0,
            target: 100,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "configured");
        assert_eq!(json["target"], 100);

        let snap = ControllerEvent::Transition(ConditionSnapshot::from(&detection(
            Transition::Bad,
            None,
        )));
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["event"], "transition");
        assert_eq!(json["condition"], "normal");
    }

    #[test]
    fn tracing_sink_does_not_panic() {
        let mut sink = TracingSink::new(7);
        for e in ControllerEvent::from_detection(&detection(Transition::Good, None)) {
            sink.emit(e);
        }
        sink.emit(ControllerEvent::Configured {
            enabled: false,
            gain: 1.0,
            target: 0,
        });
    }
}
