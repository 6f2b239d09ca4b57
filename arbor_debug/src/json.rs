// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes them as a JSON array with one object per event. Every object
//! carries `"event"` and `"pass"` keys; reasons are written in their
//! `LAYOUT | PAINT` display form.

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, RecordedWidget, decode};

/// Exports recorded events as a JSON array.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PassBegin(e) => {
                events.push(json!({
                    "event": "PassBegin",
                    "pass": e.pass_index,
                    "widgets": e.widgets,
                }));
            }
            RecordedEvent::WidgetSkipped {
                pass_index,
                widget,
                reason,
            } => {
                events.push(json!({
                    "event": "WidgetSkipped",
                    "pass": pass_index,
                    "widget": widget_json(widget),
                    "reason": format!("{reason:?}"),
                }));
            }
            RecordedEvent::RegistrationsRebuilt {
                pass_index,
                widget,
                registrations,
            } => {
                events.push(json!({
                    "event": "RegistrationsRebuilt",
                    "pass": pass_index,
                    "widget": widget_json(widget),
                    "registrations": registrations,
                }));
            }
            RecordedEvent::AttributeChanged {
                pass_index,
                widget,
                attribute,
                slot,
                reason,
                baseline,
            } => {
                events.push(json!({
                    "event": "AttributeChanged",
                    "pass": pass_index,
                    "widget": widget_json(widget),
                    "attribute": attribute,
                    "slot": slot,
                    "reason": reason.to_string(),
                    "baseline": baseline,
                }));
            }
            RecordedEvent::BindingFailed {
                pass_index,
                widget,
                attribute,
                slot,
            } => {
                events.push(json!({
                    "event": "BindingFailed",
                    "pass": pass_index,
                    "widget": widget_json(widget),
                    "attribute": attribute,
                    "slot": slot,
                }));
            }
            RecordedEvent::Invalidation {
                pass_index,
                widget,
                reason,
            } => {
                events.push(json!({
                    "event": "Invalidation",
                    "pass": pass_index,
                    "widget": widget_json(widget),
                    "reason": reason.to_string(),
                }));
            }
            RecordedEvent::PassSummary(s) => {
                events.push(json!({
                    "event": "PassSummary",
                    "pass": s.pass_index,
                    "widgets_visited": s.widgets_visited,
                    "widgets_skipped": s.widgets_skipped,
                    "attributes_evaluated": s.attributes_evaluated,
                    "attributes_changed": s.attributes_changed,
                    "binding_failures": s.binding_failures,
                    "submissions": s.submissions,
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn widget_json(widget: RecordedWidget) -> Value {
    json!({
        "index": widget.index,
        "generation": widget.generation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use arbor_core::class::BaseWidget;
    use arbor_core::invalidation::InvalidationReason;
    use arbor_core::trace::{PassBeginEvent, PassSummary, TraceSink, Tracer};
    use arbor_core::visibility::Visibility;
    use arbor_core::widget::{WidgetId, WidgetTree};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 7,
            widgets: 3,
        });
        rec.on_pass_summary(&PassSummary {
            pass_index: 7,
            widgets_visited: 2,
            ..PassSummary::default()
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["event"], "PassBegin");
        assert_eq!(parsed[0]["widgets"], 3);
        assert_eq!(parsed[1]["event"], "PassSummary");
        assert_eq!(parsed[1]["pass"], 7);
        assert_eq!(parsed[1]["widgets_visited"], 2);
    }

    #[test]
    fn export_traced_invalidation() {
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<BaseWidget>().unwrap();
        assert!(tree.set(id, BaseWidget::VISIBILITY, Visibility::Collapsed));

        let mut rec = RecorderSink::new();
        let mut sink: Vec<(WidgetId, InvalidationReason)> = Vec::new();
        let mut tracer = Tracer::new(&mut rec);
        let _ = tree.update_attributes_traced(&mut sink, &mut tracer);
        drop(tracer);

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        let invalidation = parsed
            .iter()
            .find(|e| e["event"] == "Invalidation")
            .unwrap();
        assert_eq!(invalidation["reason"], "VISIBILITY");
        assert_eq!(invalidation["widget"]["index"], id.index());
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
