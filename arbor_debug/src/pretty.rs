// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use arbor_core::trace::{
    AttributeChangedEvent, BindingFailedEvent, InvalidationEvent, PassBeginEvent, PassSummary,
    RegistrationsRebuiltEvent, SkipReason, TraceSink, WidgetSkippedEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn skip_name(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::UpdatesDisabled => "disabled",
        SkipReason::NotVisible => "not-visible",
    }
}

fn slot_suffix(slot: Option<u32>) -> String {
    slot.map_or_else(String::new, |s| format!(" slot={s}"))
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass] #{} widgets={}",
            e.pass_index, e.widgets,
        );
    }

    fn on_widget_skipped(&mut self, e: &WidgetSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] pass={} widget={} {}",
            e.pass_index,
            e.widget,
            skip_name(e.reason),
        );
    }

    fn on_registrations_rebuilt(&mut self, e: &RegistrationsRebuiltEvent) {
        let _ = writeln!(
            self.writer,
            "[registrations] pass={} widget={} count={}",
            e.pass_index, e.widget, e.registrations,
        );
    }

    fn on_attribute_changed(&mut self, e: &AttributeChangedEvent) {
        let tag = if e.baseline { "baseline" } else { "changed" };
        let _ = writeln!(
            self.writer,
            "[{tag}] pass={} widget={} attribute={}{} reason={}",
            e.pass_index,
            e.widget,
            e.attribute.index(),
            slot_suffix(e.slot),
            e.reason,
        );
    }

    fn on_binding_failed(&mut self, e: &BindingFailedEvent) {
        let _ = writeln!(
            self.writer,
            "[failed] pass={} widget={} attribute={}{}",
            e.pass_index,
            e.widget,
            e.attribute.index(),
            slot_suffix(e.slot),
        );
    }

    fn on_invalidation(&mut self, e: &InvalidationEvent) {
        let _ = writeln!(
            self.writer,
            "[invalidate] pass={} widget={} reason={}",
            e.pass_index, e.widget, e.reason,
        );
    }

    fn on_pass_summary(&mut self, s: &PassSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] pass={} visited={} skipped={} evaluated={} changed={} \
             failed={} submitted={}",
            s.pass_index,
            s.widgets_visited,
            s.widgets_skipped,
            s.attributes_evaluated,
            s.attributes_changed,
            s.binding_failures,
            s.submissions,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::class::BaseWidget;
    use arbor_core::invalidation::InvalidationReason;
    use arbor_core::widget::{WidgetId, WidgetTree};

    #[test]
    fn pretty_print_invalidation() {
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<BaseWidget>().unwrap();
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_invalidation(&InvalidationEvent {
            pass_index: 3,
            widget: id,
            reason: InvalidationReason::LAYOUT | InvalidationReason::PAINT,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[invalidate]"), "got: {output}");
        assert!(output.contains("pass=3"), "got: {output}");
        assert!(output.contains("LAYOUT | PAINT"), "got: {output}");
    }

    #[test]
    fn pretty_print_traced_pass() {
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<BaseWidget>().unwrap();
        tree.bind(id, BaseWidget::ENABLED, |_| false);

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        let mut submissions: Vec<(WidgetId, InvalidationReason)> = Vec::new();
        let mut tracer = arbor_core::trace::Tracer::new(&mut sink);
        let _ = tree.update_attributes_traced(&mut submissions, &mut tracer);
        drop(tracer);

        let output = String::from_utf8(sink.into_writer()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 4, "got: {output}");
        assert!(lines[0].starts_with("[pass] #1"), "got: {output}");
        assert!(lines[1].starts_with("[registrations]"), "got: {output}");
        assert!(lines[2].starts_with("[baseline]"), "got: {output}");
        assert!(lines[3].starts_with("[summary]"), "got: {output}");
    }
}
