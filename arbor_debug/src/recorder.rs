// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Widget handles and attribute keys are stored as raw indices, so a
//! recording can be inspected without the tree that produced it.

use arbor_core::invalidation::InvalidationReason;
use arbor_core::trace::{
    AttributeChangedEvent, BindingFailedEvent, InvalidationEvent, PassBeginEvent, PassSummary,
    RegistrationsRebuiltEvent, SkipReason, TraceSink, WidgetSkippedEvent,
};
use arbor_core::widget::WidgetId;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_WIDGET_SKIPPED: u8 = 2;
const TAG_REGISTRATIONS_REBUILT: u8 = 3;
const TAG_ATTRIBUTE_CHANGED: u8 = 4;
const TAG_BINDING_FAILED: u8 = 5;
const TAG_INVALIDATION: u8 = 6;
const TAG_PASS_SUMMARY: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u32(&mut self, v: Option<u32>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u32(val);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }

    fn write_widget(&mut self, id: WidgetId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_reason(&mut self, reason: InvalidationReason) {
        self.write_u8(reason.bits());
    }

    fn write_skip(&mut self, reason: SkipReason) {
        self.write_u8(match reason {
            SkipReason::UpdatesDisabled => 0,
            SkipReason::NotVisible => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_u64(e.pass_index);
        self.write_u32(e.widgets);
    }

    fn on_widget_skipped(&mut self, e: &WidgetSkippedEvent) {
        self.write_u8(TAG_WIDGET_SKIPPED);
        self.write_u64(e.pass_index);
        self.write_widget(e.widget);
        self.write_skip(e.reason);
    }

    fn on_registrations_rebuilt(&mut self, e: &RegistrationsRebuiltEvent) {
        self.write_u8(TAG_REGISTRATIONS_REBUILT);
        self.write_u64(e.pass_index);
        self.write_widget(e.widget);
        self.write_u32(e.registrations);
    }

    fn on_attribute_changed(&mut self, e: &AttributeChangedEvent) {
        self.write_u8(TAG_ATTRIBUTE_CHANGED);
        self.write_u64(e.pass_index);
        self.write_widget(e.widget);
        self.write_u32(e.attribute.index());
        self.write_option_u32(e.slot);
        self.write_reason(e.reason);
        self.write_u8(u8::from(e.baseline));
    }

    fn on_binding_failed(&mut self, e: &BindingFailedEvent) {
        self.write_u8(TAG_BINDING_FAILED);
        self.write_u64(e.pass_index);
        self.write_widget(e.widget);
        self.write_u32(e.attribute.index());
        self.write_option_u32(e.slot);
    }

    fn on_invalidation(&mut self, e: &InvalidationEvent) {
        self.write_u8(TAG_INVALIDATION);
        self.write_u64(e.pass_index);
        self.write_widget(e.widget);
        self.write_reason(e.reason);
    }

    fn on_pass_summary(&mut self, s: &PassSummary) {
        self.write_u8(TAG_PASS_SUMMARY);
        self.write_u64(s.pass_index);
        self.write_u32(s.widgets_visited);
        self.write_u32(s.widgets_skipped);
        self.write_u32(s.attributes_evaluated);
        self.write_u32(s.attributes_changed);
        self.write_u32(s.binding_failures);
        self.write_u32(s.submissions);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A widget handle as stored in a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordedWidget {
    /// Slot index of the widget.
    pub index: u32,
    /// Generation of the slot when the event was recorded.
    pub generation: u32,
}

impl From<WidgetId> for RecordedWidget {
    fn from(id: WidgetId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A widget was not evaluated.
    WidgetSkipped {
        /// Pass counter.
        pass_index: u64,
        /// The skipped widget.
        widget: RecordedWidget,
        /// Why it was skipped.
        reason: SkipReason,
    },
    /// A widget's registration list was rebuilt.
    RegistrationsRebuilt {
        /// Pass counter.
        pass_index: u64,
        /// The widget.
        widget: RecordedWidget,
        /// Length of the new list.
        registrations: u32,
    },
    /// A bound attribute stored a new value.
    AttributeChanged {
        /// Pass counter.
        pass_index: u64,
        /// The owning widget.
        widget: RecordedWidget,
        /// Raw attribute key.
        attribute: u32,
        /// Slot index for contained attributes.
        slot: Option<u32>,
        /// Reason contributed by the change.
        reason: InvalidationReason,
        /// Whether this was the silent first evaluation.
        baseline: bool,
    },
    /// A binding returned an error.
    BindingFailed {
        /// Pass counter.
        pass_index: u64,
        /// The owning widget.
        widget: RecordedWidget,
        /// Raw attribute key.
        attribute: u32,
        /// Slot index for contained attributes.
        slot: Option<u32>,
    },
    /// A combined reason was submitted to the sink.
    Invalidation {
        /// Pass counter.
        pass_index: u64,
        /// The invalidated widget.
        widget: RecordedWidget,
        /// Combined reason.
        reason: InvalidationReason,
    },
    /// A [`PassSummary`].
    PassSummary(PassSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_option_u32(&mut self) -> Option<Option<u32>> {
        let present = self.read_u8()?;
        let val = self.read_u32()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_widget(&mut self) -> Option<RecordedWidget> {
        Some(RecordedWidget {
            index: self.read_u32()?,
            generation: self.read_u32()?,
        })
    }

    fn read_reason(&mut self) -> Option<InvalidationReason> {
        Some(InvalidationReason::from_bits_retain(self.read_u8()?))
    }

    fn read_skip(&mut self) -> Option<SkipReason> {
        match self.read_u8()? {
            0 => Some(SkipReason::UpdatesDisabled),
            1 => Some(SkipReason::NotVisible),
            _ => None,
        }
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin(PassBeginEvent {
            pass_index: self.read_u64()?,
            widgets: self.read_u32()?,
        }))
    }

    fn decode_widget_skipped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::WidgetSkipped {
            pass_index: self.read_u64()?,
            widget: self.read_widget()?,
            reason: self.read_skip()?,
        })
    }

    fn decode_registrations_rebuilt(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RegistrationsRebuilt {
            pass_index: self.read_u64()?,
            widget: self.read_widget()?,
            registrations: self.read_u32()?,
        })
    }

    fn decode_attribute_changed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AttributeChanged {
            pass_index: self.read_u64()?,
            widget: self.read_widget()?,
            attribute: self.read_u32()?,
            slot: self.read_option_u32()?,
            reason: self.read_reason()?,
            baseline: self.read_u8()? != 0,
        })
    }

    fn decode_binding_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BindingFailed {
            pass_index: self.read_u64()?,
            widget: self.read_widget()?,
            attribute: self.read_u32()?,
            slot: self.read_option_u32()?,
        })
    }

    fn decode_invalidation(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Invalidation {
            pass_index: self.read_u64()?,
            widget: self.read_widget()?,
            reason: self.read_reason()?,
        })
    }

    fn decode_pass_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassSummary(PassSummary {
            pass_index: self.read_u64()?,
            widgets_visited: self.read_u32()?,
            widgets_skipped: self.read_u32()?,
            attributes_evaluated: self.read_u32()?,
            attributes_changed: self.read_u32()?,
            binding_failures: self.read_u32()?,
            submissions: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_WIDGET_SKIPPED => self.decode_widget_skipped(),
            TAG_REGISTRATIONS_REBUILT => self.decode_registrations_rebuilt(),
            TAG_ATTRIBUTE_CHANGED => self.decode_attribute_changed(),
            TAG_BINDING_FAILED => self.decode_binding_failed(),
            TAG_INVALIDATION => self.decode_invalidation(),
            TAG_PASS_SUMMARY => self.decode_pass_summary(),
            _ => None,
        }
    }
}
