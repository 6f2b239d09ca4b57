// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the attribute update pass.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! update loop calls at each stage. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`PassSummary`] is returned by every pass regardless of the feature.

use crate::descriptor::AttributeKey;
use crate::invalidation::InvalidationReason;
use crate::widget::WidgetId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a widget's bindings were not evaluated in a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Automatic attribute updates are disabled for the widget.
    UpdatesDisabled,
    /// The widget is not visible and has no visibility-affecting bindings.
    NotVisible,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an update pass starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassBeginEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Number of live widgets.
    pub widgets: u32,
}

/// Emitted when a widget's bindings are not evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WidgetSkippedEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The skipped widget.
    pub widget: WidgetId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Emitted after a widget's registration list was rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistrationsRebuiltEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The widget.
    pub widget: WidgetId,
    /// Number of bound attributes now registered.
    pub registrations: u32,
}

/// Emitted when a binding produced a new value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeChangedEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Owning widget.
    pub widget: WidgetId,
    /// The attribute.
    pub attribute: AttributeKey,
    /// Child slot index for a contained attribute.
    pub slot: Option<u32>,
    /// Reason contributed to the widget's accumulator.
    ///
    /// Empty when `baseline` is set.
    pub reason: InvalidationReason,
    /// Whether this was the first evaluation after a bind.
    pub baseline: bool,
}

/// Emitted when a binding failed to evaluate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingFailedEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Owning widget.
    pub widget: WidgetId,
    /// The attribute.
    pub attribute: AttributeKey,
    /// Child slot index for a contained attribute.
    pub slot: Option<u32>,
}

/// Emitted when a widget's combined reason is submitted to the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidationEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// The widget.
    pub widget: WidgetId,
    /// Combined reason.
    pub reason: InvalidationReason,
}

/// Counters of one update pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Pass counter.
    pub pass_index: u64,
    /// Widgets whose registrations were considered.
    pub widgets_visited: u32,
    /// Widgets whose bindings were not evaluated.
    pub widgets_skipped: u32,
    /// Bindings evaluated.
    pub attributes_evaluated: u32,
    /// Bindings that produced a different value (baselines excluded).
    pub attributes_changed: u32,
    /// Bindings that failed.
    pub binding_failures: u32,
    /// Calls made to the invalidation sink.
    pub submissions: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives update-pass events.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when a pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a widget's bindings are skipped.
    fn on_widget_skipped(&mut self, e: &WidgetSkippedEvent) {
        _ = e;
    }

    /// Called after a registration list rebuild.
    fn on_registrations_rebuilt(&mut self, e: &RegistrationsRebuiltEvent) {
        _ = e;
    }

    /// Called when a binding produced a new value.
    fn on_attribute_changed(&mut self, e: &AttributeChangedEvent) {
        _ = e;
    }

    /// Called when a binding failed.
    fn on_binding_failed(&mut self, e: &BindingFailedEvent) {
        _ = e;
    }

    /// Called when a reason is submitted to the invalidation sink.
    fn on_invalidation(&mut self, e: &InvalidationEvent) {
        _ = e;
    }

    /// Called when a pass ends.
    fn on_pass_summary(&mut self, s: &PassSummary) {
        _ = s;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`WidgetSkippedEvent`].
    #[inline]
    pub fn widget_skipped(&mut self, e: &WidgetSkippedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_widget_skipped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RegistrationsRebuiltEvent`].
    #[inline]
    pub fn registrations_rebuilt(&mut self, e: &RegistrationsRebuiltEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_registrations_rebuilt(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AttributeChangedEvent`].
    #[inline]
    pub fn attribute_changed(&mut self, e: &AttributeChangedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_attribute_changed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BindingFailedEvent`].
    #[inline]
    pub fn binding_failed(&mut self, e: &BindingFailedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_binding_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`InvalidationEvent`].
    #[inline]
    pub fn invalidation(&mut self, e: &InvalidationEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_invalidation(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassSummary`].
    #[inline]
    pub fn pass_summary(&mut self, s: &PassSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_pass_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
