// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The boundary to the external layout and paint scheduler.

use crate::invalidation::InvalidationReason;
use crate::widget::WidgetId;

/// Receives the combined invalidation of each widget after an update pass.
///
/// The update loop calls [`invalidate`](Self::invalidate) at most once per
/// widget per pass, and never with an empty reason. What to recompute is up
/// to the implementation: attribute updates never run measure, arrange or
/// paint themselves.
pub trait InvalidationSink {
    /// Schedules the recomputation described by `reason` for `widget`.
    fn invalidate(&mut self, widget: WidgetId, reason: InvalidationReason);
}

/// Collects submissions in call order.
impl InvalidationSink for Vec<(WidgetId, InvalidationReason)> {
    fn invalidate(&mut self, widget: WidgetId, reason: InvalidationReason) {
        self.push((widget, reason));
    }
}

impl<S: InvalidationSink + ?Sized> InvalidationSink for &mut S {
    fn invalidate(&mut self, widget: WidgetId, reason: InvalidationReason) {
        (**self).invalidate(widget, reason);
    }
}
