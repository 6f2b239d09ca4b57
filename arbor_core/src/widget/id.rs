// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Widget identity.

use core::fmt;

/// Sentinel value indicating "no widget" in index fields.
pub(crate) const INVALID: u32 = u32::MAX;

/// A handle to a widget in a [`WidgetTree`](super::WidgetTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a widget is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl WidgetId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WidgetId({}@gen{})", self.idx, self.generation)
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.idx)
    }
}
