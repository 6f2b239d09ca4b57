// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation reasons and reason providers.
//!
//! An [`InvalidationReason`] classifies what an external scheduler has to
//! recompute for a widget. Attributes carry a [`ReasonProvider`] that yields
//! the reason to report when their value changes.
//!
//! # Legality
//!
//! The attribute update loop assumes that a widget's children and its list of
//! registered attributes stay fixed for the whole pass. An attribute therefore
//! may never report [`CHILD_ORDER`](InvalidationReason::CHILD_ORDER) or
//! [`ATTRIBUTE_REGISTRATION`](InvalidationReason::ATTRIBUTE_REGISTRATION).
//! Computed providers declare an upper bound so that legality can be checked
//! when the attribute is registered rather than when it first fires.

use core::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::widget::WidgetRef;

bitflags! {
    /// Kinds of recomputation requested for a widget.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct InvalidationReason: u8 {
        /// Desired size or arrangement changed.
        const LAYOUT = 1 << 0;
        /// Appearance changed; geometry is unaffected.
        const PAINT = 1 << 1;
        /// Whether the widget is volatile (repainted every frame) changed.
        const VOLATILITY = 1 << 2;
        /// Children were added, removed, or reordered.
        const CHILD_ORDER = 1 << 3;
        /// Render transform changed.
        const RENDER_TRANSFORM = 1 << 4;
        /// Visibility changed.
        const VISIBILITY = 1 << 5;
        /// The set of registered (bound) attributes changed.
        const ATTRIBUTE_REGISTRATION = 1 << 6;
        /// Cached prepass data must be recomputed.
        const PREPASS = 1 << 7;

        /// Paint plus volatility.
        const PAINT_AND_VOLATILITY = Self::PAINT.bits() | Self::VOLATILITY.bits();
        /// Layout plus volatility.
        const LAYOUT_AND_VOLATILITY = Self::LAYOUT.bits() | Self::VOLATILITY.bits();
    }
}

impl InvalidationReason {
    /// No invalidation.
    pub const NONE: Self = Self::empty();

    /// Reasons an attribute may never report.
    pub const ATTRIBUTE_ILLEGAL: Self = Self::CHILD_ORDER.union(Self::ATTRIBUTE_REGISTRATION);

    /// Returns `self | other`.
    #[inline]
    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        self.union(other)
    }

    /// Returns whether an attribute may carry this reason.
    #[inline]
    #[must_use]
    pub const fn is_attribute_legal(self) -> bool {
        !self.intersects(Self::ATTRIBUTE_ILLEGAL)
    }
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("NONE")
        } else {
            bitflags::parser::to_writer(self, f)
        }
    }
}

/// Signature of a computed reason provider.
pub type ReasonFn = dyn Fn(&WidgetRef<'_>) -> InvalidationReason + Send + Sync;

/// Produces the reason an attribute reports when its value changes.
#[derive(Clone)]
pub enum ReasonProvider {
    /// The same reason every time.
    Fixed(InvalidationReason),
    /// A reason computed from the owning widget.
    ///
    /// The output is intersected with `bound`, so the provider can never
    /// report a reason outside the bound that was checked at registration.
    Computed {
        /// Every reason the getter may return.
        bound: InvalidationReason,
        /// The getter.
        getter: Arc<ReasonFn>,
    },
}

impl ReasonProvider {
    /// Creates a computed provider limited to `bound`.
    pub fn computed<F>(bound: InvalidationReason, getter: F) -> Self
    where
        F: Fn(&WidgetRef<'_>) -> InvalidationReason + Send + Sync + 'static,
    {
        Self::Computed {
            bound,
            getter: Arc::new(getter),
        }
    }

    /// Returns the widest reason this provider can produce.
    #[must_use]
    pub fn upper_bound(&self) -> InvalidationReason {
        match self {
            Self::Fixed(reason) => *reason,
            Self::Computed { bound, .. } => *bound,
        }
    }

    /// Returns whether every possible output is legal for an attribute.
    #[must_use]
    pub fn is_attribute_legal(&self) -> bool {
        self.upper_bound().is_attribute_legal()
    }

    /// Resolves the reason for `widget`.
    #[must_use]
    pub fn get(&self, widget: &WidgetRef<'_>) -> InvalidationReason {
        match self {
            Self::Fixed(reason) => *reason,
            Self::Computed { bound, getter } => getter(widget) & *bound,
        }
    }
}

impl From<InvalidationReason> for ReasonProvider {
    fn from(reason: InvalidationReason) -> Self {
        Self::Fixed(reason)
    }
}

impl fmt::Debug for ReasonProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(reason) => f.debug_tuple("Fixed").field(reason).finish(),
            Self::Computed { bound, .. } => f
                .debug_struct("Computed")
                .field("bound", bound)
                .finish_non_exhaustive(),
        }
    }
}
