// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! [`WidgetTree::update_attributes`](crate::widget::WidgetTree::update_attributes)
//! records every submitted [`InvalidationReason`] in an
//! [`understory_dirty`] tracker with one channel per reason bit, then drains
//! each channel into
//! [`FrameInvalidations`](crate::widget::FrameInvalidations).
//!
//! # Propagation semantics
//!
//! - **Propagating**: on [`LAYOUT`] every parent depends on its children, and
//!   marks use [`EagerPolicy`](understory_dirty::EagerPolicy). A child whose
//!   desired size changes invalidates the layout of every ancestor.
//! - **Local-only**: every other channel reports only the widget that
//!   submitted the reason.

use understory_dirty::Channel;

use crate::invalidation::InvalidationReason;

/// Layout must be recomputed; propagates to ancestors.
pub const LAYOUT: Channel = Channel::new(0);

/// Paint must be recomputed.
pub const PAINT: Channel = Channel::new(1);

/// Volatility changed.
pub const VOLATILITY: Channel = Channel::new(2);

/// Child order changed.
pub const CHILD_ORDER: Channel = Channel::new(3);

/// Render transform changed.
pub const RENDER_TRANSFORM: Channel = Channel::new(4);

/// Visibility changed.
pub const VISIBILITY: Channel = Channel::new(5);

/// Attribute registrations changed.
pub const ATTRIBUTE_REGISTRATION: Channel = Channel::new(6);

/// Prepass must run again.
pub const PREPASS: Channel = Channel::new(7);

/// Reason bit to channel mapping.
pub const CHANNELS: [(InvalidationReason, Channel); 8] = [
    (InvalidationReason::LAYOUT, LAYOUT),
    (InvalidationReason::PAINT, PAINT),
    (InvalidationReason::VOLATILITY, VOLATILITY),
    (InvalidationReason::CHILD_ORDER, CHILD_ORDER),
    (InvalidationReason::RENDER_TRANSFORM, RENDER_TRANSFORM),
    (InvalidationReason::VISIBILITY, VISIBILITY),
    (InvalidationReason::ATTRIBUTE_REGISTRATION, ATTRIBUTE_REGISTRATION),
    (InvalidationReason::PREPASS, PREPASS),
];
