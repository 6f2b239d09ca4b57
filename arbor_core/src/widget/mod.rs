// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The widget tree and its attribute update pass.
//!
//! [`WidgetTree`] stores widgets in parallel arrays addressed by generational
//! [`WidgetId`] handles. Each widget owns one attribute box per member
//! attribute of its class, and each child slot owns one box per attribute of
//! the slot's container.
//!
//! Mutations go through the tree:
//!
//! - [`set`](WidgetTree::set) stores a literal and, if the value changed,
//!   queues the attribute's reason and runs its callback immediately.
//! - [`bind`](WidgetTree::bind) installs a getter evaluated by each pass.
//! - [`add_child`](WidgetTree::add_child) and
//!   [`remove_from_parent`](WidgetTree::remove_from_parent) are structural
//!   changes: they queue [`CHILD_ORDER`](crate::invalidation::InvalidationReason::CHILD_ORDER)
//!   on the parent and force its registration list to be rebuilt.
//!
//! A pass ([`update_attributes_into`](WidgetTree::update_attributes_into))
//! then reports one combined reason per widget to an
//! [`InvalidationSink`](crate::sink::InvalidationSink).

mod id;
mod tree;
mod update;
mod view;

pub use id::WidgetId;
pub use tree::WidgetTree;
pub use update::FrameInvalidations;
pub use view::WidgetRef;

/// Converts a collection index into a `u32` counter.
#[expect(
    clippy::cast_possible_truncation,
    reason = "widget, slot and registration counts are far below u32::MAX"
)]
const fn index_u32(index: usize) -> u32 {
    index as u32
}
