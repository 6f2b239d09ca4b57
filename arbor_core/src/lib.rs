// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute-driven invalidation metadata for retained widget trees.
//!
//! `arbor_core` lets each widget class declare *attributes*: data fields whose
//! mutation must trigger a well-defined, minimal recomputation (layout, paint,
//! visibility) in the owning widget. Declarations compose across a class
//! hierarchy, update in a deterministic order each pass, and produce one
//! combined [`InvalidationReason`](invalidation::InvalidationReason) per
//! widget for an external scheduler.
//!
//! # Architecture
//!
//! ```text
//!   WidgetClass::register_attributes()
//!       │  (once per class, process-wide)
//!       ▼
//!   AttributeInitializer ──► AttributeDescriptor ──► resolve() ──► ClassMetadata
//!                                                                      │
//!                 ┌────────────────────────────────────────────────────┘
//!                 ▼
//!   WidgetTree::create_widget() ──► Attribute<T> boxes (literal or bound)
//!                 │
//!                 ▼
//!   WidgetTree::update_attributes_into() ──► InvalidationSink::invalidate()
//! ```
//!
//! **[`invalidation`]** — The [`InvalidationReason`](invalidation::InvalidationReason)
//! bitmask, its attribute-legality rule, and fixed or computed reason
//! providers.
//!
//! **[`descriptor`]** — Per-class attribute metadata, the initializer API used
//! by a class's registration routine, and prerequisite-ordered resolution.
//!
//! **[`class`]** — The [`WidgetClass`](class::WidgetClass) trait and the
//! memoized, process-scoped [`ClassMetadata`](class::ClassMetadata) registry.
//!
//! **[`attribute`]** — Runtime value boxes and typed handles.
//!
//! **[`widget`]** — Struct-of-arrays widget tree with generational handles
//! and the per-pass attribute update loop.
//!
//! **[`sink`]** — The [`InvalidationSink`](sink::InvalidationSink) boundary
//! that receives one combined reason per widget per pass.
//!
//! **[`dirty`]** — Per-reason `understory_dirty` channels used by
//! [`WidgetTree::update_attributes`](widget::WidgetTree::update_attributes).
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! update-pass instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod attribute;
pub mod class;
pub mod descriptor;
pub mod dirty;
pub mod error;
pub mod invalidation;
pub mod sink;
pub mod trace;
pub mod visibility;
pub mod widget;
