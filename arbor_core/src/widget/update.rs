// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-pass attribute update loop.
//!
//! For every live widget a pass:
//!
//! 1. Takes the reasons queued since the last pass (literal sets and
//!    structural changes). These are flushed even when automatic updates are
//!    disabled for the widget.
//! 2. Rebuilds the widget's registration list if a bind, unbind, or
//!    structural change marked it dirty. The list holds the bound attributes
//!    in the class's resolved order, with each container's slots expanded in
//!    slot order.
//! 3. Evaluates the registrations unless updates are disabled, or the widget
//!    is not visible and none of its registrations affects visibility. While
//!    the widget is not visible only the visibility-affecting registrations
//!    are evaluated.
//! 4. Submits the combined reason to the [`InvalidationSink`] at most once.
//!
//! Evaluation is split into a poll against a shared view of the tree and a
//! store, so that getters see every value committed earlier in the same pass.
//! A failing getter is logged and keeps its previous value; the rest of the
//! widget's registrations still run.

use understory_dirty::EagerPolicy;

use super::tree::{Registration, WidgetTree};
use super::view::WidgetRef;
use super::{WidgetId, index_u32};
use crate::attribute::Polled;
use crate::descriptor::OrderItem;
use crate::dirty;
use crate::invalidation::InvalidationReason;
use crate::sink::InvalidationSink;
use crate::trace::{
    AttributeChangedEvent, BindingFailedEvent, InvalidationEvent, PassBeginEvent, PassSummary,
    RegistrationsRebuiltEvent, SkipReason, Tracer, WidgetSkippedEvent,
};

/// Widgets invalidated by one [`WidgetTree::update_attributes`] call, per
/// reason.
///
/// Each list holds raw widget slot indices (see [`WidgetId::index`]) in
/// ascending order. [`layout`](Self::layout) also contains every ancestor of a
/// widget whose layout was invalidated.
#[derive(Clone, Debug, Default)]
pub struct FrameInvalidations {
    /// Widgets that need layout.
    pub layout: Vec<u32>,
    /// Widgets that need paint.
    pub paint: Vec<u32>,
    /// Widgets whose volatility changed.
    pub volatility: Vec<u32>,
    /// Widgets whose children changed.
    pub child_order: Vec<u32>,
    /// Widgets whose render transform changed.
    pub render_transform: Vec<u32>,
    /// Widgets whose visibility changed.
    pub visibility: Vec<u32>,
    /// Widgets whose registered attributes changed.
    pub attribute_registration: Vec<u32>,
    /// Widgets whose prepass must run again.
    pub prepass: Vec<u32>,
    /// Every sink submission of the pass, in submission order.
    pub submitted: Vec<(WidgetId, InvalidationReason)>,
    /// Counters of the pass.
    pub summary: PassSummary,
}

impl FrameInvalidations {
    /// Clears all lists.
    pub fn clear(&mut self) {
        self.layout.clear();
        self.paint.clear();
        self.volatility.clear();
        self.child_order.clear();
        self.render_transform.clear();
        self.visibility.clear();
        self.attribute_registration.clear();
        self.prepass.clear();
        self.submitted.clear();
        self.summary = PassSummary::default();
    }

    /// Returns whether nothing was invalidated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.submitted.is_empty()
    }

    /// Channel lists in [`dirty::CHANNELS`] order.
    fn channel_lists(&mut self) -> [&mut Vec<u32>; 8] {
        [
            &mut self.layout,
            &mut self.paint,
            &mut self.volatility,
            &mut self.child_order,
            &mut self.render_transform,
            &mut self.visibility,
            &mut self.attribute_registration,
            &mut self.prepass,
        ]
    }
}

impl WidgetTree {
    /// Runs an update pass and records the result in per-reason channels.
    ///
    /// Layout invalidations propagate to every ancestor.
    pub fn update_attributes(&mut self) -> FrameInvalidations {
        let mut frame = FrameInvalidations::default();
        self.update_attributes_with(&mut frame);
        frame
    }

    /// Like [`update_attributes`](Self::update_attributes), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn update_attributes_with(&mut self, frame: &mut FrameInvalidations) {
        frame.clear();
        frame.summary = self.update_attributes_into(&mut frame.submitted);

        for &(id, reason) in &frame.submitted {
            for (flag, channel) in dirty::CHANNELS {
                if !reason.contains(flag) {
                    continue;
                }
                if flag == InvalidationReason::LAYOUT {
                    self.dirty.mark_with(id.idx, channel, &EagerPolicy);
                } else {
                    self.dirty.mark(id.idx, channel);
                }
            }
        }

        for ((_, channel), list) in dirty::CHANNELS.into_iter().zip(frame.channel_lists()) {
            *list = self
                .dirty
                .drain(channel)
                .affected()
                .deterministic()
                .run()
                .collect();
            list.sort_unstable();
        }
    }

    /// Runs an update pass over every live widget.
    ///
    /// Calls `sink` once for each widget with a non-empty combined reason.
    pub fn update_attributes_into(&mut self, sink: &mut dyn InvalidationSink) -> PassSummary {
        self.update_attributes_traced(sink, &mut Tracer::none())
    }

    /// Like [`update_attributes_into`](Self::update_attributes_into), with
    /// instrumentation.
    pub fn update_attributes_traced(
        &mut self,
        sink: &mut dyn InvalidationSink,
        tracer: &mut Tracer<'_>,
    ) -> PassSummary {
        self.pass_index += 1;
        let mut summary = PassSummary {
            pass_index: self.pass_index,
            ..PassSummary::default()
        };
        tracer.pass_begin(&PassBeginEvent {
            pass_index: self.pass_index,
            widgets: index_u32(self.widget_count()),
        });

        for idx in 0..self.len {
            if !self.live[idx as usize] {
                continue;
            }
            let evaluate = self.updates_enabled[idx as usize];
            let _ = self.update_one(idx, evaluate, sink, tracer, &mut summary);
        }

        tracer.pass_summary(&summary);
        summary
    }

    /// Updates a single widget, even if its automatic updates are disabled.
    ///
    /// Returns the reason submitted to `sink`, which is empty if nothing was
    /// submitted.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update_widget_attributes(
        &mut self,
        id: WidgetId,
        sink: &mut dyn InvalidationSink,
    ) -> InvalidationReason {
        self.validate(id);
        let mut summary = PassSummary {
            pass_index: self.pass_index,
            ..PassSummary::default()
        };
        self.update_one(id.idx, true, sink, &mut Tracer::none(), &mut summary)
    }

    fn update_one(
        &mut self,
        idx: u32,
        evaluate: bool,
        sink: &mut dyn InvalidationSink,
        tracer: &mut Tracer<'_>,
        summary: &mut PassSummary,
    ) -> InvalidationReason {
        let i = idx as usize;
        let id = self.id_at(idx);
        let mut reason = core::mem::replace(&mut self.pending[i], InvalidationReason::NONE);

        if self.registrations_dirty[i] {
            self.rebuild_registrations(idx, tracer);
        }

        if !self.registrations[i].is_empty() {
            summary.widgets_visited += 1;
            let visible = self.visibility_at(i).is_visible();
            let skip = if !evaluate {
                Some(SkipReason::UpdatesDisabled)
            } else if !visible && !self.affects_visibility[i] {
                Some(SkipReason::NotVisible)
            } else {
                None
            };
            if let Some(skip) = skip {
                summary.widgets_skipped += 1;
                tracer.widget_skipped(&WidgetSkippedEvent {
                    pass_index: self.pass_index,
                    widget: id,
                    reason: skip,
                });
            } else {
                reason |= self.evaluate_registrations(idx, visible, tracer, summary);
            }
        }

        if !reason.is_empty() {
            log::trace!("{id:?} invalidated: {reason}");
            sink.invalidate(id, reason);
            summary.submissions += 1;
            tracer.invalidation(&InvalidationEvent {
                pass_index: self.pass_index,
                widget: id,
                reason,
            });
        }
        reason
    }

    fn evaluate_registrations(
        &mut self,
        idx: u32,
        visible: bool,
        tracer: &mut Tracer<'_>,
        summary: &mut PassSummary,
    ) -> InvalidationReason {
        let i = idx as usize;
        let id = self.id_at(idx);
        let class = self.class[i];
        let registrations = core::mem::take(&mut self.registrations[i]);
        let mut reason = InvalidationReason::NONE;

        for &registration in &registrations {
            if !visible && !registration.affects_visibility {
                continue;
            }
            let Some(entry) = class.descriptor().find_by_key(registration.key) else {
                continue;
            };
            let polled = match self.registered(i, registration) {
                Some(attribute) => attribute.poll(&WidgetRef::new(self, id)),
                None => continue,
            };
            summary.attributes_evaluated += 1;

            match polled {
                Ok(Polled::Unchanged) => {}
                Ok(Polled::Baseline(value)) => {
                    if let Some(attribute) = self.registered_mut(i, registration) {
                        attribute.store(value);
                    }
                    tracer.attribute_changed(&AttributeChangedEvent {
                        pass_index: self.pass_index,
                        widget: id,
                        attribute: registration.key,
                        slot: registration.slot,
                        reason: InvalidationReason::NONE,
                        baseline: true,
                    });
                }
                Ok(Polled::Changed(value)) => {
                    if let Some(attribute) = self.registered_mut(i, registration) {
                        attribute.store(value);
                    }
                    let widget = WidgetRef::new(self, id);
                    let changed = entry.reason().get(&widget);
                    entry.notify(&widget);
                    reason |= changed;
                    summary.attributes_changed += 1;
                    tracer.attribute_changed(&AttributeChangedEvent {
                        pass_index: self.pass_index,
                        widget: id,
                        attribute: registration.key,
                        slot: registration.slot,
                        reason: changed,
                        baseline: false,
                    });
                }
                Err(e) => {
                    log::warn!(
                        "binding for `{}` on {id:?} ({}) failed: {e}",
                        entry.name(),
                        class.name()
                    );
                    summary.binding_failures += 1;
                    tracer.binding_failed(&BindingFailedEvent {
                        pass_index: self.pass_index,
                        widget: id,
                        attribute: registration.key,
                        slot: registration.slot,
                    });
                }
            }
        }

        self.registrations[i] = registrations;
        reason
    }

    fn rebuild_registrations(&mut self, idx: u32, tracer: &mut Tracer<'_>) {
        let i = idx as usize;
        let class = self.class[i];
        let descriptor = class.descriptor();
        let order = class.resolved_order();
        let affects_visibility = |key| {
            descriptor
                .find_by_key(key)
                .is_some_and(|entry| entry.affects_visibility())
        };

        let mut registrations = core::mem::take(&mut self.registrations[i]);
        registrations.clear();
        for item in order.items() {
            match *item {
                OrderItem::Attribute(key) => {
                    if self.attributes[i].is_bound(key) {
                        registrations.push(Registration {
                            key,
                            slot: None,
                            affects_visibility: affects_visibility(key),
                        });
                    }
                }
                OrderItem::Container(container) => {
                    for (s, slot) in self.children[i].iter().enumerate() {
                        if slot.container != Some(container) {
                            continue;
                        }
                        for &key in order.contained(container) {
                            if slot.attributes.is_bound(key) {
                                registrations.push(Registration {
                                    key,
                                    slot: Some(index_u32(s)),
                                    affects_visibility: false,
                                });
                            }
                        }
                    }
                }
            }
        }

        let count = index_u32(registrations.len());
        self.affects_visibility[i] = registrations.iter().any(|r| r.affects_visibility);
        self.registrations[i] = registrations;
        self.registrations_dirty[i] = false;

        let id = self.id_at(idx);
        log::trace!("rebuilt {count} attribute registrations for {id:?}");
        tracer.registrations_rebuilt(&RegistrationsRebuiltEvent {
            pass_index: self.pass_index,
            widget: id,
            registrations: count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeHandle;
    use crate::class::{BaseWidget, ClassMetadata, WidgetClass};
    use crate::descriptor::AttributeInitializer;
    use crate::error::{BindingError, DescriptorError};
    use crate::invalidation::ReasonProvider;
    use crate::visibility::Visibility;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Gauge;

    impl WidgetClass for Gauge {
        const NAME: &'static str = "Gauge";

        fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
            init.add_member_attribute("Min", InvalidationReason::LAYOUT, 0_i32)?;
            init.add_member_attribute("Max", InvalidationReason::LAYOUT | InvalidationReason::PAINT, 0_i32)?;
            init.add_member_attribute("Tint", InvalidationReason::PAINT, 0_u32)?;
            Ok(())
        }
    }

    fn handle(name: &str) -> AttributeHandle<i32> {
        ClassMetadata::of::<Gauge>()
            .and_then(|c| c.handle(name))
            .expect("Gauge attribute")
    }

    type Submissions = Vec<(WidgetId, InvalidationReason)>;

    fn run(tree: &mut WidgetTree) -> Submissions {
        let mut sink = Submissions::new();
        let _ = tree.update_attributes_into(&mut sink);
        sink
    }

    #[test]
    fn baseline_then_change() {
        let value = Rc::new(Cell::new(1));
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<Gauge>().expect("gauge");
        let source = Rc::clone(&value);
        tree.bind(id, handle("Min"), move |_| source.get());

        assert!(run(&mut tree).is_empty(), "baseline pass is silent");
        assert_eq!(*tree.get(id, handle("Min")), 1);
        assert!(run(&mut tree).is_empty(), "unchanged value");

        value.set(2);
        assert_eq!(run(&mut tree), [(id, InvalidationReason::LAYOUT)]);
        assert_eq!(*tree.get(id, handle("Min")), 2);
    }

    #[test]
    fn rebinding_reports_changed_value() {
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<Gauge>().expect("gauge");
        tree.bind(id, handle("Min"), |_| 10);
        assert!(run(&mut tree).is_empty(), "first bind is a silent baseline");
        assert_eq!(*tree.get(id, handle("Min")), 10);

        tree.bind(id, handle("Min"), |_| 50);
        assert_eq!(run(&mut tree), [(id, InvalidationReason::LAYOUT)]);
        assert_eq!(*tree.get(id, handle("Min")), 50);

        tree.bind(id, handle("Min"), |_| 50);
        assert!(run(&mut tree).is_empty(), "same value from a new getter");
    }

    #[test]
    fn computed_reason_is_limited_to_bound() {
        struct Stretch;

        impl WidgetClass for Stretch {
            const NAME: &'static str = "Stretch";

            fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
                let provider = ReasonProvider::computed(InvalidationReason::LAYOUT, |w| {
                    if w.class().name() == "Stretch" {
                        InvalidationReason::LAYOUT | InvalidationReason::PAINT
                    } else {
                        InvalidationReason::NONE
                    }
                });
                init.add_member_attribute("Factor", provider, 1_u32)?;
                Ok(())
            }
        }

        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<Stretch>().expect("stretch");
        let factor = tree.class(id).handle::<u32>("Factor").expect("Factor");

        assert!(tree.set(id, factor, 2));
        assert_eq!(tree.pending_invalidation(id), InvalidationReason::LAYOUT);
        assert_eq!(run(&mut tree), [(id, InvalidationReason::LAYOUT)]);

        let value = Rc::new(Cell::new(2_u32));
        let source = Rc::clone(&value);
        tree.bind(id, factor, move |_| source.get());
        assert!(run(&mut tree).is_empty());
        value.set(3);
        assert_eq!(run(&mut tree), [(id, InvalidationReason::LAYOUT)]);
    }

    #[test]
    fn changes_in_one_pass_are_combined() {
        let value = Rc::new(Cell::new(0));
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<Gauge>().expect("gauge");
        let a = Rc::clone(&value);
        tree.bind(id, handle("Min"), move |_| a.get());
        let b = Rc::clone(&value);
        tree.bind(id, handle("Max"), move |_| b.get() * 10);
        let _ = run(&mut tree);

        value.set(1);
        assert_eq!(
            run(&mut tree),
            [(id, InvalidationReason::LAYOUT | InvalidationReason::PAINT)]
        );
    }

    #[test]
    fn later_getters_see_earlier_results() {
        let value = Rc::new(Cell::new(3));
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<Gauge>().expect("gauge");
        let min = handle("Min");
        let source = Rc::clone(&value);
        tree.bind(id, min, move |_| source.get());
        tree.bind(id, handle("Max"), move |w| *w.get(min) + 1);

        let _ = run(&mut tree);
        assert_eq!(*tree.get(id, handle("Max")), 4);
        value.set(7);
        let _ = run(&mut tree);
        assert_eq!(*tree.get(id, handle("Max")), 8, "same pass, not one behind");
    }

    #[test]
    fn failing_binding_is_contained() {
        let fail = Rc::new(Cell::new(false));
        let value = Rc::new(Cell::new(0));
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<Gauge>().expect("gauge");
        let flag = Rc::clone(&fail);
        let a = Rc::clone(&value);
        tree.bind_fallible(id, handle("Min"), move |_| {
            if flag.get() {
                Err(BindingError::new("source gone"))
            } else {
                Ok(a.get())
            }
        });
        let b = Rc::clone(&value);
        tree.bind(id, handle("Max"), move |_| b.get());
        let _ = run(&mut tree);

        fail.set(true);
        value.set(5);
        let mut sink = Submissions::new();
        let summary = tree.update_attributes_into(&mut sink);
        assert_eq!(summary.binding_failures, 1);
        assert_eq!(*tree.get(id, handle("Min")), 0, "previous value kept");
        assert_eq!(*tree.get(id, handle("Max")), 5, "sibling still updated");
        assert_eq!(
            sink,
            [(id, InvalidationReason::LAYOUT | InvalidationReason::PAINT)]
        );

        fail.set(false);
        assert_eq!(run(&mut tree), [(id, InvalidationReason::LAYOUT)]);
        assert_eq!(*tree.get(id, handle("Min")), 5);
    }

    #[test]
    fn collapsed_widget_is_skipped() {
        let value = Rc::new(Cell::new(0));
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<Gauge>().expect("gauge");
        let source = Rc::clone(&value);
        tree.bind(id, handle("Min"), move |_| source.get());
        let _ = run(&mut tree);

        assert!(tree.set(id, BaseWidget::VISIBILITY, Visibility::Collapsed));
        assert_eq!(run(&mut tree), [(id, InvalidationReason::VISIBILITY)]);

        value.set(9);
        let mut sink = Submissions::new();
        let summary = tree.update_attributes_into(&mut sink);
        assert!(sink.is_empty());
        assert_eq!(summary.widgets_skipped, 1);
        assert_eq!(*tree.get(id, handle("Min")), 0, "not evaluated while collapsed");

        assert!(tree.set(id, BaseWidget::VISIBILITY, Visibility::Visible));
        assert_eq!(
            run(&mut tree),
            [(id, InvalidationReason::VISIBILITY | InvalidationReason::LAYOUT)]
        );
    }

    #[test]
    fn visibility_bindings_run_while_collapsed() {
        let shown = Rc::new(Cell::new(false));
        let value = Rc::new(Cell::new(0));
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<Gauge>().expect("gauge");
        let flag = Rc::clone(&shown);
        tree.bind(id, BaseWidget::VISIBILITY, move |_| {
            if flag.get() {
                Visibility::Visible
            } else {
                Visibility::Collapsed
            }
        });
        let source = Rc::clone(&value);
        tree.bind(id, handle("Min"), move |_| source.get());
        let _ = run(&mut tree);
        assert_eq!(tree.visibility(id), Visibility::Collapsed);

        value.set(4);
        assert!(run(&mut tree).is_empty());
        assert_eq!(*tree.get(id, handle("Min")), 0);

        shown.set(true);
        assert_eq!(run(&mut tree), [(id, InvalidationReason::VISIBILITY)]);
        assert!(tree.is_visible(id));
        assert_eq!(run(&mut tree), [(id, InvalidationReason::LAYOUT)]);
    }

    #[test]
    fn disabled_updates_flush_queued_reasons_only() {
        let value = Rc::new(Cell::new(0));
        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<Gauge>().expect("gauge");
        let source = Rc::clone(&value);
        tree.bind(id, handle("Min"), move |_| source.get());
        let _ = run(&mut tree);

        tree.set_attributes_update_enabled(id, false);
        value.set(1);
        assert!(tree.set(id, handle("Max"), 3));
        assert_eq!(
            run(&mut tree),
            [(id, InvalidationReason::LAYOUT | InvalidationReason::PAINT)]
        );
        assert_eq!(*tree.get(id, handle("Min")), 0);

        let mut sink = Submissions::new();
        let reason = tree.update_widget_attributes(id, &mut sink);
        assert_eq!(reason, InvalidationReason::LAYOUT);
        assert_eq!(sink, [(id, InvalidationReason::LAYOUT)]);
        assert_eq!(*tree.get(id, handle("Min")), 1);
    }

    #[test]
    fn layout_propagates_to_ancestors() {
        let value = Rc::new(Cell::new(0));
        let mut tree = WidgetTree::new();
        let root = tree.create_widget::<BaseWidget>().expect("root");
        let mid = tree.create_widget::<BaseWidget>().expect("mid");
        let leaf = tree.create_widget::<Gauge>().expect("leaf");
        let other = tree.create_widget::<BaseWidget>().expect("other");
        tree.add_child(root, None, mid);
        tree.add_child(mid, None, leaf);
        tree.add_child(root, None, other);
        let source = Rc::clone(&value);
        tree.bind(leaf, handle("Min"), move |_| source.get());

        let first = tree.update_attributes();
        assert_eq!(first.child_order, [root.index(), mid.index()]);
        assert!(first.layout.is_empty());

        value.set(1);
        let frame = tree.update_attributes();
        assert_eq!(frame.submitted, [(leaf, InvalidationReason::LAYOUT)]);
        assert_eq!(frame.layout, [root.index(), mid.index(), leaf.index()]);
        assert!(frame.paint.is_empty());
        assert_eq!(frame.summary.attributes_changed, 1);

        let idle = tree.update_attributes();
        assert!(idle.is_empty());
        assert!(idle.layout.is_empty());
    }

    #[test]
    fn contained_attributes_update_per_slot() {
        struct Row;

        impl WidgetClass for Row {
            const NAME: &'static str = "Row";

            fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
                let mut slots = init.add_container("Slots")?;
                slots.add_contained_attribute("Span", InvalidationReason::LAYOUT, 1_u32)?;
                slots
                    .add_contained_attribute("Align", InvalidationReason::PAINT, 0_u32)?
                    .update_prerequisite("Span");
                Ok(())
            }
        }

        let value = Rc::new(Cell::new(1_u32));
        let mut tree = WidgetTree::new();
        let row = tree.create_widget::<Row>().expect("row");
        let class = tree.class(row);
        let slots = class.container_key("Slots").expect("Slots");
        let span = class.contained_handle::<u32>("Slots", "Span").expect("Span");
        let align = class
            .contained_handle::<u32>("Slots", "Align")
            .expect("Align");
        let a = tree.create_widget::<BaseWidget>().expect("a");
        let b = tree.create_widget::<BaseWidget>().expect("b");
        tree.add_child(row, Some(slots), a);
        tree.add_child(row, Some(slots), b);

        let source = Rc::clone(&value);
        tree.slot_bind(b, span, move |_| source.get());
        tree.slot_bind(b, align, |w| u32::from(w.class().name() == "Row"));
        assert_eq!(run(&mut tree), [(row, InvalidationReason::CHILD_ORDER)]);
        assert_eq!(*tree.slot_get(b, align), 1, "getter sees the parent");
        assert_eq!(*tree.slot_get(a, span), 1);

        value.set(3);
        assert_eq!(run(&mut tree), [(row, InvalidationReason::LAYOUT)]);
        assert_eq!(*tree.slot_get(b, span), 3);
        assert_eq!(*tree.slot_get(a, span), 1, "other slots are independent");

        tree.remove_from_parent(a);
        assert_eq!(
            run(&mut tree),
            [(row, InvalidationReason::CHILD_ORDER)],
            "slot a held no bindings"
        );
        tree.remove_from_parent(b);
        assert_eq!(
            run(&mut tree),
            [(
                row,
                InvalidationReason::CHILD_ORDER | InvalidationReason::ATTRIBUTE_REGISTRATION
            )]
        );
    }
}
