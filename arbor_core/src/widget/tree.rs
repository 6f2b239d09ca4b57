// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays widget storage with allocation, topology, and attribute
//! access.

use core::any::type_name;

use understory_dirty::{CycleHandling, DirtyTracker};

use super::id::{INVALID, WidgetId};
use super::view::WidgetRef;
use crate::attribute::{
    Attribute, AttributeHandle, AttributeSet, AttributeValue, ContainedHandle, ErasedAttribute,
};
use crate::class::{ClassMetadata, WidgetClass};
use crate::descriptor::{AttributeKey, ContainerKey};
use crate::dirty;
use crate::error::{BindingError, DescriptorError};
use crate::invalidation::InvalidationReason;
use crate::visibility::Visibility;

/// One child of a widget, with the per-slot attributes of its container.
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) container: Option<ContainerKey>,
    pub(crate) child: u32,
    pub(crate) attributes: AttributeSet,
}

/// A bound attribute taking part in update passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Registration {
    pub(crate) key: AttributeKey,
    /// Slot index for a contained attribute.
    pub(crate) slot: Option<u32>,
    pub(crate) affects_visibility: bool,
}

/// Struct-of-arrays storage for all widgets.
///
/// Widgets are addressed by [`WidgetId`] handles. Internally, each widget
/// occupies a slot in parallel arrays. Destroyed widgets are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// The tree is single-owner: bindings and callbacks observe it through a
/// shared [`WidgetRef`] and cannot mutate it.
#[derive(Debug)]
pub struct WidgetTree {
    // -- Class --
    pub(crate) class: Vec<&'static ClassMetadata>,

    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<Slot>>,

    // -- Attributes --
    pub(crate) attributes: Vec<AttributeSet>,
    pub(crate) registrations: Vec<Vec<Registration>>,
    pub(crate) registrations_dirty: Vec<bool>,
    pub(crate) affects_visibility: Vec<bool>,
    pub(crate) updates_enabled: Vec<bool>,
    pub(crate) pending: Vec<InvalidationReason>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) live: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) pass_index: u64,
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            class: Vec::new(),
            parent: Vec::new(),
            children: Vec::new(),
            attributes: Vec::new(),
            registrations: Vec::new(),
            registrations_dirty: Vec::new(),
            affects_visibility: Vec::new(),
            updates_enabled: Vec::new(),
            pending: Vec::new(),
            generation: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pass_index: 0,
        }
    }

    // -- Allocation API --

    /// Creates a widget of class `T` and returns its handle.
    ///
    /// The first widget of a class builds the class metadata.
    ///
    /// # Errors
    ///
    /// The configuration error of `T` or one of its base classes.
    pub fn create_widget<T: WidgetClass>(&mut self) -> Result<WidgetId, DescriptorError> {
        let class = ClassMetadata::of::<T>()?;
        Ok(self.create_widget_of(class))
    }

    /// Creates a widget of an already built class.
    ///
    /// Every member attribute starts with its declared default as a literal,
    /// and automatic attribute updates start enabled.
    pub fn create_widget_of(&mut self, class: &'static ClassMetadata) -> WidgetId {
        let attributes = AttributeSet::members(class.descriptor());
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.class[i] = class;
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.attributes[i] = attributes;
            self.registrations[i].clear();
            self.registrations_dirty[i] = false;
            self.affects_visibility[i] = false;
            self.updates_enabled[i] = true;
            self.pending[i] = InvalidationReason::NONE;
            self.live[i] = true;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.class.push(class);
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.attributes.push(attributes);
            self.registrations.push(Vec::new());
            self.registrations_dirty.push(false);
            self.affects_visibility.push(false);
            self.updates_enabled.push(true);
            self.pending.push(InvalidationReason::NONE);
            self.generation.push(0);
            self.live.push(true);
            idx
        };

        WidgetId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a widget, freeing its slot for reuse.
    ///
    /// A widget that still has a parent is detached first, which queues
    /// [`CHILD_ORDER`](InvalidationReason::CHILD_ORDER) on the parent.
    ///
    /// # Panics
    ///
    /// Panics if the widget has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_widget(&mut self, id: WidgetId) {
        self.validate(id);
        let idx = id.idx;
        let i = idx as usize;
        assert!(
            self.children[i].is_empty(),
            "cannot destroy widget with children"
        );

        if self.parent[i] != INVALID {
            self.detach(idx);
        }

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[i] += 1;
        self.attributes[i] = AttributeSet::default();
        self.registrations[i].clear();
        self.pending[i] = InvalidationReason::NONE;
        self.live[i] = false;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live widget.
    #[must_use]
    pub fn is_alive(&self, id: WidgetId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.live[id.idx as usize]
    }

    /// Number of live widgets.
    #[must_use]
    pub fn widget_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns a shared view of a widget.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn widget(&self, id: WidgetId) -> WidgetRef<'_> {
        self.validate(id);
        WidgetRef::new(self, id)
    }

    /// Returns the class of a widget.
    #[must_use]
    pub fn class(&self, id: WidgetId) -> &'static ClassMetadata {
        self.validate(id);
        self.class[id.idx as usize]
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// With `Some(container)`, the new slot instantiates the attributes the
    /// parent's class declares in that container. Queues
    /// [`CHILD_ORDER`](InvalidationReason::CHILD_ORDER) on `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, if
    /// `child` is `parent` or one of its ancestors, or if the parent's class
    /// does not declare `container`.
    pub fn add_child(&mut self, parent: WidgetId, container: Option<ContainerKey>, child: WidgetId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let mut ancestor = p;
        while ancestor != INVALID {
            assert!(ancestor != c, "cannot add a widget to its own subtree");
            ancestor = self.parent[ancestor as usize];
        }

        let class = self.class[p as usize];
        let attributes = match container {
            Some(container) => {
                assert!(
                    class
                        .descriptor()
                        .containers()
                        .iter()
                        .any(|entry| entry.key() == container),
                    "{container:?} is not declared by `{}`",
                    class.name()
                );
                AttributeSet::contained(class.descriptor(), container)
            }
            None => AttributeSet::default(),
        };
        self.children[p as usize].push(Slot {
            container,
            child: c,
            attributes,
        });
        self.parent[c as usize] = p;

        // The parent's layout depends on the child's.
        let _ = self.dirty.add_dependency(p, c, dirty::LAYOUT);

        self.structural_change(p, InvalidationReason::CHILD_ORDER);
    }

    /// Removes `child` from its parent, dropping its slot attributes.
    ///
    /// Queues [`CHILD_ORDER`](InvalidationReason::CHILD_ORDER) on the parent,
    /// plus [`ATTRIBUTE_REGISTRATION`](InvalidationReason::ATTRIBUTE_REGISTRATION)
    /// if the slot held bound attributes.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the widget has no parent.
    pub fn remove_from_parent(&mut self, child: WidgetId) {
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] != INVALID,
            "widget has no parent"
        );
        self.detach(child.idx);
    }

    /// Returns the parent of a widget, if any.
    #[must_use]
    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a widget, in slot
    /// order.
    pub fn children(&self, id: WidgetId) -> impl Iterator<Item = WidgetId> + '_ {
        self.validate(id);
        self.children[id.idx as usize]
            .iter()
            .map(|slot| self.id_at(slot.child))
    }

    /// Returns the container of the slot holding `child`, if it has a parent.
    #[must_use]
    pub fn slot_container(&self, child: WidgetId) -> Option<ContainerKey> {
        self.validate(child);
        let p = self.parent[child.idx as usize];
        if p == INVALID {
            return None;
        }
        self.children[p as usize]
            .iter()
            .find(|slot| slot.child == child.idx)
            .and_then(|slot| slot.container)
    }

    // -- Per-widget state --

    /// Returns whether any member or slot attribute of the widget is bound.
    #[must_use]
    pub fn has_registered_attributes(&self, id: WidgetId) -> bool {
        self.validate(id);
        let i = id.idx as usize;
        self.attributes[i].any_bound() || self.children[i].iter().any(|s| s.attributes.any_bound())
    }

    /// Enables or disables automatic attribute updates for a widget.
    ///
    /// A disabled widget's bindings are only evaluated through
    /// [`update_widget_attributes`](Self::update_widget_attributes). Reasons
    /// queued by [`set`](Self::set) and structural changes are still
    /// submitted by every pass.
    pub fn set_attributes_update_enabled(&mut self, id: WidgetId, enabled: bool) {
        self.validate(id);
        self.updates_enabled[id.idx as usize] = enabled;
    }

    /// Returns whether automatic attribute updates are enabled.
    #[must_use]
    pub fn is_attributes_update_enabled(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.updates_enabled[id.idx as usize]
    }

    /// The widget's own visibility.
    ///
    /// Classes without a `Visibility` attribute are always
    /// [`Visible`](Visibility::Visible).
    #[must_use]
    pub fn visibility(&self, id: WidgetId) -> Visibility {
        self.validate(id);
        self.visibility_at(id.idx as usize)
    }

    /// Returns whether the widget is drawn.
    #[must_use]
    pub fn is_visible(&self, id: WidgetId) -> bool {
        self.visibility(id).is_visible()
    }

    /// Reasons queued for the next pass.
    #[must_use]
    pub fn pending_invalidation(&self, id: WidgetId) -> InvalidationReason {
        self.validate(id);
        self.pending[id.idx as usize]
    }

    // -- Member attributes --

    /// Returns the box of a member attribute.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the widget's class has no such
    /// attribute of type `T`.
    #[must_use]
    pub fn attribute<T: AttributeValue>(&self, id: WidgetId, handle: AttributeHandle<T>) -> &Attribute<T> {
        self.validate(id);
        self.member(id.idx as usize, handle.key())
    }

    /// Current value of a member attribute.
    ///
    /// # Panics
    ///
    /// See [`attribute`](Self::attribute).
    #[must_use]
    pub fn get<T: AttributeValue>(&self, id: WidgetId, handle: AttributeHandle<T>) -> &T {
        self.attribute(id, handle).get()
    }

    /// Returns whether a member attribute is bound.
    ///
    /// # Panics
    ///
    /// See [`attribute`](Self::attribute).
    #[must_use]
    pub fn is_bound<T: AttributeValue>(&self, id: WidgetId, handle: AttributeHandle<T>) -> bool {
        self.attribute(id, handle).is_bound()
    }

    /// Stores a literal value, removing any binding.
    ///
    /// If the stored value changed, the attribute's reason is queued on the
    /// widget and its value-changed callback runs before this returns.
    /// Returns whether the value changed.
    ///
    /// # Panics
    ///
    /// See [`attribute`](Self::attribute).
    pub fn set<T: AttributeValue>(&mut self, id: WidgetId, handle: AttributeHandle<T>, value: T) -> bool {
        self.validate(id);
        let i = id.idx as usize;
        let attribute = self.member_mut(i, handle.key());
        let was_bound = attribute.is_bound();
        let changed = attribute.set(value);
        if was_bound {
            self.registrations_dirty[i] = true;
        }
        if changed {
            self.value_changed(i, handle.key());
        }
        changed
    }

    /// Binds a member attribute to an infallible getter.
    ///
    /// The getter is not called here; the next pass stores its first result
    /// as the baseline.
    ///
    /// # Panics
    ///
    /// See [`attribute`](Self::attribute).
    pub fn bind<T, F>(&mut self, id: WidgetId, handle: AttributeHandle<T>, getter: F)
    where
        T: AttributeValue,
        F: Fn(&WidgetRef<'_>) -> T + 'static,
    {
        self.bind_fallible(id, handle, move |widget| Ok(getter(widget)));
    }

    /// Binds a member attribute to a getter that may fail.
    ///
    /// A failing evaluation is logged and keeps the previous value.
    ///
    /// # Panics
    ///
    /// See [`attribute`](Self::attribute).
    pub fn bind_fallible<T, F>(&mut self, id: WidgetId, handle: AttributeHandle<T>, getter: F)
    where
        T: AttributeValue,
        F: Fn(&WidgetRef<'_>) -> Result<T, BindingError> + 'static,
    {
        self.validate(id);
        let i = id.idx as usize;
        self.member_mut(i, handle.key()).bind(Box::new(getter));
        self.registrations_dirty[i] = true;
    }

    /// Removes a binding, keeping the current value as a literal.
    ///
    /// Returns whether a binding was removed.
    ///
    /// # Panics
    ///
    /// See [`attribute`](Self::attribute).
    pub fn unbind<T: AttributeValue>(&mut self, id: WidgetId, handle: AttributeHandle<T>) -> bool {
        self.validate(id);
        let i = id.idx as usize;
        let removed = self.member_mut(i, handle.key()).unbind();
        if removed {
            self.registrations_dirty[i] = true;
        }
        removed
    }

    // -- Contained attributes --

    /// Returns the box of a contained attribute in the slot holding `child`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or `child` is not held in the handle's
    /// container, or the container has no such attribute of type `T`.
    #[must_use]
    pub fn slot_attribute<T: AttributeValue>(
        &self,
        child: WidgetId,
        handle: ContainedHandle<T>,
    ) -> &Attribute<T> {
        let (p, s) = self.slot_position(child, handle.container());
        self.contained(p, s, handle.key())
    }

    /// Current value of a contained attribute.
    ///
    /// # Panics
    ///
    /// See [`slot_attribute`](Self::slot_attribute).
    #[must_use]
    pub fn slot_get<T: AttributeValue>(&self, child: WidgetId, handle: ContainedHandle<T>) -> &T {
        self.slot_attribute(child, handle).get()
    }

    /// Returns whether a contained attribute is bound.
    ///
    /// # Panics
    ///
    /// See [`slot_attribute`](Self::slot_attribute).
    #[must_use]
    pub fn slot_is_bound<T: AttributeValue>(&self, child: WidgetId, handle: ContainedHandle<T>) -> bool {
        self.slot_attribute(child, handle).is_bound()
    }

    /// Stores a literal value in the slot holding `child`.
    ///
    /// Reasons and callbacks apply to the parent, which owns the container.
    /// Returns whether the value changed.
    ///
    /// # Panics
    ///
    /// See [`slot_attribute`](Self::slot_attribute).
    pub fn slot_set<T: AttributeValue>(
        &mut self,
        child: WidgetId,
        handle: ContainedHandle<T>,
        value: T,
    ) -> bool {
        let (p, s) = self.slot_position(child, handle.container());
        let attribute = self.contained_mut(p, s, handle.key());
        let was_bound = attribute.is_bound();
        let changed = attribute.set(value);
        if was_bound {
            self.registrations_dirty[p] = true;
        }
        if changed {
            self.value_changed(p, handle.key());
        }
        changed
    }

    /// Binds a contained attribute to an infallible getter.
    ///
    /// The getter receives the parent widget.
    ///
    /// # Panics
    ///
    /// See [`slot_attribute`](Self::slot_attribute).
    pub fn slot_bind<T, F>(&mut self, child: WidgetId, handle: ContainedHandle<T>, getter: F)
    where
        T: AttributeValue,
        F: Fn(&WidgetRef<'_>) -> T + 'static,
    {
        self.slot_bind_fallible(child, handle, move |widget| Ok(getter(widget)));
    }

    /// Binds a contained attribute to a getter that may fail.
    ///
    /// # Panics
    ///
    /// See [`slot_attribute`](Self::slot_attribute).
    pub fn slot_bind_fallible<T, F>(&mut self, child: WidgetId, handle: ContainedHandle<T>, getter: F)
    where
        T: AttributeValue,
        F: Fn(&WidgetRef<'_>) -> Result<T, BindingError> + 'static,
    {
        let (p, s) = self.slot_position(child, handle.container());
        self.contained_mut(p, s, handle.key()).bind(Box::new(getter));
        self.registrations_dirty[p] = true;
    }

    /// Removes a contained binding, keeping the current value.
    ///
    /// # Panics
    ///
    /// See [`slot_attribute`](Self::slot_attribute).
    pub fn slot_unbind<T: AttributeValue>(&mut self, child: WidgetId, handle: ContainedHandle<T>) -> bool {
        let (p, s) = self.slot_position(child, handle.container());
        let removed = self.contained_mut(p, s, handle.key()).unbind();
        if removed {
            self.registrations_dirty[p] = true;
        }
        removed
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: WidgetId) {
        assert!(
            id.idx < self.len
                && self.generation[id.idx as usize] == id.generation
                && self.live[id.idx as usize],
            "stale WidgetId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Handle of the live widget at `idx`.
    pub(crate) fn id_at(&self, idx: u32) -> WidgetId {
        WidgetId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn visibility_at(&self, i: usize) -> Visibility {
        self.class[i]
            .visibility_key()
            .and_then(|key| self.attributes[i].typed::<Visibility>(key))
            .map_or(Visibility::Visible, |a| *a.get())
    }

    /// The box addressed by a registration.
    pub(crate) fn registered(&self, i: usize, registration: Registration) -> Option<&dyn ErasedAttribute> {
        match registration.slot {
            None => self.attributes[i].get(registration.key),
            Some(s) => self.children[i]
                .get(s as usize)?
                .attributes
                .get(registration.key),
        }
    }

    pub(crate) fn registered_mut(
        &mut self,
        i: usize,
        registration: Registration,
    ) -> Option<&mut (dyn ErasedAttribute + 'static)> {
        match registration.slot {
            None => self.attributes[i].get_mut(registration.key),
            Some(s) => self.children[i]
                .get_mut(s as usize)?
                .attributes
                .get_mut(registration.key),
        }
    }

    /// Queues the reason of a changed attribute and runs its callback.
    fn value_changed(&mut self, i: usize, key: AttributeKey) {
        let class = self.class[i];
        let Some(entry) = class.descriptor().find_by_key(key) else {
            return;
        };
        let widget = WidgetRef::new(self, self.id_at(super::index_u32(i)));
        let reason = entry.reason().get(&widget);
        entry.notify(&widget);
        self.pending[i] |= reason;
    }

    /// Queues `reason` and marks the registration list for rebuild.
    fn structural_change(&mut self, idx: u32, reason: InvalidationReason) {
        let i = idx as usize;
        self.pending[i] |= reason;
        self.registrations_dirty[i] = true;
    }

    /// Removes `idx` from its parent's slot list.
    fn detach(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        self.parent[idx as usize] = INVALID;
        self.dirty.remove_dependency(p, idx, dirty::LAYOUT);

        let slots = &mut self.children[p as usize];
        let mut reason = InvalidationReason::CHILD_ORDER;
        if let Some(pos) = slots.iter().position(|slot| slot.child == idx) {
            let slot = slots.remove(pos);
            if slot.attributes.any_bound() {
                reason |= InvalidationReason::ATTRIBUTE_REGISTRATION;
            }
        }
        self.structural_change(p, reason);
    }

    fn member<T: AttributeValue>(&self, i: usize, key: AttributeKey) -> &Attribute<T> {
        match self.attributes[i].typed::<T>(key) {
            Some(attribute) => attribute,
            None => panic!(
                "{key:?} is not a `{}` attribute of `{}`",
                type_name::<T>(),
                self.class[i].name()
            ),
        }
    }

    fn member_mut<T: AttributeValue>(&mut self, i: usize, key: AttributeKey) -> &mut Attribute<T> {
        let class = self.class[i];
        match self.attributes[i].typed_mut::<T>(key) {
            Some(attribute) => attribute,
            None => panic!(
                "{key:?} is not a `{}` attribute of `{}`",
                type_name::<T>(),
                class.name()
            ),
        }
    }

    fn contained<T: AttributeValue>(&self, p: usize, s: usize, key: AttributeKey) -> &Attribute<T> {
        match self.children[p][s].attributes.typed::<T>(key) {
            Some(attribute) => attribute,
            None => panic!(
                "{key:?} is not a `{}` slot attribute of `{}`",
                type_name::<T>(),
                self.class[p].name()
            ),
        }
    }

    fn contained_mut<T: AttributeValue>(
        &mut self,
        p: usize,
        s: usize,
        key: AttributeKey,
    ) -> &mut Attribute<T> {
        let class = self.class[p];
        match self.children[p][s].attributes.typed_mut::<T>(key) {
            Some(attribute) => attribute,
            None => panic!(
                "{key:?} is not a `{}` slot attribute of `{}`",
                type_name::<T>(),
                class.name()
            ),
        }
    }

    /// Parent index and slot index of `child` in `container`.
    fn slot_position(&self, child: WidgetId, container: ContainerKey) -> (usize, usize) {
        self.validate(child);
        let p = self.parent[child.idx as usize];
        assert!(p != INVALID, "widget has no parent");
        let position = self.children[p as usize]
            .iter()
            .position(|slot| slot.child == child.idx && slot.container == Some(container));
        match position {
            Some(s) => (p as usize, s),
            None => panic!("{child:?} is not held in {container:?}"),
        }
    }
}
