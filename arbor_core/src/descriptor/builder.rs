// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration API used by a class's `register_attributes` routine.

use core::marker::PhantomData;
use std::sync::Arc;

use super::entry::{AttributeEntry, AttributeKey, CallbackOverride, ContainerEntry, ContainerKey};
use super::{AttributeDescriptor, key_index};
use crate::attribute::{
    AttributeHandle, AttributeValue, ContainedHandle, TypedPrototype, with_identical,
};
use crate::error::DescriptorError;
use crate::invalidation::ReasonProvider;
use crate::widget::WidgetRef;

/// Declares and overrides attributes of the class being built.
///
/// Operates on a copy of the base class's descriptor; inherited entries can
/// be overridden by name but not redeclared.
#[derive(Debug)]
pub struct AttributeInitializer<'a> {
    descriptor: &'a mut AttributeDescriptor,
}

impl<'a> AttributeInitializer<'a> {
    pub(crate) fn new(descriptor: &'a mut AttributeDescriptor) -> Self {
        Self { descriptor }
    }

    /// Name of the class being built.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.descriptor.class.name()
    }

    /// Declares a member attribute with a default value.
    ///
    /// # Errors
    ///
    /// - [`IllegalReason`](DescriptorError::IllegalReason) if the reason (or
    ///   the bound of a computed provider) is not legal for an attribute.
    /// - [`DuplicateName`](DescriptorError::DuplicateName) if a member with
    ///   this name is already declared or inherited.
    pub fn add_member_attribute<T: AttributeValue>(
        &mut self,
        name: &'static str,
        reason: impl Into<ReasonProvider>,
        default: T,
    ) -> Result<MemberEntry<'_, T>, DescriptorError> {
        let index = self.descriptor.declare(None, name, reason.into(), default)?;
        Ok(MemberEntry {
            entry: &mut self.descriptor.entries[index],
            _marker: PhantomData,
        })
    }

    /// Declares a container whose attributes are replicated per child slot.
    ///
    /// # Errors
    ///
    /// [`DuplicateName`](DescriptorError::DuplicateName) if a container with
    /// this name is already declared or inherited.
    pub fn add_container(
        &mut self,
        name: &'static str,
    ) -> Result<ContainerInitializer<'_>, DescriptorError> {
        if let Some(existing) = self.descriptor.find_container(name) {
            return Err(DescriptorError::DuplicateName {
                class: self.descriptor.class.name(),
                name: name.into(),
                inherited: existing.declared_by != self.descriptor.class,
            });
        }
        let key = ContainerKey(key_index(self.descriptor.containers.len()));
        let sort_order = self.descriptor.next_sort_order();
        self.descriptor.containers.push(ContainerEntry {
            name,
            key,
            sort_order,
            declared_by: self.descriptor.class,
        });
        Ok(ContainerInitializer {
            descriptor: &mut *self.descriptor,
            container: key,
        })
    }

    /// Reopens a declared or inherited container.
    ///
    /// # Errors
    ///
    /// [`NotFound`](DescriptorError::NotFound) if no such container exists.
    pub fn container(&mut self, name: &str) -> Result<ContainerInitializer<'_>, DescriptorError> {
        let Some(container) = self.descriptor.find_container(name).map(|c| c.key) else {
            return Err(DescriptorError::NotFound {
                class: self.descriptor.class.name(),
                name: name.into(),
            });
        };
        Ok(ContainerInitializer {
            descriptor: &mut *self.descriptor,
            container,
        })
    }

    /// Replaces the reason provider of a member attribute.
    ///
    /// # Errors
    ///
    /// - [`NotFound`](DescriptorError::NotFound) if no member has this name;
    ///   the descriptor is left unchanged.
    /// - [`IllegalReason`](DescriptorError::IllegalReason) if the new reason
    ///   is not legal for an attribute.
    pub fn override_invalidation_reason(
        &mut self,
        name: &str,
        reason: impl Into<ReasonProvider>,
    ) -> Result<(), DescriptorError> {
        self.descriptor.override_reason(None, name, reason.into())
    }

    /// Replaces or chains the value-changed callback of a member attribute.
    ///
    /// # Errors
    ///
    /// [`NotFound`](DescriptorError::NotFound) if no member has this name; the
    /// descriptor is left unchanged.
    pub fn override_on_value_changed<F>(
        &mut self,
        name: &str,
        mode: CallbackOverride,
        callback: F,
    ) -> Result<(), DescriptorError>
    where
        F: Fn(&WidgetRef<'_>) + Send + Sync + 'static,
    {
        self.descriptor
            .override_callback(None, name, mode, Arc::new(callback))
    }
}

/// Declares and overrides attributes of one container.
#[derive(Debug)]
pub struct ContainerInitializer<'a> {
    descriptor: &'a mut AttributeDescriptor,
    container: ContainerKey,
}

impl ContainerInitializer<'_> {
    /// Key of the container.
    #[must_use]
    pub fn key(&self) -> ContainerKey {
        self.container
    }

    /// Declares an attribute instantiated once per slot of this container.
    ///
    /// # Errors
    ///
    /// Same as [`AttributeInitializer::add_member_attribute`], with names
    /// scoped to this container.
    pub fn add_contained_attribute<T: AttributeValue>(
        &mut self,
        name: &'static str,
        reason: impl Into<ReasonProvider>,
        default: T,
    ) -> Result<ContainedEntry<'_, T>, DescriptorError> {
        let index = self
            .descriptor
            .declare(Some(self.container), name, reason.into(), default)?;
        Ok(ContainedEntry {
            entry: &mut self.descriptor.entries[index],
            container: self.container,
            _marker: PhantomData,
        })
    }

    /// Replaces the reason provider of an attribute in this container.
    ///
    /// # Errors
    ///
    /// See [`AttributeInitializer::override_invalidation_reason`].
    pub fn override_invalidation_reason(
        &mut self,
        name: &str,
        reason: impl Into<ReasonProvider>,
    ) -> Result<(), DescriptorError> {
        self.descriptor
            .override_reason(Some(self.container), name, reason.into())
    }

    /// Replaces or chains the value-changed callback of an attribute in this
    /// container.
    ///
    /// # Errors
    ///
    /// See [`AttributeInitializer::override_on_value_changed`].
    pub fn override_on_value_changed<F>(
        &mut self,
        name: &str,
        mode: CallbackOverride,
        callback: F,
    ) -> Result<(), DescriptorError>
    where
        F: Fn(&WidgetRef<'_>) + Send + Sync + 'static,
    {
        self.descriptor
            .override_callback(Some(self.container), name, mode, Arc::new(callback))
    }
}

/// Further configuration of a newly declared member attribute.
#[derive(Debug)]
pub struct MemberEntry<'a, T> {
    entry: &'a mut AttributeEntry,
    _marker: PhantomData<fn() -> T>,
}

impl<T: AttributeValue> MemberEntry<'_, T> {
    /// Requires `name` to be updated before this attribute in every pass.
    pub fn update_prerequisite(self, name: &'static str) -> Self {
        self.entry.prerequisite = Some(name);
        self
    }

    /// Marks the attribute as able to toggle the widget's visibility.
    ///
    /// Such attributes are evaluated even while the widget is collapsed, and
    /// must be ordered against the `Visibility` attribute through a
    /// prerequisite in either direction.
    pub fn affect_visibility(self) -> Self {
        self.entry.affects_visibility = true;
        self
    }

    /// Installs the value-changed callback.
    pub fn on_value_changed<F>(self, callback: F) -> Self
    where
        F: Fn(&WidgetRef<'_>) + Send + Sync + 'static,
    {
        self.entry.on_value_changed = Some(Arc::new(callback));
        self
    }

    /// Sets an explicit sort order instead of the declaration-based default.
    pub fn sort_order(self, order: u32) -> Self {
        self.entry.sort_order = order;
        self
    }

    /// Replaces the equality predicate used for change detection.
    pub fn identical_with(self, identical: fn(&T, &T) -> bool) -> Self {
        set_identical(self.entry, identical);
        self
    }

    /// Key of the attribute.
    #[must_use]
    pub fn key(&self) -> AttributeKey {
        self.entry.key
    }

    /// Typed handle to the attribute.
    #[must_use]
    pub fn handle(&self) -> AttributeHandle<T> {
        AttributeHandle::new(self.entry.key)
    }
}

/// Further configuration of a newly declared contained attribute.
#[derive(Debug)]
pub struct ContainedEntry<'a, T> {
    entry: &'a mut AttributeEntry,
    container: ContainerKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T: AttributeValue> ContainedEntry<'_, T> {
    /// Requires `name` (in the same container) to be updated first.
    pub fn update_prerequisite(self, name: &'static str) -> Self {
        self.entry.prerequisite = Some(name);
        self
    }

    /// Installs the value-changed callback.
    pub fn on_value_changed<F>(self, callback: F) -> Self
    where
        F: Fn(&WidgetRef<'_>) + Send + Sync + 'static,
    {
        self.entry.on_value_changed = Some(Arc::new(callback));
        self
    }

    /// Sets an explicit sort order within the container.
    pub fn sort_order(self, order: u32) -> Self {
        self.entry.sort_order = order;
        self
    }

    /// Replaces the equality predicate used for change detection.
    pub fn identical_with(self, identical: fn(&T, &T) -> bool) -> Self {
        set_identical(self.entry, identical);
        self
    }

    /// Typed handle to the attribute.
    #[must_use]
    pub fn handle(&self) -> ContainedHandle<T> {
        ContainedHandle::new(self.container, self.entry.key)
    }
}

fn set_identical<T: AttributeValue>(entry: &mut AttributeEntry, identical: fn(&T, &T) -> bool) {
    if let Some(prototype) = with_identical(&entry.prototype, identical) {
        entry.prototype = prototype;
    }
}

impl AttributeDescriptor {
    fn declare<T: AttributeValue>(
        &mut self,
        scope: Option<ContainerKey>,
        name: &'static str,
        reason: ReasonProvider,
        default: T,
    ) -> Result<usize, DescriptorError> {
        self.check_legal(name, &reason)?;
        if let Some(existing) = self.find_index(scope, name) {
            return Err(DescriptorError::DuplicateName {
                class: self.class.name(),
                name: name.into(),
                inherited: self.entries[existing].declared_by != self.class,
            });
        }
        let index = self.entries.len();
        let sort_order = self.next_sort_order();
        self.entries.push(AttributeEntry {
            name,
            key: AttributeKey(key_index(index)),
            container: scope,
            reason,
            sort_order,
            prerequisite: None,
            affects_visibility: false,
            on_value_changed: None,
            declared_by: self.class,
            prototype: Arc::new(TypedPrototype::new(default)),
        });
        Ok(index)
    }

    fn override_reason(
        &mut self,
        scope: Option<ContainerKey>,
        name: &str,
        reason: ReasonProvider,
    ) -> Result<(), DescriptorError> {
        let index = self.require(scope, name)?;
        self.check_legal(name, &reason)?;
        self.entries[index].reason = reason;
        Ok(())
    }

    fn override_callback(
        &mut self,
        scope: Option<ContainerKey>,
        name: &str,
        mode: CallbackOverride,
        callback: Arc<super::ValueChangedFn>,
    ) -> Result<(), DescriptorError> {
        let index = self.require(scope, name)?;
        self.entries[index].override_callback(mode, callback);
        Ok(())
    }

    fn require(&self, scope: Option<ContainerKey>, name: &str) -> Result<usize, DescriptorError> {
        self.find_index(scope, name)
            .ok_or_else(|| DescriptorError::NotFound {
                class: self.class.name(),
                name: name.into(),
            })
    }

    fn check_legal(&self, name: &str, reason: &ReasonProvider) -> Result<(), DescriptorError> {
        if reason.is_attribute_legal() {
            Ok(())
        } else {
            Err(DescriptorError::IllegalReason {
                class: self.class.name(),
                attribute: name.into(),
                reason: reason.upper_bound(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::class::BaseWidget;
    use crate::error::ErrorKind;
    use crate::invalidation::InvalidationReason;
    use crate::descriptor::ClassId;
    use crate::widget::WidgetTree;

    enum Base {}
    enum Panel {}
    enum Derived {}
    enum Boxed {}

    fn base() -> AttributeDescriptor {
        let mut d = AttributeDescriptor::new(ClassId::named::<Base>("Base"));
        let mut init = AttributeInitializer::new(&mut d);
        init.add_member_attribute("Color", InvalidationReason::PAINT, 0_u32)
            .expect("Color");
        init.add_member_attribute("Width", InvalidationReason::LAYOUT, 0.0_f32)
            .expect("Width");
        d
    }

    #[test]
    fn default_sort_order_uses_spacing() {
        let d = base();
        let color = d.find_by_name("Color").expect("Color");
        let width = d.find_by_name("Width").expect("Width");
        assert_eq!(color.sort_order(), 0);
        assert_eq!(width.sort_order(), super::super::SORT_ORDER_SPACING);
        assert_eq!(color.key(), AttributeKey(0));
        assert_eq!(width.key(), AttributeKey(1));
        assert_eq!(color.declared_by(), "Base");
    }

    #[test]
    fn illegal_reason_rejected() {
        let mut d = AttributeDescriptor::new(ClassId::named::<Panel>("Panel"));
        let mut init = AttributeInitializer::new(&mut d);
        let err = init
            .add_member_attribute("Slots", InvalidationReason::CHILD_ORDER, 0_u8)
            .expect_err("CHILD_ORDER is illegal");
        assert!(matches!(err, DescriptorError::IllegalReason { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let computed = ReasonProvider::computed(
            InvalidationReason::LAYOUT | InvalidationReason::ATTRIBUTE_REGISTRATION,
            |_| InvalidationReason::LAYOUT,
        );
        assert!(
            init.add_member_attribute("Dynamic", computed, 0_u8).is_err(),
            "the bound of a computed provider is checked"
        );
        assert!(d.entries().is_empty(), "rejected entries are not added");
    }

    #[test]
    fn duplicate_names() {
        let mut d = base().derive(ClassId::named::<Derived>("Derived"));
        let mut init = AttributeInitializer::new(&mut d);
        init.add_member_attribute("Height", InvalidationReason::LAYOUT, 0_i32)
            .expect("Height");
        let err = init
            .add_member_attribute("Height", InvalidationReason::LAYOUT, 0_i32)
            .expect_err("same level");
        assert_eq!(
            err,
            DescriptorError::DuplicateName {
                class: "Derived",
                name: "Height".into(),
                inherited: false,
            }
        );
        let err = init
            .add_member_attribute("Color", InvalidationReason::PAINT, 0_u32)
            .expect_err("inherited");
        assert!(matches!(
            err,
            DescriptorError::DuplicateName {
                inherited: true,
                ..
            }
        ));
    }

    #[test]
    fn same_name_classes_stay_distinct() {
        enum Twin {}
        enum OtherTwin {}

        let mut d = AttributeDescriptor::new(ClassId::named::<Twin>("Twin"));
        AttributeInitializer::new(&mut d)
            .add_member_attribute("Size", InvalidationReason::LAYOUT, 0_u32)
            .expect("Size");
        let mut derived = d.derive(ClassId::named::<OtherTwin>("Twin"));
        let mut init = AttributeInitializer::new(&mut derived);
        let err = init
            .add_member_attribute("Size", InvalidationReason::LAYOUT, 0_u32)
            .expect_err("inherited");
        assert_eq!(
            err,
            DescriptorError::DuplicateName {
                class: "Twin",
                name: "Size".into(),
                inherited: true,
            }
        );
        let size = derived.find_by_name("Size").expect("Size");
        assert_ne!(size.declaring_class(), derived.class());
        assert_eq!(size.declaring_class(), d.class());
    }

    #[test]
    fn override_missing_name_leaves_descriptor_unchanged() {
        let mut d = base().derive(ClassId::named::<Derived>("Derived"));
        let before = format!("{:?}", d.entries());
        let mut init = AttributeInitializer::new(&mut d);
        let err = init
            .override_invalidation_reason("Missing", InvalidationReason::PAINT)
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = init
            .override_on_value_changed("Missing", CallbackOverride::ReplacePrevious, |_| {})
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(format!("{:?}", d.entries()), before);
    }

    #[test]
    fn override_keeps_key_and_sort_order() {
        let mut d = base().derive(ClassId::named::<Derived>("Derived"));
        let mut init = AttributeInitializer::new(&mut d);
        init.override_invalidation_reason(
            "Color",
            InvalidationReason::PAINT | InvalidationReason::LAYOUT,
        )
        .expect("override");
        let color = d.find_by_name("Color").expect("Color");
        assert_eq!(color.key(), AttributeKey(0));
        assert_eq!(color.sort_order(), 0);
        assert_eq!(
            color.reason().upper_bound(),
            InvalidationReason::PAINT | InvalidationReason::LAYOUT
        );
        assert_eq!(color.declared_by(), "Base");
    }

    #[test]
    fn override_with_illegal_reason_fails() {
        let mut d = base().derive(ClassId::named::<Derived>("Derived"));
        let mut init = AttributeInitializer::new(&mut d);
        let err = init
            .override_invalidation_reason("Color", InvalidationReason::CHILD_ORDER)
            .expect_err("illegal");
        assert!(matches!(err, DescriptorError::IllegalReason { .. }));
        assert_eq!(
            d.find_by_name("Color").expect("Color").reason().upper_bound(),
            InvalidationReason::PAINT
        );
    }

    #[test]
    fn callback_override_modes() {
        static LOG: Mutex<Vec<&str>> = Mutex::new(Vec::new());

        let mut d = AttributeDescriptor::new(ClassId::named::<Base>("Base"));
        let mut init = AttributeInitializer::new(&mut d);
        init.add_member_attribute("A", InvalidationReason::PAINT, 0_u8)
            .expect("A")
            .on_value_changed(|_| LOG.lock().expect("log").push("base"));
        init.override_on_value_changed("A", CallbackOverride::ExecuteAfterPrevious, |_| {
            LOG.lock().expect("log").push("after");
        })
        .expect("after");
        init.override_on_value_changed("A", CallbackOverride::ExecuteBeforePrevious, |_| {
            LOG.lock().expect("log").push("before");
        })
        .expect("before");

        let mut tree = WidgetTree::new();
        let id = tree.create_widget::<BaseWidget>().expect("root class");
        let entry = d.find_by_name("A").expect("A");
        entry.notify(&tree.widget(id));
        assert_eq!(*LOG.lock().expect("log"), ["before", "base", "after"]);

        let mut init = AttributeInitializer::new(&mut d);
        init.override_on_value_changed("A", CallbackOverride::ReplacePrevious, |_| {
            LOG.lock().expect("log").push("replaced");
        })
        .expect("replace");
        LOG.lock().expect("log").clear();
        let entry = d.find_by_name("A").expect("A");
        entry.notify(&tree.widget(id));
        assert_eq!(*LOG.lock().expect("log"), ["replaced"]);
    }

    #[test]
    fn containers_scope_names_and_share_order_sequence() {
        let mut d = AttributeDescriptor::new(ClassId::named::<Boxed>("Box"));
        let mut init = AttributeInitializer::new(&mut d);
        init.add_member_attribute("Padding", InvalidationReason::LAYOUT, 0_u8)
            .expect("Padding");
        let slots = {
            let mut slots = init.add_container("Slots").expect("Slots");
            slots
                .add_contained_attribute("Padding", InvalidationReason::LAYOUT, 0_u8)
                .expect("contained names are scoped to the container");
            let err = slots
                .add_contained_attribute("Padding", InvalidationReason::LAYOUT, 0_u8)
                .expect_err("duplicate in container");
            assert!(matches!(err, DescriptorError::DuplicateName { .. }));
            slots.key()
        };
        assert!(init.add_container("Slots").is_err(), "duplicate container");
        init.add_member_attribute("Opacity", InvalidationReason::PAINT, 0_u8)
            .expect("Opacity");
        assert!(init.container("Missing").is_err());

        let container = d.find_container("Slots").expect("Slots");
        assert_eq!(container.key(), slots);
        assert_eq!(container.sort_order(), 100);
        let contained = d.find_contained(slots, "Padding").expect("contained");
        assert_eq!(contained.sort_order(), 200);
        assert_eq!(d.find_by_name("Opacity").expect("Opacity").sort_order(), 300);
        assert_eq!(d.members().count(), 2);
        assert_eq!(d.contained(slots).count(), 1);
    }

    #[test]
    fn explicit_sort_order_and_handle() {
        let mut d = base().derive(ClassId::named::<Derived>("Derived"));
        let mut init = AttributeInitializer::new(&mut d);
        let handle = init
            .add_member_attribute("Tint", InvalidationReason::PAINT, 0_u32)
            .expect("Tint")
            .sort_order(50)
            .update_prerequisite("Color")
            .handle();
        let tint = d.find_by_key(handle.key()).expect("Tint");
        assert_eq!(tint.name(), "Tint");
        assert_eq!(tint.sort_order(), 50);
        assert_eq!(tint.prerequisite(), Some("Color"));
    }
}
