// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute and container metadata records.

use core::any::TypeId;
use core::fmt;
use std::sync::Arc;

use crate::attribute::AttributePrototype;
use crate::class::WidgetClass;
use crate::invalidation::ReasonProvider;
use crate::widget::WidgetRef;

/// Distance between the default sort orders of consecutive declarations.
///
/// Leaves room for a derived class to place a new attribute between two
/// inherited ones with an explicit [`sort_order`](super::MemberEntry::sort_order).
pub const SORT_ORDER_SPACING: u32 = 100;

/// Stable identifier of a declared attribute.
///
/// Keys are issued at registration and survive inheritance unchanged: a key
/// obtained from a base class addresses the same attribute in every derived
/// class.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey(pub(crate) u32);

impl AttributeKey {
    /// Returns the raw index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeKey({})", self.0)
    }
}

/// Stable identifier of a declared container.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerKey(pub(crate) u32);

impl ContainerKey {
    /// Returns the raw index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainerKey({})", self.0)
    }
}

/// Identity of a widget class.
///
/// Two classes are the same only if they are the same Rust type; the name is
/// carried for diagnostics and may be shared by unrelated classes.
#[derive(Clone, Copy)]
pub struct ClassId {
    type_id: TypeId,
    name: &'static str,
}

impl ClassId {
    /// Identity of the class `T`.
    #[must_use]
    pub fn of<T: WidgetClass>() -> Self {
        Self::new(TypeId::of::<T>(), T::NAME)
    }

    pub(crate) const fn new(type_id: TypeId, name: &'static str) -> Self {
        Self { type_id, name }
    }

    /// The class's `TypeId`.
    #[inline]
    #[must_use]
    pub const fn type_id(self) -> TypeId {
        self.type_id
    }

    /// The class's display name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
impl ClassId {
    /// Identity keyed by the marker type `T`, for descriptors built by hand.
    pub(crate) fn named<T: 'static>(name: &'static str) -> Self {
        Self::new(TypeId::of::<T>(), name)
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ClassId {}

impl core::hash::Hash for ClassId {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.name)
    }
}

/// Signature of a value-changed callback.
pub type ValueChangedFn = dyn Fn(&WidgetRef<'_>) + Send + Sync;

/// How an overriding value-changed callback combines with the existing one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallbackOverride {
    /// Drop the existing callback.
    #[default]
    ReplacePrevious,
    /// Run the existing callback, then the new one.
    ExecuteAfterPrevious,
    /// Run the new callback, then the existing one.
    ExecuteBeforePrevious,
}

/// Static metadata for one declared attribute.
#[derive(Clone)]
pub struct AttributeEntry {
    pub(crate) name: &'static str,
    pub(crate) key: AttributeKey,
    pub(crate) container: Option<ContainerKey>,
    pub(crate) reason: ReasonProvider,
    pub(crate) sort_order: u32,
    pub(crate) prerequisite: Option<&'static str>,
    pub(crate) affects_visibility: bool,
    pub(crate) on_value_changed: Option<Arc<ValueChangedFn>>,
    pub(crate) declared_by: ClassId,
    pub(crate) prototype: Arc<dyn AttributePrototype>,
}

impl AttributeEntry {
    /// Attribute name, unique within its scope.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stable key.
    #[must_use]
    pub fn key(&self) -> AttributeKey {
        self.key
    }

    /// Owning container, or `None` for a member attribute.
    #[must_use]
    pub fn container(&self) -> Option<ContainerKey> {
        self.container
    }

    /// Reason reported when the value changes.
    #[must_use]
    pub fn reason(&self) -> &ReasonProvider {
        &self.reason
    }

    /// Tie-break order among attributes not constrained by prerequisites.
    #[must_use]
    pub fn sort_order(&self) -> u32 {
        self.sort_order
    }

    /// Name of the attribute that must update first, if any.
    #[must_use]
    pub fn prerequisite(&self) -> Option<&'static str> {
        self.prerequisite
    }

    /// Whether a change may toggle the owning widget's visibility.
    #[must_use]
    pub fn affects_visibility(&self) -> bool {
        self.affects_visibility
    }

    /// Whether a value-changed callback is installed.
    #[must_use]
    pub fn has_value_changed_callback(&self) -> bool {
        self.on_value_changed.is_some()
    }

    /// Name of the class that declared the attribute.
    #[must_use]
    pub fn declared_by(&self) -> &'static str {
        self.declared_by.name
    }

    /// Identity of the class that declared the attribute.
    #[must_use]
    pub fn declaring_class(&self) -> ClassId {
        self.declared_by
    }

    /// Name of the value type.
    #[must_use]
    pub fn value_type_name(&self) -> &'static str {
        self.prototype.value_type_name()
    }

    pub(crate) fn value_type(&self) -> TypeId {
        self.prototype.value_type()
    }

    /// Runs the value-changed callback, if any.
    pub(crate) fn notify(&self, widget: &WidgetRef<'_>) {
        if let Some(callback) = &self.on_value_changed {
            callback(widget);
        }
    }

    pub(crate) fn override_callback(&mut self, mode: CallbackOverride, callback: Arc<ValueChangedFn>) {
        let merged: Arc<ValueChangedFn> = match (mode, self.on_value_changed.take()) {
            (CallbackOverride::ReplacePrevious, _) | (_, None) => callback,
            (CallbackOverride::ExecuteAfterPrevious, Some(previous)) => {
                Arc::new(move |widget: &WidgetRef<'_>| {
                    previous(widget);
                    callback(widget);
                })
            }
            (CallbackOverride::ExecuteBeforePrevious, Some(previous)) => {
                Arc::new(move |widget: &WidgetRef<'_>| {
                    callback(widget);
                    previous(widget);
                })
            }
        };
        self.on_value_changed = Some(merged);
    }
}

impl fmt::Debug for AttributeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeEntry")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("container", &self.container)
            .field("reason", &self.reason)
            .field("sort_order", &self.sort_order)
            .field("prerequisite", &self.prerequisite)
            .field("affects_visibility", &self.affects_visibility)
            .field("on_value_changed", &self.on_value_changed.is_some())
            .field("declared_by", &self.declared_by.name)
            .field("value_type", &self.value_type_name())
            .finish()
    }
}

/// Static metadata for a container of per-slot attributes.
#[derive(Clone, Debug)]
pub struct ContainerEntry {
    pub(crate) name: &'static str,
    pub(crate) key: ContainerKey,
    pub(crate) sort_order: u32,
    pub(crate) declared_by: ClassId,
}

impl ContainerEntry {
    /// Container name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stable key.
    #[must_use]
    pub fn key(&self) -> ContainerKey {
        self.key
    }

    /// Position of the container's block among member attributes.
    #[must_use]
    pub fn sort_order(&self) -> u32 {
        self.sort_order
    }

    /// Name of the class that declared the container.
    #[must_use]
    pub fn declared_by(&self) -> &'static str {
        self.declared_by.name
    }

    /// Identity of the class that declared the container.
    #[must_use]
    pub fn declaring_class(&self) -> ClassId {
        self.declared_by
    }
}
