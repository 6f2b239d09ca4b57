// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime attribute values and typed handles.
//!
//! Every widget instance owns one [`Attribute<T>`] per declared attribute of
//! its class. A box holds either a literal value or a *binding*: a getter
//! evaluated against the owning widget once per update pass. Only bound boxes
//! take part in the pass; literal values cannot change on their own.
//!
//! Boxes are addressed through typed handles ([`AttributeHandle`],
//! [`ContainedHandle`]) that wrap the stable key issued at registration, so
//! no name lookup happens on the hot path.
//!
//! # Baseline
//!
//! Binding does not evaluate the getter. The first pass after a bind stores
//! the getter's result as the baseline without reporting an invalidation or
//! running the value-changed callback. Later passes compare against it.

use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use crate::descriptor::{AttributeDescriptor, AttributeKey, ContainerKey};
use crate::error::BindingError;
use crate::widget::WidgetRef;

/// Bounds required of an attribute value type.
///
/// Defaults are stored in process-wide class metadata, hence `Send + Sync`.
pub trait AttributeValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T> AttributeValue for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// Signature of a fallible binding.
pub type Getter<T> = dyn Fn(&WidgetRef<'_>) -> Result<T, BindingError>;

enum Binding<T> {
    Literal,
    Bound {
        getter: Box<Getter<T>>,
        baseline_pending: bool,
    },
}

/// A per-instance attribute value: a literal or a bound getter.
pub struct Attribute<T> {
    key: AttributeKey,
    value: T,
    binding: Binding<T>,
    identical: fn(&T, &T) -> bool,
}

impl<T: AttributeValue> Attribute<T> {
    pub(crate) fn new(key: AttributeKey, value: T, identical: fn(&T, &T) -> bool) -> Self {
        Self {
            key,
            value,
            binding: Binding::Literal,
            identical,
        }
    }

    /// Key of the declared attribute.
    #[inline]
    #[must_use]
    pub fn key(&self) -> AttributeKey {
        self.key
    }

    /// Current value.
    #[inline]
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Whether the value comes from a binding.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound { .. })
    }

    /// Stores a literal, dropping any binding. Returns whether the stored
    /// value changed.
    pub(crate) fn set(&mut self, value: T) -> bool {
        self.binding = Binding::Literal;
        if (self.identical)(&self.value, &value) {
            return false;
        }
        self.value = value;
        true
    }

    /// Installs a getter. Only a bind over a literal starts with a silent
    /// baseline; replacing a getter compares its first result against the
    /// stored value.
    pub(crate) fn bind(&mut self, getter: Box<Getter<T>>) {
        let baseline_pending = match &self.binding {
            Binding::Literal => true,
            Binding::Bound {
                baseline_pending, ..
            } => *baseline_pending,
        };
        self.binding = Binding::Bound {
            getter,
            baseline_pending,
        };
    }

    /// Drops the binding and keeps the current value as a literal. Returns
    /// whether a binding was removed.
    pub(crate) fn unbind(&mut self) -> bool {
        let was_bound = self.is_bound();
        self.binding = Binding::Literal;
        was_bound
    }
}

impl<T> fmt::Debug for Attribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("key", &self.key)
            .field("bound", &matches!(self.binding, Binding::Bound { .. }))
            .finish_non_exhaustive()
    }
}

/// Outcome of evaluating a binding.
pub(crate) enum Polled {
    Unchanged,
    Baseline(Box<dyn Any>),
    Changed(Box<dyn Any>),
}

/// Type-erased view of an [`Attribute<T>`] used by the update loop.
pub(crate) trait ErasedAttribute {
    fn is_bound(&self) -> bool;

    /// Evaluates the binding without touching the stored value.
    fn poll(&self, widget: &WidgetRef<'_>) -> Result<Polled, BindingError>;

    /// Stores a value produced by [`poll`](Self::poll) and clears the pending
    /// baseline.
    fn store(&mut self, value: Box<dyn Any>);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: AttributeValue> ErasedAttribute for Attribute<T> {
    fn is_bound(&self) -> bool {
        Self::is_bound(self)
    }

    fn poll(&self, widget: &WidgetRef<'_>) -> Result<Polled, BindingError> {
        let Binding::Bound {
            getter,
            baseline_pending,
        } = &self.binding
        else {
            return Ok(Polled::Unchanged);
        };
        let value = getter(widget)?;
        Ok(if *baseline_pending {
            Polled::Baseline(Box::new(value))
        } else if (self.identical)(&self.value, &value) {
            Polled::Unchanged
        } else {
            Polled::Changed(Box::new(value))
        })
    }

    fn store(&mut self, value: Box<dyn Any>) {
        if let Ok(value) = value.downcast::<T>() {
            self.value = *value;
        }
        if let Binding::Bound {
            baseline_pending, ..
        } = &mut self.binding
        {
            *baseline_pending = false;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Creates the per-instance box for a declared attribute.
pub(crate) trait AttributePrototype: Send + Sync {
    fn instantiate(&self, key: AttributeKey) -> Box<dyn ErasedAttribute>;

    fn value_type(&self) -> TypeId;

    fn value_type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct TypedPrototype<T> {
    default: T,
    identical: fn(&T, &T) -> bool,
}

impl<T: AttributeValue> TypedPrototype<T> {
    pub(crate) fn new(default: T) -> Self {
        Self {
            default,
            identical: |a, b| a == b,
        }
    }
}

impl<T: AttributeValue> AttributePrototype for TypedPrototype<T> {
    fn instantiate(&self, key: AttributeKey) -> Box<dyn ErasedAttribute> {
        Box::new(Attribute::new(key, self.default.clone(), self.identical))
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn value_type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Returns a copy of `prototype` that compares values with `identical`, or
/// `None` if the prototype does not hold `T`.
pub(crate) fn with_identical<T: AttributeValue>(
    prototype: &Arc<dyn AttributePrototype>,
    identical: fn(&T, &T) -> bool,
) -> Option<Arc<dyn AttributePrototype>> {
    let typed = prototype.as_any().downcast_ref::<TypedPrototype<T>>()?;
    Some(Arc::new(TypedPrototype {
        default: typed.default.clone(),
        identical,
    }))
}

/// The attribute boxes of one widget (members) or one slot (contained).
///
/// Indexed by [`AttributeKey`]; entries outside the set's scope are `None`.
#[derive(Default)]
pub(crate) struct AttributeSet {
    boxes: Vec<Option<Box<dyn ErasedAttribute>>>,
}

impl AttributeSet {
    /// Instantiates the member attributes of a class.
    pub(crate) fn members(descriptor: &AttributeDescriptor) -> Self {
        Self::instantiate(descriptor, None)
    }

    /// Instantiates the attributes of one slot in `container`.
    pub(crate) fn contained(descriptor: &AttributeDescriptor, container: ContainerKey) -> Self {
        Self::instantiate(descriptor, Some(container))
    }

    fn instantiate(descriptor: &AttributeDescriptor, scope: Option<ContainerKey>) -> Self {
        let boxes = descriptor
            .entries()
            .iter()
            .map(|entry| {
                (entry.container == scope).then(|| entry.prototype.instantiate(entry.key))
            })
            .collect();
        Self { boxes }
    }

    pub(crate) fn get(&self, key: AttributeKey) -> Option<&dyn ErasedAttribute> {
        self.boxes.get(key.0 as usize)?.as_deref()
    }

    pub(crate) fn get_mut(
        &mut self,
        key: AttributeKey,
    ) -> Option<&mut (dyn ErasedAttribute + 'static)> {
        self.boxes.get_mut(key.0 as usize)?.as_deref_mut()
    }

    pub(crate) fn typed<T: AttributeValue>(&self, key: AttributeKey) -> Option<&Attribute<T>> {
        self.get(key)?.as_any().downcast_ref()
    }

    pub(crate) fn typed_mut<T: AttributeValue>(
        &mut self,
        key: AttributeKey,
    ) -> Option<&mut Attribute<T>> {
        self.get_mut(key)?.as_any_mut().downcast_mut()
    }

    pub(crate) fn is_bound(&self, key: AttributeKey) -> bool {
        self.get(key).is_some_and(|a| a.is_bound())
    }

    pub(crate) fn any_bound(&self) -> bool {
        self.boxes.iter().flatten().any(|b| b.is_bound())
    }
}

impl fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSet")
            .field("len", &self.boxes.iter().flatten().count())
            .finish_non_exhaustive()
    }
}

/// Typed handle to a member attribute.
pub struct AttributeHandle<T> {
    key: AttributeKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AttributeHandle<T> {
    pub(crate) const fn new(key: AttributeKey) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    /// Key of the attribute.
    #[inline]
    #[must_use]
    pub const fn key(self) -> AttributeKey {
        self.key
    }
}

impl<T> Clone for AttributeHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttributeHandle<T> {}

impl<T> PartialEq for AttributeHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for AttributeHandle<T> {}

impl<T> fmt::Debug for AttributeHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeHandle({})", self.key.0)
    }
}

/// Typed handle to an attribute replicated per child slot.
pub struct ContainedHandle<T> {
    container: ContainerKey,
    key: AttributeKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContainedHandle<T> {
    pub(crate) const fn new(container: ContainerKey, key: AttributeKey) -> Self {
        Self {
            container,
            key,
            _marker: PhantomData,
        }
    }

    /// Key of the owning container.
    #[inline]
    #[must_use]
    pub const fn container(self) -> ContainerKey {
        self.container
    }

    /// Key of the attribute.
    #[inline]
    #[must_use]
    pub const fn key(self) -> AttributeKey {
        self.key
    }
}

impl<T> Clone for ContainedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContainedHandle<T> {}

impl<T> PartialEq for ContainedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.container == other.container && self.key == other.key
    }
}

impl<T> Eq for ContainedHandle<T> {}

impl<T> fmt::Debug for ContainedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContainedHandle({}.{})", self.container.0, self.key.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u32) -> AttributeKey {
        AttributeKey(n)
    }

    #[test]
    fn set_reports_change() {
        let mut attr = Attribute::new(key(0), 1_i32, |a, b| a == b);
        assert!(!attr.set(1), "same value is not a change");
        assert!(attr.set(2));
        assert_eq!(*attr.get(), 2);
    }

    #[test]
    fn set_clears_binding() {
        let mut attr = Attribute::new(key(0), 1_i32, |a, b| a == b);
        attr.bind(Box::new(|_: &WidgetRef<'_>| Ok(5)));
        assert!(attr.is_bound());
        let _ = attr.set(3);
        assert!(!attr.is_bound());
    }

    #[test]
    fn custom_identity_suppresses_change() {
        // Values within 10 of each other count as identical.
        let mut attr = Attribute::new(key(0), 100_i32, |a, b| (a - b).abs() < 10);
        assert!(!attr.set(105));
        assert_eq!(*attr.get(), 100, "identical values are not stored");
        assert!(attr.set(120));
    }

    #[test]
    fn unbind_keeps_value() {
        let mut attr = Attribute::new(key(0), 7_i32, |a, b| a == b);
        assert!(!attr.unbind());
        attr.bind(Box::new(|_: &WidgetRef<'_>| Ok(9)));
        attr.store(Box::new(9_i32));
        assert!(attr.unbind());
        assert_eq!(*attr.get(), 9);
    }

    #[test]
    fn rebind_compares_against_stored_value() {
        let mut attr = Attribute::new(key(0), 0_i32, |a, b| a == b);
        attr.bind(Box::new(|_: &WidgetRef<'_>| Ok(10)));
        assert!(matches!(
            attr.binding,
            Binding::Bound {
                baseline_pending: true,
                ..
            }
        ));
        attr.store(Box::new(10_i32));

        attr.bind(Box::new(|_: &WidgetRef<'_>| Ok(50)));
        assert!(
            matches!(
                attr.binding,
                Binding::Bound {
                    baseline_pending: false,
                    ..
                }
            ),
            "an observed binding is replaced without a new baseline"
        );
        assert_eq!(*attr.get(), 10);
    }

    #[test]
    fn rebind_before_first_pass_keeps_baseline() {
        let mut attr = Attribute::new(key(0), 0_i32, |a, b| a == b);
        attr.bind(Box::new(|_: &WidgetRef<'_>| Ok(1)));
        attr.bind(Box::new(|_: &WidgetRef<'_>| Ok(2)));
        assert!(matches!(
            attr.binding,
            Binding::Bound {
                baseline_pending: true,
                ..
            }
        ));
    }

    #[test]
    fn prototype_instantiates_default() {
        let proto: Arc<dyn AttributePrototype> = Arc::new(TypedPrototype::new(String::from("x")));
        let boxed = proto.instantiate(key(3));
        let attr = boxed
            .as_any()
            .downcast_ref::<Attribute<String>>()
            .expect("prototype builds Attribute<String>");
        assert_eq!(attr.get(), "x");
        assert_eq!(attr.key(), key(3));
        assert_eq!(proto.value_type(), TypeId::of::<String>());
    }

    #[test]
    fn with_identical_requires_matching_type() {
        let proto: Arc<dyn AttributePrototype> = Arc::new(TypedPrototype::new(1_u8));
        assert!(with_identical::<u16>(&proto, |a, b| a == b).is_none());
        let swapped = with_identical::<u8>(&proto, |_, _| true).expect("same type");
        let mut boxed = swapped.instantiate(key(0));
        let attr = boxed
            .as_any_mut()
            .downcast_mut::<Attribute<u8>>()
            .expect("Attribute<u8>");
        assert!(!attr.set(200), "everything is identical under the new predicate");
    }

    #[test]
    fn handles_are_copy_and_compare_by_key() {
        let a = AttributeHandle::<i32>::new(key(4));
        let b = a;
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), "AttributeHandle(4)");
        let c = ContainedHandle::<i32>::new(ContainerKey(1), key(4));
        assert_eq!(c.container(), ContainerKey(1));
        assert_eq!(format!("{c:?}"), "ContainedHandle(1.4)");
    }
}
