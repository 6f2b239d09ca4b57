// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Widget classes and their memoized metadata.
//!
//! A widget class is a Rust type implementing [`WidgetClass`]. The first call
//! to [`ClassMetadata::of`] for a class builds its metadata:
//!
//! 1. Obtain the base class's metadata (building it first if needed).
//! 2. Deep-copy the base descriptor.
//! 3. Run the class's [`register_attributes`](WidgetClass::register_attributes)
//!    against the copy.
//! 4. [Resolve](crate::descriptor::AttributeDescriptor::resolve) the update
//!    order.
//!
//! The result, success or configuration error, is cached for the lifetime of
//! the process. There is no teardown: metadata is referenced by `'static`
//! pointers from every widget of the class.
//!
//! # Concurrency
//!
//! Each class gets a leaked [`OnceLock`] cell from a registry map guarded by a
//! [`parking_lot::Mutex`]. The map lock is released before the cell is
//! initialized, so building a class can recurse into its base class, and
//! concurrent first uses of the same class block on the cell until the single
//! build finishes. After that, access is a lock-free read of the cell plus one
//! short map lookup.

use core::any::{TypeId, type_name};
use core::fmt;
use std::collections::HashMap;
use std::sync::{LazyLock, OnceLock};

use parking_lot::Mutex;

use crate::attribute::{AttributeHandle, AttributeValue, ContainedHandle};
use crate::descriptor::{
    AttributeDescriptor, AttributeEntry, AttributeInitializer, AttributeKey, ClassId,
    ContainerKey, ResolvedOrder, VISIBILITY_ATTRIBUTE,
};
use crate::error::DescriptorError;
use crate::invalidation::InvalidationReason;
use crate::visibility::Visibility;

/// A widget class with declared attributes.
///
/// Implemented by a marker type per class:
///
/// ```
/// use arbor_core::class::WidgetClass;
/// use arbor_core::descriptor::AttributeInitializer;
/// use arbor_core::error::DescriptorError;
/// use arbor_core::invalidation::InvalidationReason;
///
/// struct Label;
///
/// impl WidgetClass for Label {
///     const NAME: &'static str = "Label";
///
///     fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
///         init.add_member_attribute("Text", InvalidationReason::LAYOUT, String::new())?;
///         Ok(())
///     }
/// }
/// ```
pub trait WidgetClass: 'static {
    /// Class name used in diagnostics and errors.
    const NAME: &'static str;

    /// Metadata of the base class, or `None` for a root class.
    ///
    /// Defaults to [`BaseWidget`].
    ///
    /// # Errors
    ///
    /// Propagates the base class's build error.
    fn base_class() -> Result<Option<&'static ClassMetadata>, DescriptorError> {
        ClassMetadata::of::<BaseWidget>().map(Some)
    }

    /// Declares this class's attributes and overrides inherited ones.
    ///
    /// Runs exactly once per process.
    ///
    /// # Errors
    ///
    /// Any error returned by the initializer.
    fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError>;
}

/// The root widget class.
///
/// Declares `Visibility` (reason `VISIBILITY`, affects visibility, default
/// [`Visibility::Visible`]) and `Enabled` (reason `PAINT`, default `true`).
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseWidget;

impl BaseWidget {
    /// The widget's own visibility.
    pub const VISIBILITY: AttributeHandle<Visibility> = AttributeHandle::new(AttributeKey(0));

    /// Whether the widget is enabled.
    pub const ENABLED: AttributeHandle<bool> = AttributeHandle::new(AttributeKey(1));
}

impl WidgetClass for BaseWidget {
    const NAME: &'static str = "Widget";

    fn base_class() -> Result<Option<&'static ClassMetadata>, DescriptorError> {
        Ok(None)
    }

    fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
        init.add_member_attribute(
            VISIBILITY_ATTRIBUTE,
            InvalidationReason::VISIBILITY,
            Visibility::Visible,
        )?
        .affect_visibility();
        init.add_member_attribute("Enabled", InvalidationReason::PAINT, true)?;
        Ok(())
    }
}

type ClassCell = OnceLock<Result<ClassMetadata, DescriptorError>>;

static REGISTRY: LazyLock<Mutex<HashMap<TypeId, &'static ClassCell>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn class_cell(type_id: TypeId) -> &'static ClassCell {
    let mut registry = REGISTRY.lock();
    registry
        .entry(type_id)
        .or_insert_with(|| Box::leak(Box::new(OnceLock::new())))
}

/// Resolved attribute metadata of one widget class.
pub struct ClassMetadata {
    name: &'static str,
    type_id: TypeId,
    parent: Option<&'static ClassMetadata>,
    descriptor: AttributeDescriptor,
    order: ResolvedOrder,
    visibility: Option<AttributeKey>,
}

impl ClassMetadata {
    /// Returns the metadata of `T`, building it on first use.
    ///
    /// # Errors
    ///
    /// The configuration error of `T` or of one of its base classes. The same
    /// error is returned on every call.
    pub fn of<T: WidgetClass>() -> Result<&'static Self, DescriptorError> {
        match class_cell(TypeId::of::<T>()).get_or_init(Self::build::<T>) {
            Ok(metadata) => Ok(metadata),
            Err(e) => Err(e.clone()),
        }
    }

    fn build<T: WidgetClass>() -> Result<Self, DescriptorError> {
        let result = Self::build_uncached::<T>();
        match &result {
            Ok(metadata) => log::debug!(
                "built class `{}` with {} attributes",
                metadata.name,
                metadata.descriptor.entries().len()
            ),
            Err(e) => log::error!("failed to build class `{}`: {e}", T::NAME),
        }
        result
    }

    fn build_uncached<T: WidgetClass>() -> Result<Self, DescriptorError> {
        let parent = T::base_class()?;
        let mut descriptor = match parent {
            Some(parent) => parent.descriptor.derive(ClassId::of::<T>()),
            None => AttributeDescriptor::new(ClassId::of::<T>()),
        };
        T::register_attributes(&mut AttributeInitializer::new(&mut descriptor))?;
        let order = descriptor.resolve()?;
        let visibility = descriptor
            .find_by_name(VISIBILITY_ATTRIBUTE)
            .filter(|e| e.value_type() == TypeId::of::<Visibility>())
            .map(AttributeEntry::key);
        Ok(Self {
            name: T::NAME,
            type_id: TypeId::of::<T>(),
            parent,
            descriptor,
            order,
            visibility,
        })
    }

    /// Class name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type identity of the class marker.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Base class metadata, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&'static Self> {
        self.parent
    }

    /// Returns whether this class is `other` or derives from it.
    #[must_use]
    pub fn is_a(&self, other: &Self) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.type_id == other.type_id {
                return true;
            }
            current = class.parent;
        }
        false
    }

    /// Returns whether this class is `T` or derives from it.
    #[must_use]
    pub fn is<T: WidgetClass>(&self) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.type_id == TypeId::of::<T>() {
                return true;
            }
            current = class.parent;
        }
        false
    }

    /// Composed attribute metadata (inherited and own).
    #[must_use]
    pub fn descriptor(&self) -> &AttributeDescriptor {
        &self.descriptor
    }

    /// Per-pass update order.
    #[must_use]
    pub fn resolved_order(&self) -> &ResolvedOrder {
        &self.order
    }

    /// Key of the `Visibility` attribute, if the class has one.
    #[must_use]
    pub fn visibility_key(&self) -> Option<AttributeKey> {
        self.visibility
    }

    /// Typed handle to a member attribute.
    ///
    /// # Errors
    ///
    /// [`NotFound`](DescriptorError::NotFound) for an unknown name,
    /// [`TypeMismatch`](DescriptorError::TypeMismatch) if the attribute holds
    /// a different type.
    pub fn handle<T: AttributeValue>(&self, name: &str) -> Result<AttributeHandle<T>, DescriptorError> {
        let entry = self.descriptor.find_by_name(name).ok_or_else(|| DescriptorError::NotFound {
            class: self.name,
            name: name.into(),
        })?;
        self.check_type::<T>(entry)?;
        Ok(AttributeHandle::new(entry.key()))
    }

    /// Key of a container.
    ///
    /// # Errors
    ///
    /// [`NotFound`](DescriptorError::NotFound) for an unknown name.
    pub fn container_key(&self, name: &str) -> Result<ContainerKey, DescriptorError> {
        self.descriptor
            .find_container(name)
            .map(|c| c.key())
            .ok_or_else(|| DescriptorError::NotFound {
                class: self.name,
                name: name.into(),
            })
    }

    /// Typed handle to a contained attribute.
    ///
    /// # Errors
    ///
    /// [`NotFound`](DescriptorError::NotFound) for an unknown container or
    /// attribute, [`TypeMismatch`](DescriptorError::TypeMismatch) if the
    /// attribute holds a different type.
    pub fn contained_handle<T: AttributeValue>(
        &self,
        container: &str,
        name: &str,
    ) -> Result<ContainedHandle<T>, DescriptorError> {
        let container = self.container_key(container)?;
        let entry = self
            .descriptor
            .find_contained(container, name)
            .ok_or_else(|| DescriptorError::NotFound {
                class: self.name,
                name: name.into(),
            })?;
        self.check_type::<T>(entry)?;
        Ok(ContainedHandle::new(container, entry.key()))
    }

    fn check_type<T: AttributeValue>(&self, entry: &AttributeEntry) -> Result<(), DescriptorError> {
        if entry.value_type() == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(DescriptorError::TypeMismatch {
                class: self.name,
                attribute: entry.name().into(),
                declared: entry.value_type_name(),
                requested: type_name::<T>(),
            })
        }
    }
}

impl fmt::Debug for ClassMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMetadata")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .field("descriptor", &self.descriptor)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Panel;

    impl WidgetClass for Panel {
        const NAME: &'static str = "Panel";

        fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
            init.add_member_attribute("Padding", InvalidationReason::LAYOUT, 0_u32)?;
            init.add_container("Slots")?.add_contained_attribute(
                "Weight",
                InvalidationReason::LAYOUT,
                1.0_f32,
            )?;
            Ok(())
        }
    }

    struct FancyPanel;

    impl WidgetClass for FancyPanel {
        const NAME: &'static str = "FancyPanel";

        fn base_class() -> Result<Option<&'static ClassMetadata>, DescriptorError> {
            ClassMetadata::of::<Panel>().map(Some)
        }

        fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
            init.override_invalidation_reason("Padding", InvalidationReason::LAYOUT_AND_VOLATILITY)?;
            init.add_member_attribute("Glow", InvalidationReason::PAINT, false)?;
            Ok(())
        }
    }

    struct Broken;

    impl WidgetClass for Broken {
        const NAME: &'static str = "Broken";

        fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
            init.add_member_attribute("A", InvalidationReason::PAINT, 0_u8)?
                .update_prerequisite("B");
            init.add_member_attribute("B", InvalidationReason::PAINT, 0_u8)?
                .update_prerequisite("A");
            Ok(())
        }
    }

    struct BrokenChild;

    impl WidgetClass for BrokenChild {
        const NAME: &'static str = "BrokenChild";

        fn base_class() -> Result<Option<&'static ClassMetadata>, DescriptorError> {
            ClassMetadata::of::<Broken>().map(Some)
        }

        fn register_attributes(_: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
            Ok(())
        }
    }

    #[test]
    fn base_widget_layout() {
        let base = ClassMetadata::of::<BaseWidget>().expect("base");
        assert_eq!(base.name(), "Widget");
        assert!(base.parent().is_none());
        let vis = base.handle::<Visibility>("Visibility").expect("Visibility");
        assert_eq!(vis, BaseWidget::VISIBILITY);
        let enabled = base.handle::<bool>("Enabled").expect("Enabled");
        assert_eq!(enabled, BaseWidget::ENABLED);
        assert_eq!(base.visibility_key(), Some(BaseWidget::VISIBILITY.key()));
        let entry = base.descriptor().find_by_name("Visibility").expect("entry");
        assert!(entry.affects_visibility());
    }

    #[test]
    fn metadata_is_memoized() {
        let a = ClassMetadata::of::<Panel>().expect("Panel");
        let b = ClassMetadata::of::<Panel>().expect("Panel");
        assert!(core::ptr::eq(a, b), "same instance on every call");
    }

    #[test]
    fn derived_class_composes_on_base() {
        let base = ClassMetadata::of::<Panel>().expect("Panel");
        let derived = ClassMetadata::of::<FancyPanel>().expect("FancyPanel");
        assert!(derived.is_a(base));
        assert!(derived.is::<BaseWidget>());
        assert!(!base.is::<FancyPanel>());
        assert!(core::ptr::eq(derived.parent().expect("parent"), base));

        for entry in base.descriptor().entries() {
            let inherited = derived
                .descriptor()
                .find_by_key(entry.key())
                .expect("inherited key");
            assert_eq!(inherited.name(), entry.name());
            assert_eq!(inherited.sort_order(), entry.sort_order());
        }
        let padding = derived.descriptor().find_by_name("Padding").expect("Padding");
        assert_eq!(
            padding.reason().upper_bound(),
            InvalidationReason::LAYOUT_AND_VOLATILITY
        );
        let base_padding = base.descriptor().find_by_name("Padding").expect("Padding");
        assert_eq!(
            base_padding.reason().upper_bound(),
            InvalidationReason::LAYOUT,
            "overrides never leak into the base class"
        );
        assert!(derived.handle::<bool>("Glow").is_ok());
        assert!(base.handle::<bool>("Glow").is_err());
    }

    #[test]
    fn typed_lookups() {
        let panel = ClassMetadata::of::<Panel>().expect("Panel");
        let err = panel.handle::<String>("Padding").expect_err("wrong type");
        assert!(matches!(err, DescriptorError::TypeMismatch { .. }));
        let err = panel.handle::<u32>("Nope").expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let weight = panel
            .contained_handle::<f32>("Slots", "Weight")
            .expect("Weight");
        assert_eq!(weight.container(), panel.container_key("Slots").expect("Slots"));
        assert!(panel.contained_handle::<f32>("Nope", "Weight").is_err());
    }

    #[test]
    fn configuration_errors_are_cached_and_propagate() {
        let first = ClassMetadata::of::<Broken>().expect_err("cycle");
        let second = ClassMetadata::of::<Broken>().expect_err("cycle");
        assert_eq!(first, second);
        assert_eq!(first.kind(), ErrorKind::Configuration);
        let child = ClassMetadata::of::<BrokenChild>().expect_err("base is broken");
        assert_eq!(child, first);
    }
}
