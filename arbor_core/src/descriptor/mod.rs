// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-class attribute metadata.
//!
//! An [`AttributeDescriptor`] holds every attribute a class declares or
//! inherits:
//!
//! - **Member attributes** exist once per widget instance.
//! - **Containers** group *contained* attributes that exist once per child
//!   slot of that container. Prerequisites and sort orders of contained
//!   attributes are scoped to their container.
//!
//! Descriptors are built by a class's registration routine through an
//! [`AttributeInitializer`] operating on a deep copy of the base class's
//! descriptor, then [resolved](AttributeDescriptor::resolve) once into the
//! per-pass update order.
//!
//! # Identity
//!
//! An [`AttributeKey`] is the index of the entry in the descriptor. Deriving
//! copies the base entries in place, so keys and sort orders of inherited
//! attributes never change. Overrides replace only the reason provider and
//! the value-changed callback.

mod builder;
mod entry;
mod resolve;

pub use builder::{AttributeInitializer, ContainedEntry, ContainerInitializer, MemberEntry};
pub use entry::{
    AttributeEntry, AttributeKey, CallbackOverride, ClassId, ContainerEntry, ContainerKey,
    SORT_ORDER_SPACING, ValueChangedFn,
};
pub use resolve::{OrderItem, ResolvedOrder};

use core::fmt;

/// Name of the attribute that carries a widget's own visibility.
pub const VISIBILITY_ATTRIBUTE: &str = "Visibility";

/// Attribute metadata of one class, including inherited entries.
#[derive(Clone)]
pub struct AttributeDescriptor {
    class: ClassId,
    entries: Vec<AttributeEntry>,
    containers: Vec<ContainerEntry>,
    /// Number of declarations so far; drives default sort orders.
    declarations: u32,
}

impl AttributeDescriptor {
    /// Creates an empty descriptor for a root class.
    pub(crate) fn new(class: ClassId) -> Self {
        Self {
            class,
            entries: Vec::new(),
            containers: Vec::new(),
            declarations: 0,
        }
    }

    /// Deep-copies this descriptor as the starting point of a derived class.
    pub(crate) fn derive(&self, class: ClassId) -> Self {
        let mut derived = self.clone();
        derived.class = class;
        derived
    }

    /// Name of the class owning this descriptor.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.class.name()
    }

    /// Identity of the class owning this descriptor.
    #[must_use]
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// All entries (members and contained), indexed by key.
    #[must_use]
    pub fn entries(&self) -> &[AttributeEntry] {
        &self.entries
    }

    /// Member attributes in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &AttributeEntry> + '_ {
        self.entries.iter().filter(|e| e.container.is_none())
    }

    /// Attributes of `container` in declaration order.
    pub fn contained(&self, container: ContainerKey) -> impl Iterator<Item = &AttributeEntry> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.container == Some(container))
    }

    /// Declared containers, indexed by key.
    #[must_use]
    pub fn containers(&self) -> &[ContainerEntry] {
        &self.containers
    }

    /// Looks up an entry by key.
    #[must_use]
    pub fn find_by_key(&self, key: AttributeKey) -> Option<&AttributeEntry> {
        self.entries.get(key.0 as usize)
    }

    /// Looks up a member attribute by name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&AttributeEntry> {
        self.find_index(None, name).map(|i| &self.entries[i])
    }

    /// Looks up an attribute of `container` by name.
    #[must_use]
    pub fn find_contained(&self, container: ContainerKey, name: &str) -> Option<&AttributeEntry> {
        self.find_index(Some(container), name)
            .map(|i| &self.entries[i])
    }

    /// Looks up a container by name.
    #[must_use]
    pub fn find_container(&self, name: &str) -> Option<&ContainerEntry> {
        self.containers.iter().find(|c| c.name == name)
    }

    fn find_index(&self, scope: Option<ContainerKey>, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.container == scope && e.name == name)
    }

    fn next_sort_order(&mut self) -> u32 {
        let order = self.declarations.saturating_mul(SORT_ORDER_SPACING);
        self.declarations += 1;
        order
    }
}

impl fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("class", &self.class.name())
            .field(
                "entries",
                &self.entries.iter().map(|e| e.name).collect::<Vec<_>>(),
            )
            .field(
                "containers",
                &self.containers.iter().map(|c| c.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Converts a collection index into a key index.
#[expect(
    clippy::cast_possible_truncation,
    reason = "attribute and container counts are far below u32::MAX"
)]
const fn key_index(index: usize) -> u32 {
    index as u32
}
