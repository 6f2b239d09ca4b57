// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only widget views handed to bindings and callbacks.

use core::fmt;

use super::id::WidgetId;
use super::tree::WidgetTree;
use crate::attribute::{AttributeHandle, AttributeValue, ContainedHandle};
use crate::class::{BaseWidget, ClassMetadata};
use crate::visibility::Visibility;

/// A shared view of one live widget.
///
/// Bindings, reason providers and value-changed callbacks receive a
/// `WidgetRef` of the widget that owns the attribute. For a contained
/// attribute that is the widget owning the container, not the child in the
/// slot.
#[derive(Clone, Copy)]
pub struct WidgetRef<'a> {
    tree: &'a WidgetTree,
    id: WidgetId,
}

impl<'a> WidgetRef<'a> {
    pub(crate) fn new(tree: &'a WidgetTree, id: WidgetId) -> Self {
        Self { tree, id }
    }

    /// Handle of the widget.
    #[must_use]
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// The tree containing the widget.
    #[must_use]
    pub fn tree(&self) -> &'a WidgetTree {
        self.tree
    }

    /// Class metadata of the widget.
    #[must_use]
    pub fn class(&self) -> &'static ClassMetadata {
        self.tree.class(self.id)
    }

    /// Current value of a member attribute.
    ///
    /// # Panics
    ///
    /// Panics if the widget's class has no such attribute of type `T`.
    #[must_use]
    pub fn get<T: AttributeValue>(&self, handle: AttributeHandle<T>) -> &'a T {
        self.tree.get(self.id, handle)
    }

    /// Current value of a contained attribute in the slot holding `child`.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not a child of this widget in the handle's
    /// container.
    #[must_use]
    pub fn slot_get<T: AttributeValue>(&self, child: WidgetId, handle: ContainedHandle<T>) -> &'a T {
        assert!(
            self.tree.parent(child) == Some(self.id),
            "{child:?} is not a child of {:?}",
            self.id
        );
        self.tree.slot_get(child, handle)
    }

    /// The widget's own visibility.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.tree.visibility(self.id)
    }

    /// Whether the widget is enabled.
    ///
    /// Classes outside the [`BaseWidget`] hierarchy are always enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        if self.class().is::<BaseWidget>() {
            *self.get(BaseWidget::ENABLED)
        } else {
            true
        }
    }

    /// The parent widget, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.tree.parent(self.id).map(|id| Self::new(self.tree, id))
    }

    /// The children, in slot order.
    pub fn children(&self) -> impl Iterator<Item = WidgetRef<'a>> + 'a {
        let tree = self.tree;
        tree.children(self.id).map(move |id| Self::new(tree, id))
    }
}

impl fmt::Debug for WidgetRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRef")
            .field("id", &self.id)
            .field("class", &self.class().name())
            .finish_non_exhaustive()
    }
}
