// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update-order resolution.
//!
//! Each scope (the member attributes plus containers, and separately the
//! attributes of each container) is ordered by a stable topological sort:
//! an attribute follows its prerequisite, and among the attributes that are
//! ready at any point the lowest `(sort_order, declaration index)` goes first.
//! Two declarations that are not related by prerequisites therefore keep
//! their relative order no matter what else is declared around them.

use std::collections::BTreeSet;

use super::entry::{AttributeKey, ContainerKey};
use super::{AttributeDescriptor, VISIBILITY_ATTRIBUTE};
use crate::error::DescriptorError;

/// One step of a class's member update order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderItem {
    /// A member attribute.
    Attribute(AttributeKey),
    /// Every slot of a container, in slot order, each slot running the
    /// container's own resolved order.
    Container(ContainerKey),
}

/// The resolved update order of a class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedOrder {
    items: Vec<OrderItem>,
    contained: Vec<Vec<AttributeKey>>,
}

impl ResolvedOrder {
    /// Member attributes and containers in update order.
    #[must_use]
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Member attributes in update order.
    pub fn attributes(&self) -> impl Iterator<Item = AttributeKey> + '_ {
        self.items.iter().filter_map(|item| match item {
            OrderItem::Attribute(key) => Some(*key),
            OrderItem::Container(_) => None,
        })
    }

    /// Attributes of `container` in update order.
    #[must_use]
    pub fn contained(&self, container: ContainerKey) -> &[AttributeKey] {
        self.contained
            .get(container.0 as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

struct Node {
    item: OrderItem,
    name: &'static str,
    sort_order: u32,
    prerequisite: Option<&'static str>,
}

impl AttributeDescriptor {
    /// Computes the update order.
    ///
    /// # Errors
    ///
    /// - [`UnknownPrerequisite`](DescriptorError::UnknownPrerequisite) if a
    ///   prerequisite names nothing in the attribute's scope.
    /// - [`PrerequisiteCycle`](DescriptorError::PrerequisiteCycle) if
    ///   prerequisites form a cycle.
    /// - [`VisibilityPrerequisite`](DescriptorError::VisibilityPrerequisite)
    ///   if a visibility-affecting attribute has no direct prerequisite edge
    ///   with the `Visibility` attribute.
    pub fn resolve(&self) -> Result<ResolvedOrder, DescriptorError> {
        self.check_visibility_rule()?;

        let mut members: Vec<Node> = self
            .members()
            .map(|e| Node {
                item: OrderItem::Attribute(e.key),
                name: e.name,
                sort_order: e.sort_order,
                prerequisite: e.prerequisite,
            })
            .collect();
        members.extend(self.containers.iter().map(|c| Node {
            item: OrderItem::Container(c.key),
            name: c.name,
            sort_order: c.sort_order,
            prerequisite: None,
        }));
        let items = self.sort_scope(&members)?;

        let mut contained = Vec::with_capacity(self.containers.len());
        for container in &self.containers {
            let nodes: Vec<Node> = self
                .contained(container.key)
                .map(|e| Node {
                    item: OrderItem::Attribute(e.key),
                    name: e.name,
                    sort_order: e.sort_order,
                    prerequisite: e.prerequisite,
                })
                .collect();
            let keys = self
                .sort_scope(&nodes)?
                .into_iter()
                .filter_map(|item| match item {
                    OrderItem::Attribute(key) => Some(key),
                    OrderItem::Container(_) => None,
                })
                .collect();
            contained.push(keys);
        }

        Ok(ResolvedOrder { items, contained })
    }

    fn sort_scope(&self, nodes: &[Node]) -> Result<Vec<OrderItem>, DescriptorError> {
        let n = nodes.len();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut prerequisite_of: Vec<Option<usize>> = vec![None; n];
        let mut pending = vec![0_usize; n];

        for (i, node) in nodes.iter().enumerate() {
            let Some(name) = node.prerequisite else {
                continue;
            };
            let Some(p) = nodes
                .iter()
                .position(|o| matches!(o.item, OrderItem::Attribute(_)) && o.name == name)
            else {
                return Err(DescriptorError::UnknownPrerequisite {
                    class: self.class.name(),
                    attribute: node.name.into(),
                    prerequisite: name.into(),
                });
            };
            dependents[p].push(i);
            prerequisite_of[i] = Some(p);
            pending[i] += 1;
        }

        let mut ready: BTreeSet<(u32, usize)> = (0..n)
            .filter(|&i| pending[i] == 0)
            .map(|i| (nodes[i].sort_order, i))
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some((_, i)) = ready.pop_first() {
            order.push(nodes[i].item);
            for &d in &dependents[i] {
                pending[d] -= 1;
                if pending[d] == 0 {
                    ready.insert((nodes[d].sort_order, d));
                }
            }
        }

        if order.len() < n {
            return Err(DescriptorError::PrerequisiteCycle {
                class: self.class.name(),
                attributes: cycle_names(nodes, &pending, &prerequisite_of),
            });
        }
        Ok(order)
    }

    fn check_visibility_rule(&self) -> Result<(), DescriptorError> {
        let visibility = self.find_by_name(VISIBILITY_ATTRIBUTE);
        for entry in self.entries.iter().filter(|e| e.affects_visibility) {
            if entry.container.is_none() && entry.name == VISIBILITY_ATTRIBUTE {
                continue;
            }
            let ordered = entry.container.is_none()
                && visibility.is_some_and(|v| {
                    entry.prerequisite == Some(v.name) || v.prerequisite == Some(entry.name)
                });
            if !ordered {
                return Err(DescriptorError::VisibilityPrerequisite {
                    class: self.class.name(),
                    attribute: entry.name.into(),
                });
            }
        }
        Ok(())
    }
}

/// Extracts one cycle from the nodes left unplaced by the sort.
///
/// Every unplaced node waits on exactly one unplaced prerequisite, so
/// following prerequisite links from any of them must revisit a node.
fn cycle_names(nodes: &[Node], pending: &[usize], prerequisite_of: &[Option<usize>]) -> Vec<String> {
    let Some(start) = (0..nodes.len()).find(|&i| pending[i] > 0) else {
        return Vec::new();
    };
    let mut visited_at: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut path = Vec::new();
    let mut current = start;
    loop {
        if let Some(at) = visited_at[current] {
            let mut names: Vec<String> = path[at..]
                .iter()
                .map(|&i: &usize| nodes[i].name.to_owned())
                .collect();
            names.push(nodes[current].name.to_owned());
            return names;
        }
        visited_at[current] = Some(path.len());
        path.push(current);
        match prerequisite_of[current] {
            Some(next) => current = next,
            None => return path.iter().map(|&i| nodes[i].name.to_owned()).collect(),
        }
    }
}
