// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! [`DescriptorError`] covers everything that can go wrong while a class's
//! attribute metadata is built: configuration errors are fatal for the class,
//! [`NotFound`](DescriptorError::NotFound) is reported at the call site that
//! named a missing attribute. [`BindingError`] is the recoverable failure of a
//! single bound getter and never escapes the update loop.

use thiserror::Error;

use crate::invalidation::InvalidationReason;

/// Broad classification of a [`DescriptorError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The declarations are inconsistent; the class cannot be built.
    Configuration,
    /// A name lookup failed.
    NotFound,
}

/// Failure while declaring, overriding, or resolving attribute metadata.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// An attribute reason intersects `CHILD_ORDER | ATTRIBUTE_REGISTRATION`.
    #[error("attribute `{attribute}` of `{class}` cannot carry invalidation reason {reason}")]
    IllegalReason {
        /// Class being built.
        class: &'static str,
        /// Offending attribute.
        attribute: String,
        /// Declared reason (or upper bound of a computed provider).
        reason: InvalidationReason,
    },
    /// The name is already declared in the same scope.
    #[error("`{name}` is already declared in `{class}`{}", inherited_suffix(.inherited))]
    DuplicateName {
        /// Class being built.
        class: &'static str,
        /// Duplicated name.
        name: String,
        /// Whether the existing declaration is inherited.
        inherited: bool,
    },
    /// A prerequisite names an attribute absent from the same scope.
    #[error("attribute `{attribute}` of `{class}` has unknown prerequisite `{prerequisite}`")]
    UnknownPrerequisite {
        /// Class being built.
        class: &'static str,
        /// Attribute declaring the prerequisite.
        attribute: String,
        /// Missing prerequisite name.
        prerequisite: String,
    },
    /// Prerequisites form a cycle.
    #[error("prerequisite cycle in `{class}`: {}", cycle_path(.attributes))]
    PrerequisiteCycle {
        /// Class being built.
        class: &'static str,
        /// Attributes along the cycle, first name repeated at the end.
        attributes: Vec<String>,
    },
    /// A visibility-affecting attribute is not ordered against `Visibility`.
    #[error(
        "attribute `{attribute}` of `{class}` affects visibility but has no \
         prerequisite relationship with `Visibility`"
    )]
    VisibilityPrerequisite {
        /// Class being built.
        class: &'static str,
        /// Offending attribute.
        attribute: String,
    },
    /// A typed lookup requested a different value type than declared.
    #[error("attribute `{attribute}` of `{class}` holds `{declared}`, not `{requested}`")]
    TypeMismatch {
        /// Class queried.
        class: &'static str,
        /// Attribute queried.
        attribute: String,
        /// Declared value type.
        declared: &'static str,
        /// Requested value type.
        requested: &'static str,
    },
    /// A name lookup found nothing in the composed hierarchy.
    #[error("`{name}` is not declared by `{class}` or its base classes")]
    NotFound {
        /// Class queried.
        class: &'static str,
        /// Missing name.
        name: String,
    },
}

impl DescriptorError {
    /// Returns the broad classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::Configuration,
        }
    }

    /// Returns the class whose metadata produced this error.
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::IllegalReason { class, .. }
            | Self::DuplicateName { class, .. }
            | Self::UnknownPrerequisite { class, .. }
            | Self::PrerequisiteCycle { class, .. }
            | Self::VisibilityPrerequisite { class, .. }
            | Self::TypeMismatch { class, .. }
            | Self::NotFound { class, .. } => class,
        }
    }
}

fn inherited_suffix(inherited: &bool) -> &'static str {
    if *inherited { " by a base class" } else { "" }
}

fn cycle_path(attributes: &[String]) -> String {
    attributes.join(" -> ")
}

/// A bound getter could not produce a value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("binding failed: {message}")]
pub struct BindingError {
    message: String,
}

impl BindingError {
    /// Creates a binding error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
