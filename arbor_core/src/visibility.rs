// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Widget visibility states.

use core::fmt;

/// Whether a widget is drawn and whether it takes part in hit testing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Drawn and hit-testable.
    #[default]
    Visible,
    /// Not drawn and takes no layout space.
    Collapsed,
    /// Not drawn but still takes layout space.
    Hidden,
    /// Drawn; neither the widget nor its children are hit-testable.
    HitTestInvisible,
    /// Drawn; the widget is not hit-testable but its children are.
    SelfHitTestInvisible,
}

impl Visibility {
    /// Returns whether the widget is drawn.
    #[inline]
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden | Self::Collapsed)
    }

    /// Returns whether the widget itself receives hit tests.
    #[inline]
    #[must_use]
    pub const fn is_hit_test_visible(self) -> bool {
        matches!(self, Self::Visible)
    }

    /// Returns whether children of the widget receive hit tests.
    #[inline]
    #[must_use]
    pub const fn are_children_hit_test_visible(self) -> bool {
        matches!(self, Self::Visible | Self::SelfHitTestInvisible)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Visible => "Visible",
            Self::Collapsed => "Collapsed",
            Self::Hidden => "Hidden",
            Self::HitTestInvisible => "HitTestInvisible",
            Self::SelfHitTestInvisible => "SelfHitTestInvisible",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_states() {
        assert!(Visibility::Visible.is_visible());
        assert!(Visibility::HitTestInvisible.is_visible());
        assert!(Visibility::SelfHitTestInvisible.is_visible());
        assert!(!Visibility::Hidden.is_visible());
        assert!(!Visibility::Collapsed.is_visible());
    }

    #[test]
    fn hit_testing() {
        assert!(Visibility::Visible.is_hit_test_visible());
        assert!(!Visibility::SelfHitTestInvisible.is_hit_test_visible());
        assert!(Visibility::SelfHitTestInvisible.are_children_hit_test_visible());
        assert!(!Visibility::HitTestInvisible.are_children_hit_test_visible());
        assert!(!Visibility::Collapsed.are_children_hit_test_visible());
    }

    #[test]
    fn default_is_visible() {
        assert_eq!(Visibility::default(), Visibility::Visible);
        assert_eq!(Visibility::Collapsed.to_string(), "Collapsed");
    }
}
