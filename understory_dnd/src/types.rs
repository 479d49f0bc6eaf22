// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared input and state types for the drag engine.
//!
//! Pointer and button conventions match the rest of the Understory interaction
//! crates: a contact is identified by a non-zero 64-bit id so mouse and touch
//! input share one namespace, and an absent id or button normalizes to 1.

use core::num::NonZeroU64;

use kurbo::Point;

/// Pointer identifier for tracking a specific mouse/touch contact.
pub type PointerId = NonZeroU64;

/// Mouse button identifier.
pub type Button = u8;

/// The primary button. Only primary-button presses start a drag.
pub const PRIMARY_BUTTON: Button = 1;

/// Normalize an optional pointer id; absent means "the default contact".
pub(crate) fn pointer_or_default(pointer: Option<PointerId>) -> PointerId {
    pointer.unwrap_or(PointerId::MIN)
}

/// Lifecycle phase of a draggable.
///
/// The phases are mutually exclusive by construction; [`DragPhase::facets`]
/// derives the destructurable boolean view.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragPhase {
    /// The draggable is resting at its original position.
    Idle,
    /// The draggable is currently being dragged.
    Dragging,
    /// The draggable was released but is not yet idle, e.g. it is running a
    /// return animation.
    Returning,
}

impl DragPhase {
    /// The three mutually exclusive boolean facets of this phase.
    pub const fn facets(self) -> StateFacets {
        StateFacets {
            idle: matches!(self, Self::Idle),
            dragging: matches!(self, Self::Dragging),
            returning: matches!(self, Self::Returning),
        }
    }
}

/// Destructurable view of a [`DragPhase`]: exactly one field is true.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateFacets {
    /// True while the draggable rests at its original position.
    pub idle: bool,
    /// True while the draggable is being dragged.
    pub dragging: bool,
    /// True between release and the completion of a return animation.
    pub returning: bool,
}

/// How the host should position the draggable's root node.
///
/// The root node is the only part of a draggable subtree whose positioning
/// mode changes: it participates in flow layout while idle and is fixed at
/// the last drag position while dragging.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PositionMode {
    /// Participate in normal flow layout.
    Flow,
    /// Fixed at the given screen position.
    Fixed(Point),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facets_are_mutually_exclusive() {
        for phase in [DragPhase::Idle, DragPhase::Dragging, DragPhase::Returning] {
            let StateFacets {
                idle,
                dragging,
                returning,
            } = phase.facets();
            let set = [idle, dragging, returning]
                .iter()
                .filter(|f| **f)
                .count();
            assert_eq!(set, 1, "exactly one facet must be true for {phase:?}");
        }
    }

    #[test]
    fn absent_pointer_normalizes_to_default_contact() {
        assert_eq!(pointer_or_default(None), PointerId::MIN);
        let seven = PointerId::new(7).unwrap();
        assert_eq!(pointer_or_default(Some(seven)), seven);
    }
}
