// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ghost sizing helpers.
//!
//! A ghost is the placeholder shown in the draggable's original slot while
//! the draggable is not idle. Rendering is the host's business; these helpers
//! compute the ghost's dimensions from the tracked idle size.

use kurbo::Size;

use crate::context::{DraggableContext, GhostContext};

/// An invisible ghost that fills the space the draggable occupied.
#[derive(Clone, Debug)]
pub struct EmptySpaceGhost<P> {
    ghost: GhostContext<P>,
}

impl<P: Clone> EmptySpaceGhost<P> {
    /// Create a ghost bound to a draggable's size view.
    pub fn new(ghost: GhostContext<P>) -> Self {
        Self { ghost }
    }

    /// The ghost's current dimensions: the tracked idle size.
    pub fn size(&self) -> Size {
        self.ghost.size()
    }
}

/// A ghost that shrinks from the tracked size to nothing while dragging.
///
/// Timestamp-driven: feed [`size`](ShrinkingGhost::size) the current time in
/// milliseconds on every frame. The shrink restarts on each new drag.
#[derive(Clone, Debug)]
pub struct ShrinkingGhost<P> {
    ghost: GhostContext<P>,
    drag: DraggableContext<P>,
    duration_ms: u64,
    shrink_started: Option<u64>,
}

impl<P: Clone> ShrinkingGhost<P> {
    /// Create a shrinking ghost with the given animation duration.
    pub fn new(ghost: GhostContext<P>, drag: DraggableContext<P>, duration_ms: u64) -> Self {
        Self {
            ghost,
            drag,
            duration_ms,
            shrink_started: None,
        }
    }

    /// The ghost's dimensions at `now_ms`.
    ///
    /// Interpolates the tracked size toward zero while the draggable is
    /// being dragged, and snaps back to the full size otherwise.
    pub fn size(&mut self, now_ms: u64) -> Size {
        let full = self.ghost.size();
        if self.drag.facets().dragging {
            let started = *self.shrink_started.get_or_insert(now_ms);
            let remaining = 1.0 - progress(started, now_ms, self.duration_ms);
            Size::new(full.width * remaining, full.height * remaining)
        } else {
            self.shrink_started = None;
            full
        }
    }
}

fn progress(started: u64, now: u64, duration: u64) -> f64 {
    if duration == 0 {
        return 1.0;
    }
    (now.saturating_sub(started) as f64 / duration as f64).clamp(0.0, 1.0)
}
