// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fade-out/fade-in return animation.
//!
//! ## Overview
//!
//! [`FadeOnReturn`] is a consumer of the drag machine's `returning` state and
//! the completion-signal contract: it arms a fresh [`ReturnSignal`] at the
//! start of every drag, fades the draggable out at its last drag position
//! once it starts returning, fades it back in at its idle slot, and resolves
//! the paired [`ReturnHandle`] when the fade-in completes — at which point
//! the host's next [`poll_returned`](crate::machine::DragMachine::poll_returned)
//! takes the machine back to idle.
//!
//! The helper is timestamp-driven: call [`update`](FadeOnReturn::update)
//! once per frame with the current time in milliseconds and render the
//! returned [`FadeFrame`]. It also occupies a level of the draggable's size
//! chain, like any decorator wrapper, so an inner wrapper nested below it
//! still wins size authority.
//!
//! [`ReturnSignal`]: crate::machine::ReturnSignal

use kurbo::Size;

use crate::context::{DraggableContext, SizeHandle, SizeRelay};
use crate::machine::{ReturnHandle, return_signal};
use crate::types::PositionMode;

/// Steps of the fade animation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FadeStep {
    /// Not animating; the draggable is rendered as-is.
    Inactive,
    /// Fading out at the last drag position.
    Hiding,
    /// Fading back in at the idle slot.
    Appearing,
}

/// What the host should render for the current frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FadeFrame {
    /// Opacity of the draggable's content, in `0.0..=1.0`.
    pub opacity: f64,
    /// Positioning for the wrapper: fixed at the last drag position while
    /// hiding, flow otherwise.
    pub position: PositionMode,
}

/// Return-animation wrapper that fades out where the drag ended and fades
/// back in at the idle position.
#[derive(Debug)]
pub struct FadeOnReturn<P> {
    drag: DraggableContext<P>,
    size: SizeHandle<P>,
    duration_ms: u64,
    step: FadeStep,
    step_started: u64,
    handle: Option<ReturnHandle>,
    was_dragging: bool,
}

impl<P: Clone> FadeOnReturn<P> {
    /// Duration of each fade leg when none is specified.
    pub const DEFAULT_DURATION_MS: u64 = 250;

    /// Create the wrapper with the default duration.
    pub fn new(drag: DraggableContext<P>, relay: &SizeRelay<P>) -> Self {
        Self::with_duration(drag, relay, Self::DEFAULT_DURATION_MS)
    }

    /// Create the wrapper with an explicit per-leg duration.
    pub fn with_duration(drag: DraggableContext<P>, relay: &SizeRelay<P>, duration_ms: u64) -> Self {
        Self {
            drag,
            size: relay.attach(),
            duration_ms,
            step: FadeStep::Inactive,
            step_started: 0,
            handle: None,
            was_dragging: false,
        }
    }

    /// The current animation step.
    pub fn step(&self) -> FadeStep {
        self.step
    }

    /// Forward the wrapper's measured content size up the chain.
    ///
    /// Call whenever the wrapped content's box changes; `None` clears it.
    pub fn set_measured(&self, size: Option<Size>) {
        self.size.report(size);
    }

    /// Advance the animation and describe the frame to render at `now_ms`.
    pub fn update(&mut self, now_ms: u64) -> FadeFrame {
        let facets = self.drag.facets();

        // Arm a fresh signal at the start of every drag; the machine
        // discards the previous one each time it idles.
        if facets.dragging && !self.was_dragging {
            let (handle, signal) = return_signal();
            self.drag.set_return_signal(signal);
            self.handle = Some(handle);
        }
        self.was_dragging = facets.dragging;

        if facets.returning {
            if self.step == FadeStep::Inactive {
                self.step = FadeStep::Hiding;
                self.step_started = now_ms;
            }
        } else {
            self.step = FadeStep::Inactive;
        }

        let opacity = match self.step {
            FadeStep::Inactive => 1.0,
            FadeStep::Hiding => {
                let t = progress(self.step_started, now_ms, self.duration_ms);
                if t >= 1.0 {
                    self.step = FadeStep::Appearing;
                    self.step_started = now_ms;
                    0.0
                } else {
                    1.0 - t
                }
            }
            FadeStep::Appearing => {
                let t = progress(self.step_started, now_ms, self.duration_ms);
                if t >= 1.0 {
                    if let Some(handle) = self.handle.take() {
                        handle.resolve();
                    }
                    1.0
                } else {
                    t
                }
            }
        };

        let position = if self.step == FadeStep::Hiding {
            PositionMode::Fixed(self.drag.last_drag_position())
        } else {
            PositionMode::Flow
        };

        FadeFrame { opacity, position }
    }
}

fn progress(started: u64, now: u64, duration: u64) -> f64 {
    if duration == 0 {
        return 1.0;
    }
    (now.saturating_sub(started) as f64 / duration as f64).clamp(0.0, 1.0)
}
