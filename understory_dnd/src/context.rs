// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ambient access surfaces for descendants of a draggable.
//!
//! ## Overview
//!
//! Code that renders inside a draggable — ghosts, return-animation wrappers,
//! payload-setting content — should not own the [`DragMachine`]; it observes
//! and pokes it through the handles in this module:
//!
//! - [`SharedDraggable`]: the owning handle the host keeps; hands out the
//!   views below.
//! - [`DraggableContext`]: state facets, last drag position, `set_payload`,
//!   `set_return_signal`.
//! - [`GhostContext`]: the tracked idle size for ghost renderers.
//! - [`SizeRelay`] / [`SizeHandle`]: the measurement channel for decorator
//!   wrappers; a handle detaches its level (leaving proxy mode upstream)
//!   when dropped.
//!
//! ## Detached defaults
//!
//! Every view has a detached form — obtained from its `detached()`
//! constructor, or observed when the machine has been dropped. A detached
//! view degrades safely instead of crashing: reads return idle/unknown
//! defaults and writes are warning no-ops (via the `log` facade). This keeps
//! a component usable, if inert, outside any draggable.
//!
//! All sharing is single-threaded (`Rc`); the engine's model has no
//! preemption between input and lifecycle callbacks.

use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;

use kurbo::{Point, Size};

use crate::machine::{DragMachine, ReturnSignal};
use crate::size::SizeLevelId;
use crate::types::{DragPhase, StateFacets};

type Shared<P> = Rc<RefCell<DragMachine<P>>>;

/// Owning handle that makes a [`DragMachine`] shareable with descendants.
pub struct SharedDraggable<P> {
    inner: Shared<P>,
}

impl<P: Clone> SharedDraggable<P> {
    /// Wrap a machine for sharing.
    pub fn new(machine: DragMachine<P>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(machine)),
        }
    }

    /// Run `f` with exclusive access to the machine.
    ///
    /// This is how the host drives input:
    /// `shared.with(|m| m.on_pointer_move(..))`. Do not call it re-entrantly
    /// from inside a receiver handler.
    pub fn with<R>(&self, f: impl FnOnce(&mut DragMachine<P>) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    /// An attached state/payload view.
    pub fn context(&self) -> DraggableContext<P> {
        DraggableContext {
            inner: Some(Rc::downgrade(&self.inner)),
        }
    }

    /// An attached ghost-size view.
    pub fn ghost(&self) -> GhostContext<P> {
        GhostContext {
            inner: Some(Rc::downgrade(&self.inner)),
        }
    }

    /// An attached size-propagation channel.
    pub fn size_relay(&self) -> SizeRelay<P> {
        SizeRelay {
            inner: Some(Rc::downgrade(&self.inner)),
        }
    }
}

impl<P> Clone for SharedDraggable<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P> fmt::Debug for SharedDraggable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDraggable").finish_non_exhaustive()
    }
}

/// State and payload view of the nearest draggable.
pub struct DraggableContext<P> {
    inner: Option<Weak<RefCell<DragMachine<P>>>>,
}

impl<P: Clone> DraggableContext<P> {
    /// The view used outside any draggable: idle, warning no-op setters.
    pub fn detached() -> Self {
        Self { inner: None }
    }

    /// Whether this view currently reaches a live machine.
    pub fn is_attached(&self) -> bool {
        self.upgrade().is_some()
    }

    /// The current state facets; idle when detached.
    pub fn facets(&self) -> StateFacets {
        self.upgrade()
            .map_or(DragPhase::Idle.facets(), |m| m.borrow().facets())
    }

    /// The last position of the draggable while it was being dragged.
    ///
    /// Not guaranteed to be meaningful before the first drag; the origin
    /// when detached.
    pub fn last_drag_position(&self) -> Point {
        self.upgrade()
            .map_or(Point::ZERO, |m| m.borrow().last_drag_position())
    }

    /// Replace the payload sent to receivers for the current gesture.
    pub fn set_payload(&self, payload: P) {
        match self.upgrade() {
            Some(machine) => machine.borrow_mut().set_payload(payload),
            None => log::warn!("called set_payload on a detached DraggableContext"),
        }
    }

    /// Register the completion signal awaited before returning → idle.
    ///
    /// Meant to be called while dragging; see
    /// [`DragMachine::set_return_signal`].
    pub fn set_return_signal(&self, signal: ReturnSignal) {
        match self.upgrade() {
            Some(machine) => machine.borrow_mut().set_return_signal(signal),
            None => log::warn!("called set_return_signal on a detached DraggableContext"),
        }
    }

    fn upgrade(&self) -> Option<Shared<P>> {
        self.inner.as_ref()?.upgrade()
    }
}

impl<P> Clone for DraggableContext<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Clone> Default for DraggableContext<P> {
    fn default() -> Self {
        Self::detached()
    }
}

impl<P> fmt::Debug for DraggableContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraggableContext")
            .field("attached", &self.inner.is_some())
            .finish()
    }
}

/// Tracked-size view for ghost renderers.
pub struct GhostContext<P> {
    inner: Option<Weak<RefCell<DragMachine<P>>>>,
}

impl<P: Clone> GhostContext<P> {
    /// The view used outside any draggable.
    pub fn detached() -> Self {
        Self { inner: None }
    }

    /// The draggable's tracked idle size.
    ///
    /// NaN×NaN until a measurement is available, and when detached.
    pub fn size(&self) -> Size {
        self.inner
            .as_ref()
            .and_then(Weak::upgrade)
            .and_then(|m| m.borrow().ghost_size())
            .unwrap_or(Size::new(f64::NAN, f64::NAN))
    }
}

impl<P> Clone for GhostContext<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Clone> Default for GhostContext<P> {
    fn default() -> Self {
        Self::detached()
    }
}

impl<P> fmt::Debug for GhostContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GhostContext")
            .field("attached", &self.inner.is_some())
            .finish()
    }
}

/// The size-propagation channel handed to decorator wrappers.
pub struct SizeRelay<P> {
    inner: Option<Weak<RefCell<DragMachine<P>>>>,
}

impl<P: Clone> SizeRelay<P> {
    /// The channel used outside any draggable: attachments are inert.
    pub fn detached() -> Self {
        Self { inner: None }
    }

    /// Attach a new deepest wrapper level and get its reporting handle.
    ///
    /// On a detached relay this warns and returns an inert handle.
    pub fn attach(&self) -> SizeHandle<P> {
        let inner = self.inner.as_ref().and_then(Weak::upgrade);
        let Some(machine) = inner else {
            log::warn!("called attach on a detached SizeRelay; measurements will be dropped");
            return SizeHandle {
                inner: None,
                level: None,
            };
        };
        let level = machine.borrow_mut().size_chain_mut().attach();
        SizeHandle {
            inner: self.inner.clone(),
            level: Some(level),
        }
    }
}

impl<P> Clone for SizeRelay<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Clone> Default for SizeRelay<P> {
    fn default() -> Self {
        Self::detached()
    }
}

impl<P> fmt::Debug for SizeRelay<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeRelay")
            .field("attached", &self.inner.is_some())
            .finish()
    }
}

/// One wrapper level of the size chain.
///
/// Report measurements whenever the wrapper's box changes; drop the handle on
/// wrapper teardown — that detaches the level, returning authority to the
/// next wrapper up the chain.
pub struct SizeHandle<P> {
    inner: Option<Weak<RefCell<DragMachine<P>>>>,
    level: Option<SizeLevelId>,
}

impl<P: Clone> SizeHandle<P> {
    /// Record this wrapper's own measurement; `None` clears it.
    pub fn report(&self, size: Option<Size>) {
        let machine = self.inner.as_ref().and_then(Weak::upgrade);
        match (machine, self.level) {
            (Some(machine), Some(level)) => {
                machine.borrow_mut().size_chain_mut().report(level, size);
            }
            _ => log::warn!("called report on a detached SizeHandle; measurement dropped"),
        }
    }

    /// Whether this handle reaches a live chain level.
    pub fn is_attached(&self) -> bool {
        self.level.is_some() && self.inner.as_ref().and_then(Weak::upgrade).is_some()
    }
}

impl<P> Drop for SizeHandle<P> {
    fn drop(&mut self) {
        if let (Some(weak), Some(level)) = (self.inner.as_ref(), self.level)
            && let Some(machine) = weak.upgrade()
        {
            machine.borrow_mut().size_chain_mut().detach(level);
        }
    }
}

impl<P> fmt::Debug for SizeHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeHandle")
            .field("level", &self.level)
            .finish()
    }
}
