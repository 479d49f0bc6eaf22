// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag events and the one-shot reply channel.
//!
//! ## Overview
//!
//! Three event kinds reach a receiver over the lifetime of a drag gesture:
//!
//! - [`DragEventKind::Enter`] when the receiver becomes the hovered target,
//! - [`DragEventKind::Leave`] when it stops being the hovered target
//!   (including when the originating draggable goes idle while still
//!   hovering, as defensive cleanup),
//! - [`DragEventKind::Drop`] when the drag ends via release over it.
//!
//! Delivery is single-node: an event goes to exactly the receiver resolved by
//! hit testing and never propagates to visual ancestors, so a receiver is not
//! notified of events meant for an unrelated nested receiver.
//!
//! ## Replies
//!
//! Every dispatch carries the sender end of a one-shot response channel.
//! A handler may call [`DragEvent::reply`] with a payload zero or one times;
//! the first reply wins and later calls are ignored. The reply is routed back
//! to the handler registered on the originating machine via
//! [`set_reply_handler`](crate::machine::DragMachine::set_reply_handler),
//! within the same dispatch. Because the channel is created per dispatch,
//! replies can never cross between draggable instances.

use alloc::boxed::Box;
use core::cell::RefCell;
use core::fmt;

/// Kind of a drag event delivered to a receiver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragEventKind {
    /// The receiver became the hovered target.
    Enter,
    /// The receiver stopped being the hovered target.
    Leave,
    /// The drag ended via release over the receiver.
    Drop,
}

/// One-shot reply storage shared between a dispatch and its event.
///
/// Created by the registry for every dispatch and drained by the machine once
/// the handler returns.
pub struct ReplySlot<P> {
    value: RefCell<Option<P>>,
}

impl<P> ReplySlot<P> {
    pub(crate) fn new() -> Self {
        Self {
            value: RefCell::new(None),
        }
    }

    /// Store a reply. The slot is one-shot: later calls are ignored.
    fn send(&self, payload: P) {
        let mut value = self.value.borrow_mut();
        if value.is_none() {
            *value = Some(payload);
        }
    }

    pub(crate) fn take(&self) -> Option<P> {
        self.value.borrow_mut().take()
    }
}

impl<P> fmt::Debug for ReplySlot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplySlot").finish_non_exhaustive()
    }
}

/// A drag event delivered to a receiver's handler.
///
/// Borrows the originating draggable's current payload and the dispatch's
/// reply slot; neither outlives the handler call.
pub struct DragEvent<'a, P> {
    kind: DragEventKind,
    payload: &'a P,
    reply: &'a ReplySlot<P>,
}

impl<'a, P> DragEvent<'a, P> {
    pub(crate) fn new(kind: DragEventKind, payload: &'a P, reply: &'a ReplySlot<P>) -> Self {
        Self {
            kind,
            payload,
            reply,
        }
    }

    /// The kind of this event.
    pub fn kind(&self) -> DragEventKind {
        self.kind
    }

    /// The payload currently carried by the originating draggable.
    pub fn payload(&self) -> &'a P {
        self.payload
    }

    /// Send a payload back to the draggable that produced this event.
    ///
    /// The channel is one-shot: the first reply is delivered to the
    /// originator's reply handler, later calls are ignored.
    pub fn reply(&self, payload: P) {
        self.reply.send(payload);
    }
}

impl<P> fmt::Debug for DragEvent<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragEvent")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Boxed handler invoked with a [`DragEvent`].
pub type DragEventHandler<P> = Box<dyn FnMut(&DragEvent<'_, P>)>;

/// The optional per-kind handlers carried by a registered receiver.
///
/// Each handler is independent; an absent handler means the event kind is
/// ignored. Handlers are replaced wholesale via
/// [`set_handlers`](crate::registry::ReceiverRegistry::set_handlers) when the
/// caller's callbacks change, and dropped with the registry entry.
pub struct ReceiverHandlers<P> {
    on_enter: Option<DragEventHandler<P>>,
    on_leave: Option<DragEventHandler<P>>,
    on_drop: Option<DragEventHandler<P>>,
}

impl<P> ReceiverHandlers<P> {
    /// No handlers; every event kind is ignored.
    pub fn new() -> Self {
        Self {
            on_enter: None,
            on_leave: None,
            on_drop: None,
        }
    }

    /// Set the handler for [`DragEventKind::Enter`].
    #[must_use]
    pub fn on_enter(mut self, handler: impl FnMut(&DragEvent<'_, P>) + 'static) -> Self {
        self.on_enter = Some(Box::new(handler));
        self
    }

    /// Set the handler for [`DragEventKind::Leave`].
    #[must_use]
    pub fn on_leave(mut self, handler: impl FnMut(&DragEvent<'_, P>) + 'static) -> Self {
        self.on_leave = Some(Box::new(handler));
        self
    }

    /// Set the handler for [`DragEventKind::Drop`].
    #[must_use]
    pub fn on_drop(mut self, handler: impl FnMut(&DragEvent<'_, P>) + 'static) -> Self {
        self.on_drop = Some(Box::new(handler));
        self
    }

    pub(crate) fn handle(&mut self, event: &DragEvent<'_, P>) {
        let handler = match event.kind() {
            DragEventKind::Enter => self.on_enter.as_mut(),
            DragEventKind::Leave => self.on_leave.as_mut(),
            DragEventKind::Drop => self.on_drop.as_mut(),
        };
        if let Some(handler) = handler {
            handler(event);
        }
    }
}

impl<P> Default for ReceiverHandlers<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for ReceiverHandlers<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverHandlers")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_leave", &self.on_leave.is_some())
            .field("on_drop", &self.on_drop.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_slot_is_one_shot() {
        let slot: ReplySlot<u32> = ReplySlot::new();
        let event = DragEvent::new(DragEventKind::Drop, &0, &slot);
        event.reply(1);
        event.reply(2);
        assert_eq!(slot.take(), Some(1));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn handlers_dispatch_by_kind() {
        use alloc::rc::Rc;
        use alloc::vec::Vec;

        let seen: Rc<RefCell<Vec<DragEventKind>>> = Rc::new(RefCell::new(Vec::new()));
        let enter_log = seen.clone();
        let drop_log = seen.clone();
        let mut handlers: ReceiverHandlers<u32> = ReceiverHandlers::new()
            .on_enter(move |e| enter_log.borrow_mut().push(e.kind()))
            .on_drop(move |e| drop_log.borrow_mut().push(e.kind()));

        let slot = ReplySlot::new();
        for kind in [DragEventKind::Enter, DragEventKind::Leave, DragEventKind::Drop] {
            handlers.handle(&DragEvent::new(kind, &7, &slot));
        }

        // The leave handler is absent, so only enter and drop are recorded.
        assert_eq!(
            *seen.borrow(),
            [DragEventKind::Enter, DragEventKind::Drop]
        );
    }

    #[test]
    fn event_exposes_payload() {
        let slot: ReplySlot<u32> = ReplySlot::new();
        let event = DragEvent::new(DragEventKind::Enter, &42, &slot);
        assert_eq!(*event.payload(), 42);
    }
}
