// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-draggable drag state machine.
//!
//! ## Overview
//!
//! [`DragMachine`] turns raw pointer input into drag lifecycle transitions
//! and hit tests against a [`ReceiverRegistry`]. It owns all per-gesture
//! state: the current phase, the tracked pointer contact, the drag offset,
//! the hovered receiver, the last drag position, and the payload.
//!
//! ## Transitions
//!
//! - idle → dragging: a cancelable, primary-button down while idle. The
//!   machine records the tracked contact, fixes the last drag position at
//!   the draggable's bounds origin, and computes the offset from pointer to
//!   origin, so `position + offset` reproduces the origin until the pointer
//!   moves.
//! - while dragging: moves from the tracked contact update the position and
//!   hit-test the pointer. On a hover change, *enter* is dispatched to the
//!   new target before *leave* is dispatched to the old one, so a point
//!   crossing between two adjacent receivers never observes a zero-hover
//!   gap. Input from other contacts is ignored.
//! - dragging → returning: an up with the matching button, or a cancel, from
//!   the tracked contact. *Drop* is dispatched to the hovered receiver,
//!   which is then cleared along with the tracked contact.
//! - returning → idle: immediate (within the same call) unless a
//!   [`ReturnSignal`] was registered; then deferred until the signal
//!   resolves, observed via [`DragMachine::poll_returned`].
//!
//! Host event listeners for move/up should be installed only while the
//! machine is dragging and torn down on exit from that phase; the machine
//! mirrors that scoping with phase guards, so stray input outside the
//! expected phase is a no-op either way.
//!
//! ## The returned signal
//!
//! A return-animation consumer registers a [`ReturnSignal`] while dragging
//! and resolves the paired [`ReturnHandle`] when its animation completes.
//! The machine holds the only subscription and discards it on every
//! transition into idle, so a handle resolved late can never force a stale
//! transition — there is nothing left listening. A consumer that never
//! resolves its handle leaves the machine in `returning` indefinitely; that
//! is a caller obligation, not a detected error.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use kurbo::{Point, Rect, Size, Vec2};

use crate::events::DragEventKind;
use crate::registry::{ReceiverId, ReceiverRegistry};
use crate::size::SizeChain;
use crate::types::{
    Button, DragPhase, PointerId, PositionMode, StateFacets, PRIMARY_BUTTON, pointer_or_default,
};

/// Completion token for the returning → idle transition.
///
/// Held by the machine while it waits; dropped (and with it the
/// subscription) on every transition into idle.
#[derive(Debug)]
pub struct ReturnSignal {
    resolved: Rc<Cell<bool>>,
}

impl ReturnSignal {
    fn is_resolved(&self) -> bool {
        self.resolved.get()
    }
}

/// Resolver end of a [`ReturnSignal`], held by the consumer that registered
/// it.
#[derive(Clone, Debug)]
pub struct ReturnHandle {
    resolved: Rc<Cell<bool>>,
}

impl ReturnHandle {
    /// Mark the return as complete.
    ///
    /// Idempotent. Has no effect if the machine already discarded the paired
    /// signal.
    pub fn resolve(&self) {
        self.resolved.set(true);
    }
}

/// Create a connected resolver/signal pair.
pub fn return_signal() -> (ReturnHandle, ReturnSignal) {
    let resolved = Rc::new(Cell::new(false));
    (
        ReturnHandle {
            resolved: resolved.clone(),
        },
        ReturnSignal { resolved },
    )
}

/// Configuration of a [`DragMachine`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DragConfig {
    /// Z index the host should apply while the draggable is not idle.
    pub active_z_index: i32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self { active_z_index: 1 }
    }
}

/// Boxed sink for payloads replied by receiver handlers.
pub type ReplyHandler<P> = Box<dyn FnMut(P)>;

/// Drag state machine for one draggable.
///
/// All methods run synchronously; the only logical wait that spans event-loop
/// turns is the returned-signal guard, observed by polling.
pub struct DragMachine<P> {
    phase: DragPhase,
    payload: P,
    config: DragConfig,
    /// Vector from pointer position to the bounds origin at pick-up.
    offset: Vec2,
    /// The contact being tracked; `Some` only while dragging.
    pointer: Option<PointerId>,
    /// Lookup handle for the last hovered receiver; relation only.
    hovered: Option<ReceiverId>,
    last_drag_position: Point,
    return_wait: Option<ReturnSignal>,
    sizes: SizeChain,
    on_reply: Option<ReplyHandler<P>>,
}

impl<P: Clone + Default> DragMachine<P> {
    /// Create an idle machine carrying the empty payload.
    pub fn new() -> Self {
        Self::with_payload(P::default())
    }
}

impl<P: Clone + Default> Default for DragMachine<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Clone> DragMachine<P> {
    /// Create an idle machine with an explicit initial payload.
    pub fn with_payload(payload: P) -> Self {
        Self::with_config(payload, DragConfig::default())
    }

    /// Create an idle machine with an explicit payload and configuration.
    pub fn with_config(payload: P, config: DragConfig) -> Self {
        Self {
            phase: DragPhase::Idle,
            payload,
            config,
            offset: Vec2::ZERO,
            pointer: None,
            hovered: None,
            last_drag_position: Point::ZERO,
            return_wait: None,
            sizes: SizeChain::new(),
            on_reply: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// The destructurable boolean view of the current phase.
    pub fn facets(&self) -> StateFacets {
        self.phase.facets()
    }

    /// The payload that will be carried by the next dispatched event.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Replace the payload to be sent to receivers for this gesture.
    pub fn set_payload(&mut self, payload: P) {
        self.payload = payload;
    }

    /// Register the sink for payloads replied by receiver handlers.
    ///
    /// Replies are delivered synchronously, during the dispatch that carried
    /// the replied-to event.
    pub fn set_reply_handler(&mut self, handler: impl FnMut(P) + 'static) {
        self.on_reply = Some(Box::new(handler));
    }

    /// Register the completion signal awaited before returning → idle.
    ///
    /// Meant to be called while dragging. The signal is consumed and
    /// discarded on every transition into idle and must be registered again
    /// for the next gesture.
    pub fn set_return_signal(&mut self, signal: ReturnSignal) {
        self.return_wait = Some(signal);
    }

    /// The draggable's position the last time it was dragged.
    ///
    /// Retained into `returning` so a return animation can render from where
    /// the draggable was. Not meaningful before the first drag.
    pub fn last_drag_position(&self) -> Point {
        self.last_drag_position
    }

    /// How the host should position the draggable's root node right now.
    pub fn position_mode(&self) -> PositionMode {
        if self.phase == DragPhase::Dragging {
            PositionMode::Fixed(self.last_drag_position)
        } else {
            PositionMode::Flow
        }
    }

    /// Z index for the root node; `None` means the host's natural stacking.
    pub fn z_index(&self) -> Option<i32> {
        if self.phase == DragPhase::Idle {
            None
        } else {
            Some(self.config.active_z_index)
        }
    }

    /// The idle size reduced by the wrapper chain, used to size ghosts.
    pub fn ghost_size(&self) -> Option<Size> {
        self.sizes.current()
    }

    /// Handle a pointer-down on the draggable's root node.
    ///
    /// Starts a drag and returns true when the machine is idle, the button
    /// is primary, and the originating event is cancelable (so the host can
    /// suppress the platform's native default action). `bounds` is the root
    /// node's current bounding box; `position` the pointer in the same
    /// coordinate space.
    pub fn on_pointer_down(
        &mut self,
        pointer: Option<PointerId>,
        button: Option<Button>,
        cancelable: bool,
        position: Point,
        bounds: Rect,
    ) -> bool {
        if self.phase != DragPhase::Idle {
            return false;
        }
        if button.unwrap_or(PRIMARY_BUTTON) != PRIMARY_BUTTON {
            return false;
        }
        if !cancelable {
            return false;
        }

        let origin = bounds.origin();
        self.last_drag_position = origin;
        self.offset = origin - position;
        self.pointer = Some(pointer_or_default(pointer));
        self.phase = DragPhase::Dragging;
        true
    }

    /// Handle a pointer move while dragging.
    ///
    /// Updates the drag position, hit-tests the pointer against `receivers`,
    /// and on a hover change dispatches *enter* to the new target before
    /// *leave* to the old one. Moves from contacts other than the tracked
    /// one, or outside the dragging phase, are ignored.
    pub fn on_pointer_move(
        &mut self,
        pointer: Option<PointerId>,
        position: Point,
        receivers: &mut ReceiverRegistry<P>,
    ) {
        if self.phase != DragPhase::Dragging {
            return;
        }
        if Some(pointer_or_default(pointer)) != self.pointer {
            return;
        }

        self.last_drag_position = position + self.offset;

        let hit = receivers.hit_test(position);
        if hit != self.hovered {
            if let Some(entered) = hit {
                self.dispatch(receivers, entered, DragEventKind::Enter);
            }
            if let Some(left) = self.hovered {
                self.dispatch(receivers, left, DragEventKind::Leave);
            }
            self.hovered = hit;
        }
    }

    /// Handle a pointer release while dragging.
    ///
    /// From the tracked contact with the primary button: dispatches *drop* to
    /// the hovered receiver (if any), clears the tracked contact, and enters
    /// `returning` — then `idle` in the same call unless a return signal is
    /// pending. Other releases are ignored.
    pub fn on_pointer_up(
        &mut self,
        pointer: Option<PointerId>,
        button: Option<Button>,
        receivers: &mut ReceiverRegistry<P>,
    ) {
        if button.unwrap_or(PRIMARY_BUTTON) != PRIMARY_BUTTON {
            return;
        }
        self.release(pointer, receivers);
    }

    /// Handle a canceled contact (e.g. a touch interrupted by the system).
    ///
    /// Behaves like a release of the tracked contact: the hovered receiver
    /// still observes *drop*.
    pub fn on_pointer_cancel(
        &mut self,
        pointer: Option<PointerId>,
        receivers: &mut ReceiverRegistry<P>,
    ) {
        self.release(pointer, receivers);
    }

    /// Observe the returned-signal guard.
    ///
    /// Completes the returning → idle transition if the registered signal
    /// has resolved. Returns true when the machine is idle after the call.
    pub fn poll_returned(&mut self, receivers: &mut ReceiverRegistry<P>) -> bool {
        if self.phase == DragPhase::Returning
            && self
                .return_wait
                .as_ref()
                .is_some_and(ReturnSignal::is_resolved)
        {
            self.enter_idle(receivers);
        }
        self.phase == DragPhase::Idle
    }

    fn release(&mut self, pointer: Option<PointerId>, receivers: &mut ReceiverRegistry<P>) {
        if self.phase != DragPhase::Dragging {
            return;
        }
        if Some(pointer_or_default(pointer)) != self.pointer {
            return;
        }

        if let Some(hovered) = self.hovered.take() {
            self.dispatch(receivers, hovered, DragEventKind::Drop);
        }
        self.pointer = None;
        self.phase = DragPhase::Returning;
        if self.return_wait.is_none() {
            self.enter_idle(receivers);
        }
    }

    fn enter_idle(&mut self, receivers: &mut ReceiverRegistry<P>) {
        self.return_wait = None;
        self.pointer = None;
        // Normally cleared by the drop dispatch; a receiver still marked
        // hovered here must observe *leave* before the machine idles.
        if let Some(hovered) = self.hovered.take() {
            self.dispatch(receivers, hovered, DragEventKind::Leave);
        }
        self.phase = DragPhase::Idle;
    }

    fn dispatch(
        &mut self,
        receivers: &mut ReceiverRegistry<P>,
        id: ReceiverId,
        kind: DragEventKind,
    ) {
        let reply = receivers.dispatch(id, kind, &self.payload);
        if let Some(reply) = reply
            && let Some(handler) = self.on_reply.as_mut()
        {
            handler(reply);
        }
    }
}

impl<P> DragMachine<P> {
    /// The measurement relay terminated by this machine.
    pub fn size_chain(&self) -> &SizeChain {
        &self.sizes
    }

    /// Mutable access to the measurement relay, for wrapper levels.
    pub fn size_chain_mut(&mut self) -> &mut SizeChain {
        &mut self.sizes
    }
}

impl<P> fmt::Debug for DragMachine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragMachine")
            .field("phase", &self.phase)
            .field("pointer", &self.pointer)
            .field("hovered", &self.hovered)
            .field("last_drag_position", &self.last_drag_position)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ReceiverHandlers;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    type Log = Rc<RefCell<Vec<(&'static str, DragEventKind)>>>;

    fn logging_handlers(name: &'static str, log: &Log) -> ReceiverHandlers<u32> {
        let enter = log.clone();
        let leave = log.clone();
        let drop_log = log.clone();
        ReceiverHandlers::new()
            .on_enter(move |e| enter.borrow_mut().push((name, e.kind())))
            .on_leave(move |e| leave.borrow_mut().push((name, e.kind())))
            .on_drop(move |e| drop_log.borrow_mut().push((name, e.kind())))
    }

    fn press(machine: &mut DragMachine<u32>, at: Point) -> bool {
        machine.on_pointer_down(None, None, true, at, Rect::new(0.0, 0.0, 40.0, 40.0))
    }

    #[test]
    fn down_requires_idle_primary_and_cancelable() {
        let mut machine: DragMachine<u32> = DragMachine::new();

        assert!(!machine.on_pointer_down(
            None,
            Some(2),
            true,
            Point::ZERO,
            Rect::new(0.0, 0.0, 10.0, 10.0)
        ));
        assert!(!machine.on_pointer_down(
            None,
            None,
            false,
            Point::ZERO,
            Rect::new(0.0, 0.0, 10.0, 10.0)
        ));
        assert!(machine.facets().idle);

        assert!(press(&mut machine, Point::new(5.0, 5.0)));
        assert!(machine.facets().dragging);

        // A second down while dragging is ignored.
        assert!(!press(&mut machine, Point::new(5.0, 5.0)));
    }

    #[test]
    fn offset_reproduces_bounds_origin_when_pointer_has_not_moved() {
        let mut machine: DragMachine<u32> = DragMachine::new();
        let mut receivers = ReceiverRegistry::new();

        let bounds = Rect::new(10.0, 20.0, 50.0, 60.0);
        let press_at = Point::new(25.0, 30.0);
        assert!(machine.on_pointer_down(None, None, true, press_at, bounds));
        assert_eq!(machine.last_drag_position(), bounds.origin());

        machine.on_pointer_move(None, press_at, &mut receivers);
        assert_eq!(machine.last_drag_position(), bounds.origin());

        machine.on_pointer_move(None, Point::new(30.0, 30.0), &mut receivers);
        assert_eq!(machine.last_drag_position(), Point::new(15.0, 20.0));
    }

    #[test]
    fn position_mode_is_fixed_only_while_dragging() {
        let mut machine: DragMachine<u32> = DragMachine::new();
        let mut receivers = ReceiverRegistry::new();

        assert_eq!(machine.position_mode(), PositionMode::Flow);
        assert_eq!(machine.z_index(), None);

        press(&mut machine, Point::new(5.0, 5.0));
        assert_eq!(
            machine.position_mode(),
            PositionMode::Fixed(machine.last_drag_position())
        );
        assert_eq!(machine.z_index(), Some(1));

        machine.on_pointer_up(None, None, &mut receivers);
        assert_eq!(machine.position_mode(), PositionMode::Flow);
    }

    #[test]
    fn enter_is_dispatched_before_leave_on_hover_change() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut receivers: ReceiverRegistry<u32> = ReceiverRegistry::new();
        let _a = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            logging_handlers("a", &log),
        );
        let _b = receivers.insert(
            Rect::new(100.0, 0.0, 200.0, 100.0),
            0,
            logging_handlers("b", &log),
        );

        let mut machine: DragMachine<u32> = DragMachine::new();
        press(&mut machine, Point::new(5.0, 5.0));

        machine.on_pointer_move(None, Point::new(50.0, 50.0), &mut receivers);
        machine.on_pointer_move(None, Point::new(150.0, 50.0), &mut receivers);

        assert_eq!(
            *log.borrow(),
            [
                ("a", DragEventKind::Enter),
                ("b", DragEventKind::Enter),
                ("a", DragEventKind::Leave),
            ]
        );
    }

    #[test]
    fn moving_to_empty_space_delivers_only_leave() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut receivers: ReceiverRegistry<u32> = ReceiverRegistry::new();
        let _a = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            logging_handlers("a", &log),
        );

        let mut machine: DragMachine<u32> = DragMachine::new();
        press(&mut machine, Point::new(5.0, 5.0));
        machine.on_pointer_move(None, Point::new(50.0, 50.0), &mut receivers);
        machine.on_pointer_move(None, Point::new(500.0, 500.0), &mut receivers);

        assert_eq!(
            *log.borrow(),
            [("a", DragEventKind::Enter), ("a", DragEventKind::Leave)]
        );
    }

    #[test]
    fn hovering_within_the_same_receiver_dispatches_once() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut receivers: ReceiverRegistry<u32> = ReceiverRegistry::new();
        let _a = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            logging_handlers("a", &log),
        );

        let mut machine: DragMachine<u32> = DragMachine::new();
        press(&mut machine, Point::new(5.0, 5.0));
        machine.on_pointer_move(None, Point::new(10.0, 10.0), &mut receivers);
        machine.on_pointer_move(None, Point::new(20.0, 20.0), &mut receivers);
        machine.on_pointer_move(None, Point::new(30.0, 30.0), &mut receivers);

        assert_eq!(*log.borrow(), [("a", DragEventKind::Enter)]);
    }

    #[test]
    fn release_over_receiver_dispatches_exactly_one_drop_with_the_set_payload() {
        let dropped: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = dropped.clone();
        let mut receivers: ReceiverRegistry<u32> = ReceiverRegistry::new();
        let _r = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            ReceiverHandlers::new().on_drop(move |e| sink.borrow_mut().push(*e.payload())),
        );

        let mut machine: DragMachine<u32> = DragMachine::new();
        press(&mut machine, Point::new(5.0, 5.0));
        machine.set_payload(77);
        machine.on_pointer_move(None, Point::new(50.0, 50.0), &mut receivers);
        machine.on_pointer_up(None, None, &mut receivers);

        assert_eq!(*dropped.borrow(), [77]);
        // No pending signal: idle within the same call.
        assert!(machine.facets().idle);
    }

    #[test]
    fn release_without_signal_idles_in_the_same_call() {
        let mut machine: DragMachine<u32> = DragMachine::new();
        let mut receivers = ReceiverRegistry::new();
        press(&mut machine, Point::new(5.0, 5.0));
        machine.on_pointer_up(None, None, &mut receivers);
        assert!(machine.facets().idle);
    }

    #[test]
    fn release_with_signal_stays_returning_until_resolved_and_polled() {
        let mut machine: DragMachine<u32> = DragMachine::new();
        let mut receivers = ReceiverRegistry::new();
        press(&mut machine, Point::new(5.0, 5.0));

        let (handle, signal) = return_signal();
        machine.set_return_signal(signal);
        machine.on_pointer_up(None, None, &mut receivers);
        assert!(machine.facets().returning);

        // Unresolved: polling does not transition.
        assert!(!machine.poll_returned(&mut receivers));
        assert!(machine.facets().returning);

        handle.resolve();
        assert!(machine.poll_returned(&mut receivers));
        assert!(machine.facets().idle);
    }

    #[test]
    fn unresolved_signal_never_auto_idles() {
        let mut machine: DragMachine<u32> = DragMachine::new();
        let mut receivers = ReceiverRegistry::new();
        press(&mut machine, Point::new(5.0, 5.0));
        let (_handle, signal) = return_signal();
        machine.set_return_signal(signal);
        machine.on_pointer_up(None, None, &mut receivers);

        for _ in 0..16 {
            machine.poll_returned(&mut receivers);
        }
        assert!(machine.facets().returning);
    }

    #[test]
    fn signal_is_discarded_on_idle_so_a_new_gesture_needs_a_new_one() {
        let mut machine: DragMachine<u32> = DragMachine::new();
        let mut receivers = ReceiverRegistry::new();

        press(&mut machine, Point::new(5.0, 5.0));
        let (handle, signal) = return_signal();
        machine.set_return_signal(signal);
        machine.on_pointer_up(None, None, &mut receivers);
        handle.resolve();
        machine.poll_returned(&mut receivers);
        assert!(machine.facets().idle);

        // Second gesture: the old (resolved) handle must not short-circuit it.
        press(&mut machine, Point::new(5.0, 5.0));
        let (_handle2, signal2) = return_signal();
        machine.set_return_signal(signal2);
        machine.on_pointer_up(None, None, &mut receivers);
        assert!(machine.facets().returning);
        assert!(!machine.poll_returned(&mut receivers));
        assert!(machine.facets().returning);
    }

    #[test]
    fn stale_contacts_are_ignored() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut receivers: ReceiverRegistry<u32> = ReceiverRegistry::new();
        let _a = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            logging_handlers("a", &log),
        );

        let mut machine: DragMachine<u32> = DragMachine::new();
        let touch = PointerId::new(9).unwrap();
        assert!(machine.on_pointer_down(
            Some(touch),
            None,
            true,
            Point::new(5.0, 5.0),
            Rect::new(0.0, 0.0, 40.0, 40.0)
        ));

        // A different contact moves and releases: nothing happens.
        let other = PointerId::new(10).unwrap();
        machine.on_pointer_move(Some(other), Point::new(50.0, 50.0), &mut receivers);
        machine.on_pointer_up(Some(other), None, &mut receivers);
        assert!(machine.facets().dragging);
        assert!(log.borrow().is_empty());

        machine.on_pointer_up(Some(touch), None, &mut receivers);
        assert!(machine.facets().idle);
    }

    #[test]
    fn non_primary_release_is_ignored() {
        let mut machine: DragMachine<u32> = DragMachine::new();
        let mut receivers = ReceiverRegistry::new();
        press(&mut machine, Point::new(5.0, 5.0));
        machine.on_pointer_up(None, Some(2), &mut receivers);
        assert!(machine.facets().dragging);
    }

    #[test]
    fn cancel_behaves_like_release_including_drop() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut receivers: ReceiverRegistry<u32> = ReceiverRegistry::new();
        let _a = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            logging_handlers("a", &log),
        );

        let mut machine: DragMachine<u32> = DragMachine::new();
        press(&mut machine, Point::new(5.0, 5.0));
        machine.on_pointer_move(None, Point::new(50.0, 50.0), &mut receivers);
        machine.on_pointer_cancel(None, &mut receivers);

        assert_eq!(
            *log.borrow(),
            [("a", DragEventKind::Enter), ("a", DragEventKind::Drop)]
        );
        assert!(machine.facets().idle);
    }

    #[test]
    fn reply_reaches_the_owner_handler_with_the_sent_payload() {
        let replies: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = replies.clone();

        let mut receivers: ReceiverRegistry<u32> = ReceiverRegistry::new();
        let _r = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            ReceiverHandlers::new().on_drop(|e| e.reply(e.payload() * 2)),
        );

        let mut machine: DragMachine<u32> = DragMachine::new();
        machine.set_reply_handler(move |p| sink.borrow_mut().push(p));
        press(&mut machine, Point::new(5.0, 5.0));
        machine.set_payload(21);
        machine.on_pointer_move(None, Point::new(50.0, 50.0), &mut receivers);
        machine.on_pointer_up(None, None, &mut receivers);

        assert_eq!(*replies.borrow(), [42]);
    }

    #[test]
    fn replies_do_not_cross_between_simultaneous_draggables() {
        let mut receivers: ReceiverRegistry<u32> = ReceiverRegistry::new();
        let _r = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            ReceiverHandlers::new().on_drop(|e| e.reply(*e.payload())),
        );

        let first_replies: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let second_replies: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

        let mut first: DragMachine<u32> = DragMachine::new();
        let sink = first_replies.clone();
        first.set_reply_handler(move |p| sink.borrow_mut().push(p));
        let mut second: DragMachine<u32> = DragMachine::new();
        let sink = second_replies.clone();
        second.set_reply_handler(move |p| sink.borrow_mut().push(p));

        let touch_a = PointerId::new(2).unwrap();
        let touch_b = PointerId::new(3).unwrap();
        first.on_pointer_down(
            Some(touch_a),
            None,
            true,
            Point::new(5.0, 5.0),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        );
        second.on_pointer_down(
            Some(touch_b),
            None,
            true,
            Point::new(5.0, 5.0),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        );
        first.set_payload(1);
        second.set_payload(2);

        first.on_pointer_move(Some(touch_a), Point::new(50.0, 50.0), &mut receivers);
        second.on_pointer_move(Some(touch_b), Point::new(60.0, 60.0), &mut receivers);
        first.on_pointer_up(Some(touch_a), None, &mut receivers);
        second.on_pointer_up(Some(touch_b), None, &mut receivers);

        assert_eq!(*first_replies.borrow(), [1]);
        assert_eq!(*second_replies.borrow(), [2]);
    }

    #[test]
    fn exactly_one_facet_through_a_full_gesture() {
        let mut machine: DragMachine<u32> = DragMachine::new();
        let mut receivers = ReceiverRegistry::new();

        let one_facet = |m: &DragMachine<u32>| {
            let f = m.facets();
            [f.idle, f.dragging, f.returning]
                .iter()
                .filter(|x| **x)
                .count()
                == 1
        };

        assert!(one_facet(&machine));
        press(&mut machine, Point::new(5.0, 5.0));
        assert!(one_facet(&machine));
        let (handle, signal) = return_signal();
        machine.set_return_signal(signal);
        machine.on_pointer_move(None, Point::new(50.0, 50.0), &mut receivers);
        assert!(one_facet(&machine));
        machine.on_pointer_up(None, None, &mut receivers);
        assert!(one_facet(&machine));
        handle.resolve();
        machine.poll_returned(&mut receivers);
        assert!(one_facet(&machine));
    }

    #[test]
    fn ghost_size_follows_the_size_chain() {
        let mut machine: DragMachine<u32> = DragMachine::new();
        assert_eq!(machine.ghost_size(), None);
        let level = machine.size_chain_mut().attach();
        machine
            .size_chain_mut()
            .report(level, Some(Size::new(12.0, 34.0)));
        assert_eq!(machine.ghost_size(), Some(Size::new(12.0, 34.0)));
    }

    #[test]
    fn drop_then_idle_does_not_send_a_duplicate_leave() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut receivers: ReceiverRegistry<u32> = ReceiverRegistry::new();
        let _a = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            logging_handlers("a", &log),
        );

        let mut machine: DragMachine<u32> = DragMachine::new();
        press(&mut machine, Point::new(5.0, 5.0));
        machine.on_pointer_move(None, Point::new(50.0, 50.0), &mut receivers);
        machine.on_pointer_up(None, None, &mut receivers);

        // Drop clears the hovered receiver, so idling adds no leave.
        assert_eq!(
            *log.borrow(),
            [("a", DragEventKind::Enter), ("a", DragEventKind::Drop)]
        );
    }

    // String payloads exercise the non-Copy path through dispatch and reply.
    #[test]
    fn non_copy_payloads_flow_through_dispatch() {
        use alloc::string::ToString;

        let replies: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = replies.clone();

        let mut receivers: ReceiverRegistry<String> = ReceiverRegistry::new();
        let _r = receivers.insert(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0,
            ReceiverHandlers::new()
                .on_drop(|e: &crate::events::DragEvent<'_, String>| e.reply(e.payload().clone() + "!")),
        );

        let mut machine: DragMachine<String> = DragMachine::new();
        machine.set_reply_handler(move |p| sink.borrow_mut().push(p));
        machine.on_pointer_down(
            None,
            None,
            true,
            Point::new(5.0, 5.0),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        );
        machine.set_payload("note".to_string());
        machine.on_pointer_move(None, Point::new(50.0, 50.0), &mut receivers);
        machine.on_pointer_up(None, None, &mut receivers);

        assert_eq!(*replies.borrow(), ["note!".to_string()]);
    }
}
