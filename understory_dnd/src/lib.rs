// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dnd --heading-base-level=0

//! Understory DND: a deterministic drag-and-drop interaction engine.
//!
//! ## Overview
//!
//! This crate turns raw pointer input into drag-and-drop semantics without
//! touching a widget tree or a renderer. The host toolkit feeds pointer
//! events in and renders what the engine reports out. Three pieces carry the
//! interaction logic:
//!
//! - [`machine::DragMachine`] — the per-draggable state machine: idle →
//!   dragging → returning transitions, pointer-contact tracking, drag
//!   offset math, hit testing, enter/leave/drop dispatch, reply routing,
//!   and the returned-signal guard for deferred return animations.
//! - [`registry::ReceiverRegistry`] — the explicit capability set of drop
//!   targets: world-space rectangles, z-order, activity flags, and event
//!   handlers behind generational [`registry::ReceiverId`] handles, with a
//!   topmost-wins point query.
//! - [`size::SizeChain`] — the idle-size relay: nested decorator wrappers
//!   report their measurements and the deepest reporter wins, so a ghost
//!   placeholder can track the draggable's natural size through wrappers
//!   that change layout behavior.
//!
//! Around them: [`events`] defines the event kinds and the one-shot reply
//! channel, [`context`] provides the ambient views descendants use
//! (state facets, ghost size, the size channel — with safe, warning-emitting
//! detached defaults), [`fade`] is a ready-made fade-out/fade-in return
//! animation, and [`ghost`] has ghost sizing helpers.
//!
//! ## Ordering guarantees
//!
//! Within a single pointer move, *enter* on the new hovered receiver is
//! dispatched before *leave* on the old one, so a crossing between adjacent
//! receivers never observes a zero-hover gap. A release dispatches exactly
//! one *drop* to the hovered receiver. Replies are delivered to the
//! originating machine's reply handler during the same dispatch.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_dnd::events::ReceiverHandlers;
//! use understory_dnd::machine::DragMachine;
//! use understory_dnd::payload::EmptyPayload;
//! use understory_dnd::registry::ReceiverRegistry;
//!
//! let mut receivers: ReceiverRegistry<EmptyPayload> = ReceiverRegistry::new();
//! let _bin = receivers.insert(
//!     Rect::new(100.0, 0.0, 200.0, 100.0),
//!     0,
//!     ReceiverHandlers::new().on_drop(|event| {
//!         // Something was dropped on us; we could reply here.
//!         let _ = event.payload();
//!     }),
//! );
//!
//! let mut drag: DragMachine<EmptyPayload> = DragMachine::new();
//! let started = drag.on_pointer_down(
//!     None,
//!     None,
//!     true,
//!     Point::new(10.0, 10.0),
//!     Rect::new(0.0, 0.0, 40.0, 40.0),
//! );
//! assert!(started);
//!
//! drag.on_pointer_move(None, Point::new(150.0, 50.0), &mut receivers);
//! drag.on_pointer_up(None, None, &mut receivers);
//!
//! // No return signal was registered, so the machine idles immediately.
//! assert!(drag.facets().idle);
//! ```
//!
//! ## Scope
//!
//! One drag gesture at a time per machine; several machines may share one
//! registry without interference. Multi-item drags, cross-window drags, and
//! accessibility semantics are out of scope. Payloads are transient state,
//! valid for the duration of one gesture.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod context;
pub mod events;
pub mod fade;
pub mod ghost;
pub mod machine;
pub mod payload;
pub mod registry;
pub mod size;
pub mod types;
