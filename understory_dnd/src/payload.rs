// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag payloads.
//!
//! A payload is the value carried from a drag source to a drop target. The
//! engine is generic over the payload type `P: Clone`, so consumers extend the
//! set of transferable values by bringing their own type (typically an enum)
//! rather than by modifying the engine. The payload is owned by the machine
//! for the duration of one gesture and is replaced, never mutated, by
//! [`set_payload`](crate::machine::DragMachine::set_payload).
//!
//! [`EmptyPayload`] is the one variant the library ships: it carries no data
//! and serves as the default type parameter and the initial payload of a
//! fresh gesture.

/// The payload carried before a consumer sets one: no data at all.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EmptyPayload;
