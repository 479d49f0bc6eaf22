// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Receiver registry: the capability set of drop targets.
//!
//! ## Overview
//!
//! A drop target is not a hidden marker on a visual node; it is an explicit
//! entry in this registry: a world-space rectangle, a z-order, activity
//! flags, and the receiver's event handlers. Entries are addressed by
//! generational [`ReceiverId`] handles, so a handle held across a removal can
//! never alias a later entry that reuses the same slot.
//!
//! ## Hit testing
//!
//! [`ReceiverRegistry::hit_test`] maps a screen point to the topmost eligible
//! receiver: among active entries whose rectangle contains the point, the
//! highest `z_index` wins, and equal-z ties go to the most recently inserted
//! entry. This resolves to exactly one receiver, which is why event delivery
//! never needs to propagate through an ancestry tree.
//!
//! ## Lifecycle contract
//!
//! Removing a receiver that an active drag still references (it is the
//! hovered target) is a lifecycle bug in the caller: the next dispatch to it
//! panics rather than silently corrupting the gesture. Stale handles passed
//! to the mutation methods are ignored, matching the tolerance of the other
//! Understory registries.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::events::{DragEvent, DragEventKind, ReceiverHandlers, ReplySlot};

/// Generational handle for a registered receiver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReceiverId(u32, u32);

impl ReceiverId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Receiver ids are intentionally 32-bit; higher bits are truncated by design."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Flags controlling a receiver's participation in hit testing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ReceiverFlags: u8 {
        /// Receiver is eligible as a drop target.
        const ACTIVE = 0b0000_0001;
    }
}

impl Default for ReceiverFlags {
    fn default() -> Self {
        Self::ACTIVE
    }
}

struct Entry<P> {
    rect: Rect,
    z_index: i32,
    /// Monotonic insertion sequence; breaks equal-z ties (last wins).
    seq: u64,
    flags: ReceiverFlags,
    handlers: ReceiverHandlers<P>,
}

struct Slot<P> {
    generation: u32,
    entry: Option<Entry<P>>,
}

/// Registry of drop receivers for one scene.
///
/// Several draggables may share one registry; dispatch state is per call, so
/// gestures never interfere through it.
pub struct ReceiverRegistry<P> {
    slots: Vec<Slot<P>>,
    free_list: Vec<usize>,
    next_seq: u64,
}

impl<P> ReceiverRegistry<P> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            next_seq: 0,
        }
    }

    /// Register a receiver covering `rect` at `z_index`. Returns its handle.
    pub fn insert(&mut self, rect: Rect, z_index: i32, handlers: ReceiverHandlers<P>) -> ReceiverId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = Entry {
            rect,
            z_index,
            seq,
            flags: ReceiverFlags::default(),
            handlers,
        };
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation += 1;
            slot.entry = Some(entry);
            ReceiverId::new(idx, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 1,
                entry: Some(entry),
            });
            ReceiverId::new(self.slots.len() - 1, 1)
        }
    }

    /// Move a receiver to a new world-space rectangle. Stale ids are ignored.
    pub fn set_rect(&mut self, id: ReceiverId, rect: Rect) {
        if let Some(entry) = self.entry_mut(id) {
            entry.rect = rect;
        }
    }

    /// Change a receiver's stacking order. Stale ids are ignored.
    pub fn set_z_index(&mut self, id: ReceiverId, z_index: i32) {
        if let Some(entry) = self.entry_mut(id) {
            entry.z_index = z_index;
        }
    }

    /// Change a receiver's flags. Stale ids are ignored.
    pub fn set_flags(&mut self, id: ReceiverId, flags: ReceiverFlags) {
        if let Some(entry) = self.entry_mut(id) {
            entry.flags = flags;
        }
    }

    /// Replace a receiver's handlers wholesale. Stale ids are ignored.
    pub fn set_handlers(&mut self, id: ReceiverId, handlers: ReceiverHandlers<P>) {
        if let Some(entry) = self.entry_mut(id) {
            entry.handlers = handlers;
        }
    }

    /// Unregister a receiver. Stale ids are ignored.
    pub fn remove(&mut self, id: ReceiverId) {
        let Some(slot) = self.slots.get_mut(id.idx()) else {
            return;
        };
        if slot.generation == id.1 && slot.entry.is_some() {
            slot.entry = None;
            self.free_list.push(id.idx());
        }
    }

    /// Whether `id` refers to a live receiver.
    pub fn contains(&self, id: ReceiverId) -> bool {
        self.entry(id).is_some()
    }

    /// The world-space rectangle of a live receiver.
    pub fn rect(&self, id: ReceiverId) -> Option<Rect> {
        self.entry(id).map(|e| e.rect)
    }

    /// Number of live receivers.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    /// Whether the registry has no live receivers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map a screen point to the topmost eligible receiver, if any.
    ///
    /// Among active receivers containing the point, the highest `z_index`
    /// wins; equal-z ties go to the most recently inserted entry.
    pub fn hit_test(&self, point: Point) -> Option<ReceiverId> {
        let mut best: Option<(ReceiverId, i32, u64)> = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            let Some(entry) = slot.entry.as_ref() else {
                continue;
            };
            if !entry.flags.contains(ReceiverFlags::ACTIVE) || !entry.rect.contains(point) {
                continue;
            }
            let candidate = (
                ReceiverId::new(idx, slot.generation),
                entry.z_index,
                entry.seq,
            );
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    if (candidate.1, candidate.2) > (current.1, current.2) {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best.map(|(id, _, _)| id)
    }

    /// Deliver an event to one receiver and drain its one-shot reply.
    ///
    /// Panics if `id` no longer refers to a live receiver: an active drag was
    /// still referencing an entry the caller removed.
    pub(crate) fn dispatch(
        &mut self,
        id: ReceiverId,
        kind: DragEventKind,
        payload: &P,
    ) -> Option<P> {
        let Some(entry) = self.entry_mut(id) else {
            panic!("receiver {id:?} was removed while an active drag still references it");
        };
        let slot = ReplySlot::new();
        let event = DragEvent::new(kind, payload, &slot);
        entry.handlers.handle(&event);
        slot.take()
    }

    fn entry(&self, id: ReceiverId) -> Option<&Entry<P>> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: ReceiverId) -> Option<&mut Entry<P>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.entry.as_mut()
    }
}

impl<P> Default for ReceiverRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> core::fmt::Debug for ReceiverRegistry<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReceiverRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
