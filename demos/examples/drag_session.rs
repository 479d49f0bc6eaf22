// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A complete synthetic drag session: machine + registry + fade return.
//!
//! This example shows how the pieces fit together without any toolkit:
//! - a `ReceiverRegistry` with two drop targets and logging handlers,
//! - a `DragMachine` shared through `SharedDraggable` so descendants can set
//!   the payload and register the return signal,
//! - a `FadeOnReturn` wrapper driving the returning → idle transition,
//! - the size chain feeding the ghost size.
//!
//! Run:
//! - `cargo run -p understory_dnd_examples --example drag_session`

use kurbo::{Point, Rect, Size};
use understory_dnd::context::SharedDraggable;
use understory_dnd::events::ReceiverHandlers;
use understory_dnd::fade::FadeOnReturn;
use understory_dnd::machine::DragMachine;
use understory_dnd::registry::ReceiverRegistry;

/// Payload for this scene: the engine is generic, so the example brings its
/// own extensible type.
#[derive(Clone, Debug, Default, PartialEq)]
enum Payload {
    #[default]
    Empty,
    Card(&'static str),
    Ack(&'static str),
}

fn logging_receiver(name: &'static str) -> ReceiverHandlers<Payload> {
    ReceiverHandlers::new()
        .on_enter(move |event| println!("[{name}] enter with {:?}", event.payload()))
        .on_leave(move |event| println!("[{name}] leave with {:?}", event.payload()))
        .on_drop(move |event| {
            println!("[{name}] drop of {:?}", event.payload());
            event.reply(Payload::Ack(name));
        })
}

fn main() {
    // Two side-by-side drop targets in screen space.
    let mut receivers: ReceiverRegistry<Payload> = ReceiverRegistry::new();
    receivers.insert(Rect::new(120.0, 20.0, 240.0, 140.0), 0, logging_receiver("inbox"));
    receivers.insert(Rect::new(260.0, 20.0, 380.0, 140.0), 0, logging_receiver("archive"));

    // The draggable: a 60×40 card whose content reports its idle size.
    let shared = SharedDraggable::new(DragMachine::<Payload>::new());
    shared.with(|m| m.set_reply_handler(|reply| println!("[card] receiver replied {reply:?}")));

    let relay = shared.size_relay();
    let content_size = relay.attach();
    content_size.report(Some(Size::new(60.0, 40.0)));

    let context = shared.context();
    let mut fade = FadeOnReturn::new(shared.context(), &relay);

    // Pick the card up.
    let bounds = Rect::new(10.0, 10.0, 70.0, 50.0);
    let started = shared.with(|m| m.on_pointer_down(None, None, true, Point::new(30.0, 30.0), bounds));
    println!("drag started: {started}");
    context.set_payload(Payload::Card("quarterly report"));
    fade.update(0);
    println!("ghost size while away: {:?}", shared.ghost().size());

    // Sweep across empty space, the inbox, then the archive.
    for position in [
        Point::new(60.0, 60.0),
        Point::new(180.0, 80.0),
        Point::new(300.0, 80.0),
    ] {
        shared.with(|m| m.on_pointer_move(None, position, &mut receivers));
        println!("moved to {position:?}, now at {:?}", shared.with(|m| m.last_drag_position()));
    }

    // Release over the archive: drop is dispatched, the reply comes back, and
    // the machine waits for the fade to bring the card home.
    shared.with(|m| m.on_pointer_up(None, None, &mut receivers));
    println!("after release: {:?}", shared.with(|m| m.facets()));

    for now_ms in [50_u64, 175, 300, 425, 550, 600] {
        let frame = fade.update(now_ms);
        let idle = shared.with(|m| m.poll_returned(&mut receivers));
        println!("t={now_ms}ms opacity={:.2} position={:?} idle={idle}", frame.opacity, frame.position);
    }

    println!("final state: {:?}", shared.with(|m| m.facets()));
}
