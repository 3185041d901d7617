// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A stepping bouncer plus a scripted drag, composited headlessly.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p thicket_demos --example bouncing`

use kurbo::{Point, Rect, Vec2};
use thicket_demos::HeadlessPlatform;
use thicket_runtime::Stage;
use thicket_scene::{
    Behavior, Buttons, Event, Morph, MorphFlags, MorphId, PointerButton, Rgba, World,
};

/// Slides its morph each step, reversing direction at the world's edges.
struct Bouncer {
    velocity: Vec2,
}

impl Behavior for Bouncer {
    fn step(&mut self, world: &mut World, id: MorphId, _now_ms: u64) {
        let limit = world.bounds(world.root());
        let bounds = world.bounds(id);
        if bounds.y0 + self.velocity.y < limit.y0 || bounds.y1 + self.velocity.y > limit.y1 {
            self.velocity = -self.velocity;
        }
        world.move_by(id, self.velocity);
    }
}

fn main() {
    env_logger::init();

    // A scripted gesture: press the card, drag it into the tray, release.
    let events = vec![
        Event::PointerDown {
            button: PointerButton::Left,
            position: Point::new(420.0, 40.0),
        },
        Event::PointerMove {
            position: Point::new(430.0, 60.0),
            buttons: Buttons::LEFT,
        },
        Event::PointerMove {
            position: Point::new(500.0, 220.0),
            buttons: Buttons::LEFT,
        },
        Event::PointerUp {
            button: PointerButton::Left,
            position: Point::new(500.0, 220.0),
        },
    ];
    let platform = HeadlessPlatform::new(610, 314, events);
    let mut stage = Stage::new(platform, Vec2::new(610.0, 314.0));

    let bouncer = stage.world.spawn(
        Morph::new()
            .with_bounds(Rect::new(30.0, 120.0, 80.0, 160.0))
            .with_color(Rgba::opaque(30, 30, 30))
            .with_step_hz(50)
            .with_behavior(Box::new(Bouncer {
                velocity: Vec2::new(0.0, 3.0),
            })),
    );
    stage.world.add(stage.world.root(), bouncer);

    // A clipping tray that accepts drops.
    let tray = stage.world.spawn(
        Morph::new()
            .with_bounds(Rect::new(440.0, 180.0, 590.0, 300.0))
            .with_color(Rgba::gray(100))
            .with_added_flags(MorphFlags::CLIPS_CHILDREN | MorphFlags::ACCEPTS_DROPS),
    );
    stage.world.add(stage.world.root(), tray);

    // The card the script drags into the tray.
    let card = stage.world.spawn(
        Morph::new()
            .with_bounds(Rect::new(400.0, 20.0, 460.0, 70.0))
            .with_color(Rgba::opaque(40, 40, 160)),
    );
    stage.world.add(stage.world.root(), card);

    stage.world.changed(stage.world.root());
    while !stage.platform.idle() {
        stage.run_cycle();
    }
    for _ in 0..120 {
        stage.run_cycle();
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    println!(
        "card now lives in the tray: {}",
        stage.world.parent(card) == Some(tray)
    );
    println!(
        "bouncer bounds after stepping: {:?}",
        stage.world.bounds(bouncer)
    );
    println!(
        "{} frame(s) presented, {} region(s) flushed",
        stage.platform.frames_presented, stage.platform.regions_flushed
    );
}
