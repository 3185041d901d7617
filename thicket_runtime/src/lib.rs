// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Runtime: the platform boundary and the cooperative event cycle.
//!
//! A [`Platform`] is the one explicit object standing in for the host: it
//! polls normalized input events, tells the time, exposes the display
//! surface, and presents repainted regions. A [`Stage`] couples a platform
//! with a [`World`] and a [`Hand`] and runs the single-threaded cycle:
//!
//! 1. poll at most one input event and dispatch it synchronously to
//!    completion,
//! 2. run one stepping pass over the visible tree,
//! 3. repaint the accumulated damage and present the repainted regions.
//!
//! [`Stage::run_cycle`] is a plain synchronous function: each call is one
//! full cycle, so cycles can be pumped from anywhere without partial states.
//! Modal interactions (resize-by-drag and friends) do not pump, though —
//! they claim the pointer via
//! [`World::request_interaction`](thicket_scene::World::request_interaction)
//! and let the ordinary cycle deliver input to them.
//!
//! Frame pacing is advisory throttling, not a scheduling guarantee: with a
//! target frame rate set, the loop asks the platform to wait out the
//! leftover of each frame interval.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use kurbo::{Rect, Vec2};

use thicket_hand::Hand;
use thicket_scene::{Event, Surface, World};

/// The host context: input, clock, display. Constructed once at startup and
/// handed to the [`Stage`]; dropped at shutdown.
pub trait Platform {
    /// The concrete display surface.
    type Surface: Surface;

    /// Poll at most one pending input event.
    fn poll_event(&mut self) -> Option<Event>;

    /// Milliseconds of monotonic time.
    fn now_ms(&self) -> u64;

    /// The display surface the world composites into.
    fn surface(&mut self) -> &mut Self::Surface;

    /// Present repainted regions to the physical display.
    fn present(&mut self, regions: &[Rect]);

    /// Advisory sleep for frame pacing. The default does not wait.
    fn wait_ms(&mut self, ms: u64) {
        let _ = ms;
    }
}

/// A world, its pointer actor, and the platform they run on.
#[derive(Debug)]
pub struct Stage<P: Platform> {
    /// The scene.
    pub world: World,
    /// The pointer actor.
    pub hand: Hand,
    /// The host context.
    pub platform: P,
    frame_interval_ms: u64,
    last_frame_ms: u64,
}

impl<P: Platform> Stage<P> {
    /// Create a stage with a fresh world of the given extent.
    pub fn new(platform: P, extent: Vec2) -> Self {
        let world = World::new(extent);
        let hand = Hand::new(world.hand_anchor());
        Self {
            world,
            hand,
            platform,
            frame_interval_ms: 0,
            last_frame_ms: 0,
        }
    }

    /// Builder: cap the main loop at `fps` frames per second (0 = uncapped).
    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.frame_interval_ms = if fps == 0 { 0 } else { u64::from(1000 / fps) };
        self
    }

    /// Run one full cycle: poll at most one event, dispatch it, run a
    /// stepping pass, repaint damage, present.
    ///
    /// Safe to call from anywhere — every invocation is a complete cycle.
    pub fn run_cycle(&mut self) {
        let now = self.platform.now_ms();
        if let Some(event) = self.platform.poll_event() {
            self.dispatch_event(event);
        }
        self.world.step_frame(now);
        let flushed = self.world.repaint(self.platform.surface());
        if !flushed.is_empty() {
            self.platform.present(&flushed);
        }
    }

    /// Paint the whole world once, then cycle until a quit is requested.
    pub fn run(&mut self) {
        log::info!("stage running");
        self.world.changed(self.world.root());
        self.last_frame_ms = self.platform.now_ms();
        while !self.world.is_quitting() {
            self.run_cycle();
            self.pace();
        }
        log::info!("stage stopped");
    }

    fn dispatch_event(&mut self, event: Event) {
        match event {
            Event::PointerMove { position, buttons } => {
                self.hand.pointer_move(&mut self.world, position, buttons);
            }
            Event::PointerDown { button, position } => {
                self.hand.pointer_down(&mut self.world, button, position);
            }
            Event::PointerUp { button, position } => {
                self.hand.pointer_up(&mut self.world, button, position);
            }
            Event::KeyDown { code } => self.world.dispatch_key(code),
            Event::Quit => self.world.request_quit(),
        }
    }

    fn pace(&mut self) {
        if self.frame_interval_ms == 0 {
            return;
        }
        let current = self.platform.now_ms();
        let elapsed = current.saturating_sub(self.last_frame_ms);
        let leftover = self.frame_interval_ms.saturating_sub(elapsed);
        if leftover > 0 {
            self.platform.wait_ms(leftover);
        }
        self.last_frame_ms = current;
    }
}
