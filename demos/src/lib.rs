// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared scaffolding for the runnable Thicket demos.

use std::collections::VecDeque;
use std::time::Instant;

use kurbo::Rect;
use thicket_runtime::Platform;
use thicket_scene::{Event, Pixmap, Rgba};

/// A headless platform: a software pixmap, a real clock, and a scripted
/// event queue. Good enough to watch the scene graph work without a window.
pub struct HeadlessPlatform {
    events: VecDeque<Event>,
    start: Instant,
    surface: Pixmap,
    /// Number of `present` calls so far.
    pub frames_presented: usize,
    /// Total count of regions flushed across all presents.
    pub regions_flushed: usize,
}

impl HeadlessPlatform {
    /// A platform over a `width` x `height` pixmap with a scripted event tape.
    pub fn new(width: usize, height: usize, events: Vec<Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
            start: Instant::now(),
            surface: Pixmap::new(width, height),
            frames_presented: 0,
            regions_flushed: 0,
        }
    }

    /// Whether the scripted tape has run out.
    pub fn idle(&self) -> bool {
        self.events.is_empty()
    }

    /// Sample a pixel from the software surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        self.surface.pixel(x, y)
    }
}

impl Platform for HeadlessPlatform {
    type Surface = Pixmap;

    fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn surface(&mut self) -> &mut Pixmap {
        &mut self.surface
    }

    fn present(&mut self, regions: &[Rect]) {
        self.frames_presented += 1;
        self.regions_flushed += regions.len();
        log::debug!("present {} region(s)", regions.len());
    }

    fn wait_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}
