// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node visual state.

use alloc::boxed::Box;
use kurbo::{Point, Rect, Vec2};

use crate::behavior::Behavior;
use crate::color::Rgba;
use crate::image::Image;

bitflags::bitflags! {
    /// Visibility, interaction, and capability flags of a morph.
    ///
    /// The `HANDLES_*` flags are declared interest: the pointer actor only
    /// dispatches a callback class to morphs that declare it.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct MorphFlags: u16 {
        /// The morph is painted, hit-testable, and stepped.
        const VISIBLE = 0b0000_0001;
        /// The morph may be picked up and dragged.
        const DRAGGABLE = 0b0000_0010;
        /// Receives enter/leave hover callbacks.
        const HANDLES_MOUSE_OVER = 0b0000_0100;
        /// Receives down/up/click callbacks (resolved via the ancestor walk).
        const HANDLES_CLICK = 0b0000_1000;
        /// Receives move callbacks while a button is held over it.
        const HANDLES_MOUSE_MOVE = 0b0001_0000;
        /// Clips descendants to this morph's bounds; bounds a drag
        /// (`root_for_grab` stops below a clipping container).
        const CLIPS_CHILDREN = 0b0010_0000;
        /// Accepts any drop without consulting the behavior predicate.
        const ACCEPTS_DROPS = 0b0100_0000;
        /// A drop-shadow decoration: skipped by hit testing, painted with
        /// the un-narrowed clip inside clipping containers.
        const SHADOW = 0b1000_0000;
    }
}

impl Default for MorphFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::DRAGGABLE
    }
}

/// A scene node's visual state: bounds, cached image, color, flags, and the
/// optional step schedule and behavior.
///
/// A `Morph` is constructed detached, configured through the `with_*`
/// builders, and handed to [`World::spawn`](crate::World::spawn); afterwards
/// all mutation goes through the world so the damage bracket protocol holds.
pub struct Morph {
    pub(crate) bounds: Rect,
    pub(crate) color: Rgba,
    pub(crate) alpha: u8,
    pub(crate) flags: MorphFlags,
    pub(crate) image: Option<Image>,
    pub(crate) step_hz: u32,
    pub(crate) last_step_ms: u64,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

impl core::fmt::Debug for Morph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Morph")
            .field("bounds", &self.bounds)
            .field("color", &self.color)
            .field("alpha", &self.alpha)
            .field("flags", &self.flags)
            .field("step_hz", &self.step_hz)
            .field("has_behavior", &self.behavior.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Morph {
    fn default() -> Self {
        Self::new()
    }
}

impl Morph {
    /// A plain visible, draggable gray morph at the default bounds.
    pub fn new() -> Self {
        Self {
            bounds: Rect::new(0.0, 0.0, 50.0, 40.0),
            color: Rgba::gray(80),
            alpha: 255,
            flags: MorphFlags::default(),
            image: None,
            step_hz: 0,
            last_step_ms: 0,
            behavior: None,
        }
    }

    /// Builder: set the world-space bounds.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Builder: set the fill color.
    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    /// Builder: set the whole-morph alpha.
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder: replace the flag set.
    pub fn with_flags(mut self, flags: MorphFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Builder: add flags to the default set.
    pub fn with_added_flags(mut self, flags: MorphFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Builder: set the target step frequency in steps per second (0 disables).
    pub fn with_step_hz(mut self, hz: u32) -> Self {
        self.step_hz = hz;
        self
    }

    /// Builder: attach a behavior.
    pub fn with_behavior(mut self, behavior: Box<dyn Behavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The bounds origin (top-left corner).
    pub fn position(&self) -> Point {
        Point::new(self.bounds.x0, self.bounds.y0)
    }

    /// Width and height as a vector.
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.bounds.x1 - self.bounds.x0, self.bounds.y1 - self.bounds.y0)
    }

    /// Fill color.
    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Whole-morph alpha.
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// The flag set.
    pub fn flags(&self) -> MorphFlags {
        self.flags
    }

    /// Whether the morph is painted and hit-testable.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(MorphFlags::VISIBLE)
    }

    /// Whether the morph may be dragged.
    pub fn is_draggable(&self) -> bool {
        self.flags.contains(MorphFlags::DRAGGABLE)
    }

    /// Whether the morph is a drop-shadow decoration.
    pub fn is_shadow(&self) -> bool {
        self.flags.contains(MorphFlags::SHADOW)
    }

    /// Whether the morph clips its descendants to its bounds.
    pub fn clips_children(&self) -> bool {
        self.flags.contains(MorphFlags::CLIPS_CHILDREN)
    }

    /// The cached rendering, if built.
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    /// Target step frequency in steps per second (0 = no stepping).
    pub fn step_hz(&self) -> u32 {
        self.step_hz
    }
}
