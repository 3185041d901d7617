// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability contract collaborators implement against the core.
//!
//! A [`Behavior`] is attached to a morph at construction and supplies
//! everything the core treats as collaborator territory: rebuilding the image
//! cache, accepting drops, periodic stepping, and reacting to resolved
//! pointer/keyboard events. Every method has a do-nothing default, so a
//! behavior implements only the capabilities it declares via its morph's
//! [`MorphFlags`](crate::MorphFlags) — the flags gate dispatch, the trait
//! carries it.
//!
//! Callbacks receive `&mut World`, so a behavior may freely mutate the scene
//! (move morphs, spawn overlays, even delete its own morph). The world
//! detaches the behavior for the duration of the call; if the morph is gone
//! when the callback returns, the behavior is dropped with it.

use kurbo::Point;

use crate::event::PointerButton;
use crate::image::Image;
use crate::morph::Morph;
use crate::world::World;
use crate::MorphId;

/// Build the default image cache: the morph's bounds extent filled with its
/// color, modulated by its alpha.
pub(crate) fn default_image(morph: &Morph) -> Image {
    let mut image = Image::from_extent(morph.extent(), morph.color());
    image.set_alpha(morph.alpha());
    image
}

/// Collaborator-defined capabilities of a morph.
#[allow(unused_variables, reason = "default methods ignore their arguments")]
pub trait Behavior {
    /// Rebuild the image cache from the morph's current state.
    ///
    /// The core invokes this after spawn and after geometry or color
    /// mutations; it never reads a morph's pixels any other way. The default
    /// fills the bounds extent with the morph's color.
    fn draw_new(&mut self, morph: &Morph) -> Image {
        default_image(morph)
    }

    /// Drop-acceptance predicate: would this morph adopt `dropping` if it
    /// were released here? The root always accepts regardless of this answer.
    fn wants_drop_of(&self, dropping: MorphId) -> bool {
        false
    }

    /// Periodic behavior, called when this morph's step interval elapses.
    fn step(&mut self, world: &mut World, id: MorphId, now_ms: u64) {}

    /// A button went down with this morph as the resolved click target.
    fn mouse_down(&mut self, world: &mut World, id: MorphId, button: PointerButton, position: Point) {
    }

    /// A button came up with this morph as the resolved click target.
    fn mouse_up(&mut self, world: &mut World, id: MorphId, button: PointerButton, position: Point) {}

    /// Down and up resolved to this morph: a click.
    fn mouse_click(&mut self, world: &mut World, id: MorphId, button: PointerButton, position: Point)
    {
    }

    /// The pointer moved over this morph with a button held (requires
    /// [`MorphFlags::HANDLES_MOUSE_MOVE`](crate::MorphFlags::HANDLES_MOUSE_MOVE)).
    fn mouse_move(&mut self, world: &mut World, id: MorphId, position: Point) {}

    /// The pointer entered this morph's full bounds.
    fn mouse_enter(&mut self, world: &mut World, id: MorphId) {}

    /// The pointer left this morph's full bounds.
    fn mouse_leave(&mut self, world: &mut World, id: MorphId) {}

    /// As [`Behavior::mouse_enter`], while the primary button is held.
    fn mouse_enter_dragging(&mut self, world: &mut World, id: MorphId) {}

    /// As [`Behavior::mouse_leave`], while the primary button is held.
    fn mouse_leave_dragging(&mut self, world: &mut World, id: MorphId) {}

    /// A key went down while this morph held the keyboard focus.
    fn key_down(&mut self, world: &mut World, id: MorphId, code: u32) {}

    /// This selection overlay's pending choice was cancelled by a pointer
    /// press outside it.
    fn selection_cancelled(&mut self, world: &mut World, id: MorphId) {}

    /// Build a context-menu overlay for this morph, or `None` to decline.
    ///
    /// The returned morph is positioned at the pointer, attached to the
    /// root, and registered as a transient overlay by the caller.
    fn context_menu(&mut self, world: &mut World, id: MorphId) -> Option<MorphId> {
        None
    }
}
