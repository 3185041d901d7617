// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Hand: the pointer actor.
//!
//! The [`Hand`] consumes normalized pointer events and drives the hover,
//! click, and drag-and-drop protocols against a
//! [`World`](thicket_scene::World):
//!
//! - **Hover**: on every move, the set of visible morphs under the pointer is
//!   diffed against the previous set; leave callbacks fire before enter
//!   callbacks, gated by each morph's `HANDLES_MOUSE_OVER` flag.
//! - **Click**: a press resolves to the nearest click-handling ancestor of
//!   the hit morph (the root as fallback) and records it; a release on the
//!   same resolved target synthesizes exactly one click.
//! - **Drag and drop**: a press also records the hit morph's `root_for_grab`
//!   as the grab candidate. If a later move with the primary button held
//!   resolves to the same candidate and it is draggable, the hand takes it —
//!   exclusive single-slot ownership under the hand's detached anchor node —
//!   and any release walks the hit chain outward to the first ancestor whose
//!   drop-acceptance predicate passes (the root always accepts, so a drag can
//!   never be stranded).
//! - **Modal interactions**: a behavior may claim the pointer via
//!   [`World::request_interaction`]; the hand then routes pointer input to
//!   that owner until the button is released or the owner lets go. There is
//!   no other cancellation: releasing the button is the only abort.
//!
//! The hand's anchor node is part of the world's arena but detached from the
//! paint tree, so the dragged morph is excluded from hit testing by
//! construction and painted on top of everything by the repaint pass. Damage
//! for the dragged content is reported explicitly around every anchor move.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

use hashbrown::HashSet;
use kurbo::{Point, Vec2};

use thicket_geometry::RectExt as _;
use thicket_scene::{
    Buttons, InteractionRequest, Morph, MorphEvent, MorphFlags, MorphId, OverlayKind,
    PointerButton, World,
};

/// Appearance of the drop-shadow decoration attached to a grabbed morph.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadowStyle {
    /// Offset of the shadow from the grabbed morph's position.
    pub offset: Vec2,
    /// Shadow alpha.
    pub alpha: u8,
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            offset: Vec2::new(7.0, 7.0),
            alpha: 50,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum HandState {
    Idle,
    Dragging(MorphId),
    Modal { owner: MorphId },
}

/// The pointer actor: hit-tests the world, tracks hover, and owns the
/// click/drag/drop state machine.
#[derive(Debug)]
pub struct Hand {
    anchor: MorphId,
    position: Point,
    state: HandState,
    /// Morphs currently under the pointer, in pre-order.
    mouse_over: alloc::vec::Vec<MorphId>,
    /// The resolved target of the last press, for click synthesis.
    mouse_down_target: Option<MorphId>,
    /// The drag unit recorded at the last press, eligible for grabbing.
    grab_candidate: Option<MorphId>,
    shadow: ShadowStyle,
}

impl Hand {
    /// Create a hand around the world's anchor node
    /// ([`World::hand_anchor`]).
    pub fn new(anchor: MorphId) -> Self {
        Self {
            anchor,
            position: Point::ZERO,
            state: HandState::Idle,
            mouse_over: alloc::vec::Vec::new(),
            mouse_down_target: None,
            grab_candidate: None,
            shadow: ShadowStyle::default(),
        }
    }

    /// Builder: override the drop-shadow style.
    pub fn with_shadow_style(mut self, shadow: ShadowStyle) -> Self {
        self.shadow = shadow;
        self
    }

    /// Current pointer position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// The morph being dragged, if any.
    pub fn dragged(&self) -> Option<MorphId> {
        match self.state {
            HandState::Dragging(m) => Some(m),
            _ => None,
        }
    }

    /// Whether `morph` is the one currently being dragged.
    pub fn is_dragging(&self, morph: MorphId) -> bool {
        self.dragged() == Some(morph)
    }

    /// Morphs currently under the pointer, in pre-order.
    pub fn hovered(&self) -> &[MorphId] {
        &self.mouse_over
    }

    // --- event entry points ---

    /// Handle a pointer move to `position` with `buttons` held.
    pub fn pointer_move(&mut self, world: &mut World, position: Point, buttons: Buttons) {
        self.move_anchor(world, position);
        self.sync_interaction(world);

        if let HandState::Modal { owner } = self.state {
            if world.is_alive(owner) {
                world.dispatch(owner, MorphEvent::Move(position));
            } else {
                self.state = HandState::Idle;
            }
            self.update_hover(world, position, buttons);
            self.sync_interaction(world);
            return;
        }

        self.update_hover(world, position, buttons);

        if buttons.primary() && self.state == HandState::Idle {
            let top = world.morph_at(position);
            if world
                .morph(top)
                .is_some_and(|m| m.flags().contains(MorphFlags::HANDLES_MOUSE_MOVE))
            {
                world.dispatch(top, MorphEvent::Move(position));
            }
            let unit = world.root_for_grab(top);
            if Some(unit) == self.grab_candidate
                && world.morph(unit).is_some_and(Morph::is_draggable)
            {
                self.grab(world, unit);
            }
        }
        self.sync_interaction(world);
    }

    /// Handle a button press at `position`.
    ///
    /// While dragging, any press drops. Otherwise this dismisses overlays
    /// the pointer is not over, ends a keyboard-edit session aimed at a
    /// different morph, records the grab candidate and the resolved click
    /// target, and dispatches the down callback.
    pub fn pointer_down(&mut self, world: &mut World, button: PointerButton, position: Point) {
        self.move_anchor(world, position);
        self.sync_interaction(world);

        match self.state {
            HandState::Modal { owner } => {
                if world.is_alive(owner) {
                    world.dispatch(owner, MorphEvent::Down(button, position));
                } else {
                    self.state = HandState::Idle;
                }
                self.sync_interaction(world);
                return;
            }
            HandState::Dragging(_) => {
                self.drop_dragged(world);
                return;
            }
            HandState::Idle => {}
        }

        let mut hit = world.morph_at(position);
        world.dismiss_overlays_outside(position);
        if let Some(session) = world.edit_session()
            && session.target != hit
        {
            world.stop_editing();
        }
        if !world.is_alive(hit) {
            hit = world.morph_at(position);
        }

        self.grab_candidate = Some(world.root_for_grab(hit));
        let target = world.click_handler_for(hit);
        self.mouse_down_target = Some(target);
        world.dispatch(target, MorphEvent::Down(button, position));
        self.sync_interaction(world);
    }

    /// Handle a button release at `position`.
    ///
    /// While dragging, the release performs the drop. Otherwise the up
    /// callback goes to the resolved click target, a click is synthesized if
    /// that target also took the down, and a right-button release outside
    /// any overlay asks the hit morph for a context menu.
    pub fn pointer_up(&mut self, world: &mut World, button: PointerButton, position: Point) {
        self.move_anchor(world, position);
        self.sync_interaction(world);

        match self.state {
            HandState::Modal { owner } => {
                if world.is_alive(owner) {
                    world.dispatch(owner, MorphEvent::Up(button, position));
                }
                // Releasing the button is the only way out of a gesture.
                self.state = HandState::Idle;
                self.mouse_down_target = None;
                self.sync_interaction(world);
                return;
            }
            HandState::Dragging(_) => {
                self.drop_dragged(world);
                return;
            }
            HandState::Idle => {}
        }

        let mut hit = world.morph_at(position);
        if button == PointerButton::Right && !world.is_within_overlay(hit) {
            self.request_context_menu(world, hit, position);
        }
        if !world.is_alive(hit) {
            hit = world.morph_at(position);
        }
        let target = world.click_handler_for(hit);
        world.dispatch(target, MorphEvent::Up(button, position));
        if self.mouse_down_target == Some(target) {
            world.dispatch(target, MorphEvent::Click(button, position));
        }
        self.mouse_down_target = None;
        self.sync_interaction(world);
    }

    // --- dragging and dropping ---

    /// Take exclusive ownership of `morph`: end any keyboard-edit session,
    /// attach its drop shadow, and reparent it under the hand's anchor.
    /// No-op unless the hand is idle and the morph is live.
    pub fn grab(&mut self, world: &mut World, morph: MorphId) {
        if self.state != HandState::Idle || !world.is_alive(morph) || morph == world.root() {
            return;
        }
        log::debug!("hand grabs {morph:?}");
        world.stop_editing();
        world.add_drop_shadow(morph, self.shadow.offset, self.shadow.alpha);
        world.add(world.hand_anchor(), morph);
        self.state = HandState::Dragging(morph);
        self.report_damage(world);
    }

    /// Drop the dragged morph onto the first drop-accepting ancestor in the
    /// pointer's hit chain (the root as universal fallback) and return to
    /// idle.
    pub fn drop_dragged(&mut self, world: &mut World) {
        let HandState::Dragging(morph) = self.state else {
            return;
        };
        self.state = HandState::Idle;
        self.grab_candidate = None;
        self.mouse_down_target = None;
        if !world.is_alive(morph) {
            return;
        }
        let target = world.drop_target_for(self.position, morph);
        log::debug!("hand drops {morph:?} onto {target:?}");
        self.report_damage(world);
        world.add(target, morph);
        world.changed(morph);
        world.remove_drop_shadow(morph);
    }

    /// Center `morph` at the pointer and grab it. This is how freshly built
    /// morphs are handed to the user.
    pub fn pick_up(&mut self, world: &mut World, morph: MorphId) {
        world.set_center(morph, self.position);
        self.grab(world, morph);
    }

    // --- internals ---

    /// Move the anchor (and with it any dragged child) to the pointer,
    /// bracketing with damage when the hand carries visible content.
    fn move_anchor(&mut self, world: &mut World, position: Point) {
        let delta = position - world.position(self.anchor);
        if delta != Vec2::ZERO {
            self.report_damage(world);
            world.move_by(self.anchor, delta);
            self.report_damage(world);
        }
        self.position = position;
    }

    /// Report the hand subtree's full bounds as damage. The anchor is
    /// detached, so ordinary damage reporting is silent for it; this is the
    /// explicit channel, guarded to nothing while the hand is empty.
    fn report_damage(&self, world: &mut World) {
        let full = world.full_bounds(self.anchor);
        if full.has_area() {
            world.report_damage(full);
        }
    }

    /// Diff the morphs under the pointer against the previous hover set and
    /// fire leave (first) and enter callbacks on the symmetric difference.
    fn update_hover(&mut self, world: &mut World, position: Point, buttons: Buttons) {
        let over = world.morphs_at(position);
        let over_set: HashSet<MorphId> = over.iter().copied().collect();
        let old_set: HashSet<MorphId> = self.mouse_over.iter().copied().collect();
        let held = buttons.primary();

        let handles_over = |world: &World, id: MorphId| {
            world
                .morph(id)
                .is_some_and(|m| m.flags().contains(MorphFlags::HANDLES_MOUSE_OVER))
        };
        for &old in &self.mouse_over {
            if !over_set.contains(&old) && handles_over(world, old) {
                world.dispatch(old, MorphEvent::Leave);
                if held {
                    world.dispatch(old, MorphEvent::LeaveDragging);
                }
            }
        }
        for &new in &over {
            if !old_set.contains(&new) && handles_over(world, new) {
                world.dispatch(new, MorphEvent::Enter);
                if held {
                    world.dispatch(new, MorphEvent::EnterDragging);
                }
            }
        }
        self.mouse_over = over;
    }

    /// Consume a queued modal-interaction request from behavior callbacks.
    /// A drag in progress is never preempted.
    fn sync_interaction(&mut self, world: &mut World) {
        match world.take_interaction_request() {
            Some(InteractionRequest::Begin(owner)) => {
                if !matches!(self.state, HandState::Dragging(_)) && world.is_alive(owner) {
                    log::debug!("modal interaction owned by {owner:?}");
                    self.state = HandState::Modal { owner };
                }
            }
            Some(InteractionRequest::End) => {
                if matches!(self.state, HandState::Modal { .. }) {
                    self.state = HandState::Idle;
                }
            }
            None => {}
        }
    }

    fn request_context_menu(&mut self, world: &mut World, hit: MorphId, position: Point) {
        if let Some(menu) = world.build_context_menu(hit) {
            log::debug!("context menu for {hit:?}");
            world.set_position(menu, position);
            world.add(world.root(), menu);
            world.register_overlay(menu, OverlayKind::Transient);
            world.full_changed(menu);
        }
    }
}
