// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tree root: arena storage, damage accumulation, hit testing, the
//! minimal-region repaint pass, and stepping.

use alloc::vec::Vec;
use hashbrown::HashSet;
use kurbo::{Point, Rect, Vec2};

use thicket_geometry::RectExt as _;
use thicket_tree::Arena;

use crate::behavior::default_image;
use crate::color::Rgba;
use crate::event::MorphEvent;
use crate::morph::{Morph, MorphFlags};
use crate::image::Surface;
use crate::MorphId;

/// How an open overlay reacts to a pointer press outside it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    /// Dismissed outright (deleted).
    Transient,
    /// Kept, but its pending choice is marked cancelled via
    /// [`MorphEvent::SelectionCancelled`].
    Selection,
}

/// An active keyboard-edit session: `receiver` gets key events, `target` is
/// the morph being edited. A pointer press on anything but the target ends
/// the session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    /// The morph receiving key events (e.g. a text cursor decoration).
    pub receiver: MorphId,
    /// The morph being edited.
    pub target: MorphId,
}

/// A pending request to enter or leave a modal interaction, queued by a
/// behavior callback and consumed by the pointer actor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InteractionRequest {
    /// Route pointer input to this morph until the button is released or the
    /// owner ends the interaction.
    Begin(MorphId),
    /// End the current modal interaction.
    End,
}

/// The scene root: owns every morph, the pending damage list, open overlays,
/// and the keyboard focus.
///
/// All post-construction morph mutation goes through the world so the damage
/// bracket protocol holds: report the old full bounds, mutate, report the new
/// full bounds. Damage reported against a subtree that is not attached under
/// the root is deliberately dropped, which is what lets scenes be assembled
/// off-screen before attachment.
pub struct World {
    arena: Arena<Morph>,
    root: MorphId,
    hand_anchor: MorphId,
    /// Pending dirty rectangles, in report order. Never coalesced.
    damage: Vec<Rect>,
    overlays: Vec<(MorphId, OverlayKind)>,
    keyboard_focus: Option<MorphId>,
    edit_session: Option<EditSession>,
    interaction_request: Option<InteractionRequest>,
    dev_mode: bool,
    quitting: bool,
}

impl core::fmt::Debug for World {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("World")
            .field("bounds", &self.bounds(self.root))
            .field("arena", &self.arena)
            .field("pending_damage", &self.damage.len())
            .field("overlays", &self.overlays.len())
            .field("dev_mode", &self.dev_mode)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Create a world spanning `(0, 0)` to `extent`.
    pub fn new(extent: Vec2) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(
            Morph::new()
                .with_bounds(Rect::new(0.0, 0.0, extent.x, extent.y))
                .with_color(Rgba::gray(130))
                .with_flags(
                    MorphFlags::VISIBLE
                        | MorphFlags::CLIPS_CHILDREN
                        | MorphFlags::ACCEPTS_DROPS
                        | MorphFlags::HANDLES_CLICK,
                ),
        );
        // The pointer anchor is a detached zero-extent node: its subtree is
        // invisible to hit testing and to the regular paint walk, and plain
        // damage reports against it are silent.
        let hand_anchor = arena.insert(
            Morph::new()
                .with_bounds(Rect::ZERO)
                .with_flags(MorphFlags::VISIBLE),
        );
        Self {
            arena,
            root,
            hand_anchor,
            damage: Vec::new(),
            overlays: Vec::new(),
            keyboard_focus: None,
            edit_session: None,
            interaction_request: None,
            dev_mode: true,
            quitting: false,
        }
    }

    // --- structure ---

    /// The root morph id.
    pub fn root(&self) -> MorphId {
        self.root
    }

    /// The pointer actor's anchor node (detached from the paint tree).
    pub fn hand_anchor(&self) -> MorphId {
        self.hand_anchor
    }

    /// Insert a detached morph and build its image cache.
    pub fn spawn(&mut self, morph: Morph) -> MorphId {
        let id = self.arena.insert(morph);
        self.refresh_image(id);
        id
    }

    /// Attach `child` under `parent` as the front-most child, detaching it
    /// from any prior parent first. Reports no damage; callers bracket the
    /// reparent themselves when it changes visible output.
    pub fn add(&mut self, parent: MorphId, child: MorphId) -> bool {
        self.arena.attach(parent, child)
    }

    /// Delete a morph and its subtree: report damage for its old position,
    /// detach it, and free its slots. The root and the hand anchor cannot be
    /// deleted.
    pub fn delete(&mut self, id: MorphId) {
        if id == self.root || id == self.hand_anchor || !self.arena.is_alive(id) {
            return;
        }
        self.full_changed(id);
        self.arena.remove(id);
        self.prune_stale_refs();
    }

    /// Whether `id` refers to a live morph.
    pub fn is_alive(&self, id: MorphId) -> bool {
        self.arena.is_alive(id)
    }

    /// Read access to a live morph's state.
    pub fn morph(&self, id: MorphId) -> Option<&Morph> {
        self.arena.get(id)
    }

    /// The parent of a morph, if any.
    pub fn parent(&self, id: MorphId) -> Option<MorphId> {
        self.arena.parent_of(id)
    }

    /// The ordered children of a morph (back-most first).
    pub fn children(&self, id: MorphId) -> &[MorphId] {
        self.arena.children_of(id)
    }

    /// Whether `id` is attached under the root (damage from it is honored).
    pub fn is_attached(&self, id: MorphId) -> bool {
        self.arena.root_of(id) == Some(self.root)
    }

    // --- geometry ---

    /// A morph's bounds, or a zero rect for stale ids.
    pub fn bounds(&self, id: MorphId) -> Rect {
        self.arena.get(id).map_or(Rect::ZERO, Morph::bounds)
    }

    /// A morph's bounds origin.
    pub fn position(&self, id: MorphId) -> Point {
        self.arena.get(id).map_or(Point::ZERO, Morph::position)
    }

    /// A morph's extent.
    pub fn extent(&self, id: MorphId) -> Vec2 {
        self.arena.get(id).map_or(Vec2::ZERO, Morph::extent)
    }

    /// A morph's bounds merged recursively with every descendant's full
    /// bounds. For a clipping container the children are confined, so only
    /// an attached drop shadow widens the result.
    pub fn full_bounds(&self, id: MorphId) -> Rect {
        let Some(m) = self.arena.get(id) else {
            return Rect::ZERO;
        };
        let mut result = m.bounds();
        if m.clips_children() {
            if let Some(shadow) = self.drop_shadow_of(id) {
                result = result.union(self.bounds(shadow));
            }
        } else {
            for &child in self.arena.children_of(id) {
                result = result.union(self.full_bounds(child));
            }
        }
        result
    }

    /// Translate a morph and all its descendants, bracketing with damage for
    /// the pre- and post-move full bounds.
    pub fn move_by(&mut self, id: MorphId, delta: Vec2) {
        if delta == Vec2::ZERO || !self.arena.is_alive(id) {
            return;
        }
        self.full_changed(id);
        for m in self.arena.descendants(id) {
            if let Some(morph) = self.arena.get_mut(m) {
                morph.bounds = morph.bounds + delta;
            }
        }
        self.full_changed(id);
    }

    /// Move a morph so its origin lands at `position` (children keep their
    /// relative offsets).
    pub fn set_position(&mut self, id: MorphId, position: Point) {
        let delta = position - self.position(id);
        if self.arena.is_alive(id) {
            self.move_by(id, delta);
        }
    }

    /// Move a morph so its bounds center lands at `center`.
    pub fn set_center(&mut self, id: MorphId, center: Point) {
        let half = self.extent(id) / 2.0;
        self.set_position(id, center - half);
    }

    /// Resize a morph in place, clamping to a non-negative extent and
    /// bracketing with damage. The image cache is left alone; use
    /// [`World::change_extent`] to also rebuild it.
    pub fn set_extent(&mut self, id: MorphId, extent: Vec2) {
        let extent = Vec2::new(extent.x.max(0.0), extent.y.max(0.0));
        if !self.arena.is_alive(id) || self.extent(id) == extent {
            return;
        }
        self.full_changed(id);
        if let Some(m) = self.arena.get_mut(id) {
            let origin = m.position();
            m.bounds = Rect::new(origin.x, origin.y, origin.x + extent.x, origin.y + extent.y);
        }
        self.full_changed(id);
    }

    /// Resize a morph and rebuild its image cache, bracketing with damage.
    pub fn change_extent(&mut self, id: MorphId, extent: Vec2) {
        if !self.arena.is_alive(id) {
            return;
        }
        let extent = Vec2::new(extent.x.max(0.0), extent.y.max(0.0));
        self.full_changed(id);
        if let Some(m) = self.arena.get_mut(id) {
            let origin = m.position();
            m.bounds = Rect::new(origin.x, origin.y, origin.x + extent.x, origin.y + extent.y);
        }
        self.refresh_image(id);
        self.full_changed(id);
    }

    /// Translate a morph the minimal amount so its full bounds lie within
    /// `container`'s bounds.
    pub fn keep_within(&mut self, id: MorphId, container: MorphId) {
        let full = self.full_bounds(id);
        let limit = self.bounds(container);
        let mut delta = Vec2::ZERO;
        if full.x0 < limit.x0 {
            delta.x = limit.x0 - full.x0;
        } else if full.x1 > limit.x1 {
            delta.x = limit.x1 - full.x1;
        }
        if full.y0 < limit.y0 {
            delta.y = limit.y0 - full.y0;
        } else if full.y1 > limit.y1 {
            delta.y = limit.y1 - full.y1;
        }
        if delta != Vec2::ZERO {
            self.move_by(id, delta);
        }
    }

    // --- visual state ---

    /// Replace a morph's fill color, rebuild its cache, and report damage.
    pub fn set_color(&mut self, id: MorphId, color: Rgba) {
        let Some(m) = self.arena.get_mut(id) else {
            return;
        };
        if m.color == color {
            return;
        }
        m.color = color;
        self.refresh_image(id);
        self.changed(id);
    }

    /// Replace a morph's alpha, rebuild its cache, and report damage.
    pub fn set_alpha(&mut self, id: MorphId, alpha: u8) {
        let Some(m) = self.arena.get_mut(id) else {
            return;
        };
        if m.alpha == alpha {
            return;
        }
        m.alpha = alpha;
        self.refresh_image(id);
        self.changed(id);
    }

    /// Replace a morph's flag set (no damage; flags alone don't move pixels,
    /// and visibility changes go through [`World::hide`]/[`World::show`]).
    pub fn set_flags(&mut self, id: MorphId, flags: MorphFlags) {
        if let Some(m) = self.arena.get_mut(id) {
            m.flags = flags;
        }
    }

    /// Set a morph's target step frequency in steps per second (0 disables).
    pub fn set_step_hz(&mut self, id: MorphId, hz: u32) {
        if let Some(m) = self.arena.get_mut(id) {
            m.step_hz = hz;
        }
    }

    /// Make a morph and its whole subtree invisible, reporting damage.
    pub fn hide(&mut self, id: MorphId) {
        self.set_visibility(id, false);
    }

    /// Make a morph and its whole subtree visible, reporting damage.
    pub fn show(&mut self, id: MorphId) {
        self.set_visibility(id, true);
    }

    fn set_visibility(&mut self, id: MorphId, visible: bool) {
        for m in self.arena.descendants(id) {
            if let Some(morph) = self.arena.get_mut(m) {
                morph.flags.set(MorphFlags::VISIBLE, visible);
            }
            self.changed(m);
        }
    }

    /// Rebuild a morph's image cache via its behavior's `draw_new` (or the
    /// default color fill). The root and the hand anchor carry no cache.
    pub fn refresh_image(&mut self, id: MorphId) {
        if id == self.root || id == self.hand_anchor {
            return;
        }
        let Some(taken) = self.arena.get_mut(id).map(|m| m.behavior.take()) else {
            return;
        };
        let image = match taken {
            Some(mut behavior) => {
                let Some(m) = self.arena.get(id) else {
                    return;
                };
                let image = behavior.draw_new(m);
                if let Some(m) = self.arena.get_mut(id)
                    && m.behavior.is_none()
                {
                    m.behavior = Some(behavior);
                }
                image
            }
            None => {
                let Some(m) = self.arena.get(id) else {
                    return;
                };
                default_image(m)
            }
        };
        if let Some(m) = self.arena.get_mut(id) {
            m.image = Some(image);
        }
    }

    // --- damage ---

    /// Report a morph's bounds as needing recomposition. Silent for subtrees
    /// not attached under the root.
    pub fn changed(&mut self, id: MorphId) {
        if self.is_attached(id) {
            let bounds = self.bounds(id);
            self.damage.push(bounds);
        }
    }

    /// Report a morph's full bounds as needing recomposition. Silent for
    /// subtrees not attached under the root.
    pub fn full_changed(&mut self, id: MorphId) {
        if self.is_attached(id) {
            let full = self.full_bounds(id);
            self.damage.push(full);
        }
    }

    /// Append a raw dirty rectangle. This bypasses the attachment check; the
    /// pointer actor uses it to report damage for its detached subtree.
    pub fn report_damage(&mut self, rect: Rect) {
        self.damage.push(rect);
    }

    /// The dirty rectangles queued so far, in report order.
    pub fn pending_damage(&self) -> &[Rect] {
        &self.damage
    }

    // --- hit testing ---

    /// The front-most visible, non-shadow morph whose full bounds contain
    /// `point` (half-open), falling back to the root. Later siblings win
    /// over earlier ones; the hand's subtree never participates.
    pub fn morph_at(&self, point: Point) -> MorphId {
        let all = self.arena.descendants(self.root);
        for &m in all.iter().rev() {
            let Some(morph) = self.arena.get(m) else {
                continue;
            };
            if morph.is_visible()
                && !morph.is_shadow()
                && self.full_bounds(m).contains_half_open(point)
            {
                return m;
            }
        }
        self.root
    }

    /// All visible morphs whose full bounds contain `point`, in pre-order.
    /// This is the mouse-over set source.
    pub fn morphs_at(&self, point: Point) -> Vec<MorphId> {
        self.arena
            .descendants(self.root)
            .into_iter()
            .filter(|&m| {
                self.arena.get(m).is_some_and(Morph::is_visible)
                    && self.full_bounds(m).contains_half_open(point)
            })
            .collect()
    }

    /// The highest ancestor reachable without crossing a clipping-container
    /// boundary: the unit that actually gets dragged.
    pub fn root_for_grab(&self, id: MorphId) -> MorphId {
        let mut cursor = id;
        loop {
            let Some(parent) = self.arena.parent_of(cursor) else {
                return cursor;
            };
            if self.arena.get(parent).is_some_and(Morph::clips_children) {
                return cursor;
            }
            cursor = parent;
        }
    }

    /// The nearest of `id` and its ancestors declaring click handling; the
    /// root qualifies as the universal fallback.
    pub fn click_handler_for(&self, id: MorphId) -> MorphId {
        self.arena
            .find_ancestor(id, |_, m| m.flags.contains(MorphFlags::HANDLES_CLICK))
            .unwrap_or(self.root)
    }

    /// Drop-acceptance predicate: the root always accepts; otherwise the
    /// `ACCEPTS_DROPS` flag short-circuits, else the behavior is consulted.
    pub fn accepts_drop_of(&self, target: MorphId, dropping: MorphId) -> bool {
        if target == self.root {
            return true;
        }
        let Some(m) = self.arena.get(target) else {
            return false;
        };
        if m.flags.contains(MorphFlags::ACCEPTS_DROPS) {
            return true;
        }
        m.behavior.as_ref().is_some_and(|b| b.wants_drop_of(dropping))
    }

    /// Walk outward from the morph under `point` to the first ancestor whose
    /// drop-acceptance predicate passes. Cannot fail: the root accepts.
    pub fn drop_target_for(&self, point: Point, dropping: MorphId) -> MorphId {
        let mut target = self.morph_at(point);
        loop {
            if self.accepts_drop_of(target, dropping) {
                return target;
            }
            target = self.arena.parent_of(target).unwrap_or(self.root);
        }
    }

    // --- drop shadows ---

    /// Attach a drop-shadow decoration under `id`, sized to its full bounds
    /// and offset by `offset`, and report damage.
    pub fn add_drop_shadow(&mut self, id: MorphId, offset: Vec2, alpha: u8) -> Option<MorphId> {
        if !self.arena.is_alive(id) {
            return None;
        }
        let full = self.full_bounds(id);
        let origin = self.position(id) + offset;
        let shadow = Morph::new()
            .with_bounds(Rect::new(
                origin.x,
                origin.y,
                origin.x + full.width(),
                origin.y + full.height(),
            ))
            .with_color(Rgba::BLACK)
            .with_alpha(alpha)
            .with_flags(MorphFlags::VISIBLE | MorphFlags::SHADOW);
        let sid = self.spawn(shadow);
        self.arena.attach(id, sid);
        self.full_changed(id);
        Some(sid)
    }

    /// The front-most drop-shadow child of `id`, if any.
    pub fn drop_shadow_of(&self, id: MorphId) -> Option<MorphId> {
        self.arena
            .children_of(id)
            .iter()
            .rev()
            .copied()
            .find(|&c| self.arena.get(c).is_some_and(Morph::is_shadow))
    }

    /// Remove `id`'s drop-shadow decoration, reporting damage first.
    pub fn remove_drop_shadow(&mut self, id: MorphId) {
        if let Some(shadow) = self.drop_shadow_of(id) {
            self.full_changed(id);
            self.arena.remove(shadow);
        }
    }

    // --- compositing ---

    /// Repaint every pending dirty rectangle with positive area: background
    /// fill, then every intersecting morph back-to-front clipped to the
    /// rectangle, then the hand's dragged content on top. Returns the
    /// repainted rectangles for the platform flush and clears the pending
    /// list.
    pub fn repaint(&mut self, surface: &mut dyn Surface) -> Vec<Rect> {
        let pending = core::mem::take(&mut self.damage);
        let mut flushed = Vec::new();
        let background = self.arena.get(self.root).map_or(Rgba::TRANSPARENT, Morph::color);
        for rect in pending {
            if !rect.has_area() {
                continue;
            }
            surface.fill(rect, background);
            for &child in self.arena.children_of(self.root) {
                self.draw_subtree(surface, child, rect);
            }
            self.draw_subtree(surface, self.hand_anchor, rect);
            flushed.push(rect);
        }
        if !flushed.is_empty() {
            log::trace!("repainted {} damaged region(s)", flushed.len());
        }
        flushed
    }

    /// Blit one morph's cached image restricted to `clip ∩ bounds`; skipped
    /// entirely when that intersection has no area.
    fn draw_morph(&self, surface: &mut dyn Surface, id: MorphId, clip: Rect) {
        let Some(m) = self.arena.get(id) else {
            return;
        };
        if !m.is_visible() {
            return;
        }
        let Some(image) = m.image() else {
            return;
        };
        let area = clip.intersect(m.bounds());
        if !area.has_area() {
            return;
        }
        let source = area - m.position().to_vec2();
        surface.blit(image, area.origin(), source);
    }

    /// Draw a morph and its children back-to-front. A clipping container
    /// narrows its descendants' clip to its own bounds; a drop-shadow child
    /// keeps the wider clip so it can stick out.
    fn draw_subtree(&self, surface: &mut dyn Surface, id: MorphId, clip: Rect) {
        let Some(m) = self.arena.get(id) else {
            return;
        };
        if !m.is_visible() {
            return;
        }
        if m.clips_children() {
            let clip = clip.intersect(self.full_bounds(id));
            self.draw_morph(surface, id, clip);
            let inner = self.bounds(id);
            for &child in self.arena.children_of(id) {
                if self.arena.get(child).is_some_and(Morph::is_shadow) {
                    self.draw_subtree(surface, child, clip);
                } else {
                    self.draw_subtree(surface, child, inner.intersect(clip));
                }
            }
        } else {
            self.draw_morph(surface, id, clip);
            for &child in self.arena.children_of(id) {
                self.draw_subtree(surface, child, clip);
            }
        }
    }

    // --- stepping ---

    /// One stepping pass: walk the tree pre-order from the root; a visible
    /// morph with a positive step frequency whose interval has elapsed gets
    /// its behavior's `step`. An invisible morph suppresses its entire
    /// subtree.
    pub fn step_frame(&mut self, now_ms: u64) {
        let mut stack = alloc::vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(m) = self.arena.get(id) else {
                continue;
            };
            if !m.is_visible() {
                continue;
            }
            let due = m.step_hz() > 0
                && now_ms.saturating_sub(m.last_step_ms) >= u64::from(1000 / m.step_hz());
            if due {
                if let Some(m) = self.arena.get_mut(id) {
                    m.last_step_ms = now_ms;
                }
                self.dispatch_step(id, now_ms);
            }
            for &child in self.arena.children_of(id).iter().rev() {
                stack.push(child);
            }
        }
    }

    fn dispatch_step(&mut self, id: MorphId, now_ms: u64) {
        let Some(Some(mut behavior)) = self.arena.get_mut(id).map(|m| m.behavior.take()) else {
            return;
        };
        behavior.step(self, id, now_ms);
        if let Some(m) = self.arena.get_mut(id)
            && m.behavior.is_none()
        {
            m.behavior = Some(behavior);
        }
    }

    // --- event dispatch ---

    /// Deliver a resolved event to one morph's behavior. Morphs without a
    /// behavior absorb events silently. The behavior is detached for the
    /// duration of the call, so it may mutate the world freely — including
    /// deleting its own morph, in which case it is dropped on return.
    pub fn dispatch(&mut self, id: MorphId, event: MorphEvent) {
        let Some(Some(mut behavior)) = self.arena.get_mut(id).map(|m| m.behavior.take()) else {
            return;
        };
        match event {
            MorphEvent::Down(button, position) => behavior.mouse_down(self, id, button, position),
            MorphEvent::Up(button, position) => behavior.mouse_up(self, id, button, position),
            MorphEvent::Click(button, position) => behavior.mouse_click(self, id, button, position),
            MorphEvent::Move(position) => behavior.mouse_move(self, id, position),
            MorphEvent::Enter => behavior.mouse_enter(self, id),
            MorphEvent::Leave => behavior.mouse_leave(self, id),
            MorphEvent::EnterDragging => behavior.mouse_enter_dragging(self, id),
            MorphEvent::LeaveDragging => behavior.mouse_leave_dragging(self, id),
            MorphEvent::KeyDown(code) => behavior.key_down(self, id, code),
            MorphEvent::SelectionCancelled => behavior.selection_cancelled(self, id),
        }
        if let Some(m) = self.arena.get_mut(id)
            && m.behavior.is_none()
        {
            m.behavior = Some(behavior);
        }
    }

    /// Route a key press to the current keyboard focus, if any.
    pub fn dispatch_key(&mut self, code: u32) {
        if let Some(focus) = self.keyboard_focus {
            self.dispatch(focus, MorphEvent::KeyDown(code));
        }
    }

    /// Ask a morph's behavior to build a context-menu overlay.
    pub fn build_context_menu(&mut self, id: MorphId) -> Option<MorphId> {
        let Some(Some(mut behavior)) = self.arena.get_mut(id).map(|m| m.behavior.take()) else {
            return None;
        };
        let menu = behavior.context_menu(self, id);
        if let Some(m) = self.arena.get_mut(id)
            && m.behavior.is_none()
        {
            m.behavior = Some(behavior);
        }
        menu
    }

    // --- overlays ---

    /// Register an open overlay so pointer presses outside it dismiss it.
    pub fn register_overlay(&mut self, id: MorphId, kind: OverlayKind) {
        if self.arena.is_alive(id) && !self.overlays.iter().any(|(m, _)| *m == id) {
            self.overlays.push((id, kind));
        }
    }

    /// Remove an overlay registration without touching the morph.
    pub fn unregister_overlay(&mut self, id: MorphId) {
        self.overlays.retain(|(m, _)| *m != id);
    }

    /// The currently open overlays.
    pub fn open_overlays(&self) -> &[(MorphId, OverlayKind)] {
        &self.overlays
    }

    /// Whether `id` or one of its ancestors is a registered overlay.
    pub fn is_within_overlay(&self, id: MorphId) -> bool {
        self.arena
            .ancestors(id)
            .iter()
            .any(|a| self.overlays.iter().any(|(m, _)| m == a))
    }

    /// Dismiss every open overlay the pointer is not over: transient
    /// overlays are deleted, selection overlays get their pending choice
    /// cancelled.
    pub fn dismiss_overlays_outside(&mut self, point: Point) {
        let under: HashSet<MorphId> = self.morphs_at(point).into_iter().collect();
        let snapshot = self.overlays.clone();
        for (overlay, kind) in snapshot {
            if under.contains(&overlay) {
                continue;
            }
            match kind {
                OverlayKind::Selection => self.dispatch(overlay, MorphEvent::SelectionCancelled),
                OverlayKind::Transient => {
                    log::debug!("dismissing transient overlay {overlay:?}");
                    self.delete(overlay);
                }
            }
        }
    }

    // --- keyboard focus & editing ---

    /// The morph currently receiving key events, if any.
    pub fn keyboard_focus(&self) -> Option<MorphId> {
        self.keyboard_focus
    }

    /// Set or clear the keyboard focus directly.
    pub fn set_keyboard_focus(&mut self, focus: Option<MorphId>) {
        self.keyboard_focus = focus;
    }

    /// Begin a keyboard-edit session: `receiver` (typically a cursor
    /// decoration) takes the focus, `target` is the morph being edited. Any
    /// prior session is ended first.
    pub fn begin_editing(&mut self, receiver: MorphId, target: MorphId) {
        self.stop_editing();
        if self.arena.is_alive(receiver) && self.arena.is_alive(target) {
            self.edit_session = Some(EditSession { receiver, target });
            self.keyboard_focus = Some(receiver);
        }
    }

    /// End the active keyboard-edit session, deleting its receiver and
    /// clearing the focus.
    pub fn stop_editing(&mut self) {
        if let Some(session) = self.edit_session.take() {
            self.delete(session.receiver);
        }
        self.keyboard_focus = None;
    }

    /// The active keyboard-edit session, if any.
    pub fn edit_session(&self) -> Option<EditSession> {
        self.edit_session
    }

    // --- modal interactions ---

    /// Ask the pointer actor to route pointer input to `owner` until the
    /// button is released or [`World::release_interaction`] is called.
    /// Behaviors call this from their callbacks (e.g. to own a resize drag).
    pub fn request_interaction(&mut self, owner: MorphId) {
        self.interaction_request = Some(InteractionRequest::Begin(owner));
    }

    /// End the current modal interaction at the owner's request.
    pub fn release_interaction(&mut self) {
        self.interaction_request = Some(InteractionRequest::End);
    }

    /// Consume the pending interaction request (pointer actor only).
    pub fn take_interaction_request(&mut self) -> Option<InteractionRequest> {
        self.interaction_request.take()
    }

    // --- mode & lifecycle ---

    /// Whether developer-mode affordances should be offered.
    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Toggle between developer and end-user mode.
    pub fn set_dev_mode(&mut self, dev_mode: bool) {
        self.dev_mode = dev_mode;
    }

    /// Ask the main loop to stop after the current cycle.
    pub fn request_quit(&mut self) {
        self.quitting = true;
    }

    /// Whether a shutdown has been requested.
    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    fn prune_stale_refs(&mut self) {
        let arena = &self.arena;
        self.overlays.retain(|(m, _)| arena.is_alive(*m));
        if self.keyboard_focus.is_some_and(|f| !self.arena.is_alive(f)) {
            self.keyboard_focus = None;
        }
        if let Some(session) = self.edit_session
            && (!self.arena.is_alive(session.receiver) || !self.arena.is_alive(session.target))
        {
            self.edit_session = None;
            if self.arena.is_alive(session.receiver) {
                self.full_changed(session.receiver);
                self.arena.remove(session.receiver);
            }
            if self.keyboard_focus == Some(session.receiver) {
                self.keyboard_focus = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Pixmap;
    use crate::Behavior;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    struct StepCounter {
        ticks: Rc<RefCell<u32>>,
    }

    impl Behavior for StepCounter {
        fn step(&mut self, _world: &mut World, _id: MorphId, _now_ms: u64) {
            *self.ticks.borrow_mut() += 1;
        }
    }

    struct KeyProbe {
        codes: Rc<RefCell<Vec<u32>>>,
    }

    impl Behavior for KeyProbe {
        fn key_down(&mut self, _world: &mut World, _id: MorphId, code: u32) {
            self.codes.borrow_mut().push(code);
        }
    }

    struct SelectionProbe {
        cancelled: Rc<RefCell<bool>>,
    }

    impl Behavior for SelectionProbe {
        fn selection_cancelled(&mut self, _world: &mut World, _id: MorphId) {
            *self.cancelled.borrow_mut() = true;
        }
    }

    struct AcceptsAll;

    impl Behavior for AcceptsAll {
        fn wants_drop_of(&self, _dropping: MorphId) -> bool {
            true
        }
    }

    fn world_610x314() -> World {
        World::new(Vec2::new(610.0, 314.0))
    }

    #[test]
    fn move_by_brackets_damage_with_old_and_new_full_bounds() {
        let mut world = world_610x314();
        let m = world.spawn(Morph::new());
        world.add(world.root(), m);
        assert!(world.pending_damage().is_empty(), "add alone reports nothing");

        world.move_by(m, Vec2::new(10.0, 0.0));
        assert_eq!(world.bounds(m).origin(), Point::new(10.0, 0.0));
        assert_eq!(
            world.pending_damage(),
            &[
                Rect::new(0.0, 0.0, 50.0, 40.0),
                Rect::new(10.0, 0.0, 60.0, 40.0),
            ]
        );
    }

    #[test]
    fn move_by_then_inverse_restores_bounds_exactly() {
        let mut world = world_610x314();
        let m = world.spawn(Morph::new().with_bounds(Rect::new(3.5, 7.25, 53.5, 47.25)));
        world.add(world.root(), m);
        let before = world.bounds(m);
        let delta = Vec2::new(17.0, -4.5);
        world.move_by(m, delta);
        world.move_by(m, -delta);
        assert_eq!(world.bounds(m), before);
    }

    #[test]
    fn children_translate_with_their_parent() {
        let mut world = world_610x314();
        let parent = world.spawn(Morph::new());
        let child = world.spawn(Morph::new().with_bounds(Rect::new(5.0, 5.0, 15.0, 15.0)));
        world.add(world.root(), parent);
        world.add(parent, child);
        world.move_by(parent, Vec2::new(100.0, 50.0));
        assert_eq!(world.bounds(child), Rect::new(105.0, 55.0, 115.0, 65.0));
    }

    #[test]
    fn damage_against_detached_subtree_is_silent() {
        let mut world = world_610x314();
        let m = world.spawn(Morph::new());
        // Off-screen assembly: mutations before attachment report nothing.
        world.move_by(m, Vec2::new(30.0, 30.0));
        world.full_changed(m);
        assert!(world.pending_damage().is_empty());

        world.add(world.root(), m);
        world.changed(m);
        assert_eq!(world.pending_damage().len(), 1);
    }

    #[test]
    fn delete_reports_old_position_then_stales_the_id() {
        let mut world = world_610x314();
        let m = world.spawn(Morph::new());
        world.add(world.root(), m);
        world.delete(m);
        assert_eq!(world.pending_damage(), &[Rect::new(0.0, 0.0, 50.0, 40.0)]);
        assert!(!world.is_alive(m));
        assert!(!world.children(world.root()).contains(&m));
    }

    #[test]
    fn full_bounds_aggregates_descendants() {
        let mut world = world_610x314();
        let parent = world.spawn(Morph::new().with_bounds(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let child = world.spawn(Morph::new().with_bounds(Rect::new(20.0, -5.0, 30.0, 5.0)));
        world.add(world.root(), parent);
        world.add(parent, child);
        assert_eq!(world.full_bounds(parent), Rect::new(0.0, -5.0, 30.0, 10.0));
    }

    #[test]
    fn clipping_container_full_bounds_ignore_children_but_not_shadow() {
        let mut world = world_610x314();
        let frame = world.spawn(
            Morph::new()
                .with_bounds(Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_added_flags(MorphFlags::CLIPS_CHILDREN),
        );
        let child = world.spawn(Morph::new().with_bounds(Rect::new(50.0, 50.0, 60.0, 60.0)));
        world.add(world.root(), frame);
        world.add(frame, child);
        assert_eq!(world.full_bounds(frame), Rect::new(0.0, 0.0, 10.0, 10.0));

        world.add_drop_shadow(frame, Vec2::new(7.0, 7.0), 50);
        assert_eq!(world.full_bounds(frame), Rect::new(0.0, 0.0, 17.0, 17.0));
    }

    #[test]
    fn hit_test_prefers_last_added_sibling() {
        let mut world = world_610x314();
        let a = world.spawn(Morph::new().with_bounds(Rect::new(0.0, 0.0, 20.0, 20.0)));
        let b = world.spawn(Morph::new().with_bounds(Rect::new(0.0, 0.0, 20.0, 20.0)));
        world.add(world.root(), a);
        world.add(world.root(), b);
        assert_eq!(world.morph_at(Point::new(5.0, 5.0)), b);
        // Re-adding a brings it to the front.
        world.add(world.root(), a);
        assert_eq!(world.morph_at(Point::new(5.0, 5.0)), a);
    }

    #[test]
    fn hit_test_skips_invisible_and_shadow_morphs_and_falls_back_to_root() {
        let mut world = world_610x314();
        let m = world.spawn(Morph::new().with_bounds(Rect::new(0.0, 0.0, 20.0, 20.0)));
        world.add(world.root(), m);
        let shadow = world.add_drop_shadow(m, Vec2::new(2.0, 2.0), 50).unwrap();
        world.hide(m);
        assert_eq!(world.morph_at(Point::new(5.0, 5.0)), world.root());
        world.show(m);
        assert_eq!(world.morph_at(Point::new(5.0, 5.0)), m);
        // A point over only the shadow resolves to the shadow's owner (whose
        // full bounds include it), never to the shadow itself.
        assert_ne!(world.morph_at(Point::new(21.0, 21.0)), shadow);
        assert_eq!(world.morph_at(Point::new(21.0, 21.0)), m);
    }

    #[test]
    fn hit_test_uses_half_open_containment() {
        let mut world = world_610x314();
        let m = world.spawn(Morph::new().with_bounds(Rect::new(0.0, 0.0, 10.0, 10.0)));
        world.add(world.root(), m);
        assert_eq!(world.morph_at(Point::new(9.0, 9.0)), m);
        assert_eq!(world.morph_at(Point::new(10.0, 5.0)), world.root());
    }

    #[test]
    fn hit_test_descends_into_nested_children_front_first() {
        let mut world = world_610x314();
        let outer = world.spawn(Morph::new().with_bounds(Rect::new(0.0, 0.0, 40.0, 40.0)));
        let inner = world.spawn(Morph::new().with_bounds(Rect::new(10.0, 10.0, 20.0, 20.0)));
        world.add(world.root(), outer);
        world.add(outer, inner);
        assert_eq!(world.morph_at(Point::new(15.0, 15.0)), inner);
        assert_eq!(world.morph_at(Point::new(5.0, 5.0)), outer);
    }

    #[test]
    fn root_for_grab_stops_below_clipping_containers() {
        let mut world = world_610x314();
        let frame = world.spawn(
            Morph::new()
                .with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0))
                .with_added_flags(MorphFlags::CLIPS_CHILDREN),
        );
        let control = world.spawn(Morph::new().with_bounds(Rect::new(10.0, 10.0, 50.0, 50.0)));
        let label = world.spawn(Morph::new().with_bounds(Rect::new(12.0, 12.0, 30.0, 20.0)));
        world.add(world.root(), frame);
        world.add(frame, control);
        world.add(control, label);
        // Dragging the label drags its containing control, but never the frame.
        assert_eq!(world.root_for_grab(label), control);
        assert_eq!(world.root_for_grab(control), control);
        // Outside any frame, the walk stops below the (clipping) root.
        let free = world.spawn(Morph::new());
        world.add(world.root(), free);
        assert_eq!(world.root_for_grab(free), free);
    }

    #[test]
    fn click_handler_walk_reaches_nearest_declaring_ancestor_or_root() {
        let mut world = world_610x314();
        let button = world.spawn(Morph::new().with_added_flags(MorphFlags::HANDLES_CLICK));
        let label = world.spawn(Morph::new());
        let plain = world.spawn(Morph::new());
        world.add(world.root(), button);
        world.add(button, label);
        world.add(world.root(), plain);
        assert_eq!(world.click_handler_for(label), button);
        assert_eq!(world.click_handler_for(button), button);
        assert_eq!(world.click_handler_for(plain), world.root());
    }

    #[test]
    fn drop_target_resolution_walks_to_acceptor_or_root() {
        let mut world = world_610x314();
        let dragged = world.spawn(Morph::new());
        let bin = world.spawn(
            Morph::new()
                .with_bounds(Rect::new(0.0, 0.0, 100.0, 100.0))
                .with_behavior(alloc::boxed::Box::new(AcceptsAll)),
        );
        let lid = world.spawn(Morph::new().with_bounds(Rect::new(0.0, 0.0, 100.0, 20.0)));
        world.add(world.root(), bin);
        world.add(bin, lid);
        // The lid declines, its parent's behavior accepts.
        assert_eq!(world.drop_target_for(Point::new(5.0, 5.0), dragged), bin);
        // Over nothing acceptant, the root is the universal fallback.
        assert_eq!(
            world.drop_target_for(Point::new(500.0, 300.0), dragged),
            world.root()
        );
    }

    #[test]
    fn set_extent_clamps_negative_components() {
        let mut world = world_610x314();
        let m = world.spawn(Morph::new());
        world.add(world.root(), m);
        world.set_extent(m, Vec2::new(-5.0, 12.0));
        assert_eq!(world.bounds(m), Rect::new(0.0, 0.0, 0.0, 12.0));
        assert_eq!(world.pending_damage().len(), 2);
    }

    #[test]
    fn repaint_flushes_positive_area_rects_and_clears_pending() {
        let mut world = world_610x314();
        let mut surface = Pixmap::new(610, 314);
        let m = world.spawn(Morph::new());
        world.add(world.root(), m);
        world.changed(m);
        world.report_damage(Rect::new(9.0, 9.0, 9.0, 20.0)); // degenerate, dropped
        let flushed = world.repaint(&mut surface);
        assert_eq!(flushed, vec![Rect::new(0.0, 0.0, 50.0, 40.0)]);
        assert!(world.pending_damage().is_empty());
    }

    #[test]
    fn repaint_is_idempotent_for_redundant_damage() {
        let mut world = world_610x314();
        let mut surface = Pixmap::new(610, 314);
        let a = world.spawn(Morph::new().with_color(Rgba::opaque(200, 0, 0)));
        let b = world.spawn(
            Morph::new()
                .with_bounds(Rect::new(30.0, 20.0, 80.0, 60.0))
                .with_color(Rgba::opaque(0, 0, 200)),
        );
        world.add(world.root(), a);
        world.add(world.root(), b);
        world.changed(world.root());
        world.repaint(&mut surface);
        let reference = surface.clone();

        // A pile of overlapping, redundant damage must not change a single pixel.
        world.report_damage(Rect::new(0.0, 0.0, 80.0, 60.0));
        world.report_damage(Rect::new(10.0, 10.0, 40.0, 40.0));
        world.report_damage(Rect::new(0.0, 0.0, 610.0, 314.0));
        world.repaint(&mut surface);
        assert_eq!(surface, reference);

        // A mutation sequence netting to zero visual change repaints to the
        // same composite, however many bracket rectangles it queued.
        world.move_by(b, Vec2::new(5.0, 5.0));
        world.move_by(b, Vec2::new(-5.0, -5.0));
        assert_eq!(world.pending_damage().len(), 4);
        world.repaint(&mut surface);
        assert_eq!(surface, reference);
    }

    #[test]
    fn repaint_leaves_pixels_outside_damage_untouched() {
        let mut world = world_610x314();
        let mut surface = Pixmap::new(610, 314);
        let m = world.spawn(Morph::new().with_color(Rgba::opaque(0, 200, 0)));
        world.add(world.root(), m);
        world.changed(world.root());
        world.repaint(&mut surface);

        world.delete(m);
        world.repaint(&mut surface);
        // Former morph area reverts to the background...
        assert_eq!(surface.pixel(10, 10), Some(Rgba::gray(130)));
        // ...and a far-away pixel was never revisited.
        assert_eq!(surface.pixel(300, 200), Some(Rgba::gray(130)));
    }

    #[test]
    fn clipping_container_confines_children_to_its_bounds() {
        let mut world = world_610x314();
        let mut surface = Pixmap::new(610, 314);
        let frame = world.spawn(
            Morph::new()
                .with_bounds(Rect::new(10.0, 10.0, 30.0, 30.0))
                .with_color(Rgba::opaque(50, 50, 50))
                .with_added_flags(MorphFlags::CLIPS_CHILDREN),
        );
        let child = world.spawn(
            Morph::new()
                .with_bounds(Rect::new(20.0, 20.0, 60.0, 60.0))
                .with_color(Rgba::opaque(200, 0, 0)),
        );
        world.add(world.root(), frame);
        world.add(frame, child);
        world.changed(world.root());
        world.repaint(&mut surface);
        assert_eq!(surface.pixel(25, 25), Some(Rgba::opaque(200, 0, 0)));
        // Outside the frame the child is clipped away.
        assert_eq!(surface.pixel(35, 25), Some(Rgba::gray(130)));
    }

    #[test]
    fn hand_subtree_paints_on_top_of_everything() {
        let mut world = world_610x314();
        let mut surface = Pixmap::new(610, 314);
        let below = world.spawn(Morph::new().with_color(Rgba::opaque(0, 0, 200)));
        world.add(world.root(), below);
        let dragged = world.spawn(Morph::new().with_color(Rgba::opaque(200, 200, 0)));
        world.add(world.hand_anchor(), dragged);
        world.changed(world.root());
        world.repaint(&mut surface);
        assert_eq!(surface.pixel(10, 10), Some(Rgba::opaque(200, 200, 0)));
    }

    #[test]
    fn stepping_honors_frequency_and_visibility() {
        let mut world = world_610x314();
        let ticks = Rc::new(RefCell::new(0));
        let stepper = world.spawn(
            Morph::new()
                .with_step_hz(10)
                .with_behavior(alloc::boxed::Box::new(StepCounter {
                    ticks: Rc::clone(&ticks),
                })),
        );
        world.add(world.root(), stepper);

        world.step_frame(0);
        assert_eq!(*ticks.borrow(), 0, "interval has not elapsed yet");
        world.step_frame(100);
        assert_eq!(*ticks.borrow(), 1);
        world.step_frame(150);
        assert_eq!(*ticks.borrow(), 1, "throttled to 10 steps per second");
        world.step_frame(200);
        assert_eq!(*ticks.borrow(), 2);
    }

    #[test]
    fn invisible_morph_suppresses_stepping_for_its_subtree() {
        let mut world = world_610x314();
        let ticks = Rc::new(RefCell::new(0));
        let parent = world.spawn(Morph::new());
        let stepper = world.spawn(
            Morph::new()
                .with_step_hz(1000)
                .with_behavior(alloc::boxed::Box::new(StepCounter {
                    ticks: Rc::clone(&ticks),
                })),
        );
        world.add(world.root(), parent);
        world.add(parent, stepper);
        world.hide(parent);
        world.step_frame(10_000);
        assert_eq!(*ticks.borrow(), 0);
        world.show(parent);
        world.step_frame(20_000);
        assert_eq!(*ticks.borrow(), 1);
    }

    #[test]
    fn zero_frequency_never_steps() {
        let mut world = world_610x314();
        let ticks = Rc::new(RefCell::new(0));
        let idle = world.spawn(Morph::new().with_behavior(alloc::boxed::Box::new(StepCounter {
            ticks: Rc::clone(&ticks),
        })));
        world.add(world.root(), idle);
        world.step_frame(1_000_000);
        assert_eq!(*ticks.borrow(), 0);
    }

    #[test]
    fn transient_overlay_is_dismissed_when_pressed_outside() {
        let mut world = world_610x314();
        let menu = world.spawn(Morph::new().with_bounds(Rect::new(100.0, 100.0, 140.0, 160.0)));
        world.add(world.root(), menu);
        world.register_overlay(menu, OverlayKind::Transient);

        // Press inside: kept.
        world.dismiss_overlays_outside(Point::new(110.0, 110.0));
        assert!(world.is_alive(menu));

        // Press outside: deleted and unregistered.
        world.dismiss_overlays_outside(Point::new(5.0, 5.0));
        assert!(!world.is_alive(menu));
        assert!(world.open_overlays().is_empty());
    }

    #[test]
    fn selection_overlay_is_cancelled_but_kept() {
        let mut world = world_610x314();
        let cancelled = Rc::new(RefCell::new(false));
        let picker = world.spawn(
            Morph::new()
                .with_bounds(Rect::new(100.0, 100.0, 140.0, 160.0))
                .with_behavior(alloc::boxed::Box::new(SelectionProbe {
                    cancelled: Rc::clone(&cancelled),
                })),
        );
        world.add(world.root(), picker);
        world.register_overlay(picker, OverlayKind::Selection);
        world.dismiss_overlays_outside(Point::new(5.0, 5.0));
        assert!(*cancelled.borrow());
        assert!(world.is_alive(picker), "selection overlays outlive cancellation");
    }

    #[test]
    fn edit_session_routes_keys_and_tears_down() {
        let mut world = world_610x314();
        let codes = Rc::new(RefCell::new(Vec::new()));
        let target = world.spawn(Morph::new());
        let cursor = world.spawn(Morph::new().with_behavior(alloc::boxed::Box::new(KeyProbe {
            codes: Rc::clone(&codes),
        })));
        world.add(world.root(), target);
        world.add(target, cursor);

        world.begin_editing(cursor, target);
        assert_eq!(world.keyboard_focus(), Some(cursor));
        world.dispatch_key(42);
        assert_eq!(&*codes.borrow(), &[42]);

        world.stop_editing();
        assert_eq!(world.keyboard_focus(), None);
        assert!(!world.is_alive(cursor), "the receiver is deleted with the session");
        world.dispatch_key(43);
        assert_eq!(&*codes.borrow(), &[42], "no focus, no delivery");
    }

    #[test]
    fn deleting_the_edit_target_ends_the_session() {
        let mut world = world_610x314();
        let target = world.spawn(Morph::new());
        let cursor = world.spawn(Morph::new());
        world.add(world.root(), target);
        world.add(world.root(), cursor);
        world.begin_editing(cursor, target);
        world.delete(target);
        assert_eq!(world.edit_session(), None);
        assert_eq!(world.keyboard_focus(), None);
    }

    #[test]
    fn set_color_rebuilds_the_cache_and_reports_damage() {
        let mut world = world_610x314();
        let m = world.spawn(Morph::new());
        world.add(world.root(), m);
        world.set_color(m, Rgba::opaque(9, 8, 7));
        let image = world.morph(m).unwrap().image().unwrap();
        assert_eq!(image.pixel(0, 0), Some(Rgba::opaque(9, 8, 7)));
        assert_eq!(world.pending_damage(), &[Rect::new(0.0, 0.0, 50.0, 40.0)]);
    }

    #[test]
    fn keep_within_translates_back_inside() {
        let mut world = world_610x314();
        let m = world.spawn(Morph::new().with_bounds(Rect::new(-10.0, 300.0, 40.0, 340.0)));
        world.add(world.root(), m);
        world.keep_within(m, world.root());
        let fb = world.full_bounds(m);
        assert!(world.bounds(world.root()).contains_rect(fb));
        assert_eq!(world.bounds(m), Rect::new(0.0, 274.0, 50.0, 314.0));
    }
}
