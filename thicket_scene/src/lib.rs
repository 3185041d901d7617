// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Scene: a retained-mode morph hierarchy with damage tracking.
//!
//! A scene is a tree of **morphs** — nodes with world-space bounds, a cached
//! rendered image, visibility/interaction flags, and an optional [`Behavior`]
//! supplying the collaborator-defined capabilities (drawing, clicking,
//! stepping, drop acceptance). The tree root is the [`World`], which also
//! owns the pending **damage** list: every mutation that changes visible
//! output brackets itself with damage reports for the pre- and post-mutation
//! full bounds, and [`World::repaint`] recomposites exactly the reported
//! rectangles, back-to-front, clipped — never the whole surface.
//!
//! ## Cardinal invariant
//!
//! Any mutation that changes a morph's visible output must report damage for
//! both the old and the new full bounds. Damage rectangles are never merged;
//! overlapping reports cost redundant redraw work but repainting is
//! idempotent, so pixels are always correct.
//!
//! ## What lives where
//!
//! - [`Morph`]: per-node visual state and flags ([`MorphFlags`]).
//! - [`World`]: the root; arena storage, damage accumulation, hit testing,
//!   the repaint pass, stepping, overlays, and keyboard focus.
//! - [`Behavior`]: the capability contract collaborators implement.
//! - [`Surface`] / [`Image`] / [`Pixmap`]: the render boundary — the core
//!   only ever requests sub-rectangle blits of cached images.
//! - [`Event`] / [`MorphEvent`]: the normalized input taxonomy and the
//!   callback dispatch vocabulary consumed by the pointer actor.
//!
//! Hit testing is a reverse pre-order scan: the front-most (last-added)
//! visible, non-shadow morph whose full bounds contain the point wins.
//! Containment is half-open throughout.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod behavior;
mod color;
mod event;
mod image;
mod morph;
mod world;

pub use behavior::Behavior;
pub use color::Rgba;
pub use event::{Buttons, Event, MorphEvent, PointerButton};
pub use image::{Image, Pixmap, Surface};
pub use morph::{Morph, MorphFlags};
pub use world::{EditSession, InteractionRequest, OverlayKind, World};

/// Identifier for a morph in a [`World`] (generational).
pub type MorphId = thicket_tree::NodeId;
