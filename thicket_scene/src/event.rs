// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The normalized input taxonomy and the callback dispatch vocabulary.
//!
//! Hosts translate their native windowing events into [`Event`] values; that
//! translation lives outside the core. The pointer actor resolves each
//! [`Event`] into zero or more [`MorphEvent`]s dispatched to individual
//! morphs' behaviors, gated by their capability flags.

use kurbo::Point;

/// A pointer button.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// The primary button.
    Left,
    /// The middle button or wheel press.
    Middle,
    /// The secondary button.
    Right,
}

bitflags::bitflags! {
    /// The set of buttons held during a pointer-move event.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u8 {
        /// The primary button is held.
        const LEFT = 0b0000_0001;
        /// The middle button is held.
        const MIDDLE = 0b0000_0010;
        /// The secondary button is held.
        const RIGHT = 0b0000_0100;
    }
}

impl Buttons {
    /// Whether the primary button is held.
    pub const fn primary(self) -> bool {
        self.contains(Self::LEFT)
    }
}

/// A normalized input event, in absolute world coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Event {
    /// The pointer moved.
    PointerMove {
        /// New pointer position.
        position: Point,
        /// Buttons held during the move.
        buttons: Buttons,
    },
    /// A pointer button was pressed.
    PointerDown {
        /// The pressed button.
        button: PointerButton,
        /// Pointer position at press time.
        position: Point,
    },
    /// A pointer button was released.
    PointerUp {
        /// The released button.
        button: PointerButton,
        /// Pointer position at release time.
        position: Point,
    },
    /// A key was pressed; routed to the keyboard focus.
    KeyDown {
        /// Host key code.
        code: u32,
    },
    /// The host asked the application to shut down.
    Quit,
}

/// A resolved event delivered to one morph's behavior.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MorphEvent {
    /// A button went down with this morph as the resolved click target.
    Down(PointerButton, Point),
    /// A button came up with this morph as the resolved click target.
    Up(PointerButton, Point),
    /// Down and up resolved to this same morph: a click.
    Click(PointerButton, Point),
    /// The pointer moved over this move-handling morph with a button held.
    Move(Point),
    /// The pointer entered this morph's full bounds.
    Enter,
    /// The pointer left this morph's full bounds.
    Leave,
    /// As [`MorphEvent::Enter`], while the primary button is held.
    EnterDragging,
    /// As [`MorphEvent::Leave`], while the primary button is held.
    LeaveDragging,
    /// A key went down while this morph held the keyboard focus.
    KeyDown(u32),
    /// This selection overlay's pending choice was cancelled.
    SelectionCancelled,
}
