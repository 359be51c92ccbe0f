//! Input abstraction layer.
//!
//! Hosts report pointer activity as [`RawPointerEvent`]s carrying the
//! platform's button bitmask and modifier keys. The dispatcher normalizes
//! each one into a canonical [`PointerEvent`] before scanning routes, so no
//! route ever reads button or position state out-of-band.

use dg_core::Point;
use serde::{Deserialize, Serialize};

/// Which route family an event triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Down,
    Up,
    Move,
}

/// Keyboard modifiers held while the pointer event happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
}

/// Pressed pointer buttons at dispatch time.
///
/// Routes compare against an exact button state: a chord of primary and
/// secondary is `Other`, not `Primary`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Buttons {
    #[default]
    None,
    Primary,
    Secondary,
    Other,
}

impl Buttons {
    /// Bit for the primary (usually left) button in a DOM `buttons` mask.
    pub const PRIMARY_BIT: u16 = 1;
    /// Bit for the secondary (usually right) button.
    pub const SECONDARY_BIT: u16 = 2;

    /// Decode a DOM-style `buttons` bitmask.
    pub fn from_mask(mask: u16) -> Self {
        match mask {
            0 => Buttons::None,
            Self::PRIMARY_BIT => Buttons::Primary,
            Self::SECONDARY_BIT => Buttons::Secondary,
            _ => Buttons::Other,
        }
    }
}

/// A pointer event as reported by the host canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPointerEvent {
    /// Button pressed over the canvas.
    Down {
        x: f32,
        y: f32,
        /// Buttons held *after* the press.
        buttons: u16,
        modifiers: Modifiers,
    },

    /// Button released.
    Up {
        x: f32,
        y: f32,
        /// Buttons still held after the release.
        buttons: u16,
        modifiers: Modifiers,
    },

    /// Pointer moved.
    Move {
        x: f32,
        y: f32,
        buttons: u16,
        modifiers: Modifiers,
    },
}

impl RawPointerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Down { .. } => EventKind::Down,
            Self::Up { .. } => EventKind::Up,
            Self::Move { .. } => EventKind::Move,
        }
    }

    /// Canonical form consumed by the dispatcher.
    pub fn normalize(&self) -> PointerEvent {
        let (x, y, buttons, modifiers) = match *self {
            Self::Down {
                x,
                y,
                buttons,
                modifiers,
            }
            | Self::Up {
                x,
                y,
                buttons,
                modifiers,
            }
            | Self::Move {
                x,
                y,
                buttons,
                modifiers,
            } => (x, y, buttons, modifiers),
        };
        PointerEvent {
            kind: self.kind(),
            position: Point::new(x, y),
            buttons: Buttons::from_mask(buttons),
            modifiers,
        }
    }
}

/// Normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: EventKind,
    pub position: Point,
    pub buttons: Buttons,
    pub modifiers: Modifiers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn button_mask_decodes_exact_states() {
        assert_eq!(Buttons::from_mask(0), Buttons::None);
        assert_eq!(Buttons::from_mask(1), Buttons::Primary);
        assert_eq!(Buttons::from_mask(2), Buttons::Secondary);
        assert_eq!(Buttons::from_mask(3), Buttons::Other);
        assert_eq!(Buttons::from_mask(4), Buttons::Other);
    }

    #[test]
    fn normalize_carries_position_buttons_and_modifiers() {
        let raw = RawPointerEvent::Down {
            x: 12.0,
            y: 34.0,
            buttons: 2,
            modifiers: Modifiers::CTRL,
        };
        assert_eq!(
            raw.normalize(),
            PointerEvent {
                kind: EventKind::Down,
                position: Point::new(12.0, 34.0),
                buttons: Buttons::Secondary,
                modifiers: Modifiers::CTRL,
            }
        );
    }
}
