//! Base types used throughout [`stacktile`](crate)

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
};
use strum::EnumIter;

/// Handle to a top-level window owned by the host window server
pub type Window = u32;

/// Bit mask of the workspaces a window lives on
pub type WorkspaceMask = u32;

/// The solver never sees coordinates above this, so size limits are
/// clamped here before they become constraints
pub(crate) const MAX_SOLVER_SIZE: f32 = 65_535.;

// =========================== Orientation ============================
// ====================================================================

/// Orientation of an alignment tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    /// A tab all windows above/below align on
    Horizontal,
    /// A tab all windows left/right align on
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================= Corners ==============================
// ====================================================================

/// One of the four quadrants around a [`Crossing`](crate::tab::Crossing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter)]
pub enum CornerPosition {
    /// The quadrant left of and above the crossing
    LeftTop,
    /// The quadrant right of and above the crossing
    RightTop,
    /// The quadrant left of and below the crossing
    LeftBottom,
    /// The quadrant right of and below the crossing
    RightBottom,
}

impl CornerPosition {
    /// The diagonal counterpart of this quadrant
    pub const fn opposite(self) -> Self {
        match self {
            Self::LeftTop => Self::RightBottom,
            Self::RightTop => Self::LeftBottom,
            Self::LeftBottom => Self::RightTop,
            Self::RightBottom => Self::LeftTop,
        }
    }
}

impl fmt::Display for CornerPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Occupancy of a corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CornerStatus {
    /// A window area can dock here
    Free,
    /// A window area occupies this quadrant
    Used,
    /// Advisory label for quadrants without an opposing occupied corner
    NotDockable,
}

// ========================== Look and feel ===========================
// ====================================================================

/// Decoration style of a window, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowLook {
    /// No decoration at all
    NoBorder,
    /// Border only, no tab
    Bordered,
    /// Normal tab and border
    Titled,
    /// Tab, border and resize knob
    Document,
    /// Modal decoration
    Modal,
    /// Floating palette decoration
    Floating,
}

impl WindowLook {
    /// Only looks with a full tab can take part in stacking
    pub const fn supports_tabbing(self) -> bool {
        matches!(self, Self::Titled | Self::Document)
    }
}

/// Behavioural class of a window, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFeel {
    /// An ordinary window
    Normal,
    /// A modal window; never grouped
    Modal,
    /// A floating window; never grouped
    Floating,
}

// ========================== Decorator hooks =========================
// ====================================================================

/// Named decorator region a highlight can be applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecorRegion {
    /// The tab with the window title
    Tab,
    /// The close button inside the tab
    CloseButton,
    /// The zoom button inside the tab
    ZoomButton,
    /// The left border
    LeftBorder,
    /// The top border
    TopBorder,
    /// The right border
    RightBorder,
    /// The bottom border
    BottomBorder,
    /// The top-left corner piece
    LeftTopCorner,
    /// The top-right corner piece
    RightTopCorner,
    /// The bottom-left corner piece
    LeftBottomCorner,
    /// The bottom-right corner piece
    RightBottomCorner,
    /// The resize knob of document windows
    ResizeKnob,
}

/// Highlight state a decorator region can be put into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HighlightState {
    /// No highlight
    Clear,
    /// The stack-and-tile snap highlight
    StackAndTile,
}

// ============================ Size limits ===========================
// ====================================================================

/// Min/max extent of a window as declared by its client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeLimits {
    /// Smallest allowed width
    pub min_width:  f32,
    /// Largest allowed width
    pub max_width:  f32,
    /// Smallest allowed height
    pub min_height: f32,
    /// Largest allowed height
    pub max_height: f32,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min_width:  0.,
            max_width:  MAX_SOLVER_SIZE,
            min_height: 0.,
            max_height: MAX_SOLVER_SIZE,
        }
    }
}

impl SizeLimits {
    /// Create a new [`SizeLimits`]
    pub const fn new(min_width: f32, max_width: f32, min_height: f32, max_height: f32) -> Self {
        Self {
            min_width,
            max_width,
            min_height,
            max_height,
        }
    }

    /// Limits that give the solver all the slack it can take
    pub const fn unconstrained() -> Self {
        Self::new(0., MAX_SOLVER_SIZE, 0., MAX_SOLVER_SIZE)
    }

    /// The window cannot change width
    pub fn is_h_fixed(&self) -> bool {
        self.min_width >= self.max_width
    }

    /// The window cannot change height
    pub fn is_v_fixed(&self) -> bool {
        self.min_height >= self.max_height
    }
}

// ============================== Input ===============================
// ====================================================================

bitflags! {
    /// Modifier keys held during an input event
    pub struct Modifiers: u32 {
        /// Either shift key
        const SHIFT   = 1 << 0;
        /// Either command key
        const COMMAND = 1 << 1;
        /// Either control key
        const CONTROL = 1 << 2;
        /// Either option key
        const OPTION  = 1 << 6;
        /// The menu key
        const MENU    = 1 << 7;
    }
}

/// Kind of keyboard event handed to the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    /// A mapped key went down
    KeyDown,
    /// An unmapped key went down
    UnmappedKeyDown,
    /// The modifier set changed
    ModifiersChanged,
}

/// Key of interest to the group navigation shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// The tab key
    Tab,
    /// The left arrow key
    LeftArrow,
    /// The right arrow key
    RightArrow,
    /// The up arrow key
    UpArrow,
    /// The down arrow key
    DownArrow,
    /// The page-up key
    PageUp,
    /// The page-down key
    PageDown,
    /// Anything else, by host key code
    Other(u32),
}

// ============================ Window ids ============================
// ====================================================================

/// Noise source for the low half of window ids
static ID_NOISE: AtomicU64 = AtomicU64::new(0);

/// Produce a stable 64-bit window id: the real-time clock xored with a
/// pseudo-random low half, so ids survive re-ordering and stay unique
/// within a session
pub(crate) fn generate_window_id() -> u64 {
    let clock = chrono::Utc::now().timestamp_millis() as u64;

    let mut noise = ID_NOISE.load(AtomicOrdering::Relaxed);
    if noise == 0 {
        noise = clock | 1;
    }
    // xorshift64
    noise ^= noise << 13;
    noise ^= noise >> 7;
    noise ^= noise << 17;
    ID_NOISE.store(noise, AtomicOrdering::Relaxed);

    clock ^ (noise & 0xffff_ffff)
}

#[cfg(test)]
mod tests {
    use super::{generate_window_id, CornerPosition, SizeLimits, WindowLook};
    use strum::IntoEnumIterator;

    #[test]
    fn corner_opposites_are_diagonal() {
        for position in CornerPosition::iter() {
            assert_ne!(position, position.opposite());
            assert_eq!(position, position.opposite().opposite());
        }
    }

    #[test]
    fn only_tabbed_looks_stack() {
        assert!(WindowLook::Titled.supports_tabbing());
        assert!(WindowLook::Document.supports_tabbing());
        assert!(!WindowLook::Bordered.supports_tabbing());
        assert!(!WindowLook::Modal.supports_tabbing());
    }

    #[test]
    fn window_ids_differ() {
        let a = generate_window_id();
        let b = generate_window_id();
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_axis_detection() {
        let limits = SizeLimits::new(200., 200., 100., 500.);
        assert!(limits.is_h_fixed());
        assert!(!limits.is_v_fixed());
    }
}
