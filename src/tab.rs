//! Alignment tabs, their crossings, and the corners around each crossing.
//!
//! A tab is one horizontal or vertical alignment line inside a group; every
//! window edge in the group lies on some tab. Two orthogonal tabs meet in a
//! [`Crossing`], and the four quadrants around a crossing are [`Corner`]s
//! that track which window areas occupy them.
//!
//! Tabs and crossings reference each other; the cycle is broken by tabs
//! holding only weak references, with crossings deregistering themselves
//! from both tabs when they are dropped.

use crate::{
    error::{Error, Result},
    geometry::Point,
    group::SatGroup,
    area::WindowArea,
    solver::{Constraint, Operator, Variable},
    types::{CornerPosition, CornerStatus, Orientation},
};
use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    rc::{Rc, Weak},
};

/// Offset added to every tab position before it reaches the solver, so the
/// solver never sees negative coordinates. Applied and removed inside the
/// [`Tab`] accessors; nothing outside this module needs to know.
pub(crate) const MAKE_POSITIVE_OFFSET: f32 = 5_000.;

/// Two positions closer than this are the same tab position
pub(crate) const POSITION_EPSILON: f32 = 1e-4;

// ============================== Corner ==============================
// ====================================================================

/// One quadrant at a [`Crossing`]
#[derive(Debug)]
pub struct Corner {
    status:      Cell<CornerStatus>,
    window_area: RefCell<Weak<WindowArea>>,
}

impl Corner {
    fn new() -> Self {
        Self {
            status:      Cell::new(CornerStatus::NotDockable),
            window_area: RefCell::new(Weak::new()),
        }
    }

    /// Current occupancy of this corner
    pub fn status(&self) -> CornerStatus {
        self.status.get()
    }

    pub(crate) fn set_status(&self, status: CornerStatus) {
        self.status.set(status);
    }

    /// The area occupying this corner; `Some` only while the status is
    /// [`CornerStatus::Used`]
    pub fn window_area(&self) -> Option<Rc<WindowArea>> {
        self.window_area.borrow().upgrade()
    }

    pub(crate) fn set_window_area(&self, area: Weak<WindowArea>) {
        *self.window_area.borrow_mut() = area;
    }
}

// ============================= Crossing =============================
// ====================================================================

/// The intersection of one vertical and one horizontal [`Tab`]
#[derive(Debug)]
pub struct Crossing {
    vertical:     Rc<Tab>,
    horizontal:   Rc<Tab>,
    left_top:     Corner,
    right_top:    Corner,
    left_bottom:  Corner,
    right_bottom: Corner,
}

impl Crossing {
    /// The vertical tab running through this crossing
    pub fn vertical_tab(&self) -> &Rc<Tab> {
        &self.vertical
    }

    /// The horizontal tab running through this crossing
    pub fn horizontal_tab(&self) -> &Rc<Tab> {
        &self.horizontal
    }

    /// The corner in the given quadrant
    pub fn corner(&self, position: CornerPosition) -> &Corner {
        match position {
            CornerPosition::LeftTop => &self.left_top,
            CornerPosition::RightTop => &self.right_top,
            CornerPosition::LeftBottom => &self.left_bottom,
            CornerPosition::RightBottom => &self.right_bottom,
        }
    }

    /// The diagonal counterpart of the given quadrant
    pub fn opposite_corner(&self, position: CornerPosition) -> &Corner {
        self.corner(position.opposite())
    }

    /// Where the two tabs currently intersect
    pub fn position(&self) -> Point {
        Point::new(self.vertical.position(), self.horizontal.position())
    }
}

impl Drop for Crossing {
    fn drop(&mut self) {
        let this: *const Self = self;
        self.vertical.remove_crossing(this);
        self.horizontal.remove_crossing(this);
    }
}

// =============================== Tab ================================
// ====================================================================

/// One horizontal or vertical alignment line inside a group.
///
/// The position lives in a solver variable owned by the group's
/// [`LinearSpec`](crate::solver::LinearSpec); orientation never changes.
#[derive(Debug)]
pub struct Tab {
    group:       Weak<SatGroup>,
    variable:    Rc<Variable>,
    orientation: Orientation,
    crossings:   RefCell<Vec<Weak<Crossing>>>,
}

impl Tab {
    pub(crate) fn new(
        group: &Rc<SatGroup>,
        variable: Rc<Variable>,
        orientation: Orientation,
    ) -> Rc<Self> {
        Rc::new(Self {
            group: Rc::downgrade(group),
            variable,
            orientation,
            crossings: RefCell::new(Vec::new()),
        })
    }

    /// Orientation of this tab
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Position in screen coordinates
    pub fn position(&self) -> f32 {
        self.variable.value() as f32 - MAKE_POSITIVE_OFFSET
    }

    /// Move the tab; the solver sees the offset value
    pub fn set_position(&self, position: f32) {
        self.variable
            .set_value(f64::from(position + MAKE_POSITIVE_OFFSET));
    }

    pub(crate) fn variable(&self) -> &Rc<Variable> {
        &self.variable
    }

    /// Equality-join a foreign variable to this tab's position
    pub fn connect(&self, variable: &Rc<Variable>) -> Option<Rc<Constraint>> {
        let group = self.group.upgrade()?;
        Some(group.linear_spec().add_constraint(
            vec![(1., Rc::clone(&self.variable)), (-1., Rc::clone(variable))],
            Operator::Eq,
            0.,
            None,
            None,
        ))
    }

    /// Anchor the tab at `position` with a hard equality; the caller
    /// removes the returned constraint when the anchor is no longer needed
    pub(crate) fn pin(&self, position: f32) -> Option<Rc<Constraint>> {
        let group = self.group.upgrade()?;
        Some(group.linear_spec().add_constraint(
            vec![(1., Rc::clone(&self.variable))],
            Operator::Eq,
            f64::from(position + MAKE_POSITIVE_OFFSET),
            None,
            None,
        ))
    }

    /// Create the crossing between this tab and an orthogonal one.
    ///
    /// The crossing lives as long as someone references it and removes
    /// itself from both tabs afterwards.
    pub fn add_crossing(self: &Rc<Self>, other: &Rc<Tab>) -> Result<Rc<Crossing>> {
        if other.orientation() == self.orientation {
            return Err(Error::ParallelTabs);
        }

        let (vertical, horizontal) = if self.orientation == Orientation::Vertical {
            (self, other)
        } else {
            (other, self)
        };

        let crossing = Rc::new(Crossing {
            vertical:     Rc::clone(vertical),
            horizontal:   Rc::clone(horizontal),
            left_top:     Corner::new(),
            right_top:    Corner::new(),
            left_bottom:  Corner::new(),
            right_bottom: Corner::new(),
        });

        vertical
            .crossings
            .borrow_mut()
            .push(Rc::downgrade(&crossing));
        horizontal
            .crossings
            .borrow_mut()
            .push(Rc::downgrade(&crossing));

        Ok(crossing)
    }

    pub(crate) fn remove_crossing(&self, crossing: *const Crossing) {
        self.crossings
            .borrow_mut()
            .retain(|weak| weak.as_ptr() != crossing);
    }

    /// The crossing shared with `other`, if any
    pub fn find_crossing(&self, other: &Rc<Tab>) -> Option<Rc<Crossing>> {
        self.crossings()
            .into_iter()
            .find(|crossing| Rc::ptr_eq(self.crossed_tab(crossing), other))
    }

    /// The crossing whose orthogonal tab sits at `position`
    pub fn find_crossing_at(&self, position: f32) -> Option<Rc<Crossing>> {
        self.crossings().into_iter().find(|crossing| {
            (self.crossed_tab(crossing).position() - position).abs() < POSITION_EPSILON
        })
    }

    /// Live crossings this tab participates in, in insertion order
    pub fn crossings(&self) -> Vec<Rc<Crossing>> {
        self.crossings
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// The other tab of a crossing on this tab
    fn crossed_tab<'a>(&self, crossing: &'a Rc<Crossing>) -> &'a Rc<Tab> {
        match self.orientation {
            Orientation::Vertical => crossing.horizontal_tab(),
            Orientation::Horizontal => crossing.vertical_tab(),
        }
    }

    /// Ordering predicate used to sort tab lists by position
    pub(crate) fn compare(a: &Rc<Tab>, b: &Rc<Tab>) -> Ordering {
        a.position()
            .partial_cmp(&b.position())
            .unwrap_or(Ordering::Equal)
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        if let Some(group) = self.group.upgrade() {
            let orientation = self.orientation;
            let self_ptr: *const Tab = self;
            group.forget_tab(orientation, self_ptr);
            group.linear_spec().remove_variable(&self.variable);
        }
    }
}
