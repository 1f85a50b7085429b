//! The tiling behaviour: dragging a window edge close to existing tabs
//! docks the window into the smallest free rectangle next to them.
//!
//! The search tries the dragged window's four corners in turn. For every
//! crossing whose far quadrant is free and that sits within snapping
//! distance, the free rectangle is grown outwards along both orthogonal
//! tab lists; candidates are scored by how closely they match the dragged
//! window's size, with edges that ran off the arrangement costing a large
//! fixed error.

use crate::{
    geometry::Rect,
    group::SatGroup,
    snap::SnappingBehaviour,
    tab::{Crossing, Tab},
    types::{CornerPosition, CornerStatus, DecorRegion},
    window::SatWindow,
};
use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};
use strum::IntoEnumIterator;

/// Cost of a free-area edge that had to extend to infinity
const END_TAB_ERROR: f32 = 9_999_999.;
/// Stand-in position for an unbounded free-area edge; small enough that
/// adding snap distances to it stays exact
const BIG_POSITION: f32 = 9_999_999.;

/// Tiling strategy of one window
pub struct SatTiling {
    window: Weak<SatWindow>,

    /// The group the current candidate area was found in
    group: RefCell<Option<Rc<SatGroup>>>,
    /// Bounds of the candidate area; `None` means unbounded on that side
    free_left:   RefCell<Option<Rc<Tab>>>,
    free_right:  RefCell<Option<Rc<Tab>>>,
    free_top:    RefCell<Option<Rc<Tab>>>,
    free_bottom: RefCell<Option<Rc<Tab>>>,
}

/// One candidate rectangle during the search
#[derive(Clone)]
struct FreeArea {
    left:   Option<Rc<Tab>>,
    right:  Option<Rc<Tab>>,
    top:    Option<Rc<Tab>>,
    bottom: Option<Rc<Tab>>,
}

impl FreeArea {
    fn rect(&self) -> Rect {
        let position = |tab: &Option<Rc<Tab>>, fallback: f32| {
            tab.as_ref().map_or(fallback, |tab| tab.position())
        };
        Rect::new(
            position(&self.left, -BIG_POSITION),
            position(&self.top, -BIG_POSITION),
            position(&self.right, BIG_POSITION),
            position(&self.bottom, BIG_POSITION),
        )
    }

    /// A dockable rectangle must have room for at least two snap
    /// distances in each bounded dimension
    fn min_size_ok(&self, snap_distance: f32) -> bool {
        if let (Some(left), Some(right)) = (&self.left, &self.right) {
            if right.position() - left.position() < 2. * snap_distance {
                return false;
            }
        }
        if let (Some(top), Some(bottom)) = (&self.top, &self.bottom) {
            if bottom.position() - top.position() < 2. * snap_distance {
                return false;
            }
        }
        true
    }

    /// Squared size mismatch against the dragged frame; unbounded edges
    /// cost a large fixed error
    fn error(&self, frame: Rect) -> f32 {
        let mut error = 0.;
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => {
                error += (right.position() - left.position() - frame.width()).powi(2);
            }
            _ => error += END_TAB_ERROR,
        }
        match (&self.top, &self.bottom) {
            (Some(top), Some(bottom)) => {
                error += (bottom.position() - top.position() - frame.height()).powi(2);
            }
            _ => error += END_TAB_ERROR,
        }
        error
    }

    /// The dragged window's matching corner must actually reach into the
    /// candidate rectangle
    fn corner_in_free_area(&self, corner: CornerPosition, frame: Rect, snap: f32) -> bool {
        let free = self.rect();
        match corner {
            CornerPosition::LeftTop => {
                free.bottom - snap > frame.top && free.right - snap > frame.left
            }
            CornerPosition::RightTop => {
                free.bottom - snap > frame.top && free.left + snap < frame.right
            }
            CornerPosition::LeftBottom => {
                free.top + snap < frame.bottom && free.right - snap > frame.left
            }
            CornerPosition::RightBottom => {
                free.top + snap < frame.bottom && free.left + snap < frame.right
            }
        }
    }

    /// Does the candidate rectangle overlap any occupied area?
    fn overlaps_existing(&self, group: &Rc<SatGroup>) -> bool {
        let rect = self.rect().inset_by(1., 1.);

        for h_tab in group.horizontal_tabs() {
            if h_tab.position() >= rect.bottom {
                return false;
            }
            for crossing in h_tab.crossings() {
                if crossing.vertical_tab().position() > rect.right {
                    continue;
                }
                let corner = crossing.corner(CornerPosition::RightBottom);
                if corner.status() != CornerStatus::Used {
                    continue;
                }
                if let Some(area) = corner.window_area() {
                    if rect.intersects(area.frame()) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Score the candidate, or reject it
    fn check(
        &self,
        group: &Rc<SatGroup>,
        corner: CornerPosition,
        frame: Rect,
        snap_distance: f32,
    ) -> Option<f32> {
        if !self.min_size_ok(snap_distance) {
            return None;
        }
        if !self.corner_in_free_area(corner, frame, snap_distance) {
            return None;
        }
        let error = self.error(frame);
        if self.overlaps_existing(group) {
            return None;
        }
        Some(error)
    }
}

impl SatTiling {
    pub(crate) fn new(window: Weak<SatWindow>) -> Self {
        Self {
            window,
            group: RefCell::new(None),
            free_left: RefCell::new(None),
            free_right: RefCell::new(None),
            free_top: RefCell::new(None),
            free_bottom: RefCell::new(None),
        }
    }

    fn this(&self) -> Option<Rc<SatWindow>> {
        self.window.upgrade()
    }

    fn candidate(&self) -> FreeArea {
        FreeArea {
            left:   self.free_left.borrow().clone(),
            right:  self.free_right.borrow().clone(),
            top:    self.free_top.borrow().clone(),
            bottom: self.free_bottom.borrow().clone(),
        }
    }

    fn remember(&self, area: FreeArea) {
        *self.free_left.borrow_mut() = area.left;
        *self.free_right.borrow_mut() = area.right;
        *self.free_top.borrow_mut() = area.top;
        *self.free_bottom.borrow_mut() = area.bottom;
    }

    fn forget(&self) {
        *self.free_left.borrow_mut() = None;
        *self.free_right.borrow_mut() = None;
        *self.free_top.borrow_mut() = None;
        *self.free_bottom.borrow_mut() = None;
    }

    // =========================== Search ============================

    fn find_free_area_in_group(&self, group: &Rc<SatGroup>) -> bool {
        for corner in CornerPosition::iter() {
            if self.find_free_area_for_corner(group, corner) {
                log::trace!("tiling: free area found, corner {}", corner);
                return true;
            }
        }
        false
    }

    fn find_free_area_for_corner(&self, group: &Rc<SatGroup>, corner: CornerPosition) -> bool {
        let this = match self.this() {
            Some(this) => this,
            None => return false,
        };
        let frame = this.complete_window_frame();
        let snap_distance = this.config().global.snap_distance;

        for tab in group.vertical_tabs() {
            for crossing in tab.crossings() {
                if !Self::interesting_crossing(&crossing, corner, frame, snap_distance) {
                    continue;
                }
                if self.find_free_area(group, &crossing, corner, frame, snap_distance) {
                    return true;
                }
            }
        }
        false
    }

    /// A crossing qualifies as an anchor when the quadrant the dragged
    /// window would occupy is free, at least one neighbouring quadrant is
    /// occupied, and the dragged window's near edges are within snapping
    /// distance of the two tabs
    fn interesting_crossing(
        crossing: &Rc<Crossing>,
        corner: CornerPosition,
        frame: Rect,
        snap_distance: f32,
    ) -> bool {
        if crossing.opposite_corner(corner).status() != CornerStatus::Free {
            return false;
        }

        let h_tab_position = crossing.horizontal_tab().position();
        let v_tab_position = crossing.vertical_tab().position();
        let used = |position: CornerPosition| crossing.corner(position).status() == CornerStatus::Used;

        let (window_at_v, window_at_h, v_distance, h_distance) = match corner {
            CornerPosition::LeftTop => (
                used(CornerPosition::LeftBottom),
                used(CornerPosition::RightTop),
                v_tab_position - frame.left,
                h_tab_position - frame.top,
            ),
            CornerPosition::RightTop => (
                used(CornerPosition::RightBottom),
                used(CornerPosition::LeftTop),
                frame.right - v_tab_position,
                h_tab_position - frame.top,
            ),
            CornerPosition::LeftBottom => (
                used(CornerPosition::LeftTop),
                used(CornerPosition::RightBottom),
                v_tab_position - frame.left,
                frame.bottom - h_tab_position,
            ),
            CornerPosition::RightBottom => (
                used(CornerPosition::RightTop),
                used(CornerPosition::LeftBottom),
                frame.right - v_tab_position,
                frame.bottom - h_tab_position,
            ),
        };

        let h_valid =
            window_at_h && h_distance.abs() < snap_distance && v_distance < snap_distance;
        let v_valid =
            window_at_v && v_distance.abs() < snap_distance && h_distance < snap_distance;
        h_valid || v_valid
    }

    /// Grow the free rectangle outwards from the anchor crossing along
    /// both orthogonal tab lists, keeping the lowest-error candidate
    fn find_free_area(
        &self,
        group: &Rc<SatGroup>,
        crossing: &Rc<Crossing>,
        corner: CornerPosition,
        frame: Rect,
        snap_distance: f32,
    ) -> bool {
        let h_tabs = group.horizontal_tabs();
        let v_tabs = group.vertical_tabs();

        let h_index = match h_tabs
            .iter()
            .position(|tab| Rc::ptr_eq(tab, crossing.horizontal_tab()))
        {
            Some(index) => index as i32,
            None => return false,
        };
        let v_index = match v_tabs
            .iter()
            .position(|tab| Rc::ptr_eq(tab, crossing.vertical_tab()))
        {
            Some(index) => index as i32,
            None => return false,
        };

        // which sides are fixed to the anchor and which way the free
        // rectangle grows
        let (v_direction, h_direction): (i32, i32) = match corner {
            CornerPosition::LeftTop => (1, 1),
            CornerPosition::RightTop => (-1, 1),
            CornerPosition::LeftBottom => (1, -1),
            CornerPosition::RightBottom => (-1, -1),
        };

        let at = |tabs: &[Rc<Tab>], index: i32| -> Option<Rc<Tab>> {
            usize::try_from(index).ok().and_then(|i| tabs.get(i).cloned())
        };

        let mut best: Option<(FreeArea, f32)> = None;
        let mut stop = false;

        let mut v = v_index;
        loop {
            v += v_direction;
            let end_v = at(&v_tabs, v);

            let mut h = h_index;
            loop {
                h += h_direction;
                let end_h = at(&h_tabs, h);
                let hit_h_end = end_h.is_none();

                let candidate = match corner {
                    CornerPosition::LeftTop => FreeArea {
                        left:   Some(Rc::clone(crossing.vertical_tab())),
                        top:    Some(Rc::clone(crossing.horizontal_tab())),
                        right:  end_v.clone(),
                        bottom: end_h,
                    },
                    CornerPosition::RightTop => FreeArea {
                        right:  Some(Rc::clone(crossing.vertical_tab())),
                        top:    Some(Rc::clone(crossing.horizontal_tab())),
                        left:   end_v.clone(),
                        bottom: end_h,
                    },
                    CornerPosition::LeftBottom => FreeArea {
                        left:   Some(Rc::clone(crossing.vertical_tab())),
                        bottom: Some(Rc::clone(crossing.horizontal_tab())),
                        right:  end_v.clone(),
                        top:    end_h,
                    },
                    CornerPosition::RightBottom => FreeArea {
                        right:  Some(Rc::clone(crossing.vertical_tab())),
                        bottom: Some(Rc::clone(crossing.horizontal_tab())),
                        left:   end_v.clone(),
                        top:    end_h,
                    },
                };

                match candidate.check(group, corner, frame, snap_distance) {
                    None => {
                        if h == h_index + h_direction {
                            stop = true;
                        }
                        break;
                    }
                    Some(error) => {
                        if best.as_ref().map_or(true, |(_, best_error)| error < *best_error) {
                            best = Some((candidate, error));
                        }
                    }
                }

                if hit_h_end {
                    break;
                }
            }

            if stop || end_v.is_none() {
                break;
            }
        }

        match best {
            Some((area, _)) => {
                self.remember(area);
                true
            }
            None => false,
        }
    }

    // ========================== Highlight ==========================

    /// Highlight every window flanking the free area on its inside
    /// borders, plus the dragged window's own matching borders
    fn highlight_windows(&self, group: &Rc<SatGroup>, highlight: bool) {
        let h_tabs = group.horizontal_tabs();
        let v_tabs = group.vertical_tabs();
        let candidate = self.candidate();

        let left_found = self.search_highlight_window(
            candidate.left.clone(),
            candidate.top.clone(),
            candidate.bottom.clone(),
            &h_tabs,
            if candidate.top.is_some() {
                CornerPosition::LeftBottom
            } else {
                CornerPosition::LeftTop
            },
            DecorRegion::RightBorder,
            highlight,
        );
        let top_found = self.search_highlight_window(
            candidate.top.clone(),
            candidate.left.clone(),
            candidate.right.clone(),
            &v_tabs,
            if candidate.left.is_some() {
                CornerPosition::RightTop
            } else {
                CornerPosition::LeftTop
            },
            DecorRegion::BottomBorder,
            highlight,
        );
        let right_found = self.search_highlight_window(
            candidate.right.clone(),
            candidate.top.clone(),
            candidate.bottom.clone(),
            &h_tabs,
            if candidate.top.is_some() {
                CornerPosition::RightBottom
            } else {
                CornerPosition::RightTop
            },
            DecorRegion::LeftBorder,
            highlight,
        );
        let bottom_found = self.search_highlight_window(
            candidate.bottom,
            candidate.left.clone(),
            candidate.right,
            &v_tabs,
            if candidate.left.is_some() {
                CornerPosition::RightBottom
            } else {
                CornerPosition::LeftBottom
            },
            DecorRegion::TopBorder,
            highlight,
        );

        let this = match self.this() {
            Some(this) => this,
            None => return,
        };
        if left_found {
            this.highlight_border(DecorRegion::LeftBorder, highlight);
        }
        if top_found {
            this.highlight_border(DecorRegion::TopBorder, highlight);
        }
        if right_found {
            this.highlight_border(DecorRegion::RightBorder, highlight);
        }
        if bottom_found {
            this.highlight_border(DecorRegion::BottomBorder, highlight);
        }
    }

    /// Walk along `tab` between the two orthogonal bounds and highlight
    /// the area touching each crossing from the free side
    #[allow(clippy::too_many_arguments)]
    fn search_highlight_window(
        &self,
        tab: Option<Rc<Tab>>,
        first_orth: Option<Rc<Tab>>,
        second_orth: Option<Rc<Tab>>,
        orth_tabs: &[Rc<Tab>],
        area_corner: CornerPosition,
        region: DecorRegion,
        highlight: bool,
    ) -> bool {
        let tab = match tab {
            Some(tab) => tab,
            None => return false,
        };

        let (search_direction, start, end): (i32, Rc<Tab>, Option<Rc<Tab>>) =
            match (first_orth, second_orth) {
                (Some(first), second) => (1, first, second),
                (None, Some(second)) => (-1, second, None),
                (None, None) => return false,
            };

        let mut index = match orth_tabs.iter().position(|t| Rc::ptr_eq(t, &start)) {
            Some(index) => index as i32,
            None => return false,
        };

        let mut windows_found = false;
        while index >= 0 && (index as usize) < orth_tabs.len() {
            let orth_tab = &orth_tabs[index as usize];
            if let Some(end) = &end {
                if Rc::ptr_eq(orth_tab, end) {
                    break;
                }
            }
            if let Some(crossing) = tab.find_crossing(orth_tab) {
                if let Some(area) = crossing.corner(area_corner).window_area() {
                    if let Some(top_window) = area.top_window() {
                        top_window.highlight_border(region, highlight);
                        windows_found = true;
                    }
                }
            }
            index += search_direction;
        }
        windows_found
    }
}

impl SnappingBehaviour for SatTiling {
    fn find_snapping_candidates(&self, group: &Rc<SatGroup>) -> bool {
        self.reset_search_results();

        let this = match self.this() {
            Some(this) => this,
            None => return false,
        };
        if let Some(own) = this.group() {
            if Rc::ptr_eq(&own, group) {
                return false;
            }
        }

        if self.find_free_area_in_group(group) {
            *self.group.borrow_mut() = Some(Rc::clone(group));
            self.highlight_windows(group, true);
            return true;
        }
        false
    }

    fn join_candidates(&self) -> bool {
        let group = self.group.borrow().clone();
        let group = match group {
            Some(group) => group,
            None => return false,
        };
        let this = match self.this() {
            Some(this) => this,
            None => return false,
        };

        let joined = group
            .add_window(
                &this,
                self.free_left.borrow().clone(),
                self.free_top.borrow().clone(),
                self.free_right.borrow().clone(),
                self.free_bottom.borrow().clone(),
            )
            .is_ok();
        if !joined {
            self.reset_search_results();
            return false;
        }

        if let Some(first) = group.window_at(0) {
            first.do_group_layout();
        }
        self.reset_search_results();
        true
    }

    fn reset_search_results(&self) {
        let group = self.group.borrow_mut().take();
        if let Some(group) = group {
            self.highlight_windows(&group, false);
        }
        self.forget();
    }
}
