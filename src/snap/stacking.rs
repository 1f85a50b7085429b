//! The stacking behaviour: dropping one title tab onto another merges the
//! two windows into a single area sharing a tab bar.

use crate::{
    area::WindowArea,
    snap::SnappingBehaviour,
    types::WindowLook,
    window::SatWindow,
};
use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

/// Stacking strategy of one window
pub struct SatStacking {
    window: Weak<SatWindow>,
    /// The window whose tab the drag currently hovers
    parent: RefCell<Option<Rc<SatWindow>>>,
}

impl SatStacking {
    pub(crate) fn new(window: Weak<SatWindow>) -> Self {
        Self {
            window,
            parent: RefCell::new(None),
        }
    }

    fn this(&self) -> Option<Rc<SatWindow>> {
        self.window.upgrade()
    }

    fn highlight(&self, active: bool) {
        if let Some(parent) = self.parent.borrow().as_ref() {
            parent.highlight_tab(active);
        }
        if let Some(this) = self.this() {
            this.highlight_tab(active);
        }
    }

    /// Distribute tab lengths and locations across the stacked windows
    fn adjust_window_tabs(&self) -> bool {
        let this = match self.this() {
            Some(this) => this,
            None => return false,
        };
        let area = match this.area() {
            Some(area) => area,
            None => return false,
        };
        let stacked = area.windows();
        if stacked.len() < 2 {
            return false;
        }

        let desktop = this.desktop();
        let tab_bar_length = this.complete_window_frame().width();
        let mut tab_length = tab_bar_length / stacked.len() as f32;
        let max_tab_width = this.config().global.max_tab_width;
        if tab_length > max_tab_width {
            tab_length = max_tab_width;
        }

        let mut location = 0.;
        for window in &stacked {
            window.set_stacked_tab_length(tab_length - 1.);
            desktop.set_window_tab_location(window.window(), location);
            location += tab_length;
        }
        true
    }
}

impl SnappingBehaviour for SatStacking {
    fn find_snapping_candidates(&self, group: &Rc<crate::group::SatGroup>) -> bool {
        self.reset_search_results();

        let this = match self.this() {
            Some(this) => this,
            None => return false,
        };
        let desktop = this.desktop();
        if !desktop.window_look(this.window()).supports_tabbing() {
            return false;
        }

        let grab_point = desktop.tab_rect(this.window()).left_top();
        for candidate in group.windows() {
            if Rc::ptr_eq(&candidate, &this) {
                continue;
            }
            if !desktop.window_look(candidate.window()).supports_tabbing() {
                continue;
            }
            if desktop.tab_rect(candidate.window()).contains(grab_point) {
                *self.parent.borrow_mut() = Some(candidate);
                self.highlight(true);
                return true;
            }
        }
        false
    }

    fn join_candidates(&self) -> bool {
        let parent = self.parent.borrow().clone();
        let parent = match parent {
            Some(parent) => parent,
            None => return false,
        };
        let this = match self.this() {
            Some(this) => this,
            None => return false,
        };

        let result = parent.stack_window(&this).is_ok();
        self.reset_search_results();
        result
    }

    fn reset_search_results(&self) {
        if self.parent.borrow().is_none() {
            return;
        }
        self.highlight(false);
        *self.parent.borrow_mut() = None;
    }

    fn do_group_layout(&self) {
        self.adjust_window_tabs();
    }

    fn removed_from_area(&self, area: &Rc<WindowArea>) {
        let remaining = area.windows();
        if remaining.len() == 1 {
            remaining[0].set_stacked_mode(false);
        } else if let Some(first) = remaining.first() {
            first.do_group_layout();
        }

        if let Some(this) = self.this() {
            this.desktop().separate_window_stack(this.window());
            this.set_stacked_mode(false);
        }
    }

    fn tab_location_moved(&self, location: f32, shifting: bool) {
        if !shifting {
            self.adjust_window_tabs();
            return;
        }

        let this = match self.this() {
            Some(this) => this,
            None => return,
        };
        let area = match this.area() {
            Some(area) => area,
            None => return,
        };
        let stacked = area.windows();
        let window_index = match area.index_of(&this) {
            Some(index) => index,
            None => return,
        };

        let mut tab_length =
            this.complete_window_frame().width() / stacked.len().max(1) as f32;
        let max_tab_width = this.config().global.max_tab_width;
        if tab_length > max_tab_width {
            tab_length = max_tab_width;
        }

        let old_tab_position = window_index as f32 * (tab_length + 1.);
        if (old_tab_position - location).abs() < tab_length / 2. {
            return;
        }

        let neighbour_index = if old_tab_position > location {
            match window_index.checked_sub(1) {
                Some(index) => index,
                None => return,
            }
        } else {
            window_index + 1
        };
        let neighbour = match area.window_at(neighbour_index) {
            Some(neighbour) => neighbour,
            None => return,
        };

        let new_neighbour_position = window_index as f32 * (tab_length + 1.);
        let _ = area.move_window_to_position(&this, neighbour_index);
        this.desktop()
            .set_window_tab_location(neighbour.window(), new_neighbour_position);
    }

    fn window_look_changed(&self, look: WindowLook) {
        if look.supports_tabbing() {
            return;
        }
        let this = match self.this() {
            Some(this) => this,
            None => return,
        };
        let area = match this.area() {
            Some(area) => area,
            None => return,
        };
        if area.window_count() < 2 {
            return;
        }
        // the look no longer qualifies for a shared tab bar
        if let Some(group) = this.group() {
            let _ = group.remove_window(&this, false);
        }
    }
}
