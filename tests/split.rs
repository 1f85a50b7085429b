//! Group splitting: removing a window must leave one group per connected
//! component, and groups stranded off-screen are pulled back over an edge.

mod common;

use common::{controller, MockDesktop};
use pretty_assertions::assert_eq;
use stacktile::{Rect, SatWindow, StackAndTile};
use std::rc::Rc;

/// Tile `child` onto the right side of `parent`'s area
fn tile_right(sat: &StackAndTile, parent: u32, child: u32) {
    let parent = sat.sat_window(parent).unwrap();
    let child = sat.sat_window(child).unwrap();

    let group = parent.group().unwrap();
    let area = parent.area().unwrap();
    group
        .add_window(
            &child,
            Some(area.right_tab()),
            Some(area.top_tab()),
            None,
            Some(area.bottom_tab()),
        )
        .unwrap();
    group.window_at(0).unwrap().do_group_layout();
}

fn window(sat: &StackAndTile, id: u32) -> Rc<SatWindow> {
    sat.sat_window(id).unwrap()
}

#[test]
fn removing_the_middle_of_a_row_splits_into_two_groups() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 200., 200.));
    mock.add_window(2, Rect::new(200., 10., 400., 210.));
    mock.add_window(3, Rect::new(400., 10., 600., 210.));
    let sat = controller(&mock);

    tile_right(&sat, 1, 2);
    tile_right(&sat, 2, 3);

    let (a, b, c) = (window(&sat, 1), window(&sat, 2), window(&sat, 3));
    let group = a.group().unwrap();
    assert_eq!(group.window_count(), 3);
    assert!(Rc::ptr_eq(&group, &c.group().unwrap()));

    let frame_a = mock.frame_of(1);
    let frame_c = mock.frame_of(3);

    group.remove_window(&b, false).unwrap();

    // one group per connected component, windows conserved
    let group_a = a.group().unwrap();
    let group_c = c.group().unwrap();
    assert!(!Rc::ptr_eq(&group_a, &group_c));
    assert_eq!(group_a.window_count(), 1);
    assert_eq!(group_c.window_count(), 1);

    // both components were already on-screen, so nothing moved
    assert_eq!(mock.frame_of(1), frame_a);
    assert_eq!(mock.frame_of(3), frame_c);

    // the split is real: moving A no longer drags C along
    mock.set_frame(1, frame_a.offset_by(50., 0.));
    sat.window_moved(1);
    assert_eq!(mock.frame_of(3), frame_c);
}

#[test]
fn a_fully_connected_remainder_stays_one_group() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 200., 200.));
    mock.add_window(2, Rect::new(200., 10., 400., 210.));
    mock.add_window(3, Rect::new(400., 10., 600., 210.));
    let sat = controller(&mock);

    tile_right(&sat, 1, 2);
    tile_right(&sat, 2, 3);

    let (a, b, c) = (window(&sat, 1), window(&sat, 2), window(&sat, 3));
    let group = a.group().unwrap();

    // removing the rightmost window keeps [A|B] connected
    group.remove_window(&c, false).unwrap();

    let group_a = a.group().unwrap();
    assert_eq!(group_a.window_count(), 2);
    assert!(Rc::ptr_eq(&group_a, &b.group().unwrap()));
    assert_eq!(c.group().unwrap().window_count(), 1);
}

#[test]
fn an_off_screen_component_is_pulled_back_over_the_edge() {
    let mock = MockDesktop::new();
    // both windows entirely left of the screen
    mock.add_window(1, Rect::new(-400., 0., -300., 100.));
    mock.add_window(2, Rect::new(-300., 10., -100., 110.));
    let sat = controller(&mock);

    tile_right(&sat, 1, 2);

    let (a, b) = (window(&sat, 1), window(&sat, 2));
    let group = a.group().unwrap();
    group.remove_window(&b, false).unwrap();

    // the surviving singleton moved right by screen.left - right + margin:
    // its complete frame ended at -300, so the offset is 300 + 75
    assert_eq!(mock.frame_of(1), Rect::new(-25., 0., 75., 100.));
}

#[test]
fn hidden_windows_leave_their_group() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 200., 200.));
    mock.add_window(2, Rect::new(200., 10., 400., 210.));
    let sat = controller(&mock);

    tile_right(&sat, 1, 2);
    assert_eq!(window(&sat, 1).group().unwrap().window_count(), 2);

    mock.windows.borrow_mut().get_mut(&2).unwrap().hidden = true;
    sat.window_hidden(2, false);

    assert_eq!(window(&sat, 1).group().unwrap().window_count(), 1);
    assert!(!Rc::ptr_eq(
        &window(&sat, 1).group().unwrap(),
        &window(&sat, 2).group().unwrap()
    ));
}
