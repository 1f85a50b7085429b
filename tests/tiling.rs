//! Tiling: dragging a window edge near another group's tabs docks it
//! into the free rectangle next to them, and the shared tabs keep the
//! arrangement aligned through later moves and resizes.

mod common;

use common::{assert_close, begin_drag, controller, end_drag, MockDesktop};
use pretty_assertions::assert_eq;
use stacktile::{CornerPosition, CornerStatus, DecorRegion, HighlightState, Rect};
use std::rc::Rc;

#[test]
fn dragging_an_edge_within_snap_distance_tiles_to_the_right() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 300., 200.));
    mock.add_window(2, Rect::new(310., 5., 500., 210.));
    let sat = controller(&mock);

    begin_drag(&sat, &mock, 2);

    // drag W2 left until its left edge is 5 px from W1's right edge
    mock.set_frame(2, Rect::new(305., 5., 495., 210.));
    sat.window_moved(2);

    // the flanking window and the dragged window highlight facing borders
    assert_eq!(
        mock.highlight_of(1, DecorRegion::RightBorder),
        HighlightState::StackAndTile
    );
    assert_eq!(
        mock.highlight_of(2, DecorRegion::LeftBorder),
        HighlightState::StackAndTile
    );

    end_drag(&sat, 2);

    let w1 = sat.sat_window(1).unwrap();
    let w2 = sat.sat_window(2).unwrap();

    let group = w1.group().unwrap();
    assert!(Rc::ptr_eq(&group, &w2.group().unwrap()));

    let area1 = w1.area().unwrap();
    let area2 = w2.area().unwrap();
    assert!(!Rc::ptr_eq(&area1, &area2));

    // one shared vertical tab, shared top and bottom tabs
    assert!(Rc::ptr_eq(&area1.right_tab(), &area2.left_tab()));
    assert!(Rc::ptr_eq(&area1.top_tab(), &area2.top_tab()));
    assert!(Rc::ptr_eq(&area1.bottom_tab(), &area2.bottom_tab()));

    // W2 snapped onto W1's right edge, keeping its own width
    assert_close(mock.frame_of(1), Rect::new(0., 0., 300., 200.));
    assert_close(mock.frame_of(2), Rect::new(300., 0., 490., 200.));

    // the highlights were cleared on commit
    assert_eq!(
        mock.highlight_of(1, DecorRegion::RightBorder),
        HighlightState::Clear
    );

    // growing W1 to the right pushes W2 along, widths preserved
    mock.set_frame(1, Rect::new(0., 0., 350., 200.));
    sat.window_resized(1);
    assert_close(mock.frame_of(2), Rect::new(350., 0., 540., 200.));

    // the used corners point back at their areas
    for (area, inner) in [
        (&area1, CornerPosition::RightBottom),
        (&area2, CornerPosition::RightBottom),
    ] {
        let crossing = area.left_top_crossing();
        let corner = crossing.corner(inner);
        assert_eq!(corner.status(), CornerStatus::Used);
        assert!(Rc::ptr_eq(&corner.window_area().unwrap(), area));
    }
}

#[test]
fn edges_beyond_the_snap_distance_do_not_tile() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 300., 200.));
    mock.add_window(2, Rect::new(310., 5., 500., 210.));
    let sat = controller(&mock);

    begin_drag(&sat, &mock, 2);

    // 20 px away: short of nothing
    mock.set_frame(2, Rect::new(320., 5., 510., 210.));
    sat.window_moved(2);
    end_drag(&sat, 2);

    let w1 = sat.sat_window(1).unwrap();
    let w2 = sat.sat_window(2).unwrap();
    assert!(!Rc::ptr_eq(&w1.group().unwrap(), &w2.group().unwrap()));
    assert_close(mock.frame_of(2), Rect::new(320., 5., 510., 210.));
}

#[test]
fn releasing_the_modifier_mid_drag_cancels_the_candidate() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 300., 200.));
    mock.add_window(2, Rect::new(310., 5., 500., 210.));
    let sat = controller(&mock);

    begin_drag(&sat, &mock, 2);
    mock.set_frame(2, Rect::new(305., 5., 495., 210.));
    sat.window_moved(2);
    assert_eq!(
        mock.highlight_of(1, DecorRegion::RightBorder),
        HighlightState::StackAndTile
    );

    // losing the window cancels the gesture outright
    mock.remove_window(2);
    sat.window_removed(2);

    assert!(sat.sat_window(2).is_none());
    let w1 = sat.sat_window(1).unwrap();
    assert_eq!(w1.group().unwrap().window_count(), 1);
    assert_eq!(
        mock.highlight_of(1, DecorRegion::RightBorder),
        HighlightState::Clear
    );
}

#[test]
fn a_solo_group_layout_leaves_the_frame_alone() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(40., 30., 400., 300.));
    let sat = controller(&mock);

    sat.window_moved(1);
    sat.window_resized(1);
    assert_eq!(mock.frame_of(1), Rect::new(40., 30., 400., 300.));
}
