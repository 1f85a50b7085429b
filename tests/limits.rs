//! Size-limit bookkeeping: groups borrow slack from the host, and a
//! window leaving a group gets its declared limits and size back.

mod common;

use common::{assert_close, controller, MockDesktop};
use pretty_assertions::assert_eq;
use stacktile::{Rect, SatRequest, SizeLimits, WindowLook};

#[test]
fn grouped_windows_lend_the_solver_slack_and_get_their_limits_back() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 300., 200.));
    // W2 cannot change width
    mock.add_window_with(
        2,
        Rect::new(300., 0., 500., 200.),
        SizeLimits::new(200., 200., 50., 65_535.),
        WindowLook::Titled,
    );
    let sat = controller(&mock);

    let declared = mock.limits_of(2);

    // stack them over the message link
    let id = sat.sat_window(2).unwrap().id();
    sat.handle_message(1, &SatRequest::AddWindowToStack {
        window:   id,
        position: -1,
    });

    // while grouped, the host limits are relaxed so the solver has slack
    assert_eq!(mock.limits_of(2), SizeLimits::unconstrained());

    // leaving the group restores the declared limits and the original
    // width on the fixed axis
    let group = sat.sat_window(1).unwrap().group().unwrap();
    let w2 = sat.sat_window(2).unwrap();
    group.remove_window(&w2, false).unwrap();

    assert_eq!(mock.limits_of(2), declared);
    assert!((mock.frame_of(2).width() - 200.).abs() < 0.01);
}

#[test]
fn area_limits_are_the_tightest_intersection_of_member_limits() {
    let mock = MockDesktop::new();
    mock.add_window_with(
        1,
        Rect::new(0., 0., 300., 200.),
        SizeLimits::new(150., 65_535., 100., 65_535.),
        WindowLook::Titled,
    );
    mock.add_window_with(
        2,
        Rect::new(300., 0., 500., 200.),
        SizeLimits::new(250., 65_535., 50., 65_535.),
        WindowLook::Titled,
    );
    let sat = controller(&mock);

    let id = sat.sat_window(2).unwrap().id();
    sat.handle_message(1, &SatRequest::AddWindowToStack {
        window:   id,
        position: -1,
    });

    // the stacked area must satisfy the larger of the two minima, so the
    // shared rectangle grows to 250 wide (plus nothing: zero side extents)
    let w1 = sat.sat_window(1).unwrap();
    let area = w1.area().unwrap();
    assert!(area.frame().width() >= 250. - 0.01);
    assert_close(mock.frame_of(1), mock.frame_of(2));
}

#[test]
fn solo_windows_keep_their_frame_through_layout_runs() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(40., 30., 400., 300.));
    let sat = controller(&mock);

    // group bookkeeping mirrors the real frame for solo windows
    let w1 = sat.sat_window(1).unwrap();
    let _ = w1.group();
    let area = w1.area().unwrap();
    assert_eq!(area.frame(), Rect::new(40., 20., 400., 300.));

    sat.window_moved(1);
    sat.window_resized(1);
    assert_eq!(mock.frame_of(1), Rect::new(40., 30., 400., 300.));
}
