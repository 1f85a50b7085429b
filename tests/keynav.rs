//! Keyboard navigation: cycling tabs inside a stack and stepping the
//! focus between groups while the modifier is held.

mod common;

use common::{controller, hold_modifier, release_modifier, MockDesktop};
use pretty_assertions::assert_eq;
use stacktile::{KeyCode, KeyEventKind, Modifiers, Rect, SatRequest};

fn key(sat: &stacktile::StackAndTile, code: KeyCode) -> bool {
    sat.key_pressed(KeyEventKind::KeyDown, code, Modifiers::OPTION)
}

#[test]
fn tab_and_arrows_cycle_the_focused_stack() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 200., 150.));
    mock.add_window(2, Rect::new(300., 0., 500., 150.));
    mock.add_window(3, Rect::new(600., 0., 800., 150.));
    let sat = controller(&mock);

    // stack 2 and 3 onto 1
    for target in [2, 3] {
        let id = sat.sat_window(target).unwrap().id();
        sat.handle_message(1, &SatRequest::AddWindowToStack {
            window:   id,
            position: -1,
        });
    }

    mock.set_focus(1);
    hold_modifier(&sat);

    assert!(key(&sat, KeyCode::RightArrow));
    assert_eq!(*mock.focus.borrow(), Some(2));
    assert!(key(&sat, KeyCode::Tab));
    assert_eq!(*mock.focus.borrow(), Some(3));
    // wraps around
    assert!(key(&sat, KeyCode::RightArrow));
    assert_eq!(*mock.focus.borrow(), Some(1));
    // and back again
    assert!(key(&sat, KeyCode::LeftArrow));
    assert_eq!(*mock.focus.borrow(), Some(3));
    assert!(sat.key_pressed(
        KeyEventKind::KeyDown,
        KeyCode::Tab,
        Modifiers::OPTION | Modifiers::SHIFT
    ));
    assert_eq!(*mock.focus.borrow(), Some(2));

    // without the modifier the keys pass through untouched
    release_modifier(&sat);
    assert!(!key(&sat, KeyCode::RightArrow));
    assert_eq!(*mock.focus.borrow(), Some(2));
}

#[test]
fn page_keys_step_between_groups() {
    let mock = MockDesktop::new();
    // create back to front so the z-order reads G1, G2, G3
    mock.add_window(3, Rect::new(600., 0., 800., 150.));
    mock.add_window(2, Rect::new(300., 0., 500., 150.));
    mock.add_window(1, Rect::new(0., 0., 200., 150.));
    let sat = controller(&mock);

    assert_eq!(mock.z_order.borrow().as_slice(), &[1, 2, 3]);
    mock.set_focus(2);
    hold_modifier(&sat);

    // PageDown sends G2 behind and activates G3
    assert!(key(&sat, KeyCode::PageDown));
    assert_eq!(*mock.focus.borrow(), Some(3));
    assert_eq!(mock.z_order.borrow().last().copied(), Some(2));

    // PageUp then steps from G3 one group toward the back: G1
    assert!(key(&sat, KeyCode::PageUp));
    assert_eq!(*mock.focus.borrow(), Some(1));
}

#[test]
fn arrows_do_nothing_for_solo_windows() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 200., 150.));
    let sat = controller(&mock);

    mock.set_focus(1);
    hold_modifier(&sat);
    assert!(!key(&sat, KeyCode::RightArrow));
    assert_eq!(*mock.focus.borrow(), Some(1));
}
