//! Group archival: a group serializes to tab counts, per-area tab
//! indices and window ids, and restores to an identical arrangement.

mod common;

use common::{controller, MockDesktop};
use pretty_assertions::assert_eq;
use stacktile::{
    AreaArchive, Extents, GroupArchive, Rect, SatGroup, SatReply, SatRequest, StackAndTile,
};
use std::rc::Rc;

/// Four windows arranged 2x2 around a central cross of tabs
fn build_quad(mock: &MockDesktop, sat: &StackAndTile) -> Rc<SatGroup> {
    mock.extents.set(Extents::EMPTY);
    mock.add_window(1, Rect::new(0., 0., 200., 150.));
    mock.add_window(2, Rect::new(200., 0., 400., 150.));
    mock.add_window(3, Rect::new(0., 150., 200., 300.));
    mock.add_window(4, Rect::new(200., 150., 400., 300.));
    sat.listener_registered();

    let w1 = sat.sat_window(1).unwrap();
    let w2 = sat.sat_window(2).unwrap();
    let w3 = sat.sat_window(3).unwrap();
    let w4 = sat.sat_window(4).unwrap();

    let group = w1.group().unwrap();
    let area1 = w1.area().unwrap();

    group
        .add_window(
            &w2,
            Some(area1.right_tab()),
            Some(area1.top_tab()),
            None,
            Some(area1.bottom_tab()),
        )
        .unwrap();
    let area2 = w2.area().unwrap();

    group
        .add_window(
            &w3,
            Some(area1.left_tab()),
            Some(area1.bottom_tab()),
            Some(area1.right_tab()),
            None,
        )
        .unwrap();
    let area3 = w3.area().unwrap();

    group
        .add_window(
            &w4,
            Some(area1.right_tab()),
            Some(area1.bottom_tab()),
            Some(area2.right_tab()),
            Some(area3.bottom_tab()),
        )
        .unwrap();

    group.window_at(0).unwrap().do_group_layout();
    group
}

#[test]
fn a_quad_group_round_trips_through_its_archive() {
    let mock = MockDesktop::new();
    let sat = controller(&mock);
    let group = build_quad(&mock, &sat);

    let ids: Vec<u64> = (1..=4)
        .map(|w| sat.sat_window(w).unwrap().id())
        .collect();

    let archive = group.archive();
    assert_eq!(archive.htab_count, 3);
    assert_eq!(archive.vtab_count, 3);
    assert_eq!(archive.areas.len(), 4);
    for (area, id) in archive.areas.iter().zip(&ids) {
        assert_eq!(area.windows, vec![*id]);
    }

    // restore pulls the windows into a rebuilt group
    let restored = SatGroup::restore(&archive, sat.as_ref()).unwrap();
    assert_eq!(restored.window_count(), 4);

    let w1 = sat.sat_window(1).unwrap();
    let w2 = sat.sat_window(2).unwrap();
    let w3 = sat.sat_window(3).unwrap();
    let w4 = sat.sat_window(4).unwrap();
    assert!(Rc::ptr_eq(&restored, &w1.group().unwrap()));

    // identical adjacency: the central cross is shared again
    let area1 = w1.area().unwrap();
    let area2 = w2.area().unwrap();
    let area3 = w3.area().unwrap();
    let area4 = w4.area().unwrap();
    assert!(Rc::ptr_eq(&area1.right_tab(), &area2.left_tab()));
    assert!(Rc::ptr_eq(&area1.bottom_tab(), &area3.top_tab()));
    assert!(Rc::ptr_eq(&area2.bottom_tab(), &area4.top_tab()));
    assert!(Rc::ptr_eq(&area3.right_tab(), &area4.left_tab()));
    assert!(Rc::ptr_eq(&area1.left_tab(), &area3.left_tab()));
    assert!(Rc::ptr_eq(&area2.right_tab(), &area4.right_tab()));

    // re-archiving reproduces the archive up to index renumbering
    assert_eq!(restored.archive(), archive);
}

#[test]
fn unknown_window_ids_are_skipped_silently() {
    let mock = MockDesktop::new();
    mock.add_window(1, Rect::new(0., 0., 200., 150.));
    let sat = controller(&mock);
    let known = sat.sat_window(1).unwrap().id();

    let archive = GroupArchive {
        htab_count: 2,
        vtab_count: 2,
        areas:      vec![AreaArchive {
            left_tab:   0,
            right_tab:  1,
            top_tab:    0,
            bottom_tab: 1,
            windows:    vec![0xdead_beef, known],
        }],
    };

    let restored = SatGroup::restore(&archive, sat.as_ref()).unwrap();
    assert_eq!(restored.window_count(), 1);
    assert_eq!(restored.window_at(0).unwrap().id(), known);
}

#[test]
fn out_of_range_tab_indices_are_rejected() {
    let mock = MockDesktop::new();
    let sat = controller(&mock);

    let archive = GroupArchive {
        htab_count: 1,
        vtab_count: 1,
        areas:      vec![AreaArchive {
            left_tab:   0,
            right_tab:  5,
            top_tab:    0,
            bottom_tab: 0,
            windows:    vec![],
        }],
    };
    assert!(SatGroup::restore(&archive, sat.as_ref()).is_err());
}

#[test]
fn save_all_groups_reports_every_multi_window_group() {
    let mock = MockDesktop::new();
    let sat = controller(&mock);
    build_quad(&mock, &sat);

    // a lone extra window must not be archived
    mock.add_window(9, Rect::new(800., 800., 900., 900.));
    sat.window_added(9);

    match sat.handle_message(1, &SatRequest::SaveAllGroups) {
        SatReply::Groups(groups) => {
            assert_eq!(groups.len(), 1);
            assert_eq!(groups[0].areas.len(), 4);
        }
        other => panic!("unexpected reply: {:?}", other),
    }

    // and the archive restores over the message link as well
    let archive = match sat.handle_message(1, &SatRequest::SaveAllGroups) {
        SatReply::Groups(mut groups) => groups.remove(0),
        other => panic!("unexpected reply: {:?}", other),
    };
    assert_eq!(
        sat.handle_message(1, &SatRequest::RestoreGroup { archive }),
        SatReply::Ok
    );
}
