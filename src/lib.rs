//! Stack & tile core for a desktop window manager.
//!
//! Windows are combined into persistent, spatially-related groups: either
//! *stacked*, sharing one tab bar with only one body visible, or *tiled*,
//! placed edge to edge on shared alignment tabs so that moving or
//! resizing any member deforms the whole arrangement consistently. A
//! linear-constraint solver keeps every group's geometry coherent.
//!
//! The enclosing window server is a collaborator behind the
//! [`host::Desktop`] trait; this crate contains no display-protocol code.

// controller -> group -> area -> window

#![deny(
    clippy::all,
    clippy::complexity,
    clippy::correctness,
    clippy::perf,
    clippy::style,
    bad_style,
    improper_ctypes,
    macro_use_extern_crate,
    missing_abi,
    // missing_docs,
    no_mangle_generic_items,
    non_shorthand_field_patterns,
    noop_method_call,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    semicolon_in_expressions_from_macros,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    while_true
)]
#![allow(
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::float_cmp
)]
#![cfg_attr(
    any(test),
    allow(
        clippy::expect_used,
        clippy::panic,
        clippy::unwrap_used,
        clippy::wildcard_enum_match_arm,
    )
)]

pub mod area;
pub mod config;
pub mod error;
pub mod geometry;
pub mod group;
pub mod host;
pub mod manager;
pub mod messages;
pub mod snap;
pub mod solver;
pub mod tab;
pub mod types;
pub mod window;

pub use crate::{
    area::WindowArea,
    config::{Config, GlobalSettings, SatModifier},
    error::{Error, Result},
    geometry::{Extents, Point, Rect},
    group::{AreaArchive, GroupArchive, SatGroup},
    host::{Desktop, WindowLookup},
    manager::StackAndTile,
    messages::{SatMessage, SatReply, SatRequest, SatTarget},
    solver::{LinearSpec, Operator, SolveResult},
    tab::{Crossing, Tab},
    types::{
        CornerPosition, CornerStatus, DecorRegion, HighlightState, KeyCode, KeyEventKind,
        Modifiers, SizeLimits, Window, WindowFeel, WindowLook, WorkspaceMask,
    },
    window::SatWindow,
};
