#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Presentation for ZIP code views.
//!
//! Turns a [`zip_map_session::ViewState`] into things a front end can show:
//! formatted numbers ([`format`]), plain-text cards ([`cards`]), a GeoJSON
//! map overlay ([`overlay`]), and the trivia rotated while insights load
//! ([`facts`]).

pub mod cards;
pub mod facts;
pub mod format;
pub mod overlay;

pub use cards::view_cards;
pub use overlay::map_overlay;
