//! Lane editing for OSM roads.
//!
//! Decodes a way's `lanes` / `turn:lanes` tags into a per-lane model, lets that
//! model be edited inside an [`session::EditSession`], and encodes it back into
//! tags ready for validation and a changeset. [`geometry`] and [`layout`] place
//! every lane as its own offset polyline with an icon chosen by [`glyph`].

pub mod codec;
pub mod config;
pub mod data;
pub mod errors;
pub mod etl;
pub mod geometry;
pub mod glyph;
pub mod layout;
pub mod osm_xml;
pub mod overpass;
pub mod session;
pub mod validate;

pub use config::UserConfig;
