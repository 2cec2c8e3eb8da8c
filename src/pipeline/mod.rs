//! End-to-end passes over catalog dumps
//!
//! - **primary**: pick each system's primary star from a bodies dump and
//!   collect remnant bodies
//! - **coords**: join primary-star picks onto a systems dump
//! - **gravity**: place remnant bodies at their systems' coordinates
//!
//! Every pass takes its large input as a stream of decoded objects and
//! never holds more than one of them at a time.

pub mod classify;
pub mod coords;
pub mod gravity;
pub mod primary;

pub use classify::GravKind;
pub use coords::{join_coords, load_primary_table, CoordsJoinConfig, CoordsJoinReport, PrimaryInfo, SystemStarRow};
pub use gravity::{build_gravity_sources, GravityDocument, GravityReport, GravitySource, Provenance};
pub use primary::{extract_primary, GravBodyRow, PrimaryExtract, PrimaryStarRow};
