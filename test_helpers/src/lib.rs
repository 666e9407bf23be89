//! Test helpers shared across crates in the workspace.
//!
//! - [`env`]: serialised environment mutation with restoring guards.
//! - [`figment`]: running configuration tests inside a `figment::Jail`.
//! - [`fixtures`]: locating and staging graph documents on disk.

pub mod env;
pub mod figment;
pub mod fixtures;
