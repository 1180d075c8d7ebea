//! Layered settings: struct defaults, then `config.toml`, then `LYRE__*`
//! environment variables.
//!
//! `Settings::load` reads them and `Settings::validate` rejects values the
//! player cannot run with.

mod load;
mod schema;

pub use schema::*;
