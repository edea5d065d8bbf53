//! Two-server PIR answer computation.
//!
//! A [`PirClient`] turns a row index into a pair of DPF keys. Each
//! [`PirServer`] expands its key into a selection over the database and folds
//! the selected rows into one answer row. XORing the two answers (or summing
//! them and dividing out `beta` for field queries) yields the requested row.
pub mod client;
pub mod config;
pub mod error;
pub mod server;

pub use client::PirClient;
pub use config::PirParams;
pub use error::{PirError, Result};
pub use server::PirServer;

pub use dpf_half_tree_bit_lib::{BitDpfKey, FieldDpfKey, Party, PrgContext};
pub use gf128_lib::Gf128;
