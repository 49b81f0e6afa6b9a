// SPDX-License-Identifier: Apache-2.0

//! Pure ordering and quadrant derivation for the task board.
//!
//! Everything in this crate is a data transform over the flat task
//! collection: no I/O, no clock reads (completion time is an argument).
//! Persistence and the wire protocol live in the server and CLI crates;
//! both call through these transforms so the `order` density invariant has
//! a single authority.

#![forbid(unsafe_code)]

mod board;
mod ops;

pub use board::Board;
pub use ops::{
    append, check_density, complete, move_to, remove, reorder, restore, DensityError, EngineError,
    OrderChange,
};

pub const CRATE_NAME: &str = "quadra-engine";

#[cfg(test)]
mod engine_tests;
