// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod quadrant;
mod task;

pub use quadrant::Quadrant;
pub use task::{ParseError, Task, TaskId, TaskText, ValidationError, TEXT_MAX_LEN};

pub const CRATE_NAME: &str = "quadra-model";
