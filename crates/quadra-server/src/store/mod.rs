// SPDX-License-Identifier: Apache-2.0

mod task_store;

pub use task_store::{StoreError, TaskStore};
