// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Server tunables, populated from `QUADRA_*` environment variables in
/// `main.rs`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub db_path: PathBuf,
    pub max_body_bytes: usize,
    pub shutdown_drain_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            db_path: PathBuf::from("quadra.db"),
            max_body_bytes: 64 * 1024,
            shutdown_drain_ms: 3000,
        }
    }
}
