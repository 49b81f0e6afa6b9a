// SPDX-License-Identifier: Apache-2.0

mod metrics;

pub use metrics::RequestMetrics;
