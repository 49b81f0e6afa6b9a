// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

pub const METRIC_SUBSYSTEM: &str = "quadra";

#[derive(Debug, Default)]
struct RouteStats {
    count_by_status: BTreeMap<u16, u64>,
    total_seconds: f64,
    total_count: u64,
}

/// Hand-rolled per-route request counters with Prometheus text exposition.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    routes: Mutex<BTreeMap<String, RouteStats>>,
}

impl RequestMetrics {
    pub fn observe_request(&self, route: &str, status: u16, elapsed: Duration) {
        let mut routes = self
            .routes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let stats = routes.entry(route.to_string()).or_default();
        *stats.count_by_status.entry(status).or_insert(0) += 1;
        stats.total_seconds += elapsed.as_secs_f64();
        stats.total_count += 1;
    }

    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let routes = self
            .routes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut body = String::new();
        body.push_str(&format!(
            "# HELP {METRIC_SUBSYSTEM}_requests_total HTTP requests by route and status\n# TYPE {METRIC_SUBSYSTEM}_requests_total counter\n"
        ));
        for (route, stats) in routes.iter() {
            for (status, count) in &stats.count_by_status {
                body.push_str(&format!(
                    "{METRIC_SUBSYSTEM}_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"
                ));
            }
        }
        body.push_str(&format!(
            "# HELP {METRIC_SUBSYSTEM}_request_duration_seconds Cumulative request latency by route\n# TYPE {METRIC_SUBSYSTEM}_request_duration_seconds summary\n"
        ));
        for (route, stats) in routes.iter() {
            body.push_str(&format!(
                "{METRIC_SUBSYSTEM}_request_duration_seconds_sum{{route=\"{route}\"}} {:.9}\n",
                stats.total_seconds
            ));
            body.push_str(&format!(
                "{METRIC_SUBSYSTEM}_request_duration_seconds_count{{route=\"{route}\"}} {}\n",
                stats.total_count
            ));
        }
        body
    }
}
