// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const NOISY_DEFAULTS: &str =
    "h2=info,hyper=info,hyper_util=info,reqwest=info,alloy_transport_http=info,alloy_rpc_client=info";

/// Expand a bare level (e.g. "debug") with quiet defaults for HTTP internals.
/// Custom directive strings (with ',' or '=') are respected as-is.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else if normalized.is_empty() {
        format!("info,{NOISY_DEFAULTS}")
    } else {
        format!("{normalized},{NOISY_DEFAULTS}")
    }
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let filter_spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).try_init()
    };
    if installed.is_err() {
        // A global subscriber already exists (tests, embedding binaries).
        return;
    }

    let base = filter_spec
        .split(',')
        .map(str::trim)
        .find(|part| !part.is_empty())
        .unwrap_or("info");
    tracing::info!(
        "Logging initialized\n  base: {base}\n  format: {}",
        if json_format { "json" } else { "compact" }
    );
}
