// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Split a comma/whitespace separated list, dropping empty items.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse the user supplied number of swap rounds.
pub fn parse_loop_count(raw: &str) -> Result<u32, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation {
            field: "rounds".into(),
            message: "input is empty".into(),
        });
    }
    let count: u32 = trimmed.parse().map_err(|_| AppError::Validation {
        field: "rounds".into(),
        message: format!("`{trimmed}` is not a number"),
    })?;
    if count == 0 {
        return Err(AppError::Validation {
            field: "rounds".into(),
            message: "must be at least 1".into(),
        });
    }
    Ok(count)
}

/// `0x1234...abcd` style abbreviation for addresses and hashes.
pub fn short_hex(full: &str) -> String {
    if full.len() <= 10 {
        return full.to_string();
    }
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
