// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Human-readable report rendering

use std::fmt::Write;

use crate::search::SearchReport;

/// Render a report the way the CLI prints it
pub fn render_text(report: &SearchReport) -> String {
    let mut out = String::new();

    if report.internal_matches.is_empty() {
        out.push_str("Bilibili search: no results.\n");
    } else {
        out.push_str("Bilibili search results:\n");
        for record in &report.internal_matches {
            let _ = writeln!(out, "{} {} {}", record.source, record.target, record.title);
        }
    }
    out.push('\n');

    if report.external_matches.is_empty() {
        out.push_str("DogeDoge search: no results.\n");
    } else {
        out.push_str("DogeDoge search results:\n");
        for record in &report.external_matches {
            let _ = writeln!(out, "{} {}", record.source, record.target);
        }
    }

    let _ = writeln!(
        out,
        "\n{} sm numbers searched, {} related videos found.",
        report.total_sources, report.matched_targets
    );
    let _ = writeln!(out, "{} sm numbers not found.", report.unmatched.len());
    if !report.unmatched.is_empty() {
        let unmatched: Vec<&str> = report.unmatched.iter().map(|s| s.as_str()).collect();
        let _ = writeln!(out, "Not found: {}", unmatched.join(" "));
    }

    let _ = writeln!(
        out,
        "\nDone in {}s.",
        (report.elapsed_ms as f64 / 1000.0).round() as u64
    );
    out
}
