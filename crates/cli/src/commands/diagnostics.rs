//! Configuration report.
//!
//! Works without a database; it only inspects the environment.

use libris_admin::config::{self, Diagnostic};

use super::{CommandError, say};

/// Print which services are configured and what is missing.
pub fn run(json: bool) -> Result<(), CommandError> {
    let report = config::diagnose(&config::env_lookup);

    if json {
        say(&serde_json::to_string_pretty(&report)?);
    } else {
        for line in &report {
            say(&format_line(line));
        }
    }
    Ok(())
}

fn format_line(diagnostic: &Diagnostic) -> String {
    let status = if diagnostic.configured { "ok" } else { "--" };
    let mut line = format!(
        "[{status}] {:<16} {}",
        diagnostic.component, diagnostic.detail
    );
    if !diagnostic.missing.is_empty() {
        line.push_str(&format!(" (missing: {})", diagnostic.missing.join(", ")));
    }
    line
}
