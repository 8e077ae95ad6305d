//! Plain-text report printed by the command-line entry points.

use crate::result::{CommandResult, ResultDetails};

const REASON_INDENT: &str = "        ";

/// Renders `result` the way both binaries print it:
///
/// ```text
/// Result: FAILURE
///         Reason: website_id not set
/// ```
///
/// Listing and content payloads follow the summary lines.
#[must_use]
pub fn render_report(result: &CommandResult) -> String {
    let mut report = format!("Result: {}\n", result.status());
    if let Some(reason) = result.reason() {
        report.push_str(REASON_INDENT);
        report.push_str("Reason: ");
        report.push_str(reason);
        report.push('\n');
    }

    match result.details() {
        ResultDetails::None => {}
        ResultDetails::Content(content) => {
            report.push_str(content);
            if !content.is_empty() && !content.ends_with('\n') {
                report.push('\n');
            }
        }
        ResultDetails::Listing(listing) => {
            for directory in &listing.directories {
                report.push_str(&directory.path);
                report.push_str(":\n");
                for file in &directory.files {
                    report.push_str(&format!(
                        "{REASON_INDENT}{} {} {}\n",
                        file.name, file.size, file.last_modified
                    ));
                }
            }
        }
    }
    report
}
