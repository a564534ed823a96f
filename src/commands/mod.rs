mod check;
mod render;

pub use check::run_check;
pub use render::run_render;

use pagepress_lib::PagePressError;

/// Prints an error payload (category, message, remediation) as JSON to
/// stderr so callers can parse failures the same way as reports.
pub(crate) fn emit_error(err: &PagePressError) {
    let payload = err.to_payload();
    match serde_json::to_string(&payload) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{err}"),
    }
}
