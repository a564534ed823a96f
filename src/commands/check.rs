use std::path::PathBuf;
use std::process::ExitCode;

use pagepress_lib::ensure_chrome_available;

use super::emit_error;

/// Verifies that a usable Chrome/Chromium executable can be found and prints
/// where it is.
pub fn run_check(chrome: Option<PathBuf>) -> ExitCode {
    match ensure_chrome_available(chrome.as_deref()) {
        Ok(path) => {
            let payload = serde_json::json!({
                "status": "ok",
                "chrome": path,
            });
            println!("{payload}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            emit_error(&err);
            ExitCode::from(2)
        }
    }
}
