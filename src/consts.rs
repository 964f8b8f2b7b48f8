//! Project-wide constants.

use std::path::PathBuf;

/// The hosted model every request is sent to. Fast and cheap; not
/// user-configurable.
pub const MODEL: &str = "gemini-1.5-flash";

/// Name of the API key, both in the secret store and as the
/// environment variable fallback.
pub const API_KEY_NAME: &str = "GOOGLE_API_KEY";

/// Shown when the trigger fires with nothing typed.
pub const EMPTY_PROMPT_MSG: &str = "Please enter a prompt first!";

/// Printed above the response text.
pub const ANSWER_LABEL: &str = "Here is the response:";

/// Spinner caption while a request is in flight.
pub const PENDING_CAPTION: &str = "Thinking...";

/// Default database path: `~/.pythia/pythia.db`.
/// Holds the secret store.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .expect("cannot determine home directory")
        .join(".pythia")
        .join("pythia.db")
}

/// Format a number with comma separators (e.g. 1,234,567).
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
