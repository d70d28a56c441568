//! Conversion entry points whose only result channel is a string.
//!
//! These never fail: callers get either a 54-character state or a message
//! starting with `Error:`.

use tracing::debug;

use crate::core::notation::{color_to_pos, to_color};

pub const ERROR_PREFIX: &str = "Error:";

/// Positional input becomes color notation, color input is returned
/// normalized, anything else yields an error string.
pub fn forward(state: &str) -> String {
    match to_color(state) {
        Ok(color) => color.to_string(),
        Err(err) => {
            debug!(err = %err, "conversion rejected input");
            format!("{ERROR_PREFIX} {err}")
        }
    }
}

/// Color input becomes positional notation.
pub fn reverse(state: &str) -> String {
    match color_to_pos(state) {
        Ok(positional) => positional.to_string(),
        Err(err) => {
            debug!(err = %err, "conversion rejected input");
            format!("{ERROR_PREFIX} {err}")
        }
    }
}

pub fn is_error(result: &str) -> bool {
    result.starts_with(ERROR_PREFIX)
}
