use validator::ValidationError;

use crate::error::{AppError, Result};

pub const TODO_TITLE_MAX: usize = 500;
pub const TEMPLATE_NAME_MAX: usize = 200;
pub const TAG_NAME_MAX: usize = 50;

/// Trims `raw` and checks it holds between 1 and `max` characters.
pub fn require_text(field: &str, raw: &str, max: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field)));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be {} characters or less",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_hex_color(color: &str) -> std::result::Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color"))
    }
}
