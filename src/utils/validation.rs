use crate::api::error::{AppError, FieldErrors};
use serde_json::Value;
use std::path::Path;
use validator::ValidationErrors;

/// Collects field errors across a request before any mutation starts.
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: FieldErrors,
}

impl FieldChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Merges the output of a `validator::Validate` derive.
    pub fn extend(&mut self, errors: ValidationErrors) {
        for (field, messages) in field_errors(errors) {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    /// Accepts an integer given as a JSON number or a numeric string.
    pub fn integer(&mut self, field: &str, value: Option<&Value>) -> Option<i32> {
        let parsed = match value {
            None | Some(Value::Null) => {
                self.push(field, format!("The {} field is required.", field));
                return None;
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.push(field, format!("The {} field is required.", field));
                return None;
            }
            Some(Value::Number(n)) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            Some(Value::String(s)) => s.trim().parse::<i32>().ok(),
            Some(_) => None,
        };

        if parsed.is_none() {
            self.push(field, format!("The {} field must be an integer.", field));
        }
        parsed
    }

    /// Required, non-blank string.
    pub fn string(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.push(field, format!("The {} field is required.", field));
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// Flattens `validator` output into field -> messages.
pub fn field_errors(errors: ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field))
            })
            .collect();
        out.insert(field.to_string(), messages);
    }
    out
}

pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), AppError> {
    if size > max_size {
        return Err(AppError::invalid(
            "file",
            format!(
                "The file field must not be greater than {} kilobytes.",
                max_size / 1024
            ),
        ));
    }
    Ok(())
}

/// Keeps only the final path component of a client filename and replaces
/// reserved characters.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let name = Path::new(filename.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(AppError::invalid("file", "The file field must be a file."));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Stripped path components from upload name: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    Ok(sanitized)
}
