use crate::utils::error::{CodecError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CodecError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_single_char(field_name: &str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CodecError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be exactly one character".to_string(),
        }),
    }
}

pub fn validate_distinct_chars(field_name: &str, chars: &[char]) -> Result<()> {
    let mut seen = HashSet::new();
    for c in chars {
        if !seen.insert(c) {
            return Err(CodecError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: c.to_string(),
                reason: "Service characters must be pairwise distinct".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| CodecError::MissingConfigError {
        field: field_name.to_string(),
    })
}
