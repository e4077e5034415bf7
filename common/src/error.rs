// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field-level validation messages, keyed by payload field name.
///
/// Payload validators collect every problem they find instead of stopping at
/// the first one, so a form can highlight all offending inputs at once.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an error set holding a single message.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }

    /// Returns `Ok(())` when nothing was recorded, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_messages_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("sign_in", "Invalid time");
        errors.add("sign_in", "Required");
        errors.add("employee_id", "Unknown employee");

        assert_eq!(errors.fields()["sign_in"].len(), 2);
        assert_eq!(
            errors.to_string(),
            "employee_id: Unknown employee; sign_in: Invalid time; sign_in: Required"
        );
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn serializes_as_plain_map() {
        let errors = ValidationErrors::single("days", "Too short");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "days": ["Too short"] }));
    }
}
