//! Request validation with per-field messages.

use crate::error::DashboardError;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

/// Database and group names: what sqld accepts as a namespace.
const NAME_PATTERN: &str = r"^[a-z0-9][a-z0-9-]{0,62}$";

/// Field name to messages, serialized as `{"field": ["msg", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok` when nothing was recorded.
    pub fn into_result(self) -> Result<(), DashboardError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DashboardError::Validation(self))
        }
    }

    /// Check a database or group name.
    pub fn check_name(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("The {field} field is required."));
            return;
        }
        match Regex::new(NAME_PATTERN) {
            Ok(re) if re.is_match(value) => {}
            Ok(_) => self.add(
                field,
                format!(
                    "The {field} may only contain lowercase letters, digits and dashes, \
                     and must start with a letter or digit."
                ),
            ),
            Err(e) => {
                tracing::error!(error = %e, "invalid name pattern");
                self.add(field, format!("The {field} could not be validated."));
            }
        }
    }
}
