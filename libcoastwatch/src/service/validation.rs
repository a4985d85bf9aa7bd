//! Report form validation
//!
//! Runs the client-side checks a report must pass before anything is sent:
//! a known hazard type, a non-blank description within the length limit.
//! Location and session are checked separately by the submission service
//! because they fail with their own error kinds.

use crate::error::{CoastwatchError, Result};
use crate::types::{HazardType, MAX_DESCRIPTION_CHARS};

/// Message shown when a required field is blank
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all required fields.";

/// Service for validating report input
///
/// # Example
///
/// ```
/// use libcoastwatch::service::validation::{ValidationRequest, ValidationService};
///
/// let service = ValidationService::new();
/// let response = service.validate(&ValidationRequest {
///     hazard_type: Some("flood".to_string()),
///     description: "Water over the coast road".to_string(),
/// });
/// assert!(response.valid);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationService;

/// Fields of a report that can be checked without I/O
#[derive(Debug, Clone, Default)]
pub struct ValidationRequest {
    /// Catalog id or name; `None` when nothing was picked
    pub hazard_type: Option<String>,
    pub description: String,
}

/// Outcome of validating a request
#[derive(Debug, Clone)]
pub struct ValidationResponse {
    pub valid: bool,
    /// Blocking problems, in the order they were found
    pub errors: Vec<String>,
    /// Resolved catalog entry, when the hazard type was recognised
    pub hazard_type: Option<&'static HazardType>,
}

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    /// Validate every field and collect all problems
    pub fn validate(&self, request: &ValidationRequest) -> ValidationResponse {
        let mut errors = Vec::new();

        let hazard_input = request
            .hazard_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let description_blank = request.description.trim().is_empty();

        if hazard_input.is_none() || description_blank {
            errors.push(MISSING_FIELDS_MESSAGE.to_string());
        }

        let hazard_type = hazard_input.and_then(HazardType::find);
        if let (Some(input), None) = (hazard_input, hazard_type) {
            errors.push(format!(
                "Unknown hazard type '{}'. Valid types: {}",
                input,
                known_type_ids().join(", ")
            ));
        }

        let char_count = request.description.trim().chars().count();
        if char_count > MAX_DESCRIPTION_CHARS {
            errors.push(format!(
                "Description is {} characters; the limit is {}",
                char_count, MAX_DESCRIPTION_CHARS
            ));
        }

        ValidationResponse {
            valid: errors.is_empty(),
            errors,
            hazard_type,
        }
    }

    /// Validate and turn the first problem into an error
    ///
    /// # Errors
    ///
    /// Returns `CoastwatchError::InvalidInput` carrying the first message.
    pub fn check(&self, request: &ValidationRequest) -> Result<&'static HazardType> {
        let response = self.validate(request);
        match (response.errors.into_iter().next(), response.hazard_type) {
            (None, Some(hazard_type)) => Ok(hazard_type),
            (Some(first), _) => Err(CoastwatchError::InvalidInput(first)),
            (None, None) => Err(CoastwatchError::InvalidInput(
                MISSING_FIELDS_MESSAGE.to_string(),
            )),
        }
    }

    pub fn is_valid(&self, request: &ValidationRequest) -> bool {
        self.validate(request).valid
    }
}

fn known_type_ids() -> Vec<&'static str> {
    crate::types::HAZARD_TYPES.iter().map(|t| t.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(hazard_type: Option<&str>, description: &str) -> ValidationRequest {
        ValidationRequest {
            hazard_type: hazard_type.map(str::to_string),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        let service = ValidationService::new();
        let response = service.validate(&request(Some("oil_spill"), "Slick near the pier"));
        assert!(response.valid);
        assert!(response.errors.is_empty());
        assert_eq!(response.hazard_type.map(|t| t.id), Some("oil_spill"));
    }

    #[test]
    fn test_missing_description() {
        let service = ValidationService::new();
        let response = service.validate(&request(Some("flood"), ""));
        assert!(!response.valid);
        assert_eq!(response.errors, vec![MISSING_FIELDS_MESSAGE.to_string()]);
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let service = ValidationService::new();
        assert!(!service.is_valid(&request(Some("flood"), "   \n\t")));
        assert!(!service.is_valid(&request(Some("  "), "water everywhere")));
    }

    #[test]
    fn test_missing_hazard_type() {
        let service = ValidationService::new();
        let response = service.validate(&request(None, "water everywhere"));
        assert!(!response.valid);
        assert_eq!(response.errors.len(), 1);
        assert!(response.hazard_type.is_none());
    }

    #[test]
    fn test_unknown_hazard_type() {
        let service = ValidationService::new();
        let response = service.validate(&request(Some("tsunami"), "big wave"));
        assert!(!response.valid);
        assert!(response.errors[0].contains("Unknown hazard type 'tsunami'"));
        assert!(response.errors[0].contains("ocean_trash"));
    }

    #[test]
    fn test_hazard_type_by_name() {
        let service = ValidationService::new();
        let response = service.validate(&request(Some("oil spill"), "slick"));
        assert!(response.valid);
        assert_eq!(response.hazard_type.map(|t| t.id), Some("oil_spill"));
    }

    #[test]
    fn test_description_length_limit() {
        let service = ValidationService::new();
        let at_limit = "a".repeat(MAX_DESCRIPTION_CHARS);
        assert!(service.is_valid(&request(Some("flood"), &at_limit)));

        let over = "a".repeat(MAX_DESCRIPTION_CHARS + 1);
        let response = service.validate(&request(Some("flood"), &over));
        assert!(!response.valid);
        assert!(response.errors[0].contains("501 characters"));
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        let service = ValidationService::new();
        let waves = "🌊".repeat(MAX_DESCRIPTION_CHARS);
        assert!(service.is_valid(&request(Some("flood"), &waves)));
    }

    #[test]
    fn test_check_returns_first_error() {
        let service = ValidationService::new();
        let err = service.check(&request(None, "")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.to_string(),
            format!("Missing information: {}", MISSING_FIELDS_MESSAGE)
        );

        let hazard = service.check(&request(Some("flood"), "rising")).unwrap();
        assert_eq!(hazard.name, "Flood");
    }
}
