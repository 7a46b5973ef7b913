//! Configuration validation utilities for the triage system.
//!
//! This module provides a type-safe framework for validating the TOML
//! configuration tables handed to storage backends. Schemas distinguish
//! required from optional fields, type-check every field that is present,
//! and run custom validators for checks beyond type matching.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Represents the type of a configuration field.
///
/// Carries the field kinds the storage backends configure.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
}

/// Type alias for field validator functions.
///
/// Validators perform checks beyond type matching. They receive the TOML
/// value and return an error message if validation fails.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A field in a configuration schema: a name, a type, and an optional
/// custom validator.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}
}

/// A validation schema for a TOML table.
///
/// Required fields must be present; optional fields are checked only when
/// present.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Checks presence of required fields, the type of every present field,
	/// and any custom validators.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;

			validate_field_type(&field.name, value, &field.field_type)?;

			if let Some(validator) = &field.validator {
				validator(value).map_err(|msg| ValidationError::InvalidValue {
					field: field.name.clone(),
					message: msg,
				})?;
			}
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				validate_field_type(&field.name, value, &field.field_type)?;

				if let Some(validator) = &field.validator {
					validator(value).map_err(|msg| ValidationError::InvalidValue {
						field: field.name.clone(),
						message: msg,
					})?;
				}
			}
		}

		Ok(())
	}
}

/// Validates that a value matches the expected field type.
fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(ValidationError::TypeMismatch {
					field: field_name.to_string(),
					expected: "string".to_string(),
					actual: value.type_str().to_string(),
				});
			}
		},
	}

	Ok(())
}

/// Trait defining a configuration schema that can validate TOML values.
///
/// Storage backends implement this so the factory layer can check their
/// configuration table before use.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(
			vec![Field::new("path", FieldType::String)],
			vec![
				Field::new("label", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(s) if !s.is_empty() => Ok(()),
						_ => Err("label must not be empty".to_string()),
					}
				}),
			],
		)
	}

	fn table(input: &str) -> toml::Value {
		toml::from_str(input).unwrap()
	}

	#[test]
	fn missing_required_field_is_reported() {
		let err = schema().validate(&table(r#"label = "x""#)).unwrap_err();
		assert_eq!(err.to_string(), "Missing required field: path");
		assert!(matches!(err, ValidationError::MissingField(_)));
	}

	#[test]
	fn present_fields_are_type_checked() {
		let err = schema().validate(&table("path = 3")).unwrap_err();
		assert!(matches!(
			err,
			ValidationError::TypeMismatch { field, .. } if field == "path"
		));
	}

	#[test]
	fn optional_fields_run_their_validator() {
		let err = schema()
			.validate(&table("path = \"/tmp\"\nlabel = \"\""))
			.unwrap_err();
		assert!(matches!(
			err,
			ValidationError::InvalidValue { field, .. } if field == "label"
		));

		schema()
			.validate(&table("path = \"/tmp\"\nlabel = \"ok\""))
			.unwrap();
		// Absent optional fields pass.
		schema().validate(&table("path = \"/tmp\"")).unwrap();
	}

	#[test]
	fn non_table_config_is_rejected() {
		let err = schema()
			.validate(&toml::Value::String("nope".to_string()))
			.unwrap_err();
		assert!(matches!(
			err,
			ValidationError::TypeMismatch { field, .. } if field == "root"
		));
	}
}
