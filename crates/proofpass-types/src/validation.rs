//! Configuration validation for pluggable implementations.
//!
//! Each storage, account or delivery implementation receives its own raw TOML
//! table. A [`Schema`] describes which fields that table must or may contain,
//! and [`ConfigSchema`] lets the implementation check it before construction.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is absent from the table.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field failed a range check or its custom validator.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field holds a value of the wrong TOML type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Expected type of a configuration field.
///
/// Arrays check every element against the inner type and tables recurse into
/// their own schema, prefixing error field names with the parent key.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// Integer with inclusive optional bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	Array(Box<FieldType>),
	Table(Schema),
}

/// Extra check run after the type check passes.
///
/// Receives the raw TOML value and returns the message to report on failure.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field of a schema.
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
	/// Creates a field without a custom validator.
	///
	/// # Arguments
	///
	/// * `name` - Key of the field in the TOML table
	/// * `field_type` - Type the value must have
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom validator returning an error message on failure.
	///
	/// The validator only runs once the type check has passed.
	///
	/// # Arguments
	///
	/// * `validator` - Closure inspecting the field value
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields of a TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a schema from its required and optional fields.
	///
	/// # Arguments
	///
	/// * `required` - Fields that must be present
	/// * `optional` - Fields checked only when present
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML table: required fields must exist, every present field
	/// must have the right type and pass its validator. Unknown keys are allowed.
	///
	/// # Arguments
	///
	/// * `config` - The TOML value to check, expected to be a table
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - `config` is not a table
	/// - A required field is missing
	/// - A field has the wrong type or is out of range
	/// - A custom validator rejects a value
	/// - A nested table fails its own schema
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
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch(field_name, "string", value));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| mismatch(field_name, "integer", value))?;

			if let Some(min_val) = min.filter(|min_val| int_val < *min_val) {
				return Err(ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: format!("Value {} is less than minimum {}", int_val, min_val),
				});
			}
			if let Some(max_val) = max.filter(|max_val| int_val > *max_val) {
				return Err(ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: format!("Value {} is greater than maximum {}", int_val, max_val),
				});
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch(field_name, "boolean", value));
			}
		},
		FieldType::Array(inner_type) => {
			let array = value
				.as_array()
				.ok_or_else(|| mismatch(field_name, "array", value))?;
			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		},
		FieldType::Table(schema) => {
			schema.validate(value).map_err(|e| match e {
				ValidationError::MissingField(f) => {
					ValidationError::MissingField(format!("{}.{}", field_name, f))
				},
				ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
					field: format!("{}.{}", field_name, field),
					message,
				},
				ValidationError::TypeMismatch {
					field,
					expected,
					actual,
				} => ValidationError::TypeMismatch {
					field: format!("{}.{}", field_name, field),
					expected,
					actual,
				},
			})?;
		},
	}

	Ok(())
}

/// Implemented by every pluggable implementation to validate its TOML table.
///
/// Factories call this before constructing the implementation so a bad table
/// is reported as a configuration error rather than a runtime failure.
pub trait ConfigSchema: Send + Sync {
	/// Checks `config` against the implementation's schema.
	///
	/// # Errors
	///
	/// Returns a [`ValidationError`] describing the first field that fails.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(input: &str) -> toml::Value {
		toml::from_str(input).unwrap()
	}

	fn retry_schema() -> Schema {
		Schema::new(
			vec![Field::new("rpc_url", FieldType::String)],
			vec![Field::new(
				"max_retries",
				FieldType::Integer {
					min: Some(0),
					max: Some(10),
				},
			)],
		)
	}

	#[test]
	fn test_accepts_valid_table() {
		let config = parse("rpc_url = \"http://localhost:8545\"\nmax_retries = 3\n");
		assert!(retry_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let config = parse("max_retries = 3\n");
		let err = retry_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(ref f) if f == "rpc_url"));
	}

	#[test]
	fn test_integer_bounds() {
		let config = parse("rpc_url = \"http://localhost:8545\"\nmax_retries = 50\n");
		let err = retry_schema().validate(&config).unwrap_err();
		assert!(err.to_string().contains("greater than maximum"));
	}

	#[test]
	fn test_type_mismatch_in_nested_table() {
		let schema = Schema::new(
			vec![Field::new(
				"implementations",
				FieldType::Table(Schema::new(
					vec![Field::new("private_key", FieldType::String)],
					vec![],
				)),
			)],
			vec![],
		);
		let config = parse("[implementations]\nprivate_key = 12\n");
		let err = schema.validate(&config).unwrap_err();
		assert_eq!(
			err.to_string(),
			"Type mismatch for field 'implementations.private_key': expected string, got integer"
		);
	}

	#[test]
	fn test_custom_validator() {
		let schema = Schema::new(
			vec![Field::new("address", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(s) if s.starts_with("0x") => Ok(()),
					_ => Err("address must start with 0x".to_string()),
				}
			})],
			vec![],
		);
		let err = schema.validate(&parse("address = \"abc\"\n")).unwrap_err();
		assert!(err.to_string().contains("must start with 0x"));
	}
}
