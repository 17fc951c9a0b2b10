//! Tool domain traits
//!
//! Schema validation is pure: it runs before any network call and never
//! touches an adapter.

use super::entities::{ParamType, Params, ToolDefinition};
use super::params::PASSTHROUGH_PARAMS;
use crate::util::parse_date;

/// Validator for tool parameters
pub trait ToolValidator {
    /// Validate normalized parameters against the tool's declared schema
    fn validate(&self, params: &Params, definition: &ToolDefinition) -> Result<(), String>;
}

/// Default implementation of ToolValidator
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, params: &Params, definition: &ToolDefinition) -> Result<(), String> {
        for param in &definition.parameters {
            match params.get(&param.name) {
                None | Some(serde_json::Value::Null) if param.required => {
                    return Err(format!(
                        "Missing required parameter '{}' for tool '{}'",
                        param.name, definition.name
                    ));
                }
                Some(value) if !value.is_null() && !matches_type(value, param.param_type) => {
                    return Err(format!(
                        "Parameter '{}' for tool '{}' must be of type {}",
                        param.name,
                        definition.name,
                        param.param_type.as_str()
                    ));
                }
                _ => {}
            }
        }

        for name in params.keys() {
            if !definition.declares(name) && !PASSTHROUGH_PARAMS.contains(&name.as_str()) {
                return Err(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    name, definition.name
                ));
            }
        }

        Ok(())
    }
}

fn matches_type(value: &serde_json::Value, expected: ParamType) -> bool {
    match expected {
        ParamType::String => value.is_string(),
        ParamType::Integer => {
            value.is_i64()
                || value.is_u64()
                || value.as_str().is_some_and(|s| s.parse::<i64>().is_ok())
        }
        ParamType::Number => {
            value.is_number() || value.as_str().is_some_and(|s| s.parse::<f64>().is_ok())
        }
        ParamType::Boolean => value.is_boolean(),
        ParamType::Date => value.as_str().is_some_and(|s| parse_date(s).is_some()),
        ParamType::Array => value.is_array(),
        ParamType::Object => value.is_object(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::ToolParameter;
    use serde_json::json;

    fn definition() -> ToolDefinition {
        ToolDefinition::new("exchange_daily", "Daily bars")
            .with_parameter(ToolParameter::new("entity_code", "Entity", true))
            .with_parameter(ToolParameter::new("start_date", "Start", false).with_type(ParamType::Date))
            .with_parameter(ToolParameter::new("adjust", "Adjusted", false).with_type(ParamType::Boolean))
    }

    fn params(value: serde_json::Value) -> Params {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_validator_missing_required() {
        let result = DefaultToolValidator.validate(&params(json!({})), &definition());
        assert!(result.unwrap_err().contains("Missing required parameter"));
    }

    #[test]
    fn test_validator_wrong_type() {
        let result = DefaultToolValidator.validate(
            &params(json!({"entity_code": "X", "start_date": "yesterday"})),
            &definition(),
        );
        assert!(result.unwrap_err().contains("type date"));

        let result = DefaultToolValidator.validate(
            &params(json!({"entity_code": "X", "adjust": "yes"})),
            &definition(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validator_unknown_param() {
        let result =
            DefaultToolValidator.validate(&params(json!({"entity_code": "X", "bogus": 1})), &definition());
        assert!(result.unwrap_err().contains("Unknown parameter"));
    }

    #[test]
    fn test_validator_accepts_passthrough_and_valid_types() {
        let result = DefaultToolValidator.validate(
            &params(json!({"entity_code": "X", "start_date": "20240102", "adjust": true, "limit": 50})),
            &definition(),
        );
        assert!(result.is_ok());
    }
}
