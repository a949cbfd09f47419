use serde_json::{Map, Number, Value};
use validator::ValidateEmail;

use crate::{
    error::{ApiError, ApiResult},
    models::{Form, FormField, FormFieldType},
};

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Bool(b) => *b,
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn field_name(field: &FormField) -> &str {
    if field.label.is_empty() {
        &field.id
    } else {
        &field.label
    }
}

fn check_value(field: &FormField, value: &Value) -> ApiResult<Value> {
    let invalid = || ApiError::BadRequest(format!("Field '{}' is invalid", field_name(field)));

    match field.field_type {
        FormFieldType::Email => {
            let email = value.as_str().ok_or_else(invalid)?.trim();
            if !email.validate_email() {
                return Err(ApiError::BadRequest(format!(
                    "Field '{}' must be a valid email address",
                    field_name(field)
                )));
            }
            Ok(Value::String(email.to_string()))
        }
        FormFieldType::Select if !field.options.is_empty() => {
            let choice = value.as_str().ok_or_else(invalid)?;
            let allowed = field.options.iter().chain(&field.options_en);
            if !allowed.into_iter().any(|option| option == choice) {
                return Err(ApiError::BadRequest(format!(
                    "Field '{}' has an unknown option",
                    field_name(field)
                )));
            }
            Ok(value.clone())
        }
        FormFieldType::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(invalid),
            _ => Err(invalid()),
        },
        FormFieldType::Checkbox => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(invalid()),
        },
        _ => match value {
            Value::String(s) => Ok(Value::String(s.trim().to_string())),
            Value::Number(_) | Value::Bool(_) => Ok(value.clone()),
            _ => Err(invalid()),
        },
    }
}

/// clean_submission
///
/// Checks a submission against the form definition and returns the accepted
/// values keyed by field id. Keys that are not fields of the form are dropped;
/// empty optional fields are left out.
pub fn clean_submission(form: &Form, payload: &Map<String, Value>) -> ApiResult<Map<String, Value>> {
    let mut cleaned = Map::new();

    for field in &form.fields {
        let value = payload.get(&field.id).filter(|v| is_filled(v));
        match value {
            None if field.required => {
                return Err(ApiError::BadRequest(format!(
                    "Field '{}' is required",
                    field_name(field)
                )));
            }
            None => {}
            Some(value) => {
                cleaned.insert(field.id.clone(), check_value(field, value)?);
            }
        }
    }

    Ok(cleaned)
}
