//! Request validation for credentials and item payloads.

use crate::error::AppError;
use crate::model::{Credentials, ItemFields};
use serde_json::{Map, Value};

pub const USERNAME_LEN: (usize, usize) = (3, 25);
pub const PASSWORD_LEN: (usize, usize) = (8, 30);
pub const CREDENTIALS_MESSAGE: &str =
    "Usernames must be between 3-25 char, and passwords 8-30 char";
pub const NUL_MESSAGE: &str = "must not contain NUL characters";

/// Upper bound of a NUMERIC(12,2) column.
const MAX_ITEM_VALUE: f64 = 10_000_000_000.0;

pub struct RequestValidator;

impl RequestValidator {
    /// Username 3–25 and password 8–30 characters. One fixed message for any length violation.
    pub fn credentials(body: &Value) -> Result<Credentials, AppError> {
        let obj = body
            .as_object()
            .filter(|o| !o.is_empty())
            .ok_or_else(|| AppError::Validation("Request body must not be empty".into()))?;
        let username = obj.get("username").and_then(Value::as_str);
        let password = obj.get("password").and_then(Value::as_str);
        if username.into_iter().chain(password).any(has_nul) {
            return Err(AppError::Validation(format!(
                "Username and password {}",
                NUL_MESSAGE
            )));
        }
        match (username, password) {
            (Some(u), Some(p)) if within(u, USERNAME_LEN) && within(p, PASSWORD_LEN) => {
                Ok(Credentials {
                    username: u.to_string(),
                    password: p.to_string(),
                })
            }
            _ => Err(AppError::Validation(CREDENTIALS_MESSAGE.into())),
        }
    }

    /// Validate a full item payload. Every violation is reported; unknown keys are ignored.
    pub fn item(body: &Value) -> Result<ItemFields, AppError> {
        let obj = body
            .as_object()
            .ok_or_else(|| AppError::Validation("body must be a JSON object".into()))?;
        let mut errors: Vec<String> = Vec::new();

        let item_name = match present(obj, "itemName") {
            None => {
                errors.push("\"itemName\": Required".into());
                String::new()
            }
            Some(Value::String(s)) if s.is_empty() => {
                errors.push("\"itemName\": must not be empty".into());
                String::new()
            }
            Some(Value::String(s)) if has_nul(s) => {
                errors.push(format!("\"itemName\": {}", NUL_MESSAGE));
                String::new()
            }
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                errors.push("\"itemName\": Expected string".into());
                String::new()
            }
        };

        let quantity = match present(obj, "quantity") {
            None => None,
            Some(v) => match quantity_of(v) {
                Ok(q) => Some(q),
                Err(msg) => {
                    errors.push(format!("\"quantity\": {}", msg));
                    None
                }
            },
        };

        let item_value = match present(obj, "itemValue") {
            None => None,
            Some(v) => match money_of(v) {
                Ok(m) => Some(m),
                Err(msg) => {
                    errors.push(format!("\"itemValue\": {}", msg));
                    None
                }
            },
        };

        let item_type = optional_string(obj, "itemType", &mut errors);
        let location = optional_string(obj, "location", &mut errors);

        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join("; ")));
        }
        Ok(ItemFields {
            item_name,
            quantity,
            item_type,
            item_value,
            location,
        })
    }

    /// Path ids are positive integers.
    pub fn item_id(raw: &str) -> Result<i32, AppError> {
        match raw.parse::<i32>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(AppError::Validation(
                "Must provide an itemId as parameter to the url".into(),
            )),
        }
    }
}

fn within(s: &str, (min, max): (usize, usize)) -> bool {
    let n = s.chars().count();
    n >= min && n <= max
}

/// PostgreSQL text columns cannot store U+0000.
fn has_nul(s: &str) -> bool {
    s.contains('\0')
}

/// A key that is missing or explicitly `null` is absent.
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn optional_string(obj: &Map<String, Value>, key: &str, errors: &mut Vec<String>) -> Option<String> {
    match present(obj, key) {
        None => None,
        Some(Value::String(s)) if has_nul(s) => {
            errors.push(format!("\"{}\": {}", key, NUL_MESSAGE));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(format!("\"{}\": Expected string", key));
            None
        }
    }
}

fn quantity_of(v: &Value) -> Result<i32, &'static str> {
    let n = v.as_f64().ok_or("Expected number")?;
    if n < 0.0 {
        return Err("Number must be greater than or equal to 0");
    }
    if n.fract() != 0.0 {
        return Err("Expected integer");
    }
    if n > i32::MAX as f64 {
        return Err("Number is too large");
    }
    Ok(n as i32)
}

fn money_of(v: &Value) -> Result<f64, &'static str> {
    let n = v.as_f64().ok_or("Expected number")?;
    if n.abs() >= MAX_ITEM_VALUE {
        return Err("Number is too large");
    }
    if !is_cent_multiple(n) {
        return Err("Number must be a multiple of 0.01");
    }
    Ok(n)
}

/// True when `v` is an exact multiple of 0.01 up to binary floating point error.
pub fn is_cent_multiple(v: f64) -> bool {
    if !v.is_finite() {
        return false;
    }
    let scaled = v * 100.0;
    let tolerance = scaled.abs().max(1.0) * 4.0 * f64::EPSILON;
    (scaled - scaled.round()).abs() <= tolerance
}
