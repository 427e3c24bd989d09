//! Field checks for request bodies. Each failure is a 422 with the offending field named.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

pub fn required<'a, T>(field: &str, v: Option<&'a T>) -> Result<&'a T, AppError>
where
    T: ?Sized,
{
    v.ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

pub fn max_chars(field: &str, v: &str, max: usize) -> Result<(), AppError> {
    if v.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn min_chars(field: &str, v: &str, min: usize) -> Result<(), AppError> {
    if v.chars().count() < min {
        return Err(AppError::Validation(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    Ok(())
}

pub fn non_negative(field: &str, n: i64) -> Result<(), AppError> {
    if n < 0 {
        return Err(AppError::Validation(format!("{} must be at least 0", field)));
    }
    Ok(())
}

pub fn positive(field: &str, n: f64) -> Result<(), AppError> {
    if !(n > 0.0) {
        return Err(AppError::Validation(format!("{} must be greater than 0", field)));
    }
    Ok(())
}

pub fn one_of(field: &str, v: &str, allowed: &[&str]) -> Result<(), AppError> {
    if !allowed.contains(&v) {
        return Err(AppError::Validation(format!(
            "{} must be one of: {:?}",
            field, allowed
        )));
    }
    Ok(())
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]{3,30}$").expect("Invalid username regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("Invalid email regex"))
}

pub fn username(v: &str) -> Result<(), AppError> {
    if !username_re().is_match(v) {
        return Err(AppError::Validation(
            "username must be 3-30 characters of letters, digits or underscore".into(),
        ));
    }
    Ok(())
}

pub fn email(v: &str) -> Result<(), AppError> {
    if !email_re().is_match(v) {
        return Err(AppError::Validation("email must be a valid email".into()));
    }
    Ok(())
}
