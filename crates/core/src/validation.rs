//! Structured, per-field validation errors.
//!
//! Each violation is rendered at the HTTP boundary as `{loc, msg, type}` so
//! clients can tell exactly which input field was rejected and why.

use serde::Serialize;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Location of the field, e.g. `["body", "username"]`.
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldViolation {
    fn body(field: &str, msg: impl Into<String>, kind: &str) -> Self {
        Self {
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }

    /// The field was absent from the request.
    pub fn required(field: &str) -> Self {
        Self::body(field, "field required", "missing")
    }

    /// The field was present but shorter than `min` characters.
    pub fn too_short(field: &str, min: usize) -> Self {
        let unit = if min == 1 { "character" } else { "characters" };
        Self::body(
            field,
            format!("ensure this value has at least {min} {unit}"),
            "string_too_short",
        )
    }

    pub fn too_long(field: &str, max: usize) -> Self {
        Self::body(
            field,
            format!("ensure this value has at most {max} characters"),
            "string_too_long",
        )
    }

    pub fn less_than(field: &str, min: f64) -> Self {
        Self::body(
            field,
            format!("ensure this value is greater than or equal to {min}"),
            "greater_than_equal",
        )
    }

    pub fn greater_than(field: &str, max: f64) -> Self {
        Self::body(
            field,
            format!("ensure this value is less than or equal to {max}"),
            "less_than_equal",
        )
    }

    pub fn invalid(field: &str, msg: impl Into<String>) -> Self {
        Self::body(field, msg, "value_error")
    }
}

/// A non-empty list of field violations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(violation: FieldViolation) -> Self {
        Self(vec![violation])
    }

    pub fn push(&mut self, violation: FieldViolation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// `Ok(())` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for v in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", v.loc.join("."), v.msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<FieldViolation> for ValidationErrors {
    fn from(value: FieldViolation) -> Self {
        Self::single(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_serializes_with_type_key() {
        let json = serde_json::to_value(ValidationErrors::single(FieldViolation::required("username")))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "loc": ["body", "username"],
                "msg": "field required",
                "type": "missing",
            }])
        );
    }

    #[test]
    fn too_short_message_is_singular_for_one() {
        let v = FieldViolation::too_short("password", 1);
        assert_eq!(v.msg, "ensure this value has at least 1 character");
        assert_eq!(v.kind, "string_too_short");
    }

    #[test]
    fn empty_collection_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errs = ValidationErrors::new();
        errs.push(FieldViolation::invalid("email", "value is not a valid email address"));
        let err = errs.into_result().unwrap_err();
        assert_eq!(err.to_string(), "body.email: value is not a valid email address");
    }
}
