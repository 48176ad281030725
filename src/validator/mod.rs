use serde::Serialize;

/// One client-facing problem with one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The generic error used when a value cannot even be decoded
    pub fn invalid_value(field: impl Into<String>) -> Self {
        Self::new(field, "invalid value")
    }
}

/// Collects field errors without failing fast.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.add(FieldError::new(field, message));
        }
    }

    pub fn add(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// `Ok(())` when nothing was recorded, otherwise every recorded error
    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// True when `value` equals one of `allowed` verbatim
pub fn permitted_value(value: &str, allowed: &[&str]) -> bool {
    allowed.iter().any(|candidate| *candidate == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_instead_of_failing_fast() {
        let mut v = Validator::new();
        v.check(false, "page", "must be greater than 0");
        v.check(true, "page_size", "never recorded");
        v.check(false, "sort", "must have value from list");

        let errors = v.finish().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "page");
        assert_eq!(errors[1].field, "sort");
    }

    #[test]
    fn permitted_value_is_exact() {
        let allowed = ["id", "-id"];
        assert!(permitted_value("-id", &allowed));
        assert!(!permitted_value("ID", &allowed));
        assert!(!permitted_value("id ", &allowed));
    }
}
