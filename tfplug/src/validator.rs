use crate::types::{AttributePath, Diagnostic, Dynamic};

/// Validator checks a single configured value during validation
/// Null and unknown values are filtered out before validators run
pub trait Validator: Send + Sync {
    fn description(&self) -> String;

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>);
}

fn invalid(path: &AttributePath, summary: String, detail: String) -> Diagnostic {
    Diagnostic::error(summary, detail).with_attribute(path.clone())
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        format!("string length between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if let Some(min) = self.min {
                if len < min {
                    diagnostics.push(invalid(
                        path,
                        format!("{} must have minimum length of {}", path, min),
                        format!("Got length {}", len),
                    ));
                }
            }
            if let Some(max) = self.max {
                if len > max {
                    diagnostics.push(invalid(
                        path,
                        format!("{} must have maximum length of {}", path, max),
                        format!("Got length {}", len),
                    ));
                }
            }
        }
    }
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub description: String,
}

impl StringPatternValidator {
    pub fn new(pattern: regex::Regex, description: &str) -> Self {
        Self {
            pattern,
            description: description.to_string(),
        }
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_str() {
            if !self.pattern.is_match(s) {
                diagnostics.push(invalid(
                    path,
                    format!("{} must match {}", path, self.description),
                    format!("Value '{}' does not match pattern", s),
                ));
            }
        }
    }
}

pub struct IntRangeValidator {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IntRangeValidator {
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }
}

impl Validator for IntRangeValidator {
    fn description(&self) -> String {
        format!("integer between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(n) = value.as_i64() {
            if let Some(min) = self.min {
                if n < min {
                    diagnostics.push(invalid(
                        path,
                        format!("{} must be at least {}", path, min),
                        format!("Got {}", n),
                    ));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    diagnostics.push(invalid(
                        path,
                        format!("{} must be at most {}", path, max),
                        format!("Got {}", n),
                    ));
                }
            }
        }
    }
}

/// Accepts only the listed string values
pub struct OneOfValidator {
    pub allowed: Vec<String>,
}

impl OneOfValidator {
    pub fn new(allowed: &[&str]) -> Self {
        Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Validator for OneOfValidator {
    fn description(&self) -> String {
        format!("one of {:?}", self.allowed)
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_str() {
            if !self.allowed.iter().any(|a| a == s) {
                diagnostics.push(invalid(
                    path,
                    format!("{} must be one of: {}", path, self.allowed.join(", ")),
                    format!("Got '{}'", s),
                ));
            }
        }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn description(&self) -> String {
        format!("list length between {:?} and {:?}", self.min, self.max)
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Dynamic::List(items) = value {
            if let Some(min) = self.min {
                if items.len() < min {
                    diagnostics.push(invalid(
                        path,
                        format!("{} must have at least {} items", path, min),
                        format!("Got {} items", items.len()),
                    ));
                }
            }
            if let Some(max) = self.max {
                if items.len() > max {
                    diagnostics.push(invalid(
                        path,
                        format!("{} must have at most {} items", path, max),
                        format!("Got {} items", items.len()),
                    ));
                }
            }
        }
    }
}
