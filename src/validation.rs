//! Validation constraints attached to a field.
//!
//! A constraint expression such as `required,min=1,max=10` is split into
//! keyword/operand pairs. Numeric accessors return `None` for
//! "unconstrained", both when the keyword is absent and when its operand
//! does not parse as a number.

use log::warn;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    constraints: BTreeMap<String, String>,
}

impl Validation {
    pub fn parse(expression: &str) -> Self {
        let mut constraints = BTreeMap::new();

        for part in expression.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once('=') {
                Some((keyword, operand)) => {
                    constraints.insert(keyword.trim().to_string(), operand.trim().to_string())
                }
                None => constraints.insert(part.to_string(), String::new()),
            };
        }

        Self { constraints }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn is_required(&self) -> bool {
        self.constraints.contains_key("required")
    }

    /// Raw `eq` operand.
    pub fn equals(&self) -> Option<&str> {
        self.constraints.get("eq").map(String::as_str)
    }

    pub fn length(&self) -> Option<f64> {
        self.number("len")
    }

    /// `min`, falling back to `gte`.
    pub fn min(&self) -> Option<f64> {
        self.number("min").or_else(|| self.number("gte"))
    }

    /// `max`, falling back to `lte`.
    pub fn max(&self) -> Option<f64> {
        self.number("max").or_else(|| self.number("lte"))
    }

    pub fn greater_than(&self) -> Option<f64> {
        self.number("gt")
    }

    pub fn less_than(&self) -> Option<f64> {
        self.number("lt")
    }

    fn number(&self, keyword: &str) -> Option<f64> {
        let operand = self.constraints.get(keyword)?;
        match operand.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(
                    "Ignoring non-numeric validation operand {}={}",
                    keyword, operand
                );
                None
            }
        }
    }
}
