//! Data validation rules attached to worksheet ranges.

use serde::{Deserialize, Serialize};

/// A data validation rule, keyed by the range(s) it governs.
///
/// Serialized as a `<dataValidation>` element after `<sheetData>`:
///
/// ```xml
/// <dataValidation type="list" allowBlank="1" sqref="A1:A100"
///     showErrorMessage="1" errorTitle="Error" error="Invalid value">
///   <formula1>"Option1,Option2"</formula1>
/// </dataValidation>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValidation {
    /// Space-separated target ranges (`"A1:A100"` or `"A1 B2:B5"`).
    pub sqref: String,
    pub vtype: ValidationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<ValidationOperator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula2: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_blank: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_input_message: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_error_message: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validation type from the `type` attribute.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValidationType {
    #[default]
    None,
    Whole,
    Decimal,
    List,
    Date,
    Time,
    TextLength,
    Custom,
}

impl ValidationType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Whole => "whole",
            Self::Decimal => "decimal",
            Self::List => "list",
            Self::Date => "date",
            Self::Time => "time",
            Self::TextLength => "textLength",
            Self::Custom => "custom",
        }
    }

    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "whole" => Self::Whole,
            "decimal" => Self::Decimal,
            "list" => Self::List,
            "date" => Self::Date,
            "time" => Self::Time,
            "textLength" => Self::TextLength,
            "custom" => Self::Custom,
            _ => Self::None,
        }
    }
}

/// Comparison operator from the `operator` attribute.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValidationOperator {
    Between,
    NotBetween,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ValidationOperator {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Between => "between",
            Self::NotBetween => "notBetween",
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::LessThan => "lessThan",
            Self::LessThanOrEqual => "lessThanOrEqual",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanOrEqual => "greaterThanOrEqual",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "between" => Some(Self::Between),
            "notBetween" => Some(Self::NotBetween),
            "equal" => Some(Self::Equal),
            "notEqual" => Some(Self::NotEqual),
            "lessThan" => Some(Self::LessThan),
            "lessThanOrEqual" => Some(Self::LessThanOrEqual),
            "greaterThan" => Some(Self::GreaterThan),
            "greaterThanOrEqual" => Some(Self::GreaterThanOrEqual),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_type_roundtrip() {
        for t in [
            ValidationType::Whole,
            ValidationType::Decimal,
            ValidationType::List,
            ValidationType::Date,
            ValidationType::Time,
            ValidationType::TextLength,
            ValidationType::Custom,
        ] {
            assert_eq!(ValidationType::parse(t.as_str()), t);
        }
        assert_eq!(ValidationType::parse("bogus"), ValidationType::None);
    }

    #[test]
    fn test_validation_operator_roundtrip() {
        for op in [
            ValidationOperator::Between,
            ValidationOperator::NotBetween,
            ValidationOperator::Equal,
            ValidationOperator::NotEqual,
            ValidationOperator::LessThan,
            ValidationOperator::LessThanOrEqual,
            ValidationOperator::GreaterThan,
            ValidationOperator::GreaterThanOrEqual,
        ] {
            assert_eq!(ValidationOperator::parse(op.as_str()), Some(op));
        }
        assert_eq!(ValidationOperator::parse(""), None);
    }
}
