//! Structured query predicates and fetch hints.
//!
//! Finders accept a fixed set of [`Filter`]s over a compile-checked field
//! vocabulary instead of deriving predicates from method names. Multiple
//! filters always combine with logical AND.

use serde::Serialize;

use super::error::DomainError;

/// Comparison operator supported by structured predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// Field equals the value
    Eq,
    /// Field is strictly greater than the value
    Gt,
    /// Field is one of the listed values
    In,
}

/// A value bound to a predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Int(i32),
    TextList(Vec<String>),
}

/// A single field predicate: field, operator, bound value
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<F> {
    pub field: F,
    pub op: CompareOp,
    pub value: FilterValue,
}

impl<F> Filter<F> {
    pub fn eq(field: F, value: impl Into<FilterValue>) -> Self {
        Self {
            field,
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    pub fn gt(field: F, value: impl Into<FilterValue>) -> Self {
        Self {
            field,
            op: CompareOp::Gt,
            value: value.into(),
        }
    }

    pub fn any_of(field: F, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            field,
            op: CompareOp::In,
            value: FilterValue::TextList(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Check that the operator and bound value form a supported pairing:
    /// `Eq` takes a text or integer value, `Gt` an integer, `In` a text
    /// list. The typed constructors only build supported pairings; this
    /// guards filters assembled field by field.
    pub fn check(&self) -> Result<(), DomainError> {
        match (self.op, &self.value) {
            (CompareOp::Eq, FilterValue::Text(_) | FilterValue::Int(_))
            | (CompareOp::Gt, FilterValue::Int(_))
            | (CompareOp::In, FilterValue::TextList(_)) => Ok(()),
            (op, value) => Err(DomainError::validation(format!(
                "Operator {:?} does not support value {:?}",
                op, value
            ))),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

/// How a finder should fetch its results.
///
/// These are performance hints layered on a normal fetch, not separate code
/// paths: `EagerParent` loads the referenced parent in the same round trip,
/// `ReadOnly` tells the store the caller will not write the results back.
/// Mutating a `ReadOnly` result is harmless; nothing is persisted without an
/// explicit save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    #[default]
    Default,
    EagerParent,
    ReadOnly,
}

/// Pessimistic lock strength for locking finders.
///
/// The lock is held by the caller's transaction until it commits or rolls
/// back; keep such transactions short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Shared read lock (`FOR SHARE`)
    Shared,
    /// Exclusive write lock (`FOR UPDATE`)
    Exclusive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestField {
        Name,
        Age,
    }

    #[test]
    fn test_eq_filter() {
        let filter = Filter::eq(TestField::Name, "AAA");

        assert_eq!(filter.op, CompareOp::Eq);
        assert_eq!(filter.value, FilterValue::Text("AAA".to_string()));
    }

    #[test]
    fn test_gt_filter() {
        let filter = Filter::gt(TestField::Age, 15);

        assert_eq!(filter.op, CompareOp::Gt);
        assert_eq!(filter.value, FilterValue::Int(15));
    }

    #[test]
    fn test_any_of_filter() {
        let filter = Filter::any_of(TestField::Name, ["AAA", "BBB"]);

        assert_eq!(filter.op, CompareOp::In);
        assert_eq!(
            filter.value,
            FilterValue::TextList(vec!["AAA".to_string(), "BBB".to_string()])
        );
    }

    #[test]
    fn test_check_accepts_constructed_filters() {
        assert!(Filter::eq(TestField::Name, "AAA").check().is_ok());
        assert!(Filter::eq(TestField::Age, 10).check().is_ok());
        assert!(Filter::gt(TestField::Age, 15).check().is_ok());
        assert!(Filter::any_of(TestField::Name, ["AAA"]).check().is_ok());
    }

    #[test]
    fn test_check_rejects_mismatched_pairings() {
        let gt_text = Filter {
            field: TestField::Name,
            op: CompareOp::Gt,
            value: FilterValue::Text("AAA".to_string()),
        };
        assert!(matches!(
            gt_text.check(),
            Err(DomainError::Validation { .. })
        ));

        let eq_list = Filter {
            field: TestField::Name,
            op: CompareOp::Eq,
            value: FilterValue::TextList(vec!["AAA".to_string()]),
        };
        assert!(eq_list.check().is_err());
    }

    #[test]
    fn test_default_fetch_strategy() {
        assert_eq!(FetchStrategy::default(), FetchStrategy::Default);
    }
}
