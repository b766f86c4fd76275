//! Rule Conditions

use std::cmp::Ordering;

use rust_decimal::Decimal;
use smallvec::SmallVec;

use crate::rules::RuleDefinitionError;

/// A comparison operand, parsed once into its string and numeric forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleValue {
    raw: String,
    number: Option<Decimal>,
}

impl RuleValue {
    /// Parse an operand. Surrounding whitespace is ignored.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();

        Self {
            raw: raw.to_string(),
            number: raw.parse::<Decimal>().ok(),
        }
    }

    /// A numeric operand.
    #[must_use]
    pub fn number(number: Decimal) -> Self {
        Self {
            raw: number.to_string(),
            number: Some(number),
        }
    }

    /// Returns the operand as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the operand as a number, if it parses as one.
    pub fn as_number(&self) -> Option<Decimal> {
        self.number
    }

    /// Numeric comparison when both sides are numbers, string comparison otherwise.
    fn compare(&self, other: &Self) -> Ordering {
        match (self.number, other.number) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
            _ => self.raw.as_str().cmp(other.raw.as_str()),
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

/// Rule comparison operator and its parsed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleCondition {
    /// `actual == value`
    Equals(RuleValue),

    /// `actual != value`
    NotEquals(RuleValue),

    /// `actual > value`
    GreaterThan(RuleValue),

    /// `actual < value`
    LessThan(RuleValue),

    /// `actual >= value`
    GreaterThanOrEqual(RuleValue),

    /// `actual <= value`
    LessThanOrEqual(RuleValue),

    /// `min <= actual <= max`, numeric and inclusive.
    Between {
        /// Lower bound.
        min: Decimal,

        /// Upper bound.
        max: Decimal,
    },

    /// `actual` is one of the listed values.
    In(SmallVec<[RuleValue; 4]>),

    /// `actual` is none of the listed values.
    NotIn(SmallVec<[RuleValue; 4]>),

    /// `actual` contains the value as a substring.
    Contains(RuleValue),
}

/// The value a rule resolved from the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleActual {
    /// A single value (subtotal, country, quantity, ...).
    One(RuleValue),

    /// A set of values (customer groups).
    Many(Vec<RuleValue>),
}

impl RuleCondition {
    /// Parse an operator and its payload.
    ///
    /// `between` expects `"min,max"`; `in` and `not_in` expect a comma-separated list.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown operator or a malformed `between` payload.
    pub fn parse(operator: &str, value: &str) -> Result<Self, RuleDefinitionError> {
        let condition = match operator.trim() {
            "equals" => Self::Equals(RuleValue::new(value)),
            "not_equals" => Self::NotEquals(RuleValue::new(value)),
            "greater_than" => Self::GreaterThan(RuleValue::new(value)),
            "less_than" => Self::LessThan(RuleValue::new(value)),
            "greater_than_or_equal" => Self::GreaterThanOrEqual(RuleValue::new(value)),
            "less_than_or_equal" => Self::LessThanOrEqual(RuleValue::new(value)),
            "between" => parse_between(value)?,
            "in" => Self::In(parse_list(value)),
            "not_in" => Self::NotIn(parse_list(value)),
            "contains" => Self::Contains(RuleValue::new(value)),
            other => return Err(RuleDefinitionError::UnknownOperator(other.to_string())),
        };

        Ok(condition)
    }

    /// Rewrite every operand, leaving `between` bounds untouched.
    #[must_use]
    pub fn map_values(self, map: impl Fn(&RuleValue) -> RuleValue) -> Self {
        let list = |values: SmallVec<[RuleValue; 4]>| values.iter().map(&map).collect();

        match self {
            Self::Equals(value) => Self::Equals(map(&value)),
            Self::NotEquals(value) => Self::NotEquals(map(&value)),
            Self::GreaterThan(value) => Self::GreaterThan(map(&value)),
            Self::LessThan(value) => Self::LessThan(map(&value)),
            Self::GreaterThanOrEqual(value) => Self::GreaterThanOrEqual(map(&value)),
            Self::LessThanOrEqual(value) => Self::LessThanOrEqual(map(&value)),
            Self::Between { min, max } => Self::Between { min, max },
            Self::In(values) => Self::In(list(values)),
            Self::NotIn(values) => Self::NotIn(list(values)),
            Self::Contains(value) => Self::Contains(map(&value)),
        }
    }

    /// Test the condition against a resolved value.
    pub fn matches(&self, actual: &RuleActual) -> bool {
        match actual {
            RuleActual::One(value) => self.matches_one(value),
            RuleActual::Many(values) => self.matches_many(values),
        }
    }

    fn matches_one(&self, actual: &RuleValue) -> bool {
        match self {
            Self::Equals(expected) => actual.same_as(expected),
            Self::NotEquals(expected) => !actual.same_as(expected),
            Self::GreaterThan(expected) => actual.compare(expected) == Ordering::Greater,
            Self::LessThan(expected) => actual.compare(expected) == Ordering::Less,
            Self::GreaterThanOrEqual(expected) => actual.compare(expected) != Ordering::Less,
            Self::LessThanOrEqual(expected) => actual.compare(expected) != Ordering::Greater,
            Self::Between { min, max } => actual
                .as_number()
                .is_some_and(|number| *min <= number && number <= *max),
            Self::In(list) => list.iter().any(|entry| actual.same_as(entry)),
            Self::NotIn(list) => !list.iter().any(|entry| actual.same_as(entry)),
            Self::Contains(needle) => actual.as_str().contains(needle.as_str()),
        }
    }

    fn matches_many(&self, actual: &[RuleValue]) -> bool {
        match self {
            Self::Equals(expected) | Self::Contains(expected) => {
                actual.iter().any(|value| value.same_as(expected))
            }
            Self::NotEquals(expected) => !actual.iter().any(|value| value.same_as(expected)),
            Self::In(list) => actual
                .iter()
                .any(|value| list.iter().any(|entry| value.same_as(entry))),
            Self::NotIn(list) => !actual
                .iter()
                .any(|value| list.iter().any(|entry| value.same_as(entry))),
            Self::GreaterThan(_)
            | Self::LessThan(_)
            | Self::GreaterThanOrEqual(_)
            | Self::LessThanOrEqual(_)
            | Self::Between { .. } => false,
        }
    }
}

fn parse_between(value: &str) -> Result<RuleCondition, RuleDefinitionError> {
    let invalid = || RuleDefinitionError::InvalidRange(value.to_string());

    let (min, max) = value.split_once(',').ok_or_else(invalid)?;

    let min = min.trim().parse::<Decimal>().map_err(|_err| invalid())?;
    let max = max.trim().parse::<Decimal>().map_err(|_err| invalid())?;

    Ok(RuleCondition::Between { min, max })
}

fn parse_list(value: &str) -> SmallVec<[RuleValue; 4]> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(RuleValue::new)
        .collect()
}
