use super::ValueType;
use crate::error::ExprError;
use crate::workflow::NodeId;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the three segments of a selector key.
pub const SELECTOR_KEY_SEPARATOR: char = '#';

/// A reference to a named output of a specific prior node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl Selector {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value_type,
        }
    }

    /// Encodes the selector as a single scalar: `"{nodeId}#{outputName}#{valueType}"`.
    pub fn key(&self) -> String {
        [self.id.as_str(), self.name.as_str(), self.value_type.as_str()]
            .iter()
            .join(&SELECTOR_KEY_SEPARATOR.to_string())
    }

    /// Parses a composite selector key. The value type segment is case-normalized.
    ///
    /// Node ids are opaque and may contain the separator themselves, so the key is split
    /// from the right: the last two segments are the output name and the value type,
    /// and everything before them is the id.
    pub fn parse_key(key: &str) -> Result<Self, ExprError> {
        let invalid = |message: &str| ExprError::InvalidSelectorKey {
            key: key.to_string(),
            message: message.to_string(),
        };

        let (value_type, name, id) = key
            .rsplitn(3, SELECTOR_KEY_SEPARATOR)
            .collect_tuple()
            .ok_or_else(|| invalid("expected '<nodeId>#<outputName>#<valueType>'"))?;

        if id.is_empty() {
            return Err(invalid("node id segment is empty"));
        }
        if name.is_empty() {
            return Err(invalid("output name segment is empty"));
        }
        let value_type = value_type.parse::<ValueType>().map_err(|e| invalid(&e))?;

        Ok(Self::new(id, name, value_type))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{}", self.id, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

const ORDERING_OPERATORS: &[ComparisonOperator] = &[
    ComparisonOperator::Eq,
    ComparisonOperator::Neq,
    ComparisonOperator::Gt,
    ComparisonOperator::Gte,
    ComparisonOperator::Lt,
    ComparisonOperator::Lte,
];

const EQUALITY_OPERATORS: &[ComparisonOperator] =
    &[ComparisonOperator::Eq, ComparisonOperator::Neq];

impl ComparisonOperator {
    /// The operators a condition may use once its left operand has the given type.
    pub fn allowed_for(value_type: ValueType) -> &'static [ComparisonOperator] {
        match value_type {
            ValueType::Number => ORDERING_OPERATORS,
            ValueType::String | ValueType::Boolean => EQUALITY_OPERATORS,
        }
    }

    pub fn is_allowed_for(&self, value_type: ValueType) -> bool {
        Self::allowed_for(value_type).contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "eq",
            ComparisonOperator::Neq => "neq",
            ComparisonOperator::Gt => "gt",
            ComparisonOperator::Gte => "gte",
            ComparisonOperator::Lt => "lt",
            ComparisonOperator::Lte => "lte",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Neq => "!=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Gte => ">=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Lte => "<=",
        }
    }

    /// Editor label; boolean operands read as "is" / "is not".
    pub fn label(&self, value_type: ValueType) -> &'static str {
        match (value_type, self) {
            (ValueType::Boolean, ComparisonOperator::Eq) => "is",
            (ValueType::Boolean, ComparisonOperator::Neq) => "is not",
            _ => self.symbol(),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// The guard expression of a Condition node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    #[serde(rename = "const", alias = "constant")]
    Constant {
        value: String,
        #[serde(rename = "valueType")]
        value_type: ValueType,
    },
    #[serde(rename = "var", alias = "variant")]
    Variant { selector: Selector },
    #[serde(rename = "compare", alias = "comparison")]
    Comparison {
        operator: ComparisonOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    #[serde(rename = "logical")]
    Logical {
        operator: LogicalOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn constant(value: impl Into<String>, value_type: ValueType) -> Self {
        Expr::Constant {
            value: value.into(),
            value_type,
        }
    }

    pub fn variant(selector: Selector) -> Self {
        Expr::Variant { selector }
    }

    /// Builds the canonical comparison `selector <operator> value`, where the constant
    /// takes the selector's type.
    pub fn compare(selector: Selector, operator: ComparisonOperator, value: impl Into<String>) -> Self {
        let value_type = selector.value_type;
        Expr::Comparison {
            operator,
            left: Box::new(Expr::variant(selector)),
            right: Box::new(Expr::constant(value, value_type)),
        }
    }

    pub fn logical(operator: LogicalOperator, left: Expr, right: Expr) -> Self {
        Expr::Logical {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Decodes an expression stored in a node's config.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ExprError> {
        Expr::deserialize(value).map_err(|e| ExprError::Decode(e.to_string()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Every field is a string, enum or box of the same; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Checks that every comparison has a variant on the left and a constant on the
    /// right, and that the root is a comparison or logical node.
    pub fn check_well_formed(&self) -> Result<(), ExprError> {
        match self {
            Expr::Comparison { left, right, .. } => match (left.as_ref(), right.as_ref()) {
                (Expr::Variant { .. }, Expr::Constant { .. }) => Ok(()),
                (l, r) => Err(ExprError::MalformedExpression(format!(
                    "comparison operands must be a variant and a constant, found {} and {}",
                    l.kind(),
                    r.kind()
                ))),
            },
            Expr::Logical { left, right, .. } => {
                left.check_well_formed()?;
                right.check_well_formed()
            }
            Expr::Constant { .. } | Expr::Variant { .. } => Err(ExprError::MalformedExpression(
                format!("a bare {} is not a boolean condition", self.kind()),
            )),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Constant { .. } => "constant",
            Expr::Variant { .. } => "variant",
            Expr::Comparison { .. } => "comparison",
            Expr::Logical { .. } => "logical",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Logical {
                operator: LogicalOperator::Or,
                ..
            } => 1,
            Expr::Logical {
                operator: LogicalOperator::And,
                ..
            } => 2,
            Expr::Comparison { .. } => 4,
            Expr::Constant { .. } | Expr::Variant { .. } => 9,
        }
    }

    /// Recursively formats the expression, adding parentheses only when necessary.
    fn fmt_with_precedence(&self, f: &mut fmt::Formatter<'_>, parent_precedence: u8) -> fmt::Result {
        let current_precedence = self.precedence();
        let needs_parens = current_precedence < parent_precedence;

        if needs_parens {
            write!(f, "(")?;
        }

        match self {
            Expr::Logical {
                operator,
                left,
                right,
            } => {
                left.fmt_with_precedence(f, current_precedence)?;
                write!(f, " {} ", operator.keyword())?;
                // Right operand binds one tighter so left-associative chains stay flat.
                right.fmt_with_precedence(f, current_precedence + 1)?;
            }
            Expr::Comparison {
                operator,
                left,
                right,
            } => {
                left.fmt_with_precedence(f, current_precedence)?;
                write!(f, " {} ", operator.symbol())?;
                right.fmt_with_precedence(f, current_precedence)?;
            }
            Expr::Constant {
                value,
                value_type: ValueType::String,
            } => write!(f, "{:?}", value)?,
            Expr::Constant { value, .. } => write!(f, "{}", value)?,
            Expr::Variant { selector } => write!(f, "{}", selector)?,
        }

        if needs_parens {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_precedence(f, 0)
    }
}
