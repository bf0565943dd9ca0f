use super::{ComparisonOperator, Expr, LogicalOperator, Selector, Value, ValueType};
use crate::error::EvaluationError;
use ahash::AHashMap;

/// Resolved output values of prior nodes, keyed by selector key.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: AHashMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, selector: &Selector, value: impl Into<Value>) {
        self.values.insert(selector.key(), value.into());
    }

    pub fn with(mut self, selector: &Selector, value: impl Into<Value>) -> Self {
        self.insert(selector, value);
        self
    }

    pub fn get(&self, selector: &Selector) -> Option<&Value> {
        self.values.get(&selector.key())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Expr {
    /// Evaluates the expression against resolved variables.
    ///
    /// Logical operators short-circuit, so a missing variable on an unevaluated side
    /// is not an error.
    pub fn evaluate(&self, variables: &Variables) -> Result<Value, EvaluationError> {
        match self {
            Expr::Constant { value, value_type } => {
                Value::parse_as(value, *value_type).ok_or_else(|| {
                    EvaluationError::InvalidConstant {
                        value: value.clone(),
                        value_type: value_type.to_string(),
                    }
                })
            }
            Expr::Variant { selector } => {
                let value = variables
                    .get(selector)
                    .ok_or_else(|| EvaluationError::VariableNotFound(selector.key()))?;
                if value.value_type() != selector.value_type {
                    return Err(EvaluationError::TypeMismatch {
                        operation: selector.key(),
                        expected: selector.value_type.to_string(),
                        found: value.clone(),
                    });
                }
                Ok(value.clone())
            }
            Expr::Comparison {
                operator,
                left,
                right,
            } => {
                let l = left.evaluate(variables)?;
                let r = right.evaluate(variables)?;
                compare(*operator, &l, &r).map(Value::Bool)
            }
            Expr::Logical {
                operator,
                left,
                right,
            } => {
                let l = expect_bool(operator.keyword(), left.evaluate(variables)?)?;
                let short_circuit = match operator {
                    LogicalOperator::And => !l,
                    LogicalOperator::Or => l,
                };
                if short_circuit {
                    return Ok(Value::Bool(l));
                }
                let r = expect_bool(operator.keyword(), right.evaluate(variables)?)?;
                Ok(Value::Bool(r))
            }
        }
    }

    /// Evaluates a guard to a plain boolean after checking it is well formed.
    pub fn is_satisfied(&self, variables: &Variables) -> Result<bool, EvaluationError> {
        self.check_well_formed()?;
        expect_bool("guard", self.evaluate(variables)?)
    }
}

fn expect_bool(operation: &str, value: Value) -> Result<bool, EvaluationError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(EvaluationError::TypeMismatch {
            operation: operation.to_string(),
            expected: ValueType::Boolean.to_string(),
            found: other,
        }),
    }
}

fn compare(operator: ComparisonOperator, l: &Value, r: &Value) -> Result<bool, EvaluationError> {
    use ComparisonOperator::*;

    let unsupported = |value_type: ValueType| EvaluationError::UnsupportedOperator {
        operator,
        value_type: value_type.to_string(),
    };

    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Ok(match operator {
            Eq => a == b,
            Neq => a != b,
            Gt => a > b,
            Gte => a >= b,
            Lt => a < b,
            Lte => a <= b,
        }),
        (Value::String(a), Value::String(b)) => match operator {
            Eq => Ok(a == b),
            Neq => Ok(a != b),
            _ => Err(unsupported(ValueType::String)),
        },
        (Value::Bool(a), Value::Bool(b)) => match operator {
            Eq => Ok(a == b),
            Neq => Ok(a != b),
            _ => Err(unsupported(ValueType::Boolean)),
        },
        (l, r) => Err(EvaluationError::TypeMismatch {
            operation: operator.to_string(),
            expected: l.value_type().to_string(),
            found: r.clone(),
        }),
    }
}

