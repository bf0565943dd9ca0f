//! Flat editing form for condition expressions.
//!
//! People edit a condition as a list of rows sharing one logical operator, while the
//! stored form is a binary [`Expr`] tree. The mapping is lossy: only a
//! left-leaning spine of comparisons under a single operator has a form
//! representation, and anything else is rejected on decode.

use super::{ComparisonOperator, Expr, LogicalOperator, Selector};
use crate::error::ExprError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One row of the condition editor. Every field may be absent or blank while the row
/// is being filled in; such rows are left out of the built expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ComparisonOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_value: Option<String>,
}

impl ConditionItem {
    pub fn new(
        left_selector: impl Into<String>,
        operator: ComparisonOperator,
        right_value: impl Into<String>,
    ) -> Self {
        Self {
            left_selector: Some(left_selector.into()),
            operator: Some(operator),
            right_value: Some(right_value.into()),
        }
    }

    /// Sets the left operand, clearing the operator if the new selector's type does
    /// not allow it.
    pub fn select_left(&mut self, key: impl Into<String>) {
        let key = key.into();
        let allowed = match Selector::parse_key(&key) {
            Ok(selector) => self
                .operator
                .is_none_or(|op| op.is_allowed_for(selector.value_type)),
            Err(_) => false,
        };
        if !allowed {
            self.operator = None;
        }
        self.left_selector = Some(key);
    }

    /// The operators the editor should offer for this row, or none until a valid
    /// left selector is chosen.
    pub fn allowed_operators(&self) -> &'static [ComparisonOperator] {
        self.left_selector
            .as_deref()
            .and_then(|key| Selector::parse_key(key).ok())
            .map(|selector| ComparisonOperator::allowed_for(selector.value_type))
            .unwrap_or(&[])
    }

    /// Builds the comparison for this row, or `None` if the row is incomplete.
    fn to_comparison(&self) -> Option<Expr> {
        let (key, operator, value) = match (&self.left_selector, self.operator, &self.right_value)
        {
            (Some(key), Some(operator), Some(value)) if !key.is_empty() && !value.is_empty() => {
                (key, operator, value)
            }
            _ => return None,
        };

        match Selector::parse_key(key) {
            Ok(selector) => Some(Expr::compare(selector, operator, value.clone())),
            Err(e) => {
                debug!(error = %e, "Skipping condition row with unreadable selector");
                None
            }
        }
    }

    fn from_comparison(expr: &Expr) -> Result<Self, ExprError> {
        match expr {
            Expr::Comparison {
                operator,
                left,
                right,
            } => match (left.as_ref(), right.as_ref()) {
                (Expr::Variant { selector }, Expr::Constant { value, .. }) => Ok(Self {
                    left_selector: Some(selector.key()),
                    operator: Some(*operator),
                    right_value: Some(value.clone()),
                }),
                (l, r) => Err(ExprError::MalformedExpression(format!(
                    "comparison must be variant {} constant, found {} {} {}",
                    operator.symbol(),
                    l.kind(),
                    operator.symbol(),
                    r.kind()
                ))),
            },
            other => Err(ExprError::MalformedExpression(format!(
                "expected a comparison, found a {}",
                other.kind()
            ))),
        }
    }
}

/// The whole condition editor: rows plus the operator joining them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionFormValues {
    pub conditions: Vec<ConditionItem>,
    #[serde(default)]
    pub logical_operator: LogicalOperator,
}

impl Default for ConditionFormValues {
    /// One blank row joined by `and`, which is what an unset expression edits as.
    fn default() -> Self {
        Self {
            conditions: vec![ConditionItem::default()],
            logical_operator: LogicalOperator::And,
        }
    }
}

/// Flattens an expression tree into editor rows.
pub fn expr_to_form_values(expr: Option<&Expr>) -> Result<ConditionFormValues, ExprError> {
    let Some(expr) = expr else {
        return Ok(ConditionFormValues::default());
    };

    let mut conditions = Vec::new();
    let mut logical_operator = None;
    flatten(expr, &mut conditions, &mut logical_operator).inspect_err(|e| {
        warn!(error = %e, expression = %expr, "Condition expression has no form representation");
    })?;

    Ok(ConditionFormValues {
        conditions,
        logical_operator: logical_operator.unwrap_or_default(),
    })
}

/// Walks the left spine of a logical chain, appending one row per comparison leaf.
fn flatten(
    expr: &Expr,
    conditions: &mut Vec<ConditionItem>,
    shared: &mut Option<LogicalOperator>,
) -> Result<(), ExprError> {
    match expr {
        Expr::Logical {
            operator,
            left,
            right,
        } => {
            match shared {
                Some(existing) if existing != operator => {
                    return Err(ExprError::MalformedExpression(format!(
                        "mixed logical operators '{}' and '{}' in one condition group",
                        existing.keyword(),
                        operator.keyword()
                    )));
                }
                _ => *shared = Some(*operator),
            }
            if let Expr::Logical { .. } = right.as_ref() {
                return Err(ExprError::MalformedExpression(
                    "logical chain must lean left".to_string(),
                ));
            }
            flatten(left, conditions, shared)?;
            conditions.push(ConditionItem::from_comparison(right)?);
            Ok(())
        }
        other => {
            conditions.push(ConditionItem::from_comparison(other)?);
            Ok(())
        }
    }
}

/// Folds editor rows into an expression tree. Incomplete rows are ignored.
///
/// One row yields a bare comparison; more rows fold left-associatively under the
/// shared operator. No complete rows yields `None`.
pub fn form_values_to_expr(values: &ConditionFormValues) -> Option<Expr> {
    values
        .conditions
        .iter()
        .filter_map(ConditionItem::to_comparison)
        .reduce(|acc, next| Expr::logical(values.logical_operator, acc, next))
}
