pub mod ast;
pub mod eval;
pub mod form;
pub mod value;

pub use ast::*;
pub use eval::*;
pub use form::{ConditionFormValues, ConditionItem, expr_to_form_values, form_values_to_expr};
pub use value::*;
