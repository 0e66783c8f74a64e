//! Reduction of an expression tree to a boolean.
//!
//! Operand kinds are checked structurally before anything is reduced:
//! `&&`, `||` and `!` only accept Boolean operands, `==` and `!=` only
//! accept operands of the same kind.

use log::debug;

use crate::error::ExprError;
use crate::expr::{BinaryOp, Expr};
use crate::value::{Value, ValueKind};

impl Expr {
    /// Kind of the value this node produces. Every operator node is Boolean.
    pub fn kind(&self) -> ValueKind {
        match self {
            Expr::Literal(value) => value.kind(),
            Expr::Negate(_)
            | Expr::And(..)
            | Expr::Or(..)
            | Expr::Equals(..)
            | Expr::NotEquals(..) => ValueKind::Boolean,
        }
    }

    /// Collapses the tree to its boolean result.
    pub fn reduce(&self) -> Result<bool, ExprError> {
        match self {
            Expr::Literal(Value::Boolean(b)) => Ok(*b),
            Expr::Literal(value) => {
                Err(ExprError::evaluate(format!("can't evaluate {} value {}", value.kind(), value)))
            }
            Expr::Negate(child) => {
                if child.kind() != ValueKind::Boolean {
                    return Err(ExprError::evaluate("can't evaluate expression"));
                }
                Ok(!child.reduce()?)
            }
            Expr::And(..) | Expr::Or(..) | Expr::Equals(..) | Expr::NotEquals(..) => {
                self.reduce_chain()
            }
        }
    }

    /// Reduces a left-leaning run of binary operators without recursing down the left side.
    /// A flat chain `a && b || c ...` nests one level per operator, so it is walked with an
    /// explicit stack; only right operands, bounded by parenthesis nesting, recurse.
    fn reduce_chain(&self) -> Result<bool, ExprError> {
        let mut spine: Vec<(BinaryOp, &Expr)> = Vec::new();
        let mut node = self;
        while let Some((op, left, right)) = node.as_binary() {
            spine.push((op, right));
            node = left;
        }

        // `node` is now the leftmost operand and the last spine entry its operator
        let (op, right) = match spine.pop() {
            Some(innermost) => innermost,
            None => return node.reduce(),
        };
        let mut result = apply(op, node, right)?;

        while let Some((op, right)) = spine.pop() {
            result = combine(op, result, right)?;
        }
        Ok(result)
    }
}

/// Applies `op` to two unreduced operands.
fn apply(op: BinaryOp, left: &Expr, right: &Expr) -> Result<bool, ExprError> {
    match op {
        BinaryOp::And | BinaryOp::Or => {
            if left.kind() != ValueKind::Boolean || right.kind() != ValueKind::Boolean {
                return Err(operand_error(op, left.kind(), right.kind()));
            }
            combine(op, left.reduce()?, right)
        }
        BinaryOp::Equal => equal(op, left, right),
        BinaryOp::NotEqual => equal(op, left, right).map(|eq| !eq),
    }
}

/// Applies `op` to an already reduced Boolean left side.
fn combine(op: BinaryOp, left: bool, right: &Expr) -> Result<bool, ExprError> {
    if right.kind() != ValueKind::Boolean {
        return Err(operand_error(op, ValueKind::Boolean, right.kind()));
    }
    let right = right.reduce()?;
    Ok(match op {
        BinaryOp::And => left && right,
        BinaryOp::Or => left || right,
        BinaryOp::Equal => left == right,
        BinaryOp::NotEqual => left != right,
    })
}

fn equal(op: BinaryOp, left: &Expr, right: &Expr) -> Result<bool, ExprError> {
    let result = match (left, right) {
        // Integer and Text only ever come from literals, so compare payloads directly
        (Expr::Literal(Value::Integer(l)), Expr::Literal(Value::Integer(r))) => l == r,
        (Expr::Literal(Value::Text(l)), Expr::Literal(Value::Text(r))) => l == r,
        _ if left.kind() == ValueKind::Boolean && right.kind() == ValueKind::Boolean => {
            left.reduce()? == right.reduce()?
        }
        _ => return Err(operand_error(op, left.kind(), right.kind())),
    };
    debug!("{} == {} -> {}", left.kind(), right.kind(), result);
    Ok(result)
}

fn operand_error(op: BinaryOp, left: ValueKind, right: ValueKind) -> ExprError {
    ExprError::evaluate(format!("can't evaluate left {} right: {} {} {}", op, left, op, right))
}
