use crate::value::Value;

/// Binary operators. None binds tighter than another; chains group left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
pub enum BinaryOp {
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
}

/// Expression tree. Identifiers are resolved while parsing, so leaves are
/// always literals and a tree belongs to the variables it was parsed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Value),
    Negate(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Equals(Box<Expr>, Box<Expr>),
    NotEquals(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let (left, right) = (Box::new(left), Box::new(right));
        match op {
            BinaryOp::And => Expr::And(left, right),
            BinaryOp::Or => Expr::Or(left, right),
            BinaryOp::Equal => Expr::Equals(left, right),
            BinaryOp::NotEqual => Expr::NotEquals(left, right),
        }
    }

    pub fn negate(child: Expr) -> Expr {
        Expr::Negate(Box::new(child))
    }

    /// Operator and operands of a binary node.
    pub fn as_binary(&self) -> Option<(BinaryOp, &Expr, &Expr)> {
        match self {
            Expr::And(left, right) => Some((BinaryOp::And, left, right)),
            Expr::Or(left, right) => Some((BinaryOp::Or, left, right)),
            Expr::Equals(left, right) => Some((BinaryOp::Equal, left, right)),
            Expr::NotEquals(left, right) => Some((BinaryOp::NotEqual, left, right)),
            Expr::Literal(_) | Expr::Negate(_) => None,
        }
    }

    /// Detaches the left operand when it is itself a binary node, leaving a leaf behind.
    fn take_binary_left(&mut self) -> Option<Box<Expr>> {
        match self {
            Expr::And(left, _)
            | Expr::Or(left, _)
            | Expr::Equals(left, _)
            | Expr::NotEquals(left, _)
                if left.as_binary().is_some() =>
            {
                Some(std::mem::replace(left, Box::new(Expr::Literal(Value::Boolean(false)))))
            }
            _ => None,
        }
    }
}

// Flat operator chains nest one level per operator on the left side; unlink
// them one node at a time so dropping a long chain does not recurse.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut next = self.take_binary_left();
        while let Some(mut node) = next {
            next = node.take_binary_left();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_binary_op_from_lexeme() {
        let cases = vec![
            ("&&", BinaryOp::And),
            ("||", BinaryOp::Or),
            ("==", BinaryOp::Equal),
            ("!=", BinaryOp::NotEqual),
        ];
        for (lexeme, op) in cases {
            assert_eq!(BinaryOp::from_str(lexeme).unwrap(), op);
            assert_eq!(op.to_string(), lexeme);
        }
        assert!(BinaryOp::from_str("!").is_err());
    }

    #[test]
    fn test_binary_builds_variant() {
        let t = || Expr::Literal(Value::Boolean(true));
        assert!(matches!(Expr::binary(BinaryOp::And, t(), t()), Expr::And(..)));
        assert!(matches!(Expr::binary(BinaryOp::Or, t(), t()), Expr::Or(..)));
        assert!(matches!(Expr::binary(BinaryOp::Equal, t(), t()), Expr::Equals(..)));
        assert!(matches!(Expr::binary(BinaryOp::NotEqual, t(), t()), Expr::NotEquals(..)));
        assert_eq!(Expr::negate(t()), Expr::Negate(Box::new(t())));
    }

    #[test]
    fn test_as_binary() {
        let t = || Expr::Literal(Value::Boolean(true));
        let expr = Expr::binary(BinaryOp::NotEqual, t(), Expr::negate(t()));
        let (op, left, right) = expr.as_binary().unwrap();
        assert_eq!(op, BinaryOp::NotEqual);
        assert_eq!(*left, t());
        assert_eq!(*right, Expr::negate(t()));
        assert!(t().as_binary().is_none());
        assert!(Expr::negate(t()).as_binary().is_none());
    }

    #[test]
    fn test_drop_long_chain() {
        let mut expr = Expr::Literal(Value::Boolean(true));
        for _ in 0..200_000 {
            expr = Expr::binary(BinaryOp::Or, expr, Expr::Literal(Value::Boolean(false)));
        }
        drop(expr);
    }
}
