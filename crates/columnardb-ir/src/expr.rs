//! Expression trees hanging off logical plan nodes. Arguments come first in
//! any traversal order used by the optimizer and the parameter extractor.

use columnardb_common::{DataType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Plus,
    Minus,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Negate,
}

/// A node in an expression tree.
///
/// `Literal` is the only variant the parameter extractor rewrites in place
/// (see `columnardb-executor::parameter_extractor`); every other variant is
/// left untouched by that pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Placeholder {
        parameter_id: usize,
        data_type: DataType,
    },
    Column {
        table: Option<String>,
        name: String,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    Alias {
        expr: Box<Expr>,
        name: String,
    },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    pub fn literal(value: Value) -> Self {
        Expr::Literal(value)
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Visits every argument of this node, pre-order (this node's own
    /// literal/placeholder status is for the caller to inspect directly;
    /// this only recurses into children).
    pub fn for_each_child<'a>(&'a self, mut visit: impl FnMut(&'a Expr)) {
        match self {
            Expr::Literal(_) | Expr::Placeholder { .. } | Expr::Column { .. } => {}
            Expr::BinaryOp { left, right, .. } => {
                visit(left);
                visit(right);
            }
            Expr::UnaryOp { expr, .. } => visit(expr),
            Expr::Function { args, .. } => {
                for a in args {
                    visit(a);
                }
            }
            Expr::Alias { expr, .. } => visit(expr),
        }
    }

    pub fn for_each_child_mut(&mut self, mut visit: impl FnMut(&mut Expr)) {
        match self {
            Expr::Literal(_) | Expr::Placeholder { .. } | Expr::Column { .. } => {}
            Expr::BinaryOp { left, right, .. } => {
                visit(left);
                visit(right);
            }
            Expr::UnaryOp { expr, .. } => visit(expr),
            Expr::Function { args, .. } => {
                for a in args {
                    visit(a);
                }
            }
            Expr::Alias { expr, .. } => visit(expr),
        }
    }

    /// Every column reference anywhere in this expression's subtree.
    pub fn collect_columns<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        if matches!(self, Expr::Column { .. }) {
            out.push(self);
        }
        self.for_each_child(|child| child.collect_columns(out));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_columns_finds_nested_references() {
        let expr = Expr::binary(
            BinaryOperator::And,
            Expr::binary(BinaryOperator::Eq, Expr::column("a"), Expr::literal(Value::Int64(1))),
            Expr::column("b"),
        );
        let mut cols = Vec::new();
        expr.collect_columns(&mut cols);
        assert_eq!(cols.len(), 2);
    }

    #[test]
    fn for_each_child_mut_allows_in_place_rewrite() {
        let mut expr = Expr::binary(
            BinaryOperator::Eq,
            Expr::column("a"),
            Expr::literal(Value::Int64(6)),
        );
        expr.for_each_child_mut(|child| {
            if matches!(child, Expr::Literal(_)) {
                *child = Expr::Placeholder {
                    parameter_id: 0,
                    data_type: DataType::Int64,
                };
            }
        });
        if let Expr::BinaryOp { right, .. } = &expr {
            assert!(matches!(**right, Expr::Placeholder { .. }));
        } else {
            panic!("expected BinaryOp");
        }
    }
}
