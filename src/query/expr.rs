//! Predicate expressions.
//!
//! A small algebra of comparisons, single-comparison negation and AND/OR
//! groups that renders to a dialect-neutral fragment. Placeholders are always
//! `?`; the dialect rebinds them to its own syntax when the final statement is
//! produced.
//!
//! ```ignore
//! let filter = and([eq("a", 1), eq("b", 2)]);
//! let frag = filter.to_sql();
//! assert_eq!(frag.text, "(a = ? AND b = ?)");
//! ```

use crate::db::Value;
use crate::db::escape::quote_literal;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Like,
    Is,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Like => "LIKE",
            Operator::Is => "IS",
        }
    }

    /// Word operators negate as `NOT <op>`, symbols as `!<op>`.
    pub fn is_word(self) -> bool {
        matches!(self, Operator::Like | Operator::Is)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// How literal values are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// `?` placeholders plus a parallel value list.
    #[default]
    Parameterized,
    /// Literals inlined, value list empty.
    Inline,
}

/// Rendered text plus the values bound to its placeholders, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub values: Vec<Value>,
}

/// Anything that renders to a predicate fragment.
pub trait SqlFragment {
    fn render(&self, mode: Mode) -> Fragment;

    fn to_sql(&self) -> Fragment {
        self.render(Mode::Parameterized)
    }

    fn to_sql_inline(&self) -> Fragment {
        self.render(Mode::Inline)
    }
}

/// Leaf comparison: `<column> <op> <value>`.
///
/// `IS` comparisons only test for null: the value is a boolean saying whether
/// the column must be null, and nothing is bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    column: String,
    op: Operator,
    value: Value,
}

impl Comparison {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn is_null_test(&self) -> bool {
        self.op == Operator::Is
    }

    fn render_with(&self, negated: bool, mode: Mode) -> Fragment {
        if self.is_null_test() {
            let wants_null = self.value.as_bool().unwrap_or(true) != negated;
            let text = if wants_null {
                format!("{} IS NULL", self.column)
            } else {
                format!("{} IS NOT NULL", self.column)
            };
            return Fragment { text, values: Vec::new() };
        }

        let op = match (negated, self.op.is_word()) {
            (false, _) => self.op.as_str().to_string(),
            (true, true) => format!("NOT {}", self.op.as_str()),
            (true, false) => format!("!{}", self.op.as_str()),
        };

        match mode {
            Mode::Parameterized => Fragment {
                text: format!("{} {} ?", self.column, op),
                values: vec![self.value.clone()],
            },
            Mode::Inline => Fragment {
                text: format!("{} {} {}", self.column, op, render_literal(&self.value)),
                values: Vec::new(),
            },
        }
    }
}

impl SqlFragment for Comparison {
    fn render(&self, mode: Mode) -> Fragment {
        self.render_with(false, mode)
    }
}

/// A node in a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Comparison(Comparison),
    /// Negates exactly one comparison, never a subtree.
    Not(Comparison),
    Logical { op: LogicalOp, children: Vec<Expr> },
}

impl Expr {
    /// Number of leaves that carry a bound value.
    pub fn literal_count(&self) -> usize {
        match self {
            Expr::Comparison(c) | Expr::Not(c) => usize::from(!c.is_null_test()),
            Expr::Logical { children, .. } => children.iter().map(Expr::literal_count).sum(),
        }
    }
}

impl From<Comparison> for Expr {
    fn from(c: Comparison) -> Self {
        Expr::Comparison(c)
    }
}

impl SqlFragment for Expr {
    fn render(&self, mode: Mode) -> Fragment {
        match self {
            Expr::Comparison(c) => c.render_with(false, mode),
            Expr::Not(c) => c.render_with(true, mode),
            Expr::Logical { op, children } => {
                let parts: Vec<Fragment> = children.iter().map(|c| c.render(mode)).collect();
                let sep = format!(" {} ", op.as_str());
                let text = parts.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join(&sep);
                Fragment {
                    text: format!("({text})"),
                    values: parts.into_iter().flat_map(|p| p.values).collect(),
                }
            }
        }
    }
}

/// A flat list treated as an implicit AND, rendered without parentheses.
///
/// This is the shape of an outermost WHERE clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exprs(pub Vec<Expr>);

impl Exprs {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn literal_count(&self) -> usize {
        self.0.iter().map(Expr::literal_count).sum()
    }
}

impl<E: Into<Expr>> FromIterator<E> for Exprs {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Exprs(iter.into_iter().map(Into::into).collect())
    }
}

impl SqlFragment for Exprs {
    fn render(&self, mode: Mode) -> Fragment {
        let parts: Vec<Fragment> = self.0.iter().map(|e| e.render(mode)).collect();
        Fragment {
            text: parts.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join(" AND "),
            values: parts.into_iter().flat_map(|p| p.values).collect(),
        }
    }
}

/// Inline a literal: strings single-quoted, booleans as words, the rest via
/// default formatting.
pub fn render_literal(value: &Value) -> String {
    match value {
        Value::Str(s) => quote_literal(s),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn comparison(column: impl Into<String>, op: Operator, value: Value) -> Comparison {
    Comparison {
        column: column.into(),
        op,
        value,
    }
}

pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Comparison {
    comparison(column, Operator::Eq, value.into())
}

pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Comparison {
    comparison(column, Operator::Ne, value.into())
}

pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Comparison {
    comparison(column, Operator::Gt, value.into())
}

pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Comparison {
    comparison(column, Operator::Lt, value.into())
}

pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Comparison {
    comparison(column, Operator::Like, pattern.into())
}

/// `IS NULL` when `is_null` is true, `IS NOT NULL` otherwise.
pub fn null(column: impl Into<String>, is_null: bool) -> Comparison {
    comparison(column, Operator::Is, Value::Bool(is_null))
}

pub fn not(cmp: Comparison) -> Expr {
    Expr::Not(cmp)
}

pub fn and<I, E>(exprs: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::Logical {
        op: LogicalOp::And,
        children: exprs.into_iter().map(Into::into).collect(),
    }
}

pub fn or<I, E>(exprs: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::Logical {
        op: LogicalOp::Or,
        children: exprs.into_iter().map(Into::into).collect(),
    }
}
