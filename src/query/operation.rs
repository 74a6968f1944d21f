//! Operation payloads carried by intent requests.
//!
//! Each payload is the structured input a dialect renders into statement text.
//! Fields are public because dialect renderers read them directly; bound values
//! never live here, they travel separately as the intent's args.

use std::fmt;

use crate::result::Shape;

/// Projection sentinel meaning "all columns".
pub const ALL_FIELDS: &str = "*";

/// The CRUD category of an intent, plus caller-supplied raw statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
    /// Caller-supplied text; outside the CRUD set.
    Raw,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Create => "create",
            OperationKind::Read => "read",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Raw => "raw",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
        }
    }
}

/// A join clause assembled literally: `<kind> JOIN <target> ON <condition>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub target: String,
    pub condition: String,
}

impl Join {
    pub fn new(kind: JoinKind, target: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            condition: condition.into(),
        }
    }

    pub fn inner(target: impl Into<String>, condition: impl Into<String>) -> Self {
        Self::new(JoinKind::Inner, target, condition)
    }

    pub fn left(target: impl Into<String>, condition: impl Into<String>) -> Self {
        Self::new(JoinKind::Left, target, condition)
    }

    pub fn right(target: impl Into<String>, condition: impl Into<String>) -> Self {
        Self::new(JoinKind::Right, target, condition)
    }

    pub fn full(target: impl Into<String>, condition: impl Into<String>) -> Self {
        Self::new(JoinKind::Full, target, condition)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// A read over one source.
///
/// `where_clause` and `having` are already-rendered neutral fragments with `?`
/// placeholders; an empty string means the clause is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectQuery {
    pub distinct: bool,
    pub count: bool,
    pub fields: Vec<String>,
    pub table: String,
    pub joins: Vec<Join>,
    pub where_clause: String,
    pub group_by: Vec<String>,
    pub having: String,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectQuery {
    pub fn is_select_all(&self) -> bool {
        self.fields.iter().any(|f| f == ALL_FIELDS)
    }

    /// Result shape this query produces: count → scalar, `*` or several
    /// fields → table, one named field → list.
    pub fn should_return(&self) -> Shape {
        if self.count {
            Shape::Scalar
        } else if self.is_select_all() || self.fields.len() > 1 {
            Shape::Table
        } else {
            Shape::List
        }
    }
}

/// Insert one row; the values are the intent's args in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertQuery {
    pub table: String,
    pub columns: Vec<String>,
}

/// Assign `columns` (args first, in order) on rows matching `where_clause`
/// (its args follow).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateQuery {
    pub table: String,
    pub columns: Vec<String>,
    pub where_clause: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteQuery {
    pub table: String,
    pub where_clause: String,
}

/// Statement text supplied by the caller, passed through untouched apart from
/// placeholder rebinding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStatement {
    pub text: String,
}

/// The payload of an intent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Select(SelectQuery),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
    Raw(RawStatement),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Select(_) => OperationKind::Read,
            Operation::Insert(_) => OperationKind::Create,
            Operation::Update(_) => OperationKind::Update,
            Operation::Delete(_) => OperationKind::Delete,
            Operation::Raw(_) => OperationKind::Raw,
        }
    }

    /// Source table or collection, when the payload names one.
    pub fn table(&self) -> Option<&str> {
        match self {
            Operation::Select(q) => Some(&q.table),
            Operation::Insert(q) => Some(&q.table),
            Operation::Update(q) => Some(&q.table),
            Operation::Delete(q) => Some(&q.table),
            Operation::Raw(_) => None,
        }
    }
}
