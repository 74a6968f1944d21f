//! Fluent query builders.
//!
//! Reads start from one of the select entry points, fix their source with
//! `from`, and accumulate clauses on a `QueryDescriptor`. Every method takes and
//! returns the descriptor by value so calls chain; `clone()` derives a variant
//! without disturbing the original.
//!
//! ```ignore
//! let request = select(["id", "name"])
//!     .from("users", [])
//!     .where_clause([eq("active", true)])
//!     .order_by_desc("id")
//!     .limit(10)
//!     .to_request();
//! ```
//!
//! Mutations use `insert_into`, `update` and `delete_from`.

use crate::db::Value;
use crate::request::Request;
use crate::result::Shape;

use super::expr::{Expr, Exprs, Mode, SqlFragment};
use super::operation::{
    ALL_FIELDS, DeleteQuery, InsertQuery, Join, Operation, OrderBy, SelectQuery, UpdateQuery,
};

/// Select shape before the source is known.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    distinct: bool,
    fields: Vec<String>,
}

impl SelectBuilder {
    fn new<I, S>(distinct: bool, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            fields.push(ALL_FIELDS.to_string());
        }
        Self { distinct, fields }
    }

    /// Fix the source table and any join clauses.
    pub fn from<J>(self, table: impl Into<String>, joins: J) -> QueryDescriptor
    where
        J: IntoIterator<Item = Join>,
    {
        QueryDescriptor::new(SelectQuery {
            distinct: self.distinct,
            fields: self.fields,
            table: table.into(),
            joins: joins.into_iter().collect(),
            ..Default::default()
        })
    }
}

/// Plain select. An empty field list reads every column.
///
/// Duplicate rows are kept where the engine keeps them. Cozo rules yield
/// sets, so on Cozo duplicates collapse even without `distinct_select`.
pub fn select<I, S>(fields: I) -> SelectBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SelectBuilder::new(false, fields)
}

pub fn distinct_select<I, S>(fields: I) -> SelectBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SelectBuilder::new(true, fields)
}

pub fn select_all() -> SelectBuilder {
    SelectBuilder::new(false, [ALL_FIELDS])
}

pub fn distinct_select_all() -> SelectBuilder {
    SelectBuilder::new(true, [ALL_FIELDS])
}

/// `COUNT(field)` over `table`; already has its source.
pub fn count(field: impl Into<String>, table: impl Into<String>) -> QueryDescriptor {
    QueryDescriptor::new(SelectQuery {
        count: true,
        fields: vec![field.into()],
        table: table.into(),
        ..Default::default()
    })
}

/// Accumulated read: the select payload plus the values bound to its WHERE.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    query: SelectQuery,
    where_exprs: Exprs,
    where_args: Vec<Value>,
    mode: Mode,
}

impl QueryDescriptor {
    fn new(query: SelectQuery) -> Self {
        Self {
            query,
            where_exprs: Exprs::default(),
            where_args: Vec::new(),
            mode: Mode::Parameterized,
        }
    }

    pub fn join(mut self, join: Join) -> Self {
        self.query.joins.push(join);
        self
    }

    /// Set the WHERE clause as an implicit AND of `exprs`.
    ///
    /// Replaces any earlier WHERE; calls do not accumulate.
    pub fn where_clause<I, E>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.where_exprs = exprs.into_iter().collect();
        self.render_where();
        self
    }

    /// Inline literals into the WHERE text instead of binding them.
    pub fn inline_literals(mut self) -> Self {
        self.mode = Mode::Inline;
        self.render_where();
        self
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn having(mut self, condition: impl Into<String>) -> Self {
        self.query.having = condition.into();
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.query.order_by.push(OrderBy {
            field: field.into(),
            descending: false,
        });
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.query.order_by.push(OrderBy {
            field: field.into(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    pub fn args(&self) -> &[Value] {
        &self.where_args
    }

    /// Shape the query will materialize to.
    pub fn should_return(&self) -> Shape {
        self.query.should_return()
    }

    /// Freeze into a read intent.
    pub fn to_request(self) -> Request {
        Request::intent(Operation::Select(self.query), self.where_args)
    }

    /// Freeze into a read intent tagged with `target`.
    pub fn to_request_on(self, target: impl Into<String>) -> Request {
        self.to_request().with_target(target)
    }

    fn render_where(&mut self) {
        let frag = self.where_exprs.render(self.mode);
        self.query.where_clause = frag.text;
        self.where_args = frag.values;
    }
}

/// Single-row insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBuilder {
    query: InsertQuery,
    values: Vec<Value>,
}

pub fn insert_into(table: impl Into<String>) -> InsertBuilder {
    InsertBuilder {
        query: InsertQuery {
            table: table.into(),
            columns: Vec::new(),
        },
        values: Vec::new(),
    }
}

impl InsertBuilder {
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.columns.push(column.into());
        self.values.push(value.into());
        self
    }

    pub fn to_request(self) -> Request {
        Request::intent(Operation::Insert(self.query), self.values)
    }

    pub fn to_request_on(self, target: impl Into<String>) -> Request {
        self.to_request().with_target(target)
    }
}

/// Update with SET assignments bound before WHERE values.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    query: UpdateQuery,
    set_values: Vec<Value>,
    where_args: Vec<Value>,
}

pub fn update(table: impl Into<String>) -> UpdateBuilder {
    UpdateBuilder {
        query: UpdateQuery {
            table: table.into(),
            ..Default::default()
        },
        set_values: Vec::new(),
        where_args: Vec::new(),
    }
}

impl UpdateBuilder {
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.columns.push(column.into());
        self.set_values.push(value.into());
        self
    }

    /// Replaces any earlier WHERE.
    pub fn where_clause<I, E>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        let frag = exprs.into_iter().collect::<Exprs>().to_sql();
        self.query.where_clause = frag.text;
        self.where_args = frag.values;
        self
    }

    pub fn to_request(self) -> Request {
        let mut args = self.set_values;
        args.extend(self.where_args);
        Request::intent(Operation::Update(self.query), args)
    }

    pub fn to_request_on(self, target: impl Into<String>) -> Request {
        self.to_request().with_target(target)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBuilder {
    query: DeleteQuery,
    where_args: Vec<Value>,
}

pub fn delete_from(table: impl Into<String>) -> DeleteBuilder {
    DeleteBuilder {
        query: DeleteQuery {
            table: table.into(),
            where_clause: String::new(),
        },
        where_args: Vec::new(),
    }
}

impl DeleteBuilder {
    /// Replaces any earlier WHERE.
    pub fn where_clause<I, E>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        let frag = exprs.into_iter().collect::<Exprs>().to_sql();
        self.query.where_clause = frag.text;
        self.where_args = frag.values;
        self
    }

    pub fn to_request(self) -> Request {
        Request::intent(Operation::Delete(self.query), self.where_args)
    }

    pub fn to_request_on(self, target: impl Into<String>) -> Request {
        self.to_request().with_target(target)
    }
}
