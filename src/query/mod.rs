//! Query intents: predicates, operation payloads and the fluent builders that
//! assemble them into requests.

pub mod builder;
pub mod expr;
pub mod operation;

pub use builder::{
    QueryDescriptor, count, delete_from, distinct_select, distinct_select_all, insert_into, select,
    select_all, update,
};
pub use expr::{Comparison, Expr, Exprs, Fragment, Mode, SqlFragment, and, eq, gt, like, lt, ne, not, null, or};
pub use operation::{
    DeleteQuery, InsertQuery, Join, JoinKind, Operation, OperationKind, OrderBy, RawStatement,
    SelectQuery, UpdateQuery,
};
