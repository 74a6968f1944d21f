//! Requests: what a caller asks an engine to do.
//!
//! A `Request` is a closed sum over intents (a rendered operation payload plus
//! its bound args), prefabs (fixed introspection lookups), and two composites:
//! batches run members independently, chains stop at the first failure.
//!
//! Every request knows, without executing, which response represents its
//! success and which its failure. Those responses are templates: the engine
//! fills in rows, affected counts or the native error at execution time.

pub mod prefab;
pub mod response;

pub use prefab::Prefab;
pub use response::{Body, Response, Status};

use crate::db::Value;
use crate::query::{Operation, OperationKind, RawStatement};
use crate::result::Shape;

/// An operation payload together with the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    operation: Operation,
    args: Vec<Value>,
}

impl Intent {
    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn success_status(&self) -> Status {
        match self.kind() {
            OperationKind::Create => Status::CREATED,
            OperationKind::Read => Status::READ,
            OperationKind::Update => Status::UPDATED,
            OperationKind::Delete => Status::DELETED,
            OperationKind::Raw => Status::RAW,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    Intent(Intent),
    Prefab(Prefab),
    Batch(Vec<Request>),
    Chain(Vec<Request>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    kind: RequestKind,
    target: Option<String>,
}

impl Request {
    fn new(kind: RequestKind) -> Self {
        Self { kind, target: None }
    }

    pub fn intent(operation: Operation, args: Vec<Value>) -> Self {
        Self::new(RequestKind::Intent(Intent { operation, args }))
    }

    /// Caller-supplied statement text with `?` placeholders.
    pub fn raw(text: impl Into<String>, args: Vec<Value>) -> Self {
        Self::intent(Operation::Raw(RawStatement { text: text.into() }), args)
    }

    pub fn batch(requests: Vec<Request>) -> Self {
        Self::new(RequestKind::Batch(requests))
    }

    pub fn chain(requests: Vec<Request>) -> Self {
        Self::new(RequestKind::Chain(requests))
    }

    pub fn database_names() -> Self {
        Self::new(RequestKind::Prefab(Prefab::DatabaseNames))
    }

    pub fn table_names(database: impl Into<String>) -> Self {
        Self::new(RequestKind::Prefab(Prefab::TableNames {
            database: database.into(),
        }))
    }

    pub fn column_names(table: impl Into<String>) -> Self {
        Self::new(RequestKind::Prefab(Prefab::ColumnNames { table: table.into() }))
    }

    pub fn row_count(table: impl Into<String>) -> Self {
        Self::new(RequestKind::Prefab(Prefab::RowCount { table: table.into() }))
    }

    pub fn table_schema(table: impl Into<String>) -> Self {
        Self::new(RequestKind::Prefab(Prefab::TableSchema { table: table.into() }))
    }

    pub fn column_type(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(RequestKind::Prefab(Prefab::ColumnType {
            table: table.into(),
            column: column.into(),
        }))
    }

    /// Tag responses to this request with a correlation name.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn is_prefab(&self) -> bool {
        matches!(self.kind, RequestKind::Prefab(_))
    }

    pub fn success_status(&self) -> Status {
        match &self.kind {
            RequestKind::Intent(intent) => intent.success_status(),
            RequestKind::Prefab(prefab) => prefab.success_status(),
            RequestKind::Batch(_) => Status::BATCH,
            RequestKind::Chain(_) => Status::CHAIN,
        }
    }

    /// Shape a successful row-producing execution materializes to, if any.
    pub fn expected_shape(&self) -> Option<Shape> {
        match &self.kind {
            RequestKind::Intent(intent) => match intent.operation() {
                Operation::Select(q) => Some(q.should_return()),
                _ => None,
            },
            RequestKind::Prefab(prefab) => Some(prefab.expected_shape()),
            RequestKind::Batch(_) | RequestKind::Chain(_) => None,
        }
    }

    pub fn response_on_success(&self) -> Response {
        Response::template(self.success_status(), self.target.clone())
    }

    pub fn response_on_error(&self) -> Response {
        Response::template(self.success_status().failure(), self.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Request::database_names())]
    #[case(Request::table_names("app"))]
    #[case(Request::column_names("users"))]
    #[case(Request::row_count("users"))]
    #[case(Request::table_schema("users"))]
    #[case(Request::column_type("users", "id"))]
    fn test_prefab_codes_mirror(#[case] request: Request) {
        assert!(request.is_prefab());
        let ok = request.response_on_success().code();
        let err = request.response_on_error().code();
        assert!(ok > 0);
        assert_eq!(ok, -err);
    }

    #[rstest]
    fn test_prefab_codes_are_distinct() {
        let codes: std::collections::HashSet<i32> = [
            Request::database_names(),
            Request::table_names("a"),
            Request::column_names("t"),
            Request::row_count("t"),
            Request::table_schema("t"),
            Request::column_type("t", "c"),
        ]
        .iter()
        .map(|r| r.success_status().code())
        .collect();
        assert_eq!(codes.len(), 6);
    }

    #[rstest]
    fn test_raw_is_raw_kind() {
        let request = Request::raw("VACUUM", vec![]);
        let RequestKind::Intent(intent) = request.kind() else {
            panic!("Expected intent");
        };
        assert_eq!(intent.kind(), OperationKind::Raw);
        assert_eq!(request.success_status(), Status::RAW);
        assert_eq!(request.expected_shape(), None);
    }

    #[rstest]
    fn test_composites_have_their_own_codes() {
        let batch = Request::batch(vec![Request::row_count("t")]);
        let chain = Request::chain(vec![]);
        assert_eq!(batch.response_on_success().status(), Status::BATCH);
        assert_eq!(chain.response_on_error().code(), -Status::CHAIN.code());
        assert!(!batch.is_prefab());
    }

    #[rstest]
    fn test_target_copied_to_templates() {
        let request = Request::row_count("t").with_target("replica");
        assert_eq!(request.response_on_success().target(), Some("replica"));
        assert_eq!(request.response_on_error().target(), Some("replica"));
    }

    #[rstest]
    fn test_expected_shape_of_prefabs() {
        assert_eq!(Request::row_count("t").expected_shape(), Some(Shape::Scalar));
        assert_eq!(Request::column_names("t").expected_shape(), Some(Shape::List));
        assert_eq!(Request::table_schema("t").expected_shape(), Some(Shape::Table));
    }
}
