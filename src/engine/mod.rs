//! Execution engine.
//!
//! A `Client` pairs one native connector with the dialect of its engine and
//! drives each request through the same sequence:
//!
//! ```text
//! check(open) → open if needed → check(ping) → ping → check(execute)
//!     → render → query | exec → materialize
//! ```
//!
//! Any failure short-circuits to the request's failure response; render
//! failures never reach the connector. Reads and prefabs run as row queries,
//! every other intent kind (including raw statements) runs as an exec.
//!
//! The connector is a single-writer resource. The client serializes access
//! with a mutex, so one client may be shared between threads, but requests on
//! it run one at a time.

pub mod registry;

pub use registry::{ClientFactory, EngineRegistry, RegistryError};

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::db::{Connector, Context, DbError, Stage, Value};
use crate::dialect::{AnyDialect, Dialect};
use crate::error::QueryError;
use crate::query::OperationKind;
use crate::request::{Body, Request, RequestKind, Response, Status};
use crate::result::materialize;

/// A rendered statement and how to run it.
struct Statement {
    text: String,
    args: Vec<Value>,
    returns_rows: bool,
}

pub struct Client {
    engine: &'static str,
    connector: Mutex<Box<dyn Connector>>,
    dialect: AnyDialect,
}

impl Client {
    pub fn new(connector: Box<dyn Connector>, dialect: impl Into<AnyDialect>) -> Self {
        Self {
            engine: connector.engine_name(),
            connector: Mutex::new(connector),
            dialect: dialect.into(),
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine
    }

    pub fn dialect(&self) -> AnyDialect {
        self.dialect
    }

    /// Run `request` and return its body, or the error that failed it.
    pub fn request(&self, ctx: &Context, request: &Request) -> Result<Body, QueryError> {
        self.run(ctx, request).into_result()
    }

    /// Run each request in order, handing every response to `handler`.
    ///
    /// All requests run even when some fail. Returns an error when any
    /// response was a failure; the details are in the responses.
    pub fn request_with_handler<F>(
        &self,
        ctx: &Context,
        mut handler: F,
        requests: &[Request],
    ) -> Result<(), QueryError>
    where
        F: FnMut(Response),
    {
        let mut failed = false;
        for request in requests {
            let response = self.run(ctx, request);
            failed |= !response.is_success();
            handler(response);
        }
        if failed {
            return Err(QueryError::CompositeFailed {
                status: Status::BATCH.failure(),
            });
        }
        Ok(())
    }

    /// Run `request` to a filled response. Never fails: errors are carried
    /// by the failure response.
    pub fn run(&self, ctx: &Context, request: &Request) -> Response {
        let target = request.target().map(str::to_string);
        match request.kind() {
            RequestKind::Batch(members) => {
                let responses = members.iter().map(|m| self.run(ctx, m)).collect();
                Response::composite(Status::BATCH, target, responses)
            }
            RequestKind::Chain(members) => {
                let mut responses = Vec::with_capacity(members.len());
                for member in members {
                    let response = self.run(ctx, member);
                    let stop = !response.is_success();
                    responses.push(response);
                    if stop {
                        debug!(engine = self.engine, ran = responses.len(), "chain stopped");
                        break;
                    }
                }
                Response::composite(Status::CHAIN, target, responses)
            }
            RequestKind::Intent(_) | RequestKind::Prefab(_) => match self.execute(ctx, request) {
                Ok(body) => request.response_on_success().with_body(body),
                Err(err) => {
                    warn!(engine = self.engine, error = %err, "request failed");
                    request.response_on_error().with_error(err)
                }
            },
        }
    }

    /// Close the native handle if it is open.
    pub fn close(&self, ctx: &Context) -> Result<(), QueryError> {
        let mut connector = self.lock()?;
        if connector.is_open() {
            connector.close(ctx).map_err(QueryError::Connection)?;
            info!(engine = self.engine, "connection closed");
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn Connector>>, QueryError> {
        self.connector.lock().map_err(|_| {
            QueryError::Connection(DbError::Poisoned {
                engine: self.engine,
            })
        })
    }

    fn execute(&self, ctx: &Context, request: &Request) -> Result<Body, QueryError> {
        ctx.check(Stage::Open).map_err(QueryError::Connection)?;
        let mut connector = self.lock()?;
        if !connector.is_open() {
            connector.open(ctx).map_err(QueryError::Connection)?;
            info!(engine = self.engine, "connection opened");
        }

        ctx.check(Stage::Ping).map_err(QueryError::Connection)?;
        connector.ping(ctx).map_err(QueryError::Connection)?;

        ctx.check(Stage::Execute).map_err(QueryError::Connection)?;
        let Statement {
            text,
            args,
            returns_rows,
        } = self.render(request)?;
        debug!(engine = self.engine, statement = %text, args = args.len(), "executing");

        if returns_rows {
            match connector.query(ctx, &text, &args) {
                Ok(rows) => Ok(Body::Result(materialize(
                    rows,
                    request.expected_shape(),
                    self.dialect,
                ))),
                Err(source) => Err(native_error(text, args, source)),
            }
        } else {
            match connector.exec(ctx, &text, &args) {
                Ok(summary) => Ok(Body::Affected(summary)),
                Err(source) => Err(native_error(text, args, source)),
            }
        }
    }

    fn render(&self, request: &Request) -> Result<Statement, QueryError> {
        match request.kind() {
            RequestKind::Prefab(prefab) => {
                let (text, args) = self.dialect.get_prefab(prefab)?;
                Ok(Statement {
                    text,
                    args,
                    returns_rows: true,
                })
            }
            RequestKind::Intent(intent) => {
                let (text, args) = self.dialect.render_intent(intent)?;
                Ok(Statement {
                    text,
                    args,
                    returns_rows: intent.kind() == OperationKind::Read,
                })
            }
            RequestKind::Batch(_) | RequestKind::Chain(_) => Err(QueryError::Construction {
                message: "composite requests have no single statement".to_string(),
            }),
        }
    }
}

/// A statement failure. Cancellation while running stays a connection error.
fn native_error(text: String, args: Vec<Value>, source: DbError) -> QueryError {
    match source {
        DbError::Cancelled { .. } => QueryError::Connection(source),
        source => QueryError::Native { text, args, source },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ExecSummary;
    use crate::dialect::{CozoDialect, PostgresDialect};
    use crate::error::RenderError;
    use crate::query::{count, eq, insert_into, select, update};
    use crate::result::{GenericResult, Shape};
    use crate::test_utils::{Call, CallLog, MockConnector, native_rows};
    use rstest::rstest;

    fn client(mock: MockConnector) -> (Client, CallLog) {
        let log = mock.call_log();
        (Client::new(Box::new(mock), PostgresDialect), log)
    }

    fn calls(log: &CallLog) -> Vec<Call> {
        log.lock().unwrap().clone()
    }

    fn statements(log: &CallLog) -> Vec<Call> {
        calls(log)
            .into_iter()
            .filter(|c| matches!(c, Call::Query(..) | Call::Exec(..)))
            .collect()
    }

    #[rstest]
    fn test_read_runs_full_sequence() {
        let rows = native_rows(&[("name", "text")], vec![vec!["ada".into()], vec!["bob".into()]]);
        let (client, log) = client(MockConnector::new().with_rows(rows));
        let request = select(["name"]).from("users", []).where_clause([eq("id", 1)]).to_request();

        let response = client.run(&Context::background(), &request);

        assert_eq!(response.status(), Status::READ);
        assert_eq!(
            calls(&log),
            vec![
                Call::Open,
                Call::Ping,
                Call::Query("SELECT name FROM users WHERE id = $1".into(), vec![Value::Int(1)]),
            ]
        );
        match response.body() {
            Body::Result(GenericResult::List(list)) => assert_eq!(list.get(1).unwrap(), "bob"),
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[rstest]
    fn test_open_happens_once() {
        let (client, log) = client(MockConnector::new());
        let ctx = Context::background();
        client.run(&ctx, &Request::row_count("t"));
        client.run(&ctx, &Request::row_count("t"));
        let opens = calls(&log).iter().filter(|c| **c == Call::Open).count();
        assert_eq!(opens, 1);
    }

    #[rstest]
    #[case(count("id", "users").to_request(), Shape::Scalar)]
    #[case(select(["id"]).from("users", []).to_request(), Shape::List)]
    #[case(select(["id", "name"]).from("users", []).to_request(), Shape::Table)]
    fn test_should_return_matches_materialized_shape(#[case] request: Request, #[case] shape: Shape) {
        let rows = match shape {
            Shape::Table => native_rows(&[("id", "int4"), ("name", "text")], vec![vec![Value::Int(1), "a".into()]]),
            _ => native_rows(&[("id", "int8")], vec![vec![Value::Int(1)]]),
        };
        let (client, _) = client(MockConnector::new().with_rows(rows));
        let Body::Result(result) = client.request(&Context::background(), &request).unwrap() else {
            panic!("Expected result body");
        };
        assert_eq!(result.shape(), shape);
        assert_eq!(request.expected_shape(), Some(shape));
    }

    #[rstest]
    #[case(insert_into("users").value("id", 1).to_request(), Status::CREATED)]
    #[case(update("users").set("name", "x").to_request(), Status::UPDATED)]
    #[case(Request::raw("VACUUM", vec![]), Status::RAW)]
    fn test_non_reads_take_exec_path(#[case] request: Request, #[case] status: Status) {
        let (client, log) = client(MockConnector::new().with_rows_affected(3));
        let response = client.run(&Context::background(), &request);
        assert_eq!(response.status(), status);
        assert!(matches!(
            response.body(),
            Body::Affected(ExecSummary { rows_affected: Some(3) })
        ));
        assert!(matches!(statements(&log).as_slice(), [Call::Exec(..)]));
    }

    #[rstest]
    fn test_cancel_before_open() {
        let (client, log) = client(MockConnector::new());
        let ctx = Context::background();
        ctx.cancel();

        let response = client.run(&ctx, &Request::row_count("t"));

        assert_eq!(response.code(), -Status::ROW_COUNT.code());
        assert!(matches!(
            response.error(),
            Some(QueryError::Connection(DbError::Cancelled { stage: Stage::Open }))
        ));
        assert!(calls(&log).is_empty());
    }

    #[rstest]
    #[case(Call::Open, Stage::Ping, vec![Call::Open])]
    #[case(Call::Ping, Stage::Execute, vec![Call::Open, Call::Ping])]
    fn test_cancel_between_stages(
        #[case] trigger: Call,
        #[case] stage: Stage,
        #[case] expected_calls: Vec<Call>,
    ) {
        let ctx = Context::background();
        let (client, log) = client(MockConnector::new().cancelling_on(trigger, &ctx));

        let response = client.run(&ctx, &Request::row_count("t"));

        let err = response.error().unwrap();
        assert!(err.is_cancelled());
        match err {
            QueryError::Connection(DbError::Cancelled { stage: observed }) => {
                assert_eq!(*observed, stage)
            }
            other => panic!("Expected cancellation, got {:?}", other),
        }
        assert_eq!(calls(&log), expected_calls);
    }

    #[rstest]
    #[case(Request::row_count("t"), Call::Query(r#"SELECT COUNT(*) FROM "t""#.into(), vec![]))]
    #[case(Request::raw("VACUUM", vec![]), Call::Exec("VACUUM".into(), vec![]))]
    fn test_cancel_while_statement_runs(#[case] request: Request, #[case] statement: Call) {
        let ctx = Context::background();
        let (client, _) = client(MockConnector::new().cancelling_on(statement, &ctx));

        let err = client.request(&ctx, &request).unwrap_err();

        assert!(err.is_cancelled());
        assert!(matches!(
            err,
            QueryError::Connection(DbError::Cancelled { stage: Stage::Execute })
        ));
    }

    #[rstest]
    fn test_expired_deadline_is_cancellation() {
        let (client, log) = client(MockConnector::new());
        let ctx = Context::with_timeout(std::time::Duration::ZERO);
        std::thread::sleep(std::time::Duration::from_millis(1));
        let response = client.run(&ctx, &Request::database_names());
        assert!(response.error().unwrap().is_cancelled());
        assert!(calls(&log).is_empty());
    }

    #[rstest]
    fn test_ping_failure_short_circuits() {
        let (client, log) = client(MockConnector::new().failing_ping());
        let response = client.run(&Context::background(), &Request::row_count("t"));
        assert!(!response.is_success());
        assert!(matches!(
            response.error(),
            Some(QueryError::Connection(DbError::PingFailed { .. }))
        ));
        assert!(statements(&log).is_empty());
    }

    #[rstest]
    fn test_render_failure_short_circuits() {
        let mock = MockConnector::new();
        let log = mock.call_log();
        let client = Client::new(Box::new(mock), CozoDialect);
        let response = client.run(&Context::background(), &update("t").set("a", 1).to_request());
        assert_eq!(response.code(), -Status::UPDATED.code());
        assert!(matches!(
            response.error(),
            Some(QueryError::Render(RenderError::NoTemplate { .. }))
        ));
        assert!(statements(&log).is_empty());
    }

    #[rstest]
    fn test_native_error_keeps_statement() {
        let (client, _) = client(MockConnector::new().failing_statements("relation missing"));
        let err = client
            .request(&Context::background(), &Request::row_count("ghost"))
            .unwrap_err();
        match err {
            QueryError::Native { text, args, source } => {
                assert_eq!(text, r#"SELECT COUNT(*) FROM "ghost""#);
                assert!(args.is_empty());
                assert!(source.to_string().contains("relation missing"));
            }
            other => panic!("Expected native error, got {:?}", other),
        }
    }

    #[rstest]
    fn test_batch_runs_every_member() {
        let (client, log) = client(MockConnector::new());
        let batch = Request::batch(vec![
            Request::raw("SELECT ?", vec![]),
            Request::row_count("a"),
            Request::row_count("b"),
        ])
        .with_target("nightly");

        let response = client.run(&Context::background(), &batch);

        assert_eq!(response.status(), Status::BATCH.failure());
        assert_eq!(response.target(), Some("nightly"));
        assert_eq!(response.members().len(), 3);
        assert!(matches!(
            response.members()[0].error(),
            Some(QueryError::Construction { .. })
        ));
        assert!(response.members()[1].is_success());
        assert_eq!(statements(&log).len(), 2);
    }

    #[rstest]
    fn test_chain_stops_at_first_failure() {
        let (client, log) = client(MockConnector::new());
        let chain = Request::chain(vec![
            Request::row_count("a"),
            Request::raw("SELECT ?", vec![]),
            Request::row_count("c"),
        ]);

        let response = client.run(&Context::background(), &chain);

        assert_eq!(response.code(), -Status::CHAIN.code());
        assert_eq!(response.members().len(), 2);
        assert_eq!(statements(&log).len(), 1);
        assert!(matches!(
            response.into_result(),
            Err(QueryError::Construction { .. })
        ));
    }

    #[rstest]
    fn test_successful_chain() {
        let (client, _) = client(MockConnector::new());
        let chain = Request::chain(vec![Request::row_count("a"), Request::row_count("b")]);
        let response = client.run(&Context::background(), &chain);
        assert_eq!(response.status(), Status::CHAIN);
        assert!(response.members().iter().all(Response::is_success));
    }

    #[rstest]
    fn test_request_with_handler_sees_every_response() {
        let (client, _) = client(MockConnector::new());
        let requests = vec![
            Request::row_count("a").with_target("first"),
            Request::raw("SELECT ?", vec![]).with_target("second"),
            Request::database_names().with_target("third"),
        ];
        let mut seen = Vec::new();
        let result = client.request_with_handler(
            &Context::background(),
            |r| seen.push((r.target().map(str::to_string), r.is_success())),
            &requests,
        );
        assert!(result.is_err());
        assert_eq!(
            seen,
            vec![
                (Some("first".to_string()), true),
                (Some("second".to_string()), false),
                (Some("third".to_string()), true),
            ]
        );
    }

    #[rstest]
    fn test_close_only_when_open() {
        let (client, log) = client(MockConnector::new());
        let ctx = Context::background();
        client.close(&ctx).unwrap();
        assert!(calls(&log).is_empty());

        client.run(&ctx, &Request::row_count("t"));
        client.close(&ctx).unwrap();
        assert_eq!(calls(&log).last(), Some(&Call::Close));
    }

    #[rstest]
    fn test_client_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Client>();
    }
}
