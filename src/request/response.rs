//! Status-coded responses.
//!
//! A `Status` is a signed code: its magnitude names the operation category and
//! its sign the outcome. Positive is success, negative the mirrored failure of
//! the same category, and zero is never produced.

use std::fmt;

use crate::db::ExecSummary;
use crate::error::QueryError;
use crate::result::GenericResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(i32);

impl Status {
    pub const CREATED: Status = Status(1);
    pub const READ: Status = Status(2);
    pub const UPDATED: Status = Status(3);
    pub const DELETED: Status = Status(4);
    pub const RAW: Status = Status(5);

    pub const DATABASE_NAMES: Status = Status(10);
    pub const TABLE_NAMES: Status = Status(11);
    pub const COLUMN_NAMES: Status = Status(12);
    pub const ROW_COUNT: Status = Status(13);
    pub const TABLE_SCHEMA: Status = Status(14);
    pub const COLUMN_TYPE: Status = Status(15);

    pub const BATCH: Status = Status(20);
    pub const CHAIN: Status = Status(21);

    pub const fn code(self) -> i32 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 > 0
    }

    /// The failure code mirroring this category.
    pub const fn failure(self) -> Status {
        Status(-self.0.abs())
    }

    /// The success code of this category.
    pub const fn success(self) -> Status {
        Status(self.0.abs())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload of a response.
#[derive(Debug, Default)]
pub enum Body {
    /// Template not yet filled, or a failure.
    #[default]
    Empty,
    Result(GenericResult),
    Affected(ExecSummary),
    /// Member responses of a batch or chain, in execution order.
    Responses(Vec<Response>),
}

#[derive(Debug)]
pub struct Response {
    status: Status,
    target: Option<String>,
    body: Body,
    error: Option<QueryError>,
}

impl Response {
    /// An unfilled response carrying only status and target.
    pub(crate) fn template(status: Status, target: Option<String>) -> Self {
        Self {
            status,
            target,
            body: Body::Empty,
            error: None,
        }
    }

    /// Aggregate member responses: success only if every member succeeded.
    pub(crate) fn composite(status: Status, target: Option<String>, responses: Vec<Response>) -> Self {
        let ok = responses
            .iter()
            .all(|r| r.error.is_none() && r.status.is_success());
        Self {
            status: if ok { status.success() } else { status.failure() },
            target,
            body: Body::Responses(responses),
            error: None,
        }
    }

    pub(crate) fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub(crate) fn with_error(mut self, error: QueryError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn code(&self) -> i32 {
        self.status.code()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    /// Member responses when this is a batch or chain response.
    pub fn members(&self) -> &[Response] {
        match &self.body {
            Body::Responses(members) => members,
            _ => &[],
        }
    }

    /// The body on success, the error otherwise.
    ///
    /// A failed composite without its own error surfaces the first failing
    /// member's error, looking into nested composites.
    pub fn into_result(self) -> Result<Body, QueryError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.status.is_success() {
            return Ok(self.body);
        }
        match self.body {
            Body::Responses(members) => Err(members
                .into_iter()
                .find_map(|m| m.into_result().err())
                .unwrap_or(QueryError::CompositeFailed { status: self.status })),
            _ => Err(QueryError::CompositeFailed { status: self.status }),
        }
    }
}
