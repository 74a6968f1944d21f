//! Per-engine rendering.
//!
//! A dialect turns intents and prefabs into statement text and positional
//! args, quotes identifiers, and resolves byte payloads the driver could not
//! decode. Dialects hold no connection state: one instance serves any number
//! of executions, and `AnyDialect` is `Copy` so results can keep one for lazy
//! cell decoding.
//!
//! Rendering is explicit per operation. `get_template` names the statement
//! shape each operation kind renders to, and an empty template marks the kind
//! as unsupported by the engine.

pub mod cozo;
pub mod postgres;

pub use cozo::CozoDialect;
pub use postgres::PostgresDialect;

use std::fmt::Debug;

use enum_dispatch::enum_dispatch;

use crate::db::Value;
use crate::db::escape::{Segment, split_literals};
use crate::error::{DecodeError, QueryError, RenderError};
use crate::query::{
    DeleteQuery, InsertQuery, Operation, OperationKind, SelectQuery, UpdateQuery,
};
use crate::request::{Intent, Prefab};

/// Statement text plus the args bound to its placeholders.
pub type Rendered = (String, Vec<Value>);

#[enum_dispatch]
pub trait Dialect: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Statement shape for `kind`, empty when the engine has none.
    fn get_template(&self, kind: OperationKind) -> &'static str;

    fn render_select(&self, query: &SelectQuery) -> Result<String, RenderError>;

    fn render_insert(&self, query: &InsertQuery) -> Result<String, RenderError>;

    fn render_update(&self, query: &UpdateQuery) -> Result<String, RenderError>;

    fn render_delete(&self, query: &DeleteQuery) -> Result<String, RenderError>;

    /// Final text and args for a prefab lookup.
    fn get_prefab(&self, prefab: &Prefab) -> Result<Rendered, RenderError>;

    /// Placeholder for the zero-based arg `index`.
    fn render_placeholder(&self, index: usize) -> String;

    fn quote(&self, name: &str) -> String;

    fn quote_rune(&self) -> Option<char>;

    /// Decode a byte payload tagged with the engine type `db_type`.
    fn resolve_type(&self, db_type: &str, bytes: &[u8]) -> Result<Value, DecodeError>;

    /// Render an intent into final text and args.
    ///
    /// Neutral `?` placeholders are rebound to the engine's syntax; their
    /// count must equal the number of args.
    fn render_intent(&self, intent: &Intent) -> Result<Rendered, QueryError> {
        let kind = intent.kind();
        if kind != OperationKind::Raw && self.get_template(kind).is_empty() {
            return Err(RenderError::NoTemplate {
                dialect: self.name(),
                kind,
            }
            .into());
        }

        let neutral = match intent.operation() {
            Operation::Select(q) => {
                require_table(&q.table)?;
                self.render_select(q)?
            }
            Operation::Insert(q) => {
                require_table(&q.table)?;
                if q.columns.is_empty() {
                    return Err(construction("insert without columns"));
                }
                self.render_insert(q)?
            }
            Operation::Update(q) => {
                require_table(&q.table)?;
                if q.columns.is_empty() {
                    return Err(construction("update without assignments"));
                }
                self.render_update(q)?
            }
            Operation::Delete(q) => {
                require_table(&q.table)?;
                self.render_delete(q)?
            }
            Operation::Raw(r) => r.text.clone(),
        };

        let (text, placeholders) = rebind(neutral.trim(), |i| self.render_placeholder(i));
        if placeholders != intent.args().len() {
            return Err(QueryError::Construction {
                message: format!(
                    "{} placeholders but {} args",
                    placeholders,
                    intent.args().len()
                ),
            });
        }
        Ok((text, intent.args().to_vec()))
    }
}

#[enum_dispatch(Dialect)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyDialect {
    PostgresDialect,
    CozoDialect,
}

fn require_table(table: &str) -> Result<(), QueryError> {
    if table.trim().is_empty() {
        return Err(construction("missing source table"));
    }
    Ok(())
}

fn construction(message: &str) -> QueryError {
    QueryError::Construction {
        message: message.to_string(),
    }
}

/// Replace neutral `?` placeholders outside quoted literals, numbering them
/// from zero. A `?` that opens a bracket (`?[`) is a rule head, not a
/// placeholder.
///
/// Returns the rewritten text and the number of placeholders replaced.
pub fn rebind(text: &str, placeholder: impl Fn(usize) -> String) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut count = 0;
    for segment in split_literals(text) {
        match segment {
            Segment::Literal(literal) => out.push_str(literal),
            Segment::Code(code) => {
                let mut chars = code.chars().peekable();
                while let Some(c) = chars.next() {
                    if c == '?' && chars.peek() != Some(&'[') {
                        out.push_str(&placeholder(count));
                        count += 1;
                    } else {
                        out.push(c);
                    }
                }
            }
        }
    }
    (out, count)
}
