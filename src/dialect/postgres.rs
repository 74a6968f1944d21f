//! PostgreSQL dialect.

use crate::db::Value;
use crate::db::escape::quote_identifier;
use crate::error::{DecodeError, RenderError};
use crate::query::{DeleteQuery, InsertQuery, OperationKind, SelectQuery, UpdateQuery};
use crate::request::Prefab;

use super::{Dialect, Rendered};

const READ_TEMPLATE: &str = "SELECT [DISTINCT ]{COUNT(fields) | fields} FROM {table}[ {kind} JOIN {target} ON {condition}]... \
[ WHERE {where}][ GROUP BY {group_by}][ HAVING {having}][ ORDER BY {field} [DESC], ...][ LIMIT {limit}][ OFFSET {offset}]";
const CREATE_TEMPLATE: &str = "INSERT INTO {table} ({columns}) VALUES ({?, ...})";
const UPDATE_TEMPLATE: &str = "UPDATE {table} SET {column} = ?, ...[ WHERE {where}]";
const DELETE_TEMPLATE: &str = "DELETE FROM {table}[ WHERE {where}]";

const TEXT_TYPES: &[&str] = &["text", "varchar", "bpchar", "char", "name", "citext", "unknown", "xml"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn get_template(&self, kind: OperationKind) -> &'static str {
        match kind {
            OperationKind::Read => READ_TEMPLATE,
            OperationKind::Create => CREATE_TEMPLATE,
            OperationKind::Update => UPDATE_TEMPLATE,
            OperationKind::Delete => DELETE_TEMPLATE,
            OperationKind::Raw => "",
        }
    }

    fn render_select(&self, q: &SelectQuery) -> Result<String, RenderError> {
        let mut sql = String::from("SELECT ");
        if q.distinct {
            sql.push_str("DISTINCT ");
        }
        let fields = q.fields.join(", ");
        if q.count {
            sql.push_str(&format!("COUNT({fields})"));
        } else {
            sql.push_str(&fields);
        }
        sql.push_str(" FROM ");
        sql.push_str(&q.table);

        for join in &q.joins {
            sql.push_str(&format!(
                " {} JOIN {} ON {}",
                join.kind.as_str(),
                join.target,
                join.condition
            ));
        }
        if !q.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&q.where_clause);
        }
        if !q.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&q.group_by.join(", "));
        }
        if !q.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&q.having);
        }
        if !q.order_by.is_empty() {
            let order: Vec<String> = q
                .order_by
                .iter()
                .map(|o| {
                    if o.descending {
                        format!("{} DESC", o.field)
                    } else {
                        o.field.clone()
                    }
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        if let Some(limit) = q.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = q.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(sql)
    }

    fn render_insert(&self, q: &InsertQuery) -> Result<String, RenderError> {
        let placeholders = vec!["?"; q.columns.len()].join(", ");
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            q.table,
            q.columns.join(", "),
            placeholders
        ))
    }

    fn render_update(&self, q: &UpdateQuery) -> Result<String, RenderError> {
        let assignments: Vec<String> = q.columns.iter().map(|c| format!("{c} = ?")).collect();
        let mut sql = format!("UPDATE {} SET {}", q.table, assignments.join(", "));
        if !q.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&q.where_clause);
        }
        Ok(sql)
    }

    fn render_delete(&self, q: &DeleteQuery) -> Result<String, RenderError> {
        let mut sql = format!("DELETE FROM {}", q.table);
        if !q.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&q.where_clause);
        }
        Ok(sql)
    }

    fn get_prefab(&self, prefab: &Prefab) -> Result<Rendered, RenderError> {
        let rendered = match prefab {
            Prefab::DatabaseNames => (
                "SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname"
                    .to_string(),
                vec![],
            ),
            Prefab::TableNames { database } => {
                // No database named: the one this connection is on
                let (catalog, args) = if database.is_empty() {
                    ("current_database()", vec![])
                } else {
                    ("$1", vec![Value::from(database.as_str())])
                };
                (
                    format!(
                        "SELECT table_name FROM information_schema.tables \
                         WHERE table_catalog = {catalog} \
                         AND table_schema NOT IN ('pg_catalog', 'information_schema') \
                         ORDER BY table_name"
                    ),
                    args,
                )
            }
            Prefab::ColumnNames { table } => (
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_name = $1 ORDER BY ordinal_position"
                    .to_string(),
                vec![Value::from(table.as_str())],
            ),
            Prefab::RowCount { table } => (
                format!("SELECT COUNT(*) FROM {}", self.quote(table)),
                vec![],
            ),
            Prefab::TableSchema { table } => (
                "SELECT column_name, data_type, is_nullable, column_default \
                 FROM information_schema.columns WHERE table_name = $1 ORDER BY ordinal_position"
                    .to_string(),
                vec![Value::from(table.as_str())],
            ),
            Prefab::ColumnType { table, column } => (
                "SELECT data_type FROM information_schema.columns \
                 WHERE table_name = $1 AND column_name = $2"
                    .to_string(),
                vec![Value::from(table.as_str()), Value::from(column.as_str())],
            ),
        };
        Ok(rendered)
    }

    fn render_placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn quote(&self, name: &str) -> String {
        quote_identifier(name, '"')
    }

    fn quote_rune(&self) -> Option<char> {
        Some('"')
    }

    fn resolve_type(&self, db_type: &str, bytes: &[u8]) -> Result<Value, DecodeError> {
        let unresolvable = |message: String| DecodeError::Unresolvable {
            column_type: db_type.to_string(),
            len: bytes.len(),
            message,
        };

        match db_type {
            "uuid" => uuid::Uuid::from_slice(bytes)
                .map(|u| Value::Str(u.to_string()))
                .map_err(|e| unresolvable(e.to_string())),
            "json" => decode_json(bytes).map_err(unresolvable),
            // jsonb binary format: one version byte, then JSON text
            "jsonb" => match bytes.split_first() {
                Some((1, rest)) => decode_json(rest).map_err(unresolvable),
                Some((version, _)) => Err(unresolvable(format!("unknown jsonb version {version}"))),
                None => Err(unresolvable("empty jsonb payload".to_string())),
            },
            "bytea" => Ok(Value::Str(format!("\\x{}", hex::encode(bytes)))),
            t if TEXT_TYPES.contains(&t) => String::from_utf8(bytes.to_vec())
                .map(Value::Str)
                .map_err(|e| unresolvable(e.to_string())),
            other => Err(DecodeError::UnsupportedKind {
                value_type: "bytes",
                column_type: other.to_string(),
            }),
        }
    }
}

/// JSON documents are shown as their compact text.
fn decode_json(bytes: &[u8]) -> Result<Value, String> {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .map(|doc| Value::Str(doc.to_string()))
        .map_err(|e| e.to_string())
}
