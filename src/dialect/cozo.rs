//! Cozo dialect.
//!
//! Reads render as a single Datalog rule over a stored relation, with query
//! options on their own lines. Inserts use `:put`. Cozo scripts have no
//! positional parameters, so placeholders are named `$p0`, `$p1`, ... and the
//! client binds arg `i` as `p<i>`.
//!
//! Neutral predicates are translated token by token: `=` becomes `==`, `AND`
//! and `OR` become `&&` and `||`, and the minimal negations `!>`/`!<` become
//! `<=`/`>=`. `LIKE` and `IS` have no operator form and are render errors, as
//! are joins, grouping, `HAVING` and `*` projections. `DISTINCT` is accepted
//! and ignored because rule results are already sets. The flip side: a plain
//! select never returns duplicate rows either.

use std::borrow::Cow;

use crate::db::Value;
use crate::db::escape::{Segment, split_literals};
use crate::error::{DecodeError, RenderError};
use crate::query::{DeleteQuery, InsertQuery, OperationKind, SelectQuery, UpdateQuery};
use crate::request::Prefab;

use super::{Dialect, Rendered};

const READ_TEMPLATE: &str = "?[{fields} | count({field})] := *{table}{{bound}}[, {condition}]\n\
[:order [-]{field}, ...]\n[:limit {limit}]\n[:offset {offset}]";
const CREATE_TEMPLATE: &str = "?[{columns}] <- [[{?, ...}]]\n:put {table} {{columns}}";

const NAME: &str = "cozo";

/// Words of the neutral predicate grammar that are never column names.
const KEYWORDS: &[&str] = &["AND", "OR", "NOT", "LIKE", "IS", "NULL", "true", "false"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CozoDialect;

fn unsupported(feature: impl Into<String>) -> RenderError {
    RenderError::Unsupported {
        dialect: NAME,
        feature: feature.into(),
    }
}

/// Re-escape a SQL-style literal (`'o''neil'`) as a Cozo string.
///
/// Backslashes are doubled and a quote becomes `\u0027`, so the literal
/// still holds no bare quote when placeholders are rebound.
fn cozo_literal(literal: &str) -> String {
    let inner = literal
        .strip_prefix('\'')
        .and_then(|l| l.strip_suffix('\''))
        .unwrap_or(literal)
        .replace("''", "'");
    let mut out = String::with_capacity(inner.len() + 2);
    out.push('\'');
    for c in inner.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\u0027"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Rewrite a neutral predicate into Cozo expression syntax.
fn translate_predicate(text: &str) -> Result<String, RenderError> {
    let mut out = String::with_capacity(text.len());
    for segment in split_literals(text) {
        match segment {
            Segment::Literal(literal) => out.push_str(&cozo_literal(literal)),
            Segment::Code(code) => {
                let mut tokens: Vec<Cow<'_, str>> = Vec::new();
                for token in code.split(' ') {
                    let bare = token.trim_matches(|c| c == '(' || c == ')');
                    tokens.push(match bare {
                        "=" => "==".into(),
                        "AND" => "&&".into(),
                        "OR" => "||".into(),
                        "!>" => "<=".into(),
                        "!<" => ">=".into(),
                        // Inlined null literal; `NULL` would be an unbound variable
                        "NULL" => token.replace("NULL", "null").into(),
                        "LIKE" | "IS" | "NOT" => {
                            return Err(unsupported(format!("{bare} predicates")));
                        }
                        _ => token.into(),
                    });
                }
                out.push_str(&tokens.join(" "));
            }
        }
    }
    Ok(out)
}

/// Column names a neutral predicate refers to, in first-use order.
fn predicate_columns(text: &str) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for segment in split_literals(text) {
        let Segment::Code(code) = segment else { continue };
        for token in code.split_whitespace() {
            let word = token.trim_matches(|c| c == '(' || c == ')');
            let starts_like_name = word
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
            if starts_like_name && !KEYWORDS.contains(&word) && !columns.iter().any(|c| c == word) {
                columns.push(word.to_string());
            }
        }
    }
    columns
}

fn push_unique(bound: &mut Vec<String>, name: &str) {
    if !bound.iter().any(|b| b == name) {
        bound.push(name.to_string());
    }
}

impl Dialect for CozoDialect {
    fn name(&self) -> &'static str {
        NAME
    }

    fn get_template(&self, kind: OperationKind) -> &'static str {
        match kind {
            OperationKind::Read => READ_TEMPLATE,
            OperationKind::Create => CREATE_TEMPLATE,
            OperationKind::Update | OperationKind::Delete | OperationKind::Raw => "",
        }
    }

    fn render_select(&self, q: &SelectQuery) -> Result<String, RenderError> {
        if q.is_select_all() {
            return Err(unsupported("* projections"));
        }
        if !q.joins.is_empty() {
            return Err(unsupported("joins"));
        }
        if !q.group_by.is_empty() {
            return Err(unsupported("GROUP BY"));
        }
        if !q.having.is_empty() {
            return Err(unsupported("HAVING"));
        }
        // Query options sort the rule's output, so keys must be in the head
        if let Some(order) = q
            .order_by
            .iter()
            .find(|o| q.count || !q.fields.contains(&o.field))
        {
            return Err(unsupported(format!("ordering by unselected column {}", order.field)));
        }

        let mut bound: Vec<String> = Vec::new();
        for field in &q.fields {
            push_unique(&mut bound, field);
        }
        for column in predicate_columns(&q.where_clause) {
            push_unique(&mut bound, &column);
        }

        let head = if q.count {
            format!("count({})", q.fields.join(", "))
        } else {
            q.fields.join(", ")
        };
        let mut script = format!("?[{}] := *{}{{{}}}", head, q.table, bound.join(", "));
        if !q.where_clause.is_empty() {
            script.push_str(", ");
            script.push_str(&translate_predicate(&q.where_clause)?);
        }

        if !q.order_by.is_empty() {
            let order: Vec<String> = q
                .order_by
                .iter()
                .map(|o| {
                    if o.descending {
                        format!("-{}", o.field)
                    } else {
                        o.field.clone()
                    }
                })
                .collect();
            script.push_str(&format!("\n:order {}", order.join(", ")));
        }
        if let Some(limit) = q.limit {
            script.push_str(&format!("\n:limit {limit}"));
        }
        if let Some(offset) = q.offset {
            script.push_str(&format!("\n:offset {offset}"));
        }
        Ok(script)
    }

    fn render_insert(&self, q: &InsertQuery) -> Result<String, RenderError> {
        let columns = q.columns.join(", ");
        let placeholders = vec!["?"; q.columns.len()].join(", ");
        Ok(format!(
            "?[{columns}] <- [[{placeholders}]]\n:put {} {{{columns}}}",
            q.table
        ))
    }

    fn render_update(&self, _q: &UpdateQuery) -> Result<String, RenderError> {
        Err(RenderError::NoTemplate {
            dialect: NAME,
            kind: OperationKind::Update,
        })
    }

    fn render_delete(&self, _q: &DeleteQuery) -> Result<String, RenderError> {
        Err(RenderError::NoTemplate {
            dialect: NAME,
            kind: OperationKind::Delete,
        })
    }

    fn get_prefab(&self, prefab: &Prefab) -> Result<Rendered, RenderError> {
        match prefab {
            Prefab::TableNames { .. } => Ok(("::relations".to_string(), vec![])),
            Prefab::ColumnNames { table } | Prefab::TableSchema { table } => {
                Ok((format!("::columns {table}"), vec![]))
            }
            Prefab::DatabaseNames | Prefab::RowCount { .. } | Prefab::ColumnType { .. } => {
                Err(RenderError::UnsupportedPrefab {
                    dialect: NAME,
                    prefab: prefab.name(),
                })
            }
        }
    }

    fn render_placeholder(&self, index: usize) -> String {
        format!("$p{index}")
    }

    fn quote(&self, name: &str) -> String {
        name.to_string()
    }

    fn quote_rune(&self) -> Option<char> {
        None
    }

    fn resolve_type(&self, db_type: &str, bytes: &[u8]) -> Result<Value, DecodeError> {
        match db_type {
            "uuid" => uuid::Uuid::from_slice(bytes)
                .map(|u| Value::Str(u.to_string()))
                .map_err(|e| DecodeError::Unresolvable {
                    column_type: db_type.to_string(),
                    len: bytes.len(),
                    message: e.to_string(),
                }),
            "bytes" => Ok(Value::Str(format!("\\x{}", hex::encode(bytes)))),
            "json" => String::from_utf8(bytes.to_vec())
                .map(Value::Str)
                .map_err(|e| DecodeError::Unresolvable {
                    column_type: db_type.to_string(),
                    len: bytes.len(),
                    message: e.to_string(),
                }),
            other => Err(DecodeError::UnsupportedKind {
                value_type: "bytes",
                column_type: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::query::{Join, count, delete_from, eq, gt, insert_into, like, not, null, or, select, select_all, update};
    use crate::request::{Request, RequestKind};
    use rstest::rstest;

    fn render(request: &Request) -> Result<Rendered, QueryError> {
        let RequestKind::Intent(intent) = request.kind() else {
            panic!("Expected intent");
        };
        CozoDialect.render_intent(intent)
    }

    #[rstest]
    fn test_select_binds_filter_columns() {
        let request = select(["name"])
            .from("people", [])
            .where_clause([gt("age", 30)])
            .to_request();
        let (script, args) = render(&request).unwrap();
        assert_eq!(script, "?[name] := *people{name, age}, age > $p0");
        assert_eq!(args, vec![Value::Int(30)]);
    }

    #[rstest]
    fn test_select_options_on_own_lines() {
        let request = select(["id", "name"])
            .from("people", [])
            .order_by_desc("name")
            .order_by("id")
            .limit(5)
            .offset(1)
            .to_request();
        assert_eq!(
            render(&request).unwrap().0,
            "?[id, name] := *people{id, name}\n:order -name, id\n:limit 5\n:offset 1"
        );
    }

    #[rstest]
    fn test_predicate_translation() {
        let request = select(["id"])
            .from("people", [])
            .where_clause([or([eq("name", "a AND b").into(), not(gt("age", 1))])])
            .inline_literals()
            .to_request();
        assert_eq!(
            render(&request).unwrap().0,
            "?[id] := *people{id, name, age}, (name == 'a AND b' || age <= 1)"
        );
    }

    #[rstest]
    #[case("name", Value::from("o'neil"), "name == 'o\\u0027neil'")]
    #[case("path", Value::from("c:\\tmp"), "path == 'c:\\\\tmp'")]
    #[case("name", Value::Null, "name == null")]
    fn test_inline_literal_escaping(#[case] column: &str, #[case] value: Value, #[case] expected: &str) {
        let request = select(["id"])
            .from("people", [])
            .where_clause([eq(column, value)])
            .inline_literals()
            .to_request();
        assert_eq!(
            render(&request).unwrap().0,
            format!("?[id] := *people{{id, {column}}}, {expected}")
        );
    }

    #[rstest]
    fn test_count() {
        let request = count("id", "people").where_clause([eq("age", 3)]).to_request();
        assert_eq!(
            render(&request).unwrap().0,
            "?[count(id)] := *people{id, age}, age == $p0"
        );
    }

    #[rstest]
    fn test_distinct_is_ignored() {
        let request = crate::query::distinct_select(["name"]).from("people", []).to_request();
        assert_eq!(render(&request).unwrap().0, "?[name] := *people{name}");
    }

    #[rstest]
    fn test_insert_puts_row() {
        let request = insert_into("people").value("id", 1).value("name", "ada").to_request();
        assert_eq!(
            render(&request).unwrap().0,
            "?[id, name] <- [[$p0, $p1]]\n:put people {id, name}"
        );
    }

    #[rstest]
    #[case(select_all().from("people", []).to_request())]
    #[case(select(["id"]).from("people", [Join::inner("pets", "pets.owner = people.id")]).to_request())]
    #[case(select(["id"]).from("people", []).group_by(["id"]).to_request())]
    #[case(select(["id"]).from("people", []).where_clause([like("name", "a%")]).to_request())]
    #[case(select(["id"]).from("people", []).where_clause([null("name", true)]).to_request())]
    #[case(select(["id"]).from("people", []).order_by("age").to_request())]
    fn test_unsupported_reads(#[case] request: Request) {
        assert!(matches!(
            render(&request),
            Err(QueryError::Render(RenderError::Unsupported { dialect: "cozo", .. }))
        ));
    }

    #[rstest]
    #[case(update("people").set("name", "x").to_request(), OperationKind::Update)]
    #[case(delete_from("people").to_request(), OperationKind::Delete)]
    fn test_mutations_without_template(#[case] request: Request, #[case] kind: OperationKind) {
        match render(&request) {
            Err(QueryError::Render(RenderError::NoTemplate { dialect, kind: k })) => {
                assert_eq!(dialect, "cozo");
                assert_eq!(k, kind);
            }
            other => panic!("Expected missing template, got {:?}", other),
        }
    }

    #[rstest]
    fn test_raw_keeps_rule_heads() {
        let request = Request::raw("?[x] := x = ?", vec![Value::Int(1)]);
        assert_eq!(render(&request).unwrap().0, "?[x] := x = $p0");
    }

    #[rstest]
    fn test_prefabs() {
        assert_eq!(
            CozoDialect
                .get_prefab(&Prefab::ColumnNames {
                    table: "people".into()
                })
                .unwrap()
                .0,
            "::columns people"
        );
        assert_eq!(
            CozoDialect
                .get_prefab(&Prefab::TableNames {
                    database: String::new()
                })
                .unwrap()
                .0,
            "::relations"
        );
        assert!(matches!(
            CozoDialect.get_prefab(&Prefab::RowCount { table: "people".into() }),
            Err(RenderError::UnsupportedPrefab { prefab: "row_count", .. })
        ));
    }

    #[rstest]
    fn test_resolve_uuid_bytes() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            CozoDialect.resolve_type("uuid", id.as_bytes()).unwrap(),
            Value::from("00000000-0000-0000-0000-000000000000")
        );
        assert!(CozoDialect.resolve_type("vector", &[0]).is_err());
    }

    #[rstest]
    fn test_resolve_json_text() {
        assert_eq!(
            CozoDialect.resolve_type("json", br#"{"k":1}"#).unwrap(),
            Value::from(r#"{"k":1}"#)
        );
        assert!(matches!(
            CozoDialect.resolve_type("json", &[0xff]),
            Err(DecodeError::Unresolvable { .. })
        ));
    }

    #[rstest]
    fn test_identifiers_unquoted() {
        assert_eq!(CozoDialect.quote("people"), "people");
        assert_eq!(CozoDialect.quote_rune(), None);
    }
}
