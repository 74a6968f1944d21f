//! Output formatting for responses.
//!
//! Supports multiple output formats: table (human-readable), JSON, and toon.

use clap::ValueEnum;
use serde::Serialize;

use crate::request::{Body, Response};
use crate::result::Shape;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Token-efficient toon format
    Toon,
}

/// Trait for types that can be formatted for output
pub trait Outputable: Serialize {
    /// Format as a human-readable table
    fn to_table(&self) -> String;

    /// Format according to the specified output format
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => self.to_table(),
            OutputFormat::Json => serde_json::to_string_pretty(self).unwrap_or_default(),
            OutputFormat::Toon => {
                let json_value = serde_json::to_value(self).unwrap_or_default();
                toon::encode(&json_value, None)
            }
        }
    }
}

/// Serializable snapshot of a response, cells already rendered as text.
#[derive(Debug, Serialize)]
pub struct ResponseView {
    pub status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub body: BodyView,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyView {
    Empty,
    Result {
        shape: &'static str,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Affected {
        rows_affected: Option<u64>,
    },
    Responses {
        responses: Vec<ResponseView>,
    },
}

fn shape_name(shape: Shape) -> &'static str {
    match shape {
        Shape::Scalar => "scalar",
        Shape::List => "list",
        Shape::Table => "table",
    }
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        let body = match response.body() {
            Body::Empty => BodyView::Empty,
            Body::Result(result) => BodyView::Result {
                shape: shape_name(result.shape()),
                columns: result.column_names(),
                rows: result.rendered_rows(),
            },
            Body::Affected(summary) => BodyView::Affected {
                rows_affected: summary.rows_affected,
            },
            Body::Responses(members) => BodyView::Responses {
                responses: members.iter().map(ResponseView::from).collect(),
            },
        };
        Self {
            status: response.code(),
            target: response.target().map(str::to_string),
            error: response.error().map(|e| e.to_string()),
            body,
        }
    }
}

impl ResponseView {
    fn table_lines(&self, indent: &str, lines: &mut Vec<String>) {
        let mut header = format!("{indent}Status: {}", self.status);
        if let Some(target) = &self.target {
            header.push_str(&format!(" ({target})"));
        }
        lines.push(header);
        if let Some(error) = &self.error {
            lines.push(format!("{indent}Error: {error}"));
        }

        match &self.body {
            BodyView::Empty => {}
            BodyView::Result { columns, rows, .. } => {
                lines.push(String::new());
                for line in render_grid(columns, rows) {
                    lines.push(format!("{indent}{line}"));
                }
                let noun = if rows.len() == 1 { "row" } else { "rows" };
                lines.push(format!("{indent}({} {noun})", rows.len()));
            }
            BodyView::Affected { rows_affected } => match rows_affected {
                Some(n) => lines.push(format!("{indent}Rows affected: {n}")),
                None => lines.push(format!("{indent}Done")),
            },
            BodyView::Responses { responses } => {
                let nested = format!("{indent}  ");
                for member in responses {
                    lines.push(String::new());
                    member.table_lines(&nested, lines);
                }
            }
        }
    }
}

/// Left-aligned columns sized to their widest cell.
fn render_grid(columns: &[String], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(columns));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(format_row(row));
    }
    lines
}

impl Outputable for ResponseView {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();
        self.table_lines("", &mut lines);
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn result_view() -> ResponseView {
        ResponseView {
            status: 2,
            target: Some("people".into()),
            error: None,
            body: BodyView::Result {
                shape: "table",
                columns: vec!["id".into(), "name".into()],
                rows: vec![vec!["1".into(), "Alice".into()], vec!["20".into(), "Bo".into()]],
            },
        }
    }

    #[rstest]
    fn test_table_format() {
        let expected = "\
Status: 2 (people)

id  name
--  -----
1   Alice
20  Bo
(2 rows)";
        assert_eq!(result_view().to_table(), expected);
    }

    #[rstest]
    fn test_json_format_flattens_body() {
        let json: serde_json::Value =
            serde_json::from_str(&result_view().format(OutputFormat::Json)).unwrap();
        assert_eq!(json["status"], 2);
        assert_eq!(json["kind"], "result");
        assert_eq!(json["shape"], "table");
        assert_eq!(json["rows"][1][1], "Bo");
        assert!(json.get("error").is_none());
    }

    #[rstest]
    fn test_toon_format_not_empty() {
        let output = result_view().format(OutputFormat::Toon);
        assert!(output.contains("Alice"));
    }

    #[rstest]
    fn test_nested_responses_indented() {
        let view = ResponseView {
            status: -20,
            target: None,
            error: None,
            body: BodyView::Responses {
                responses: vec![ResponseView {
                    status: -3,
                    target: None,
                    error: Some("boom".into()),
                    body: BodyView::Empty,
                }],
            },
        };
        assert_eq!(view.to_table(), "Status: -20\n\n  Status: -3\n  Error: boom");
    }

    #[rstest]
    #[case(Some(3), "Rows affected: 3")]
    #[case(None, "Done")]
    fn test_affected(#[case] rows_affected: Option<u64>, #[case] line: &str) {
        let view = ResponseView {
            status: 1,
            target: None,
            error: None,
            body: BodyView::Affected { rows_affected },
        };
        assert_eq!(view.to_table(), format!("Status: 1\n{line}"));
    }
}
