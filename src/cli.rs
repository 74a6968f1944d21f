//! CLI argument definitions.
//!
//! Each subcommand maps to exactly one request: prefabs for introspection,
//! a built select for reads, and a raw statement for everything else.

use clap::{Parser, Subcommand};

use crate::db::Value;
use crate::output::OutputFormat;
use crate::query::{distinct_select, select};
use crate::request::Request;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Connection URL (`postgres://...`, `sqlite://path`, `:memory:`).
    /// Falls back to `.crossquery.json`, then DATABASE_URL / COZO_PATH.
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Abort the request after this many milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List databases on the server
    Databases,

    /// List tables
    Tables {
        /// Database (catalog) to list tables of; empty means the connected one
        #[arg(short, long, default_value = "")]
        database: String,
    },

    /// List the columns of a table
    Columns { table: String },

    /// Count the rows of a table
    Count { table: String },

    /// Show name, type, nullability and default of each column
    Schema { table: String },

    /// Show the type of one column
    ColumnType { table: String, column: String },

    /// Read rows from a table
    #[command(after_help = "\
Examples:
  crossquery select people                          # Every column
  crossquery select people -F name -F age -l 10     # Two columns, first 10 rows
  crossquery select people -F name -o age --desc    # Oldest first")]
    Select {
        table: String,

        /// Column to read; repeat for several. Defaults to every column.
        #[arg(short = 'F', long = "field")]
        fields: Vec<String>,

        /// Drop duplicate rows
        #[arg(long, default_value_t = false)]
        distinct: bool,

        #[arg(short, long)]
        limit: Option<u64>,

        #[arg(long)]
        offset: Option<u64>,

        /// Column to order by
        #[arg(short, long)]
        order_by: Option<String>,

        /// Order descending
        #[arg(long, default_value_t = false, requires = "order_by")]
        desc: bool,
    },

    /// Run a raw statement; `?` placeholders bind the given arguments
    Exec {
        statement: String,

        /// Arguments, bound in order. Integers, floats, `true`/`false`
        /// and `null` are recognized; anything else binds as text.
        args: Vec<String>,
    },
}

impl Command {
    /// The request this command runs.
    pub fn to_request(&self) -> Request {
        match self {
            Command::Databases => Request::database_names(),
            Command::Tables { database } => Request::table_names(database.as_str()),
            Command::Columns { table } => Request::column_names(table.as_str()),
            Command::Count { table } => Request::row_count(table.as_str()),
            Command::Schema { table } => Request::table_schema(table.as_str()),
            Command::ColumnType { table, column } => {
                Request::column_type(table.as_str(), column.as_str())
            }
            Command::Select {
                table,
                fields,
                distinct,
                limit,
                offset,
                order_by,
                desc,
            } => {
                let builder = if *distinct {
                    distinct_select(fields.iter().map(String::as_str))
                } else {
                    select(fields.iter().map(String::as_str))
                };
                let mut query = builder.from(table.as_str(), []);
                if let Some(field) = order_by {
                    query = if *desc {
                        query.order_by_desc(field.as_str())
                    } else {
                        query.order_by(field.as_str())
                    };
                }
                if let Some(n) = limit {
                    query = query.limit(*n);
                }
                if let Some(n) = offset {
                    query = query.offset(*n);
                }
                query.to_request_on(table.as_str())
            }
            Command::Exec { statement, args } => {
                Request::raw(statement.as_str(), args.iter().map(|a| parse_arg(a)).collect())
            }
        }
    }
}

/// Parse a command-line argument into the narrowest value it spells.
pub fn parse_arg(arg: &str) -> Value {
    match arg {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => arg
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| arg.parse::<f64>().map(Value::Float))
            .unwrap_or_else(|_| Value::from(arg)),
    }
}
