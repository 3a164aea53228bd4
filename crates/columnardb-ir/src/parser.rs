//! SQL front end. The parser itself is treated as an
//! external collaborator: SELECT statements are delegated to the
//! `sqlparser` crate (it already knows how to build a full expression
//! tree), while the handful of DDL/IO statement shapes this pipeline needs
//! to drive DDL precheck are recognized with small dedicated
//! tokenizers, the same way the reference implementation treats its SQL
//! parser as a black box that merely has to produce *a* statement AST.

use columnardb_common::error::{Error, Result};
use columnardb_common::{DataType, Value};
use sqlparser::ast::Query;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// The opaque parser result for a single statement.
#[derive(Debug, Clone)]
pub enum ParsedStatement {
    Select(Box<Query>),
    CreateTable {
        name: String,
        columns: Vec<(String, DataType)>,
        if_not_exists: bool,
    },
    DropTable {
        names: Vec<String>,
        if_exists: bool,
    },
    CreateView {
        name: String,
        query: Box<Query>,
        if_not_exists: bool,
    },
    DropView {
        name: String,
        if_exists: bool,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<Vec<Value>>,
    },
    Import {
        table: String,
        file_path: String,
    },
    Prepare {
        name: String,
        query: Box<Query>,
    },
}

/// Splits a multi-statement script into individual statement texts at
/// top-level semicolons (outside string literals), for the multi-statement
/// pipeline. Each returned string still parses on its own.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut chars = script.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_single_quote = !in_single_quote;
                current.push(c);
            }
            ';' if !in_single_quote => {
                if !current.trim().is_empty() {
                    statements.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }
    statements
}

/// Parses exactly one SQL statement into its opaque AST.
pub fn parse_statement(sql: &str) -> Result<ParsedStatement> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(Error::parse_error(0, "", "empty statement"));
    }

    let upper = trimmed.to_uppercase();
    if upper.starts_with("CREATE TABLE") {
        return parse_create_table(trimmed);
    }
    if upper.starts_with("DROP TABLE") {
        return parse_drop_table(trimmed);
    }
    if upper.starts_with("CREATE VIEW") || upper.starts_with("CREATE OR REPLACE VIEW") {
        return parse_create_view(trimmed);
    }
    if upper.starts_with("DROP VIEW") {
        return parse_drop_view(trimmed);
    }
    if upper.starts_with("INSERT INTO") {
        return parse_insert(trimmed);
    }
    if upper.starts_with("IMPORT") {
        return parse_import(trimmed);
    }
    if upper.starts_with("PREPARE") {
        return parse_prepare(trimmed);
    }

    let dialect = GenericDialect {};
    let mut statements = Parser::parse_sql(&dialect, trimmed)
        .map_err(|e| Error::parse_error(0, trimmed, e.to_string()))?;
    if statements.len() != 1 {
        return Err(Error::parse_error(
            0,
            trimmed,
            "expected exactly one SQL statement",
        ));
    }
    match statements.remove(0) {
        sqlparser::ast::Statement::Query(q) => Ok(ParsedStatement::Select(q)),
        other => Err(Error::parse_error(
            0,
            trimmed,
            format!("unsupported statement: {other}"),
        )),
    }
}

fn parse_query_fragment(sql: &str) -> Result<Box<Query>> {
    let dialect = GenericDialect {};
    let mut statements = Parser::parse_sql(&dialect, sql)
        .map_err(|e| Error::parse_error(0, sql, e.to_string()))?;
    if statements.len() != 1 {
        return Err(Error::parse_error(0, sql, "expected exactly one query"));
    }
    match statements.remove(0) {
        sqlparser::ast::Statement::Query(q) => Ok(q),
        other => Err(Error::parse_error(0, sql, format!("expected a query, got {other}"))),
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(s[prefix.len()..].trim_start())
    } else {
        None
    }
}

fn parse_create_table(sql: &str) -> Result<ParsedStatement> {
    let mut rest = strip_prefix_ci(sql, "CREATE TABLE")
        .ok_or_else(|| Error::parse_error(0, sql, "malformed CREATE TABLE"))?;
    let if_not_exists = if let Some(r) = strip_prefix_ci(rest, "IF NOT EXISTS") {
        rest = r;
        true
    } else {
        false
    };
    let open = rest
        .find('(')
        .ok_or_else(|| Error::parse_error(0, sql, "CREATE TABLE missing column list"))?;
    let name = rest[..open].trim().trim_end_matches(';').to_string();
    let close = rest
        .rfind(')')
        .ok_or_else(|| Error::parse_error(0, sql, "CREATE TABLE missing closing paren"))?;
    let body = &rest[open + 1..close];
    let mut columns = Vec::new();
    for col_def in body.split(',') {
        let col_def = col_def.trim();
        if col_def.is_empty() {
            continue;
        }
        let mut parts = col_def.split_whitespace();
        let col_name = parts
            .next()
            .ok_or_else(|| Error::parse_error(0, sql, "empty column definition"))?
            .to_string();
        let type_name = parts.next().unwrap_or("STRING");
        columns.push((col_name, parse_data_type(type_name)));
    }
    Ok(ParsedStatement::CreateTable {
        name,
        columns,
        if_not_exists,
    })
}

fn parse_data_type(name: &str) -> DataType {
    match name.to_uppercase().as_str() {
        "INT" | "INTEGER" | "INT64" | "BIGINT" => DataType::Int64,
        "FLOAT" | "FLOAT64" | "DOUBLE" | "REAL" => DataType::Float64,
        "BOOL" | "BOOLEAN" => DataType::Boolean,
        _ => DataType::String,
    }
}

fn parse_drop_table(sql: &str) -> Result<ParsedStatement> {
    let mut rest = strip_prefix_ci(sql, "DROP TABLE")
        .ok_or_else(|| Error::parse_error(0, sql, "malformed DROP TABLE"))?;
    let if_exists = if let Some(r) = strip_prefix_ci(rest, "IF EXISTS") {
        rest = r;
        true
    } else {
        false
    };
    let names = rest
        .trim_end_matches(';')
        .split(',')
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    Ok(ParsedStatement::DropTable { names, if_exists })
}

fn parse_create_view(sql: &str) -> Result<ParsedStatement> {
    let rest = strip_prefix_ci(sql, "CREATE OR REPLACE VIEW")
        .or_else(|| strip_prefix_ci(sql, "CREATE VIEW"))
        .ok_or_else(|| Error::parse_error(0, sql, "malformed CREATE VIEW"))?;
    let (mut rest, if_not_exists) = match strip_prefix_ci(rest, "IF NOT EXISTS") {
        Some(r) => (r, true),
        None => (rest, false),
    };
    let as_pos = find_keyword(rest, "AS")
        .ok_or_else(|| Error::parse_error(0, sql, "CREATE VIEW missing AS"))?;
    let name = rest[..as_pos].trim().to_string();
    rest = &rest[as_pos + 2..];
    let query = parse_query_fragment(rest.trim().trim_end_matches(';'))?;
    Ok(ParsedStatement::CreateView {
        name,
        query,
        if_not_exists,
    })
}

fn parse_drop_view(sql: &str) -> Result<ParsedStatement> {
    let mut rest = strip_prefix_ci(sql, "DROP VIEW")
        .ok_or_else(|| Error::parse_error(0, sql, "malformed DROP VIEW"))?;
    let if_exists = if let Some(r) = strip_prefix_ci(rest, "IF EXISTS") {
        rest = r;
        true
    } else {
        false
    };
    let name = rest.trim().trim_end_matches(';').to_string();
    Ok(ParsedStatement::DropView { name, if_exists })
}

fn parse_insert(sql: &str) -> Result<ParsedStatement> {
    let rest = strip_prefix_ci(sql, "INSERT INTO")
        .ok_or_else(|| Error::parse_error(0, sql, "malformed INSERT"))?;
    let values_pos = find_keyword(rest, "VALUES")
        .ok_or_else(|| Error::parse_error(0, sql, "INSERT missing VALUES"))?;
    let head = rest[..values_pos].trim();
    let (table, columns) = if let Some(open) = head.find('(') {
        let close = head
            .rfind(')')
            .ok_or_else(|| Error::parse_error(0, sql, "INSERT missing closing paren"))?;
        let table = head[..open].trim().to_string();
        let columns = head[open + 1..close]
            .split(',')
            .map(|c| c.trim().to_string())
            .collect();
        (table, columns)
    } else {
        (head.to_string(), Vec::new())
    };

    let values_body = rest[values_pos + "VALUES".len()..]
        .trim()
        .trim_end_matches(';')
        .trim();
    let mut rows = Vec::new();
    for group in split_top_level_groups(values_body) {
        let inner = group.trim_start_matches('(').trim_end_matches(')');
        let row: Vec<Value> = inner.split(',').map(|v| parse_literal(v.trim())).collect();
        rows.push(row);
    }
    Ok(ParsedStatement::Insert {
        table,
        columns,
        values: rows,
    })
}

fn split_top_level_groups(s: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in s.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(st) = start {
                        groups.push(&s[st..=i]);
                    }
                }
            }
            _ => {}
        }
    }
    groups
}

fn parse_literal(token: &str) -> Value {
    if token.eq_ignore_ascii_case("NULL") {
        return Value::Null;
    }
    if token.eq_ignore_ascii_case("TRUE") {
        return Value::Boolean(true);
    }
    if token.eq_ignore_ascii_case("FALSE") {
        return Value::Boolean(false);
    }
    if token.starts_with('\'') && token.ends_with('\'') && token.len() >= 2 {
        return Value::String(token[1..token.len() - 1].to_string());
    }
    if let Ok(i) = token.parse::<i64>() {
        return Value::Int64(i);
    }
    if let Ok(f) = token.parse::<f64>() {
        return Value::Float64(f);
    }
    Value::String(token.to_string())
}

fn parse_import(sql: &str) -> Result<ParsedStatement> {
    let rest = strip_prefix_ci(sql, "IMPORT FROM")
        .ok_or_else(|| Error::parse_error(0, sql, "malformed IMPORT, expected IMPORT FROM"))?;
    let into_pos = find_keyword(rest, "INTO")
        .ok_or_else(|| Error::parse_error(0, sql, "IMPORT missing INTO"))?;
    let file_token = rest[..into_pos].trim();
    let file_path = file_token.trim_matches('\'').to_string();
    let table = rest[into_pos + "INTO".len()..]
        .trim()
        .trim_end_matches(';')
        .to_string();
    Ok(ParsedStatement::Import { table, file_path })
}

fn parse_prepare(sql: &str) -> Result<ParsedStatement> {
    let rest = strip_prefix_ci(sql, "PREPARE")
        .ok_or_else(|| Error::parse_error(0, sql, "malformed PREPARE"))?;
    let as_pos = find_keyword(rest, "AS")
        .ok_or_else(|| Error::parse_error(0, sql, "PREPARE missing AS"))?;
    let name = rest[..as_pos].trim().to_string();
    let query = parse_query_fragment(rest[as_pos + 2..].trim().trim_end_matches(';'))?;
    Ok(ParsedStatement::Prepare { name, query })
}

/// Finds a whole-word, case-insensitive keyword outside of quotes/parens.
fn find_keyword(s: &str, keyword: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let kw_upper = keyword.to_uppercase();
    let upper = s.to_uppercase();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut i = 0;
    while i + kw_upper.len() <= upper.len() {
        match bytes[i] as char {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth -= 1,
            _ => {}
        }
        if !in_quote
            && depth == 0
            && upper[i..].starts_with(&kw_upper)
            && (i == 0 || !upper.as_bytes()[i - 1].is_ascii_alphanumeric())
            && (i + kw_upper.len() == upper.len()
                || !upper.as_bytes()[i + kw_upper.len()].is_ascii_alphanumeric())
        {
            return Some(i);
        }
        i += 1;
    }
    None
}
