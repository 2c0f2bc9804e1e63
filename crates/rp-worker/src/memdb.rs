//! Reference in-memory backend
//!
//! Real database backends live outside this repository; they plug in
//! through the same `CommandTable`. This backend reproduces the
//! protocol-visible state machine of a real driver - connect before
//! execute, one statement in flight at a time, rows read one per
//! request - against a trivial statement evaluator, so the dispatch
//! loop can be exercised end to end without a database library.

use std::collections::VecDeque;

use rp_protocol::Value;

use crate::dispatch::{CommandTable, Outcome};
use crate::reply;

/// In-memory backend state, threaded through the dispatch loop.
///
/// Owned by the handlers across loop iterations; the loop itself
/// never touches it.
#[derive(Debug, Default)]
pub struct MemDb {
    connection: Option<Connection>,
}

#[derive(Debug)]
struct Connection {
    dbname: String,
    statement: Option<Statement>,
}

/// An executing statement with rows not yet read
#[derive(Debug)]
struct Statement {
    rows: VecDeque<Vec<Value>>,
}

impl MemDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command table wiring this backend's handlers
    pub fn command_table() -> CommandTable<MemDb> {
        CommandTable::new()
            .register("connect", cmd_connect)
            .register("disconnect", cmd_disconnect)
            .register("execute", cmd_execute)
            .register("read-row", cmd_read_row)
    }

    /// Name of the connected database, if any
    pub fn connected_dbname(&self) -> Option<&str> {
        self.connection
            .as_ref()
            .map(|connection| connection.dbname.as_str())
    }

    /// Advance the current statement by one row.
    ///
    /// `(ok row <columns>...)` while rows remain; `(ok)` finishes the
    /// statement. Mirrors a stepping cursor: completion is only
    /// observed on the step after the last row.
    fn step(&mut self) -> Value {
        let connection = match self.connection.as_mut() {
            Some(connection) => connection,
            None => return reply::error("state", "not connected to database"),
        };
        let statement = match connection.statement.as_mut() {
            Some(statement) => statement,
            None => return reply::error("state", "not executing a statement"),
        };
        match statement.rows.pop_front() {
            Some(columns) => {
                let mut payload = vec![Value::symbol("row")];
                payload.extend(columns);
                reply::ok_with(payload)
            }
            None => {
                connection.statement = None;
                reply::ok()
            }
        }
    }
}

fn cmd_connect(db: &mut MemDb, args: &Value) -> Outcome {
    Outcome::Reply(connect(db, args))
}

fn connect(db: &mut MemDb, args: &Value) -> Value {
    // Options arrive as an alternating symbol/string property list
    let len = args.list_len();
    if len % 2 != 0 || (len == 0 && !args.is_null()) {
        return reply::error("args", "odd number of args");
    }
    let options: Vec<&Value> = args.list_iter().collect();

    let mut dbname = None;
    for option in options.chunks(2) {
        let (name, value) = (option[0], option[1]);
        if !name.is_symbol() {
            return reply::error("args", "option name is not a symbol");
        }
        if !value.is_string() {
            return reply::error("args", "option value is not a string");
        }
        if name.is_symbol_named("dbname") {
            dbname = match value.as_utf8() {
                Some(text) => Some(text.to_string()),
                None => return reply::error("args", "dbname is not valid text"),
            };
        } else {
            return reply::error("args", "no such database option");
        }
    }
    let dbname = match dbname {
        Some(dbname) => dbname,
        None => return reply::error("args", "dbname option not given"),
    };
    if db.connection.is_some() {
        return reply::error("state", "already connected");
    }
    tracing::info!(%dbname, "connected");
    db.connection = Some(Connection {
        dbname,
        statement: None,
    });
    reply::ok()
}

fn cmd_disconnect(db: &mut MemDb, args: &Value) -> Outcome {
    if args.list_len() != 0 || !args.is_null() {
        return Outcome::Reply(reply::error("args", "wrong number of args"));
    }
    db.connection = None;
    tracing::info!("disconnecting");
    Outcome::Quit(reply::ok())
}

fn cmd_execute(db: &mut MemDb, args: &Value) -> Outcome {
    Outcome::Reply(execute(db, args))
}

fn execute(db: &mut MemDb, args: &Value) -> Value {
    if let Some(connection) = db.connection.as_ref() {
        if connection.statement.is_some() {
            return reply::error("state", "not finished executing another statement");
        }
    }
    if args.list_len() != 1 {
        return reply::error("args", "wrong number of args");
    }
    let sql = match args.list_ref(0) {
        Some(value) if value.is_string() => value,
        _ => return reply::error("args", "SQL query is not a string"),
    };
    let sql = match sql.as_utf8() {
        Some(sql) => sql,
        None => return reply::error("args", "SQL query is not valid text"),
    };
    let connection = match db.connection.as_mut() {
        Some(connection) => connection,
        None => return reply::error("state", "not connected to database"),
    };
    let rows = match evaluate(sql) {
        Ok(rows) => rows,
        Err(message) => return reply::error("database", &message),
    };
    tracing::debug!(sql, rows = rows.len(), "statement prepared");
    connection.statement = Some(Statement { rows });
    db.step()
}

fn cmd_read_row(db: &mut MemDb, args: &Value) -> Outcome {
    if args.list_len() != 0 || !args.is_null() {
        return Outcome::Reply(reply::error("args", "wrong number of args"));
    }
    Outcome::Reply(db.step())
}

/// Evaluate the one statement form the backend understands:
/// `SELECT <literal>, <literal>, ...` producing a single row.
fn evaluate(sql: &str) -> Result<VecDeque<Vec<Value>>, String> {
    let trimmed = sql.trim().trim_end_matches(';');
    let rest = trimmed
        .strip_prefix("SELECT ")
        .or_else(|| trimmed.strip_prefix("select "))
        .ok_or_else(|| "cannot prepare statement".to_string())?;

    let mut columns = Vec::new();
    for item in rest.split(',') {
        columns.push(literal(item.trim())?);
    }
    let mut rows = VecDeque::new();
    rows.push_back(columns);
    Ok(rows)
}

fn literal(text: &str) -> Result<Value, String> {
    if text.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }
    if let Ok(number) = text.parse::<i64>() {
        return Ok(Value::Int(number));
    }
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        return Ok(Value::string(&text[1..text.len() - 1]));
    }
    Err(format!("cannot evaluate expression: {}", text))
}
