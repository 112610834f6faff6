use actix::prelude::*;
use rusqlite::types::Value;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::JoblyError;

mod migrate {
    use refinery::embed_migrations;
    embed_migrations!("src/database");
}

/// A result row, keyed by column name.
pub type Row = HashMap<String, Value>;

pub struct Database {
    connection: rusqlite::Connection,
}

impl Database {
    pub fn open(path: &str) -> Result<Self, JoblyError> {
        fs::create_dir_all(&path).map_err(|err| JoblyError::CreateDatabaseDir { source: err })?;

        let database_path = Path::new(path).join("jobly-database.db");
        let connection =
            Connection::open(&database_path).map_err(|err| JoblyError::OpenDatabase {
                path: database_path.display().to_string(),
                source: err,
            })?;

        Self::migrated(connection)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, JoblyError> {
        let connection = Connection::open_in_memory().map_err(|err| JoblyError::OpenDatabase {
            path: ":memory:".to_owned(),
            source: err,
        })?;

        Self::migrated(connection)
    }

    fn migrated(mut connection: Connection) -> Result<Self, JoblyError> {
        register_functions(&connection)
            .map_err(|err| JoblyError::RegisterFunction { source: err })?;

        debug!("Running database migrations");
        migrate::migrations::runner()
            .run(&mut connection)
            .map_err(|err| JoblyError::Migrate { source: err })?;

        Ok(Self { connection })
    }
}

/// `casefold(text)` lowercases with Unicode rules, unlike SQLite's `lower`
/// and `LIKE` which only fold ASCII.
fn register_functions(connection: &Connection) -> rusqlite::Result<()> {
    connection.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

impl Actor for Database {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        debug!("Connected to the database");
    }

    fn stopped(&mut self, _ctx: &mut Context<Self>) {
        debug!("Disconnected from database");
    }
}

#[derive(Debug, PartialEq)]
pub struct Executed {
    pub changes: usize,
    pub last_insert_id: i64,
}

#[derive(Debug, Message)]
#[rtype(result = "rusqlite::Result<Executed>")]
pub struct Execute {
    pub query: String,
    pub params: Vec<Value>,
}

impl Handler<Execute> for Database {
    type Result = rusqlite::Result<Executed>;

    fn handle(&mut self, execute: Execute, _ctx: &mut Context<Self>) -> Self::Result {
        let changes = self
            .connection
            .execute(execute.query.as_str(), execute.params)?;

        Ok(Executed {
            changes,
            last_insert_id: self.connection.last_insert_rowid(),
        })
    }
}

#[derive(Debug, Message)]
#[rtype(result = "rusqlite::Result<Vec<Row>>")]
pub struct Query {
    pub query: String,
    pub params: Vec<Value>,
}

impl Handler<Query> for Database {
    type Result = rusqlite::Result<Vec<Row>>;

    fn handle(&mut self, query: Query, _ctx: &mut Context<Self>) -> Self::Result {
        let mut statement = self.connection.prepare(query.query.as_str())?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let result: rusqlite::Result<Vec<Row>> = statement
            .query_map(query.params, |row| {
                let mut values = Row::with_capacity(columns.len());
                for (index, column) in columns.iter().enumerate() {
                    values.insert(column.clone(), row.get(index)?);
                }
                Ok(values)
            })?
            .collect();

        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[actix_rt::test]
    async fn test_execute_and_query() {
        let database = Database::in_memory().unwrap().start();

        let executed = database
            .send(Execute {
                query: "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ($1, $2, $3, $4)"
                    .to_owned(),
                params: vec![
                    Value::Text("job1".to_owned()),
                    Value::Integer(100),
                    Value::Null,
                    Value::Text("c1".to_owned()),
                ],
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(executed.changes, 1);
        assert_eq!(executed.last_insert_id, 1);

        let rows = database
            .send(Query {
                query: "SELECT id, title, equity FROM jobs WHERE title = $1".to_owned(),
                params: vec![Value::Text("job1".to_owned())],
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
        assert_eq!(rows[0].get("title"), Some(&Value::Text("job1".to_owned())));
        assert_eq!(rows[0].get("equity"), Some(&Value::Null));
    }

    #[actix_rt::test]
    async fn test_casefold_function() {
        let database = Database::in_memory().unwrap().start();

        let rows = database
            .send(Query {
                query: "SELECT casefold($1) AS folded, casefold(NULL) AS missing".to_owned(),
                params: vec![Value::Text("INGÉNIEUR Ölçer".to_owned())],
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            rows[0].get("folded"),
            Some(&Value::Text("ingénieur ölçer".to_owned()))
        );
        assert_eq!(rows[0].get("missing"), Some(&Value::Null));
    }

    #[actix_rt::test]
    async fn test_query_without_rows() {
        let database = Database::in_memory().unwrap().start();

        let rows = database
            .send(Query {
                query: "SELECT id FROM jobs".to_owned(),
                params: vec![],
            })
            .await
            .unwrap()
            .unwrap();

        assert!(rows.is_empty());
    }

    #[actix_rt::test]
    async fn test_storage_fault_is_returned() {
        let database = Database::in_memory().unwrap().start();

        let result = database
            .send(Execute {
                query: "INSERT INTO jobs (title, salary, company_handle) VALUES ($1, $2, $3)"
                    .to_owned(),
                params: vec![
                    Value::Text("job1".to_owned()),
                    Value::Integer(-1),
                    Value::Text("c1".to_owned()),
                ],
            })
            .await
            .unwrap();

        assert!(result.is_err());
    }
}
