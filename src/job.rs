use actix::prelude::*;
use rusqlite::types::Value;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::convert::TryFrom;

use crate::database::{Execute, Executed, Query, Row};
use crate::errors::JoblyError;
use crate::sql::{self, Field};

pub mod query;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub salary: Option<i64>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

impl TryFrom<Row> for Job {
    type Error = JoblyError;

    fn try_from(mut row: Row) -> Result<Self, Self::Error> {
        Ok(Job {
            id: integer(&mut row, "id")?.ok_or_else(|| decode_error("id"))?,
            title: text(&mut row, "title")?,
            salary: integer(&mut row, "salary")?,
            equity: real(&mut row, "equity")?,
            company_handle: text(&mut row, "company_handle")?,
        })
    }
}

fn decode_error(column: &str) -> JoblyError {
    JoblyError::DecodeRow {
        column: column.to_owned(),
    }
}

fn integer(row: &mut Row, column: &str) -> Result<Option<i64>, JoblyError> {
    match row.remove(column) {
        Some(Value::Integer(value)) => Ok(Some(value)),
        Some(Value::Null) => Ok(None),
        _ => Err(decode_error(column)),
    }
}

fn real(row: &mut Row, column: &str) -> Result<Option<f64>, JoblyError> {
    match row.remove(column) {
        Some(Value::Real(value)) => Ok(Some(value)),
        Some(Value::Integer(value)) => Ok(Some(value as f64)),
        Some(Value::Null) => Ok(None),
        _ => Err(decode_error(column)),
    }
}

fn text(row: &mut Row, column: &str) -> Result<String, JoblyError> {
    match row.remove(column) {
        Some(Value::Text(value)) => Ok(value),
        _ => Err(decode_error(column)),
    }
}

/// Payload to create a job. `company_handle` can't be changed afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i64>,
    #[serde(default, deserialize_with = "equity_value")]
    pub equity: Option<f64>,
    #[serde(alias = "companyHandle")]
    pub company_handle: String,
}

impl NewJob {
    pub fn validate(&self) -> Result<(), JoblyError> {
        if self.title.is_empty() {
            return Err(JoblyError::validation("title must not be empty"));
        }
        if self.company_handle.is_empty() {
            return Err(JoblyError::validation("company_handle must not be empty"));
        }
        if let Some(salary) = self.salary {
            check_salary(salary)?;
        }
        if let Some(equity) = self.equity {
            check_equity(equity)?;
        }

        Ok(())
    }
}

/// Equity arrives either as a JSON number or as a numeric string.
fn equity_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Equity {
        Number(f64),
        Text(String),
    }

    match Option::<Equity>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Equity::Number(equity)) => Ok(Some(equity)),
        Some(Equity::Text(equity)) => equity
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom("equity must be a number")),
    }
}

fn check_salary(salary: i64) -> Result<i64, JoblyError> {
    if salary < 0 {
        return Err(JoblyError::validation("salary must not be negative"));
    }
    Ok(salary)
}

fn check_equity(equity: f64) -> Result<f64, JoblyError> {
    if !(0.0..=1.0).contains(&equity) {
        return Err(JoblyError::validation("equity must be between 0 and 1"));
    }
    Ok(equity)
}

/// Fields of a job that can be changed after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobField {
    Title,
    Salary,
    Equity,
}

impl JobField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(JobField::Title),
            "salary" => Some(JobField::Salary),
            "equity" => Some(JobField::Equity),
            _ => None,
        }
    }

    fn value(self, json: serde_json::Value) -> Result<Value, JoblyError> {
        use serde_json::Value as Json;

        match (self, json) {
            (JobField::Title, Json::String(title)) if !title.is_empty() => Ok(Value::Text(title)),
            (JobField::Title, _) => Err(JoblyError::validation(
                "title must be a non-empty string",
            )),

            (JobField::Salary, Json::Null) => Ok(Value::Null),
            (JobField::Salary, Json::Number(number)) if number.is_i64() || number.is_u64() => {
                let salary = number
                    .as_i64()
                    .ok_or_else(|| JoblyError::validation("salary is too large"))?;
                check_salary(salary).map(Value::Integer)
            }
            (JobField::Salary, _) => Err(JoblyError::validation(
                "salary must be a non-negative integer or null",
            )),

            (JobField::Equity, Json::Null) => Ok(Value::Null),
            (JobField::Equity, Json::Number(number)) => number
                .as_f64()
                .ok_or_else(|| JoblyError::validation("equity must be a number"))
                .and_then(check_equity)
                .map(Value::Real),
            (JobField::Equity, Json::String(equity)) => equity
                .parse::<f64>()
                .map_err(|_| JoblyError::validation("equity must be a number"))
                .and_then(check_equity)
                .map(Value::Real),
            (JobField::Equity, _) => Err(JoblyError::validation(
                "equity must be a number between 0 and 1 or null",
            )),
        }
    }
}

impl Field for JobField {
    fn name(&self) -> &'static str {
        match self {
            JobField::Title => "title",
            JobField::Salary => "salary",
            JobField::Equity => "equity",
        }
    }
}

/// An ordered set of changes for a partial update, in the order the caller
/// supplied them.
#[derive(Debug, PartialEq)]
pub struct JobChanges(Vec<(JobField, Value)>);

impl JobChanges {
    fn title(&self) -> Option<&str> {
        self.0.iter().find_map(|(field, value)| match (field, value) {
            (JobField::Title, Value::Text(title)) => Some(title.as_str()),
            _ => None,
        })
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for JobChanges {
    type Error = JoblyError;

    fn try_from(body: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let changes = body
            .into_iter()
            .map(|(key, json)| {
                let field = JobField::from_name(&key)
                    .ok_or_else(|| JoblyError::validation(format!("{} can not be updated", key)))?;
                Ok((field, field.value(json)?))
            })
            .collect::<Result<Vec<_>, JoblyError>>()?;

        Ok(JobChanges(changes))
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct JobFilter {
    #[serde(rename = "title")]
    pub title_contains: Option<String>,
    #[serde(rename = "minSalary")]
    pub min_salary: Option<f64>,
    #[serde(rename = "hasEquity", default, deserialize_with = "equity_flag")]
    pub has_equity: Option<bool>,
}

// Only `true`, in any case, asks for equity; every other value means no constraint.
fn equity_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = Option::<String>::deserialize(deserializer)?;
    Ok(flag.map(|flag| flag.eq_ignore_ascii_case("true")))
}

/// Data access for jobs. Holds no state besides the storage it talks to.
#[derive(Clone)]
pub struct Jobs {
    query: Recipient<Query>,
    execute: Recipient<Execute>,
}

impl Jobs {
    pub fn new<A>(storage: Addr<A>) -> Self
    where
        A: Actor<Context = Context<A>> + Handler<Query> + Handler<Execute>,
    {
        Self {
            query: storage.clone().recipient(),
            execute: storage.recipient(),
        }
    }

    /// Creates a job, failing with a conflict when the title is taken.
    pub async fn create(&self, new_job: NewJob) -> Result<Job, JoblyError> {
        new_job.validate()?;

        let duplicates = self
            .rows(
                query::GET_JOB_ID_BY_TITLE,
                vec![Value::Text(new_job.title.clone())],
            )
            .await?;
        if !duplicates.is_empty() {
            return Err(JoblyError::Conflict {
                title: new_job.title,
            });
        }

        let executed = self
            .run(
                query::INSERT_JOB,
                vec![
                    Value::Text(new_job.title.clone()),
                    new_job.salary.map_or(Value::Null, Value::Integer),
                    new_job.equity.map_or(Value::Null, Value::Real),
                    Value::Text(new_job.company_handle.clone()),
                ],
            )
            .await?;

        debug!("Job {} saved in the database", &new_job.title);

        Ok(Job {
            id: executed.last_insert_id,
            title: new_job.title,
            salary: new_job.salary,
            equity: new_job.equity,
            company_handle: new_job.company_handle,
        })
    }

    /// Lists jobs matching every present filter, ordered by title.
    pub async fn find(&self, filter: &JobFilter) -> Result<Vec<Job>, JoblyError> {
        let (statement, params) = query::select_jobs(filter);

        self.rows(&statement, params)
            .await?
            .into_iter()
            .map(Job::try_from)
            .collect()
    }

    pub async fn get(&self, title: &str) -> Result<Job, JoblyError> {
        self.rows(query::GET_JOB_BY_TITLE, vec![Value::Text(title.to_owned())])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(title))
            .and_then(Job::try_from)
    }

    /// Applies a partial update to the job currently titled `title`.
    ///
    /// The row is resolved to its id first and the UPDATE targets that id, so
    /// renaming a job does not depend on matching its old title.
    pub async fn update(&self, title: &str, changes: JobChanges) -> Result<Job, JoblyError> {
        let new_title = changes.title().map(String::from);
        let set = sql::partial_update(changes.0)?;

        let id = self.find_id(title).await?;

        if let Some(new_title) = new_title {
            let taken = self
                .rows(
                    query::GET_OTHER_JOB_ID_BY_TITLE,
                    vec![Value::Text(new_title.clone()), Value::Integer(id)],
                )
                .await?;
            if !taken.is_empty() {
                return Err(JoblyError::Conflict { title: new_title });
            }
        }

        let statement = query::update_job(&set);
        let mut params = set.values;
        params.push(Value::Integer(id));

        let executed = self.run(&statement, params).await?;
        if executed.changes == 0 {
            return Err(not_found(title));
        }

        self.rows(query::GET_JOB_BY_ID, vec![Value::Integer(id)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(title))
            .and_then(Job::try_from)
    }

    pub async fn remove(&self, title: &str) -> Result<(), JoblyError> {
        let executed = self
            .run(
                query::DELETE_JOB_BY_TITLE,
                vec![Value::Text(title.to_owned())],
            )
            .await?;

        if executed.changes == 0 {
            return Err(not_found(title));
        }

        debug!("Job {} removed from the database", title);
        Ok(())
    }

    async fn find_id(&self, title: &str) -> Result<i64, JoblyError> {
        let mut row = self
            .rows(
                query::GET_JOB_ID_BY_TITLE,
                vec![Value::Text(title.to_owned())],
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(title))?;

        integer(&mut row, "id")?.ok_or_else(|| decode_error("id"))
    }

    async fn rows(&self, statement: &str, params: Vec<Value>) -> Result<Vec<Row>, JoblyError> {
        self.query
            .send(Query {
                query: statement.to_owned(),
                params,
            })
            .await
            .map_err(|err| JoblyError::Mailbox { cause: err })?
            .map_err(|err| JoblyError::Storage { source: err })
    }

    async fn run(&self, statement: &str, params: Vec<Value>) -> Result<Executed, JoblyError> {
        self.execute
            .send(Execute {
                query: statement.to_owned(),
                params,
            })
            .await
            .map_err(|err| JoblyError::Mailbox { cause: err })?
            .map_err(|err| JoblyError::Storage { source: err })
    }
}

fn not_found(title: &str) -> JoblyError {
    JoblyError::NotFound {
        title: title.to_owned(),
    }
}
