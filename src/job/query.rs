use rusqlite::types::Value;

use crate::job::JobFilter;
use crate::sql::SetClause;

pub const SELECT_JOBS: &str = "SELECT id, title, salary, equity, company_handle FROM jobs";

pub const INSERT_JOB: &str = "
    INSERT INTO jobs (title, salary, equity, company_handle)
    VALUES ($1, $2, $3, $4)
";

pub const GET_JOB_BY_TITLE: &str = "
    SELECT id, title, salary, equity, company_handle
    FROM jobs
    WHERE title = $1
    ORDER BY id
";

pub const GET_JOB_BY_ID: &str = "
    SELECT id, title, salary, equity, company_handle
    FROM jobs
    WHERE id = $1
";

pub const GET_JOB_ID_BY_TITLE: &str = "
    SELECT id
    FROM jobs
    WHERE title = $1
    ORDER BY id
";

pub const GET_OTHER_JOB_ID_BY_TITLE: &str = "
    SELECT id
    FROM jobs
    WHERE title = $1 AND id != $2
";

pub const DELETE_JOB_BY_TITLE: &str = "
    DELETE FROM jobs
    WHERE title = $1
";

/// `UPDATE` keyed by id; the id is bound right after the SET values.
pub fn update_job(set: &SetClause) -> String {
    format!(
        "UPDATE jobs SET {} WHERE id = ${}",
        set.columns,
        set.next_placeholder()
    )
}

/// Builds the list statement for `filter`. Every filter value is bound,
/// never written into the statement text.
pub fn select_jobs(filter: &JobFilter) -> (String, Vec<Value>) {
    let mut predicates: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(title) = &filter.title_contains {
        params.push(Value::Text(title.to_lowercase()));
        predicates.push(format!("instr(casefold(title), ${}) > 0", params.len()));
    }

    if let Some(min_salary) = filter.min_salary {
        params.push(Value::Real(min_salary));
        predicates.push(format!("salary >= ${}", params.len()));
    }

    if filter.has_equity == Some(true) {
        predicates.push("equity > 0 AND equity IS NOT NULL".to_owned());
    }

    let mut statement = SELECT_JOBS.to_owned();
    if !predicates.is_empty() {
        statement.push_str(" WHERE ");
        statement.push_str(&predicates.join(" AND "));
    }
    statement.push_str(" ORDER BY title");

    (statement, params)
}
