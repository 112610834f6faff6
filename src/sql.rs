use rusqlite::types::Value;

use crate::errors::JoblyError;

/// A column an entity allows to be changed through a partial update.
///
/// Implemented by closed enumerations so column identifiers never come from
/// request input.
pub trait Field {
    /// Name of the field as it appears in request payloads.
    fn name(&self) -> &'static str;

    /// Physical column, when it differs from `name`.
    fn alias(&self) -> Option<&'static str> {
        None
    }

    fn column(&self) -> &'static str {
        self.alias().unwrap_or_else(|| self.name())
    }
}

#[derive(Debug, PartialEq)]
pub struct SetClause {
    pub columns: String,
    pub values: Vec<Value>,
}

impl SetClause {
    /// Placeholder index for the first parameter following the SET values.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }
}

/// Builds the SET part of an UPDATE statement out of the given changes.
///
/// `[(title, "a"), (salary, 1)]` becomes `"title"=$1, "salary"=$2` with the
/// values `["a", 1]`. Placeholders follow the order of `changes`.
pub fn partial_update<F: Field>(changes: Vec<(F, Value)>) -> Result<SetClause, JoblyError> {
    if changes.is_empty() {
        return Err(JoblyError::validation("No data"));
    }

    let mut columns = Vec::with_capacity(changes.len());
    let mut values = Vec::with_capacity(changes.len());

    for (index, (field, value)) in changes.into_iter().enumerate() {
        columns.push(format!("\"{}\"=${}", field.column(), index + 1));
        values.push(value);
    }

    Ok(SetClause {
        columns: columns.join(", "),
        values,
    })
}
