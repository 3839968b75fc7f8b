use crate::dml::Statement;
use crate::error::Result;
use crate::value::Value;

/// Column names and rows returned by a statement that produces a result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Runs one statement against the store.
///
/// Implementations acquire a connection, execute, commit and release the
/// connection before returning, on success and on failure alike.
pub trait Executor {
    /// Returns `Some` when the statement yields a result set, even an empty one.
    fn execute(&self, statement: &Statement) -> Result<Option<RowSet>>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, statement: &Statement) -> Result<Option<RowSet>> {
        (**self).execute(statement)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&self, statement: &Statement) -> Result<Option<RowSet>> {
        (**self).execute(statement)
    }
}
