pub mod json_store;
pub mod schema;

use crate::session::error::SinkError;
use crate::store::schema::PersistedResult;

/// Where finished sessions go. Writes are append-only.
pub trait ResultsSink {
    fn submit(&mut self, result: &PersistedResult) -> Result<(), SinkError>;
}

impl<S: ResultsSink + ?Sized> ResultsSink for Box<S> {
    fn submit(&mut self, result: &PersistedResult) -> Result<(), SinkError> {
        (**self).submit(result)
    }
}

/// In-memory sink. Used by tests and when no data directory is available.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub submitted: Vec<PersistedResult>,
    pub fail: bool,
}

impl ResultsSink for MemorySink {
    fn submit(&mut self, result: &PersistedResult) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Io(std::io::Error::other("sink unavailable")));
        }
        self.submitted.push(result.clone());
        Ok(())
    }
}
