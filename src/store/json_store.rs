use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;

use crate::session::error::SinkError;
use crate::store::ResultsSink;
use crate::store::schema::{PersistedResult, ResultHistoryData};

const HISTORY_FILE: &str = "typing_sessions.json";

/// Append-only local history of finished sessions.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// A missing file is an empty history. Anything else that cannot be read
    /// is an error, never an empty list.
    pub fn load_history(&self) -> Result<ResultHistoryData, SinkError> {
        let path = self.file_path(HISTORY_FILE);
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(SinkError::Unreadable),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ResultHistoryData::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Moves an unparseable history file aside so a new one can be started.
    fn back_up_history(&self) -> Result<PathBuf, SinkError> {
        let path = self.file_path(HISTORY_FILE);
        let mut backup = path.with_extension("json.bak");
        if backup.exists() {
            let stamp = Utc::now().format("%Y%m%d%H%M%S");
            backup = path.with_extension(format!("json.{stamp}.bak"));
        }
        fs::rename(&path, &backup)?;
        Ok(backup)
    }

    fn save_history(&self, data: &ResultHistoryData) -> Result<(), SinkError> {
        let path = self.file_path(HISTORY_FILE);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl ResultsSink for JsonStore {
    fn submit(&mut self, result: &PersistedResult) -> Result<(), SinkError> {
        let mut history = match self.load_history() {
            Ok(history) => history,
            Err(SinkError::Unreadable(e)) => {
                let backup = self.back_up_history()?;
                log::warn!(
                    "history was unreadable ({e}), moved it to {} and started a new one",
                    backup.display()
                );
                ResultHistoryData::default()
            }
            Err(e) => return Err(e),
        };
        history.sessions.push(result.clone());
        self.save_history(&history)
    }
}
