use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{file_path, write_replacing, PersistenceError, RecordSink};
use crate::domain::salary_record::SalaryRecord;
use crate::infrastructure::config::SinkKind;

/// Structured-text sink: a pretty-printed array, one object per record
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(directory: &Path, base_name: &str) -> Self {
        Self {
            path: file_path(directory, base_name, "json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for JsonSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Json
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }

    async fn write_batch(&self, batch: &[SalaryRecord]) -> Result<usize, PersistenceError> {
        let bytes = serde_json::to_vec_pretty(batch)?;
        write_replacing(&self.path, &bytes).await?;
        Ok(batch.len())
    }
}
