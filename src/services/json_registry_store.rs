use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::{AppError, RegistryRecord};
use crate::ports::RegistryStore;

/// Registry state kept as a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRegistryStore {
    path: PathBuf,
}

impl JsonFileRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RegistryStore for JsonFileRegistryStore {
    fn load(&self) -> Result<Option<RegistryRecord>, AppError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let record: RegistryRecord = serde_json::from_str(&content).map_err(|e| {
            AppError::State(format!("{} is not valid registry state: {}", self.path.display(), e))
        })?;
        record.validate()?;
        Ok(Some(record))
    }

    fn save(&self, record: &RegistryRecord) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| AppError::State(format!("Failed to serialize registry: {}", e)))?;

        // Rename over the target so readers of the file never see a partial write.
        let staging = self.staging_path();
        fs::write(&staging, format!("{}\n", content))?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}
