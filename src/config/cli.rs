use crate::core::DataSource;
use crate::utils::error::{CityError, Result};
use std::path::{Path, PathBuf};

/// Dataset file on the local filesystem: `<base_path>/<file_name>`.
#[derive(Debug, Clone)]
pub struct LocalDataSource {
    base_path: String,
    file_name: String,
}

impl LocalDataSource {
    pub fn new(base_path: String, file_name: String) -> Self {
        Self {
            base_path,
            file_name,
        }
    }

    pub fn full_path(&self) -> PathBuf {
        Path::new(&self.base_path).join(&self.file_name)
    }
}

impl DataSource for LocalDataSource {
    async fn read_dataset(&self) -> Result<Vec<u8>> {
        let full_path = self.full_path();
        tokio::fs::read(&full_path).await.map_err(|e| {
            CityError::dataset(format!("cannot read {}: {}", full_path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.full_path().display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_file_relative_to_base() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("cities.json"), b"[]").unwrap();

        let source = LocalDataSource::new(
            dir.path().to_str().unwrap().to_string(),
            "cities.json".to_string(),
        );
        assert_eq!(source.read_dataset().await.unwrap(), b"[]");
        assert!(source.describe().ends_with("cities.json"));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_dataset_error() {
        let dir = TempDir::new().unwrap();
        let source = LocalDataSource::new(
            dir.path().to_str().unwrap().to_string(),
            "missing.json".to_string(),
        );

        let err = source.read_dataset().await.unwrap_err();
        assert!(matches!(err, CityError::DatasetError { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
