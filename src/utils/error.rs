use thiserror::Error;

#[derive(Error, Debug)]
pub enum CityError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Dataset error: {message}")]
    DatasetError { message: String },

    #[error("Store error: {message}")]
    StoreError { message: String },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("Health check failed: {message}")]
    HealthCheckError { message: String },
}

impl CityError {
    /// 依錯誤類型決定程序退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            CityError::ConfigError { .. }
            | CityError::InvalidConfigValueError { .. }
            | CityError::MissingConfigError { .. } => 2,
            CityError::DatasetError { .. } | CityError::SerializationError(_) => 3,
            CityError::ServerError { .. } => 4,
            _ => 1,
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        CityError::StoreError {
            message: message.into(),
        }
    }

    pub fn dataset(message: impl Into<String>) -> Self {
        CityError::DatasetError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        let config = CityError::ConfigError {
            message: "bad".to_string(),
        };
        assert_eq!(config.exit_code(), 2);
        assert_eq!(CityError::dataset("empty").exit_code(), 3);
        assert_eq!(
            CityError::ServerError {
                message: "address in use".to_string()
            }
            .exit_code(),
            4
        );
        assert_eq!(CityError::store("poisoned").exit_code(), 1);
    }
}
