use crate::utils::error::{CityError, Result};
use std::fmt::Display;
use std::net::SocketAddr;
use url::Url;

/// 資料集檔案允許的副檔名 (大小寫不拘)。
pub const DATASET_EXTENSIONS: &[&str] = &["json", "jsonl"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Display, reason: impl Into<String>) -> CityError {
    CityError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 健康檢查只打 http(s) 端點。
pub fn validate_url(field: &str, raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(invalid(field, raw, "URL cannot be empty"));
    }

    let url = Url::parse(raw).map_err(|e| invalid(field, raw, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, raw, format!("Unsupported URL scheme: {}", scheme))),
    }
}

pub fn validate_socket_addr(field: &str, addr: &str) -> Result<SocketAddr> {
    addr.parse::<SocketAddr>()
        .map_err(|e| invalid(field, addr, format!("Invalid socket address: {}", e)))
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field, path.escape_default(), "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_at_least(field: &str, value: usize, min: usize) -> Result<()> {
    if value < min {
        return Err(invalid(field, value, format!("Value must be at least {}", min)));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + Display + Copy>(field: &str, value: T, min: T, max: T) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(field, value, format!("Value must be between {} and {}", min, max)));
    }
    Ok(())
}

/// 資料集檔名：非空、無 NUL，且副檔名為 `.json` / `.jsonl`。
pub fn validate_dataset_file(field: &str, file: &str) -> Result<()> {
    validate_path(field, file)?;

    let extension = std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| invalid(field, file, "Dataset file has no extension"))?;

    if DATASET_EXTENSIONS
        .iter()
        .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    {
        Ok(())
    } else {
        Err(invalid(
            field,
            file,
            format!(
                "Unsupported dataset extension: {} (expected {})",
                extension,
                DATASET_EXTENSIONS.join(" or ")
            ),
        ))
    }
}
