use crate::core::{City, DatasetFormat, SkippedRecord};
use crate::utils::error::{CityError, Result};

#[derive(Debug, Clone)]
pub struct ParsedDataset {
    pub cities: Vec<City>,
    pub format: DatasetFormat,
    pub skipped: Vec<SkippedRecord>,
}

/// Parses a cities dataset.
///
/// The whole input is first tried as a JSON array. If that fails it is read
/// as JSON Lines, one record per non-blank line. Records that are not valid
/// cities are skipped in either mode and reported in `skipped`.
pub fn parse_dataset(bytes: &[u8]) -> Result<ParsedDataset> {
    let parsed = match serde_json::from_slice::<Vec<serde_json::Value>>(bytes) {
        Ok(items) => {
            tracing::debug!("Loaded as JSON array");
            parse_array(items)
        }
        Err(e) => {
            tracing::debug!("Not a JSON array ({}), loading as JSONL", e);
            parse_lines(bytes)?
        }
    };

    if parsed.cities.is_empty() && !parsed.skipped.is_empty() {
        return Err(CityError::dataset(format!(
            "dataset contains no valid city records ({} skipped, first at {}: {})",
            parsed.skipped.len(),
            parsed.skipped[0].position,
            parsed.skipped[0].reason
        )));
    }

    Ok(parsed)
}

fn parse_array(items: Vec<serde_json::Value>) -> ParsedDataset {
    let mut cities = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();

    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<City>(item) {
            Ok(city) => cities.push(city),
            Err(e) => {
                tracing::warn!("⚠️  Skipping invalid city at position {}: {}", idx + 1, e);
                skipped.push(SkippedRecord {
                    position: idx + 1,
                    reason: e.to_string(),
                });
            }
        }
    }

    ParsedDataset {
        cities,
        format: DatasetFormat::JsonArray,
        skipped,
    }
}

fn parse_lines(bytes: &[u8]) -> Result<ParsedDataset> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CityError::dataset(format!("dataset is not valid UTF-8: {}", e)))?;

    let mut cities = Vec::new();
    let mut skipped = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<City>(line) {
            Ok(city) => cities.push(city),
            Err(e) => {
                tracing::warn!("⚠️  Skipping invalid JSON on line {}: {}", idx + 1, e);
                skipped.push(SkippedRecord {
                    position: idx + 1,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(ParsedDataset {
        cities,
        format: DatasetFormat::JsonLines,
        skipped,
    })
}
