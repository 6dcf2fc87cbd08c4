//! JSON result files

use crate::crawler::Source;
use crate::model::ProductRecord;
use crate::HarvestError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk result set
#[derive(Debug, Serialize)]
pub struct ResultFile<'a> {
    /// ISO-8601 timestamp of when the file was written
    pub scraped_at: String,
    pub total_products: usize,
    pub products: &'a [ProductRecord],
}

impl<'a> ResultFile<'a> {
    pub fn new(products: &'a [ProductRecord], scraped_at: DateTime<Local>) -> Self {
        Self {
            scraped_at: scraped_at.to_rfc3339(),
            total_products: products.len(),
            products,
        }
    }
}

/// File name for one source run
///
/// | Source | Full catalog | Search |
/// |---|---|---|
/// | Dubizzle | `dubizzle_products.json` | `{query}_results.json` |
/// | MobileMasr | `mobilemasr_products.json` | `mobilemasr_{query}_results.json` |
///
/// The query is lowercased; anything other than letters, digits, `_` and `-`
/// becomes an underscore so the name never leaves the output directory.
pub fn artifact_name(source: Source, query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        return match source {
            Source::Dubizzle => "dubizzle_products.json".to_string(),
            Source::MobileMasr => "mobilemasr_products.json".to_string(),
        };
    }

    let snake: String = query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    match source {
        Source::Dubizzle => format!("{}_results.json", snake),
        Source::MobileMasr => format!("mobilemasr_{}_results.json", snake),
    }
}

/// Writes a result set into `directory`, creating it if needed
///
/// Non-ASCII text is written literally.
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(HarvestError)` - Directory or file could not be written
pub fn write_results(
    directory: &Path,
    file_name: &str,
    records: &[ProductRecord],
) -> Result<PathBuf, HarvestError> {
    fs::create_dir_all(directory)?;

    let path = directory.join(file_name);
    let body = serde_json::to_string_pretty(&ResultFile::new(records, Local::now()))?;
    fs::write(&path, body)?;

    tracing::info!("Saved {} products to {}", records.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_names() {
        assert_eq!(artifact_name(Source::Dubizzle, ""), "dubizzle_products.json");
        assert_eq!(artifact_name(Source::MobileMasr, "  "), "mobilemasr_products.json");
        assert_eq!(artifact_name(Source::Dubizzle, "iPhone 13 Pro"), "iphone_13_pro_results.json");
        assert_eq!(
            artifact_name(Source::MobileMasr, "Galaxy S23"),
            "mobilemasr_galaxy_s23_results.json"
        );
    }

    #[test]
    fn test_artifact_name_stays_in_directory() {
        assert_eq!(artifact_name(Source::Dubizzle, "iPhone 13/14"), "iphone_13_14_results.json");
        assert_eq!(artifact_name(Source::MobileMasr, "../x"), "mobilemasr____x_results.json");
        assert_eq!(artifact_name(Source::Dubizzle, "a\\b:c"), "a_b_c_results.json");
        assert_eq!(artifact_name(Source::Dubizzle, "pro-max"), "pro-max_results.json");
        assert_eq!(artifact_name(Source::Dubizzle, "ايفون 12"), "ايفون_12_results.json");
    }

    #[test]
    fn test_write_results() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested");

        let mut record = ProductRecord::new("ايفون 12", "https://example.com/ad/1");
        record.location = "القاهرة".to_string();
        record.attributes.insert("Brand".into(), "Apple".into());

        let path = write_results(&out, "dubizzle_products.json", &[record]).unwrap();
        let body = fs::read_to_string(&path).unwrap();

        assert!(body.contains("ايفون 12"));
        assert!(body.contains("القاهرة"));
        assert!(!body.contains("\\u"));

        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["total_products"], 1);
        assert_eq!(parsed["products"][0]["listing_url"], "https://example.com/ad/1");
        assert!(parsed["scraped_at"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_details_keep_insertion_order() {
        let mut record = ProductRecord::new("Phone", "u");
        record.attributes.insert("Zeta".into(), "1".into());
        record.attributes.insert("Alpha".into(), "2".into());

        let body = serde_json::to_string(&ResultFile::new(&[record], Local::now())).unwrap();
        let zeta = body.find("Zeta").unwrap();
        let alpha = body.find("Alpha").unwrap();
        assert!(zeta < alpha);
    }
}
