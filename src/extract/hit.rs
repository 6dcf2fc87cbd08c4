//! Mapping of structured search hits into product records

use crate::model::{ProductRecord, UNAVAILABLE};
use crate::ParseFailure;
use serde_json::{Map, Value};

/// Currency prefix for formatted prices
const CURRENCY: &str = "EGP";

/// Optional text fields copied into attributes, in output order
const TEXT_ATTRIBUTES: &[(&str, &str)] = &[
    ("brand_en", "Brand"),
    ("item_en", "Model"),
    ("ram_en", "RAM"),
    ("storage_en", "Storage"),
    ("color_en", "Color"),
    ("variant_type_en", "Condition"),
    ("battery_health", "Battery Health"),
];

/// Flags that are always present as `Yes` / `No`
const FLAG_ATTRIBUTES: &[(&str, &str)] = &[("is_warranty", "Warranty"), ("is_insurance", "Insurance")];

/// Optional text fields that follow the flags
const TRAILING_ATTRIBUTES: &[(&str, &str)] = &[("sim_en", "SIM"), ("sku", "SKU")];

/// Hit fields that make up the product name
const NAME_PARTS: &[&str] = &["brand_en", "item_en", "storage_en", "color_en"];

/// Converts search hits into [`ProductRecord`]s
#[derive(Debug, Clone)]
pub struct HitExtractor {
    product_base_url: String,
    location: String,
}

impl HitExtractor {
    /// # Arguments
    ///
    /// * `product_base_url` - Prefix of canonical product URLs
    /// * `location` - Location reported for every record
    pub fn new(product_base_url: &str, location: &str) -> Self {
        Self {
            product_base_url: product_base_url.trim_end_matches('/').to_string(),
            location: location.to_string(),
        }
    }

    /// Builds a record from one hit
    ///
    /// # Returns
    ///
    /// * `Ok(ProductRecord)` - The hit had an identifier and a name
    /// * `Err(ParseFailure)` - The hit cannot become a record
    pub fn extract_record(&self, hit: &Value) -> Result<ProductRecord, ParseFailure> {
        let fields = hit.as_object().ok_or_else(|| ParseFailure::Malformed {
            url: self.product_base_url.clone(),
            message: "search hit is not an object".to_string(),
        })?;

        let identifier = text(fields, "slug_en")
            .or_else(|| text(fields, "id"))
            .ok_or(ParseFailure::NoIdentifier)?;
        let source_url = format!("{}/{}", self.product_base_url, identifier);

        let name = NAME_PARTS
            .iter()
            .filter_map(|key| text(fields, key))
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            return Err(ParseFailure::NoName(source_url));
        }

        let mut record = ProductRecord::new(name, source_url);
        record.location = self.location.clone();

        record.price = ["sale_price", "original_price"]
            .iter()
            .filter_map(|key| fields.get(*key))
            .find_map(format_price)
            .unwrap_or_else(|| UNAVAILABLE.to_string());

        record.seller = text(fields, "vendor_storename")
            .or_else(|| text(fields, "seller_user_name"))
            .unwrap_or_else(|| UNAVAILABLE.to_string());

        for (key, label) in TEXT_ATTRIBUTES {
            if let Some(value) = text(fields, key) {
                record.attributes.insert(label.to_string(), value);
            }
        }
        for (key, label) in FLAG_ATTRIBUTES {
            let flag = fields.get(*key).map(truthy).unwrap_or(false);
            let value = if flag { "Yes" } else { "No" };
            record.attributes.insert(label.to_string(), value.to_string());
        }
        for (key, label) in TRAILING_ATTRIBUTES {
            if let Some(value) = text(fields, key) {
                record.attributes.insert(label.to_string(), value);
            }
        }

        Ok(record)
    }
}

/// Reads a field as display text; absent, empty and `N/A` values count as missing
fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match fields.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };

    if value.is_empty() || value == UNAVAILABLE {
        None
    } else {
        Some(value)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Formats a non-zero numeric price as `EGP 15,000`
///
/// Accepts JSON numbers and numeric strings. Fractional digits are kept.
pub fn format_price(value: &Value) -> Option<String> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };

    let amount: f64 = raw.parse().ok()?;
    if amount == 0.0 || !amount.is_finite() {
        return None;
    }

    Some(format!("{} {}", CURRENCY, group_thousands(&raw)))
}

/// Inserts `,` between every three integer digits
fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
