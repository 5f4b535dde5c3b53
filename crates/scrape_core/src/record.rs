use serde::{Deserialize, Serialize};

/// One product detail page, as produced by a product extractor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductRecord {
    /// Amazon Standard Identification Number; unique within a market.
    pub asin: String,
    pub title: String,
    /// Amount exactly as rendered on the page (no locale parsing).
    pub price: String,
    pub currency: Option<String>,
    pub in_stock: bool,
    pub seller: String,
    /// Breadcrumb path joined with ` > `.
    pub category: String,
    pub images: Vec<String>,
    pub description: String,
    /// Prime / fast-shipping badge detected.
    pub prime: bool,
    pub url: String,
}

impl ProductRecord {
    /// Title if present, otherwise the identifier. Used in log lines.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.asin
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProductRecord;

    #[test]
    fn label_falls_back_to_asin() {
        let mut record = ProductRecord {
            asin: "B000000001".into(),
            ..ProductRecord::default()
        };
        assert_eq!(record.label(), "B000000001");
        record.title = "Headphones".into();
        assert_eq!(record.label(), "Headphones");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let record = ProductRecord {
            asin: "B000000001".into(),
            in_stock: true,
            ..ProductRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["inStock"], serde_json::Value::Bool(true));
        assert_eq!(json["asin"], "B000000001");
        assert!(json.get("in_stock").is_none());
    }
}
