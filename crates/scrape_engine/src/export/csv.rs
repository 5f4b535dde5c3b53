use scrape_core::ProductRecord;

use super::ExportError;

pub const CSV_HEADERS: [&str; 11] = [
    "asin",
    "title",
    "price",
    "currency",
    "inStock",
    "seller",
    "category",
    "prime",
    "url",
    "imageUrls",
    "description",
];

pub const DEFAULT_CURRENCY: &str = "USD";

/// Collapses line terminators to spaces and trims the value.
pub fn normalize_field(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

fn row(record: &ProductRecord) -> [String; 11] {
    let currency = record
        .currency
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(DEFAULT_CURRENCY);
    [
        normalize_field(&record.asin),
        normalize_field(&record.title),
        normalize_field(&record.price),
        normalize_field(currency),
        record.in_stock.to_string(),
        normalize_field(&record.seller),
        normalize_field(&record.category),
        record.prime.to_string(),
        normalize_field(&record.url),
        normalize_field(&record.images.join(" ")),
        normalize_field(&record.description),
    ]
}

/// Renders the header plus one row per record, rows separated by `\n`.
///
/// Fields holding a quote or comma are quoted with inner quotes doubled.
pub fn to_csv(products: &[ProductRecord]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for record in products {
        writer.write_record(row(record))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::normalize_field;

    #[test]
    fn newlines_collapse_to_spaces() {
        assert_eq!(normalize_field(" line one\r\nline two\rthree\n"), "line one line two three");
    }
}
