use chrono::{DateTime, Utc};

const PREFIX: &str = "amazon";

/// `amazon_{keyword}_{unix_millis}.csv`, keyword reduced to `[a-z0-9_-]`.
pub fn export_filename(keyword: &str, at: DateTime<Utc>) -> String {
    format!(
        "{PREFIX}_{}_{}.csv",
        sanitize_keyword(keyword),
        at.timestamp_millis()
    )
}

/// Replaces each run of characters outside `[A-Za-z0-9_-]` with one `_`
/// and lower-cases the rest.
fn sanitize_keyword(keyword: &str) -> String {
    if keyword.is_empty() {
        return PREFIX.to_string();
    }
    let mut out = String::with_capacity(keyword.len());
    let mut in_run = false;
    for c in keyword.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c.to_ascii_lowercase());
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{export_filename, sanitize_keyword};

    #[test]
    fn keyword_is_lower_cased_and_runs_replaced() {
        assert_eq!(sanitize_keyword("Noise Cancelling  Headphones!"), "noise_cancelling_headphones_");
        assert_eq!(sanitize_keyword("usb-c_hub"), "usb-c_hub");
        assert_eq!(sanitize_keyword("Kopfhörer"), "kopfh_rer");
    }

    #[test]
    fn empty_keyword_uses_prefix() {
        assert_eq!(sanitize_keyword(""), "amazon");
        assert_eq!(sanitize_keyword("   "), "_");
    }

    #[test]
    fn filename_carries_millisecond_timestamp() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(export_filename("Desk Lamp", at), "amazon_desk_lamp_1700000000123.csv");
    }
}
