use chrono::NaiveDate;

/// Parse user date input. Accepts ISO `YYYY-MM-DD` and UK `DD/MM/YYYY`.
pub fn parse_date_input(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .ok()
}

/// Normalise date input to `YYYY-MM-DD`, or `None` if it does not parse
pub fn normalize_date_input(input: &str) -> Option<String> {
    parse_date_input(input).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Format YYYY-MM-DD date string for display (e.g. "15 January 2025")
pub fn format_date_for_display(date_str: &str) -> String {
    match parse_date_input(date_str) {
        Some(date) => date.format("%-d %B %Y").to_string(),
        None => date_str.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_input() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(parse_date_input("2024-03-09"), expected);
        assert_eq!(parse_date_input(" 09/03/2024 "), expected);
        assert_eq!(parse_date_input(""), None);
        assert_eq!(parse_date_input("2024-02-30"), None);
        assert_eq!(parse_date_input("next tuesday"), None);
    }

    #[test]
    fn test_normalize_date_input() {
        assert_eq!(normalize_date_input("29/02/2024").as_deref(), Some("2024-02-29"));
        assert_eq!(normalize_date_input("29/02/2023"), None);
    }

    #[test]
    fn test_format_date_for_display() {
        assert_eq!(format_date_for_display("2025-01-15"), "15 January 2025");
        assert_eq!(format_date_for_display("05/11/2024"), "5 November 2024");
        assert_eq!(format_date_for_display("garbage"), "garbage");
    }
}
