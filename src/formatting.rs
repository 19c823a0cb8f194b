// src/formatting.rs

/// Messages longer than this are marked with [`ELLIPSIS`].
pub const MAX_ALERT_CHARS: usize = 140;

pub const ELLIPSIS: &str = "...";

/// Shapes a log message into the text sent as an SMS.
///
/// Known quirk: a message over [`MAX_ALERT_CHARS`] characters keeps its full
/// content and only gains the ellipsis marker. It is never cut down to the
/// limit. Provider-side segmentation handles the actual length.
///
/// Length is counted in Unicode scalar values, so text outside the Basic
/// Multilingual Plane (emoji, for instance) counts one per character rather
/// than one per UTF-16 unit.
pub fn shape_message(raw: &str) -> String {
    if raw.chars().count() > MAX_ALERT_CHARS {
        format!("{}{}", raw, ELLIPSIS)
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_is_unchanged() {
        assert_eq!(shape_message("disk full"), "disk full");
        assert_eq!(shape_message(""), "");
    }

    #[test]
    fn test_message_at_limit_is_unchanged() {
        let raw = "B".repeat(MAX_ALERT_CHARS);
        assert_eq!(shape_message(&raw), raw);
    }

    #[test]
    fn test_long_message_keeps_content_and_gains_marker() {
        let raw = "A".repeat(200);
        let shaped = shape_message(&raw);
        assert_eq!(shaped, format!("{}...", "A".repeat(200)));
        assert_eq!(shaped.len(), 203);
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        // 140 two-byte characters stay within the limit.
        let raw = "é".repeat(MAX_ALERT_CHARS);
        assert_eq!(shape_message(&raw), raw);
    }
}
