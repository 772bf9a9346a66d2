use crate::error::Result;
use crate::record::EventRecord;

/// Number of entries shown by [`recent_lines`] when the caller has no preference
pub const DEFAULT_RECENT: usize = 200;

/// The log as UTF-8 JSON with two-space indentation
pub fn export_json(records: &[EventRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// One line per record, newest first: `[HH:MM:SS] eventType: text (host/path)`
pub fn recent_lines(records: &[EventRecord], limit: usize) -> Vec<String> {
    records
        .iter()
        .rev()
        .take(limit)
        .map(|record| {
            let text = record
                .context
                .get_str("text")
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| record.natural_description());
            let location = record
                .url
                .split_once("//")
                .map(|(_, rest)| rest)
                .unwrap_or_default();
            format!(
                "[{}] {}: {} ({})",
                record.timestamp.format("%H:%M:%S"),
                record.event_type,
                text,
                location
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EventContext, EventType};
    use chrono::{TimeZone, Utc};

    fn record(second: u32, description: &str) -> EventRecord {
        EventRecord::at(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, second).unwrap(),
            "https://example.com/app?tab=1",
            "App",
            EventType::Click,
            EventContext::described(description),
        )
    }

    #[test]
    fn test_export_uses_two_space_indent() {
        let json = export_json(&[record(0, "Clicked on \"Next\"")]).unwrap();
        assert!(json.starts_with("[\n  {\n    \"url\""));
        let back: Vec<EventRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn test_export_empty_log() {
        assert_eq!(export_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_recent_lines_newest_first() {
        let records = vec![
            record(1, "first"),
            record(2, "second"),
            record(3, "third"),
        ];
        let lines = recent_lines(&records, 2);
        assert_eq!(
            lines,
            vec![
                "[12:30:03] click: third (example.com/app?tab=1)",
                "[12:30:02] click: second (example.com/app?tab=1)",
            ]
        );
    }

    #[test]
    fn test_recent_lines_prefer_captured_text() {
        let mut rec = record(5, "Clicked on \"Next\"");
        rec.context = rec.context.with("text", "Next");
        assert_eq!(
            recent_lines(&[rec], DEFAULT_RECENT),
            vec!["[12:30:05] click: Next (example.com/app?tab=1)"]
        );
    }
}
