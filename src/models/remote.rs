// file: src/models/remote.rs
use serde::{Deserialize, Serialize};

/// Event record as returned by the remote calendar exchange (Google Calendar shape).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<RemoteEventTime>,
    #[serde(default)]
    pub end: Option<RemoteEventTime>,
}

/// Either a full `dateTime` (RFC 3339) or an all-day `date` (`YYYY-MM-DD`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEventTime {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_google_shape() {
        let json = r#"{
            "id": "abc123",
            "summary": "Standup",
            "start": { "dateTime": "2024-05-02T09:30:00+02:00" },
            "end": { "dateTime": "2024-05-02T09:45:00+02:00" },
            "hangoutLink": "https://meet.google.com/xyz"
        }"#;
        let event: RemoteEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id.as_deref(), Some("abc123"));
        assert_eq!(
            event.start.unwrap().date_time.as_deref(),
            Some("2024-05-02T09:30:00+02:00")
        );
        assert!(event.description.is_none());
    }

    #[test]
    fn test_deserialize_all_day_and_missing_fields() {
        let json = r#"{ "start": { "date": "2024-12-25" } }"#;
        let event: RemoteEvent = serde_json::from_str(json).unwrap();
        assert!(event.id.is_none());
        assert_eq!(event.start.unwrap().date.as_deref(), Some("2024-12-25"));
        assert!(event.end.is_none());
    }
}
