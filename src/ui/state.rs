use chrono::{DateTime, Local, Utc};

/// Local UI state: only what the user is typing.
#[derive(Debug, Default)]
pub struct AppState {
    pub username_input: String,
    pub input_text: String,
}

/// Wall-clock time of a message in the local timezone.
pub fn format_time(sent_at: &DateTime<Utc>) -> String {
    sent_at.with_timezone(&Local).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_is_hours_and_minutes() {
        let formatted = format_time(&Utc::now());
        assert_eq!(formatted.len(), 5);
        assert_eq!(&formatted[2..3], ":");
    }
}
