//! One-shot event templates with a fixed length and color.

use calendar_shared::api::CreateEventRequest;
use chrono::{Duration, NaiveDate, NaiveTime, SecondsFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub minutes: i64,
    pub color: &'static str,
}

pub const TEMPLATES: [Template; 4] = [
    Template {
        name: "Meeting",
        minutes: 30,
        color: "#1a73e8",
    },
    Template {
        name: "Team Lunch",
        minutes: 60,
        color: "#ea4335",
    },
    Template {
        name: "Personal Break",
        minutes: 15,
        color: "#fbbc04",
    },
    Template {
        name: "Conference Call",
        minutes: 60,
        color: "#34a853",
    },
];

/// Start time when none is given: 09:00.
pub fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Look a template up by name, ignoring case and treating `-`/`_` as spaces,
/// so `team-lunch` finds "Team Lunch".
pub fn find_template(name: &str) -> Option<&'static Template> {
    let wanted = name.trim().replace(['-', '_'], " ").to_lowercase();
    TEMPLATES.iter().find(|t| t.name.to_lowercase() == wanted)
}

impl Template {
    /// Body for an event of this template starting at `date` `time` UTC.
    pub fn request(&self, date: NaiveDate, time: NaiveTime) -> CreateEventRequest {
        let start = date.and_time(time).and_utc();
        let end = start + Duration::minutes(self.minutes);

        CreateEventRequest {
            title: Some(self.name.to_string()),
            description: Some(format!("Quick template: {}", self.name)),
            start_date: Some(start.to_rfc3339_opts(SecondsFormat::Millis, true)),
            end_date: Some(end.to_rfc3339_opts(SecondsFormat::Millis, true)),
            all_day: Some(false),
            color: Some(self.color.to_string()),
            completed: Some(false),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_matched_loosely() {
        assert_eq!(find_template("meeting").unwrap().minutes, 30);
        assert_eq!(find_template("team-lunch").unwrap().color, "#ea4335");
        assert_eq!(find_template("Personal_Break").unwrap().minutes, 15);
        assert!(find_template("standup").is_none());
    }

    #[test]
    fn request_spans_the_template_length() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let req = find_template("Conference Call")
            .unwrap()
            .request(date, default_start());

        assert_eq!(req.title.as_deref(), Some("Conference Call"));
        assert_eq!(
            req.description.as_deref(),
            Some("Quick template: Conference Call")
        );
        assert_eq!(req.start_date.as_deref(), Some("2024-06-03T09:00:00.000Z"));
        assert_eq!(req.end_date.as_deref(), Some("2024-06-03T10:00:00.000Z"));
        assert_eq!(req.color.as_deref(), Some("#34a853"));
        assert_eq!(req.user_id, None);
    }

    #[test]
    fn late_start_rolls_into_next_day() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let time = NaiveTime::from_hms_opt(23, 50, 0).unwrap();
        let req = TEMPLATES[0].request(date, time);
        assert_eq!(req.end_date.as_deref(), Some("2025-01-01T00:20:00.000Z"));
    }
}
