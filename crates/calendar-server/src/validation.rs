//! Payload rules for event and user bodies.
//!
//! Bodies are read as raw JSON so a field of the wrong type is reported under
//! its own path. Each validator either returns a typed, parsed value or every
//! violation it found, so clients can show all problems at once.

use calendar_shared::api::FieldViolation;
use calendar_shared::time::parse_datetime;
use calendar_shared::DEFAULT_EVENT_COLOR;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::AppError;

pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 1000;
pub const LOCATION_MAX: usize = 200;
pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 200;

lazy_static! {
    static ref RE_HEX_COLOR: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
    static ref RE_EMAIL: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// A create body that passed every field rule. Text is not yet sanitized.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub all_day: bool,
    pub color: String,
    pub location: Option<String>,
    pub recurrence: Option<String>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub user_id: String,
}

/// An update body that passed every field rule. Absent fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub color: Option<String>,
    pub location: Option<Option<String>>,
    pub recurrence: Option<Option<String>>,
    pub completed: Option<bool>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub name: String,
    pub email: String,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_mismatch(path: &str, expected: &str, found: &Value) -> FieldViolation {
    FieldViolation::new(
        path,
        format!("Expected {}, received {}", expected, type_name(found)),
    )
}

/// Typed reads over a JSON object body. Missing keys read as absent; a key
/// holding the wrong JSON type is recorded as a violation and reads as absent.
struct Fields<'a> {
    body: &'a Map<String, Value>,
    violations: Vec<FieldViolation>,
}

impl<'a> Fields<'a> {
    fn object(body: &'a Value) -> Result<Self, AppError> {
        match body {
            Value::Object(map) => Ok(Self {
                body: map,
                violations: Vec::new(),
            }),
            other => Err(AppError::Validation(vec![type_mismatch(
                "", "object", other,
            )])),
        }
    }

    fn has(&self, path: &str) -> bool {
        self.body.contains_key(path)
    }

    fn push(&mut self, path: &str, message: &str) {
        self.violations.push(FieldViolation::new(path, message));
    }

    fn string(&mut self, path: &str) -> Option<&'a str> {
        let body = self.body;
        match body.get(path)? {
            Value::String(s) => Some(s.as_str()),
            other => {
                self.violations.push(type_mismatch(path, "string", other));
                None
            }
        }
    }

    /// `Some(None)` for an explicit `null`.
    fn nullable_string(&mut self, path: &str) -> Option<Option<&'a str>> {
        let body = self.body;
        match body.get(path)? {
            Value::Null => Some(None),
            Value::String(s) => Some(Some(s.as_str())),
            other => {
                self.violations.push(type_mismatch(path, "string", other));
                None
            }
        }
    }

    fn boolean(&mut self, path: &str) -> Option<bool> {
        match self.body.get(path)? {
            Value::Bool(b) => Some(*b),
            other => {
                self.violations.push(type_mismatch(path, "boolean", other));
                None
            }
        }
    }

    fn required(&mut self, path: &str) {
        if !self.has(path) {
            self.push(path, "Required");
        }
    }

    fn max_len(&mut self, path: &str, value: Option<&str>, max: usize, message: &str) {
        if value.is_some_and(|v| v.chars().count() > max) {
            self.push(path, message);
        }
    }

    fn title(&mut self, value: Option<&str>) {
        match value {
            Some(t) if t.is_empty() => self.push("title", "Title is required"),
            Some(t) if t.chars().count() > TITLE_MAX => {
                self.push("title", "Title must be less than 200 characters")
            }
            _ => {}
        }
    }

    fn color(&mut self, value: Option<&str>) {
        if value.is_some_and(|c| !RE_HEX_COLOR.is_match(c)) {
            self.push("color", "Color must be a valid hex color");
        }
    }

    fn datetime(&mut self, path: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
        let value = value?;
        let parsed = parse_datetime(value);
        if parsed.is_none() {
            self.push(path, "Invalid datetime");
        }
        parsed
    }

    fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.violations.is_empty() {
            Ok(value)
        } else {
            Err(AppError::Validation(self.violations))
        }
    }
}

/// Check a `POST /api/events` body. `title`, `startDate`, `endDate` and
/// `userId` are required; the rest take their defaults.
pub fn validate_create_event(body: &Value) -> Result<EventInput, AppError> {
    let mut f = Fields::object(body)?;

    let title = f.string("title");
    if !f.has("title") {
        f.push("title", "Title is required");
    }
    f.title(title);

    let description = f.nullable_string("description").flatten();
    f.max_len(
        "description",
        description,
        DESCRIPTION_MAX,
        "Description must be less than 1000 characters",
    );

    f.required("startDate");
    let raw = f.string("startDate");
    let start_date = f.datetime("startDate", raw);
    f.required("endDate");
    let raw = f.string("endDate");
    let end_date = f.datetime("endDate", raw);

    let all_day = f.boolean("allDay");
    let color = f.string("color");
    f.color(color);

    let location = f.nullable_string("location").flatten();
    f.max_len(
        "location",
        location,
        LOCATION_MAX,
        "Location must be less than 200 characters",
    );
    let recurrence = f.nullable_string("recurrence").flatten();

    let completed = f.boolean("completed");
    let raw = f.nullable_string("completedAt").flatten();
    let completed_at = f.datetime("completedAt", raw);

    let user_id = f.string("userId");
    if user_id.map_or(!f.has("userId"), str::is_empty) {
        f.push("userId", "UserId is required");
    }

    let (Some(start_date), Some(end_date)) = (start_date, end_date) else {
        return Err(AppError::Validation(f.violations));
    };

    f.finish(EventInput {
        title: title.unwrap_or_default().to_string(),
        description: description.map(String::from),
        start_date,
        end_date,
        all_day: all_day.unwrap_or(false),
        color: color.unwrap_or(DEFAULT_EVENT_COLOR).to_string(),
        location: location.map(String::from),
        recurrence: recurrence.map(String::from),
        completed: completed.unwrap_or(false),
        completed_at,
        user_id: user_id.unwrap_or_default().to_string(),
    })
}

/// The caller named by an update body, read before the field rules so the
/// ownership check comes first.
pub fn owner_id(body: &Value) -> Result<String, AppError> {
    if !body.is_object() {
        return Err(AppError::Validation(vec![type_mismatch("", "object", body)]));
    }

    match body.get("userId") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        None | Some(Value::Null) | Some(Value::String(_)) => Err(AppError::user_id_required()),
        Some(other) => Err(AppError::Validation(vec![type_mismatch(
            "userId", "string", other,
        )])),
    }
}

/// Check a `PUT /api/events/:id` body. Every field is optional, but present
/// fields follow the same rules as on create. `userId` is handled by
/// [`owner_id`].
pub fn validate_update_event(body: &Value) -> Result<EventChanges, AppError> {
    let mut f = Fields::object(body)?;

    let title = f.string("title");
    f.title(title);

    let description = f.nullable_string("description");
    f.max_len(
        "description",
        description.flatten(),
        DESCRIPTION_MAX,
        "Description must be less than 1000 characters",
    );

    let raw = f.string("startDate");
    let start_date = f.datetime("startDate", raw);
    let raw = f.string("endDate");
    let end_date = f.datetime("endDate", raw);

    let all_day = f.boolean("allDay");
    let color = f.string("color");
    f.color(color);

    let location = f.nullable_string("location");
    f.max_len(
        "location",
        location.flatten(),
        LOCATION_MAX,
        "Location must be less than 200 characters",
    );
    let recurrence = f.nullable_string("recurrence");

    let completed = f.boolean("completed");
    let completed_at = match f.nullable_string("completedAt") {
        Some(Some(raw)) => Some(f.datetime("completedAt", Some(raw))),
        Some(None) => Some(None),
        None => None,
    };

    f.finish(EventChanges {
        title: title.map(String::from),
        description: description.map(|d| d.map(String::from)),
        start_date,
        end_date,
        all_day,
        color: color.map(String::from),
        location: location.map(|l| l.map(String::from)),
        recurrence: recurrence.map(|r| r.map(String::from)),
        completed,
        completed_at,
    })
}

/// Check a `POST /api/users` body and normalize it: the name is trimmed, the
/// email trimmed and lowercased.
pub fn validate_create_user(body: &Value) -> Result<UserInput, AppError> {
    let mut f = Fields::object(body)?;

    let name = match f.string("name") {
        Some(raw) => Some(raw.trim().to_string()),
        None if !f.has("name") => Some(String::new()),
        None => None,
    };
    if let Some(name) = &name {
        if name.is_empty() {
            f.push("name", "Name is required");
        } else if name.chars().count() > NAME_MAX {
            f.push("name", "Name must be less than 100 characters");
        }
    }

    let email = match f.string("email") {
        Some(raw) => Some(raw.trim().to_lowercase()),
        None if !f.has("email") => Some(String::new()),
        None => None,
    };
    if let Some(email) = &email {
        if !RE_EMAIL.is_match(email) {
            f.push("email", "Invalid email address");
        }
        if email.chars().count() > EMAIL_MAX {
            f.push("email", "Email must be less than 200 characters");
        }
    }

    f.finish(UserInput {
        name: name.unwrap_or_default(),
        email: email.unwrap_or_default(),
    })
}
