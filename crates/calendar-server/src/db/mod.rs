//! Persistence seam. Handlers talk to the repository traits; `PgStore` backs
//! them with Postgres and `MemoryStore` keeps everything in process.

use async_trait::async_trait;
use calendar_shared::{Event, User};
use chrono::{DateTime, Utc};
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Unique constraint failed on the field: `{0}`")]
    UniqueViolation(&'static str),

    #[error("Foreign key constraint failed on the field: `{0}`")]
    ForeignKeyViolation(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored event row, including the owner column that is never sent to
/// clients.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EventRecord {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
}

/// Project a stored row onto the public event fields.
pub fn format_event_response(record: EventRecord) -> Event {
    Event {
        id: record.id,
        title: record.title,
        description: record.description,
        start_date: record.start_date,
        end_date: record.end_date,
        all_day: record.all_day,
        color: record.color,
        location: record.location,
        recurrence: record.recurrence,
        completed: record.completed,
        completed_at: record.completed_at,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// A fully validated event ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub user_id: Uuid,
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
}

/// Partial update. `None` leaves a column untouched; for nullable columns
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
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

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    StartDate,
    EndDate,
    Title,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Unknown names fall back to `startDate`.
    pub fn parse(name: &str) -> Self {
        match name {
            "endDate" => SortField::EndDate,
            "title" => SortField::Title,
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            _ => SortField::StartDate,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortField::StartDate => "start_date",
            SortField::EndDate => "end_date",
            SortField::Title => "title",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Window and paging for listing one user's events.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub user_id: Uuid,
    /// Events starting at or after this instant.
    pub start_from: Option<DateTime<Utc>>,
    /// Events ending at or before this instant.
    pub end_until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::UniqueViolation`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Matching page of events plus the total count ignoring paging.
    async fn list_events(&self, filter: &EventFilter) -> StoreResult<(Vec<EventRecord>, i64)>;

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<EventRecord>>;

    async fn create_event(&self, event: NewEvent) -> StoreResult<EventRecord>;

    /// Returns `None` if the event no longer exists.
    async fn update_event(&self, id: Uuid, patch: EventPatch)
        -> StoreResult<Option<EventRecord>>;

    /// Returns whether a row was removed.
    async fn delete_event(&self, id: Uuid) -> StoreResult<bool>;
}
