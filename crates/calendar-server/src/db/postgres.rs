use async_trait::async_trait;
use calendar_shared::User;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    EventFilter, EventPatch, EventRecord, EventRepository, NewEvent, NewUser, StoreError,
    StoreResult, UserRepository,
};

const EVENT_COLUMNS: &str = "id, title, description, start_date, end_date, all_day, color, \
     location, recurrence, completed, completed_at, created_at, updated_at, user_id";

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Appends the `WHERE` clause shared by the list and count queries.
fn push_event_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    builder.push(" WHERE user_id = ").push_bind(filter.user_id);

    if let Some(start_from) = filter.start_from {
        builder.push(" AND start_date >= ").push_bind(start_from);
    }
    if let Some(end_until) = filter.end_until {
        builder.push(" AND end_date <= ").push_bind(end_until);
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();

        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::UniqueViolation("email")
            } else {
                StoreError::Database(e)
            }
        })
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn list_events(&self, filter: &EventFilter) -> StoreResult<(Vec<EventRecord>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        push_event_filter(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {EVENT_COLUMNS} FROM events"));
        push_event_filter(&mut select, filter);
        select.push(format!(
            " ORDER BY {} {}, id ASC",
            filter.sort_by.column(),
            filter.sort_order.keyword()
        ));
        if let Some(limit) = filter.limit {
            select.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = filter.offset {
            select.push(" OFFSET ").push_bind(offset);
        }

        let events = select
            .build_query_as::<EventRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok((events, total))
    }

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<EventRecord>> {
        let event = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn create_event(&self, event: NewEvent) -> StoreResult<EventRecord> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, EventRecord>(&format!(
            r#"
            INSERT INTO events (id, title, description, start_date, end_date, all_day, color,
                                location, recurrence, completed, completed_at, created_at,
                                updated_at, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12, $13)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.all_day)
        .bind(&event.color)
        .bind(&event.location)
        .bind(&event.recurrence)
        .bind(event.completed)
        .bind(event.completed_at)
        .bind(now)
        .bind(event.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::ForeignKeyViolation("userId")
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(record)
    }

    async fn update_event(
        &self,
        id: Uuid,
        patch: EventPatch,
    ) -> StoreResult<Option<EventRecord>> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE events SET updated_at = ");
        builder.push_bind(Utc::now());

        if let Some(title) = patch.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = patch.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(start_date) = patch.start_date {
            builder.push(", start_date = ").push_bind(start_date);
        }
        if let Some(end_date) = patch.end_date {
            builder.push(", end_date = ").push_bind(end_date);
        }
        if let Some(all_day) = patch.all_day {
            builder.push(", all_day = ").push_bind(all_day);
        }
        if let Some(color) = patch.color {
            builder.push(", color = ").push_bind(color);
        }
        if let Some(location) = patch.location {
            builder.push(", location = ").push_bind(location);
        }
        if let Some(recurrence) = patch.recurrence {
            builder.push(", recurrence = ").push_bind(recurrence);
        }
        if let Some(completed) = patch.completed {
            builder.push(", completed = ").push_bind(completed);
        }
        if let Some(completed_at) = patch.completed_at {
            builder.push(", completed_at = ").push_bind(completed_at);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(format!(" RETURNING {EVENT_COLUMNS}"));

        let record = builder
            .build_query_as::<EventRecord>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
