use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use calendar_shared::User;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    EventFilter, EventPatch, EventRecord, EventRepository, NewEvent, NewUser, SortField,
    SortOrder, StoreError, StoreResult, UserRepository,
};

/// Process-local store with the same semantics as the Postgres schema:
/// unique emails and events owned by an existing user.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    events: RwLock<HashMap<Uuid, EventRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_events(a: &EventRecord, b: &EventRecord, field: SortField) -> Ordering {
    match field {
        SortField::StartDate => a.start_date.cmp(&b.start_date),
        SortField::EndDate => a.end_date.cmp(&b.end_date),
        SortField::Title => a.title.cmp(&b.title),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut list: Vec<User> = users.iter().rev().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("email"));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());

        Ok(created)
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn list_events(&self, filter: &EventFilter) -> StoreResult<(Vec<EventRecord>, i64)> {
        let events = self.events.read().await;

        let mut matching: Vec<EventRecord> = events
            .values()
            .filter(|e| e.user_id == filter.user_id)
            .filter(|e| filter.start_from.map_or(true, |from| e.start_date >= from))
            .filter(|e| filter.end_until.map_or(true, |until| e.end_date <= until))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ord = compare_events(a, b, filter.sort_by);
            let ord = match filter.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as i64;
        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let page = matching.into_iter().skip(offset);
        let page: Vec<EventRecord> = match filter.limit {
            Some(limit) => page.take(limit.max(0) as usize).collect(),
            None => page.collect(),
        };

        Ok((page, total))
    }

    async fn find_event(&self, id: Uuid) -> StoreResult<Option<EventRecord>> {
        let events = self.events.read().await;
        Ok(events.get(&id).cloned())
    }

    async fn create_event(&self, event: NewEvent) -> StoreResult<EventRecord> {
        // Mirror the foreign key on events.user_id
        let owner_exists = self
            .users
            .read()
            .await
            .iter()
            .any(|u| u.id == event.user_id);
        if !owner_exists {
            return Err(StoreError::ForeignKeyViolation("userId"));
        }

        let now = Utc::now();
        let record = EventRecord {
            id: Uuid::new_v4(),
            title: event.title,
            description: event.description,
            start_date: event.start_date,
            end_date: event.end_date,
            all_day: event.all_day,
            color: event.color,
            location: event.location,
            recurrence: event.recurrence,
            completed: event.completed,
            completed_at: event.completed_at,
            created_at: now,
            updated_at: now,
            user_id: event.user_id,
        };

        self.events.write().await.insert(record.id, record.clone());

        Ok(record)
    }

    async fn update_event(
        &self,
        id: Uuid,
        patch: EventPatch,
    ) -> StoreResult<Option<EventRecord>> {
        let mut events = self.events.write().await;
        let Some(record) = events.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            record.title = title;
        }
        if let Some(description) = patch.description {
            record.description = description;
        }
        if let Some(start_date) = patch.start_date {
            record.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            record.end_date = end_date;
        }
        if let Some(all_day) = patch.all_day {
            record.all_day = all_day;
        }
        if let Some(color) = patch.color {
            record.color = color;
        }
        if let Some(location) = patch.location {
            record.location = location;
        }
        if let Some(recurrence) = patch.recurrence {
            record.recurrence = recurrence;
        }
        if let Some(completed) = patch.completed {
            record.completed = completed;
        }
        if let Some(completed_at) = patch.completed_at {
            record.completed_at = completed_at;
        }
        record.updated_at = Utc::now();

        Ok(Some(record.clone()))
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.events.write().await.remove(&id).is_some())
    }
}
