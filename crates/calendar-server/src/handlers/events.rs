use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use calendar_shared::{
    api::{ApiResponse, EventListParams, ListMeta, OwnerQuery},
    text::sanitize_string,
    time::parse_date_or_datetime,
    Event, UNTITLED_EVENT,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::db::{
    format_event_response, EventFilter, EventPatch, EventRecord, NewEvent, SortField, SortOrder,
    StoreError,
};
use crate::error::AppError;
use crate::routes::AppState;
use crate::validation::{owner_id, validate_create_event, validate_update_event, EventChanges};

use super::parse_id;

fn require_user_id(user_id: Option<String>) -> Result<String, AppError> {
    user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(AppError::user_id_required)
}

/// Fetch an event and make sure `user_id` owns it.
async fn load_owned_event(
    state: &AppState,
    event_id: &str,
    user_id: &str,
) -> Result<EventRecord, AppError> {
    let event = match parse_id(event_id) {
        Some(id) => state.events.find_event(id).await?,
        None => None,
    }
    .ok_or(AppError::NotFound("Event not found"))?;

    if parse_id(user_id) != Some(event.user_id) {
        tracing::debug!(event_id = %event.id, "Ownership check failed");
        return Err(AppError::Forbidden);
    }

    Ok(event)
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<chrono::DateTime<Utc>>, AppError> {
    value
        .map(|raw| {
            parse_date_or_datetime(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid {name}")))
        })
        .transpose()
}

fn parse_count(name: &str, value: Option<&str>) -> Result<Option<i64>, AppError> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("{name} must be a non-negative integer"))
                })
        })
        .transpose()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub params: EventListParams,
}

/// GET /api/events
pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<EventListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Event>>>, AppError> {
    let Query(query) = query?;
    let user_id = require_user_id(query.user_id)?;
    let params = query.params;

    let sort_order = match params.sort_order.as_deref() {
        Some(raw) => SortOrder::parse(raw).ok_or_else(|| {
            AppError::BadRequest("sortOrder must be 'asc' or 'desc'".to_string())
        })?,
        None => SortOrder::default(),
    };
    let limit = parse_count("limit", params.limit.as_deref())?;
    let offset = parse_count("offset", params.offset.as_deref())?;
    let start_from = parse_bound("startDate", params.start_date.as_deref())?;
    let end_until = parse_bound("endDate", params.end_date.as_deref())?;

    let meta = ListMeta {
        total: 0,
        limit,
        offset,
    };

    // An id that is not a UUID owns nothing
    let Some(owner) = parse_id(&user_id) else {
        return Ok(Json(ApiResponse::ok(Vec::new()).with_meta(meta)));
    };

    let filter = EventFilter {
        user_id: owner,
        start_from,
        end_until,
        limit,
        offset,
        sort_by: params
            .sort_by
            .as_deref()
            .map(SortField::parse)
            .unwrap_or_default(),
        sort_order,
    };

    let (records, total) = state.events.list_events(&filter).await?;
    let events = records.into_iter().map(format_event_response).collect();

    Ok(Json(
        ApiResponse::ok(events).with_meta(ListMeta { total, ..meta }),
    ))
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    owner: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let Query(owner) = owner?;
    let user_id = require_user_id(owner.user_id)?;
    let event = load_owned_event(&state, &id, &user_id).await?;

    Ok(Json(ApiResponse::ok(format_event_response(event))))
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Event>>), AppError> {
    let Json(body) = payload?;
    let input = validate_create_event(&body)?;

    // Verify user exists
    let owner = match parse_id(&input.user_id) {
        Some(id) => state.users.find_user(id).await?,
        None => None,
    }
    .ok_or(AppError::NotFound("User not found"))?;

    if input.end_date < input.start_date {
        return Err(AppError::BadRequest(
            "End date must be after start date".to_string(),
        ));
    }

    let completed_at = if input.completed {
        input.completed_at
    } else {
        None
    };

    let new_event = NewEvent {
        user_id: owner.id,
        title: sanitize_string(Some(&input.title)).unwrap_or_else(|| UNTITLED_EVENT.to_string()),
        description: sanitize_string(input.description.as_deref()),
        start_date: input.start_date,
        end_date: input.end_date,
        all_day: input.all_day,
        color: input.color,
        location: sanitize_string(input.location.as_deref()),
        recurrence: input.recurrence,
        completed: input.completed,
        completed_at,
    };

    let record = state
        .events
        .create_event(new_event)
        .await
        .map_err(|e| match e {
            StoreError::ForeignKeyViolation(_) => AppError::NotFound("User not found"),
            other => other.into(),
        })?;

    tracing::debug!(event_id = %record.id, user_id = %owner.id, "Event created");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::ok(format_event_response(record))
                .with_message("Event created successfully"),
        ),
    ))
}

/// Turn validated changes into the columns to write.
fn build_patch(changes: EventChanges) -> EventPatch {
    let mut patch = EventPatch {
        title: changes
            .title
            .map(|t| sanitize_string(Some(&t)).unwrap_or_else(|| UNTITLED_EVENT.to_string())),
        description: changes.description.map(|d| sanitize_string(d.as_deref())),
        start_date: changes.start_date,
        end_date: changes.end_date,
        all_day: changes.all_day,
        color: changes.color,
        location: changes.location.map(|l| sanitize_string(l.as_deref())),
        recurrence: changes.recurrence,
        completed: changes.completed,
        completed_at: changes.completed_at,
    };

    // Completing stamps the time unless one was given; reopening clears it
    if let Some(completed) = changes.completed {
        patch.completed_at = if completed {
            Some(Some(changes.completed_at.flatten().unwrap_or_else(Utc::now)))
        } else {
            Some(None)
        };
    }

    patch
}

/// PUT /api/events/:id
///
/// Ownership is settled before the field rules run, so a caller who does not
/// own the event gets 404/403 whatever the rest of the body holds.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let Json(body) = payload?;
    let user_id = owner_id(&body)?;

    let existing = load_owned_event(&state, &id, &user_id).await?;
    let changes = validate_update_event(&body)?;

    if let (Some(start), Some(end)) = (changes.start_date, changes.end_date) {
        if end < start {
            return Err(AppError::BadRequest(
                "End date must be after start date".to_string(),
            ));
        }
    }

    let record = state
        .events
        .update_event(existing.id, build_patch(changes))
        .await?
        .ok_or(AppError::NotFound("Event not found"))?;

    Ok(Json(
        ApiResponse::ok(format_event_response(record)).with_message("Event updated successfully"),
    ))
}

/// DELETE /api/events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    owner: Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let Query(owner) = owner?;
    let user_id = require_user_id(owner.user_id)?;
    let event = load_owned_event(&state, &id, &user_id).await?;

    if !state.events.delete_event(event.id).await? {
        return Err(AppError::NotFound("Event not found"));
    }

    Ok(Json(ApiResponse::message("Event deleted successfully")))
}
