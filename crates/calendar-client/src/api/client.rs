use calendar_shared::{
    api::{
        ApiResponse, CreateEventRequest, CreateUserRequest, EventListParams, ListMeta, OwnerQuery,
        UpdateEventRequest,
    },
    Event, User,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Access denied")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("Too many requests, try again later")]
    RateLimited,
    #[error("Server error: {0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// One page of `GET /api/events`.
#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub meta: ListMeta,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build URL for endpoint
    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn owner(user_id: Uuid) -> OwnerQuery {
        OwnerQuery {
            user_id: Some(user_id.to_string()),
        }
    }

    // ============ Events ============

    pub async fn list_events(
        &self,
        user_id: Uuid,
        params: &EventListParams,
    ) -> Result<EventPage, ApiError> {
        let response = self
            .client
            .get(self.url("/events"))
            .query(&Self::owner(user_id))
            .query(params)
            .send()
            .await?;

        let envelope = read_envelope::<Vec<Event>>(response).await?;
        let meta = envelope.meta.clone().unwrap_or_default();
        Ok(EventPage {
            events: into_data(envelope)?,
            meta,
        })
    }

    pub async fn get_event(&self, user_id: Uuid, id: Uuid) -> Result<Event, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/events/{}", id)))
            .query(&Self::owner(user_id))
            .send()
            .await?;

        into_data(read_envelope(response).await?)
    }

    pub async fn create_event(
        &self,
        user_id: Uuid,
        mut req: CreateEventRequest,
    ) -> Result<Event, ApiError> {
        req.user_id = Some(user_id.to_string());
        let response = self
            .client
            .post(self.url("/events"))
            .json(&req)
            .send()
            .await?;

        into_data(read_envelope(response).await?)
    }

    pub async fn update_event(
        &self,
        user_id: Uuid,
        id: Uuid,
        mut req: UpdateEventRequest,
    ) -> Result<Event, ApiError> {
        req.user_id = Some(user_id.to_string());
        let response = self
            .client
            .put(self.url(&format!("/events/{}", id)))
            .json(&req)
            .send()
            .await?;

        into_data(read_envelope(response).await?)
    }

    pub async fn delete_event(&self, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/events/{}", id)))
            .query(&Self::owner(user_id))
            .send()
            .await?;

        read_envelope::<()>(response).await?;
        Ok(())
    }

    // ============ Users ============

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let response = self.client.get(self.url("/users")).send().await?;
        into_data(read_envelope(response).await?)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/users/{}", id)))
            .send()
            .await?;

        into_data(read_envelope(response).await?)
    }

    /// Sign up, or sign back in when the email is already known.
    /// The flag is `true` when a new account was created.
    pub async fn create_user(&self, name: &str, email: &str) -> Result<(User, bool), ApiError> {
        let response = self
            .client
            .post(self.url("/users"))
            .json(&CreateUserRequest {
                name: name.to_string(),
                email: email.to_string(),
            })
            .send()
            .await?;

        let created = response.status() == StatusCode::CREATED;
        let user = into_data(read_envelope(response).await?)?;
        Ok((user, created))
    }
}

async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ApiResponse<T>, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&text).map_err(|e| {
            ApiError::Server(format!("{}: unreadable response body ({})", status, e))
        });
    }

    Err(error_from_body(status, &text))
}

fn into_data<T>(envelope: ApiResponse<T>) -> Result<T, ApiError> {
    envelope
        .data
        .ok_or_else(|| ApiError::Server("Response carried no data".to_string()))
}

/// Map a failed response to an error, preferring the envelope's message.
fn error_from_body(status: StatusCode, text: &str) -> ApiError {
    let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(text)
        .ok()
        .and_then(|envelope| envelope.error)
        .map(|error| error.describe())
        .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| "An error occurred".to_string());

    match status {
        StatusCode::BAD_REQUEST => ApiError::Validation(message),
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        _ => ApiError::Server(format!("{}: {}", status, message)),
    }
}
