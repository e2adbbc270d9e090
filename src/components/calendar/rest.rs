use super::models::{Course, EventPatch, NewEvent, PersistedEvent};
use super::persistence::{CourseSource, PersistenceService};
use crate::error::{config_error, invalid_target, persistence_error, CalendarResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

/// Client for the dashboard REST API
///
/// Endpoints: `GET/POST /calendar`, `PUT/DELETE /calendar/{id}` and
/// `GET /courses`, all relative to the configured base URL.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RestClient {
    pub fn new(base_url: &str, token: Option<String>) -> CalendarResult<Self> {
        // A trailing slash keeps `join` from dropping the last path segment
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| config_error(&format!("Invalid API URL '{}': {}", base_url, e)))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            token,
        })
    }

    fn endpoint(&self, path: &str) -> CalendarResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| persistence_error(&format!("Failed to build URL for {}: {}", path, e)))
    }

    /// URL of a single stored event
    ///
    /// The id is pushed as one percent-encoded path segment, so `/`, `?`
    /// and `#` inside it cannot leave `calendar/`.
    fn event_endpoint(&self, id: &str) -> CalendarResult<Url> {
        if matches!(id, "" | "." | "..") {
            return Err(invalid_target(id, "not a usable event id"));
        }

        let mut url = self.endpoint("calendar/")?;
        url.path_segments_mut()
            .map_err(|_| persistence_error(&format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> CalendarResult<Response> {
        let response = self.authorize(request).send().await.map_err(|e| {
            error!("Request to {} failed: {}", what, e);
            persistence_error(&format!("Request to {} failed: {}", what, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} returned {}: {}", what, status, body);
            return Err(persistence_error(&format!(
                "{} returned {}: {}",
                what, status, body
            )));
        }

        debug!("{} returned {}", what, status);
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(response: Response, what: &str) -> CalendarResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| persistence_error(&format!("Failed to parse {} response: {}", what, e)))
    }
}

#[async_trait]
impl PersistenceService for RestClient {
    async fn list(&self) -> CalendarResult<Vec<PersistedEvent>> {
        let url = self.endpoint("calendar")?;
        let response = self.send(self.client.get(url), "GET /calendar").await?;
        Self::json(response, "GET /calendar").await
    }

    async fn create(&self, event: NewEvent) -> CalendarResult<PersistedEvent> {
        let url = self.endpoint("calendar")?;
        let response = self
            .send(self.client.post(url).json(&event), "POST /calendar")
            .await?;
        Self::json(response, "POST /calendar").await
    }

    async fn update(&self, id: &str, patch: EventPatch) -> CalendarResult<PersistedEvent> {
        let url = self.event_endpoint(id)?;
        let what = format!("PUT /calendar/{}", id);
        let response = self.send(self.client.put(url).json(&patch), &what).await?;
        Self::json(response, &what).await
    }

    async fn delete(&self, id: &str) -> CalendarResult<()> {
        let url = self.event_endpoint(id)?;
        self.send(self.client.delete(url), &format!("DELETE /calendar/{}", id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CourseSource for RestClient {
    async fn list_courses(&self) -> CalendarResult<Vec<Course>> {
        let url = self.endpoint("courses")?;
        let response = self.send(self.client.get(url), "GET /courses").await?;
        Self::json(response, "GET /courses").await
    }
}
