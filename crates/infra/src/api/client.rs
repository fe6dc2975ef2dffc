//! Dictators Club REST API
//!
//! Typed endpoints over [`AuthorizedClient`]. Public and protected calls go
//! through the same pipeline; public ones simply work without a token.

use std::sync::Arc;

use dictators_domain::constants::{
    ENDPOINT_ACHIEVEMENTS, ENDPOINT_DICTATORS, ENDPOINT_INIT_SAMPLE_DATA,
};
use dictators_domain::{
    Achievement, CreateAchievementRequest, Dictator, UpdateAchievementRequest,
    UpsertDictatorRequest,
};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::errors::ApiError;
use crate::http::{AuthorizedClient, PendingRequest};

/// Client for the Dictators Club backend
#[derive(Debug, Clone)]
pub struct DictatorsApi {
    client: Arc<AuthorizedClient>,
}

impl DictatorsApi {
    pub fn new(client: Arc<AuthorizedClient>) -> Self {
        Self { client }
    }

    // Public endpoints

    /// List all dictators
    ///
    /// # Errors
    /// Returns error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn get_dictators(&self) -> Result<Vec<Dictator>, ApiError> {
        self.fetch(PendingRequest::get(ENDPOINT_DICTATORS)).await
    }

    /// Get one dictator
    ///
    /// # Errors
    /// Returns [`ApiError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub async fn get_dictator_by_id(&self, id: i64) -> Result<Dictator, ApiError> {
        self.fetch(PendingRequest::get(format!("{ENDPOINT_DICTATORS}/{id}"))).await
    }

    /// List all achievements
    ///
    /// # Errors
    /// Returns error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn get_achievements(&self) -> Result<Vec<Achievement>, ApiError> {
        self.fetch(PendingRequest::get(ENDPOINT_ACHIEVEMENTS)).await
    }

    /// Get one achievement
    ///
    /// # Errors
    /// Returns [`ApiError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub async fn get_achievement_by_id(&self, id: i64) -> Result<Achievement, ApiError> {
        self.fetch(PendingRequest::get(format!("{ENDPOINT_ACHIEVEMENTS}/{id}"))).await
    }

    /// List the achievements of one dictator
    ///
    /// # Errors
    /// Returns error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn get_dictator_achievements(
        &self,
        dictator_id: i64,
    ) -> Result<Vec<Achievement>, ApiError> {
        let path = format!("{ENDPOINT_DICTATORS}/{dictator_id}{ENDPOINT_ACHIEVEMENTS}");
        self.fetch(PendingRequest::get(path)).await
    }

    /// Seed the backend with sample data (development only)
    ///
    /// # Errors
    /// Returns error if the request fails or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn init_sample_data(&self) -> Result<(), ApiError> {
        self.run(PendingRequest::post(ENDPOINT_INIT_SAMPLE_DATA)).await
    }

    // Protected endpoints

    /// Create the caller's profile, or update it when `id` is set
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] without a usable session.
    #[instrument(skip(self, request), fields(id = ?request.id))]
    pub async fn create_or_update_dictator(
        &self,
        request: &UpsertDictatorRequest,
    ) -> Result<Dictator, ApiError> {
        self.fetch(PendingRequest::post(ENDPOINT_DICTATORS).json(request)?).await
    }

    /// Delete a dictator profile
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] without a usable session.
    #[instrument(skip(self))]
    pub async fn delete_dictator(&self, id: i64) -> Result<(), ApiError> {
        self.run(PendingRequest::delete(format!("{ENDPOINT_DICTATORS}/{id}"))).await
    }

    /// Add an achievement to a dictator
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] without a usable session.
    #[instrument(skip(self, request))]
    pub async fn create_achievement(
        &self,
        dictator_id: i64,
        request: &CreateAchievementRequest,
    ) -> Result<Achievement, ApiError> {
        let path = format!("{ENDPOINT_DICTATORS}/{dictator_id}{ENDPOINT_ACHIEVEMENTS}");
        self.fetch(PendingRequest::post(path).json(request)?).await
    }

    /// Update some fields of an achievement
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] without a usable session.
    #[instrument(skip(self, request))]
    pub async fn update_achievement(
        &self,
        id: i64,
        request: &UpdateAchievementRequest,
    ) -> Result<Achievement, ApiError> {
        let path = format!("{ENDPOINT_ACHIEVEMENTS}/{id}");
        self.fetch(PendingRequest::put(path).json(request)?).await
    }

    /// Delete an achievement
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] without a usable session.
    #[instrument(skip(self))]
    pub async fn delete_achievement(&self, id: i64) -> Result<(), ApiError> {
        self.run(PendingRequest::delete(format!("{ENDPOINT_ACHIEVEMENTS}/{id}"))).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T, ApiError> {
        let response = self.checked(request).await?;
        response.json().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn run(&self, request: PendingRequest) -> Result<(), ApiError> {
        let response = self.checked(request).await?;
        if response.status() != StatusCode::NO_CONTENT {
            // Unit endpoints may still send a body; it carries nothing we need.
            if let Err(e) = response.bytes().await {
                debug!(error = %e, "discarding unreadable body of unit response");
            }
        }
        Ok(())
    }

    async fn checked(&self, request: PendingRequest) -> Result<Response, ApiError> {
        let response = self.client.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            debug!(%status, "request successful");
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, &url, &body);
        warn!(%status, category = ?error.category(), "request failed");
        Err(error)
    }
}
