//! Reqwest-backed gateway for the fitness REST API.
//!
//! This adapter owns transport details only: URL building, bearer
//! credentials, timeout and HTTP error mapping, and envelope decoding into
//! domain records.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::Page;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{BulkImportRequestDto, EnvelopeDto, ErrorBodyDto, WaterRequestDto};
use super::query::{ListQuery, QueryPairs};
use crate::domain::ports::{
    CredentialSource, GatewayError, GoalGateway, NutritionGateway, WeightGateway, WorkoutGateway,
};
use crate::domain::{
    BulkImportResult, DailyNutrition, Goal, GoalDraft, GoalPatch, GoalQuery, Meal, MealDraft,
    MealPatch, MealQuery, ProgressUpdate, RecordId, StatusChange, TrendPeriod, WaterIntake,
    WeightComparison, WeightDraft, WeightEntry, WeightPatch, WeightQuery, WeightSummary,
    WeightTrends, Workout, WorkoutDraft, WorkoutPatch, WorkoutQuery,
};

/// Gateway adapter talking to one REST API base URL.
///
/// Implements every domain gateway port, so a single instance can back all
/// four slices.
pub struct RestGateway {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialSource>,
}

impl RestGateway {
    /// Build an adapter using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, GatewayError> {
        let url = endpoint(&self.base_url, segments)?;
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        Ok(match self.credentials.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    fn get_request(
        &self,
        segments: &[&str],
        query: &QueryPairs,
    ) -> Result<RequestBuilder, GatewayError> {
        Ok(self.request(Method::GET, segments)?.query(query))
    }

    fn with_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<RequestBuilder, GatewayError> {
        Ok(self.request(method, segments)?.json(body))
    }

    async fn send(builder: RequestBuilder) -> Result<Vec<u8>, GatewayError> {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let error = map_status_error(status, body.as_ref());
            debug!(
                status = status.as_u16(),
                kind = error.label(),
                error = %error,
                "gateway request failed"
            );
            return Err(error);
        }
        Ok(body.to_vec())
    }

    async fn exchange<T: DeserializeOwned>(
        builder: RequestBuilder,
    ) -> Result<EnvelopeDto<T>, GatewayError> {
        let body = Self::send(builder).await?;
        decode_envelope(&body)
    }

    async fn fetch<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, GatewayError> {
        Self::exchange(builder)
            .await?
            .into_data()
            .map_err(GatewayError::decode)
    }

    async fn fetch_page<T: DeserializeOwned>(
        builder: RequestBuilder,
    ) -> Result<Page<T>, GatewayError> {
        Self::exchange::<Vec<T>>(builder)
            .await?
            .into_page()
            .map_err(GatewayError::decode)
    }

    async fn delete_at(&self, segments: &[&str]) -> Result<(), GatewayError> {
        Self::send(self.request(Method::DELETE, segments)?).await?;
        Ok(())
    }
}

#[async_trait]
impl GoalGateway for RestGateway {
    async fn list(&self, query: &GoalQuery) -> Result<Page<Goal>, GatewayError> {
        Self::fetch_page(self.get_request(&["goals"], &query.query_pairs())?).await
    }

    async fn get(&self, id: &RecordId) -> Result<Goal, GatewayError> {
        Self::fetch(self.get_request(&["goals", id.as_ref()], &QueryPairs::new())?).await
    }

    async fn create(&self, draft: &GoalDraft) -> Result<Goal, GatewayError> {
        Self::fetch(self.with_body(Method::POST, &["goals"], draft)?).await
    }

    async fn update(&self, id: &RecordId, patch: &GoalPatch) -> Result<Goal, GatewayError> {
        Self::fetch(self.with_body(Method::PUT, &["goals", id.as_ref()], patch)?).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.delete_at(&["goals", id.as_ref()]).await
    }

    async fn update_progress(
        &self,
        id: &RecordId,
        update: &ProgressUpdate,
    ) -> Result<Goal, GatewayError> {
        let segments = ["goals", id.as_ref(), "progress"];
        Self::fetch(self.with_body(Method::PUT, &segments, update)?).await
    }

    async fn update_status(
        &self,
        id: &RecordId,
        change: &StatusChange,
    ) -> Result<Goal, GatewayError> {
        let segments = ["goals", id.as_ref(), "status"];
        Self::fetch(self.with_body(Method::PUT, &segments, change)?).await
    }

    async fn sync(&self, id: &RecordId) -> Result<Goal, GatewayError> {
        let segments = ["goals", id.as_ref(), "sync"];
        Self::fetch(self.request(Method::POST, &segments)?).await
    }
}

#[async_trait]
impl WeightGateway for RestGateway {
    async fn list(&self, query: &WeightQuery) -> Result<Page<WeightEntry>, GatewayError> {
        Self::fetch_page(self.get_request(&["weight"], &query.query_pairs())?).await
    }

    async fn get(&self, id: &RecordId) -> Result<WeightEntry, GatewayError> {
        Self::fetch(self.get_request(&["weight", id.as_ref()], &QueryPairs::new())?).await
    }

    async fn create(&self, draft: &WeightDraft) -> Result<WeightEntry, GatewayError> {
        Self::fetch(self.with_body(Method::POST, &["weight"], draft)?).await
    }

    async fn update(
        &self,
        id: &RecordId,
        patch: &WeightPatch,
    ) -> Result<WeightEntry, GatewayError> {
        Self::fetch(self.with_body(Method::PUT, &["weight", id.as_ref()], patch)?).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.delete_at(&["weight", id.as_ref()]).await
    }

    async fn get_trends(&self, period: TrendPeriod) -> Result<WeightTrends, GatewayError> {
        let query = vec![("period", period.as_str().to_owned())];
        Self::fetch(self.get_request(&["weight", "trends"], &query)?).await
    }

    async fn get_summary(&self) -> Result<WeightSummary, GatewayError> {
        Self::fetch(self.get_request(&["weight", "summary"], &QueryPairs::new())?).await
    }

    async fn get_latest(&self) -> Result<Option<WeightEntry>, GatewayError> {
        let builder = self.get_request(&["weight", "latest"], &QueryPairs::new())?;
        match Self::exchange::<WeightEntry>(builder).await {
            Ok(envelope) => Ok(envelope.into_optional()),
            Err(GatewayError::NotFound { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn compare_entries(
        &self,
        from: &RecordId,
        to: &RecordId,
    ) -> Result<WeightComparison, GatewayError> {
        let query = vec![("from", from.to_string()), ("to", to.to_string())];
        Self::fetch(self.get_request(&["weight", "compare"], &query)?).await
    }

    async fn bulk_import(
        &self,
        drafts: Vec<WeightDraft>,
    ) -> Result<BulkImportResult, GatewayError> {
        let body = BulkImportRequestDto { entries: &drafts };
        Self::fetch(self.with_body(Method::POST, &["weight", "bulk"], &body)?).await
    }
}

#[async_trait]
impl NutritionGateway for RestGateway {
    async fn list(&self, query: &MealQuery) -> Result<Page<Meal>, GatewayError> {
        Self::fetch_page(self.get_request(&["nutrition", "meals"], &query.query_pairs())?).await
    }

    async fn get(&self, id: &RecordId) -> Result<Meal, GatewayError> {
        let segments = ["nutrition", "meals", id.as_ref()];
        Self::fetch(self.get_request(&segments, &QueryPairs::new())?).await
    }

    async fn create(&self, draft: &MealDraft) -> Result<Meal, GatewayError> {
        Self::fetch(self.with_body(Method::POST, &["nutrition", "meals"], draft)?).await
    }

    async fn update(&self, id: &RecordId, patch: &MealPatch) -> Result<Meal, GatewayError> {
        let segments = ["nutrition", "meals", id.as_ref()];
        Self::fetch(self.with_body(Method::PUT, &segments, patch)?).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.delete_at(&["nutrition", "meals", id.as_ref()]).await
    }

    async fn add_water_intake(
        &self,
        date: NaiveDate,
        amount_ml: u32,
    ) -> Result<WaterIntake, GatewayError> {
        let body = WaterRequestDto { date, amount_ml };
        Self::fetch(self.with_body(Method::POST, &["nutrition", "water"], &body)?).await
    }

    async fn get_daily_nutrition(&self, date: NaiveDate) -> Result<DailyNutrition, GatewayError> {
        let day = date.format("%Y-%m-%d").to_string();
        let segments = ["nutrition", "daily", day.as_str()];
        Self::fetch(self.get_request(&segments, &QueryPairs::new())?).await
    }
}

#[async_trait]
impl WorkoutGateway for RestGateway {
    async fn list(&self, query: &WorkoutQuery) -> Result<Page<Workout>, GatewayError> {
        Self::fetch_page(self.get_request(&["workouts"], &query.query_pairs())?).await
    }

    async fn get(&self, id: &RecordId) -> Result<Workout, GatewayError> {
        Self::fetch(self.get_request(&["workouts", id.as_ref()], &QueryPairs::new())?).await
    }

    async fn create(&self, draft: &WorkoutDraft) -> Result<Workout, GatewayError> {
        Self::fetch(self.with_body(Method::POST, &["workouts"], draft)?).await
    }

    async fn update(&self, id: &RecordId, patch: &WorkoutPatch) -> Result<Workout, GatewayError> {
        Self::fetch(self.with_body(Method::PUT, &["workouts", id.as_ref()], patch)?).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.delete_at(&["workouts", id.as_ref()]).await
    }
}

/// Append `segments` to the base URL's path, percent-encoding each one.
fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url, GatewayError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| GatewayError::connection(format!("base url `{base_url}` cannot hold a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<EnvelopeDto<T>, GatewayError> {
    serde_json::from_slice(body)
        .map_err(|error| GatewayError::decode(format!("invalid response envelope: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_decode() {
        GatewayError::decode(error.to_string())
    } else {
        GatewayError::connection(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GatewayError {
    let message = serde_json::from_slice::<ErrorBodyDto>(body)
        .ok()
        .and_then(ErrorBodyDto::reason)
        .unwrap_or_else(|| {
            let preview = body_preview(body);
            if preview.is_empty() {
                format!("status {}", status.as_u16())
            } else {
                format!("status {}: {preview}", status.as_u16())
            }
        });

    match status {
        StatusCode::UNAUTHORIZED => GatewayError::unauthorized(message),
        StatusCode::NOT_FOUND => GatewayError::not_found(message),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            GatewayError::connection(message)
        }
        _ => GatewayError::rejected(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network REST mapping helpers.

    use super::*;
    use rstest::rstest;

    fn base(raw: &str) -> Url {
        Url::parse(raw).expect("valid url")
    }

    #[rstest]
    #[case("http://localhost:3000/api", &["goals"], "http://localhost:3000/api/goals")]
    #[case("http://localhost:3000/api/", &["goals", "g-1"], "http://localhost:3000/api/goals/g-1")]
    #[case(
        "https://fit.example/v1",
        &["nutrition", "daily", "2024-01-15"],
        "https://fit.example/v1/nutrition/daily/2024-01-15"
    )]
    fn endpoints_extend_base_path(
        #[case] base_url: &str,
        #[case] segments: &[&str],
        #[case] expected: &str,
    ) {
        let url = endpoint(&base(base_url), segments).expect("base accepts a path");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    fn endpoint_segments_are_encoded() {
        let url = endpoint(&base("http://localhost/api"), &["goals", "a/b c"])
            .expect("base accepts a path");
        assert_eq!(url.as_str(), "http://localhost/api/goals/a%2Fb%20c");
    }

    #[rstest]
    fn cannot_be_a_base_urls_are_rejected() {
        let error = endpoint(&base("mailto:coach@fit.example"), &["goals"])
            .expect_err("mailto urls have no path segments");
        assert!(matches!(error, GatewayError::Connection { .. }));
    }

    #[rstest]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, "unauthorized")]
    #[case::not_found(StatusCode::NOT_FOUND, "not_found")]
    #[case::bad_request(StatusCode::BAD_REQUEST, "rejected")]
    #[case::conflict(StatusCode::CONFLICT, "rejected")]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "rejected")]
    #[case::unavailable(StatusCode::SERVICE_UNAVAILABLE, "connection")]
    fn maps_http_statuses_to_gateway_errors(#[case] status: StatusCode, #[case] label: &str) {
        let error = map_status_error(status, br#"{"message":"Goal not found"}"#);
        assert_eq!(error.label(), label);
        assert_eq!(error.message(), "Goal not found");
    }

    #[rstest]
    fn status_error_falls_back_to_body_preview() {
        let error = map_status_error(StatusCode::BAD_REQUEST, b"<html>  bad\n request </html>");
        assert_eq!(error.message(), "status 400: <html> bad request </html>");

        let empty = map_status_error(StatusCode::BAD_REQUEST, b"");
        assert_eq!(empty.message(), "status 400");
    }

    #[rstest]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }

    #[rstest]
    fn goal_envelope_decodes_into_domain() {
        let body = br#"{
            "data": {
                "id": "g-1",
                "title": "Run 70km",
                "category": "fitness",
                "type": "endurance",
                "status": "active",
                "priority": "medium",
                "targetValue": 70,
                "currentValue": 35,
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-02T00:00:00Z"
            },
            "message": "ok"
        }"#;

        let goal: Goal = decode_envelope::<Goal>(body)
            .expect("envelope decodes")
            .into_data()
            .expect("data present");

        assert_eq!(goal.id.as_ref(), "g-1");
        assert_eq!(goal.current_value, 35.0);
    }

    #[rstest]
    fn malformed_envelope_is_a_decode_error() {
        let error = decode_envelope::<Goal>(b"not json").expect_err("decode should fail");
        assert!(matches!(error, GatewayError::Decode { .. }));
    }
}
