use crate::token::TokenCache;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use voyra_core::config::ProviderConfig;
use voyra_core::provider::{
    BoardTypeDto, BookingConfirmation, CancellationConfirmation, CurrencyDto, FacilityDto,
    HotelDetailDto, HotelListItem, LocationDto, ProviderBookingRequest, ProviderClient,
    ProviderToken, ReservationDetail, RoomAttributeDto, RoomSearchRequest, RoomSearchResponse,
};
use voyra_core::{EngineError, EngineResult};

/// JSON/HTTP implementation of the provider client.
///
/// Owns credential acquisition and refresh through [`TokenCache`]; every
/// request carries the client-level bounded timeout. Transport failures map
/// to `UpstreamUnavailable`, provider business rejections to
/// `UpstreamRejected` with the provider's reason.
pub struct HttpProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    tokens: TokenCache,
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    api_key: &'a str,
    api_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    refresh_token: String,
    expires_in_seconds: i64,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
    code: Option<String>,
}

impl HttpProviderClient {
    pub fn new(config: &ProviderConfig) -> EngineResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| EngineError::ConfigurationError(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.expose().clone(),
            tokens: TokenCache::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange credentials (or a still-valid refresh token) for a new token.
    async fn renew_token(&self, previous: Option<ProviderToken>) -> EngineResult<ProviderToken> {
        let refresh = previous.as_ref().map(|t| t.refresh_token.as_str());
        let body = AuthRequest {
            api_key: &self.api_key,
            api_secret: &self.api_secret,
            refresh_token: refresh,
        };

        debug!(refreshing = refresh.is_some(), "Authenticating against provider");
        let response = self
            .http
            .post(self.url("/auth/token"))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let auth: AuthResponse = decode(response).await?;
        Ok(ProviderToken {
            token: auth.token,
            refresh_token: auth.refresh_token,
            expires_at: Utc::now() + Duration::seconds(auth.expires_in_seconds),
        })
    }

    async fn bearer(&self) -> EngineResult<String> {
        self.tokens.bearer(|previous| self.renew_token(previous)).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> EngineResult<T> {
        let bearer = self.bearer().await?;
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(bearer)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        self.check_auth(&response).await;
        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> EngineResult<T> {
        let bearer = self.bearer().await?;
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        self.check_auth(&response).await;
        decode(response).await
    }

    /// GET that treats 404 as a legitimate "no record" rather than an error.
    async fn get_json_opt<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> EngineResult<Option<T>> {
        let bearer = self.bearer().await?;
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(bearer)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.check_auth(&response).await;
        decode(response).await.map(Some)
    }

    async fn delete_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> EngineResult<T> {
        let bearer = self.bearer().await?;
        let response = self
            .http
            .delete(self.url(path))
            .bearer_auth(bearer)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        self.check_auth(&response).await;
        decode(response).await
    }

    /// A 401 means the token went bad server-side before its advertised
    /// expiry; drop it so the next call re-authenticates.
    async fn check_auth(&self, response: &reqwest::Response) {
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Provider rejected token before advertised expiry, invalidating");
            self.tokens.invalidate().await;
        }
    }
}

fn transport_error(err: reqwest::Error) -> EngineError {
    EngineError::UpstreamUnavailable(err.to_string())
}

/// Decode a provider response, mapping non-2xx statuses onto the error
/// taxonomy: 4xx is a business rejection, everything else is unavailability.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> EngineResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| EngineError::UpstreamUnavailable(format!("malformed response: {e}")));
    }

    let body = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<ProviderErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.code))
        .unwrap_or_else(|| format!("HTTP {status}"));

    if status.is_client_error() {
        Err(EngineError::UpstreamRejected(reason))
    } else {
        Err(EngineError::UpstreamUnavailable(reason))
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn search_rooms(&self, request: &RoomSearchRequest) -> EngineResult<RoomSearchResponse> {
        self.post_json("/rooms/search", request).await
    }

    async fn hotel_detail(&self, feed_id: &str, hotel_code: &str) -> EngineResult<HotelDetailDto> {
        self.get_json(
            &format!("/hotels/{hotel_code}"),
            &[("feed_id", feed_id.to_string())],
        )
        .await
    }

    async fn hotel_list(
        &self,
        feed_id: &str,
        last_revision: Option<DateTime<Utc>>,
    ) -> EngineResult<Vec<HotelListItem>> {
        let mut query = vec![("feed_id", feed_id.to_string())];
        if let Some(revision) = last_revision {
            query.push(("last_revision_date", revision.to_rfc3339()));
        }
        self.get_json("/hotels", &query).await
    }

    async fn create_booking(
        &self,
        request: &ProviderBookingRequest,
    ) -> EngineResult<BookingConfirmation> {
        self.post_json("/bookings", request).await
    }

    async fn reservation_detail(
        &self,
        feed_id: &str,
        booking_number: &str,
    ) -> EngineResult<ReservationDetail> {
        self.get_json(
            &format!("/bookings/{booking_number}"),
            &[("feed_id", feed_id.to_string())],
        )
        .await
    }

    async fn reservation_by_client_reference(
        &self,
        feed_id: &str,
        client_reference_id: &str,
    ) -> EngineResult<Option<ReservationDetail>> {
        self.get_json_opt(
            &format!("/bookings/by-reference/{client_reference_id}"),
            &[("feed_id", feed_id.to_string())],
        )
        .await
    }

    async fn cancel_booking(
        &self,
        feed_id: &str,
        booking_number: &str,
    ) -> EngineResult<CancellationConfirmation> {
        self.delete_json(
            &format!("/bookings/{booking_number}"),
            &[("feed_id", feed_id.to_string())],
        )
        .await
    }

    async fn currencies(&self, feed_id: &str) -> EngineResult<Vec<CurrencyDto>> {
        self.get_json("/reference/currencies", &[("feed_id", feed_id.to_string())])
            .await
    }

    async fn board_types(&self, feed_id: &str) -> EngineResult<Vec<BoardTypeDto>> {
        self.get_json("/reference/board-types", &[("feed_id", feed_id.to_string())])
            .await
    }

    async fn facilities(&self, feed_id: &str) -> EngineResult<Vec<FacilityDto>> {
        self.get_json("/reference/facilities", &[("feed_id", feed_id.to_string())])
            .await
    }

    async fn room_attributes(&self, feed_id: &str) -> EngineResult<Vec<RoomAttributeDto>> {
        self.get_json(
            "/reference/room-attributes",
            &[("feed_id", feed_id.to_string())],
        )
        .await
    }

    async fn locations(&self, feed_id: &str) -> EngineResult<Vec<LocationDto>> {
        self.get_json("/reference/locations", &[("feed_id", feed_id.to_string())])
            .await
    }
}
