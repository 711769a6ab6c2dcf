// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Calendar API client and gateway service.
//!
//! Handles:
//! - Authorization-URL generation with a signed state parameter
//! - Code-for-token exchange and storage in the token vault
//! - Access-token refresh when expired (per-user refresh locks)
//! - Event create/update/delete/list against the user's primary calendar
//!
//! Every provider call takes the access token as an explicit parameter;
//! nothing mutates shared client state between requests.

use crate::error::AppError;
use crate::models::CalendarEvent;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// OAuth scope requested for event read/write access.
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Default page size for event listing.
const DEFAULT_EVENT_LIMIT: u32 = 10;

/// Google Calendar API client.
#[derive(Clone)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    api_base: String,
    token_url: String,
    auth_base: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleCalendarClient {
    /// Create a new calendar client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            auth_base: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    /// Provider-hosted consent URL carrying the opaque state token.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
            self.auth_base,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(CALENDAR_SCOPE),
            state,
        )
    }

    /// Exchange an authorization code for a token set.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::CalendarApi(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange failed");
            return Err(AppError::CalendarApi(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::CalendarApi(format!("Failed to parse token response: {}", e)))
    }

    /// Refresh an expired access token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<GoogleTokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::CalendarApi(format!("Token refresh request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// List events from the user's primary calendar, ordered by start time.
    pub async fn list_events(
        &self,
        access_token: &str,
        time_min: Option<&str>,
        time_max: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<GoogleEvent>, AppError> {
        let url = format!("{}/calendars/primary/events", self.api_base);

        let mut query: Vec<(&str, String)> = vec![
            ("maxResults", max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(min) = time_min {
            query.push(("timeMin", min.to_string()));
        }
        if let Some(max) = time_max {
            query.push(("timeMax", max.to_string()));
        }

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::CalendarApi(e.to_string()))?;

        let listing: EventsListResponse = self.check_response_json(response).await?;
        Ok(listing.items.unwrap_or_default())
    }

    /// Insert an event into the user's primary calendar.
    pub async fn insert_event(
        &self,
        access_token: &str,
        summary: &str,
        description: Option<&str>,
        start: &str,
        end: &str,
    ) -> Result<GoogleEvent, AppError> {
        let url = format!("{}/calendars/primary/events", self.api_base);
        let body = event_resource(summary, description, start, end);

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::CalendarApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Replace an existing event.
    pub async fn update_event(
        &self,
        access_token: &str,
        event_id: &str,
        summary: &str,
        description: Option<&str>,
        start: &str,
        end: &str,
    ) -> Result<GoogleEvent, AppError> {
        let url = format!(
            "{}/calendars/primary/events/{}",
            self.api_base,
            urlencoding::encode(event_id)
        );
        let body = event_resource(summary, description, start, end);

        let response = self
            .http
            .put(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::CalendarApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Delete an event.
    pub async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/calendars/primary/events/{}",
            self.api_base,
            urlencoding::encode(event_id)
        );

        let response = self
            .http
            .delete(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::CalendarApi(e.to_string()))?;

        self.check_response(response).await
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // Unauthorized - token expired or revoked
        if status.as_u16() == 401 {
            return Err(AppError::CalendarApi(
                AppError::GOOGLE_TOKEN_ERROR.to_string(),
            ));
        }

        if status.as_u16() == 404 {
            return Err(AppError::EventNotFound(body));
        }

        Err(AppError::CalendarApi(format!("HTTP {}: {}", status, body)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::CalendarApi(
                    AppError::GOOGLE_TOKEN_ERROR.to_string(),
                ));
            }

            if status.as_u16() == 404 {
                return Err(AppError::EventNotFound(body));
            }

            return Err(AppError::CalendarApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::CalendarApi(format!("JSON parse error: {}", e)))
    }
}

/// Event request body in the provider's wire shape.
fn event_resource(
    summary: &str,
    description: Option<&str>,
    start: &str,
    end: &str,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "summary": summary,
        "start": { "dateTime": start },
        "end": { "dateTime": end },
    });
    if let Some(text) = description {
        body["description"] = serde_json::Value::String(text.to_string());
    }
    body
}

/// Token response from the Google OAuth endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    /// Only present on the initial consent exchange
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    pub scope: Option<String>,
}

/// Event start/end in the provider's representation: an instant for timed
/// events, a bare date for all-day events.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleEventTime {
    #[serde(rename = "dateTime")]
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl GoogleEventTime {
    /// Instant if present, else the bare date passed through unmodified.
    fn into_value(self) -> String {
        self.date_time.or(self.date).unwrap_or_default()
    }
}

/// Events-list response from the provider.
#[derive(Debug, Clone, Deserialize)]
struct EventsListResponse {
    items: Option<Vec<GoogleEvent>>,
}

/// Event response from the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<GoogleEventTime>,
    pub end: Option<GoogleEventTime>,
    #[serde(rename = "htmlLink")]
    pub html_link: Option<String>,
}

impl GoogleEvent {
    /// Map the provider representation to the API model.
    pub fn into_event(self) -> CalendarEvent {
        CalendarEvent {
            id: self.id,
            summary: self.summary.unwrap_or_else(|| "Untitled Event".to_string()),
            description: self.description,
            start: self.start.map(GoogleEventTime::into_value).unwrap_or_default(),
            end: self.end.map(GoogleEventTime::into_value).unwrap_or_default(),
            html_link: self.html_link,
        }
    }
}

/// Normalize a caller-supplied timestamp to a UTC-qualified RFC3339 instant.
pub fn normalize_instant(raw: &str) -> Result<String, AppError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| crate::time_utils::format_utc_rfc3339(dt.with_timezone(&chrono::Utc)))
        .map_err(|_| {
            AppError::InvalidInput(format!("'{}' is not an RFC3339 timestamp", raw))
        })
}

// ─── OAuth State Parameter ───────────────────────────────────────────────────

/// Encode a user id into a signed, URL-safe OAuth state token.
///
/// Format before encoding: `user_id|timestamp_hex|signature_hex`. This is a
/// reversible encoding with a tamper check, not an authentication
/// credential; the callback only trusts it after the provider round trip.
pub fn encode_state(user_id: &str, key: &[u8]) -> Result<String, AppError> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let payload = format!("{}|{:x}", user_id, timestamp);

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));

    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify the HMAC signature and recover the user id from a state token.
pub fn verify_and_decode_state(state: &str, key: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "user_id|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let user_id = parts[0];
    let timestamp_hex = parts[1];
    let signature_hex = parts[2];

    let payload = format!("{}|{}", user_id, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());

    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if signature_hex != expected_signature {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    Some(user_id.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// CalendarService - High-level gateway with credential management
// ─────────────────────────────────────────────────────────────────────────────

use crate::models::CalendarCredential;
use crate::services::vault::TokenVault;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Shared refresh locks type for use in AppState.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// High-level calendar gateway that resolves credentials through the token
/// vault, refreshes them when stale, and wraps the provider API calls.
#[derive(Clone)]
pub struct CalendarService {
    client: GoogleCalendarClient,
    vault: TokenVault,
    state_key: Vec<u8>,
    /// Per-user mutex to serialize token refresh operations.
    refresh_locks: RefreshLocks,
}

impl CalendarService {
    pub fn new(
        client: GoogleCalendarClient,
        vault: TokenVault,
        state_key: Vec<u8>,
        refresh_locks: RefreshLocks,
    ) -> Self {
        Self {
            client,
            vault,
            state_key,
            refresh_locks,
        }
    }

    // ─── Authorization Flow ──────────────────────────────────────────────────

    /// Consent URL for a user, with their id folded into the state token.
    pub fn authorization_url(&self, user_id: &str) -> Result<String, AppError> {
        let state = encode_state(user_id, &self.state_key)?;
        Ok(self.client.authorization_url(&state))
    }

    /// Handle the OAuth callback: recover the user id from state, exchange
    /// the code, and store the credential in the vault.
    ///
    /// Returns the user id the credential was stored under.
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
    ) -> Result<String, AppError> {
        let user_id = verify_and_decode_state(state, &self.state_key)
            .ok_or_else(|| AppError::CallbackInvalid("State parameter rejected".to_string()))?;

        let tokens = self
            .client
            .exchange_code(code)
            .await
            .map_err(|e| AppError::CallbackInvalid(e.to_string()))?;

        let expires_at = Utc::now() + Duration::seconds(tokens.expires_in);
        let scopes = tokens
            .scope
            .as_deref()
            .unwrap_or(CALENDAR_SCOPE)
            .split(' ')
            .map(str::to_string)
            .collect();

        let credential = CalendarCredential {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: format_utc_rfc3339(expires_at),
            scopes,
        };

        self.vault.put(&user_id, &credential).await?;

        tracing::info!(user_id = %user_id, "Calendar authorization completed");

        Ok(user_id)
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid (non-expired) access token for the given user.
    ///
    /// Reads the credential from the vault, refreshes it when it expires
    /// within the margin, and stores the refreshed token back. A per-user
    /// lock ensures only one task performs the refresh; waiters re-read the
    /// vault after the winner stores the result.
    pub async fn get_valid_access_token(&self, user_id: &str) -> Result<String, AppError> {
        let credential = self
            .vault
            .get(user_id)
            .await?
            .ok_or(AppError::CalendarNotAuthorized)?;

        if !credential_expiring(&credential)? {
            return Ok(credential.access_token);
        }

        // Serialize refresh per user
        let lock = self
            .refresh_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        // Re-check after acquiring the lock - another task may have refreshed
        let credential = self
            .vault
            .get(user_id)
            .await?
            .ok_or(AppError::CalendarNotAuthorized)?;

        if !credential_expiring(&credential)? {
            return Ok(credential.access_token);
        }

        // An expired credential with no refresh token cannot be used
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or(AppError::CalendarNotAuthorized)?;

        tracing::info!(user_id, "Access token expired, refreshing");

        let refreshed = match self.client.refresh_access_token(&refresh_token).await {
            Ok(t) => t,
            Err(e) if e.is_calendar_token_error() => {
                // Refresh token revoked - treat the credential as absent
                return Err(AppError::CalendarNotAuthorized);
            }
            Err(e) => return Err(e),
        };

        let new_expires_at = Utc::now() + Duration::seconds(refreshed.expires_in);

        let updated = CalendarCredential {
            access_token: refreshed.access_token.clone(),
            // Google usually omits the refresh token on refresh responses
            refresh_token: refreshed.refresh_token.or(Some(refresh_token)),
            expires_at: format_utc_rfc3339(new_expires_at),
            scopes: credential.scopes,
        };

        self.vault.put(user_id, &updated).await?;

        tracing::info!(user_id, "Token refreshed and stored");

        Ok(refreshed.access_token)
    }

    // ─── Event Operations ────────────────────────────────────────────────────

    /// List upcoming events, optionally bounded by a start/end window.
    pub async fn list_events(
        &self,
        user_id: &str,
        start: Option<&str>,
        end: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let time_min = start.map(normalize_instant).transpose()?;
        let time_max = end.map(normalize_instant).transpose()?;

        let access_token = self.get_valid_access_token(user_id).await?;

        let events = self
            .client
            .list_events(
                &access_token,
                time_min.as_deref(),
                time_max.as_deref(),
                limit.unwrap_or(DEFAULT_EVENT_LIMIT),
            )
            .await
            .map_err(map_token_error)?;

        Ok(events.into_iter().map(GoogleEvent::into_event).collect())
    }

    /// Create an event and return it with the provider-assigned id and link.
    pub async fn create_event(
        &self,
        user_id: &str,
        summary: &str,
        description: Option<&str>,
        start: &str,
        end: &str,
    ) -> Result<CalendarEvent, AppError> {
        let start = normalize_instant(start)?;
        let end = normalize_instant(end)?;

        let access_token = self.get_valid_access_token(user_id).await?;

        let event = self
            .client
            .insert_event(&access_token, summary, description, &start, &end)
            .await
            .map_err(map_token_error)?;

        Ok(event.into_event())
    }

    /// Replace an event's content.
    pub async fn update_event(
        &self,
        user_id: &str,
        event_id: &str,
        summary: &str,
        description: Option<&str>,
        start: &str,
        end: &str,
    ) -> Result<CalendarEvent, AppError> {
        let start = normalize_instant(start)?;
        let end = normalize_instant(end)?;

        let access_token = self.get_valid_access_token(user_id).await?;

        let event = self
            .client
            .update_event(&access_token, event_id, summary, description, &start, &end)
            .await
            .map_err(map_token_error)?;

        Ok(event.into_event())
    }

    /// Delete an event from the user's calendar.
    pub async fn delete_event(&self, user_id: &str, event_id: &str) -> Result<(), AppError> {
        let access_token = self.get_valid_access_token(user_id).await?;

        self.client
            .delete_event(&access_token, event_id)
            .await
            .map_err(map_token_error)
    }
}

/// Whether a credential expires within the refresh margin.
fn credential_expiring(credential: &CalendarCredential) -> Result<bool, AppError> {
    let expires_at = DateTime::parse_from_rfc3339(&credential.expires_at)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to parse expiry: {}", e)))?
        .with_timezone(&Utc);

    Ok(Utc::now() + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= expires_at)
}

/// A provider 401 after refresh means the credential is unusable.
fn map_token_error(err: AppError) -> AppError {
    if err.is_calendar_token_error() {
        AppError::CalendarNotAuthorized
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        let key = b"secret_key";
        let encoded = encode_state("user-abc-123", key).unwrap();
        let decoded = verify_and_decode_state(&encoded, key);
        assert_eq!(decoded, Some("user-abc-123".to_string()));
    }

    #[test]
    fn test_state_rejects_wrong_key() {
        let encoded = encode_state("user-abc-123", b"secret_key").unwrap();
        assert_eq!(verify_and_decode_state(&encoded, b"wrong_key"), None);
    }

    #[test]
    fn test_state_rejects_tampered_payload() {
        let key = b"secret_key";
        let encoded = encode_state("user-abc-123", key).unwrap();

        let decoded = URL_SAFE_NO_PAD.decode(&encoded).unwrap();
        let mut text = String::from_utf8(decoded).unwrap();
        text = text.replacen("user-abc-123", "someone-else", 1);
        let tampered = URL_SAFE_NO_PAD.encode(text.as_bytes());

        assert_eq!(verify_and_decode_state(&tampered, key), None);
    }

    #[test]
    fn test_state_rejects_malformed_input() {
        let encoded = URL_SAFE_NO_PAD.encode("missing|signature");
        assert_eq!(verify_and_decode_state(&encoded, b"secret_key"), None);
        assert_eq!(verify_and_decode_state("not-base64!!!", b"secret_key"), None);
    }

    #[test]
    fn test_normalize_instant_converts_offset_to_utc() {
        let normalized = normalize_instant("2026-08-07T10:00:00+02:00").unwrap();
        assert_eq!(normalized, "2026-08-07T08:00:00Z");
    }

    #[test]
    fn test_normalize_instant_rejects_garbage() {
        let err = normalize_instant("next tuesday").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_into_event_prefers_instant_over_date() {
        let event = GoogleEvent {
            id: Some("ev1".to_string()),
            summary: Some("Standup".to_string()),
            description: None,
            start: Some(GoogleEventTime {
                date_time: Some("2026-08-07T10:00:00Z".to_string()),
                date: Some("2026-08-07".to_string()),
            }),
            end: Some(GoogleEventTime {
                date_time: None,
                date: Some("2026-08-08".to_string()),
            }),
            html_link: None,
        };

        let mapped = event.into_event();
        assert_eq!(mapped.start, "2026-08-07T10:00:00Z");
        // Date-only values pass through unmodified
        assert_eq!(mapped.end, "2026-08-08");
    }

    #[test]
    fn test_into_event_defaults_untitled() {
        let event = GoogleEvent {
            id: None,
            summary: None,
            description: None,
            start: None,
            end: None,
            html_link: None,
        };
        assert_eq!(event.into_event().summary, "Untitled Event");
    }

    #[test]
    fn test_authorization_url_carries_state_and_scope() {
        let client = GoogleCalendarClient::new(
            "client-id".to_string(),
            "client-secret".to_string(),
            "http://localhost:8080/calendar/callback".to_string(),
        );

        let url = client.authorization_url("opaque-state");

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("state=opaque-state"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains(&urlencoding::encode(CALENDAR_SCOPE).to_string()));
    }
}
