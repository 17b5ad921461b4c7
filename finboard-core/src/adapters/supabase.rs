//! Remote data/auth/storage service client
//!
//! Speaks the Supabase REST dialect:
//! - auth: `/auth/v1` (password and refresh-token grants, signup, user, logout)
//! - rows: `/rest/v1/{table}` with PostgREST filters (`col=eq.value`)
//! - objects: `/storage/v1/object/{bucket}/{path}`
//!
//! One [`SupabaseClient`] is shared by the remote session backend, the data
//! store and blob storage, so every request carries the same access token.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Bill, Category, Direction, Identity, PersistedSession, Person, Session, StoredPrivileges,
    Transaction, TransactionDetail, TransactionType,
};
use crate::ports::{BlobStorage, DataStore, KeyValueStore, SessionBackend};

/// Environment variable holding the remote service URL
pub const SUPABASE_URL_ENV: &str = "FINBOARD_SUPABASE_URL";

/// Environment variable holding the public (anon) API key
pub const SUPABASE_ANON_KEY_ENV: &str = "FINBOARD_SUPABASE_ANON_KEY";

/// URL used when none is configured. Requests against it cannot succeed.
pub const PLACEHOLDER_URL: &str = "https://placeholder.supabase.co";

/// Anon key used when none is configured
pub const PLACEHOLDER_ANON_KEY: &str = "placeholder-anon-key";

/// Key-value entry holding the persisted remote session
pub const REMOTE_SESSION_KEY: &str = "finboard.remote_session";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Token lifetime assumed when the auth service omits both expiry fields
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

const PERSONS_TABLE: &str = "persons";
const CATEGORIES_TABLE: &str = "categories";
const TYPES_TABLE: &str = "types";
const TRANSACTIONS_TABLE: &str = "transactions";
const BILLS_TABLE: &str = "bills";
const PRIVILEGES_TABLE: &str = "user_privileges";

const PRIVILEGE_COLUMNS: &str = "add_expense,add_income,view_reports,upload_bills,download_reports";
const TRANSACTION_DETAIL_SELECT: &str = "id,person_id,type_id,amount,transaction_date,description,\
bill_id,created_at,types(name,categories(name,direction))";

// =============================================================================
// API Response Models
// =============================================================================

/// Password, refresh-token and (auto-confirmed) signup response
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    /// UNIX timestamp
    #[serde(default)]
    expires_at: Option<i64>,
    user: RemoteUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(|| {
                Utc::now()
                    + chrono::Duration::seconds(
                        self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
                    )
            });

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            identity: self.user.into_identity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl RemoteUser {
    fn into_identity(self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Error payloads differ between the auth, rest and storage endpoints
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorBody {
    fn text(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Transaction row with its type and category embedded
#[derive(Debug, Deserialize)]
struct TransactionRow {
    id: Uuid,
    person_id: Uuid,
    type_id: i64,
    amount: Decimal,
    transaction_date: NaiveDate,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    bill_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    types: Option<TypeEmbed>,
}

#[derive(Debug, Deserialize)]
struct TypeEmbed {
    name: String,
    #[serde(default)]
    categories: Option<CategoryEmbed>,
}

#[derive(Debug, Deserialize)]
struct CategoryEmbed {
    name: String,
    direction: Direction,
}

impl TransactionRow {
    fn into_detail(self) -> Result<TransactionDetail> {
        let type_embed = self
            .types
            .ok_or_else(|| Error::transport(format!("Transaction {} has no type", self.id)))?;
        let category = type_embed.categories.ok_or_else(|| {
            Error::transport(format!("Type '{}' has no category", type_embed.name))
        })?;

        Ok(TransactionDetail {
            id: self.id,
            person_id: self.person_id,
            type_id: self.type_id,
            type_name: type_embed.name,
            category_name: category.name,
            direction: category.direction,
            amount: self.amount,
            transaction_date: self.transaction_date,
            description: self.description,
            bill_id: self.bill_id,
            created_at: self.created_at,
        })
    }
}

// =============================================================================
// HTTP Client
// =============================================================================

/// Remote service client
#[derive(Debug)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl SupabaseClient {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(Error::config("Remote service URL cannot be empty"));
        }
        if anon_key.trim().is_empty() {
            return Err(Error::config("Remote service anon key cannot be empty"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token presented on row and storage requests; `None` falls back to the anon key
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token;
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().ok().and_then(|guard| guard.clone())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        self.request_with_token(method, url, &bearer)
    }

    fn request_with_token(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(map_request_error)?;
        check_response_status(response).await
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        debug!(table, "remote select");
        let response = self
            .send(self.request(Method::GET, &self.rest_url(table)).query(query))
            .await?;
        parse_json(response).await
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &B,
        prefer: &str,
    ) -> Result<Vec<T>> {
        debug!(table, "remote insert");
        let response = self
            .send(
                self.request(Method::POST, &self.rest_url(table))
                    .query(query)
                    .header("Prefer", prefer)
                    .json(body),
            )
            .await?;
        parse_json(response).await
    }

    // === Auth ===

    /// Password grant
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .request_with_token(Method::POST, &self.auth_url("token"), &self.anon_key)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(map_request_error)?;

        let response = check_auth_status(response).await?;
        let token: TokenResponse = parse_json(response).await?;
        Ok(token.into_session())
    }

    /// Register; `None` when the service wants the email confirmed first
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let response = self
            .request_with_token(Method::POST, &self.auth_url("signup"), &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(map_request_error)?;

        let response = check_auth_status(response).await?;
        let body: JsonValue = parse_json(response).await?;
        if body.get("access_token").is_none() {
            return Ok(None);
        }

        let token: TokenResponse = serde_json::from_value(body)?;
        Ok(Some(token.into_session()))
    }

    /// Refresh-token grant
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let response = self
            .request_with_token(Method::POST, &self.auth_url("token"), &self.anon_key)
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(map_request_error)?;

        let response = check_auth_status(response).await?;
        let token: TokenResponse = parse_json(response).await?;
        Ok(token.into_session())
    }

    /// Identity behind `access_token`, `None` if the service rejects the token
    pub async fn get_user(&self, access_token: &str) -> Result<Option<Identity>> {
        let response = self
            .request_with_token(Method::GET, &self.auth_url("user"), access_token)
            .send()
            .await
            .map_err(map_request_error)?;

        if matches!(response.status().as_u16(), 401 | 403) {
            return Ok(None);
        }

        let response = check_response_status(response).await?;
        let user: RemoteUser = parse_json(response).await?;
        Ok(Some(user.into_identity()))
    }

    /// Revoke `access_token` on the service
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .request_with_token(Method::POST, &self.auth_url("logout"), access_token)
            .send()
            .await
            .map_err(map_request_error)?;

        // An already-invalid token is as signed out as it gets
        if matches!(response.status().as_u16(), 401 | 403 | 404) {
            return Ok(());
        }
        check_response_status(response).await?;
        Ok(())
    }
}

fn map_request_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::transport(format!(
            "Connection timed out after {} seconds",
            REQUEST_TIMEOUT_SECS
        ))
    } else if error.is_connect() {
        Error::transport("Unable to connect to the remote service")
    } else {
        Error::transport(format!("Remote request failed: {}", error))
    }
}

async fn error_detail(response: Response) -> String {
    let status = response.status();
    let body: ApiErrorBody = response.json().await.unwrap_or_default();
    body.text()
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string())
}

/// Check response status and return appropriate errors
async fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = error_detail(response).await;
    warn!(status = status.as_u16(), %detail, "remote request failed");

    Err(match status.as_u16() {
        401 | 403 => Error::transport(format!("Remote service denied access: {}", detail)),
        404 => Error::not_found(detail),
        409 => Error::transport(format!("Conflicting row: {}", detail)),
        429 => Error::transport(
            "Remote service rate limit exceeded. Please wait a moment and try again.",
        ),
        code => Error::transport(format!("Remote service error: HTTP {} ({})", code, detail)),
    })
}

/// Like [`check_response_status`], but credential rejections become
/// `Error::Authentication` carrying the service's own message
async fn check_auth_status(response: Response) -> Result<Response> {
    match response.status().as_u16() {
        400 | 401 | 403 | 422 => {
            let detail = error_detail(response).await;
            Err(Error::authentication(detail))
        }
        _ => check_response_status(response).await,
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| Error::transport(format!("Failed to parse remote response: {}", e)))
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

// =============================================================================
// DataStore
// =============================================================================

#[async_trait]
impl DataStore for SupabaseClient {
    async fn get_privileges(&self, identity_id: &str) -> Result<Option<StoredPrivileges>> {
        let rows: Vec<StoredPrivileges> = self
            .select(
                PRIVILEGES_TABLE,
                &[
                    ("user_id", eq(identity_id)),
                    ("select", PRIVILEGE_COLUMNS.to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>> {
        let rows: Vec<Person> = self
            .select(
                PERSONS_TABLE,
                &[("email", eq(email)), ("select", "*".to_string())],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_person(&self, email: &str) -> Result<Person> {
        // Only the email is sent so a merge never rewrites an existing id
        let rows: Vec<Person> = self
            .insert(
                PERSONS_TABLE,
                &[("on_conflict", "email".to_string())],
                &json!([{ "email": email }]),
                "resolution=merge-duplicates,return=representation",
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::transport("Person upsert returned no row"))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.select(
            CATEGORIES_TABLE,
            &[
                ("select", "id,name,direction".to_string()),
                ("order", "id.asc".to_string()),
            ],
        )
        .await
    }

    async fn list_types(&self, direction: Direction) -> Result<Vec<TransactionType>> {
        self.select(
            TYPES_TABLE,
            &[
                (
                    "select",
                    "id,name,category_id,categories!inner(direction)".to_string(),
                ),
                ("categories.direction", eq(direction)),
                ("order", "name.asc".to_string()),
            ],
        )
        .await
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Transaction> {
        let rows: Vec<Transaction> = self
            .insert(
                TRANSACTIONS_TABLE,
                &[],
                transaction,
                "return=representation",
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::transport("Transaction insert returned no row"))
    }

    async fn list_transactions(&self, person_id: Uuid) -> Result<Vec<TransactionDetail>> {
        let rows: Vec<TransactionRow> = self
            .select(
                TRANSACTIONS_TABLE,
                &[
                    ("person_id", eq(person_id)),
                    ("select", TRANSACTION_DETAIL_SELECT.to_string()),
                    (
                        "order",
                        "transaction_date.desc,created_at.desc".to_string(),
                    ),
                ],
            )
            .await?;
        rows.into_iter().map(TransactionRow::into_detail).collect()
    }

    async fn insert_bill(&self, bill: &Bill) -> Result<Bill> {
        let rows: Vec<Bill> = self
            .insert(BILLS_TABLE, &[], bill, "return=representation")
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::transport("Bill insert returned no row"))
    }

    async fn list_bills(&self, person_id: Uuid) -> Result<Vec<Bill>> {
        self.select(
            BILLS_TABLE,
            &[
                ("person_id", eq(person_id)),
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }
}

// =============================================================================
// BlobStorage
// =============================================================================

#[async_trait]
impl BlobStorage for SupabaseClient {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);
        debug!(bucket, size = bytes.len(), "remote object put");

        let response = self
            .request(Method::POST, &url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::storage(map_request_error(e).to_string()))?;

        check_response_status(response).await.map_err(|e| match e {
            Error::Transport(msg) | Error::NotFound(msg) => Error::storage(msg),
            other => other,
        })?;

        Ok(path.to_string())
    }
}

// =============================================================================
// RemoteSessionBackend
// =============================================================================

/// Session backend delegating to the remote auth service.
///
/// The token pair is persisted under [`REMOTE_SESSION_KEY`]; restoring
/// validates the access token and falls back to the refresh grant.
pub struct RemoteSessionBackend {
    client: Arc<SupabaseClient>,
    store: Arc<dyn KeyValueStore>,
}

impl RemoteSessionBackend {
    pub fn new(client: Arc<SupabaseClient>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { client, store }
    }

    fn load_persisted(&self) -> Result<Option<Session>> {
        let Some(raw) = self.store.get(REMOTE_SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(persisted) => Ok(Some(persisted.into())),
            Err(e) => {
                warn!(error = %e, "discarding unreadable persisted session");
                self.store.remove(REMOTE_SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    fn adopt(&self, session: Session) -> Result<Session> {
        self.client
            .set_access_token(Some(session.access_token.clone()));
        let json = serde_json::to_string(&PersistedSession::from(&session))?;
        self.store.set(REMOTE_SESSION_KEY, &json)?;
        Ok(session)
    }

    fn forget(&self) -> Result<()> {
        self.client.set_access_token(None);
        self.store.remove(REMOTE_SESSION_KEY)
    }
}

#[async_trait]
impl SessionBackend for RemoteSessionBackend {
    fn name(&self) -> &str {
        "remote"
    }

    async fn restore(&self) -> Result<Option<Session>> {
        let Some(persisted) = self.load_persisted()? else {
            return Ok(None);
        };

        if let Some(identity) = self.client.get_user(&persisted.access_token).await? {
            return self.adopt(Session { identity, ..persisted }).map(Some);
        }

        debug!("persisted access token rejected, trying refresh grant");
        match self.client.refresh_session(&persisted.refresh_token).await {
            Ok(session) => self.adopt(session).map(Some),
            Err(Error::Authentication(_)) => {
                self.forget()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.client.sign_in_with_password(email, password).await?;
        self.adopt(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        match self.client.sign_up(email, password).await? {
            Some(session) => self.adopt(session).map(Some),
            None => Ok(None),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        let token = self.client.access_token();
        let forgotten = self.forget();

        if let Some(token) = token {
            self.client.sign_out(&token).await?;
        }
        forgotten
    }
}
