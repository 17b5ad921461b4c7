//! Mock remote service for testing
//!
//! A small HTTP server on a std `TcpListener` that answers the auth, rest and
//! storage endpoints the client uses, with the same payload shapes:
//! - POST /auth/v1/token?grant_type=password|refresh_token
//! - POST /auth/v1/signup, GET /auth/v1/user, POST /auth/v1/logout
//! - GET/POST /rest/v1/{persons,types,categories,transactions,bills,user_privileges}
//! - POST /storage/v1/object/{bucket}/{path}

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

/// Identity id issued by the mock auth endpoints
pub const MOCK_USER_ID: &str = "remote-user-1";

/// Mock remote server for testing
pub struct MockSupabaseServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<Mutex<MockState>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for the mock service
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// The only password the password grant accepts
    pub password: String,
    /// Access token the user endpoint accepts
    pub access_token: String,
    /// Refresh token the refresh grant accepts
    pub refresh_token: String,
    /// Stored privilege rows by identity id, served as-is (columns may be null)
    pub privileges: HashMap<String, JsonValue>,
    /// Answer privilege lookups with a server error
    pub fail_privileges: bool,
    /// Signup returns a bare user (email confirmation pending)
    pub require_confirmation: bool,
    /// Answer every rest and storage request with a server error
    pub fail_rest: bool,
    /// Hold token grants this long before answering
    pub token_delay: Option<Duration>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            password: "correct-horse".to_string(),
            access_token: "valid-access-token".to_string(),
            refresh_token: "valid-refresh-token".to_string(),
            privileges: HashMap::new(),
            fail_privileges: false,
            require_confirmation: false,
            fail_rest: false,
            token_delay: None,
        }
    }
}

/// Rows and objects written through the mock
#[derive(Debug, Default)]
pub struct MockState {
    pub persons: Vec<JsonValue>,
    pub transactions: Vec<JsonValue>,
    pub bills: Vec<JsonValue>,
    pub objects: Vec<String>,
    pub logout_calls: usize,
}

struct MockRequest {
    method: String,
    path: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl MockRequest {
    fn json(&self) -> JsonValue {
        serde_json::from_slice(&self.body).unwrap_or(JsonValue::Null)
    }

    fn bearer(&self) -> Option<&str> {
        self.headers
            .get("authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Value of a PostgREST `eq.` filter
    fn eq_filter(&self, column: &str) -> Option<&str> {
        self.query.get(column).and_then(|v| v.strip_prefix("eq."))
    }
}

impl MockSupabaseServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let state = Arc::new(Mutex::new(MockState::default()));
        let state_clone = state.clone();

        // Non-blocking so stop() can end the accept loop
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let state = state_clone.clone();
                        thread::spawn(move || handle_connection(stream, &cfg, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Inspect what has been written so far
    pub fn with_state<T>(&self, f: impl FnOnce(&MockState) -> T) -> T {
        let state = self.state.lock().unwrap();
        f(&state)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockSupabaseServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, state: &Mutex<MockState>) {
    let _ = stream.set_nonblocking(false);
    let Some(request) = read_request(&mut stream) else {
        send_response(&mut stream, 400, "Bad Request", r#"{"error":"invalid request"}"#);
        return;
    };

    let (status, body) = route(&request, config, state);
    let text = match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    send_response(&mut stream, status, text, &body);
}

fn read_request(stream: &mut TcpStream) -> Option<MockRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.lines();
    let mut parts = lines.next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buffer[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    let (path, query_string) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let query = query_string
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (percent_decode(k), percent_decode(v)))
        .collect();

    Some(MockRequest {
        method,
        path: path.to_string(),
        query,
        headers,
        body,
    })
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(b) => {
                        out.push(b);
                        i += 2;
                    }
                    Err(_) => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).to_string()
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn token_body(config: &MockConfig, email: &str) -> String {
    json!({
        "access_token": config.access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": Utc::now().timestamp() + 3600,
        "refresh_token": config.refresh_token,
        "user": user_json(email),
    })
    .to_string()
}

fn user_json(email: &str) -> JsonValue {
    json!({
        "id": MOCK_USER_ID,
        "email": email,
        "created_at": "2024-01-01T00:00:00Z",
    })
}

fn categories() -> Vec<JsonValue> {
    vec![
        json!({ "id": 1, "name": "Employment", "direction": "income" }),
        json!({ "id": 4, "name": "Food", "direction": "expense" }),
    ]
}

fn types() -> Vec<(JsonValue, &'static str)> {
    vec![
        (json!({ "id": 1, "name": "Salary", "category_id": 1 }), "income"),
        (json!({ "id": 2, "name": "Bonus", "category_id": 1 }), "income"),
        (json!({ "id": 9, "name": "Groceries", "category_id": 4 }), "expense"),
    ]
}

fn type_embed(type_id: i64) -> JsonValue {
    match type_id {
        1 => json!({ "name": "Salary", "categories": { "name": "Employment", "direction": "income" } }),
        2 => json!({ "name": "Bonus", "categories": { "name": "Employment", "direction": "income" } }),
        9 => json!({ "name": "Groceries", "categories": { "name": "Food", "direction": "expense" } }),
        _ => JsonValue::Null,
    }
}

fn route(request: &MockRequest, config: &MockConfig, state: &Mutex<MockState>) -> (u16, String) {
    let invalid_grant =
        r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#.to_string();

    if config.fail_rest
        && (request.path.starts_with("/rest/") || request.path.starts_with("/storage/"))
    {
        return (500, r#"{"message":"internal error"}"#.to_string());
    }

    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/auth/v1/token") => {
            if let Some(delay) = config.token_delay {
                thread::sleep(delay);
            }
            let body = request.json();
            match request.query.get("grant_type").map(String::as_str) {
                Some("password") => {
                    if body["password"] == config.password.as_str() {
                        let email = body["email"].as_str().unwrap_or_default();
                        (200, token_body(config, email))
                    } else {
                        (400, invalid_grant)
                    }
                }
                Some("refresh_token") => {
                    if body["refresh_token"] == config.refresh_token.as_str() {
                        (200, token_body(config, "refreshed@example.com"))
                    } else {
                        (
                            400,
                            r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#
                                .to_string(),
                        )
                    }
                }
                _ => (400, r#"{"error":"unsupported_grant_type"}"#.to_string()),
            }
        }
        ("POST", "/auth/v1/signup") => {
            let body = request.json();
            let email = body["email"].as_str().unwrap_or_default();
            if config.require_confirmation {
                (200, user_json(email).to_string())
            } else {
                (200, token_body(config, email))
            }
        }
        ("GET", "/auth/v1/user") => {
            if request.bearer() == Some(config.access_token.as_str()) {
                (200, user_json("restored@example.com").to_string())
            } else {
                (401, r#"{"msg":"invalid JWT"}"#.to_string())
            }
        }
        ("POST", "/auth/v1/logout") => {
            state.lock().unwrap().logout_calls += 1;
            (204, String::new())
        }
        ("GET", "/rest/v1/user_privileges") => {
            if config.fail_privileges {
                return (500, r#"{"message":"relation does not exist"}"#.to_string());
            }
            let rows: Vec<&JsonValue> = request
                .eq_filter("user_id")
                .and_then(|id| config.privileges.get(id))
                .into_iter()
                .collect();
            (200, serde_json::to_string(&rows).unwrap())
        }
        ("GET", "/rest/v1/persons") => {
            let email = request.eq_filter("email").unwrap_or_default();
            let state = state.lock().unwrap();
            let rows: Vec<&JsonValue> = state
                .persons
                .iter()
                .filter(|p| p["email"] == email)
                .collect();
            (200, serde_json::to_string(&rows).unwrap())
        }
        ("POST", "/rest/v1/persons") => {
            let body = request.json();
            let email = body[0]["email"].as_str().unwrap_or_default().to_string();
            let mut state = state.lock().unwrap();
            let existing = state.persons.iter().find(|p| p["email"] == email.as_str()).cloned();
            let person = match existing {
                Some(person) => person,
                None => {
                    let person = json!({
                        "id": Uuid::new_v4(),
                        "email": email,
                        "created_at": Utc::now(),
                    });
                    state.persons.push(person.clone());
                    person
                }
            };
            (201, json!([person]).to_string())
        }
        ("GET", "/rest/v1/categories") => (200, json!(categories()).to_string()),
        ("GET", "/rest/v1/types") => {
            let direction = request.eq_filter("categories.direction");
            let rows: Vec<JsonValue> = types()
                .into_iter()
                .filter(|(_, d)| direction.map_or(true, |want| want == *d))
                .map(|(mut row, d)| {
                    row["categories"] = json!({ "direction": d });
                    row
                })
                .collect();
            (200, json!(rows).to_string())
        }
        ("POST", "/rest/v1/transactions") => {
            let body = request.json();
            state.lock().unwrap().transactions.push(body.clone());
            (201, json!([body]).to_string())
        }
        ("GET", "/rest/v1/transactions") => {
            let person_id = request.eq_filter("person_id").unwrap_or_default();
            let state = state.lock().unwrap();
            let mut rows: Vec<JsonValue> = state
                .transactions
                .iter()
                .filter(|t| t["person_id"] == person_id)
                .cloned()
                .map(|mut row| {
                    row["types"] = type_embed(row["type_id"].as_i64().unwrap_or_default());
                    row
                })
                .collect();
            rows.sort_by(|a, b| {
                b["transaction_date"]
                    .as_str()
                    .cmp(&a["transaction_date"].as_str())
            });
            (200, json!(rows).to_string())
        }
        ("POST", "/rest/v1/bills") => {
            let body = request.json();
            state.lock().unwrap().bills.push(body.clone());
            (201, json!([body]).to_string())
        }
        ("GET", "/rest/v1/bills") => {
            let person_id = request.eq_filter("person_id").unwrap_or_default();
            let state = state.lock().unwrap();
            let rows: Vec<&JsonValue> = state
                .bills
                .iter()
                .filter(|b| b["person_id"] == person_id)
                .collect();
            (200, serde_json::to_string(&rows).unwrap())
        }
        ("POST", path) if path.starts_with("/storage/v1/object/") => {
            let key = path.trim_start_matches("/storage/v1/object/").to_string();
            state.lock().unwrap().objects.push(key.clone());
            (200, json!({ "Key": key }).to_string())
        }
        _ => (404, r#"{"message":"endpoint not found"}"#.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local_storage::MemoryKeyValueStore;
    use crate::adapters::supabase::{RemoteSessionBackend, SupabaseClient, REMOTE_SESSION_KEY};
    use crate::domain::result::Error;
    use crate::domain::{
        Direction, Identity, PersistedSession, PrivilegeSet, Session, StoredPrivileges, Transaction,
    };
    use crate::ports::{BlobStorage, DataStore, KeyValueStore, SessionBackend};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn backend(server: &MockSupabaseServer) -> (Arc<SupabaseClient>, Arc<MemoryKeyValueStore>, RemoteSessionBackend) {
        let client = Arc::new(SupabaseClient::new(&server.base_url(), "anon").unwrap());
        let store = Arc::new(MemoryKeyValueStore::new());
        let backend = RemoteSessionBackend::new(client.clone(), store.clone());
        (client, store, backend)
    }

    fn persist(store: &MemoryKeyValueStore, access: &str, refresh: &str) {
        let session = Session::issue(Identity::new(MOCK_USER_ID, "old@example.com"), access, refresh, 60);
        let json = serde_json::to_string(&PersistedSession::from(&session)).unwrap();
        store.set(REMOTE_SESSION_KEY, &json).unwrap();
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("eq.a%40b.com"), "eq.a@b.com");
        assert_eq!(percent_decode("a+b"), "a b");
        assert_eq!(percent_decode("100%"), "100%");
    }

    #[tokio::test]
    async fn test_sign_in_persists_session() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let (client, store, backend) = backend(&server);

        let session = backend.sign_in("jane@example.com", "correct-horse").await.unwrap();

        assert_eq!(session.identity.id, MOCK_USER_ID);
        assert_eq!(session.identity.email, "jane@example.com");
        assert_eq!(client.access_token().as_deref(), Some("valid-access-token"));
        assert!(store.get(REMOTE_SESSION_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejected_credentials_leave_state_untouched() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let (client, store, backend) = backend(&server);

        let err = backend.sign_in("jane@example.com", "wrong").await.unwrap_err();

        assert!(matches!(err, Error::Authentication(ref msg) if msg == "Invalid login credentials"));
        assert!(client.access_token().is_none());
        assert!(store.get(REMOTE_SESSION_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_with_valid_token() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let (_client, store, backend) = backend(&server);
        persist(&store, "valid-access-token", "whatever");

        let session = backend.restore().await.unwrap().unwrap();

        // Identity comes from the service, not from the stale local copy
        assert_eq!(session.identity.email, "restored@example.com");
        assert_eq!(session.access_token, "valid-access-token");
    }

    #[tokio::test]
    async fn test_restore_falls_back_to_refresh() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let (_client, store, backend) = backend(&server);
        persist(&store, "expired-token", "valid-refresh-token");

        let session = backend.restore().await.unwrap().unwrap();

        assert_eq!(session.identity.email, "refreshed@example.com");
        let stored = store.get(REMOTE_SESSION_KEY).unwrap().unwrap();
        assert!(stored.contains("valid-access-token"));
    }

    #[tokio::test]
    async fn test_restore_forgets_unusable_session() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let (client, store, backend) = backend(&server);
        persist(&store, "expired-token", "revoked-refresh-token");

        assert!(backend.restore().await.unwrap().is_none());
        assert!(store.get(REMOTE_SESSION_KEY).unwrap().is_none());
        assert!(client.access_token().is_none());
    }

    #[tokio::test]
    async fn test_restore_without_persisted_session() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let (_client, _store, backend) = backend(&server);
        assert!(backend.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation() {
        let server = MockSupabaseServer::start(MockConfig {
            require_confirmation: true,
            ..Default::default()
        })
        .unwrap();
        let (_client, store, backend) = backend(&server);

        assert!(backend.sign_up("new@example.com", "pw").await.unwrap().is_none());
        assert!(store.get(REMOTE_SESSION_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_revokes_and_forgets() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let (client, store, backend) = backend(&server);
        backend.sign_in("jane@example.com", "correct-horse").await.unwrap();

        backend.sign_out().await.unwrap();

        assert!(client.access_token().is_none());
        assert!(store.get(REMOTE_SESSION_KEY).unwrap().is_none());
        assert_eq!(server.with_state(|s| s.logout_calls), 1);

        // Second sign-out has no token to revoke
        backend.sign_out().await.unwrap();
        assert_eq!(server.with_state(|s| s.logout_calls), 1);
    }

    #[tokio::test]
    async fn test_privilege_lookup() {
        let mut privileges = HashMap::new();
        let mut restricted = PrivilegeSet::all_granted();
        restricted.view_reports = false;
        privileges.insert(
            "user-with-record".to_string(),
            serde_json::to_value(restricted).unwrap(),
        );

        let server = MockSupabaseServer::start(MockConfig {
            privileges,
            ..Default::default()
        })
        .unwrap();
        let client = SupabaseClient::new(&server.base_url(), "anon").unwrap();

        assert_eq!(
            client.get_privileges("user-with-record").await.unwrap(),
            Some(StoredPrivileges::from(restricted))
        );
        assert_eq!(client.get_privileges("someone-else").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_privilege_row_with_null_columns() {
        let mut privileges = HashMap::new();
        privileges.insert(
            "partial".to_string(),
            json!({ "add_expense": false, "add_income": null, "view_reports": true }),
        );
        let server = MockSupabaseServer::start(MockConfig {
            privileges,
            ..Default::default()
        })
        .unwrap();
        let client = SupabaseClient::new(&server.base_url(), "anon").unwrap();

        let stored = client.get_privileges("partial").await.unwrap().unwrap();

        assert_eq!(stored.add_expense, Some(false));
        assert_eq!(stored.add_income, None);
        assert_eq!(stored.view_reports, Some(true));
        assert_eq!(stored.download_reports, None);
    }

    #[tokio::test]
    async fn test_privilege_lookup_error() {
        let server = MockSupabaseServer::start(MockConfig {
            fail_privileges: true,
            ..Default::default()
        })
        .unwrap();
        let client = SupabaseClient::new(&server.base_url(), "anon").unwrap();

        assert!(matches!(
            client.get_privileges("anyone").await,
            Err(Error::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_person_is_idempotent() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let client = SupabaseClient::new(&server.base_url(), "anon").unwrap();

        let first = client.upsert_person("jane+test@example.com").await.unwrap();
        let second = client.upsert_person("jane+test@example.com").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(server.with_state(|s| s.persons.len()), 1);

        let found = client
            .find_person_by_email("jane+test@example.com")
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.id), Some(first.id));
    }

    #[tokio::test]
    async fn test_list_types_by_direction() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let client = SupabaseClient::new(&server.base_url(), "anon").unwrap();

        let income = client.list_types(Direction::Income).await.unwrap();
        let expense = client.list_types(Direction::Expense).await.unwrap();

        assert_eq!(income.len(), 2);
        assert_eq!(expense.len(), 1);
        assert_eq!(expense[0].name, "Groceries");
    }

    #[tokio::test]
    async fn test_transactions_round_trip_with_joins() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let client = SupabaseClient::new(&server.base_url(), "anon").unwrap();
        let person = client.upsert_person("jane@example.com").await.unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let tx = Transaction::new(person.id, 9, Decimal::new(4250, 2), date)
            .with_description("weekly shop");
        let saved = client.insert_transaction(&tx).await.unwrap();
        assert_eq!(saved.id, tx.id);

        let details = client.list_transactions(person.id).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].type_name, "Groceries");
        assert_eq!(details[0].direction, Direction::Expense);
        assert_eq!(details[0].amount, Decimal::new(4250, 2));
    }

    #[tokio::test]
    async fn test_blob_put() {
        let server = MockSupabaseServer::start(MockConfig::default()).unwrap();
        let client = SupabaseClient::new(&server.base_url(), "anon").unwrap();

        let path = client
            .put("bills", "p1/receipt.pdf", b"%PDF-1.4".to_vec(), "application/pdf")
            .await
            .unwrap();

        assert_eq!(path, "p1/receipt.pdf");
        assert_eq!(
            server.with_state(|s| s.objects.clone()),
            vec!["bills/p1/receipt.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn test_storage_failure_maps_to_storage_error() {
        let server = MockSupabaseServer::start(MockConfig {
            fail_rest: true,
            ..Default::default()
        })
        .unwrap();
        let client = SupabaseClient::new(&server.base_url(), "anon").unwrap();

        let err = client
            .put("bills", "p1/x.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
