use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A user record as the backend returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub city: String,
    /// Write-only: sent on register, never read back.
    #[serde(default, skip_serializing_if = "String::is_empty", skip_deserializing)]
    pub password: String,
}

impl User {
    pub fn id_string(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}

/// The backend's single request/response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiration_time: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub our_users: Option<User>,
    #[serde(default)]
    pub our_users_list: Option<Vec<User>>,
}

impl ApiResponse {
    fn detail(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "no message".to_string())
    }

    /// Promote an in-body failure status to an error.
    pub fn into_result(self) -> Result<Self, ApiError> {
        match self.status_code {
            Some(code) if !(200..300).contains(&code) => Err(ApiError::Rejected {
                status: code,
                message: self.detail(),
            }),
            _ => Ok(self),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Response is missing {0}")]
    MissingField(&'static str),
    #[error("Invalid user id '{0}'")]
    InvalidId(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    token: &'a str,
}

/// Calls the console makes against the user-management backend.
pub trait UserApi {
    fn login(&self, email: &str, password: &str) -> ApiResult<ApiResponse>;
    fn register(&self, user: &User, token: Option<&str>) -> ApiResult<ApiResponse>;
    fn refresh(&self, token: &str) -> ApiResult<ApiResponse>;
    fn profile(&self, token: Option<&str>) -> ApiResult<User>;
    fn list_users(&self, token: Option<&str>) -> ApiResult<Vec<User>>;
    fn get_user(&self, user_id: &str, token: Option<&str>) -> ApiResult<User>;
    fn update_user(
        &self,
        user_id: &str,
        user: &User,
        token: Option<&str>,
    ) -> ApiResult<ApiResponse>;
    fn delete_user(&self, user_id: &str, token: Option<&str>) -> ApiResult<ApiResponse>;
}

pub struct Client {
    base_url: String,
    agent: ureq::Agent,
}

impl Client {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: builder.build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: &str, path: &str, token: Option<&str>) -> ureq::Request {
        let mut req = self
            .agent
            .request(method, &self.url(path))
            .set("Accept", "application/json");
        if let Some(token) = token {
            req = req.set("Authorization", &format!("Bearer {}", token));
        }
        req
    }

    fn send(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> ApiResult<ApiResponse> {
        tracing::debug!(%method, %path, authenticated = token.is_some(), "api request");
        let req = self.request(method, path, token);
        let resp = match body {
            Some(body) => req
                .set("Content-Type", "application/json")
                .send_json(body),
            None => req.call(),
        };

        match resp {
            Ok(r) => {
                let status = r.status();
                let text = r
                    .into_string()
                    .map_err(|e| ApiError::Transport(e.to_string()))?;
                tracing::debug!(%method, %path, status, "api response");
                if text.trim().is_empty() {
                    return Ok(ApiResponse::default());
                }
                serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                tracing::debug!(%method, %path, status = code, "api error status");
                Err(ApiError::Status { status: code, body })
            }
            Err(e) => Err(ApiError::Transport(e.to_string())),
        }
    }

    /// `prefix/<id>` with the id escaped as a single path segment.
    fn user_path(prefix: &str, user_id: &str) -> ApiResult<String> {
        if user_id.is_empty() || user_id == "." || user_id == ".." {
            return Err(ApiError::InvalidId(user_id.to_string()));
        }
        Ok(format!("{}/{}", prefix, urlencoding::encode(user_id)))
    }

    fn to_body<T: Serialize>(value: &T) -> ApiResult<serde_json::Value> {
        serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl UserApi for Client {
    fn login(&self, email: &str, password: &str) -> ApiResult<ApiResponse> {
        let body = Self::to_body(&Credentials { email, password })?;
        self.send("POST", "/auth/login", None, Some(body))
    }

    fn register(&self, user: &User, token: Option<&str>) -> ApiResult<ApiResponse> {
        let body = Self::to_body(user)?;
        self.send("POST", "/auth/register", token, Some(body))?
            .into_result()
    }

    fn refresh(&self, token: &str) -> ApiResult<ApiResponse> {
        let body = Self::to_body(&RefreshRequest { token })?;
        self.send("POST", "/auth/refresh", None, Some(body))?
            .into_result()
    }

    fn profile(&self, token: Option<&str>) -> ApiResult<User> {
        self.send("GET", "/adminuser/get-profile", token, None)?
            .into_result()?
            .our_users
            .ok_or(ApiError::MissingField("ourUsers"))
    }

    fn list_users(&self, token: Option<&str>) -> ApiResult<Vec<User>> {
        self.send("GET", "/admin/get-all-users", token, None)?
            .into_result()?
            .our_users_list
            .ok_or(ApiError::MissingField("ourUsersList"))
    }

    fn get_user(&self, user_id: &str, token: Option<&str>) -> ApiResult<User> {
        let path = Self::user_path("/admin/get-user", user_id)?;
        self.send("GET", &path, token, None)?
            .into_result()?
            .our_users
            .ok_or(ApiError::MissingField("ourUsers"))
    }

    fn update_user(
        &self,
        user_id: &str,
        user: &User,
        token: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        let path = Self::user_path("/admin/update", user_id)?;
        let body = Self::to_body(user)?;
        self.send("PUT", &path, token, Some(body))?.into_result()
    }

    fn delete_user(&self, user_id: &str, token: Option<&str>) -> ApiResult<ApiResponse> {
        let path = Self::user_path("/admin/delete", user_id)?;
        self.send("DELETE", &path, token, None)?.into_result()
    }
}

#[cfg(test)]
pub mod fake {
    //! In-memory backend with the same answers the real one gives.

    use super::*;
    use std::cell::{Cell, RefCell};

    pub const ADMIN_TOKEN: &str = "admin-token";
    pub const USER_TOKEN: &str = "user-token";

    pub struct FakeBackend {
        pub users: RefCell<Vec<User>>,
        next_id: Cell<i64>,
        pub calls: RefCell<Vec<String>>,
        pub fail_next: Cell<bool>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            let users = vec![
                User {
                    id: Some(1),
                    name: "Ada".to_string(),
                    email: "admin@example.com".to_string(),
                    role: "ADMIN".to_string(),
                    city: "London".to_string(),
                    password: String::new(),
                },
                User {
                    id: Some(2),
                    name: "Bob".to_string(),
                    email: "bob@example.com".to_string(),
                    role: "USER".to_string(),
                    city: "Paris".to_string(),
                    password: String::new(),
                },
            ];
            Self {
                users: RefCell::new(users),
                next_id: Cell::new(3),
                calls: RefCell::new(Vec::new()),
                fail_next: Cell::new(false),
            }
        }

        pub fn calls_to(&self, name: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == name).count()
        }

        fn record(&self, name: &str) -> ApiResult<()> {
            self.calls.borrow_mut().push(name.to_string());
            if self.fail_next.replace(false) {
                return Err(ApiError::Transport("connection refused".to_string()));
            }
            Ok(())
        }

        fn require(&self, token: Option<&str>, admin: bool) -> ApiResult<String> {
            match token {
                Some(ADMIN_TOKEN) => Ok("admin@example.com".to_string()),
                Some(USER_TOKEN) if !admin => Ok("bob@example.com".to_string()),
                _ => Err(ApiError::Status {
                    status: 403,
                    body: String::new(),
                }),
            }
        }

        fn find(&self, user_id: &str) -> ApiResult<usize> {
            let id: i64 = user_id.parse().map_err(|_| ApiError::Status {
                status: 400,
                body: "bad id".to_string(),
            })?;
            self.users
                .borrow()
                .iter()
                .position(|u| u.id == Some(id))
                .ok_or(ApiError::Rejected {
                    status: 404,
                    message: "User not found for update".to_string(),
                })
        }
    }

    impl UserApi for FakeBackend {
        fn login(&self, email: &str, password: &str) -> ApiResult<ApiResponse> {
            self.record("login")?;
            let (token, role) = match (email, password) {
                ("admin@example.com", "secret") => (ADMIN_TOKEN, "ADMIN"),
                ("bob@example.com", "secret") => (USER_TOKEN, "USER"),
                _ => {
                    return Ok(ApiResponse {
                        status_code: Some(500),
                        message: Some("Bad credentials".to_string()),
                        ..Default::default()
                    })
                }
            };
            Ok(ApiResponse {
                status_code: Some(200),
                token: Some(token.to_string()),
                role: Some(role.to_string()),
                expiration_time: Some("24Hrs".to_string()),
                message: Some("Successfully Logged In".to_string()),
                ..Default::default()
            })
        }

        fn register(&self, user: &User, _token: Option<&str>) -> ApiResult<ApiResponse> {
            self.record("register")?;
            let mut created = user.clone();
            created.id = Some(self.next_id.get());
            created.password.clear();
            self.next_id.set(self.next_id.get() + 1);
            self.users.borrow_mut().push(created.clone());
            Ok(ApiResponse {
                status_code: Some(200),
                our_users: Some(created),
                message: Some("User Saved Successfully".to_string()),
                ..Default::default()
            })
        }

        fn refresh(&self, token: &str) -> ApiResult<ApiResponse> {
            self.record("refresh")?;
            if token == ADMIN_TOKEN || token == USER_TOKEN {
                Ok(ApiResponse {
                    status_code: Some(200),
                    token: Some(token.to_string()),
                    ..Default::default()
                })
            } else {
                Err(ApiError::Rejected {
                    status: 500,
                    message: "invalid token".to_string(),
                })
            }
        }

        fn profile(&self, token: Option<&str>) -> ApiResult<User> {
            self.record("profile")?;
            let email = self.require(token, false)?;
            self.users
                .borrow()
                .iter()
                .find(|u| u.email == email)
                .cloned()
                .ok_or(ApiError::MissingField("ourUsers"))
        }

        fn list_users(&self, token: Option<&str>) -> ApiResult<Vec<User>> {
            self.record("list_users")?;
            self.require(token, true)?;
            Ok(self.users.borrow().clone())
        }

        fn get_user(&self, user_id: &str, token: Option<&str>) -> ApiResult<User> {
            self.record("get_user")?;
            self.require(token, true)?;
            let idx = self.find(user_id)?;
            Ok(self.users.borrow()[idx].clone())
        }

        fn update_user(
            &self,
            user_id: &str,
            user: &User,
            token: Option<&str>,
        ) -> ApiResult<ApiResponse> {
            self.record("update_user")?;
            self.require(token, true)?;
            let idx = self.find(user_id)?;
            let mut users = self.users.borrow_mut();
            let existing = &mut users[idx];
            existing.name = user.name.clone();
            existing.email = user.email.clone();
            existing.role = user.role.clone();
            existing.city = user.city.clone();
            Ok(ApiResponse {
                status_code: Some(200),
                our_users: Some(existing.clone()),
                ..Default::default()
            })
        }

        fn delete_user(&self, user_id: &str, token: Option<&str>) -> ApiResult<ApiResponse> {
            self.record("delete_user")?;
            self.require(token, true)?;
            let idx = self.find(user_id)?;
            self.users.borrow_mut().remove(idx);
            Ok(ApiResponse {
                status_code: Some(200),
                message: Some("User deleted successfully".to_string()),
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one canned HTTP response and hand back the raw request.
    fn serve_once(status: u16, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                let done = line == "\r\n";
                head.push_str(&line);
                if done {
                    break;
                }
            }
            let mut body_buf = vec![0u8; content_length];
            reader.read_exact(&mut body_buf).unwrap();
            head.push_str(&String::from_utf8_lossy(&body_buf));

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            head
        });
        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"statusCode":200,"token":"abc","refreshToken":"def","expirationTime":"24Hrs","role":"ADMIN","message":"Successfully Logged In"}"#;
        let resp: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.token.as_deref(), Some("abc"));
        assert_eq!(resp.role.as_deref(), Some("ADMIN"));
        assert_eq!(resp.refresh_token.as_deref(), Some("def"));
    }

    #[test]
    fn test_parse_users_list_ignores_unknown_fields() {
        let json = r#"{"statusCode":200,"ourUsersList":[{"id":1,"name":"Ada","email":"a@x.io","role":"ADMIN","city":"London","password":"$2a$hash","enabled":true}]}"#;
        let resp: ApiResponse = serde_json::from_str(json).unwrap();
        let users = resp.our_users_list.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, Some(1));
        // Password never comes back into the client
        assert!(users[0].password.is_empty());
    }

    #[test]
    fn test_into_result_rejects_failure_status() {
        let resp = ApiResponse {
            status_code: Some(404),
            message: Some("User not found".to_string()),
            ..Default::default()
        };
        match resp.into_result() {
            Err(ApiError::Rejected { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "User not found");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(ApiResponse::default().into_result().is_ok());
    }

    #[test]
    fn test_user_serialization_omits_empty_password() {
        let user = User {
            id: None,
            name: "Ada".to_string(),
            email: "a@x.io".to_string(),
            role: "ADMIN".to_string(),
            city: "London".to_string(),
            password: String::new(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("id").is_none());

        let with_password = User {
            password: "pw".to_string(),
            ..user
        };
        let value = serde_json::to_value(&with_password).unwrap();
        assert_eq!(value["password"], "pw");
    }

    #[test]
    fn test_client_sends_bearer_and_reads_profile() {
        let (url, handle) = serve_once(
            200,
            r#"{"statusCode":200,"ourUsers":{"id":5,"name":"Eve","email":"eve@x.io","role":"USER","city":"Oslo"}}"#,
        );
        let client = Client::new(&url, Some(Duration::from_secs(5)));
        let user = client.profile(Some("tok-123")).unwrap();
        assert_eq!(user.name, "Eve");

        let request = handle.join().unwrap();
        assert!(request.starts_with("GET /adminuser/get-profile "));
        assert!(request.contains("Bearer tok-123"));
    }

    #[test]
    fn test_client_posts_login_credentials() {
        let (url, handle) = serve_once(200, r#"{"statusCode":200,"token":"t","role":"USER"}"#);
        let client = Client::new(&url, None);
        let resp = client.login("a@x.io", "pw").unwrap();
        assert_eq!(resp.token.as_deref(), Some("t"));

        let request = handle.join().unwrap();
        assert!(request.starts_with("POST /auth/login "));
        assert!(request.contains(r#""email":"a@x.io""#));
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_client_maps_http_error_status() {
        let (url, handle) = serve_once(403, "");
        let client = Client::new(&url, None);
        match client.list_users(Some("bad")) {
            Err(ApiError::Status { status, .. }) => assert_eq!(status, 403),
            other => panic!("unexpected: {:?}", other),
        }
        handle.join().unwrap();
    }

    #[test]
    fn test_client_delete_path() {
        let (url, handle) = serve_once(
            200,
            r#"{"statusCode":200,"message":"User deleted successfully"}"#,
        );
        let client = Client::new(&format!("{}/", url), None);
        client.delete_user("9", Some("t")).unwrap();
        let request = handle.join().unwrap();
        assert!(request.starts_with("DELETE /admin/delete/9 "));
    }

    #[test]
    fn test_client_escapes_user_id_segment() {
        let (url, handle) = serve_once(200, r#"{"statusCode":200}"#);
        let client = Client::new(&url, None);
        client.update_user("a/b?c", &User::default(), Some("t")).unwrap();
        let request = handle.join().unwrap();
        assert!(request.starts_with("PUT /admin/update/a%2Fb%3Fc "));
    }

    #[test]
    fn test_client_refuses_dot_segment_ids() {
        // Nothing listens here; a refused id must fail before any request
        let client = Client::new("http://127.0.0.1:1", None);
        for id in ["", ".", ".."] {
            assert!(matches!(
                client.update_user(id, &User::default(), Some("t")),
                Err(ApiError::InvalidId(_))
            ));
            assert!(matches!(
                client.delete_user(id, Some("t")),
                Err(ApiError::InvalidId(_))
            ));
            assert!(matches!(
                client.get_user(id, Some("t")),
                Err(ApiError::InvalidId(_))
            ));
        }
    }

    #[test]
    fn test_client_transport_error() {
        // Port 1 on loopback is essentially never listening
        let client = Client::new("http://127.0.0.1:1", Some(Duration::from_secs(2)));
        assert!(matches!(
            client.list_users(Some("t")),
            Err(ApiError::Transport(_))
        ));
    }
}
