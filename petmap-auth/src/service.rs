use crate::models::{json_part, PhotoAttachment, ProfileUpdate, SignInRequest, SignUpRequest, UserProfile};
use crate::session::SessionError;
use crate::transport::{RequestBody, Transport, TransportError};
use serde_json::Value;

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const SIGN_UP_PATH: &str = "/auth/signup";
pub const PROFILE_PATH: &str = "/auth/me";

/// Error type for authentication and profile operations
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// The service accepted the sign-in but sent no token
    EmptyToken,
    /// The service refused the request
    Rejected(String),
    /// The profile could not be saved
    UpdateFailed(String),
    /// A required form field was blank; nothing was sent
    MissingField(&'static str),
    /// The token could not be stored
    Session(SessionError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::EmptyToken => write!(f, "Sign-in response did not contain a token"),
            AuthError::Rejected(msg) => write!(f, "Request rejected: {}", msg),
            AuthError::UpdateFailed(msg) => write!(f, "Profile update failed: {}", msg),
            AuthError::MissingField(field) => write!(f, "Field '{}' is required", field),
            AuthError::Session(e) => write!(f, "Session error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        AuthError::Session(err)
    }
}

/// Gateway for the account endpoints of the service
#[derive(Clone)]
pub struct AuthService {
    transport: Transport,
}

impl AuthService {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Sign in and start a session with the returned token.
    ///
    /// The session is only touched when a token was actually received.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthError> {
        require("email", email)?;
        require("password", password)?;

        let body = serde_json::to_value(SignInRequest {
            email: email.trim(),
            password,
        })
        .map_err(|e| AuthError::Rejected(e.to_string()))?;

        let response = self
            .transport
            .post(SIGN_IN_PATH, RequestBody::Json(body))
            .await
            .map_err(|e| AuthError::Rejected(e.message))?;

        let token = extract_token(&response).ok_or(AuthError::EmptyToken)?;
        self.transport.session().login(&token)?;

        log::info!("Signed in as {}", email.trim());
        Ok(token)
    }

    /// Register a new account. Does not sign in.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<(), AuthError> {
        require("name", name)?;
        require("email", email)?;
        require("password", password)?;

        let body = serde_json::to_value(SignUpRequest {
            name: name.trim(),
            email: email.trim(),
            password,
        })
        .map_err(|e| AuthError::Rejected(e.to_string()))?;

        self.transport
            .post(SIGN_UP_PATH, RequestBody::Json(body))
            .await
            .map_err(|e| AuthError::Rejected(e.message))?;

        log::info!("Registered account {}", email.trim());
        Ok(())
    }

    /// Fetch the signed-in user's profile.
    ///
    /// Any failure yields `None`; so does a response that arrives after the
    /// session changed underneath the request.
    pub async fn fetch_profile(&self) -> Option<UserProfile> {
        let session = self.transport.session();
        let ticket = session.ticket();

        let response = match self.transport.get(PROFILE_PATH).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Could not load profile: {}", e);
                return None;
            }
        };

        if !session.is_current(ticket) {
            log::debug!("Discarding profile response from an ended session");
            return None;
        }

        match serde_json::from_value::<UserProfile>(response) {
            Ok(profile) => Some(profile),
            Err(e) => {
                log::warn!("Unexpected profile payload: {}", e);
                None
            }
        }
    }

    /// Replace the profile wholesale.
    ///
    /// Sent as JSON, or as multipart (`profile` JSON part plus `photo`) when a
    /// photo is attached. If the service answers without a profile body the
    /// profile is fetched again.
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
        photo: Option<&PhotoAttachment>,
    ) -> Result<UserProfile, AuthError> {
        let body = match photo {
            Some(photo) => {
                let profile_part = json_part(update).map_err(AuthError::UpdateFailed)?;
                let photo_part = photo
                    .to_part()
                    .map_err(|e| AuthError::UpdateFailed(format!("Invalid photo: {}", e)))?;
                RequestBody::Multipart(
                    reqwest::multipart::Form::new()
                        .part("profile", profile_part)
                        .part("photo", photo_part),
                )
            }
            None => RequestBody::Json(
                serde_json::to_value(update).map_err(|e| AuthError::UpdateFailed(e.to_string()))?,
            ),
        };

        let response = self
            .transport
            .put(PROFILE_PATH, body)
            .await
            .map_err(|e: TransportError| AuthError::UpdateFailed(e.message))?;

        log::info!("Profile updated");

        if let Ok(profile) = serde_json::from_value::<UserProfile>(response) {
            if !profile.email.is_empty() {
                return Ok(profile);
            }
        }

        self.fetch_profile().await.ok_or_else(|| {
            AuthError::UpdateFailed("Profile was saved but could not be reloaded".to_string())
        })
    }
}

/// Token from either a bare string body or a `token` field
fn extract_token(response: &Value) -> Option<String> {
    let token = match response {
        Value::String(token) => Some(token.as_str()),
        Value::Object(fields) => fields.get("token").and_then(Value::as_str),
        _ => None,
    }?;

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Avatar;
    use crate::session::{MemoryTokenStorage, Session};
    use crate::transport::DEFAULT_TIMEOUT;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer, storage: MemoryTokenStorage) -> (AuthService, Session) {
        let session = Session::init(storage);
        let transport = Transport::new(server.uri(), session.clone(), DEFAULT_TIMEOUT).unwrap();
        (AuthService::new(transport), session)
    }

    fn sample_update() -> ProfileUpdate {
        ProfileUpdate {
            name: "Ana".to_string(),
            bio: "Looking for Rex".to_string(),
            avatar: Avatar::Cat,
        }
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token(&json!({"token": "abc"})).as_deref(), Some("abc"));
        assert_eq!(extract_token(&json!("abc")).as_deref(), Some("abc"));
        assert_eq!(extract_token(&json!({})), None);
        assert_eq!(extract_token(&json!({"token": ""})), None);
        assert_eq!(extract_token(&Value::Null), None);
    }

    #[tokio::test]
    async fn test_sign_in_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SIGN_IN_PATH))
            .and(body_json(json!({"email": "a@b.com", "password": "x"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
            .expect(1)
            .mount(&server)
            .await;

        let storage = MemoryTokenStorage::new();
        let (service, session) = service_for(&server, storage.clone());

        let token = service.sign_in("a@b.com", "x").await.unwrap();

        assert_eq!(token, "abc");
        assert_eq!(session.current().as_deref(), Some("abc"));
        assert_eq!(storage.stored().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_sign_in_accepts_bare_token_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SIGN_IN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("raw-token"))
            .mount(&server)
            .await;

        let (service, session) = service_for(&server, MemoryTokenStorage::new());

        service.sign_in("a@b.com", "x").await.unwrap();
        assert_eq!(session.current().as_deref(), Some("raw-token"));
    }

    #[tokio::test]
    async fn test_sign_in_without_token_leaves_session_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SIGN_IN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let storage = MemoryTokenStorage::with_token("old");
        let (service, session) = service_for(&server, storage.clone());

        let err = service.sign_in("a@b.com", "x").await.unwrap_err();

        assert_eq!(err, AuthError::EmptyToken);
        assert_eq!(session.current().as_deref(), Some("old"));
        assert_eq!(storage.stored().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_sign_in_rejected_uses_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SIGN_IN_PATH))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let (service, session) = service_for(&server, MemoryTokenStorage::new());

        let err = service.sign_in("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(err, AuthError::Rejected("Invalid credentials".to_string()));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_in_blank_field_sends_nothing() {
        let server = MockServer::start().await;
        let (service, _) = service_for(&server, MemoryTokenStorage::new());

        let err = service.sign_in("  ", "x").await.unwrap_err();
        assert_eq!(err, AuthError::MissingField("email"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_posts_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SIGN_UP_PATH))
            .and(body_json(
                json!({"name": "Ana", "email": "a@b.com", "password": "x"}),
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let (service, session) = service_for(&server, MemoryTokenStorage::new());

        service.sign_up("Ana", "a@b.com", "x").await.unwrap();
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_up_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SIGN_UP_PATH))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "Email already used"})),
            )
            .mount(&server)
            .await;

        let (service, _) = service_for(&server, MemoryTokenStorage::new());

        let err = service.sign_up("Ana", "a@b.com", "x").await.unwrap_err();
        assert_eq!(err, AuthError::Rejected("Email already used".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_profile_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Ana",
                "email": "a@b.com",
                "bio": "hi",
                "avatar": "yarn"
            })))
            .mount(&server)
            .await;

        let (service, _) = service_for(&server, MemoryTokenStorage::with_token("abc"));

        let profile = service.fetch_profile().await.unwrap();
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.avatar, Avatar::Yarn);
    }

    #[tokio::test]
    async fn test_fetch_profile_failure_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (service, _) = service_for(&server, MemoryTokenStorage::new());
        assert!(service.fetch_profile().await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_profile_discards_response_after_logout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": "Ana", "email": "a@b.com"}))
                    .set_delay(std::time::Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let (service, session) = service_for(&server, MemoryTokenStorage::with_token("abc"));

        let logout = async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            session.logout().unwrap();
        };
        let (profile, _) = tokio::join!(service.fetch_profile(), logout);

        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_json() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(PROFILE_PATH))
            .and(header("content-type", "application/json"))
            .and(body_json(
                json!({"name": "Ana", "bio": "Looking for Rex", "avatar": "cat"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Ana",
                "email": "a@b.com",
                "bio": "Looking for Rex",
                "avatar": "cat"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (service, _) = service_for(&server, MemoryTokenStorage::with_token("abc"));

        let profile = service.update_profile(&sample_update(), None).await.unwrap();
        assert_eq!(profile.bio, "Looking for Rex");
        assert_eq!(profile.avatar, Avatar::Cat);
    }

    #[tokio::test]
    async fn test_update_profile_with_photo_is_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(PROFILE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Ana",
                "email": "a@b.com",
                "bio": "Looking for Rex",
                "avatar": "cat"
            })))
            .mount(&server)
            .await;

        let (service, _) = service_for(&server, MemoryTokenStorage::with_token("abc"));
        let photo = PhotoAttachment::new("me.png", "image/png", vec![0x89, b'P', b'N', b'G']);

        service
            .update_profile(&sample_update(), Some(&photo))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));

        let body = String::from_utf8_lossy(&requests[0].body).to_lowercase();
        assert!(body.contains("name=\"profile\""));
        assert!(body.contains("name=\"photo\"; filename=\"me.png\""));
        assert!(body.contains("content-type: application/json"));
        assert!(body.contains("\"avatar\":\"cat\""));
    }

    #[tokio::test]
    async fn test_update_profile_empty_body_refetches() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(PROFILE_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Ana",
                "email": "a@b.com",
                "bio": "Looking for Rex",
                "avatar": "cat"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (service, _) = service_for(&server, MemoryTokenStorage::with_token("abc"));

        let profile = service.update_profile(&sample_update(), None).await.unwrap();
        assert_eq!(profile.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_update_profile_failure() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(PROFILE_PATH))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Name too long"})),
            )
            .mount(&server)
            .await;

        let (service, _) = service_for(&server, MemoryTokenStorage::with_token("abc"));

        let err = service
            .update_profile(&sample_update(), None)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::UpdateFailed("Name too long".to_string()));
    }
}
