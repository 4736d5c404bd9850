//! Google OAuth credentials and cached access tokens.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use resoluty_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// OAuth scope granting read and write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Service account key as downloaded from the Google Cloud console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Account identity, used as the assertion issuer.
    pub client_email: String,
    /// PEM encoded RSA private key.
    pub private_key: String,
    /// Key identifier placed in the assertion header.
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// Token endpoint override.
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// User OAuth client with a long-lived refresh token.
#[derive(Clone, Deserialize)]
pub struct AuthorizedUserSecret {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Refresh token exchanged for access tokens.
    pub refresh_token: String,
    /// Token endpoint override.
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for AuthorizedUserSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserSecret")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialFile {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUserSecret),
}

/// Secret material authorizing calls to the Sheets API.
#[derive(Clone)]
pub enum GoogleCredential {
    /// Exchanged through the JWT bearer grant.
    ServiceAccount(ServiceAccountKey),
    /// Exchanged through the refresh token grant.
    AuthorizedUser(AuthorizedUserSecret),
    /// Ready-made access token, used as-is.
    AccessToken(String),
}

impl std::fmt::Debug for GoogleCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
            Self::AuthorizedUser(secret) => f.debug_tuple("AuthorizedUser").field(secret).finish(),
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"<redacted>").finish(),
        }
    }
}

impl GoogleCredential {
    /// Parses a `credentials.json` document.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        let parsed: CredentialFile = serde_json::from_str(raw).map_err(|error| {
            AppError::Validation(format!(
                "credential file is not a supported Google credential: {error}"
            ))
        })?;

        Ok(match parsed {
            CredentialFile::ServiceAccount(key) => Self::ServiceAccount(key),
            CredentialFile::AuthorizedUser(secret) => Self::AuthorizedUser(secret),
        })
    }

    /// Reads and parses the credential file at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub async fn load(path: &Path) -> AppResult<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => Self::from_json(&raw).map(Some),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AppError::Validation(format!(
                "failed to read credential file '{}': {error}",
                path.display()
            ))),
        }
    }

    /// Returns a stable label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceAccount(_) => "service_account",
            Self::AuthorizedUser(_) => "authorized_user",
            Self::AccessToken(_) => "access_token",
        }
    }
}

enum TokenGrant {
    Static(String),
    JwtBearer {
        client_email: String,
        key_id: Option<String>,
        signing_key: EncodingKey,
        token_uri: String,
    },
    RefreshToken {
        secret: AuthorizedUserSecret,
        token_uri: String,
    },
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Produces access tokens for one credential, caching them until shortly
/// before they expire.
pub struct GoogleTokenSource {
    http: reqwest::Client,
    grant: TokenGrant,
    cache: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for GoogleTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let grant = match &self.grant {
            TokenGrant::Static(_) => "static",
            TokenGrant::JwtBearer { .. } => "jwt_bearer",
            TokenGrant::RefreshToken { .. } => "refresh_token",
        };
        f.debug_struct("GoogleTokenSource")
            .field("grant", &grant)
            .finish_non_exhaustive()
    }
}

impl GoogleTokenSource {
    /// Prepares a token source. Rejects a service account key that is not a
    /// valid RSA PEM.
    pub fn new(http: reqwest::Client, credential: GoogleCredential) -> AppResult<Self> {
        let grant = match credential {
            GoogleCredential::AccessToken(token) => {
                if token.trim().is_empty() {
                    return Err(AppError::Validation(
                        "static Google access token must not be empty".to_owned(),
                    ));
                }
                TokenGrant::Static(token)
            }
            GoogleCredential::ServiceAccount(key) => {
                let signing_key =
                    EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|error| {
                        AppError::Validation(format!(
                            "service account private key is not a valid RSA PEM: {error}"
                        ))
                    })?;
                TokenGrant::JwtBearer {
                    client_email: key.client_email,
                    key_id: key.private_key_id,
                    signing_key,
                    token_uri: key
                        .token_uri
                        .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_owned()),
                }
            }
            GoogleCredential::AuthorizedUser(secret) => {
                let token_uri = secret
                    .token_uri
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_owned());
                TokenGrant::RefreshToken { secret, token_uri }
            }
        };

        Ok(Self {
            http,
            grant,
            cache: Mutex::new(None),
        })
    }

    /// Returns a valid access token, fetching a new one when needed.
    pub async fn access_token(&self) -> AppResult<String> {
        if let TokenGrant::Static(token) = &self.grant {
            return Ok(token.clone());
        }

        let mut cache = self.cache.lock().await;
        let now = Utc::now();
        if let Some(cached) = cache
            .as_ref()
            .filter(|cached| cached.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now)
        {
            return Ok(cached.access_token.clone());
        }

        let fetched = self.fetch(now).await?;
        let access_token = fetched.access_token.clone();
        *cache = Some(fetched);
        Ok(access_token)
    }

    async fn fetch(&self, now: DateTime<Utc>) -> AppResult<CachedToken> {
        let (token_uri, params) = match &self.grant {
            TokenGrant::Static(token) => {
                return Ok(CachedToken {
                    access_token: token.clone(),
                    expires_at: DateTime::<Utc>::MAX_UTC,
                });
            }
            TokenGrant::JwtBearer {
                client_email,
                key_id,
                signing_key,
                token_uri,
            } => {
                let claims = AssertionClaims {
                    iss: client_email,
                    scope: SPREADSHEETS_SCOPE,
                    aud: token_uri,
                    iat: now.timestamp(),
                    exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
                };
                let mut header = Header::new(Algorithm::RS256);
                header.kid = key_id.clone();
                let assertion =
                    jsonwebtoken::encode(&header, &claims, signing_key).map_err(|error| {
                        AppError::Internal(format!("failed to sign service account assertion: {error}"))
                    })?;

                (
                    token_uri.as_str(),
                    vec![
                        ("grant_type", JWT_BEARER_GRANT.to_owned()),
                        ("assertion", assertion),
                    ],
                )
            }
            TokenGrant::RefreshToken { secret, token_uri } => (
                token_uri.as_str(),
                vec![
                    ("grant_type", "refresh_token".to_owned()),
                    ("client_id", secret.client_id.clone()),
                    ("client_secret", secret.client_secret.clone()),
                    ("refresh_token", secret.refresh_token.clone()),
                ],
            ),
        };

        let response = self
            .http
            .post(token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|error| {
                AppError::Integration(format!("failed to reach Google token endpoint: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .ok()
                .and_then(|parsed| parsed.error_description.or(parsed.error))
                .unwrap_or(body);
            warn!(status = %status, "Google token endpoint rejected the credential");
            return Err(AppError::Integration(format!(
                "Google token endpoint returned {status}: {reason}"
            )));
        }

        let parsed: TokenResponse = response.json().await.map_err(|error| {
            AppError::Integration(format!("invalid Google token response: {error}"))
        })?;
        let access_token = parsed
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                AppError::Integration("Google token response missing access_token".to_owned())
            })?;
        let lifetime = parsed.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        debug!(expires_in = lifetime, "fetched Google access token");

        Ok(CachedToken {
            access_token,
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}
