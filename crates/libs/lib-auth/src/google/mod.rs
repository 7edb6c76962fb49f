//! # Google OAuth2
//!
//! Authorization-code flow against Google, delegated to the `oauth2` crate.
//!
//! 1. [`GoogleOAuth::authorize_url`] builds the consent URL and a CSRF state.
//! 2. Google redirects back with `code` + `state`; the caller checks the state.
//! 3. [`GoogleOAuth::exchange_code`] trades the code for an access token.
//! 4. [`GoogleOAuth::fetch_profile`] reads the user's email from the
//!    OpenID Connect userinfo endpoint.

use crate::error::{Error, Result};
use oauth2::{
    basic::BasicClient, url::Url, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::debug;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// Client with the authorization and token endpoints configured.
type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Credentials and endpoints for the Google OAuth client.
#[derive(Clone, Debug)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Must match a redirect URI registered in the Google console.
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleSettings {
    /// Settings pointing at Google's public endpoints.
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

/// Subset of the OpenID Connect userinfo response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Google OAuth2 client.
pub struct GoogleOAuth {
    client: GoogleClient,
    http: reqwest::Client,
    userinfo_url: String,
}

impl GoogleOAuth {
    pub fn new(settings: GoogleSettings) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(settings.client_id))
            .set_client_secret(ClientSecret::new(settings.client_secret))
            .set_auth_uri(AuthUrl::new(settings.auth_url).map_err(config_err)?)
            .set_token_uri(TokenUrl::new(settings.token_url).map_err(config_err)?)
            .set_redirect_uri(RedirectUrl::new(settings.redirect_url).map_err(config_err)?);

        // Following redirects on the token endpoint opens an SSRF hole.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::OAuthConfig(e.to_string()))?;

        Ok(Self {
            client,
            http,
            userinfo_url: settings.userinfo_url,
        })
    }

    /// Consent-page URL and the CSRF state the callback must echo back.
    pub fn authorize_url(&self) -> (Url, CsrfToken) {
        SCOPES
            .iter()
            .fold(
                self.client.authorize_url(CsrfToken::new_random),
                |request, scope| request.add_scope(Scope::new(scope.to_string())),
            )
            .url()
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: String) -> Result<String> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http)
            .await
            .map_err(|e| Error::OAuthExchange(e.to_string()))?;

        debug!("[OAUTH] Code exchanged for access token");
        Ok(token.access_token().secret().clone())
    }

    /// Fetch the profile of the user who granted `access_token`.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Profile(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Profile(e.to_string()))?;

        let profile: GoogleProfile = response
            .json()
            .await
            .map_err(|e| Error::Profile(e.to_string()))?;

        if profile.email_verified == Some(false) {
            return Err(Error::Profile(format!("email {} is not verified", profile.email)));
        }

        Ok(profile)
    }
}

fn config_err(err: oauth2::url::ParseError) -> Error {
    Error::OAuthConfig(err.to_string())
}
