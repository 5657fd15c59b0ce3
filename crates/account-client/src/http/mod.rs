// Concrete client for the service's private HTTP API.
//
// Sessions are cookie-based: sign-in harvests Set-Cookie pairs plus a body
// token, and every later call replays them. No cookie store is shared
// between sessions.

mod config;
mod cookies;
mod wire;

pub use config::{DEFAULT_USER_AGENT, ServiceConfig};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder, StatusCode, multipart};
use std::collections::BTreeMap;
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::action::{ActionReceipt, ActionRequest, ActionResult, AvatarAsset, ProfileFields};
use crate::credential::Credential;
use crate::error::{ActionError, AuthError};
use crate::session::{AccountBackend, AccountSession, SessionState};
use wire::{
    AckResponse, ChallengeResponse, LoginResponse, PointsSummaryResponse, RewardCatalogResponse,
    RewardDefinition,
};

const LOGIN_CHALLENGE_PATH: &str = "/auth/challenge";
const LOGIN_SUBMIT_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const AVATAR_UPLOAD_PATH: &str = "/account/avatar";
const PROFILE_EDIT_PATH: &str = "/account/profile";
const POINTS_SUMMARY_PATH: &str = "/points/summary";
const REWARD_CATALOG_PATH: &str = "/points/catalog";
const GIFT_REDEEM_PATH: &str = "/points/redeem";

/// Opens [`HttpSession`]s against one service deployment.
///
/// The backend is cheap to share: it holds the connection pool and the
/// service configuration, nothing per-account.
pub struct HttpBackend {
    config: ServiceConfig,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: ServiceConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Build a client wired for this config. Kept separate so binaries can
    /// decide how to surface builder failures.
    pub fn build_client(config: &ServiceConfig) -> reqwest::Result<Client> {
        Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
    }

    async fn request_challenge(
        &self,
        credential: &Credential,
    ) -> Result<ChallengeResponse, AuthError> {
        let url = self.config.endpoint(LOGIN_CHALLENGE_PATH);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "account": credential.identifier }))
            .send()
            .await
            .map_err(|e| AuthError::from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::from_transport(&e))?;
        if !status.is_success() {
            return Err(classify_auth_status(&credential.identifier, status, &body));
        }
        serde_json::from_str(&body).map_err(|e| {
            AuthError::protocol(format!(
                "challenge response did not parse: {e}; body: {}",
                preview(&body)
            ))
        })
    }

    async fn submit_login(
        &self,
        credential: &Credential,
        challenge_id: &str,
        guard_code: Option<&str>,
    ) -> Result<(BTreeMap<String, String>, LoginResponse), AuthError> {
        let url = self.config.endpoint(LOGIN_SUBMIT_PATH);
        let payload = serde_json::json!({
            "account": credential.identifier,
            "secret": STANDARD.encode(credential.secret.as_bytes()),
            "challenge_id": challenge_id,
            "guard_code": guard_code,
        });
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuthError::from_transport(&e))?;

        let status = response.status();
        let session_cookies = cookies::parse_set_cookies(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::from_transport(&e))?;
        if !status.is_success() {
            return Err(classify_auth_status(&credential.identifier, status, &body));
        }
        let parsed = serde_json::from_str(&body).map_err(|e| {
            AuthError::protocol(format!(
                "login response did not parse: {e}; body: {}",
                preview(&body)
            ))
        })?;
        Ok((session_cookies, parsed))
    }
}

#[async_trait]
impl AccountBackend for HttpBackend {
    async fn login(
        &self,
        credential: &Credential,
    ) -> Result<Box<dyn AccountSession>, AuthError> {
        debug!(identifier = %credential.identifier, "starting sign-in");
        let challenge = self.request_challenge(credential).await?;

        // A guard code is sent whenever a seed is on file, not only when the
        // challenge asks for one; the service ignores unsolicited codes.
        let guard_code = match credential.two_factor_seed.as_deref() {
            Some(seed) => Some(
                authcode::generate(seed, SystemTime::now()).map_err(|e| {
                    AuthError::missing_second_factor(format!("guard code derivation failed: {e}"))
                })?,
            ),
            None if challenge.requires_code => {
                return Err(AuthError::missing_second_factor(
                    "service demanded a guard code but no seed is on file",
                ));
            }
            None => None,
        };

        let (session_cookies, login) = self
            .submit_login(credential, &challenge.challenge_id, guard_code.as_deref())
            .await?;

        if !login.success {
            return Err(classify_login_failure(&credential.identifier, &login));
        }
        let session_token = login.session_token.ok_or_else(|| {
            AuthError::protocol("login succeeded but no session token was returned")
        })?;

        info!(identifier = %credential.identifier, "signed in");
        Ok(Box::new(HttpSession {
            identifier: credential.identifier.clone(),
            client: self.client.clone(),
            config: self.config.clone(),
            cookies: session_cookies,
            session_token,
            state: SessionState::Authenticated,
        }))
    }
}

/// Sort a non-2xx sign-in response into the auth taxonomy.
fn classify_auth_status(identifier: &str, status: StatusCode, body: &str) -> AuthError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        AuthError::invalid_credentials(identifier)
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        AuthError::transient(format!("HTTP {status}"))
    } else {
        AuthError::protocol(format!("HTTP {status}: {}", preview(body)))
    }
}

/// Sort a parsed-but-unsuccessful login body into the auth taxonomy.
fn classify_login_failure(identifier: &str, response: &LoginResponse) -> AuthError {
    let message = response.message.as_deref().unwrap_or("login refused");
    match response.error_code {
        Some(wire::ERR_BAD_CREDENTIALS) => AuthError::invalid_credentials(identifier),
        Some(wire::ERR_CODE_REQUIRED) => {
            AuthError::missing_second_factor("service demanded a guard code")
        }
        Some(wire::ERR_CODE_MISMATCH) => AuthError::missing_second_factor(
            "guard code was refused; check the seed and the local clock",
        ),
        Some(code) => AuthError::protocol(format!("login failed with code {code}: {message}")),
        None => AuthError::protocol(format!("login failed: {message}")),
    }
}

/// First slice of a response body for diagnostics. Bodies can be whole
/// error pages, so never log them in full.
fn preview(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.len() <= LIMIT {
        body.to_string()
    } else {
        let cut: String = body.chars().take(LIMIT).collect();
        format!("{cut}...")
    }
}

/// One signed-in account on the service.
pub struct HttpSession {
    identifier: String,
    client: Client,
    config: ServiceConfig,
    cookies: BTreeMap<String, String>,
    session_token: String,
    state: SessionState,
}

impl HttpSession {
    fn apply_cookies(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.cookies.is_empty() {
            builder
        } else {
            builder.header(COOKIE, cookies::build_cookie_header(&self.cookies))
        }
    }

    /// Send and split into status + body, mapping transport failures into
    /// the action taxonomy.
    async fn send_action(
        &self,
        request: RequestBuilder,
    ) -> Result<(StatusCode, String), ActionError> {
        let response = request
            .send()
            .await
            .map_err(|e| ActionError::from_transport(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ActionError::from_transport(&e))?;
        Ok((status, body))
    }

    /// Interpret a mutating endpoint's reply. A 2xx whose body does not read
    /// as an acknowledgement means the change may still have landed; that is
    /// reported as [`ActionResult::AppliedUnconfirmed`], never as an error.
    fn confirm_mutation(
        &self,
        status: StatusCode,
        body: &str,
        receipt: ActionReceipt,
    ) -> Result<ActionResult, ActionError> {
        if !status.is_success() {
            return Err(ActionError::from_status(status, &preview(body)));
        }
        match serde_json::from_str::<AckResponse>(body) {
            Ok(ack) if ack.success => Ok(ActionResult::Applied(receipt)),
            Ok(ack) => Err(ActionError::rejected(
                ack.error.unwrap_or_else(|| "no reason given".to_string()),
            )),
            Err(e) => {
                warn!(
                    identifier = %self.identifier,
                    error = %e,
                    "change accepted but the confirmation was unreadable"
                );
                Ok(ActionResult::AppliedUnconfirmed(receipt))
            }
        }
    }

    async fn upload_avatar(&self, asset: &AvatarAsset) -> Result<ActionResult, ActionError> {
        let part = multipart::Part::bytes(asset.data.to_vec())
            .file_name(asset.name.clone())
            .mime_str(&asset.content_type)
            .map_err(|e| {
                ActionError::rejected(format!("avatar payload was refused before send: {e}"))
            })?;
        let form = multipart::Form::new()
            .part("avatar", part)
            .text("session_token", self.session_token.clone());

        let url = self.config.endpoint(AVATAR_UPLOAD_PATH);
        let (status, body) = self
            .send_action(self.apply_cookies(self.client.post(&url)).multipart(form))
            .await?;
        self.confirm_mutation(
            status,
            &body,
            ActionReceipt::AvatarChanged {
                image: asset.name.clone(),
            },
        )
    }

    async fn update_profile(&self, fields: &ProfileFields) -> Result<ActionResult, ActionError> {
        if fields.is_empty() {
            return Err(ActionError::rejected("no profile fields to update"));
        }
        let mut form: Vec<(&str, &str)> = vec![("session_token", &self.session_token)];
        if let Some(value) = fields.display_name.as_deref() {
            form.push(("display_name", value));
        }
        if let Some(value) = fields.real_name.as_deref() {
            form.push(("real_name", value));
        }
        if let Some(value) = fields.summary.as_deref() {
            form.push(("summary", value));
        }

        let url = self.config.endpoint(PROFILE_EDIT_PATH);
        let (status, body) = self
            .send_action(self.apply_cookies(self.client.post(&url)).form(&form))
            .await?;
        let receipt = ActionReceipt::ProfileUpdated {
            fields: fields.field_names().iter().map(|s| s.to_string()).collect(),
        };
        self.confirm_mutation(status, &body, receipt)
    }

    async fn send_gift(&self, recipient: &str) -> Result<ActionResult, ActionError> {
        let balance = self.fetch_point_balance().await?;
        let catalog = self.fetch_reward_catalog().await?;
        let Some(picked) = wire::pick_gift(&catalog, balance) else {
            return Err(ActionError::target_not_found(format!(
                "no giftable reward within a balance of {balance} points"
            )));
        };
        info!(
            identifier = %self.identifier,
            item = %picked.name,
            cost = picked.cost,
            recipient = %recipient,
            "redeeming gift"
        );

        let url = self.config.endpoint(GIFT_REDEEM_PATH);
        let payload = serde_json::json!({
            "item_id": picked.id,
            "recipient": recipient,
            "sender": self.config.client_name,
            "session_token": self.session_token,
        });
        let (status, body) = self
            .send_action(self.apply_cookies(self.client.post(&url)).json(&payload))
            .await?;
        self.confirm_mutation(
            status,
            &body,
            ActionReceipt::GiftSent {
                item: picked.name.clone(),
                cost: picked.cost,
            },
        )
    }

    /// Reads fail hard without ambiguity: nothing has mutated yet.
    async fn fetch_point_balance(&self) -> Result<u64, ActionError> {
        let url = self.config.endpoint(POINTS_SUMMARY_PATH);
        let (status, body) = self
            .send_action(self.apply_cookies(self.client.get(&url)))
            .await?;
        if !status.is_success() {
            return Err(ActionError::from_status(status, &preview(&body)));
        }
        let parsed: PointsSummaryResponse = serde_json::from_str(&body)
            .map_err(|e| ActionError::rejected(format!("unreadable points summary: {e}")))?;
        Ok(parsed.summary.points)
    }

    async fn fetch_reward_catalog(&self) -> Result<Vec<RewardDefinition>, ActionError> {
        let url = self.config.endpoint(REWARD_CATALOG_PATH);
        let (status, body) = self
            .send_action(self.apply_cookies(self.client.get(&url)))
            .await?;
        if !status.is_success() {
            return Err(ActionError::from_status(status, &preview(&body)));
        }
        let parsed: RewardCatalogResponse = serde_json::from_str(&body)
            .map_err(|e| ActionError::rejected(format!("unreadable reward catalog: {e}")))?;
        Ok(parsed.definitions)
    }
}

#[async_trait]
impl AccountSession for HttpSession {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn state(&self) -> SessionState {
        self.state
    }

    async fn perform(&mut self, request: &ActionRequest) -> Result<ActionResult, ActionError> {
        if self.state != SessionState::Authenticated {
            return Err(ActionError::NotAuthenticated);
        }
        self.state = SessionState::ActionInFlight;
        debug!(identifier = %self.identifier, action = request.kind(), "performing action");

        let result = match request {
            ActionRequest::ChangeAvatar(asset) => self.upload_avatar(asset).await,
            ActionRequest::UpdateProfile(fields) => self.update_profile(fields).await,
            ActionRequest::SendGift { recipient } => self.send_gift(recipient).await,
        };

        // A NotAuthenticated coming back from the wire means the service
        // revoked us mid-run; everything else leaves the session usable.
        self.state = match &result {
            Err(ActionError::NotAuthenticated) => SessionState::Invalid,
            _ => SessionState::Authenticated,
        };
        result
    }

    async fn logout(&mut self) {
        match self.state {
            SessionState::LoggedOut => return,
            SessionState::Invalid => {
                // The service already dropped the session; a remote release
                // would only 401.
                self.cookies.clear();
                self.state = SessionState::LoggedOut;
                return;
            }
            _ => {}
        }

        let url = self.config.endpoint(LOGOUT_PATH);
        let request = self
            .apply_cookies(self.client.post(&url))
            .form(&[("session_token", self.session_token.as_str())]);
        match request.send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(
                    identifier = %self.identifier,
                    status = %response.status(),
                    "logout was not acknowledged"
                );
            }
            Ok(_) => debug!(identifier = %self.identifier, "logged out"),
            Err(e) => warn!(identifier = %self.identifier, error = %e, "logout request failed"),
        }
        self.cookies.clear();
        self.state = SessionState::LoggedOut;
    }
}
