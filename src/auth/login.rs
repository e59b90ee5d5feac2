use anyhow::{anyhow, bail};
use oauth2::{
    AuthorizationCode, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, Scope, TokenResponse,
};
use tracing::info;

use crate::GetField;
use crate::session::{Session, username};

use super::Broker;

/// State the client must hold between opening the authorize url and
/// the broker calling back. One attempt redeems once; the PKCE
/// verifier goes with it.
pub struct LoginAttempt {
    authorize_url: reqwest::Url,
    csrf: CsrfToken,
    verifier: PkceCodeVerifier,
}

impl LoginAttempt {
    /// Where to send the actor's browser.
    pub fn authorize_url(&self) -> &reqwest::Url {
        &self.authorize_url
    }
}

pub fn begin_login(broker: &Broker) -> LoginAttempt {
    let (pkce_code_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (authorize_url, csrf_state) = broker
        .client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("webid".to_string()))
        .set_pkce_challenge(pkce_code_challenge)
        .url();

    LoginAttempt {
        authorize_url,
        csrf: csrf_state,
        verifier: pkce_verifier,
    }
}

/// Redeem the broker's callback for a session. The callback's state
/// must echo the attempt's; the actor id comes from the broker's
/// userinfo document, `webid` first, `sub` as the fallback.
pub async fn complete_login(
    broker: &Broker,
    attempt: LoginAttempt,
    state: Option<String>,
    code: Option<String>,
) -> anyhow::Result<Session> {
    let state = CsrfToken::new(state.ok_or(anyhow!("login callback without state"))?);
    let code = AuthorizationCode::new(code.ok_or(anyhow!("login callback without code"))?);

    if state.secret() != attempt.csrf.secret() {
        bail!("csrf tokens don't match");
    }

    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let token_result = broker
        .client
        .exchange_code(code)
        .set_pkce_verifier(attempt.verifier)
        .request_async(&http_client)
        .await?;

    let access_token = token_result.access_token().secret();
    let body: serde_json::Value = http_client
        .get(broker.userinfo_url.clone())
        .bearer_auth(access_token)
        .send()
        .await?
        .json()
        .await?;

    let actor = body
        .get_str_field("webid")
        .or_else(|_| body.get_str_field("sub"))?;

    info!("signed in as {}", username(&actor));
    Ok(Session::new(actor))
}
