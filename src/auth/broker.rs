use oauth2::{AuthUrl, Client, ClientId, ClientSecret, RedirectUrl, TokenUrl, basic::BasicClient};
use serde_json::Value;

use crate::GetField;

pub(crate) type ReadyClient = Client<oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>, oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardTokenIntrospectionResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardRevocableToken, oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>, oauth2::EndpointSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointSet>;

/// The identity broker actors sign in through. Endpoints derive from
/// the issuer url; a confidential client also carries its secret.
#[derive(Clone)]
pub struct Broker {
    pub(crate) client: ReadyClient,
    pub(crate) userinfo_url: reqwest::Url,
}

impl Broker {
    /// Build a broker from its JSON description: `issuer` and
    /// `client_id` required, `client_secret` and `redirect_uri`
    /// optional.
    pub fn from_json(json: Value) -> anyhow::Result<Broker> {
        let issuer = json.get_str_field("issuer")?;
        let issuer = issuer.trim_end_matches('/');
        let client_id = ClientId::new(json.get_str_field("client_id")?);
        let redirect = json
            .get_str_field("redirect_uri")
            .unwrap_or_else(|_| "http://localhost:8080/lockin".to_owned());

        let auth_url = AuthUrl::new(format!("{issuer}/authorize"))?;
        let token_url = TokenUrl::new(format!("{issuer}/token"))?;
        let redirect_url = RedirectUrl::new(redirect)?;
        let userinfo_url = reqwest::Url::parse(&format!("{issuer}/userinfo"))?;

        let mut client = BasicClient::new(client_id)
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);
        if let Some(secret) = json.get("client_secret").and_then(Value::as_str) {
            client = client.set_client_secret(ClientSecret::new(secret.to_owned()));
        }

        Ok(Broker { client, userinfo_url })
    }
}
