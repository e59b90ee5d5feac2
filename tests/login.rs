use std::collections::HashMap;

use serde_json::json;

use loudwhispers::auth::{Broker, begin_login, complete_login};

fn broker() -> Broker {
    Broker::from_json(json!({
        "issuer": "https://auth.example",
        "client_id": "loudwhispers-dev",
    }))
    .unwrap()
}

#[test]
fn authorize_url_carries_pkce_state_and_scopes() {
    let attempt = begin_login(&broker());
    let url = attempt.authorize_url();
    assert_eq!(url.origin().ascii_serialization(), "https://auth.example");
    assert_eq!(url.path(), "/authorize");

    let query: HashMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(query.get("response_type").map(String::as_str), Some("code"));
    assert_eq!(
        query.get("client_id").map(String::as_str),
        Some("loudwhispers-dev")
    );
    assert_eq!(
        query.get("code_challenge_method").map(String::as_str),
        Some("S256")
    );
    assert!(query.get("code_challenge").is_some_and(|c| !c.is_empty()));
    assert!(query.get("state").is_some_and(|s| !s.is_empty()));
    assert!(
        query
            .get("scope")
            .is_some_and(|s| s.contains("openid") && s.contains("webid"))
    );
    assert_eq!(
        query.get("redirect_uri").map(String::as_str),
        Some("http://localhost:8080/lockin")
    );
}

#[test]
fn every_attempt_rolls_fresh_secrets() {
    let broker = broker();
    let first = begin_login(&broker);
    let second = begin_login(&broker);
    assert_ne!(
        first.authorize_url().as_str(),
        second.authorize_url().as_str()
    );
}

#[tokio::test]
async fn callback_with_the_wrong_state_is_rejected() {
    let broker = broker();
    let attempt = begin_login(&broker);
    let err = complete_login(&broker, attempt, Some("forged".into()), Some("code".into()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("csrf"));
}

#[tokio::test]
async fn callback_missing_pieces_is_rejected() {
    let broker = broker();

    let attempt = begin_login(&broker);
    let err = complete_login(&broker, attempt, None, Some("code".into()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("without state"));

    let attempt = begin_login(&broker);
    let state = attempt
        .authorize_url()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    let err = complete_login(&broker, attempt, Some(state), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("without code"));
}

#[test]
fn broker_config_must_name_issuer_and_client() {
    assert!(Broker::from_json(json!({ "client_id": "x" })).is_err());
    assert!(Broker::from_json(json!({ "issuer": "https://auth.example" })).is_err());
    assert!(Broker::from_json(json!({ "issuer": "not a url", "client_id": "x" })).is_err());
}
