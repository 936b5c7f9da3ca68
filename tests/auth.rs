use dabblebase_rs::{Dabblebase, DabblebaseConfig, DabblebaseError, MemoryContext};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const PRIVATE_KEY: &str = include_str!("fixtures/rsa_private.pem");
const OTHER_PRIVATE_KEY: &str = include_str!("fixtures/other_private.pem");
const PUBLIC_KEY: &str = include_str!("fixtures/rsa_public_key.txt");

fn config() -> DabblebaseConfig {
    DabblebaseConfig::new("https://db.example.com", "p1", "tok").with_verify_key(PUBLIC_KEY)
}

fn sign(claims: serde_json::Value, private_key: &str) -> String {
    let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).unwrap();
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[test]
fn test_verify_valid_token() {
    let client = Dabblebase::new(config()).unwrap();
    let token = sign(json!({"sub": "user-42", "exp": now() + 3600}), PRIVATE_KEY);

    let subject = client.auth.verify(Some(&token)).unwrap();
    assert_eq!(subject.id, "user-42");
}

#[test]
fn test_verify_token_without_exp() {
    let client = Dabblebase::new(config()).unwrap();
    let token = sign(json!({"sub": "user-42", "aud": "anything"}), PRIVATE_KEY);

    assert_eq!(client.auth.verify(Some(&token)).unwrap().id, "user-42");
}

#[test]
fn test_verify_missing_token_checks_nothing() {
    // No verify key: a missing token must be reported before the key is looked at
    let client =
        Dabblebase::new(DabblebaseConfig::new("https://db.example.com", "p1", "tok")).unwrap();
    assert!(matches!(
        client.auth.verify(None),
        Err(DabblebaseError::MissingToken)
    ));
}

#[test]
fn test_verify_wrong_signature() {
    let client = Dabblebase::new(config()).unwrap();
    let token = sign(json!({"sub": "user-42"}), OTHER_PRIVATE_KEY);

    assert!(matches!(
        client.auth.verify(Some(&token)),
        Err(DabblebaseError::InvalidToken(_))
    ));
}

#[test]
fn test_verify_expired_token() {
    let client = Dabblebase::new(config()).unwrap();
    let token = sign(json!({"sub": "user-42", "exp": now() - 3600}), PRIVATE_KEY);

    assert!(matches!(
        client.auth.verify(Some(&token)),
        Err(DabblebaseError::InvalidToken(_))
    ));
}

#[test]
fn test_verify_garbage_token() {
    let client = Dabblebase::new(config()).unwrap();
    assert!(matches!(
        client.auth.verify(Some("not-a-jwt")),
        Err(DabblebaseError::InvalidToken(_))
    ));
}

#[test]
fn test_verify_current_reads_cookie() {
    let token = sign(json!({"sub": "user-7"}), PRIVATE_KEY);
    let context = Arc::new(MemoryContext::from_cookie_header(&format!(
        "auth-token={token}"
    )));
    let client = Dabblebase::with_context(config(), context).unwrap();

    assert_eq!(client.auth.verify_current().unwrap().id, "user-7");

    client.auth.store_token("");
    assert!(matches!(
        client.auth.verify_current(),
        Err(DabblebaseError::MissingToken)
    ));
}

#[test]
fn test_sign_in_navigates() {
    let context = Arc::new(MemoryContext::new().with_current_url("https://app.example.com/"));
    let client = Dabblebase::with_context(config(), context.clone()).unwrap();

    client.auth.sign_in("github", None).unwrap();

    assert_eq!(
        context.navigations(),
        vec!["https://db.example.com/api/project/p1/auth/github?continue_to=https%3A%2F%2Fapp.example.com%2F"]
    );
}
