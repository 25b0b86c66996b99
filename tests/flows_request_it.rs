#![cfg(feature = "reqwest")]

mod common;

// std
use std::collections::HashMap;
// crates.io
use httpmock::prelude::*;
// self
use common::*;
use oauth2_azure_ad::{
	config::StrategyOptions,
	error::{ConfigError, Error},
	flows::{PkceCodeChallengeMethod, RequestContext, Strategy},
	provider::{BASE_AZURE_URL, TenantProvider},
	url::Url,
};

struct B2cTenant;
impl TenantProvider for B2cTenant {
	fn client_id(&self) -> Option<String> {
		Some("b2c-client".into())
	}

	fn client_secret(&self) -> Option<String> {
		Some("b2c-secret".into())
	}

	fn tenant_id(&self) -> Option<String> {
		Some("fabrikamb2c.onmicrosoft.com".into())
	}

	fn base_azure_url(&self) -> Option<String> {
		Some("https://fabrikamb2c.b2clogin.com".into())
	}

	fn custom_policy(&self) -> Option<String> {
		Some("B2C_1_signupsignin".into())
	}

	fn scope(&self) -> Option<String> {
		Some("openid offline_access".into())
	}
}

struct AdfsTenant;
impl TenantProvider for AdfsTenant {
	fn client_id(&self) -> Option<String> {
		Some("adfs-client".into())
	}

	fn client_secret(&self) -> Option<String> {
		Some("adfs-secret".into())
	}

	fn tenant_id(&self) -> Option<String> {
		Some("adfs".into())
	}

	fn custom_policy(&self) -> Option<String> {
		Some("ignored-for-authorize".into())
	}

	fn is_adfs(&self) -> bool {
		true
	}
}

fn authorize_pairs(url: &Url) -> HashMap<String, String> {
	url.query_pairs().into_owned().collect()
}

#[test]
fn request_phase_builds_authorize_redirect() {
	let strategy = Strategy::new(
		StrategyOptions::new(CLIENT_ID, CLIENT_SECRET)
			.with_tenant_id(TENANT)
			.with_domain_hint("contoso.com"),
	)
	.expect("Default transport should build.");
	let session = strategy
		.request_phase(&request_path().with_query("prompt", "select_account"))
		.expect("Request phase should succeed.");
	let pairs = authorize_pairs(&session.authorize_url);

	assert_eq!(
		session.authorize_url.as_str().split('?').next(),
		Some(format!("{BASE_AZURE_URL}/contoso/oauth2/v2.0/authorize").as_str())
	);
	assert_eq!(
		session.redirect_uri.as_str(),
		"https://app.example.com/auth/azure_activedirectory_v2/callback"
	);
	assert_eq!(pairs.get("client_id").map(String::as_str), Some(CLIENT_ID));
	assert_eq!(pairs.get("scope").map(String::as_str), Some("openid profile email"));
	assert_eq!(pairs.get("domain_hint").map(String::as_str), Some("contoso.com"));
	assert_eq!(pairs.get("prompt").map(String::as_str), Some("select_account"));
	assert_eq!(pairs.get("state"), Some(&session.state));
	assert_eq!(session.code_challenge_method(), Some(PkceCodeChallengeMethod::S256));
}

#[test]
fn b2c_tenant_provider_inserts_policy_into_token_url_only() {
	let strategy = Strategy::new(StrategyOptions::default())
		.expect("Default transport should build.")
		.with_tenant_provider(|_: &RequestContext| B2cTenant);
	let session = strategy.request_phase(&request_path()).expect("Request phase should succeed.");

	assert_eq!(
		session.endpoints.authorize_url,
		"https://fabrikamb2c.b2clogin.com/fabrikamb2c.onmicrosoft.com/oauth2/v2.0/authorize"
	);
	assert_eq!(
		session.endpoints.token_url,
		"https://fabrikamb2c.b2clogin.com/fabrikamb2c.onmicrosoft.com/B2C_1_signupsignin/oauth2/v2.0/token"
	);
	assert_eq!(session.config.scope, "openid offline_access");
	assert_eq!(session.config.client_id, "b2c-client");
}

#[test]
fn adfs_tenant_uses_legacy_segment_everywhere() {
	let strategy = Strategy::new(StrategyOptions::default())
		.expect("Default transport should build.")
		.with_tenant_provider(|_: &RequestContext| AdfsTenant);
	let session = strategy
		.request_phase(&request_path().with_query("scope", "openid"))
		.expect("Request phase should succeed.");

	assert_eq!(session.endpoints.authorize_url, format!("{BASE_AZURE_URL}/adfs/oauth2/authorize"));
	assert_eq!(
		session.endpoints.token_url,
		format!("{BASE_AZURE_URL}/adfs/ignored-for-authorize/oauth2/token")
	);
	assert!(!session.endpoints.authorize_url.contains("v2.0"));
	assert!(!session.endpoints.authorize_url.contains("ignored-for-authorize"));
	assert_eq!(session.config.scope, "openid");
}

#[test]
fn missing_credentials_prevent_flow_start() {
	let strategy = Strategy::new(StrategyOptions { client_id: Some("only-id".into()), ..Default::default() })
		.expect("Default transport should build.");
	let err = strategy.request_phase(&request_path()).expect_err("A missing secret must fail.");

	assert!(matches!(err, Error::Config(ConfigError::MissingClientSecret)));
}

#[tokio::test]
async fn session_pins_the_config_resolved_at_flow_start() {
	let server = MockServer::start_async().await;
	let base_url = server.base_url();
	let strategy = strategy(&server).with_tenant_provider(move |request: &RequestContext| {
		PinnedTenant {
			tenant: request.query_param("tenant").unwrap_or(TENANT).to_owned(),
			base_url: base_url.clone(),
		}
	});
	let session = strategy
		.request_phase(&request_path().with_query("tenant", "contoso"))
		.expect("Request phase should succeed.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).body_includes("client_id=pinned-contoso");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant"}"#);
		})
		.await;
	// The callback request names another tenant; the exchange must still target the pinned one.
	let request = callback(&session, "code").with_query("tenant", "fabrikam");
	let outcome = strategy.callback_phase(&session, &request).await;

	mock.assert_calls_async(1).await;

	assert!(!outcome.is_completed());
	assert_eq!(session.config.tenant_id, "contoso");
}

struct PinnedTenant {
	tenant: String,
	base_url: String,
}
impl TenantProvider for PinnedTenant {
	fn client_id(&self) -> Option<String> {
		Some(format!("pinned-{}", self.tenant))
	}

	fn client_secret(&self) -> Option<String> {
		Some("pinned-secret".into())
	}

	fn tenant_id(&self) -> Option<String> {
		Some(self.tenant.clone())
	}

	fn base_azure_url(&self) -> Option<String> {
		Some(self.base_url.clone())
	}
}
