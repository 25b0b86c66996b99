#![allow(dead_code)]

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::MockServer;
use serde_json::Value;
// self
use oauth2_azure_ad::{
	config::StrategyOptions,
	flows::{AuthorizationSession, ReqwestStrategy, RequestContext, Strategy},
};

pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const TENANT: &str = "contoso";
pub const APP_HOST: &str = "https://app.example.com";
pub const TOKEN_PATH: &str = "/contoso/oauth2/v2.0/token";

/// Encodes `claims` as an unsigned compact JWS.
pub fn unsigned_jwt(claims: Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

	format!("{header}.{payload}.")
}

pub fn options(server: &MockServer) -> StrategyOptions {
	StrategyOptions::new(CLIENT_ID, CLIENT_SECRET)
		.with_tenant_id(TENANT)
		.with_base_azure_url(server.base_url())
		.with_authorized_emails(["alice@x.com"])
}

pub fn strategy(server: &MockServer) -> ReqwestStrategy {
	Strategy::new(options(server)).expect("Default transport should build.")
}

pub fn request_path() -> RequestContext {
	RequestContext::new(APP_HOST, "/auth/azure_activedirectory_v2")
}

pub fn callback(session: &AuthorizationSession, code: &str) -> RequestContext {
	RequestContext::new(APP_HOST, "/auth/azure_activedirectory_v2/callback")
		.with_query("code", code)
		.with_query("state", session.state.clone())
}
