//! Starts an Azure AD sign-in for a request and shows what the callback handler keeps.

// std
use std::collections::HashMap;
// crates.io
use color_eyre::Result;
// self
use oauth2_azure_ad::{
	config::StrategyOptions,
	flows::{RequestContext, Strategy},
	url::Url,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let options = StrategyOptions::new("demo-client", "demo-secret")
		.with_tenant_id("contoso.onmicrosoft.com")
		.with_domain_hint("contoso.com")
		.with_authorized_emails(["alice@contoso.com"]);
	let strategy = Strategy::new(options)?;
	let request = RequestContext::from_url(&Url::parse(
		"https://app.example.com/auth/azure_activedirectory_v2?prompt=select_account",
	)?);
	let session = strategy.request_phase(&request)?;

	println!("Send your user to {}.", &session.authorize_url);
	println!("Token endpoint for this flow: {}.", &session.endpoints.token_url);

	let mut sessions: HashMap<String, _> = HashMap::new();

	sessions.insert(session.state.clone(), session.clone());

	// Simulate the redirect handler looking up the stored session by `state`.
	let returned_state = session.state.clone();

	if let Some(stashed) = sessions.remove(&returned_state) {
		stashed.validate_state(Some(returned_state.as_str()))?;
		println!("Validated state; pass the session to Strategy::callback_phase with the redirect.");
	} else {
		eprintln!("State `{returned_state}` was not recognized.");
	}

	Ok(())
}
