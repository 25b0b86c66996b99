//! Authorize/token endpoint construction.

// self
use crate::{_prelude::*, error::ConfigError, provider::ProviderConfig};

/// Well-known login host for the public cloud.
pub const BASE_AZURE_URL: &str = "https://login.microsoftonline.com";

const LEGACY_API_SEGMENT: &str = "oauth2";
const CURRENT_API_SEGMENT: &str = "oauth2/v2.0";

/// Authorize/token URL pair handed to the OAuth 2.0 exchange.
///
/// The strings are plain concatenations that mirror the provider's documented URL
/// shape; they are only parsed once the exchange needs a [`Url`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureEndpoints {
	/// `{base}/{tenant}/{api}/authorize`.
	pub authorize_url: String,
	/// `{base}/{tenant}[/{policy}]/{api}/token`.
	pub token_url: String,
}
impl AzureEndpoints {
	/// Builds the endpoint pair for a resolved config.
	pub fn build(config: &ProviderConfig) -> Self {
		let api = api_segment(config.is_legacy_endpoint);
		let base = &config.base_url;
		let tenant = &config.tenant_id;
		let authorize_url = format!("{base}/{tenant}/{api}/authorize");
		let token_url = match config.custom_policy.as_deref() {
			Some(policy) => format!("{base}/{tenant}/{policy}/{api}/token"),
			None => format!("{base}/{tenant}/{api}/token"),
		};

		Self { authorize_url, token_url }
	}

	/// Parses the authorize endpoint.
	pub fn authorize(&self) -> Result<Url, ConfigError> {
		parse_endpoint("authorize", &self.authorize_url)
	}

	/// Parses the token endpoint.
	pub fn token(&self) -> Result<Url, ConfigError> {
		parse_endpoint("token", &self.token_url)
	}
}

/// API path segment for the endpoint family.
pub const fn api_segment(legacy: bool) -> &'static str {
	if legacy { LEGACY_API_SEGMENT } else { CURRENT_API_SEGMENT }
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint {
		endpoint,
		url: raw.to_owned(),
		source,
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::Secret;

	fn config(tenant: &str) -> ProviderConfig {
		ProviderConfig {
			client_id: "client".into(),
			client_secret: Secret::new("secret"),
			tenant_id: tenant.into(),
			base_url: BASE_AZURE_URL.into(),
			custom_policy: None,
			is_legacy_endpoint: false,
			scope: "openid".into(),
			domain_hint: None,
			prompt: None,
			authorize_extra_params: BTreeMap::new(),
		}
	}

	#[test]
	fn current_endpoints_use_v2_segment() {
		for tenant in ["common", "organizations", "contoso.onmicrosoft.com"] {
			let endpoints = AzureEndpoints::build(&config(tenant));

			assert_eq!(
				endpoints.authorize_url,
				format!("{BASE_AZURE_URL}/{tenant}/oauth2/v2.0/authorize")
			);
			assert_eq!(endpoints.token_url, format!("{BASE_AZURE_URL}/{tenant}/oauth2/v2.0/token"));
		}
	}

	#[test]
	fn legacy_endpoints_drop_version_segment() {
		let mut config = config("adfs");

		config.is_legacy_endpoint = true;
		config.custom_policy = Some("B2C_1_signin".into());

		let endpoints = AzureEndpoints::build(&config);

		assert_eq!(endpoints.authorize_url, format!("{BASE_AZURE_URL}/adfs/oauth2/authorize"));
		assert_eq!(endpoints.token_url, format!("{BASE_AZURE_URL}/adfs/B2C_1_signin/oauth2/token"));
	}

	#[test]
	fn custom_policy_only_touches_token_url() {
		let mut config = config("contoso");

		config.base_url = "https://contoso.b2clogin.com".into();
		config.custom_policy = Some("B2C_1A_signup_signin".into());

		let endpoints = AzureEndpoints::build(&config);

		assert_eq!(endpoints.authorize_url, "https://contoso.b2clogin.com/contoso/oauth2/v2.0/authorize");
		assert_eq!(
			endpoints.token_url,
			"https://contoso.b2clogin.com/contoso/B2C_1A_signup_signin/oauth2/v2.0/token"
		);
		assert!(!endpoints.authorize_url.contains("B2C_1A_signup_signin"));
	}

	#[test]
	fn parse_reports_the_failing_endpoint() {
		let endpoints = AzureEndpoints {
			authorize_url: "not a url".into(),
			token_url: "https://example.com/token".into(),
		};
		let err = endpoints.authorize().expect_err("Relative endpoints must fail to parse.");

		assert!(matches!(err, ConfigError::InvalidEndpoint { endpoint: "authorize", .. }));
		assert!(endpoints.token().is_ok());
	}
}
