//! Resolution of the effective provider settings for one authentication flow.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::ConfigError,
	flows::RequestContext,
	provider::{BASE_AZURE_URL, TenantProvider},
};

/// Tenant used when the provider does not name one.
pub const DEFAULT_TENANT: &str = "common";
/// Scope requested when neither the request nor the provider supplies one.
pub const DEFAULT_SCOPE: &str = "openid profile email";

/// Immutable per-flow provider settings.
///
/// Built fresh by [`ProviderConfig::resolve`] at flow start and owned by the flow's
/// [`AuthorizationSession`](crate::flows::AuthorizationSession); nothing here is shared
/// across requests.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
	/// Application (client) identifier.
	pub client_id: String,
	/// Client secret used at the token endpoint.
	pub client_secret: Secret,
	/// Directory tenant segment.
	pub tenant_id: String,
	/// Login host, without a trailing slash.
	pub base_url: String,
	/// Optional custom policy inserted into the token endpoint path.
	pub custom_policy: Option<String>,
	/// Selects the legacy `oauth2` endpoint family instead of `oauth2/v2.0`.
	pub is_legacy_endpoint: bool,
	/// Space-delimited scope string sent with the authorize request.
	pub scope: String,
	/// Domain hint forwarded to the login page, when configured.
	pub domain_hint: Option<String>,
	/// Prompt behavior requested by the inbound request.
	pub prompt: Option<String>,
	/// Extra authorize-request parameters, including `domain_hint` and `prompt` when set.
	pub authorize_extra_params: BTreeMap<String, String>,
}
impl ProviderConfig {
	/// Resolves the effective settings from `source` and the inbound request.
	///
	/// Precedence rules:
	/// - `prompt` and `scope` query parameters on the request always win.
	/// - Provider-exposed `scope` beats [`DEFAULT_SCOPE`].
	/// - `domain_hint` is only forwarded when non-empty.
	///
	/// Missing client credentials abort the flow with a [`ConfigError`].
	pub fn resolve(
		source: &dyn TenantProvider,
		request: &RequestContext,
	) -> Result<Self, ConfigError> {
		let client_id = source.client_id().ok_or(ConfigError::MissingClientId)?;
		let client_secret = source.client_secret().ok_or(ConfigError::MissingClientSecret)?;
		let tenant_id = source.tenant_id().unwrap_or_else(|| DEFAULT_TENANT.into());
		let base_url = source.base_azure_url().unwrap_or_else(|| BASE_AZURE_URL.into());
		let mut authorize_extra_params = source.authorize_params().unwrap_or_default();
		let domain_hint = source.domain_hint().filter(|hint| !hint.is_empty());

		if let Some(hint) = &domain_hint {
			authorize_extra_params.insert("domain_hint".into(), hint.clone());
		}

		let prompt = request.query_param("prompt").map(ToOwned::to_owned);

		if let Some(prompt) = &prompt {
			authorize_extra_params.insert("prompt".into(), prompt.clone());
		}

		let scope = request
			.query_param("scope")
			.map(ToOwned::to_owned)
			.or_else(|| source.scope())
			.unwrap_or_else(|| DEFAULT_SCOPE.into());

		Ok(Self {
			client_id,
			client_secret: Secret::new(client_secret),
			tenant_id,
			base_url,
			custom_policy: source.custom_policy(),
			is_legacy_endpoint: source.is_adfs(),
			scope,
			domain_hint,
			prompt,
			authorize_extra_params,
		})
	}
}
impl Debug for ProviderConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("tenant_id", &self.tenant_id)
			.field("base_url", &self.base_url)
			.field("custom_policy", &self.custom_policy)
			.field("is_legacy_endpoint", &self.is_legacy_endpoint)
			.field("scope", &self.scope)
			.field("domain_hint", &self.domain_hint)
			.field("prompt", &self.prompt)
			.field("authorize_extra_params", &self.authorize_extra_params)
			.finish()
	}
}
