//! Construction-time strategy options.
//!
//! [`StrategyOptions`] deserializes from whatever format the host keeps its settings in
//! (every field is optional and defaulted) and doubles as the static [`TenantProvider`]
//! when no per-request provider is configured.

// self
use crate::{_prelude::*, auth::AuthorizationPolicy, provider::TenantProvider};

/// Strategy name used in callback paths and the auth hash.
pub const DEFAULT_NAME: &str = "azure_activedirectory_v2";
/// Path prefix under which request/callback routes live.
pub const DEFAULT_PATH_PREFIX: &str = "/auth";

/// Static configuration for a [`Strategy`](crate::flows::Strategy).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyOptions {
	/// Strategy name.
	pub name: String,
	/// Application (client) identifier.
	pub client_id: Option<String>,
	/// Client secret.
	pub client_secret: Option<String>,
	/// Directory tenant; `common` when unset.
	pub tenant_id: Option<String>,
	/// Login host override.
	pub base_azure_url: Option<String>,
	/// Custom policy inserted into the token endpoint path.
	pub custom_policy: Option<String>,
	/// Scope requested when the inbound request does not carry one.
	pub scope: Option<String>,
	/// Domain hint forwarded to the login page.
	pub domain_hint: Option<String>,
	/// Extra authorize-request parameters.
	pub authorize_params: BTreeMap<String, String>,
	/// Exact email addresses allowed to sign in.
	pub authorized_emails: Vec<String>,
	/// Opt-in email domains allowed to sign in.
	pub authorized_domains: Vec<String>,
	/// Route prefix; defaults to `/auth`.
	pub path_prefix: String,
	/// Callback path; defaults to `{path_prefix}/{name}/callback`.
	pub callback_path: Option<String>,
	/// Skips the `state` comparison on callback.
	pub provider_ignores_state: bool,
	/// Sends an S256 PKCE challenge with the authorize request.
	pub pkce: bool,
}
impl StrategyOptions {
	/// Creates options with the supplied client credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: Some(client_id.into()),
			client_secret: Some(client_secret.into()),
			..Default::default()
		}
	}

	/// Overrides the strategy name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();

		self
	}

	/// Sets the directory tenant.
	pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
		self.tenant_id = Some(tenant_id.into());

		self
	}

	/// Overrides the login host.
	pub fn with_base_azure_url(mut self, url: impl Into<String>) -> Self {
		self.base_azure_url = Some(url.into());

		self
	}

	/// Sets the custom policy.
	pub fn with_custom_policy(mut self, policy: impl Into<String>) -> Self {
		self.custom_policy = Some(policy.into());

		self
	}

	/// Sets the fallback scope.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the domain hint.
	pub fn with_domain_hint(mut self, hint: impl Into<String>) -> Self {
		self.domain_hint = Some(hint.into());

		self
	}

	/// Adds an extra authorize-request parameter.
	pub fn with_authorize_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.authorize_params.insert(key.into(), value.into());

		self
	}

	/// Replaces the email allow-list.
	pub fn with_authorized_emails<I, S>(mut self, emails: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.authorized_emails = emails.into_iter().map(Into::into).collect();

		self
	}

	/// Replaces the domain allow-list.
	pub fn with_authorized_domains<I, S>(mut self, domains: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.authorized_domains = domains.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the callback path.
	pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
		self.callback_path = Some(path.into());

		self
	}

	/// Toggles the callback `state` comparison off when `true`.
	pub fn with_provider_ignores_state(mut self, ignores: bool) -> Self {
		self.provider_ignores_state = ignores;

		self
	}

	/// Toggles PKCE.
	pub fn with_pkce(mut self, pkce: bool) -> Self {
		self.pkce = pkce;

		self
	}

	/// Path that starts the flow (`{path_prefix}/{name}`).
	pub fn request_path(&self) -> String {
		format!("{}/{}", self.path_prefix, self.name)
	}

	/// Path the provider redirects back to.
	pub fn callback_path(&self) -> String {
		self.callback_path.clone().unwrap_or_else(|| format!("{}/callback", self.request_path()))
	}

	/// Builds the allow-list policy described by these options.
	pub fn authorization_policy(&self) -> AuthorizationPolicy {
		AuthorizationPolicy::new(self.authorized_emails.iter().cloned())
			.with_authorized_domains(self.authorized_domains.iter().cloned())
	}
}
impl Default for StrategyOptions {
	fn default() -> Self {
		Self {
			name: DEFAULT_NAME.into(),
			client_id: None,
			client_secret: None,
			tenant_id: None,
			base_azure_url: None,
			custom_policy: None,
			scope: None,
			domain_hint: None,
			authorize_params: BTreeMap::new(),
			authorized_emails: Vec::new(),
			authorized_domains: Vec::new(),
			path_prefix: DEFAULT_PATH_PREFIX.into(),
			callback_path: None,
			provider_ignores_state: false,
			pkce: true,
		}
	}
}
impl Debug for StrategyOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyOptions")
			.field("name", &self.name)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("tenant_id", &self.tenant_id)
			.field("base_azure_url", &self.base_azure_url)
			.field("custom_policy", &self.custom_policy)
			.field("scope", &self.scope)
			.field("domain_hint", &self.domain_hint)
			.field("authorize_params", &self.authorize_params)
			.field("authorized_emails", &self.authorized_emails)
			.field("authorized_domains", &self.authorized_domains)
			.field("callback_path", &self.callback_path())
			.field("provider_ignores_state", &self.provider_ignores_state)
			.field("pkce", &self.pkce)
			.finish()
	}
}
impl TenantProvider for StrategyOptions {
	fn client_id(&self) -> Option<String> {
		self.client_id.clone()
	}

	fn client_secret(&self) -> Option<String> {
		self.client_secret.clone()
	}

	fn tenant_id(&self) -> Option<String> {
		self.tenant_id.clone()
	}

	fn base_azure_url(&self) -> Option<String> {
		self.base_azure_url.clone()
	}

	fn authorize_params(&self) -> Option<BTreeMap<String, String>> {
		Some(self.authorize_params.clone())
	}

	fn domain_hint(&self) -> Option<String> {
		self.domain_hint.clone()
	}

	fn scope(&self) -> Option<String> {
		self.scope.clone()
	}

	fn custom_policy(&self) -> Option<String> {
		self.custom_policy.clone()
	}
}
