//! Tenant provider capability hooks.
//!
//! A tenant provider is bound to the inbound request at flow start and answers which
//! client credentials and directory knobs the flow should use. Only the credentials are
//! required; every other capability has a default implementation that reports "not
//! exposed", letting the resolver fall back to the documented defaults.

// self
use crate::{_prelude::*, flows::RequestContext};

/// Capability object that supplies credentials and tenant settings for a single flow.
///
/// Implementors are required to be `Send + Sync`. Override only the capabilities the
/// tenant actually exposes; each default returns `None` (or `false` for
/// [`is_adfs`](Self::is_adfs)), which the resolver treats as "fall back to the default".
pub trait TenantProvider: Send + Sync {
	/// Application (client) identifier. Must be `Some` for a flow to start.
	fn client_id(&self) -> Option<String>;

	/// Client secret. Must be `Some` for a flow to start.
	fn client_secret(&self) -> Option<String>;

	/// Directory tenant (`common`, `organizations`, a GUID, or a verified domain).
	fn tenant_id(&self) -> Option<String> {
		None
	}

	/// Login host overriding [`BASE_AZURE_URL`](crate::provider::BASE_AZURE_URL).
	fn base_azure_url(&self) -> Option<String> {
		None
	}

	/// Base set of extra authorize-request parameters.
	fn authorize_params(&self) -> Option<BTreeMap<String, String>> {
		None
	}

	/// Value sent as `domain_hint`; empty values are ignored.
	fn domain_hint(&self) -> Option<String> {
		None
	}

	/// Scope requested when the inbound request does not carry one.
	fn scope(&self) -> Option<String> {
		None
	}

	/// B2C custom policy inserted into the token endpoint path.
	fn custom_policy(&self) -> Option<String> {
		None
	}

	/// Selects the legacy (`oauth2`) endpoint family used by ADFS-style tenants.
	fn is_adfs(&self) -> bool {
		false
	}
}

/// Builds a [`TenantProvider`] bound to the current request.
///
/// Closures of the shape `Fn(&RequestContext) -> P` implement this trait, so most
/// applications never name it directly.
pub trait TenantProviderFactory: Send + Sync {
	/// Instantiates the provider for the supplied request.
	fn bind(&self, request: &RequestContext) -> Box<dyn TenantProvider>;
}
impl<F, P> TenantProviderFactory for F
where
	F: Send + Sync + Fn(&RequestContext) -> P,
	P: 'static + TenantProvider,
{
	fn bind(&self, request: &RequestContext) -> Box<dyn TenantProvider> {
		Box::new(self(request))
	}
}
