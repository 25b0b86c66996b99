//! Per-flow provider resolution for the Azure AD directory service.
//!
//! `tenant` defines [`TenantProvider`], the optional capability object an embedding
//! application supplies to pick credentials and tenant knobs per request. `config`
//! resolves a [`TenantProvider`] (or the static strategy options) into an immutable
//! [`ProviderConfig`], and `endpoints` turns that config into the authorize/token URL pair
//! handed to the OAuth 2.0 exchange.

pub mod config;
pub mod endpoints;
pub mod tenant;

pub use config::*;
pub use endpoints::*;
pub use tenant::*;
