//! Token artifacts, claim extraction, identity projections, and the authorization policy.

pub mod claims;
pub mod identity;
pub mod policy;
pub mod secret;
pub mod token;

pub use claims::*;
pub use identity::*;
pub use policy::*;
pub use secret::*;
pub use token::*;
