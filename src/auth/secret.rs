//! Client secrets and raw tokens that must never reach logs.

// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Owned secret string whose formatters print `<redacted>`.
///
/// Not serializable; copy the value out with
/// [`Secret::expose`] where a host needs it on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Box<str>);
impl Secret {
	/// Wraps a secret value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into().into_boxed_str())
	}

	/// Borrows the raw value.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Secret({REDACTED:?})")
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_never_print_the_value() {
		let secret = Secret::from(String::from("client-secret-value"));

		assert_eq!(format!("{secret:?}"), "Secret(\"<redacted>\")");
		assert_eq!(secret.to_string(), "<redacted>");
		assert_eq!(format!("{:?}", Some(&secret)), "Some(Secret(\"<redacted>\"))");
		assert_eq!(secret.expose(), "client-secret-value");
	}
}
