//! Strongly typed certificate identifiers.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 64;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Certificate identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Certificate identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier is a `.` or `..` path segment.
	#[error("Certificate identifier cannot be a dot segment.")]
	DotSegment,
	/// The identifier contains a character that would change the request path.
	#[error("Certificate identifier contains the reserved character `{character}`.")]
	ReservedCharacter {
		/// Offending character.
		character: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("Certificate identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Identifier of a certificate (a ULID string on the service side).
///
/// Identifiers are interpolated into request paths, so path delimiters (including `\`, which
/// URL parsing treats as `/` for HTTP) and dot segments are rejected up front.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CertificateId(String);
impl CertificateId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for CertificateId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for CertificateId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<CertificateId> for String {
	fn from(value: CertificateId) -> Self {
		value.0
	}
}
impl TryFrom<String> for CertificateId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for CertificateId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for CertificateId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Certificate({})", self.0)
	}
}
impl Display for CertificateId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for CertificateId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if let Some(character) = view.chars().find(|c| matches!(c, '/' | '\\' | '?' | '#' | '%')) {
		return Err(IdentifierError::ReservedCharacter { character });
	}
	if matches!(view, "." | "..") {
		return Err(IdentifierError::DotSegment);
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
