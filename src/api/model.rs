//! Certificate payloads exchanged with the service.

// self
use crate::{_prelude::*, auth::CertificateId};

/// Lifecycle status of a certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
	/// Usable for charges.
	Active,
	/// Balance spent.
	Used,
	/// Validity period elapsed.
	Expired,
	/// Withdrawn by staff.
	Cancelled,
}
impl CertificateStatus {
	/// Returns the wire value.
	pub const fn as_str(self) -> &'static str {
		match self {
			CertificateStatus::Active => "ACTIVE",
			CertificateStatus::Used => "USED",
			CertificateStatus::Expired => "EXPIRED",
			CertificateStatus::Cancelled => "CANCELLED",
		}
	}
}
impl Display for CertificateStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Full certificate record as returned to staff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
	/// Service-assigned identifier.
	pub id: CertificateId,
	/// Human-readable unique code.
	pub code: String,
	/// Remaining balance.
	pub amount: f64,
	/// Free-form description.
	pub description: String,
	/// Staff member who issued the certificate.
	pub employee: String,
	/// Amount of the purchase receipt, if recorded.
	#[serde(default)]
	pub check_amount: Option<f64>,
	/// Current status.
	pub status: CertificateStatus,
	/// Issue date.
	#[serde(default)]
	pub created_at: Option<Date>,
	/// Date the balance reached zero.
	#[serde(default)]
	pub used_at: Option<Date>,
	/// `true` when the certificate never expires.
	pub indefinite: bool,
	/// Validity period in days, counted from [`Certificate::created_at`].
	#[serde(default)]
	pub period: Option<u32>,
	/// Holder's first name.
	#[serde(default)]
	pub name: Option<String>,
	/// Holder's last name.
	#[serde(default)]
	pub last_name: Option<String>,
	/// Holder's phone number; charge confirmations are sent here.
	pub phone: String,
}
impl Certificate {
	/// First day on which the certificate is expired, if it expires at all.
	pub fn expires_on(&self) -> Option<Date> {
		if self.indefinite { None } else { expiry_date(self.created_at, self.period) }
	}

	/// Returns `true` when the certificate is expired on `today`.
	pub fn is_expired_at(&self, today: Date) -> bool {
		self.expires_on().is_some_and(|deadline| today >= deadline)
	}

	/// Returns `true` when the service would accept a charge against this certificate.
	pub fn is_chargeable(&self) -> bool {
		self.status == CertificateStatus::Active && self.amount > 0.
	}
}

/// Public projection of a certificate; holder details may be masked by the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CertificateView {
	/// Remaining balance.
	pub amount: f64,
	/// Human-readable unique code.
	pub code: String,
	/// Free-form description.
	pub description: String,
	/// Current status.
	pub status: CertificateStatus,
	/// Issue date.
	#[serde(default)]
	pub created_at: Option<Date>,
	/// Date the balance reached zero.
	#[serde(default)]
	pub used_at: Option<Date>,
	/// Validity period in days; absent for certificates that never expire.
	#[serde(default)]
	pub period: Option<u32>,
	/// Holder's first name.
	#[serde(default)]
	pub name: Option<String>,
	/// Holder's last name.
	#[serde(default)]
	pub last_name: Option<String>,
	/// Holder's phone number.
	pub phone: String,
}
impl CertificateView {
	/// First day on which the certificate is expired, if it expires at all.
	pub fn expires_on(&self) -> Option<Date> {
		expiry_date(self.created_at, self.period)
	}

	/// Returns `true` when the certificate is expired on `today`.
	pub fn is_expired_at(&self, today: Date) -> bool {
		self.expires_on().is_some_and(|deadline| today >= deadline)
	}
}

/// Payload for issuing a certificate.
///
/// Optional fields are sent as `null` rather than omitted; the service requires every key.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewCertificate {
	/// Initial balance.
	pub amount: f64,
	/// Free-form description.
	pub description: String,
	/// Issuing staff member.
	pub employee: String,
	/// Purchase receipt amount.
	pub check_amount: Option<f64>,
	/// Initial status.
	pub status: CertificateStatus,
	/// Issue date.
	pub created_at: Option<Date>,
	/// `true` when the certificate never expires.
	pub indefinite: bool,
	/// Validity period in days.
	pub period: Option<u32>,
	/// Holder's first name.
	pub name: Option<String>,
	/// Holder's last name.
	pub last_name: Option<String>,
	/// Holder's phone number.
	pub phone: String,
}
impl NewCertificate {
	/// Creates an active, non-expiring certificate payload.
	pub fn new(
		amount: f64,
		description: impl Into<String>,
		employee: impl Into<String>,
		phone: impl Into<String>,
	) -> Self {
		Self {
			amount,
			description: description.into(),
			employee: employee.into(),
			check_amount: Some(0.),
			status: CertificateStatus::Active,
			created_at: None,
			indefinite: true,
			period: None,
			name: None,
			last_name: None,
			phone: phone.into(),
		}
	}

	/// Limits validity to `days` from `issued_on`.
	pub fn valid_for(mut self, issued_on: Date, days: u32) -> Self {
		self.created_at = Some(issued_on);
		self.indefinite = false;
		self.period = Some(days);

		self
	}

	/// Sets the holder's name.
	pub fn holder(mut self, name: impl Into<String>, last_name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self.last_name = Some(last_name.into());

		self
	}

	pub(crate) fn validate(&self) -> Result<()> {
		if !self.amount.is_finite() || self.amount <= 0. {
			return Err(Error::InvalidInput { reason: "amount must be a positive number".into() });
		}
		if self.phone.trim().is_empty() {
			return Err(Error::InvalidInput { reason: "phone is required".into() });
		}
		if !self.indefinite && (self.created_at.is_none() || self.period.is_none()) {
			return Err(Error::InvalidInput {
				reason: "an expiring certificate needs an issue date and a period".into(),
			});
		}

		Ok(())
	}
}

/// Partial update; only the fields that are set are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CertificateUpdate {
	/// New balance.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub amount: Option<f64>,
	/// New description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// New issuing staff member.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub employee: Option<String>,
	/// New receipt amount.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub check_amount: Option<f64>,
	/// New status.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<CertificateStatus>,
	/// New usage date.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub used_at: Option<Date>,
	/// New expiry mode.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub indefinite: Option<bool>,
	/// New validity period.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub period: Option<u32>,
	/// New first name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// New last name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// New phone number.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
}

/// Telegram delivery of a certificate image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramMessage {
	/// Recipient chat.
	pub chat_id: i64,
	/// Image sent with the message.
	pub image_url: Url,
}

fn expiry_date(created_at: Option<Date>, period: Option<u32>) -> Option<Date> {
	created_at?.checked_add(Duration::days(period?.into()))
}
