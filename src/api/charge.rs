//! SMS-confirmed charge of a certificate.
//!
//! A charge runs in two steps: the holder is sent a confirmation code for a given sum, then
//! the code is submitted. [`ChargeSession`] enforces that order, clamps the sum to the
//! balance, and rate-limits code resends. Time is passed in explicitly.

// self
use crate::{
	_prelude::*,
	api::{Certificate, CertificateStatus, CertificatesApi},
	http::ApiTransport,
};

/// Progress of a [`ChargeSession`].
#[derive(Clone, Debug, PartialEq)]
pub enum ChargeStep {
	/// No code requested yet.
	Idle,
	/// A code was sent for `charge_sum`.
	CodeSent {
		/// Sum the code confirms; fixed until the charge completes.
		charge_sum: f64,
		/// Earliest moment another code may be requested.
		resend_available_at: OffsetDateTime,
	},
	/// The charge went through; carries the updated certificate.
	Charged(Certificate),
}

/// Drives one charge of one certificate.
#[derive(Clone, Debug)]
pub struct ChargeSession {
	certificate: Certificate,
	step: ChargeStep,
	cooldown: Duration,
}
impl ChargeSession {
	/// Wait between two confirmation codes.
	pub const DEFAULT_COOLDOWN: Duration = Duration::seconds(60);

	/// Starts a session; only active certificates with a positive balance qualify.
	pub fn new(certificate: Certificate) -> Result<Self> {
		if certificate.status != CertificateStatus::Active {
			return Err(Error::InvalidInput {
				reason: format!("only ACTIVE certificates can be charged, found {}", certificate.status),
			});
		}
		if !certificate.is_chargeable() {
			return Err(Error::InvalidInput { reason: "certificate balance is empty".into() });
		}

		Ok(Self { certificate, step: ChargeStep::Idle, cooldown: Self::DEFAULT_COOLDOWN })
	}

	/// Overrides the resend cooldown.
	pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
		self.cooldown = cooldown;

		self
	}

	/// Certificate as last seen by the session.
	pub fn certificate(&self) -> &Certificate {
		&self.certificate
	}

	/// Current step.
	pub fn step(&self) -> &ChargeStep {
		&self.step
	}

	/// Validates `requested` and clamps it to the balance.
	pub fn clamp_sum(&self, requested: f64) -> Result<f64> {
		if !requested.is_finite() || requested <= 0. {
			return Err(Error::InvalidInput {
				reason: format!("charge sum must be between 0 and {}", self.certificate.amount),
			});
		}

		Ok(requested.min(self.certificate.amount))
	}

	/// Time left before another code can be requested, if any.
	pub fn resend_in(&self, now: OffsetDateTime) -> Option<Duration> {
		match &self.step {
			ChargeStep::CodeSent { resend_available_at, .. } if *resend_available_at > now =>
				Some(*resend_available_at - now),
			_ => None,
		}
	}

	/// Sends the first confirmation code; returns the (clamped) sum it confirms.
	pub async fn request_code<T>(
		&mut self,
		api: &CertificatesApi<'_, T>,
		requested: f64,
		now: OffsetDateTime,
	) -> Result<f64>
	where
		T: ?Sized + ApiTransport,
	{
		if self.step != ChargeStep::Idle {
			return Err(Error::InvalidInput { reason: "a confirmation code was already sent".into() });
		}

		let charge_sum = self.clamp_sum(requested)?;

		api.send_confirm_code(&self.certificate.id, charge_sum).await?;

		self.step = ChargeStep::CodeSent { charge_sum, resend_available_at: now + self.cooldown };

		Ok(charge_sum)
	}

	/// Sends another code for the same sum once the cooldown elapsed.
	pub async fn resend_code<T>(
		&mut self,
		api: &CertificatesApi<'_, T>,
		now: OffsetDateTime,
	) -> Result<()>
	where
		T: ?Sized + ApiTransport,
	{
		let ChargeStep::CodeSent { charge_sum, .. } = self.step else {
			return Err(Error::InvalidInput { reason: "no confirmation code to resend".into() });
		};

		if let Some(wait) = self.resend_in(now) {
			return Err(Error::InvalidInput {
				reason: format!("a new code can be requested in {} s", wait.whole_seconds().max(1)),
			});
		}

		api.send_confirm_code(&self.certificate.id, charge_sum).await?;

		self.step = ChargeStep::CodeSent { charge_sum, resend_available_at: now + self.cooldown };

		Ok(())
	}

	/// Submits the confirmation code; a rejected code leaves the session waiting for another.
	pub async fn confirm<T>(&mut self, api: &CertificatesApi<'_, T>, code: &str) -> Result<&Certificate>
	where
		T: ?Sized + ApiTransport,
	{
		if !matches!(self.step, ChargeStep::CodeSent { .. }) {
			return Err(Error::InvalidInput { reason: "request a confirmation code first".into() });
		}

		let charged = api.charge(&self.certificate.id, code).await?;

		self.certificate = charged.clone();
		self.step = ChargeStep::Charged(charged);

		Ok(&self.certificate)
	}
}
