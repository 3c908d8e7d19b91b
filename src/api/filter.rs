//! Query filters for the certificate list.

// self
use crate::{_prelude::*, api::CertificateStatus, auth::CertificateId};

/// Bounds on a date column; each bound maps to its own query parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
	/// Exact match.
	pub on: Option<Date>,
	/// Strictly after.
	pub after: Option<Date>,
	/// On or after.
	pub from: Option<Date>,
	/// Strictly before.
	pub before: Option<Date>,
	/// On or before.
	pub until: Option<Date>,
}
impl DateRange {
	/// Inclusive range between two dates.
	pub fn between(from: Date, until: Date) -> Self {
		Self { from: Some(from), until: Some(until), ..Default::default() }
	}

	fn push_pairs(&self, column: &str, pairs: &mut Vec<(String, String)>) {
		let bounds = [
			("", self.on),
			("__gt", self.after),
			("__gte", self.from),
			("__lt", self.before),
			("__lte", self.until),
		];

		for (suffix, value) in bounds {
			if let Some(date) = value {
				pairs.push((format!("{column}{suffix}"), date.to_string()));
			}
		}
	}
}

/// Filters accepted by `GET certificates/`.
///
/// Unset fields are not sent; list values are joined with commas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CertificateFilter {
	/// Only these identifiers.
	pub ids: Vec<CertificateId>,
	/// Case-insensitive code pattern.
	pub code: Option<String>,
	/// Only these statuses.
	pub statuses: Vec<CertificateStatus>,
	/// Issue date bounds.
	pub created_at: DateRange,
	/// Usage date bounds.
	pub used_at: DateRange,
	/// Minimum validity period in days.
	pub period_min: Option<u32>,
	/// Maximum validity period in days.
	pub period_max: Option<u32>,
	/// Minimum balance.
	pub amount_min: Option<i64>,
	/// Maximum balance.
	pub amount_max: Option<i64>,
	/// Case-insensitive phone pattern.
	pub phone: Option<String>,
	/// Case-insensitive last-name pattern.
	pub last_name: Option<String>,
}
impl CertificateFilter {
	/// Restricts the list to the given statuses.
	pub fn status(mut self, statuses: impl IntoIterator<Item = CertificateStatus>) -> Self {
		self.statuses.extend(statuses);

		self
	}

	/// Matches codes containing `pattern`.
	pub fn code(mut self, pattern: impl Into<String>) -> Self {
		self.code = Some(pattern.into());

		self
	}

	/// Matches phone numbers containing `pattern`.
	pub fn phone(mut self, pattern: impl Into<String>) -> Self {
		self.phone = Some(pattern.into());

		self
	}

	/// Restricts issue dates.
	pub fn created(mut self, range: DateRange) -> Self {
		self.created_at = range;

		self
	}

	/// Renders the filter as query parameters in a stable order.
	pub fn to_query(&self) -> Vec<(String, String)> {
		let mut pairs: Vec<(String, String)> = Vec::new();

		if !self.ids.is_empty() {
			pairs.push(("id__in".into(), join(self.ids.iter().map(|id| id.as_ref()))));
		}
		if let Some(code) = &self.code {
			pairs.push(("code__ilike".into(), code.clone()));
		}
		if !self.statuses.is_empty() {
			pairs.push((
				"status__in".into(),
				join(self.statuses.iter().map(|status| status.as_str())),
			));
		}

		self.created_at.push_pairs("created_at", &mut pairs);
		self.used_at.push_pairs("used_at", &mut pairs);

		let bounds = [
			("period__gte", self.period_min.map(i64::from)),
			("period__lte", self.period_max.map(i64::from)),
			("amount__gte", self.amount_min),
			("amount__lte", self.amount_max),
		];

		for (name, value) in bounds {
			if let Some(value) = value {
				pairs.push((name.into(), value.to_string()));
			}
		}
		if let Some(phone) = &self.phone {
			pairs.push(("phone__ilike".into(), phone.clone()));
		}
		if let Some(last_name) = &self.last_name {
			pairs.push(("last_name__ilike".into(), last_name.clone()));
		}

		pairs
	}
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
	values.collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::date;
	// self
	use super::*;

	#[test]
	fn empty_filter_sends_nothing() {
		assert!(CertificateFilter::default().to_query().is_empty());
	}

	#[test]
	fn filter_renders_service_parameters() {
		let filter = CertificateFilter {
			ids: vec![
				CertificateId::new("01HZXA").expect("Fixture id should be valid."),
				CertificateId::new("01HZXB").expect("Fixture id should be valid."),
			],
			amount_min: Some(100),
			last_name: Some("petr".into()),
			..Default::default()
		}
		.status([CertificateStatus::Active, CertificateStatus::Expired])
		.code("GIFT")
		.created(DateRange::between(date!(2025 - 01 - 01), date!(2025 - 01 - 31)));

		let expected = [
			("id__in", "01HZXA,01HZXB"),
			("code__ilike", "GIFT"),
			("status__in", "ACTIVE,EXPIRED"),
			("created_at__gte", "2025-01-01"),
			("created_at__lte", "2025-01-31"),
			("amount__gte", "100"),
			("last_name__ilike", "petr"),
		]
		.map(|(name, value)| (name.to_owned(), value.to_owned()));

		assert_eq!(filter.to_query(), expected.to_vec());
	}
}
