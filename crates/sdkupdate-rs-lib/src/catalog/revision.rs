//! Package revision numbers.
//!
//! # Format
//!
//! `MAJOR`.`MINOR`.`MICRO` followed by an optional preview marker, for example `22.0.1 rc3`.
//! `MINOR` and `MICRO` default to zero when omitted.
//!
//! # Ord
//!
//! Components compare numerically. When the numbers are equal a final release sorts above any
//! preview of it, and previews sort by their preview number.

use std::cmp::Ordering;
use std::sync::OnceLock;
use serde::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision {
	pub major: u32,
	pub minor: u32,
	pub micro: u32,
	/// Preview (release candidate) number, `None` for a final release.
	pub preview: Option<u32>,
}

impl Revision {
	/// Used by dependency declarations to mean "no requirement".
	pub const NOT_SPECIFIED: Revision = Revision { major: 0, minor: 0, micro: 0, preview: None };

	pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
		Self { major, minor, micro, preview: None }
	}

	pub const fn new_preview(major: u32, minor: u32, micro: u32, preview: u32) -> Self {
		Self { major, minor, micro, preview: Some(preview) }
	}

	pub fn is_preview(&self) -> bool {
		self.preview.is_some()
	}

	/// Shortest form that still parses back to the same revision, e.g. `22` or `22.0.1 rc3`.
	pub fn to_short_string(&self) -> String {
		let mut s = self.major.to_string();
		if self.minor != 0 || self.micro != 0 {
			s.push_str(&format!(".{}", self.minor));
		}
		if self.micro != 0 {
			s.push_str(&format!(".{}", self.micro));
		}
		if let Some(p) = self.preview {
			s.push_str(&format!(" rc{}", p));
		}
		s
	}

	/// Fractional ranking used when scoring candidates, see [`crate::relationship_resolver`].
	///
	/// A final release ranks as preview 999 so it stays above every preview of the same numbers.
	pub fn rank(&self) -> f64 {
		let p = self.preview.unwrap_or(999);
		self.major as f64
			+ self.minor as f64 / 1e3
			+ self.micro as f64 / 1e6
			+ p as f64 / 1e9
	}

	pub fn parse(s: &str) -> crate::Result<Self> {
		static PATTERN: OnceLock<Result<regex::Regex, regex::Error>> = OnceLock::new();
		let re = PATTERN
			.get_or_init(|| regex::Regex::new(r"^\s*(\d+)(?:\.(\d+))?(?:\.(\d+))?\s*(?:[-_ ]?rc(\d+))?\s*$"))
			.as_ref()
			.map_err(|e| crate::Error::Parse(e.to_string()))?;
		let caps = re.captures(s).ok_or_else(|| crate::Error::Parse(format!("invalid revision '{}'", s)))?;

		let number = |i: usize| -> crate::Result<Option<u32>> {
			caps.get(i)
				.map(|m| m.as_str().parse::<u32>().map_err(|e| crate::Error::Parse(format!("invalid revision '{}': {}", s, e))))
				.transpose()
		};

		Ok(Revision {
			major: number(1)?.unwrap_or(0),
			minor: number(2)?.unwrap_or(0),
			micro: number(3)?.unwrap_or(0),
			preview: number(4)?,
		})
	}
}

impl Default for Revision {
	fn default() -> Self {
		Self::NOT_SPECIFIED
	}
}

impl std::str::FromStr for Revision {
	type Err = crate::Error;
	fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl TryFrom<String> for Revision {
	type Error = crate::Error;
	fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<Revision> for String {
	fn from(value: Revision) -> Self { value.to_string() }
}

impl std::fmt::Display for Revision {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
		if let Some(p) = self.preview {
			write!(f, " rc{}", p)?;
		}
		Ok(())
	}
}

impl PartialOrd for Revision {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Revision {
	fn cmp(&self, other: &Self) -> Ordering {
		self.major.cmp(&other.major)
			.then(self.minor.cmp(&other.minor))
			.then(self.micro.cmp(&other.micro))
			.then(match (self.preview, other.preview) {
				(None, None) => Ordering::Equal,
				(None, Some(_)) => Ordering::Greater,
				(Some(_), None) => Ordering::Less,
				(Some(a), Some(b)) => a.cmp(&b),
			})
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn parse_major_only() { assert_eq!(Revision::parse("22").unwrap(), Revision::new(22, 0, 0)); }
	#[test]
	fn parse_full() { assert_eq!(Revision::parse("22.0.1").unwrap(), Revision::new(22, 0, 1)); }
	#[test]
	fn parse_preview() { assert_eq!(Revision::parse("22.0.1 rc3").unwrap(), Revision::new_preview(22, 0, 1, 3)); }
	#[test]
	fn parse_dashed_preview() { assert_eq!(Revision::parse("23-rc1").unwrap(), Revision::new_preview(23, 0, 0, 1)); }
	#[test]
	fn parse_rejects_garbage() { assert!(Revision::parse("twenty").is_err()); }
	#[test]
	fn parse_reuses_pattern_across_calls() {
		assert!(Revision::parse("twenty").is_err());
		for major in 1..50 {
			assert_eq!(Revision::parse(&format!("{}.1", major)).unwrap(), Revision::new(major, 1, 0));
		}
	}

	#[test]
	fn final_release_beats_preview() { assert!(Revision::new(22, 0, 0) > Revision::new_preview(22, 0, 0, 9)); }
	#[test]
	fn previews_are_ordered() { assert!(Revision::new_preview(22, 0, 0, 2) > Revision::new_preview(22, 0, 0, 1)); }
	#[test]
	fn components_are_compared_numerically() { assert!(Revision::new(10, 0, 0) > Revision::new(9, 9, 9)); }

	#[test]
	fn short_string_drops_zeroes() { assert_eq!(Revision::new(22, 0, 0).to_short_string(), "22"); }
	#[test]
	fn short_string_keeps_micro() { assert_eq!(Revision::new_preview(22, 0, 1, 3).to_short_string(), "22.0.1 rc3"); }

	#[test]
	fn rank_orders_like_revisions() {
		assert!(Revision::new(22, 0, 0).rank() > Revision::new_preview(22, 0, 0, 3).rank());
		assert!(Revision::new(22, 1, 0).rank() > Revision::new(22, 0, 9).rank());
	}

	#[test]
	fn serde_uses_string_form() {
		let json = serde_json::to_string(&Revision::new_preview(21, 1, 0, 2)).unwrap();
		assert_eq!(json, "\"21.1.0 rc2\"");
		assert_eq!(serde_json::from_str::<Revision>(&json).unwrap(), Revision::new_preview(21, 1, 0, 2));
	}
}
