//! The applicant identity payload.
//!
//! An [`ApplicantIdentity`] only ever exists in the orchestrator's working
//! memory for the duration of one run. None of the types here print their
//! contents through `Debug`, and all of them are zeroized when dropped.

use crate::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A calendar date of birth, serialized as `YYYY-MM-DD`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[serde(try_from = "String", into = "String")]
pub struct DateOfBirth {
    year: u16,
    month: u8,
    day: u8,
}

impl DateOfBirth {
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self, TypeError> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return Err(TypeError::DateOutOfRange);
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

impl std::str::FromStr for DateOfBirth {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '-');
        let (Some(y), Some(m), Some(d)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TypeError::DateFormat);
        };
        let digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !digits(y, 4) || !digits(m, 2) || !digits(d, 2) {
            return Err(TypeError::DateFormat);
        }
        let year = y.parse().map_err(|_| TypeError::DateFormat)?;
        let month = m.parse().map_err(|_| TypeError::DateFormat)?;
        let day = d.parse().map_err(|_| TypeError::DateFormat)?;
        Self::new(year, month, day)
    }
}

impl TryFrom<String> for DateOfBirth {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateOfBirth> for String {
    fn from(dob: DateOfBirth) -> Self {
        dob.to_string()
    }
}

impl fmt::Display for DateOfBirth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Debug for DateOfBirth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DateOfBirth([REDACTED])")
    }
}

/// Residential address as submitted by the applicant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct Address {
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Address([REDACTED])")
    }
}

/// Metadata of a state-issued identity document.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct StateIdDetails {
    pub number: String,
    /// Two-letter code of the issuing state.
    pub jurisdiction: String,
    /// e.g. `drivers_license`, `state_id_card`.
    pub id_type: String,
}

impl fmt::Debug for StateIdDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateIdDetails")
            .field("number", &"[REDACTED]")
            .field("jurisdiction", &self.jurisdiction)
            .field("id_type", &self.id_type)
            .finish()
    }
}

/// The applicant's claimed identity attributes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ApplicantIdentity {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub dob: DateOfBirth,
    pub ssn: String,
    pub address: Address,
    #[serde(default)]
    pub state_id: Option<StateIdDetails>,
}

impl ApplicantIdentity {
    /// The SSN with separators removed.
    pub fn ssn_digits(&self) -> String {
        self.ssn.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    pub fn has_state_id(&self) -> bool {
        self.state_id.is_some()
    }
}

impl fmt::Debug for ApplicantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicantIdentity")
            .field("pii", &"[REDACTED]")
            .field("has_state_id", &self.has_state_id())
            .finish()
    }
}
