//! Token validity windows.

use crate::error::TokenError;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Offset used for "unlimited" tokens. Verifiers expect a concrete `exp`, so
/// unlimited tokens expire a century after issuance instead of omitting it.
pub const UNLIMITED_YEARS: u32 = 100;

/// Largest explicit day count accepted. Anything longer should be unlimited.
pub const MAX_EXPIRATION_DAYS: u32 = UNLIMITED_YEARS * 366;

/// Requested validity of a token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// Expires after this many days.
    Days(u32),
    /// Effectively never expires.
    Unlimited,
}

impl Expiry {
    /// Interpret a day count where `0` means unlimited.
    pub fn from_days(days: u32) -> Self {
        if days == 0 {
            Expiry::Unlimited
        } else {
            Expiry::Days(days)
        }
    }

    /// Day count as persisted on token records (`0` for unlimited).
    pub fn days(self) -> u32 {
        match self {
            Expiry::Days(days) => days,
            Expiry::Unlimited => 0,
        }
    }

    /// Resolve the expiration instant for a token issued at `issued_at`.
    pub fn expires_at(self, issued_at: DateTime<Utc>) -> Result<DateTime<Utc>, TokenError> {
        let expires_at = match self {
            Expiry::Days(days) if days > MAX_EXPIRATION_DAYS => None,
            Expiry::Days(days) => issued_at.checked_add_signed(Duration::days(i64::from(days))),
            Expiry::Unlimited => issued_at.checked_add_months(Months::new(UNLIMITED_YEARS * 12)),
        };
        expires_at.ok_or(TokenError::ExpiryOutOfRange { days: self.days() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_zero_days_is_unlimited() {
        assert_eq!(Expiry::from_days(0), Expiry::Unlimited);
        assert_eq!(Expiry::from_days(30), Expiry::Days(30));
        assert_eq!(Expiry::Unlimited.days(), 0);
    }

    #[test]
    fn test_unlimited_is_a_century() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let exp = Expiry::Unlimited.expires_at(now).unwrap();
        assert_eq!(exp.year(), 2126);
        assert_eq!(exp.month(), 10);
        assert_eq!(exp.day(), 18);
    }

    #[test]
    fn test_days_offset() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Expiry::Days(30).expires_at(now).unwrap(), now + Duration::days(30));
    }

    #[test]
    fn test_oversized_day_count_is_an_error() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(Expiry::Days(MAX_EXPIRATION_DAYS).expires_at(now).is_ok());
        assert!(matches!(
            Expiry::Days(MAX_EXPIRATION_DAYS + 1).expires_at(now),
            Err(TokenError::ExpiryOutOfRange { days }) if days == MAX_EXPIRATION_DAYS + 1
        ));
        assert!(matches!(
            Expiry::Days(u32::MAX).expires_at(now),
            Err(TokenError::ExpiryOutOfRange { .. })
        ));
    }
}
