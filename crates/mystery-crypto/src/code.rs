use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// How long a freshly issued verification code stays valid, in hours.
pub const CODE_TTL_HOURS: i64 = 1;

/// A numeric verification code together with its deadline.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue a 6-digit code valid for [`CODE_TTL_HOURS`] from `now`.
pub fn issue_code(now: DateTime<Utc>) -> VerificationCode {
    let n: u32 = rand::rng().random_range(100_000..1_000_000);
    VerificationCode {
        code: n.to_string(),
        expires_at: now + Duration::hours(CODE_TTL_HOURS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_six_digits() {
        for _ in 0..200 {
            let issued = issue_code(Utc::now());
            assert_eq!(issued.code.len(), 6);
            assert!(issued.code.chars().all(|c| c.is_ascii_digit()));
            assert!(!issued.code.starts_with('0'));
        }
    }

    #[test]
    fn expiry_is_one_hour_out() {
        let now = Utc::now();
        let issued = issue_code(now);
        assert_eq!(issued.expires_at - now, Duration::hours(1));
    }
}
