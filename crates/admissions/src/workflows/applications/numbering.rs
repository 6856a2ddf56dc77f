//! Application number allocation.
//!
//! The sequential form `APP-<year>-<nnnn>` counts applications already in the period,
//! so two concurrent submissions can derive the same candidate. The store's uniqueness
//! constraint is the backstop; the fallbacks below only need to be unlikely to collide.

use uuid::Uuid;

use super::domain::ApplicationNumber;

const PREFIX: &str = "APP";

/// `APP-<year>-<existing + 1>` zero-padded to four digits.
pub fn sequential_candidate(year: i32, existing_in_period: u64) -> ApplicationNumber {
    let sequence = existing_in_period.saturating_add(1);
    ApplicationNumber(format!("{PREFIX}-{year}-{sequence:04}"))
}

/// `APP-<year>-<epoch millis>`, used when the sequential candidate is already taken.
pub fn timestamp_fallback(year: i32, epoch_millis: i64) -> ApplicationNumber {
    ApplicationNumber(format!("{PREFIX}-{year}-{epoch_millis}"))
}

/// Timestamp plus a random suffix, used after the store rejected an insert as a duplicate.
pub fn randomized_fallback(year: i32, epoch_millis: i64) -> ApplicationNumber {
    let suffix = Uuid::new_v4().simple().to_string();
    ApplicationNumber(format!("{PREFIX}-{year}-{epoch_millis}-{}", &suffix[..6]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_numbers_are_zero_padded() {
        assert_eq!(sequential_candidate(2025, 0).as_str(), "APP-2025-0001");
        assert_eq!(sequential_candidate(2025, 41).as_str(), "APP-2025-0042");
        assert_eq!(sequential_candidate(2026, 12_345).as_str(), "APP-2026-12346");
    }

    #[test]
    fn fallbacks_embed_the_timestamp() {
        assert_eq!(
            timestamp_fallback(2025, 1_736_900_000_000).as_str(),
            "APP-2025-1736900000000"
        );

        let randomized = randomized_fallback(2025, 1_736_900_000_000);
        assert!(randomized.as_str().starts_with("APP-2025-1736900000000-"));
        assert_eq!(randomized.as_str().len(), "APP-2025-1736900000000-".len() + 6);
        assert_ne!(randomized, randomized_fallback(2025, 1_736_900_000_000));
    }
}
