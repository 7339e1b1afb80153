//! Wall-clock timestamps for events and state records.
//!
//! Revert deadlines are monotonic and live in the application layer; this
//! module only deals with the time that gets shown to observers.

use chrono::{DateTime, Utc};

/// UTC timestamp attached to events and registry entries.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        assert!(ts >= before);
        assert!(ts <= Utc::now());
    }
}
