//! Random UUID identifiers for events and action contexts.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Hyphenated form, as written in logs.
                write!(f, "{}", self.0.hyphenated())
            }
        }
    };
}

define_id!(
    /// Correlates the script run and state writes caused by one trigger.
    ContextId
);

define_id!(
    /// Identifies one [`Event`](crate::event::Event).
    EventId
);
