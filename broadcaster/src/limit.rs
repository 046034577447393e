//! Per-event listener caps

use serde::{Deserialize, Serialize};

use crate::error::BroadcastError;

/// Raw sentinel value meaning "no cap"
pub const UNBOUNDED_SENTINEL: i64 = -1;

/// Upper bound on the number of listeners an event may hold at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerLimit {
    /// Any number of listeners
    #[default]
    Unbounded,
    /// At most this many listeners
    Bounded(usize),
}

impl ListenerLimit {
    /// Whether a list already holding `current` listeners can take one more
    pub fn admits(&self, current: usize) -> bool {
        match self {
            ListenerLimit::Unbounded => true,
            ListenerLimit::Bounded(max) => current < *max,
        }
    }

    /// Whether `current` listeners fit within this limit
    pub fn holds(&self, current: usize) -> bool {
        match self {
            ListenerLimit::Unbounded => true,
            ListenerLimit::Bounded(max) => current <= *max,
        }
    }

    /// Raw integer form, using [`UNBOUNDED_SENTINEL`] for no cap
    pub fn as_raw(&self) -> i64 {
        match self {
            ListenerLimit::Unbounded => UNBOUNDED_SENTINEL,
            ListenerLimit::Bounded(max) => i64::try_from(*max).unwrap_or(i64::MAX),
        }
    }
}

impl TryFrom<i64> for ListenerLimit {
    type Error = BroadcastError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            UNBOUNDED_SENTINEL => Ok(ListenerLimit::Unbounded),
            n if n >= 0 => usize::try_from(n)
                .map(ListenerLimit::Bounded)
                .map_err(|_| BroadcastError::InvalidListenerLimit(raw)),
            _ => Err(BroadcastError::InvalidListenerLimit(raw)),
        }
    }
}

impl From<usize> for ListenerLimit {
    fn from(max: usize) -> Self {
        ListenerLimit::Bounded(max)
    }
}

impl std::fmt::Display for ListenerLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerLimit::Unbounded => write!(f, "unbounded"),
            ListenerLimit::Bounded(max) => write!(f, "{}", max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-1, Some(ListenerLimit::Unbounded))]
    #[case(0, Some(ListenerLimit::Bounded(0)))]
    #[case(2, Some(ListenerLimit::Bounded(2)))]
    #[case(-2, None)]
    #[case(i64::MIN, None)]
    fn test_limit_from_raw(#[case] raw: i64, #[case] expected: Option<ListenerLimit>) {
        assert_eq!(ListenerLimit::try_from(raw).ok(), expected);
    }

    #[test]
    fn test_limit_admits() {
        assert!(ListenerLimit::Unbounded.admits(usize::MAX));
        assert!(ListenerLimit::Bounded(2).admits(1));
        assert!(!ListenerLimit::Bounded(2).admits(2));
        assert!(!ListenerLimit::Bounded(0).admits(0));
    }

    #[test]
    fn test_limit_holds() {
        assert!(ListenerLimit::Bounded(2).holds(2));
        assert!(!ListenerLimit::Bounded(2).holds(3));
    }

    #[test]
    fn test_limit_raw_and_display() {
        assert_eq!(ListenerLimit::Unbounded.as_raw(), -1);
        assert_eq!(ListenerLimit::Bounded(5).as_raw(), 5);
        assert_eq!(ListenerLimit::Unbounded.to_string(), "unbounded");
        assert_eq!(ListenerLimit::Bounded(5).to_string(), "5");
    }
}
