//! Forwarding Policy
//!
//! Decides which classified feed messages the bridge forwards to the
//! broker. Heartbeats and subscription confirmations are feed plumbing and
//! never leave the process; in matches-only mode everything but trade
//! executions is dropped.

use crate::domain::message::FeedMessage;

/// Routing policy applied by the publisher bridge.
#[derive(Debug, Clone, Copy)]
pub struct RoutingPolicy {
    /// Forward only `match` messages.
    pub matches_only: bool,
    /// Forward `last_match` snapshots when not in matches-only mode.
    ///
    /// Historical deployments disagree on this; it is a flag rather than a
    /// hard-coded choice.
    pub forward_last_match: bool,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            matches_only: false,
            forward_last_match: true,
        }
    }
}

impl RoutingPolicy {
    /// Policy that forwards only trade executions.
    #[must_use]
    pub const fn matches_only() -> Self {
        Self {
            matches_only: true,
            forward_last_match: true,
        }
    }

    /// Whether the bridge should forward this message.
    #[must_use]
    pub fn should_forward(&self, msg: &FeedMessage) -> bool {
        if self.matches_only {
            return matches!(msg, FeedMessage::Match(_));
        }
        match msg {
            FeedMessage::Heartbeat(_) | FeedMessage::Subscriptions(_) => false,
            FeedMessage::LastMatch(_) => self.forward_last_match,
            FeedMessage::Match(_) | FeedMessage::Other(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn msg(msg_type: &str) -> FeedMessage {
        FeedMessage::parse(&format!(r#"{{"type":"{msg_type}"}}"#)).unwrap()
    }

    #[test_case("heartbeat", false ; "heartbeat never forwarded")]
    #[test_case("subscriptions", false ; "subscriptions never forwarded")]
    #[test_case("last_match", true ; "last match forwarded by default")]
    #[test_case("match", true ; "match forwarded")]
    #[test_case("ticker", true ; "unknown types forwarded")]
    fn default_policy(msg_type: &str, expected: bool) {
        assert_eq!(RoutingPolicy::default().should_forward(&msg(msg_type)), expected);
    }

    #[test_case("heartbeat", false)]
    #[test_case("subscriptions", false)]
    #[test_case("last_match", false)]
    #[test_case("match", true)]
    #[test_case("ticker", false)]
    fn matches_only_policy(msg_type: &str, expected: bool) {
        assert_eq!(
            RoutingPolicy::matches_only().should_forward(&msg(msg_type)),
            expected
        );
    }

    #[test]
    fn last_match_exclusion_flag() {
        let policy = RoutingPolicy {
            matches_only: false,
            forward_last_match: false,
        };
        assert!(!policy.should_forward(&msg("last_match")));
        assert!(policy.should_forward(&msg("match")));
    }
}
