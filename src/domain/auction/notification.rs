//! In-app notifications listed by `GET /api/notifications`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Largest count shown verbatim on the badge.
pub const BADGE_MAX: usize = 99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: Timestamp,
    /// Free-form kind such as `outbid`, `ending`, `won` or `new`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, alias = "is_read")]
    pub is_read: bool,
}

impl Notification {
    /// Relative age such as `5m ago`.
    pub fn time_ago(&self, now: Timestamp) -> String {
        time_ago(self.timestamp, now)
    }
}

/// Relative age of `then` as seen at `now`.
pub fn time_ago(then: Timestamp, now: Timestamp) -> String {
    let minutes = now.duration_since(&then).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        format!("{}w ago", days / 7)
    }
}

/// Badge text for an unread count; `None` hides the badge.
pub fn badge_label(unread: usize) -> Option<String> {
    match unread {
        0 => None,
        n if n > BADGE_MAX => Some(format!("{BADGE_MAX}+")),
        n => Some(n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_epoch_millis(0).unwrap().plus_secs(secs)
    }

    #[test]
    fn decodes_server_notification() {
        let n: Notification = serde_json::from_value(json!({
            "id": "n-1",
            "title": "Outbid",
            "message": "Someone bid $20",
            "timestamp": 1_705_276_800_000_i64,
            "type": "outbid",
            "isRead": false
        }))
        .unwrap();

        assert_eq!(n.kind, "outbid");
        assert!(!n.is_read);
    }

    #[test]
    fn time_ago_buckets() {
        let then = at(0);
        assert_eq!(time_ago(then, at(30)), "Just now");
        assert_eq!(time_ago(then, at(5 * 60)), "5m ago");
        assert_eq!(time_ago(then, at(3 * 3_600)), "3h ago");
        assert_eq!(time_ago(then, at(2 * 86_400)), "2d ago");
        assert_eq!(time_ago(then, at(15 * 86_400)), "2w ago");
    }

    #[test]
    fn future_timestamps_read_as_just_now() {
        assert_eq!(time_ago(at(600), at(0)), "Just now");
    }

    #[test]
    fn badge_caps_at_ninety_nine() {
        assert_eq!(badge_label(0), None);
        assert_eq!(badge_label(7).as_deref(), Some("7"));
        assert_eq!(badge_label(99).as_deref(), Some("99"));
        assert_eq!(badge_label(100).as_deref(), Some("99+"));
    }
}
