//! Point-in-time auction data fetched over REST before live updates start.

use serde::{de, Deserialize, Deserializer};

use crate::domain::foundation::{AuctionId, BidderId, Timestamp};
use crate::domain::live::AuctionStatus;

/// Smallest raise over the current price when the server does not say.
pub const DEFAULT_BID_INCREMENT: f64 = 1.0;

/// The auction as returned by `GET /api/auctions/{id}`.
///
/// The REST API speaks snake_case while the socket speaks camelCase; both
/// spellings decode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSnapshot {
    pub id: AuctionId,
    #[serde(default, alias = "item_name")]
    pub title: String,
    #[serde(alias = "current_bid", alias = "currentBid")]
    pub current_price: f64,
    #[serde(default, alias = "bid_count")]
    pub bid_count: u32,
    #[serde(default, alias = "end_time", deserialize_with = "deserialize_end_time")]
    pub end_time: Option<Timestamp>,
    #[serde(default)]
    pub status: Option<AuctionStatus>,
    #[serde(default = "default_bid_increment", alias = "bid_increment")]
    pub bid_increment: f64,
    #[serde(default, alias = "winner_id")]
    pub winner_id: Option<BidderId>,
}

impl AuctionSnapshot {
    /// Minimal snapshot for a screen opened without REST data.
    pub fn placeholder(id: AuctionId) -> Self {
        Self {
            id,
            title: String::new(),
            current_price: 0.0,
            bid_count: 0,
            end_time: None,
            status: None,
            bid_increment: DEFAULT_BID_INCREMENT,
            winner_id: None,
        }
    }
}

fn default_bid_increment() -> f64 {
    DEFAULT_BID_INCREMENT
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEndTime {
    Millis(i64),
    Iso(String),
}

fn deserialize_end_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Timestamp>, D::Error> {
    match Option::<RawEndTime>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawEndTime::Millis(millis)) => Timestamp::from_epoch_millis(millis)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("end time {millis} out of range"))),
        Some(RawEndTime::Iso(text)) => Timestamp::parse_iso(&text)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unparseable end time '{text}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_rest_payload() {
        let snapshot: AuctionSnapshot = serde_json::from_value(json!({
            "id": 42,
            "item_name": "Vintage Watch",
            "current_bid": 150.0,
            "bid_increment": 5.0,
            "end_time": "2024-01-15T00:00:00+00:00",
            "status": "active",
            "bid_count": 3,
            "winner_id": null
        }))
        .unwrap();

        assert_eq!(snapshot.id.as_str(), "42");
        assert_eq!(snapshot.title, "Vintage Watch");
        assert_eq!(snapshot.current_price, 150.0);
        assert_eq!(snapshot.bid_increment, 5.0);
        assert_eq!(snapshot.bid_count, 3);
        assert_eq!(snapshot.status, Some(AuctionStatus::Live));
        assert_eq!(
            snapshot.end_time.unwrap().as_epoch_millis(),
            1_705_276_800_000
        );
        assert!(snapshot.winner_id.is_none());
    }

    #[test]
    fn decodes_camel_case_payload_with_millis() {
        let snapshot: AuctionSnapshot = serde_json::from_value(json!({
            "id": "7",
            "title": "Bike",
            "currentPrice": 20.0,
            "bidCount": 1,
            "endTime": 1_705_276_800_000_i64
        }))
        .unwrap();

        assert_eq!(snapshot.bid_increment, DEFAULT_BID_INCREMENT);
        assert_eq!(
            snapshot.end_time.unwrap().as_epoch_millis(),
            1_705_276_800_000
        );
        assert!(snapshot.status.is_none());
    }

    #[test]
    fn rejects_garbage_end_time() {
        let result: Result<AuctionSnapshot, _> = serde_json::from_value(json!({
            "id": "7",
            "currentPrice": 20.0,
            "endTime": "soon"
        }));
        assert!(result.is_err());
    }
}
