//! WebSocket message types for the live auction channel.
//!
//! Defines the protocol between the client and the auction server:
//! - Client → Server: channel subscribe/unsubscribe, bids
//! - Server → Client: bid updates, auction status updates
//!
//! Every frame is a JSON object with a `type` discriminator and camelCase keys.

use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::AuctionId;
use crate::domain::live::{AuctionStatusEvent, BidUpdate, LiveEvent};

// ============================================
// Client → Server Messages
// ============================================

/// All message types the client sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving a channel's events.
    Subscribe(ChannelRequest),

    /// Stop receiving a channel's events.
    Unsubscribe(ChannelRequest),

    /// Place a bid over the socket.
    Bid(BidRequest),
}

/// Channel families the server multiplexes on the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Auction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRequest {
    pub channel: Channel,
    pub auction_id: AuctionId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    pub auction_id: AuctionId,
    pub amount: f64,
}

impl ClientMessage {
    pub fn subscribe(auction_id: AuctionId) -> Self {
        ClientMessage::Subscribe(ChannelRequest {
            channel: Channel::Auction,
            auction_id,
        })
    }

    pub fn unsubscribe(auction_id: AuctionId) -> Self {
        ClientMessage::Unsubscribe(ChannelRequest {
            channel: Channel::Auction,
            auction_id,
        })
    }

    pub fn bid(auction_id: AuctionId, amount: f64) -> Self {
        ClientMessage::Bid(BidRequest { auction_id, amount })
    }

    /// Wire `type` of this message.
    pub fn frame_type(&self) -> &'static str {
        match self {
            ClientMessage::Subscribe(_) => "subscribe",
            ClientMessage::Unsubscribe(_) => "unsubscribe",
            ClientMessage::Bid(_) => "bid",
        }
    }

    /// Auction the message concerns.
    pub fn auction_id(&self) -> &AuctionId {
        match self {
            ClientMessage::Subscribe(req) | ClientMessage::Unsubscribe(req) => &req.auction_id,
            ClientMessage::Bid(req) => &req.auction_id,
        }
    }

    /// Encodes the message as a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================
// Server → Client Messages
// ============================================

/// Wire discriminator of bid updates.
pub const BID_UPDATE: &str = "bid_update";
/// Wire discriminator of auction status updates.
pub const AUCTION_UPDATE: &str = "auction_update";

/// Why an inbound frame could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    NotJson(String),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("invalid {frame_type} payload: {reason}")]
    InvalidPayload { frame_type: String, reason: String },
}

/// Decodes one inbound text frame.
///
/// Returns `Ok(None)` for frames with a missing or unrecognised `type`; those
/// are not errors, the server may add new frame kinds at any time.
pub fn decode_server_frame(text: &str) -> Result<Option<LiveEvent>, FrameError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| FrameError::NotJson(e.to_string()))?;
    let frame_type = match &value {
        Value::Object(map) => match map.get("type").and_then(Value::as_str) {
            Some(t) => t.to_string(),
            None => return Ok(None),
        },
        _ => return Err(FrameError::NotAnObject),
    };

    let invalid = |e: serde_json::Error| FrameError::InvalidPayload {
        frame_type: frame_type.clone(),
        reason: e.to_string(),
    };

    match frame_type.as_str() {
        BID_UPDATE => serde_json::from_value::<BidUpdate>(value)
            .map(|u| Some(LiveEvent::Bid(u)))
            .map_err(invalid),
        AUCTION_UPDATE => serde_json::from_value::<AuctionStatusEvent>(value)
            .map(|e| Some(LiveEvent::Status(e)))
            .map_err(invalid),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::live::AuctionStatus;
    use serde_json::json;

    fn id(s: &str) -> AuctionId {
        AuctionId::new(s).unwrap()
    }

    #[test]
    fn subscribe_serializes_with_channel() {
        let json: Value =
            serde_json::from_str(&ClientMessage::subscribe(id("42")).to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            json!({"type": "subscribe", "channel": "auction", "auctionId": "42"})
        );
    }

    #[test]
    fn unsubscribe_serializes_with_channel() {
        let json = serde_json::to_value(ClientMessage::unsubscribe(id("7"))).unwrap();
        assert_eq!(
            json,
            json!({"type": "unsubscribe", "channel": "auction", "auctionId": "7"})
        );
    }

    #[test]
    fn bid_serializes_amount() {
        let message = ClientMessage::bid(id("42"), 155.5);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, json!({"type": "bid", "auctionId": "42", "amount": 155.5}));
        assert_eq!(message.frame_type(), "bid");
        assert_eq!(message.auction_id().as_str(), "42");
    }

    #[test]
    fn decodes_bid_update() {
        let event = decode_server_frame(
            r#"{"type":"bid_update","auctionId":"42","currentPrice":150.0,"bidCount":3}"#,
        )
        .unwrap()
        .unwrap();

        match event {
            LiveEvent::Bid(update) => {
                assert_eq!(update.auction_id, id("42"));
                assert_eq!(update.current_price, 150.0);
                assert_eq!(update.bid_count, 3);
            }
            other => panic!("expected bid update, got {:?}", other),
        }
    }

    #[test]
    fn decodes_auction_update() {
        let event = decode_server_frame(
            r#"{"type":"auction_update","auctionId":"7","status":"ending_soon"}"#,
        )
        .unwrap()
        .unwrap();

        match event {
            LiveEvent::Status(status) => assert_eq!(status.status, AuctionStatus::EndingSoon),
            other => panic!("expected status update, got {:?}", other),
        }
    }

    #[test]
    fn unknown_or_missing_type_is_ignored() {
        assert_eq!(decode_server_frame(r#"{"type":"chat","text":"hi"}"#), Ok(None));
        assert_eq!(decode_server_frame(r#"{"auctionId":"42"}"#), Ok(None));
        assert_eq!(decode_server_frame(r#"{"type":5}"#), Ok(None));
    }

    #[test]
    fn non_json_is_an_error() {
        assert!(matches!(
            decode_server_frame("not json"),
            Err(FrameError::NotJson(_))
        ));
        assert_eq!(decode_server_frame("[1,2]"), Err(FrameError::NotAnObject));
    }

    #[test]
    fn known_type_with_bad_payload_is_an_error() {
        let err = decode_server_frame(r#"{"type":"bid_update","auctionId":"42"}"#).unwrap_err();
        match err {
            FrameError::InvalidPayload { frame_type, .. } => assert_eq!(frame_type, "bid_update"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
