//! Property tests for the live stack.
//!
//! - The dispatcher swallows anything the server might send
//! - Feeds only ever yield events for their own auction
//! - No sequence of connects, drops, silent peers and disconnects opens a
//!   second socket, slow handshakes included, and nothing reconnects after a
//!   final disconnect

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tokio::runtime::Runtime;
use tokio::time::{sleep, timeout};

use zubid_live::adapters::websocket::{DispatchOutcome, EventDispatcher};
use zubid_live::adapters::{ConnectionManager, ConnectionSettings, ScriptedConnector};
use zubid_live::domain::foundation::AuctionId;

fn paused_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

fn frame_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("bid_update".to_string()),
        Just("auction_update".to_string()),
        "[a-z_]{0,12}",
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Connect,
    Disconnect,
    ServerDrop,
    ServerClose(u16),
    ServerSilent,
    Wait(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Connect),
        2 => Just(Op::Disconnect),
        2 => Just(Op::ServerDrop),
        1 => prop_oneof![Just(1000u16), Just(1001u16), Just(1006u16), Just(4000u16)]
            .prop_map(Op::ServerClose),
        1 => Just(Op::ServerSilent),
        3 => (0u64..40_000).prop_map(Op::Wait),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn dispatcher_never_panics_on_arbitrary_text(text in ".*") {
        let dispatcher = EventDispatcher::with_default_capacity();
        let _ = dispatcher.dispatch(&text);
    }

    #[test]
    fn dispatcher_never_panics_on_near_miss_frames(
        kind in frame_type(),
        auction_id in prop::option::of("[0-9]{0,4}"),
        price in prop::option::of(any::<f64>()),
        count in prop::option::of(any::<i64>()),
        status in prop::option::of("[a-z_]{0,12}"),
    ) {
        let mut frame = serde_json::Map::new();
        frame.insert("type".into(), kind.into());
        if let Some(id) = auction_id {
            frame.insert("auctionId".into(), id.into());
        }
        if let Some(price) = price.and_then(serde_json::Number::from_f64) {
            frame.insert("currentPrice".into(), price.into());
        }
        if let Some(count) = count {
            frame.insert("bidCount".into(), count.into());
        }
        if let Some(status) = status {
            frame.insert("status".into(), status.into());
        }

        let dispatcher = EventDispatcher::with_default_capacity();
        let outcome = dispatcher.dispatch(&serde_json::Value::Object(frame).to_string());
        prop_assert!(matches!(
            outcome,
            DispatchOutcome::Published | DispatchOutcome::Ignored | DispatchOutcome::Malformed
        ));
    }

    #[test]
    fn feeds_only_yield_their_own_auction(ids in prop::collection::vec(0u8..5, 1..40)) {
        paused_runtime().block_on(async {
            let dispatcher = EventDispatcher::with_default_capacity();
            let watched = AuctionId::new("3").unwrap();
            let mut feed = dispatcher.watch_auction(watched.clone());

            for id in &ids {
                let frame = serde_json::json!({
                    "type": "bid_update",
                    "auctionId": id.to_string(),
                    "currentPrice": 10.0,
                    "bidCount": 1
                });
                dispatcher.dispatch(&frame.to_string());
            }

            let mut seen = 0;
            while let Ok(Some(event)) = timeout(Duration::ZERO, feed.next()).await {
                assert_eq!(event.auction_id(), &watched);
                seen += 1;
            }
            assert_eq!(seen, ids.iter().filter(|id| **id == 3).count());
        });
    }

    #[test]
    fn never_more_than_one_open_socket(
        handshake_ms in prop_oneof![Just(0u64), 1u64..3_000],
        ops in prop::collection::vec(op(), 1..40),
    ) {
        paused_runtime().block_on(async {
            let connector =
                ScriptedConnector::with_handshake_delay(Duration::from_millis(handshake_ms));
            let manager = ConnectionManager::new(
                connector.clone(),
                Arc::new(EventDispatcher::with_default_capacity()),
                ConnectionSettings::new("ws://local/ws"),
            );

            for op in ops {
                match op {
                    Op::Connect => manager.connect(None),
                    Op::Disconnect => manager.disconnect(),
                    Op::ServerDrop | Op::ServerClose(_) | Op::ServerSilent => {
                        if let Some(last) = connector.session_count().checked_sub(1) {
                            let server = connector.server(last);
                            match op {
                                Op::ServerClose(code) => server.close(code, "scripted"),
                                Op::ServerSilent => server.go_silent(),
                                _ => server.drop_connection(),
                            }
                        }
                    }
                    Op::Wait(ms) => sleep(Duration::from_millis(ms)).await,
                }
                sleep(Duration::from_millis(1)).await;
                assert!(connector.open_sessions() <= 1, "more than one socket open");
            }

            manager.disconnect();
            sleep(Duration::from_millis(1)).await;
            let attempts = connector.connect_count();
            sleep(Duration::from_secs(60)).await;
            assert_eq!(connector.connect_count(), attempts, "reconnected after disconnect");
            assert_eq!(connector.open_sessions(), 0);
        });
    }
}
