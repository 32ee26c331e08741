// ============================================================================
// Concurrency and Expiry Tests
// ============================================================================
//
// Regression tests for the append read-modify-write race: concurrent
// appends to one key must all be reflected in the final stored sequence.
// An unguarded read-modify-write loses envelopes under this load.
//
// Expiry tests drive the store's TTL on the paused tokio clock.
//
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use rendezvous_service::core::{FetchResult, RelayEngine, RelayPolicy, SubmitOutcome};
use rendezvous_service::store::MemoryStore;
use serde_json::json;

use test_utils::{spawn_app, test_policy};

fn engine() -> Arc<RelayEngine> {
    Arc::new(RelayEngine::new(Arc::new(MemoryStore::new()), test_policy()))
}

fn fetch_sequence(result: FetchResult) -> Vec<serde_json::Value> {
    match result {
        FetchResult::Found(raw) => serde_json::from_slice::<serde_json::Value>(&raw)
            .unwrap()
            .as_array()
            .expect("stored value should be a sequence")
            .clone(),
        other => panic!("expected stored sequence, got {other:?}"),
    }
}

// ============================================================================
// Concurrent Append Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_appends_to_one_key_all_survive() {
    const WRITERS: usize = 32;
    let engine = engine();

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let envelope =
                serde_json::from_value(json!({"key": "race", "webrtc": format!("msg-{i}")}))
                    .unwrap();
            engine.submit(envelope).await
        }));
    }
    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            SubmitOutcome::Appended { .. }
        ));
    }

    let items = fetch_sequence(engine.fetch("race").await);
    assert_eq!(items.len(), WRITERS);

    // Every writer's envelope made it, none were overwritten
    for i in 0..WRITERS {
        let expected = json!(format!("msg-{i}"));
        assert!(
            items.iter().any(|item| item["webrtc"] == expected),
            "envelope msg-{i} was lost"
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_appends_across_keys_are_independent() {
    const WRITERS_PER_KEY: usize = 16;
    let engine = engine();

    let mut handles = Vec::new();
    for key in ["left", "right"] {
        for i in 0..WRITERS_PER_KEY {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let envelope =
                    serde_json::from_value(json!({"key": key, "webrtc": format!("{key}-{i}")}))
                        .unwrap();
                engine.submit(envelope).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(
        fetch_sequence(engine.fetch("left").await).len(),
        WRITERS_PER_KEY
    );
    assert_eq!(
        fetch_sequence(engine.fetch("right").await).len(),
        WRITERS_PER_KEY
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_appends_over_http_all_survive() {
    const WRITERS: usize = 16;
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let client = client.clone();
        let address = app.address.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(format!("http://{address}/"))
                .json(&json!({"key": "race", "webrtc": format!("msg-{i}")}))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), reqwest::StatusCode::OK);
    }

    let body = client
        .get(format!("http://{}/race", app.address))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value.as_array().unwrap().len(), WRITERS);
}

// ============================================================================
// Expiry Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn entry_expires_after_the_ttl_window() {
    let engine = engine();

    let envelope = serde_json::from_value(json!({"key": "fleeting"})).unwrap();
    assert_eq!(engine.submit(envelope).await, SubmitOutcome::Replaced);
    assert!(matches!(
        engine.fetch("fleeting").await,
        FetchResult::Found(_)
    ));

    tokio::time::advance(Duration::from_secs(121)).await;
    assert_eq!(engine.fetch("fleeting").await, FetchResult::Empty);
}

#[tokio::test(start_paused = true)]
async fn every_write_refreshes_the_ttl() {
    let engine = engine();

    let first = serde_json::from_value(json!({"key": "k", "webrtc": "offer1"})).unwrap();
    engine.submit(first).await;

    tokio::time::advance(Duration::from_secs(100)).await;
    let second = serde_json::from_value(json!({"key": "k", "webrtc": "answer1"})).unwrap();
    engine.submit(second).await;

    // 200s past the first write, but only 100s past the second
    tokio::time::advance(Duration::from_secs(100)).await;
    assert_eq!(fetch_sequence(engine.fetch("k").await).len(), 2);

    // There is no sliding renewal on read
    tokio::time::advance(Duration::from_secs(21)).await;
    assert_eq!(engine.fetch("k").await, FetchResult::Empty);
}

#[tokio::test(start_paused = true)]
async fn append_after_expiry_starts_from_absent_state() {
    let engine = engine();

    let first = serde_json::from_value(json!({"key": "k", "webrtc": "offer1"})).unwrap();
    engine.submit(first).await;

    tokio::time::advance(Duration::from_secs(121)).await;

    let second = serde_json::from_value(json!({"key": "k", "webrtc": "offer2"})).unwrap();
    assert_eq!(
        engine.submit(second).await,
        SubmitOutcome::Appended { sequence_len: 1 }
    );

    let items = fetch_sequence(engine.fetch("k").await);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["webrtc"], json!("offer2"));
}
