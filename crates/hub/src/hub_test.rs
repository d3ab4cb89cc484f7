//! Tests for the broadcast hub

use super::*;
use std::time::Duration;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn envelope(n: usize) -> Bytes {
    Bytes::from(format!(r#"{{"n":{n}}}"#))
}

async fn recv(rx: &mut mpsc::Receiver<Bytes>) -> Bytes {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for envelope")
        .expect("queue closed")
}

#[tokio::test]
async fn test_broadcast_reaches_all_subscribers_in_order() {
    let hub = Hub::spawn("/x", CancellationToken::new());
    let (_id1, mut rx1) = hub.subscribe();
    let (_id2, mut rx2) = hub.subscribe();

    for n in 0..10 {
        hub.broadcast(envelope(n));
    }

    for n in 0..10 {
        assert_eq!(recv(&mut rx1).await, envelope(n));
        assert_eq!(recv(&mut rx2).await, envelope(n));
    }
}

#[tokio::test]
async fn test_remove_closes_subscriber_queue() {
    let hub = Hub::spawn("/x", CancellationToken::new());
    let (id, mut rx) = hub.subscribe();
    assert_eq!(hub.subscriber_count(), 1);

    hub.remove(id);
    assert_eq!(hub.subscriber_count(), 0);

    // Closed queue means the writer task would stop
    assert!(timeout(RECV_TIMEOUT, rx.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let hub = Hub::spawn("/x", CancellationToken::new());
    let (id, _rx) = hub.subscribe();

    hub.remove(id);
    hub.remove(id);
    assert_eq!(hub.subscriber_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_subscriber_loses_only_its_own_envelopes() {
    let hub = Hub::spawn("/x", CancellationToken::new());

    // Subscriber 1 never reads; subscriber 2 drains concurrently
    let (_slow_id, slow_rx) = hub.subscribe();
    let (_fast_id, mut fast_rx) = hub.subscribe();

    const TOTAL: usize = 1000;

    let collector = tokio::spawn(async move {
        let mut received = Vec::with_capacity(TOTAL);
        while received.len() < TOTAL {
            received.push(recv(&mut fast_rx).await);
        }
        received
    });

    for n in 0..TOTAL {
        hub.broadcast(envelope(n));
        // Let the fan-out task keep pace so the ingress queue never fills
        if n % 100 == 0 {
            tokio::task::yield_now().await;
        }
    }

    // The fast subscriber sees every envelope, in order
    let received = timeout(Duration::from_secs(10), collector)
        .await
        .expect("collector timed out")
        .unwrap();
    for (n, env) in received.iter().enumerate() {
        assert_eq!(*env, envelope(n));
    }

    // The slow subscriber holds at most its queue capacity; the rest
    // were dropped for it alone
    let mut slow_rx = slow_rx;
    let mut held = 0usize;
    while slow_rx.try_recv().is_ok() {
        held += 1;
    }
    assert!(held <= SUBSCRIBER_CAPACITY, "held {held}");
    assert!(hub.metrics().snapshot().subscriber_drops >= (TOTAL - SUBSCRIBER_CAPACITY) as u64);
}

#[tokio::test]
async fn test_ingress_overflow_drops_newest() {
    let cancel = CancellationToken::new();
    let hub = Hub::spawn("/x", cancel.clone());

    // Stop the fan-out task so the ingress queue backs up
    cancel.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    for n in 0..(INGRESS_CAPACITY + 50) {
        hub.broadcast(envelope(n));
    }

    let snap = hub.metrics().snapshot();
    assert_eq!(snap.broadcasts, INGRESS_CAPACITY as u64);
    assert_eq!(snap.ingress_drops, 50);
}

#[tokio::test]
async fn test_close_all_removes_everyone() {
    let hub = Hub::spawn("/x", CancellationToken::new());
    let (_a, mut rx_a) = hub.subscribe();
    let (_b, mut rx_b) = hub.subscribe();

    hub.close_all();
    assert_eq!(hub.subscriber_count(), 0);
    assert!(timeout(RECV_TIMEOUT, rx_a.recv()).await.unwrap().is_none());
    assert!(timeout(RECV_TIMEOUT, rx_b.recv()).await.unwrap().is_none());
}
