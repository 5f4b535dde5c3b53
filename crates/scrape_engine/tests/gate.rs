mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::init_logging;
use pretty_assertions::assert_eq;
use scrape_engine::ConcurrencyGate;

#[tokio::test(start_paused = true)]
async fn holders_never_exceed_capacity() {
    init_logging();
    let gate = ConcurrencyGate::new(2);
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let gate = gate.clone();
        let active = active.clone();
        let peak = peak.clone();
        handles.push(tokio::spawn(async move {
            let _permit = gate.acquire().await;
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            active.fetch_sub(1, Ordering::SeqCst);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 2);
    assert_eq!(gate.available(), 2);
    assert_eq!(gate.waiting(), 0);
}

#[tokio::test]
async fn waiters_are_woken_in_arrival_order() {
    init_logging();
    let gate = ConcurrencyGate::new(1);
    let held = gate.acquire().await;
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for id in 0..3usize {
        let gate_for_task = gate.clone();
        let order = order.clone();
        handles.push(tokio::spawn(async move {
            let permit = gate_for_task.acquire().await;
            order.lock().unwrap().push(id);
            tokio::task::yield_now().await;
            drop(permit);
        }));
        while gate.waiting() < id + 1 {
            tokio::task::yield_now().await;
        }
    }

    drop(held);
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[tokio::test]
async fn abandoned_waiter_does_not_leak_a_slot() {
    init_logging();
    let gate = ConcurrencyGate::new(1);
    let held = gate.acquire().await;

    let waiter = {
        let gate = gate.clone();
        tokio::spawn(async move {
            let _permit = gate.acquire().await;
        })
    };
    while gate.waiting() < 1 {
        tokio::task::yield_now().await;
    }
    waiter.abort();
    let _ = waiter.await;

    drop(held);
    assert_eq!(gate.available(), 1);
    let again = gate.acquire().await;
    drop(again);
    assert_eq!(gate.available(), 1);
}
