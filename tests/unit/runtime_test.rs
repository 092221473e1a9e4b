//! Tests for tokio runtime adapters

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use court_scheduler::core::{Spawn, TimerScheduler};
use court_scheduler::runtime::{TokioSpawner, TokioTimerScheduler};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(Box::pin(async move {
        tx.send(123).unwrap();
    }));

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test(start_paused = true)]
async fn test_timer_fires_after_delay() {
    let timers = TokioTimerScheduler::new(TokioSpawner::current().unwrap());
    let fired = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&fired);
    let _handle = timers.after(
        Duration::from_secs(60),
        Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }),
    );

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_timer_never_fires() {
    let timers = TokioTimerScheduler::new(TokioSpawner::current().unwrap());
    let fired = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&fired);
    let handle = timers.after(
        Duration::from_secs(60),
        Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }),
    );
    handle.cancel();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
