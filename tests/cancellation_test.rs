//! Tests for cancelling and timing out blocked queue operations

use rust_bounded_queue::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_cancel_blocked_put_returns_item() {
    let queue = Arc::new(BoundedQueue::new(1).expect("Failed to create queue"));
    queue.put(1);
    let token = CancellationToken::new();

    let producer = {
        let queue = Arc::clone(&queue);
        let token = token.clone();
        thread::spawn(move || queue.put_cancellable(2, &token))
    };

    thread::sleep(Duration::from_millis(30));
    token.cancel();

    let result = producer.join().expect("Producer panicked");
    assert_eq!(result, Err(QueueError::Cancelled(2)));
    assert_eq!(queue.len(), 1);

    // Queue state is intact and still usable.
    assert_eq!(queue.take(), 1);
    queue.put(3);
    assert_eq!(queue.take(), 3);
}

#[test]
fn test_cancel_blocked_take_with_reason() {
    let queue = Arc::new(BoundedQueue::<String>::new(2).expect("Failed to create queue"));
    let token = CancellationToken::new();

    let consumer = {
        let queue = Arc::clone(&queue);
        let token = token.clone();
        thread::spawn(move || queue.take_cancellable(&token))
    };

    thread::sleep(Duration::from_millis(30));
    token.cancel_with_reason(CancellationReason::Custom("consumer retired".to_string()));

    match consumer.join().expect("Consumer panicked") {
        Err(ThreadError::Cancelled { reason }) => assert_eq!(reason, "consumer retired"),
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert!(queue.is_empty());
}

#[test]
fn test_one_token_cancels_many_waiters() {
    let queue = Arc::new(BoundedQueue::<u32>::new(4).expect("Failed to create queue"));
    let token = CancellationToken::new();
    let cancelled = Arc::new(AtomicUsize::new(0));

    let consumers: Vec<_> = (0..6)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let token = token.clone();
            let cancelled = Arc::clone(&cancelled);
            thread::spawn(move || {
                if queue.take_cancellable(&token).is_err() {
                    cancelled.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(30));
    token.cancel();
    for consumer in consumers {
        consumer.join().expect("Consumer panicked");
    }
    assert_eq!(cancelled.load(Ordering::SeqCst), 6);
}

#[test]
fn test_cancelled_consumer_does_not_strand_item() {
    let queue = Arc::new(BoundedQueue::new(1).expect("Failed to create queue"));
    let doomed = CancellationToken::new();
    let got = Arc::new(AtomicBool::new(false));

    let cancelled_consumer = {
        let queue = Arc::clone(&queue);
        let token = doomed.clone();
        thread::spawn(move || queue.take_cancellable(&token))
    };
    let patient_consumer = {
        let queue = Arc::clone(&queue);
        let got = Arc::clone(&got);
        thread::spawn(move || {
            let value = queue.take();
            got.store(true, Ordering::SeqCst);
            value
        })
    };

    thread::sleep(Duration::from_millis(30));
    doomed.cancel();
    assert!(cancelled_consumer.join().expect("Consumer panicked").is_err());

    queue.put(99);
    assert_eq!(patient_consumer.join().expect("Consumer panicked"), 99);
    assert!(got.load(Ordering::SeqCst));
}

#[test]
fn test_timeouts_leave_queue_consistent() {
    let queue = Arc::new(BoundedQueue::new(2).expect("Failed to create queue"));
    queue.put('a');
    queue.put('b');

    let start = Instant::now();
    assert_eq!(
        queue.put_timeout('c', Duration::from_millis(20)),
        Err(QueueError::Timeout('c'))
    );
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(queue.len(), 2);

    assert_eq!(queue.take(), 'a');
    assert_eq!(queue.take(), 'b');
    assert_eq!(queue.take_timeout(Duration::from_millis(10)), None);
    assert!(queue.is_empty());
}

#[test]
fn test_already_cancelled_token_never_blocks() {
    let queue = BoundedQueue::new(1).expect("Failed to create queue");
    let token = CancellationToken::new();
    token.cancel();

    // Even with room available the cancelled token wins.
    assert_eq!(queue.put_cancellable(7, &token), Err(QueueError::Cancelled(7)));
    assert!(queue.take_cancellable(&token).is_err());
    assert!(token.check().is_err());
}

#[test]
fn test_cancel_racing_with_waits() {
    // Cancellation issued at varying points around the wait must always be
    // observed; none of these threads may hang.
    for delay_us in [0u64, 10, 100, 1_000] {
        let queue = Arc::new(BoundedQueue::<u8>::new(1).expect("Failed to create queue"));
        let token = CancellationToken::new();

        let consumer = {
            let queue = Arc::clone(&queue);
            let token = token.clone();
            thread::spawn(move || queue.take_cancellable(&token))
        };

        thread::sleep(Duration::from_micros(delay_us));
        token.cancel();
        assert!(consumer.join().expect("Consumer panicked").is_err());
    }
}
