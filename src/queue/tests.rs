//! Contract tests run against every queue implementation

use super::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn implementations() -> Vec<Arc<dyn ConcurrentQueue<u64>>> {
    vec![
        Arc::new(ReferenceQueue::<u64>::new()),
        Arc::new(BlockingQueue::<u64>::new()),
        Arc::new(LockFreeQueue::<u64>::new()),
    ]
}

#[test]
fn test_one_two_three_scenario() {
    for queue in implementations() {
        queue.enqueue(1);
        queue.enqueue(2);
        queue.enqueue(3);

        assert_eq!(queue.try_dequeue(), Some(1), "{}", queue.name());
        assert_eq!(queue.try_dequeue(), Some(2), "{}", queue.name());
        assert!(!queue.is_empty(), "{}", queue.name());
        assert_eq!(queue.try_dequeue(), Some(3), "{}", queue.name());
        assert!(queue.is_empty(), "{}", queue.name());
        assert_eq!(queue.try_dequeue(), None, "{}", queue.name());
    }
}

#[test]
fn test_try_dequeue_on_empty_never_blocks() {
    for queue in implementations() {
        // Fresh queue
        assert_eq!(queue.try_dequeue(), None);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);

        // Right after the only item is removed
        queue.enqueue(99);
        assert_eq!(queue.try_dequeue(), Some(99));
        assert_eq!(queue.try_dequeue(), None);
        assert!(queue.is_empty());
    }
}

#[test]
fn test_len_tracks_single_threaded_operations() {
    for queue in implementations() {
        for i in 0..10 {
            queue.enqueue(i);
            assert_eq!(queue.len(), i as usize + 1);
        }
        for i in (0..10).rev() {
            queue.try_dequeue();
            assert_eq!(queue.len(), i);
        }
    }
}

#[test]
fn test_names_are_distinct() {
    let names: HashSet<_> = implementations().iter().map(|q| q.name()).collect();
    assert_eq!(names.len(), 3);
}

#[test]
fn test_fifo_per_producer_under_contention() {
    const PRODUCERS: u64 = 4;
    const ITEMS: u64 = 5_000;

    for queue in implementations() {
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|producer_id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for seq in 0..ITEMS {
                        queue.enqueue((producer_id << 32) | seq);
                    }
                })
            })
            .collect();

        // One consumer: the order it observes per producer must be strictly
        // increasing.
        let mut next_expected = vec![0u64; PRODUCERS as usize];
        let mut received = 0;
        while received < PRODUCERS * ITEMS {
            match queue.try_dequeue() {
                Some(item) => {
                    let producer = (item >> 32) as usize;
                    let seq = item & 0xFFFF_FFFF;
                    assert_eq!(seq, next_expected[producer], "{}", queue.name());
                    next_expected[producer] += 1;
                    received += 1;
                }
                None => thread::yield_now(),
            }
        }

        for producer in producers {
            producer.join().unwrap();
        }
        assert!(queue.is_empty());
    }
}

#[test]
fn test_no_loss_or_duplication_mpmc() {
    const PRODUCERS: u64 = 4;
    const CONSUMERS: usize = 4;
    const ITEMS: u64 = 10_000;

    for queue in implementations() {
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|producer_id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for seq in 0..ITEMS {
                        queue.enqueue((producer_id << 32) | seq);
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut received = Vec::new();
                    while received.len() < (PRODUCERS * ITEMS) as usize / CONSUMERS {
                        match queue.try_dequeue() {
                            Some(item) => received.push(item),
                            None => thread::yield_now(),
                        }
                    }
                    received
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }

        let mut seen = HashSet::new();
        for consumer in consumers {
            for item in consumer.join().unwrap() {
                assert!(seen.insert(item), "{}: duplicate {item:#x}", queue.name());
            }
        }
        assert_eq!(seen.len() as u64, PRODUCERS * ITEMS, "{}", queue.name());
        assert!(queue.is_empty());
    }
}

#[test]
fn test_stress_drains_after_mixed_operations() {
    const THREADS: u64 = 8;
    const OPERATIONS: u64 = 10_000;

    for queue in implementations() {
        let handles: Vec<_> = (0..THREADS)
            .map(|thread_id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut enqueued = 0u64;
                    let mut dequeued = 0u64;
                    for i in 0..OPERATIONS {
                        let value = thread_id * OPERATIONS + i;
                        match i % 3 {
                            0 => {
                                queue.enqueue(value);
                                enqueued += 1;
                            }
                            1 => {
                                if queue.try_dequeue().is_some() {
                                    dequeued += 1;
                                }
                            }
                            2 => {
                                queue.enqueue(value);
                                enqueued += 1;
                                if queue.try_dequeue().is_some() {
                                    dequeued += 1;
                                }
                            }
                            _ => unreachable!(),
                        }
                    }
                    (enqueued, dequeued)
                })
            })
            .collect();

        let (mut enqueued, mut dequeued) = (0, 0);
        for handle in handles {
            let (e, d) = handle.join().unwrap();
            enqueued += e;
            dequeued += d;
        }

        // Once enqueues stop, everything left must still be reachable.
        while queue.try_dequeue().is_some() {
            dequeued += 1;
        }
        assert_eq!(enqueued, dequeued, "{}", queue.name());
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }
}
