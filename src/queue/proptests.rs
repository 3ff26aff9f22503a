//! Property-based tests for the queue family using proptest
//!
//! These tests drive the implementations with generated operation scripts
//! and check that they behave like a plain FIFO and like each other.

use crate::queue::{BlockingQueue, ConcurrentQueue, LockFreeQueue, ReferenceQueue};
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

/// One step of a single-threaded script
#[derive(Debug, Clone)]
enum Op {
    Enqueue(i64),
    Dequeue,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        7 => any::<i64>().prop_map(Op::Enqueue),
        3 => Just(Op::Dequeue),
    ]
}

/// Run `script` and record every observable result.
fn observe(queue: &dyn ConcurrentQueue<i64>, script: &[Op]) -> Vec<(Option<i64>, usize, bool)> {
    script
        .iter()
        .map(|op| {
            let popped = match op {
                Op::Enqueue(value) => {
                    queue.enqueue(*value);
                    None
                }
                Op::Dequeue => queue.try_dequeue(),
            };
            (popped, queue.len(), queue.is_empty())
        })
        .collect()
}

mod single_thread_properties {
    use super::*;

    proptest! {
        #[test]
        fn test_fifo_ordering_single_thread(
            batches in prop::collection::vec(
                prop::collection::vec(any::<i32>(), 1..10),
                1..5
            )
        ) {
            let lock_free = LockFreeQueue::new();
            let blocking = BlockingQueue::new();
            let mut expected = Vec::new();

            for batch in &batches {
                for &value in batch {
                    lock_free.enqueue(value);
                    blocking.enqueue(value);
                    expected.push(value);
                }
            }

            for expected_value in expected {
                prop_assert_eq!(lock_free.try_dequeue(), Some(expected_value));
                prop_assert_eq!(blocking.try_dequeue(), Some(expected_value));
            }

            prop_assert!(lock_free.is_empty());
            prop_assert!(blocking.is_empty());
        }

        #[test]
        fn test_matches_vecdeque_model(
            script in prop::collection::vec(op_strategy(), 1..200)
        ) {
            let queue = LockFreeQueue::new();
            let mut model = VecDeque::new();

            for op in &script {
                match op {
                    Op::Enqueue(value) => {
                        queue.enqueue(*value);
                        model.push_back(*value);
                    }
                    Op::Dequeue => {
                        prop_assert_eq!(queue.try_dequeue(), model.pop_front());
                    }
                }
                prop_assert_eq!(queue.len(), model.len());
                prop_assert_eq!(queue.is_empty(), model.is_empty());
                prop_assert_eq!(queue.peek(), model.front().copied());
            }
        }

        #[test]
        fn test_cross_implementation_equivalence(
            script in prop::collection::vec(op_strategy(), 0..200)
        ) {
            let lock_free = observe(&LockFreeQueue::<i64>::new(), &script);
            let blocking = observe(&BlockingQueue::<i64>::new(), &script);
            let reference = observe(&ReferenceQueue::<i64>::new(), &script);

            prop_assert_eq!(&lock_free, &blocking);
            prop_assert_eq!(&lock_free, &reference);
        }

        #[test]
        fn test_no_memory_leaks(
            values in prop::collection::vec(any::<i32>(), 1..100)
        ) {
            use std::sync::atomic::{AtomicUsize, Ordering};

            // Shared by every generated case; each case counts its own delta.
            static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

            struct DropTracker;

            impl Drop for DropTracker {
                fn drop(&mut self) {
                    DROP_COUNT.fetch_add(1, Ordering::Relaxed);
                }
            }

            let before = DROP_COUNT.load(Ordering::Relaxed);
            let queue = LockFreeQueue::new();
            for _ in &values {
                queue.enqueue(DropTracker);
            }
            for _ in 0..values.len() / 2 {
                drop(queue.try_dequeue());
            }
            drop(queue);

            prop_assert_eq!(DROP_COUNT.load(Ordering::Relaxed) - before, values.len());
        }
    }
}

mod concurrent_properties {
    use super::*;

    fn run_concurrent(
        queue: Arc<dyn ConcurrentQueue<usize>>,
        num_threads: usize,
        operations_per_thread: usize,
    ) -> Vec<usize> {
        let mut handles = vec![];

        for thread_id in 0..num_threads {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                for i in 0..operations_per_thread {
                    queue.enqueue(thread_id * operations_per_thread + i);
                }
                Vec::new()
            }));
        }

        for _ in 0..num_threads {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                let mut received = Vec::new();
                while received.len() < operations_per_thread {
                    match queue.try_dequeue() {
                        Some(value) => received.push(value),
                        None => thread::yield_now(),
                    }
                }
                received
            }));
        }

        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_concurrent_lock_free_queue(
            num_threads in 2usize..6,
            operations_per_thread in 10usize..200
        ) {
            let received = run_concurrent(
                Arc::new(LockFreeQueue::<usize>::new()),
                num_threads,
                operations_per_thread,
            );

            let expected_total = num_threads * operations_per_thread;
            let mut sorted = received.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(received.len(), expected_total);
            prop_assert_eq!(sorted, (0..expected_total).collect::<Vec<_>>());
        }

        #[test]
        fn test_concurrent_blocking_queue(
            num_threads in 2usize..6,
            operations_per_thread in 10usize..200
        ) {
            let received = run_concurrent(
                Arc::new(BlockingQueue::<usize>::new()),
                num_threads,
                operations_per_thread,
            );

            let expected_total = num_threads * operations_per_thread;
            let mut sorted = received.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(received.len(), expected_total);
            prop_assert_eq!(sorted, (0..expected_total).collect::<Vec<_>>());
        }
    }
}
