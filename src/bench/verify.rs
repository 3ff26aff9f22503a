//! Item tagging and post-run verification.
//!
//! Each produced item carries its producer id in the high 32 bits and the
//! producer's sequence number in the low 32 bits, so every item of a run is
//! distinct and its origin is recoverable.

use crate::{Error, Result};

const PRODUCER_SHIFT: u32 = 32;
const SEQUENCE_MASK: u64 = (1 << PRODUCER_SHIFT) - 1;

/// Tag for the `seq`-th item of producer `producer`.
#[inline]
pub fn tag(producer: usize, seq: usize) -> u64 {
    ((producer as u64) << PRODUCER_SHIFT) | (seq as u64 & SEQUENCE_MASK)
}

/// Split a tag into `(producer, seq)`.
#[inline]
pub fn split(item: u64) -> (usize, usize) {
    (
        (item >> PRODUCER_SHIFT) as usize,
        (item & SEQUENCE_MASK) as usize,
    )
}

/// Check the items each consumer received, in the order it received them.
///
/// Fails if an item was consumed twice, never consumed, or does not belong
/// to the run, or if any consumer saw one producer's items out of order.
pub fn verify(consumed: &[Vec<u64>], producers: usize, items_per_producer: usize) -> Result<()> {
    let mut seen = vec![false; producers * items_per_producer];

    for (consumer, items) in consumed.iter().enumerate() {
        let mut last_seq: Vec<Option<usize>> = vec![None; producers];

        for &item in items {
            let (producer, seq) = split(item);
            if producer >= producers || seq >= items_per_producer {
                return Err(Error::Verification(format!(
                    "consumer {consumer} received foreign item {producer}:{seq}"
                )));
            }

            let slot = &mut seen[producer * items_per_producer + seq];
            if *slot {
                return Err(Error::Verification(format!(
                    "item {producer}:{seq} consumed more than once"
                )));
            }
            *slot = true;

            if let Some(previous) = last_seq[producer] {
                if seq <= previous {
                    return Err(Error::Verification(format!(
                        "consumer {consumer} received item {producer}:{seq} after {producer}:{previous}"
                    )));
                }
            }
            last_seq[producer] = Some(seq);
        }
    }

    let missing = seen.iter().filter(|&&taken| !taken).count();
    if missing > 0 {
        return Err(Error::Verification(format!(
            "{missing} of {} items never consumed",
            seen.len()
        )));
    }
    Ok(())
}
