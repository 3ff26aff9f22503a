//! Per-run results.

use core::fmt;
use std::io::{self, Write};
use std::time::Duration;

const SEPARATOR_WIDTH: usize = 50;

/// How producer and consumer work is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheduling {
    /// One OS thread per producer and per consumer, joined at the end
    Dedicated,
    /// Jobs submitted to a shared worker pool, completion signalled by latch
    Pooled,
}

impl Scheduling {
    /// Both models, in the order each run executes them
    pub const ALL: [Scheduling; 2] = [Scheduling::Dedicated, Scheduling::Pooled];

    /// Label used in report lines
    pub const fn label(self) -> &'static str {
        match self {
            Scheduling::Dedicated => "Sequential Queue",
            Scheduling::Pooled => "ThreadPool Queue",
        }
    }
}

impl fmt::Display for Scheduling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one (queue, producers, consumers, scheduling) run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Queue name from the registry
    pub queue: &'static str,
    /// Scheduling model used
    pub scheduling: Scheduling,
    /// Producer count
    pub producers: usize,
    /// Consumer count
    pub consumers: usize,
    /// Successful enqueues
    pub pushed: usize,
    /// Successful dequeues
    pub popped: usize,
    /// Items the producers were asked to push
    pub expected: usize,
    /// Wall-clock time from first spawn to completion
    pub elapsed: Duration,
}

impl RunReport {
    /// Every pushed item was popped.
    pub fn is_balanced(&self) -> bool {
        self.pushed == self.popped
    }

    /// Every expected item went through the queue.
    pub fn is_complete(&self) -> bool {
        self.is_balanced() && self.popped == self.expected
    }

    /// Elapsed time in whole milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Items popped per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.popped as f64 / secs
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - Producers: {}, Consumers: {}, Pushed: {}, Popped: {} - Elapsed time: {} ms",
            self.queue,
            self.scheduling,
            self.producers,
            self.consumers,
            self.pushed,
            self.popped,
            self.elapsed_ms()
        )
    }
}

/// Write `report` as it appears on the console: each queue's pair of runs
/// is fenced by dashed lines, with a blank line after the pair.
pub fn write_report<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    match report.scheduling {
        Scheduling::Dedicated => {
            writeln!(out, "{separator}")?;
            writeln!(out, "{report}")
        }
        Scheduling::Pooled => {
            writeln!(out, "{report}")?;
            writeln!(out, "{separator}")?;
            writeln!(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(pushed: usize, popped: usize) -> RunReport {
        RunReport {
            queue: "LockFreeQueue",
            scheduling: Scheduling::Pooled,
            producers: 2,
            consumers: 4,
            pushed,
            popped,
            expected: 1_000_000,
            elapsed: Duration::from_millis(1234),
        }
    }

    #[test]
    fn test_report_line_format() {
        assert_eq!(
            report(1_000_000, 1_000_000).to_string(),
            "LockFreeQueue - ThreadPool Queue - Producers: 2, Consumers: 4, \
             Pushed: 1000000, Popped: 1000000 - Elapsed time: 1234 ms"
        );
    }

    #[test]
    fn test_balance() {
        assert!(report(10, 10).is_balanced());
        assert!(!report(10, 10).is_complete());
        assert!(report(1_000_000, 1_000_000).is_complete());
        assert!(!report(10, 9).is_balanced());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Scheduling::Dedicated.to_string(), "Sequential Queue");
        assert_eq!(Scheduling::Pooled.label(), "ThreadPool Queue");
        assert_eq!(Scheduling::ALL[0], Scheduling::Dedicated);
    }

    #[test]
    fn test_write_report_fences_each_pair() {
        let pooled = report(8, 8);
        let dedicated = RunReport {
            scheduling: Scheduling::Dedicated,
            ..pooled.clone()
        };

        let mut out = Vec::new();
        write_report(&mut out, &dedicated).unwrap();
        write_report(&mut out, &pooled).unwrap();
        let text = String::from_utf8(out).unwrap();

        let dashes = "-".repeat(50);
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], dashes);
        assert!(lines[1].starts_with("LockFreeQueue - Sequential Queue - "));
        assert!(lines[2].starts_with("LockFreeQueue - ThreadPool Queue - "));
        assert_eq!(lines[3], dashes);
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "");
    }

    #[test]
    fn test_throughput() {
        let r = report(1_000_000, 1_000_000);
        assert!((r.throughput() - 1_000_000.0 / 1.234).abs() < 1.0);
        let instant = RunReport {
            elapsed: Duration::ZERO,
            ..r
        };
        assert_eq!(instant.throughput(), 0.0);
    }
}
