use std::hint::black_box;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{Container, HeapStats, MemorySnapshot, Payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The three readings taken by [`Probe::run`].
pub struct ProbeReport {
	/// Before anything was inserted
	pub baseline: MemorySnapshot,

	/// After the container was filled
	pub filled: MemorySnapshot,

	/// After the container was drained and collected
	pub collected: MemorySnapshot,

	/// Container size right after filling
	pub filled_len: usize,

	/// Container size right after draining
	pub drained_len: usize
}

#[derive(Debug)]
/// Runs the fill/drain workload and reports memory readings from a [`HeapStats`] source.
pub struct Probe<'stats, S: HeapStats + ?Sized> {
	stats: &'stats S
}

impl<'stats, S: HeapStats + ?Sized> Probe<'stats, S> {
	/// Initializes a [`Probe`] reading from the provided counters.
	pub fn new(stats: &'stats S) -> Self {
		Self { stats }
	}

	/// Takes a snapshot without printing it.
	pub fn snapshot(&self) -> MemorySnapshot {
		MemorySnapshot::take(self.stats)
	}

	/// Takes a snapshot and writes it to `out` as a `<n> mb` line.
	///
	/// # Examples
	///
	/// ```
	/// # use mapprobe::{Heap, Probe};
	/// let heap = Heap::system(); // Not installed as the global allocator, so it stays at zero
	/// let mut out = vec![];
	///
	/// let snapshot = Probe::new(&heap).report(&mut out).unwrap();
	///
	/// assert_eq!(snapshot.allocated, 0);
	/// assert_eq!(out, b"0 mb\n");
	/// ```
	pub fn report<W: Write>(&self, out: &mut W) -> Result<MemorySnapshot> {
		let snapshot = self.snapshot();

		writeln!(out, "{snapshot}").context("writing memory report")?;
		debug!(
			allocated = snapshot.allocated,
			resident = ?snapshot.resident,
			peak = self.stats.peak(),
			allocations = self.stats.allocations(),
			"memory snapshot"
		);

		Ok(snapshot)
	}

	/// Reports, fills a fresh container with `n` entries, reports, drains and collects it,
	/// and reports a final time.
	///
	/// The container is kept alive until after the last reading.
	pub fn run<P: Payload, W: Write>(&self, n: usize, out: &mut W) -> Result<ProbeReport> {
		let mut container: Container<P> = Container::new();
		let baseline = self.report(out)?;

		container.fill(n);
		let filled_len = container.len();
		info!(entries = filled_len, capacity = container.capacity(), payload = P::SIZE, "filled container");
		let filled = self.report(out)?;

		container.drain(n);
		let drained_len = container.len();
		info!(entries = drained_len, capacity = container.capacity(), "drained container");

		container.collect();
		let collected = self.report(out)?;

		// Reachable until here so the final reading is taken with it still in scope
		black_box(&container);

		Ok(ProbeReport {
			baseline,
			filled,
			collected,
			filled_len,
			drained_len
		})
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;
	use crate::{MEGABYTE, Record};

	/// Advances by one megabyte on every read
	struct Ticking(Cell<usize>);

	impl HeapStats for Ticking {
		fn allocated(&self) -> usize {
			let now = self.0.get();
			self.0.set(now + MEGABYTE);
			now
		}

		fn peak(&self) -> usize {
			self.0.get()
		}

		fn allocations(&self) -> usize {
			0
		}
	}

	#[test]
	fn run_prints_three_lines() {
		let stats = Ticking(Cell::new(0));
		let mut out = vec![];

		let report = Probe::new(&stats).run::<Record, _>(100, &mut out).unwrap();

		assert_eq!(String::from_utf8(out).unwrap(), "0 mb\n1 mb\n2 mb\n");
		assert_eq!(report.filled_len, 100);
		assert_eq!(report.drained_len, 0);
		assert_eq!(report.collected.megabytes(), 2);
	}

	#[test]
	fn run_with_no_entries() {
		let stats = Ticking(Cell::new(0));
		let mut out = vec![];

		let report = Probe::new(&stats).run::<u8, _>(0, &mut out).unwrap();

		assert_eq!(report.filled_len, 0);
		assert_eq!(report.drained_len, 0);
		assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 3);
	}

	#[test]
	fn write_failure_is_an_error() {
		struct Closed;

		impl Write for Closed {
			fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
				Err(std::io::ErrorKind::BrokenPipe.into())
			}

			fn flush(&mut self) -> std::io::Result<()> {
				Ok(())
			}
		}

		let stats = Ticking(Cell::new(0));
		let err = Probe::new(&stats).report(&mut Closed).unwrap_err();

		assert!(err.to_string().contains("writing memory report"));
	}
}
