use std::collections::HashMap;

use tracing::debug;

use crate::{Payload, Record, memory};

#[derive(Debug)]
/// A map from integer keys to fixed-size [`Payload`] values, i.e. the structure being measured.
///
/// # Examples
///
/// ```
/// # use mapprobe::{Container, Record};
/// let mut container: Container<Record> = Container::new();
///
/// container.fill(1000);
/// assert_eq!(container.len(), 1000);
///
/// container.drain(1000);
/// assert!(container.is_empty());
/// assert!(container.capacity() >= 1000); // Storage is still held...
///
/// container.collect();
/// assert_eq!(container.capacity(), 0); // ...until it is collected
/// ```
pub struct Container<P: Payload = Record> {
	entries: HashMap<usize, P>
}

impl<P: Payload> Container<P> {
	/// Initializes an empty [`Container`] without allocating.
	pub fn new() -> Self {
		Self {
			entries: HashMap::new()
		}
	}

	/// Inserts keys `0..n`, each mapped to a zero-initialized value.
	///
	/// Running out of memory here aborts the process.
	pub fn fill(&mut self, n: usize) {
		for key in 0..n {
			self.entries.insert(key, P::zeroed());
		}
	}

	/// Removes keys `0..n`. Keys that are not present are skipped.
	pub fn drain(&mut self, n: usize) {
		for key in 0..n {
			self.entries.remove(&key);
		}
	}

	/// Releases the storage left behind by removed entries and returns freed pages to the OS.
	pub fn collect(&mut self) {
		let before = self.entries.capacity();
		self.entries.shrink_to_fit();

		let trimmed = memory::trim();
		debug!(before, after = self.entries.capacity(), trimmed, "collected container");
	}

	/// Returns the value stored under `key`.
	pub fn get(&self, key: usize) -> Option<&P> {
		self.entries.get(&key)
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if the container holds no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns the number of entries the container can hold without reallocating.
	pub fn capacity(&self) -> usize {
		self.entries.capacity()
	}
}

impl<P: Payload> Default for Container<P> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::RECORD_SIZE;
	use proptest::prelude::*;

	#[test]
	fn fill_maps_every_key_to_a_zeroed_record() {
		let mut container: Container<Record> = Container::new();
		container.fill(1000);

		assert_eq!(container.len(), 1000);

		for key in 0..1000 {
			let record = container.get(key).unwrap();
			assert_eq!(record.len(), RECORD_SIZE);
			assert!(record.iter().all(|&b| b == 0));
		}

		assert!(container.get(1000).is_none());
	}

	#[test]
	fn drain_twice_is_a_no_op() {
		let mut container: Container<Record> = Container::new();
		container.fill(500);

		container.drain(500);
		assert_eq!(container.len(), 0);

		container.drain(500);
		assert_eq!(container.len(), 0);
	}

	#[test]
	fn drain_empty_container() {
		let mut container: Container<u64> = Container::default();
		container.drain(10);

		assert!(container.is_empty());
	}

	#[test]
	fn collect_keeps_remaining_entries() {
		let mut container: Container<u32> = Container::new();
		container.fill(1000);
		container.drain(900);
		container.collect();

		assert_eq!(container.len(), 100);
		assert!(container.capacity() >= 100);
		assert!(container.capacity() < 1000);
		assert!((900..1000).all(|key| container.get(key) == Some(&0)));
	}

	#[test]
	fn collect_empty_releases_storage() {
		let mut container: Container<Record> = Container::new();
		container.fill(1000);
		container.drain(1000);
		assert!(container.capacity() >= 1000);

		container.collect();
		assert_eq!(container.capacity(), 0);
	}

	proptest! {
		#[test]
		fn fill_then_drain(n in 0usize..4096) {
			let mut container: Container<Record> = Container::new();

			container.fill(n);
			prop_assert_eq!(container.len(), n);

			container.drain(n);
			prop_assert_eq!(container.len(), 0);
		}

		#[test]
		fn partial_drain_leaves_the_tail(n in 0usize..2048, m in 0usize..2048) {
			let mut container: Container<u8> = Container::new();

			container.fill(n);
			container.drain(m);

			prop_assert_eq!(container.len(), n.saturating_sub(m));
			prop_assert!((m..n).all(|key| container.get(key).is_some()));
		}
	}
}
