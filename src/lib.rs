//! Measures how much heap a [`HashMap`](std::collections::HashMap) holds on to
//! after it has been filled with fixed-size records and emptied again.
//!
//! The pieces:
//! - [`Heap`]: a counting global allocator, the source of the numbers
//! - [`Container`]: the map under test
//! - [`Probe`]: runs the snapshot/fill/snapshot/drain/collect/snapshot sequence

mod container;
mod heap;
mod memory;
mod probe;

pub use container::Container;
pub use heap::{Heap, HeapStats};
pub use memory::{MemorySnapshot, resident_bytes, trim};
pub use probe::{Probe, ProbeReport};

use mapprobe_macros::impl_payload;

/// The size of a single [`Record`] (in bytes)
pub const RECORD_SIZE: usize = 128;

/// The number of entries the benchmark inserts and removes
pub const ENTRIES: usize = 20_000_000;

/// Bytes in one reported megabyte
pub const MEGABYTE: usize = 1024 * 1024;

/// The opaque block stored under every key. Its contents are never read.
pub type Record = [u8; RECORD_SIZE];

/// Represents any fixed-size value that can be stored in a [`Container`].
///
/// Implementations are generated with `impl_payload!`.
///
/// # Examples
///
/// ```
/// # use mapprobe::{Payload, Record, RECORD_SIZE};
/// let record = Record::zeroed();
///
/// assert_eq!(Record::SIZE, RECORD_SIZE);
/// assert!(record.iter().all(|&b| b == 0));
/// ```
///
/// # Safety
/// The all-zero bit pattern must be a valid value of the implementing type.
pub unsafe trait Payload: Copy + 'static {
	/// The number of bytes a single value occupies
	const SIZE: usize = std::mem::size_of::<Self>();

	/// Returns a value with every byte set to zero.
	fn zeroed() -> Self;
}

impl_payload!(<const N: usize> Payload for [u8; N]);
impl_payload!(Payload for {i8, i16, i32, i64, i128});
impl_payload!(Payload for {u8, u16, u32, u64, u128, usize});
