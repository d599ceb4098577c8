use std::fmt;

use anyhow::{Context, Result, anyhow};
use sysinfo::System;
use tracing::debug;

use crate::{HeapStats, MEGABYTE};

#[cfg(all(target_os = "linux", target_env = "gnu"))]
extern "C" {
	fn malloc_trim(pad: usize) -> std::os::raw::c_int;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A point-in-time reading of the process memory usage.
pub struct MemorySnapshot {
	/// Bytes currently allocated through the counting allocator
	pub allocated: usize,

	/// Resident set size as reported by the OS, if it could be read
	pub resident: Option<u64>
}

impl MemorySnapshot {
	/// Reads the allocator counters and then the resident set size.
	///
	/// The allocator is read first so that the bookkeeping done while querying the OS
	/// does not end up in the number.
	pub fn take<S: HeapStats + ?Sized>(stats: &S) -> Self {
		let allocated = stats.allocated();

		let resident = match resident_bytes() {
			Ok(bytes) => Some(bytes),
			Err(err) => {
				debug!(error = %err, "resident set size unavailable");
				None
			}
		};

		Self {
			allocated,
			resident
		}
	}

	/// Returns the allocated byte count in whole megabytes, rounded down.
	///
	/// # Examples
	///
	/// ```
	/// # use mapprobe::MemorySnapshot;
	/// let snapshot = MemorySnapshot { allocated: 3 * 1024 * 1024 - 1, resident: None };
	///
	/// assert_eq!(snapshot.megabytes(), 2);
	/// assert_eq!(snapshot.to_string(), "2 mb");
	/// ```
	pub fn megabytes(&self) -> usize {
		self.allocated / MEGABYTE
	}
}

impl fmt::Display for MemorySnapshot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} mb", self.megabytes())
	}
}

/// Returns the resident set size of the current process (in bytes).
pub fn resident_bytes() -> Result<u64> {
	let pid = sysinfo::get_current_pid().map_err(|err| anyhow!(err))?;

	let mut system = System::new();
	system.refresh_process(pid);

	system
		.process(pid)
		.map(|process| process.memory())
		.with_context(|| format!("process {pid} not found"))
}

/// Asks the system allocator to return freed pages to the OS.
///
/// Returns `true` if any memory was released. Only glibc supports this; elsewhere it does nothing.
pub fn trim() -> bool {
	#[cfg(all(target_os = "linux", target_env = "gnu"))]
	{
		unsafe { malloc_trim(0) != 0 }
	}

	#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
	{
		false
	}
}
