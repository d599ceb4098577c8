use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Read access to process-wide allocation counters.
pub trait HeapStats {
	/// Returns the count of bytes currently allocated and not yet freed.
	fn allocated(&self) -> usize;

	/// Returns the highest value [`allocated`](HeapStats::allocated) has reached.
	fn peak(&self) -> usize;

	/// Returns the number of successful allocation calls so far.
	fn allocations(&self) -> usize;
}

#[derive(Debug)]
/// An allocator that forwards to another [`GlobalAlloc`] and counts the bytes that pass through it.
///
/// Install it as the `#[global_allocator]` to get the equivalent of a garbage-collected runtime's
/// heap statistics. See methods on [`HeapStats`] for the counters.
///
/// # Examples
///
/// ```
/// # use mapprobe::{Heap, HeapStats};
/// # use std::alloc::{GlobalAlloc, Layout};
/// let heap = Heap::system();
/// let layout = Layout::new::<[u8; 128]>();
///
/// let ptr = unsafe { heap.alloc(layout) };
/// assert_eq!(heap.allocated(), 128);
///
/// unsafe { heap.dealloc(ptr, layout) };
/// assert_eq!(heap.allocated(), 0);
/// assert_eq!(heap.peak(), 128);
/// ```
pub struct Heap<A = System> {
	/// The allocator doing the actual work
	inner: A,

	/// Bytes currently handed out
	allocated: AtomicUsize,

	/// High-water mark of `allocated`
	peak: AtomicUsize,

	/// Successful `alloc`/`alloc_zeroed` calls
	allocations: AtomicUsize
}

impl Heap<System> {
	/// Initializes a [`Heap`] over the [`System`] allocator.
	pub const fn system() -> Self {
		Self::new(System)
	}
}

impl<A> Heap<A> {
	/// Initializes a [`Heap`] over the provided allocator with all counters at zero.
	pub const fn new(inner: A) -> Self {
		Self {
			inner,
			allocated: AtomicUsize::new(0),
			peak: AtomicUsize::new(0),
			allocations: AtomicUsize::new(0)
		}
	}

	fn grow(&self, size: usize) {
		let now = self.allocated.fetch_add(size, Ordering::Relaxed) + size;
		self.peak.fetch_max(now, Ordering::Relaxed);
	}

	fn shrink(&self, size: usize) {
		self.allocated.fetch_sub(size, Ordering::Relaxed);
	}
}

impl<A> HeapStats for Heap<A> {
	fn allocated(&self) -> usize {
		self.allocated.load(Ordering::Relaxed)
	}

	fn peak(&self) -> usize {
		self.peak.load(Ordering::Relaxed)
	}

	fn allocations(&self) -> usize {
		self.allocations.load(Ordering::Relaxed)
	}
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for Heap<A> {
	unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
		let ptr = unsafe { self.inner.alloc(layout) };

		// A null pointer means nothing was handed out
		if !ptr.is_null() {
			self.grow(layout.size());
			self.allocations.fetch_add(1, Ordering::Relaxed);
		}

		ptr
	}

	unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
		let ptr = unsafe { self.inner.alloc_zeroed(layout) };

		if !ptr.is_null() {
			self.grow(layout.size());
			self.allocations.fetch_add(1, Ordering::Relaxed);
		}

		ptr
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
		unsafe { self.inner.dealloc(ptr, layout) }
		self.shrink(layout.size());
	}

	unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
		let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };

		// On failure the old block is still live and still counted
		if !new_ptr.is_null() {
			if new_size >= layout.size() {
				self.grow(new_size - layout.size());
			} else {
				self.shrink(layout.size() - new_size);
			}
		}

		new_ptr
	}
}
