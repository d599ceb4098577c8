use std::alloc::System;
use std::io::{self, Write};

use anyhow::{Context, Result};
use mapprobe::{ENTRIES, Heap, HeapStats, Probe, Record};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static HEAP: Heap<System> = Heap::system();

fn main() -> Result<()> {
	init_tracing();

	let stdout = io::stdout();
	let mut out = stdout.lock();

	let report = Probe::new(&HEAP).run::<Record, _>(ENTRIES, &mut out)?;
	out.flush().context("flushing stdout")?;

	info!(
		baseline = report.baseline.allocated,
		filled = report.filled.allocated,
		collected = report.collected.allocated,
		peak = HEAP.peak(),
		"done"
	);

	Ok(())
}

/// Logs go to stderr; stdout carries only the three report lines.
fn init_tracing() {
	use tracing_subscriber::{fmt, EnvFilter};

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	let fmt_layer = fmt::layer()
		.with_writer(io::stderr)
		.with_target(false)
		.with_level(true)
		.compact();

	let _ = tracing_subscriber::registry()
		.with(filter)
		.with(fmt_layer)
		.try_init();
}
