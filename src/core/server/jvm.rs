// ─── JVM Options ───
// The fixed flag set the server runtime is launched with. One named
// constant set, not scattered literals.

const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

/// Fraction of physical memory handed to the server heap: 80 %.
const HEAP_FRACTION_NUM: u64 = 8;
const HEAP_FRACTION_DEN: u64 = 10;

/// G1 tuning flags applied to every server launch. Pause-time target
/// 200 ms, 8 MB regions, and conservative reservation/occupancy
/// thresholds suited to long-running Minecraft servers.
pub const GC_FLAGS: &[&str] = &[
    "-XX:+UseG1GC",
    "-XX:MaxGCPauseMillis=200",
    "-XX:+ParallelRefProcEnabled",
    "-XX:+DisableExplicitGC",
    "-XX:G1HeapRegionSize=8M",
    "-XX:G1ReservePercent=20",
    "-XX:G1HeapWastePercent=5",
    "-XX:InitiatingHeapOccupancyPercent=15",
];

/// Immutable runtime configuration passed into the supervisor's launch.
#[derive(Debug, Clone)]
pub struct JvmOptions {
    /// Heap ceiling in whole GiB.
    pub max_heap_gb: u64,
    /// Fixed initial heap in GiB.
    pub initial_heap_gb: u64,
}

impl JvmOptions {
    /// Derive options from the host: 80 % of total physical memory,
    /// rounded down to whole gigabytes, with a fixed 1 GiB initial heap.
    pub fn detect() -> Self {
        let mut system = sysinfo::System::new();
        system.refresh_memory();
        Self::for_total_memory(system.total_memory())
    }

    pub fn for_total_memory(total_bytes: u64) -> Self {
        Self {
            max_heap_gb: max_heap_gb(total_bytes),
            initial_heap_gb: 1,
        }
    }

    /// Full argument list for the `java` invocation, heap sizing first.
    pub fn as_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("-Xms{}G", self.initial_heap_gb),
            format!("-Xmx{}G", self.max_heap_gb),
        ];
        args.extend(GC_FLAGS.iter().map(|f| f.to_string()));
        args
    }
}

/// 80 % of total memory, floored to whole GiB, never below 1.
fn max_heap_gb(total_bytes: u64) -> u64 {
    (total_bytes * HEAP_FRACTION_NUM / HEAP_FRACTION_DEN / BYTES_PER_GIB).max(1)
}
