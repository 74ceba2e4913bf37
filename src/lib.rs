pub use defish_core as core;
pub use defish_imgproc as imgproc;

/// Initialize a single global Rayon thread pool for map building and
/// resampling.
///
/// Call this once at application startup before heavy correction work.
/// Repeated calls are idempotent and return the first initialization
/// result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `DEFISH_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> Result<(), String> {
    defish_core::init_global_thread_pool(num_threads)
}
