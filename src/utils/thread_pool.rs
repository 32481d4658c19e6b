use once_cell::sync::OnceCell;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;

static THREAD_POOL: OnceCell<Arc<rayon::ThreadPool>> = OnceCell::new();

/// Initialize the global thread pool with the specified number of threads
///
/// # Errors
///
/// Returns an error if the pool was already initialized or cannot be built
pub fn init_thread_pool(num_threads: usize) -> anyhow::Result<()> {
    let pool = build_pool(num_threads)?;

    THREAD_POOL
        .set(Arc::new(pool))
        .map_err(|_| anyhow::anyhow!("Thread pool already initialized"))?;

    Ok(())
}

fn build_pool(num_threads: usize) -> anyhow::Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads.max(1))
        .thread_name(|i| format!("tripwire-walker-{i}"))
        .build()
        .map_err(Into::into)
}

/// Get the global thread pool, initializing with default settings if needed
///
/// # Errors
///
/// Returns an error if the default pool cannot be created
pub fn get_thread_pool() -> anyhow::Result<Arc<rayon::ThreadPool>> {
    THREAD_POOL
        .get_or_try_init(|| build_pool(default_threads()).map(Arc::new))
        .cloned()
}

/// Run a function in the configured thread pool, or inline if no pool can be built
pub fn run_in_pool<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    match get_thread_pool() {
        Ok(pool) => pool.install(f),
        Err(e) => {
            tracing::warn!(error = %e, "thread pool unavailable, running inline");
            f()
        }
    }
}

/// Configure the thread pool from config
///
/// # Errors
///
/// Returns an error if the thread pool has already been initialized
pub fn configure_from_config(config: &crate::config::Config) -> anyhow::Result<()> {
    if config.scan.threads > 0 {
        init_thread_pool(config.scan.threads)?;
    }
    Ok(())
}

/// Default worker count: available parallelism, capped at 8.
#[must_use]
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(8)
}
