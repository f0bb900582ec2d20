//! Launching detached watcher tasks and deadline timers.
//!
//! Watchers never run on the caller's runtime: a runtime the caller shuts
//! down would drop them and leave their signals pending forever. They run on
//! a process-wide runtime owned by this crate, or on dedicated threads.

use std::future::Future;
use std::io;
use std::sync::OnceLock;
use std::time::Instant;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::{SpawnMode, WatcherConfig};
use crate::context::DoneSignal;

/// The crate-owned runtime. Lives in a static, so it is never shut down.
fn shared_runtime(config: &WatcherConfig) -> Option<&'static Handle> {
    static SHARED: OnceLock<Option<Runtime>> = OnceLock::new();
    SHARED
        .get_or_init(|| {
            let built = Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name(config.thread_name.clone())
                .enable_time()
                .build();
            match built {
                Ok(runtime) => Some(runtime),
                Err(e) => {
                    tracing::error!(
                        "Failed to start shared watcher runtime, using dedicated threads: {}",
                        e
                    );
                    None
                }
            }
        })
        .as_ref()
        .map(Runtime::handle)
}

fn runtime_handle(config: &WatcherConfig) -> Option<&'static Handle> {
    match config.spawn {
        SpawnMode::Shared => shared_runtime(config),
        SpawnMode::Thread => None,
    }
}

/// Run `watcher` to completion in the background.
pub(crate) fn spawn_watcher<F>(config: &WatcherConfig, watcher: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Some(handle) = runtime_handle(config) {
        handle.spawn(watcher);
        return Ok(());
    }

    std::thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || futures::executor::block_on(watcher))
        .map(drop)
}

/// Call `on_expire` at `deadline` unless `until` fires first.
pub(crate) fn spawn_timer<F>(
    config: &WatcherConfig,
    deadline: Instant,
    until: DoneSignal,
    on_expire: F,
) -> io::Result<()>
where
    F: FnOnce() + Send + 'static,
{
    if let Some(handle) = runtime_handle(config) {
        handle.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline.into()) => on_expire(),
                _ = until.fired() => {}
            }
        });
        return Ok(());
    }

    std::thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !until.wait_timeout(remaining) {
                on_expire();
            }
        })
        .map(drop)
}
