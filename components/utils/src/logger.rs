use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static FMT_LOG: OnceCell<()> = OnceCell::new();

/// Installs a stderr fmt subscriber once for the whole process. The level
/// comes from `RUST_LOG` when set, otherwise defaults to `debug`. Safe to
/// call from every test; later calls are no-ops.
pub fn install_fmt_log() {
    FMT_LOG.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
