use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::Mode;

/// Installs the global subscriber.
///
/// In CLI mode logs go to stderr in compact form so they don't interleave with
/// prompts and result tables on stdout.
pub fn init_logging(level: Level, mode: Mode) -> Result<()> {
    match mode {
        Mode::Serve => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_line_number(true)
                .with_file(true)
                .with_thread_ids(true)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        Mode::Cli => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
