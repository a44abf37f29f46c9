use std::fs::File;
use std::io::{self, BufReader};

use anyhow::Context;

use denim_ops::{AppConfig, Replay};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    denim_observability::init(config.log_format);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut replay = Replay::new();

    let summary = match &config.events_path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening event feed {}", path.display()))?;
            tracing::info!(path = %path.display(), "replaying event feed");
            replay.run(BufReader::new(file), &mut out)?
        }
        None => {
            tracing::info!("replaying event feed from stdin");
            replay.run(io::stdin().lock(), &mut out)?
        }
    };

    tracing::info!(
        lines = summary.lines,
        assignments = summary.assignments,
        commitments = summary.commitments,
        rejected = summary.rejected,
        "replay finished"
    );
    Ok(())
}
