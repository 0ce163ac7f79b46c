//! CLI command handlers, one per file.

mod checksum;
mod pack;
mod post;
mod up;
mod upload;

use anyhow::{bail, Result};
use scanflow_core::config::ScanflowConfig;
use scanflow_core::job::{AnsiRows, Group};

pub use checksum::run_checksum;
pub use pack::{parse_pack_target, run_pack, PackTarget};
pub use post::{run_post, ReleaseArgs};
pub use up::run_up;
pub use upload::run_upload;

fn new_group(cfg: &ScanflowConfig) -> Group {
    Group::with_progress_capacity(cfg.jobs.progress_capacity)
}

/// Run `group` with its rows on stderr.
async fn run_group(group: Group) -> Result<()> {
    group.run(AnsiRows::stderr()).await
}

/// A configured server address, or an error naming how to set it.
fn require_server<'a>(value: &'a str, key: &str, env: &str) -> Result<&'a str> {
    if value.is_empty() {
        bail!("{key} is not set (config.toml or {env})");
    }
    Ok(value)
}
