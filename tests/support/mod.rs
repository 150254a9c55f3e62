use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn mocks_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/mocks")
}

pub fn mock(relative: &str) -> PathBuf {
    mocks_dir().join(relative)
}

/// The CLI binary built alongside the integration tests.
pub fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_affiliate-links"));
    cmd.env_remove("AFFILIATE_LINKS_ROOT")
        .env_remove("AFFILIATE_LINKS_CONFIG")
        .env("RUST_LOG", "warn");
    cmd
}

pub fn run(mut cmd: Command) -> Result<Output> {
    cmd.output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

/// Copy a mock file into `dir` under `name`.
pub fn stage(dir: &Path, relative: &str, name: &str) -> Result<PathBuf> {
    let dest = dir.join(name);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(mock(relative), &dest)
        .with_context(|| format!("copying {relative} to {}", dest.display()))?;
    Ok(dest)
}
