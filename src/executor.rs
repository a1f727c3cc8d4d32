//! Runs one build and captures its artifact.
use crate::context::BuildSide;
use crate::error::CheckError;
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::Command;

pub const SHELL: &str = "/bin/sh";

/// Run `side`'s command in its tree and copy `artifact` into `sink`.
///
/// Standard output and error are inherited so build logs stay visible. The
/// environment is exactly `side.env`; nothing leaks in from this process.
pub fn build(side: &BuildSide, artifact: &Path, sink: &Path) -> Result<(), CheckError> {
    let script = side.shell_command();
    tracing::info!(tree = %side.tree.display(), command = %script, "start build");
    let status = Command::new(SHELL)
        .arg("-c")
        .arg(&script)
        .current_dir(&side.tree)
        .env_clear()
        .envs(&side.env)
        .status()
        .map_err(|err| CheckError::Build(format!("spawn {SHELL}: {err}")))?;
    if !status.success() {
        return Err(CheckError::Build(format!(
            "`{script}` in {} exited with {status}",
            side.tree.display()
        )));
    }

    let built = side.tree.join(artifact);
    if !built.is_file() {
        return Err(CheckError::Build(format!(
            "artifact {} not found after build",
            built.display()
        )));
    }
    capture(&built, sink)?;
    tracing::info!(artifact = %built.display(), sink = %sink.display(), "captured artifact");
    Ok(())
}

fn capture(built: &Path, sink: &Path) -> anyhow::Result<()> {
    let mut input = File::open(built).with_context(|| format!("open {}", built.display()))?;
    let output = File::create(sink).with_context(|| format!("create {}", sink.display()))?;
    let mut writer = BufWriter::new(output);
    io::copy(&mut input, &mut writer).with_context(|| format!("copy {}", built.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", sink.display()))?;
    Ok(())
}
