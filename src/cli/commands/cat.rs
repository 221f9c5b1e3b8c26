//! CLI command for reading one archive entry

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Result};

use crate::archive::{self, Archive};

pub fn execute(source: &Path, path: &str, output: Option<&Path>) -> Result<()> {
    let mut archive = archive::open(source)?;
    if !archive.is_valid() {
        bail!("{} is not a valid archive", source.display());
    }
    archive.parse_entries()?;

    let data = archive.read_file(path)?;
    match output {
        Some(out) => {
            std::fs::write(out, &data)?;
            eprintln!("wrote {} bytes to {}", data.len(), out.display());
        }
        None => std::io::stdout().write_all(&data)?,
    }
    Ok(())
}
