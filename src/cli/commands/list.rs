//! CLI command for listing archive contents

use std::path::Path;

use anyhow::{bail, Result};

use crate::archive::{self, Archive};

pub fn execute(source: &Path, root: Option<&str>) -> Result<()> {
    let mut archive = archive::open(source)?;
    if !archive.is_valid() {
        bail!("{} is not a valid archive", source.display());
    }
    archive.parse_entries()?;

    let root = root.unwrap_or("");
    if archive.find_dir(root).is_none() {
        bail!("directory not found: {root:?}");
    }

    let mut count = 0usize;
    let mut pending = vec![root.to_string()];
    while let Some(dir_path) = pending.pop() {
        let Some(dir) = archive.find_dir(&dir_path) else {
            // Listed in a parent but carrying no directory entry of its own
            continue;
        };
        for file in &dir.files {
            println!("{}", join(&dir_path, file));
            count += 1;
        }
        for subdir in &dir.subdirs {
            pending.push(join(&dir_path, subdir));
        }
    }

    println!();
    println!("{count} files");
    Ok(())
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
