//! CLI command for pack version and locale info

use std::path::PathBuf;

use anyhow::Result;

use crate::locale;

pub fn execute(sources: &[PathBuf]) -> Result<()> {
    let mut view = super::open_view(sources)?;

    match locale::read_version(&mut view)? {
        Some(version) => println!("pack version: {version}"),
        None => println!("pack version: unknown"),
    }
    let table = locale::read_locale(&mut view)?;
    println!("locale entries: {}", table.len());
    Ok(())
}
