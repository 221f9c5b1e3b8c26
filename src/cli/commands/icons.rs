//! CLI command for decoding the map icon set

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;

use crate::cli::progress::{print_done, print_step, LOOKING_GLASS, PACKAGE, PICTURE};
use crate::icon::{self, DdsDecoder};

pub fn execute(sources: &[PathBuf], output: &Path) -> Result<()> {
    let started = Instant::now();

    print_step(1, 3, PACKAGE, "Opening archives...");
    let mut view = super::open_view(sources)?;

    print_step(2, 3, LOOKING_GLASS, "Decoding icons...");
    let icons = icon::extract_icons(&mut view, &DdsDecoder)?;

    print_step(3, 3, PICTURE, "Writing PNG files...");
    std::fs::create_dir_all(output)?;
    let bar = crate::cli::progress::simple_bar(icons.len() as u64, "Writing");
    for (name, raster) in &icons {
        let png = raster.to_png()?;
        std::fs::write(output.join(format!("{name}.png")), png)?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!("{} icons written to {}", icons.len(), output.display());
    print_done(started.elapsed());
    Ok(())
}
