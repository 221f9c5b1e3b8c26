use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

mod cat;
mod icons;
mod list;
mod version;

#[derive(Subcommand)]
pub enum Commands {
    /// List archive contents
    #[command(long_about = "List archive contents

Walks the directory tree of an SCS (HashFS v1/v2) or ZIP archive.

Examples:
  truckmaps list base.scs
  truckmaps list base.scs material/ui/map")]
    List {
        /// Archive file
        source: PathBuf,

        /// Directory to start from (archive root when omitted)
        root: Option<String>,
    },

    /// Print one archive entry to a file or stdout
    #[command(long_about = "Print one archive entry to a file or stdout

Texture-object entries from HashFS v2 archives come out as complete DDS
containers.

Examples:
  truckmaps cat base.scs version.sii
  truckmaps cat base.scs material/ui/map/road/road_one.tobj -o road_one.dds")]
    Cat {
        /// Archive file
        source: PathBuf,

        /// Archive-internal path
        path: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode the map icon set into PNG files
    #[command(long_about = "Decode the map icon set into PNG files

Layers the given archives (later archives shadow earlier ones, so list mods
last), scans the UI material directories and writes one PNG per icon.

Examples:
  truckmaps icons base.scs -o ./icons
  truckmaps icons base.scs def.scs my_mod.zip -o ./icons")]
    Icons {
        /// Archive files, base first
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "icons")]
        output: PathBuf,
    },

    /// Print the pack version and locale bundle size
    Version {
        /// Archive files, base first
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
}

impl Commands {
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::List { source, root } => list::execute(&source, root.as_deref()),
            Commands::Cat {
                source,
                path,
                output,
            } => cat::execute(&source, &path, output.as_deref()),
            Commands::Icons { sources, output } => icons::execute(&sources, &output),
            Commands::Version { sources } => version::execute(&sources),
        }
    }
}

/// Open the given archives into one combined view, base first
pub(crate) fn open_view(sources: &[PathBuf]) -> Result<crate::archive::CombinedView> {
    use crate::archive::Archive;

    let mut view = crate::archive::CombinedView::new();
    for source in sources {
        let mut archive = crate::archive::open(source)?;
        archive.parse_entries()?;
        view.push(archive);
    }
    Ok(view)
}
