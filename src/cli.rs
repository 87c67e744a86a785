//! All the clap stuff for parsing/documenting the cli

use clap::{
    builder::{PossibleValuesParser, TypedValueParser},
    Parser,
};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Clone, Debug)]
#[clap(version, about, long_about = None)]
/// Repackage prebuilt GDAL wheels and plugin MSIs into self-contained
/// platform wheels.
///
/// Run it in a directory containing the downloaded artifacts (and a
/// `gdal-repack.json` with the static packaging metadata); finished wheels
/// land in `dist-np19/` (or `dist-np17/` with `--msi`).
pub struct Cli {
    /// Repackage from the python-bindings MSI instead of the prebuilt wheel
    #[clap(long)]
    pub msi: bool,

    /// How verbose logging should be (log level)
    #[clap(long, short)]
    #[clap(default_value_t = LevelFilter::WARN)]
    #[clap(value_parser = PossibleValuesParser::new(["off", "error", "warn", "info", "debug", "trace"]).map(|s| s.parse::<LevelFilter>().expect("possible values are valid")))]
    #[clap(help_heading = "GLOBAL OPTIONS", global = true)]
    pub verbose: LevelFilter,

    /// Anything else is accepted and discarded: this tool only ever builds
    /// binary wheels, whatever it's asked for
    #[clap(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub discarded: Vec<String>,
}
