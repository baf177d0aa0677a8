//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Packsmith - content pack builder
///
/// Unify, specialize and zip content packs for marketplace upload.
#[derive(Parser, Debug)]
#[command(
    name = "packsmith",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Build marketplace-ready content packs",
    long_about = "Packsmith builds marketplace-ready content packs from a content \
                  repository's Packs/ tree. Sidecar files are folded into unified \
                  items, items are specialized for the target marketplace and each \
                  pack is zipped in upload order.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  packsmith zip-packs HelloWorld -o out             \x1b[90m# One pack zip\x1b[0m\n   \
                  packsmith zip-packs A B -m marketplacev2 -o out   \x1b[90m# uploadable_packs.zip for XSIAM\x1b[0m\n   \
                  packsmith prepare Packs/A/Integrations/A/A.yml    \x1b[90m# Unify a single item\x1b[0m\n   \
                  packsmith classify Packs/A/Scripts/S/S.yml        \x1b[90m# Show what a path is\x1b[0m\n"
)]
pub struct Cli {
    /// Content repository root holding Packs/ (defaults to current directory)
    #[arg(long, short = 'c', global = true, env = "PACKSMITH_CONTENT_ROOT")]
    pub content_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare packs and write their zips
    ZipPacks(ZipPacksArgs),

    /// Unify and specialize a single content item
    Prepare(PrepareArgs),

    /// Show how paths are classified
    Classify(ClassifyArgs),

    /// Carry preserved fields from a local file into a downloaded one
    PreserveFields(PreserveFieldsArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the zip-packs command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Zip one pack into out/HelloWorld.zip:\n    packsmith zip-packs HelloWorld -o out\n\n\
                  Zip several packs into out/uploadable_packs.zip:\n    packsmith zip-packs A B C -o out\n\n\
                  Reproducible build for XSIAM:\n    packsmith zip-packs A -m marketplacev2 --timestamp 1700000000 --zip-all")]
pub struct ZipPacksArgs {
    /// Pack names under Packs/ or paths to pack directories
    #[arg(required = true)]
    pub packs: Vec<String>,

    /// Target marketplace
    #[arg(long, short = 'm', env = "PACKSMITH_MARKETPLACE")]
    pub marketplace: Option<String>,

    /// Output directory
    #[arg(long, short = 'o', default_value = ".")]
    pub output: PathBuf,

    /// Number of packs processed in parallel
    #[arg(long, short = 'j', env = "PACKSMITH_WORKERS")]
    pub workers: Option<usize>,

    /// Collect pack zips into uploadable_packs.zip even for a single pack
    #[arg(long)]
    pub zip_all: bool,

    /// Fail on warnings as well as errors
    #[arg(long)]
    pub strict: bool,

    /// Manifest timestamp as RFC 3339 or unix seconds
    #[arg(long, env = "SOURCE_DATE_EPOCH")]
    pub timestamp: Option<String>,

    /// Cancel packs still pending after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the prepare command
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Primary file of the item, e.g. Packs/A/Integrations/A/A.yml
    pub item: PathBuf,

    /// Target marketplace
    #[arg(long, short = 'm', env = "PACKSMITH_MARKETPLACE")]
    pub marketplace: Option<String>,

    /// Output directory (defaults to the item's directory)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Label appended to names and ids
    #[arg(long)]
    pub custom: Option<String>,
}

/// Arguments for the classify command
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Paths inside Packs/
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Arguments for the preserve-fields command
#[derive(Args, Debug)]
pub struct PreserveFieldsArgs {
    /// Existing local file
    pub local: PathBuf,

    /// Freshly downloaded file, rewritten in place
    pub downloaded: PathBuf,
}

/// Arguments for completions command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    packsmith completions --shell bash > ~/.bash_completion.d/packsmith\n\n\
                  Generate zsh completions:\n    packsmith completions --shell zsh > ~/.zfunc/_packsmith\n\n\
                  Generate fish completions:\n    packsmith completions --shell fish > ~/.config/fish/completions/packsmith.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long, short = 's')]
    pub shell: String,
}
