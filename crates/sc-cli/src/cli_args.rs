use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "sc-cli")]
#[command(about = "Compile declarative script collections")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Compile(CompileArgs),
    CompileDir(CompileDirArgs),
    Script(ScriptArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Json,
    Summary,
}

#[derive(Debug, Args)]
pub(crate) struct CompileArgs {
    #[arg(long = "file")]
    pub(crate) file: String,
    #[arg(long = "language")]
    pub(crate) language: Option<String>,
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Json)]
    pub(crate) format: OutputFormat,
}

#[derive(Debug, Args)]
pub(crate) struct CompileDirArgs {
    #[arg(long = "collections-dir")]
    pub(crate) collections_dir: String,
    #[arg(long = "language")]
    pub(crate) language: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct ScriptArgs {
    #[arg(long = "file")]
    pub(crate) file: String,
    #[arg(long = "language")]
    pub(crate) language: Option<String>,
    #[arg(long = "name")]
    pub(crate) name: String,
    #[arg(long = "revert")]
    pub(crate) revert: bool,
}
