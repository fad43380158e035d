use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "paxlst-codec")]
#[command(about = "EDIFACT passenger manifest codec (PAXLST/PNRGOV)")]
pub struct CliConfig {
    /// Transformation direction.
    #[arg(long, value_enum)]
    pub mode: Mode,

    /// Input file: EDIFACT text for decode, reservation JSON for encode.
    #[arg(long)]
    pub input: String,

    /// Output file; stdout when omitted.
    #[arg(long)]
    pub output: Option<String>,

    /// TOML codec profile (delimiters, name order, segment flags).
    #[arg(long)]
    pub profile: Option<String>,

    #[arg(long, help = "Emit the decoded manifest as JSON")]
    pub json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Decode,
    Encode,
}
