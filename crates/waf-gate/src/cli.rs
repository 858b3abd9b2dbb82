use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "waf-gate",
    version,
    about = "Signature-based web application firewall"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "waf-gate.yaml")]
    pub config: PathBuf,

    /// Listen address (overrides config file setting)
    #[arg(long)]
    pub listen: Option<String>,

    /// Path to a YAML rule file (overrides config file setting)
    #[arg(short, long)]
    pub rules: Option<PathBuf>,

    /// Verbose, human-readable logging
    #[arg(long)]
    pub debug: bool,
}
