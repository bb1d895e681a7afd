//! CLI argument parsing for the ensemble tools
//!
//! Arguments are declared with clap's derive macro. Options shared by every
//! subcommand live in [`CommonArgs`] and are flattened into [`ToolArgs`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Arguments shared by every subcommand
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file
    #[arg(short = 'f', long = "config", global = true, default_value = "adcp.toml")]
    pub config_file: String,

    /// Drop ensembles whose checksum does not match
    #[arg(long, global = true)]
    pub strict: bool,
}

/// `adcp-tool` command line
#[derive(Parser, Debug, Clone)]
#[command(name = "adcp-tool", about = "Inspect, convert and generate ADCP ensemble files")]
#[command(version)]
pub struct ToolArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: ToolCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ToolCommand {
    /// List the ensembles in a file with their datasets
    Info {
        /// Ensemble file
        file: PathBuf,
    },

    /// Check framing and checksums of every ensemble in a file
    Validate {
        /// Ensemble file
        file: PathBuf,
    },

    /// Print every ensemble as JSON, one document per line
    Json {
        /// Ensemble file
        file: PathBuf,

        /// Pretty-print instead of one line per ensemble
        #[arg(short, long)]
        pretty: bool,
    },

    /// Write emulated ensembles to a file
    Generate {
        /// Output file
        file: PathBuf,

        /// Number of ensembles to write
        #[arg(short = 'n', long, default_value = "10")]
        count: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_default_config() {
        let args = ToolArgs::try_parse_from(["adcp-tool", "info", "a.ens"]).unwrap();
        assert_eq!(args.common.config_file, "adcp.toml");
        assert!(!args.common.strict);
        assert_eq!(
            args.command,
            ToolCommand::Info {
                file: PathBuf::from("a.ens")
            }
        );
    }

    #[test]
    fn test_config_after_subcommand() {
        let args =
            ToolArgs::try_parse_from(["adcp-tool", "validate", "a.ens", "-f", "my.toml", "--strict"])
                .unwrap();
        assert_eq!(args.common.config_file, "my.toml");
        assert!(args.common.strict);
    }

    #[test]
    fn test_json_pretty() {
        let args = ToolArgs::try_parse_from(["adcp-tool", "json", "--pretty", "a.ens"]).unwrap();
        assert!(matches!(args.command, ToolCommand::Json { pretty: true, .. }));
    }

    #[test]
    fn test_generate_count() {
        let args = ToolArgs::try_parse_from(["adcp-tool", "generate", "out.ens", "-n", "3"]).unwrap();
        assert!(matches!(args.command, ToolCommand::Generate { count: 3, .. }));

        let args = ToolArgs::try_parse_from(["adcp-tool", "generate", "out.ens"]).unwrap();
        assert!(matches!(args.command, ToolCommand::Generate { count: 10, .. }));
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(ToolArgs::try_parse_from(["adcp-tool"]).is_err());
    }
}
