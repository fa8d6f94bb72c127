//! CLI argument parsing for create-wrangler

use clap::Parser;
use std::path::PathBuf;

/// create-wrangler - Create a wrangler.toml file from a template
#[derive(Parser, Debug)]
#[command(
    name = "create-wrangler",
    version,
    about = "Create a wrangler.toml file from a template",
    after_help = "Example: create-wrangler --input wrangler.tmpl.ts --output deploy/wrangler.toml"
)]
pub struct Cli {
    /// Template to render (default: wrangler.tmpl.js, then wrangler.tmpl.ts)
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output file or directory (default: the current directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Suppress the success message
    #[arg(short, long)]
    pub silent: bool,

    /// Path to config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "silent")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["create-wrangler"]).unwrap();
        assert!(cli.input.is_none());
        assert!(cli.output.is_none());
        assert!(!cli.silent);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["create-wrangler", "-i", "a.ts", "-o", "out", "-s"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("a.ts")));
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert!(cli.silent);
    }

    #[test]
    fn test_long_flags_with_equals() {
        let cli =
            Cli::try_parse_from(["create-wrangler", "--input=wrangler.tmpl.cjs", "--output=wrangler.toml"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("wrangler.tmpl.cjs")));
        assert_eq!(cli.output, Some(PathBuf::from("wrangler.toml")));
    }

    #[test]
    fn test_verbose_conflicts_with_silent() {
        assert!(Cli::try_parse_from(["create-wrangler", "-v", "-s"]).is_err());
    }
}
