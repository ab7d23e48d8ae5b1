//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use taglist_core::{OutputFormat, SettingsOverrides};

/// taglist - Retrieves a list of container image tag names
#[derive(Parser, Debug)]
#[command(name = "taglist")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (default is $HOME/.taglist.yaml)
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(flatten)]
    pub query: QueryArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Flags of the default tag listing
#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// Repository name to list tags from (e.g., nginx, ghcr.io/acme/app)
    #[arg(short, long)]
    pub repository: Option<String>,

    /// Output format [string, json]
    #[arg(short, long)]
    pub output: Option<String>,

    /// Filter on version constraints, e.g. '>= 1.2.3', '~1.3'
    #[arg(short, long)]
    pub constraint: Option<String>,

    /// Return only the latest version. With --constraint, the latest matching version
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub latest: Option<bool>,

    /// Talk to the registry over plain HTTP
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub plain_http: Option<bool>,
}

impl QueryArgs {
    /// Flags the user actually passed, as the top settings layer
    pub fn into_overrides(self) -> SettingsOverrides {
        SettingsOverrides {
            repository: self.repository,
            output: self.output.as_deref().map(OutputFormat::from),
            constraint: self.constraint,
            latest: self.latest,
            plain_http: self.plain_http,
            http_timeout_secs: None,
        }
    }
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_query_flags() {
        let cli = Cli::try_parse_from([
            "taglist",
            "-r",
            "nginx",
            "-c",
            ">= 1.2.3",
            "-o",
            "json",
            "--latest",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        let overrides = cli.query.into_overrides();
        assert_eq!(overrides.repository.as_deref(), Some("nginx"));
        assert_eq!(overrides.constraint.as_deref(), Some(">= 1.2.3"));
        assert_eq!(overrides.output, Some(OutputFormat::Json));
        assert_eq!(overrides.latest, Some(true));
        assert_eq!(overrides.plain_http, None);
    }

    #[test]
    fn test_boolean_flags_can_be_turned_off() {
        let cli = Cli::try_parse_from(["taglist", "-r", "nginx", "--latest=false", "--plain-http"])
            .unwrap();
        let overrides = cli.query.into_overrides();
        assert_eq!(overrides.latest, Some(false));
        assert_eq!(overrides.plain_http, Some(true));

        let cli = Cli::try_parse_from(["taglist", "--plain-http=false", "--latest", "-r", "x"])
            .unwrap();
        let overrides = cli.query.into_overrides();
        assert_eq!(overrides.latest, Some(true));
        assert_eq!(overrides.plain_http, Some(false));
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let cli = Cli::try_parse_from(["taglist"]).unwrap();
        assert_eq!(cli.query.into_overrides(), SettingsOverrides::default());
    }

    #[test]
    fn test_unknown_output_falls_back_to_text() {
        let cli = Cli::try_parse_from(["taglist", "-r", "nginx", "-o", "yaml"]).unwrap();
        assert_eq!(cli.query.into_overrides().output, Some(OutputFormat::Text));
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["taglist", "completions", "bash"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Completions(_))));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["taglist", "-vv", "--config", "/tmp/t.yaml", "-r", "x"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref().map(|p| p.as_str()), Some("/tmp/t.yaml"));
    }
}
