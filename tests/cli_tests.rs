use clap::Parser;
use sharebridge::cli::{Cli, Commands, ConfigCommands};

#[cfg(test)]
mod parsing_tests {
    use super::*;

    #[test]
    fn parses_provision_command() {
        let cli = Cli::try_parse_from(["sbr", "provision"]).unwrap();
        assert!(matches!(cli.command, Commands::Provision));
        assert!(cli.config.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sbr",
            "sync",
            "--config",
            "/tmp/custom.toml",
            "--debug",
            "--no-color",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Sync));
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/tmp/custom.toml"))
        );
        assert!(cli.debug);
        assert!(cli.no_color);
    }

    #[test]
    fn parses_name_seed() {
        let cli = Cli::try_parse_from(["sbr", "provision", "--name-seed", "42"]).unwrap();
        assert_eq!(cli.name_seed, Some(42));
    }

    #[test]
    fn parses_init_with_force() {
        let cli = Cli::try_parse_from(["sbr", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true }));
    }

    #[test]
    fn parses_config_subcommands() {
        let cli = Cli::try_parse_from(["sbr", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Show
            }
        ));

        let cli = Cli::try_parse_from(["sbr", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Path
            }
        ));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["sbr", "teleport"]).is_err());
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(Cli::try_parse_from(["sbr"]).is_err());
    }
}
