//! Main CLI application structure

use clap::Parser;

use crate::cli::commands::{login, serve, version, Commands};
use crate::cli::error::CliResult;

/// Registry admission - authenticated publishing for a namespaced server registry
#[derive(Debug, Parser)]
#[command(name = "registry-admission")]
#[command(version = registry_admission::VERSION)]
#[command(about = "Admission control for a namespaced server registry")]
#[command(long_about = "Admission control for a namespaced server registry.\n\n\
                         Names under io.github.<owner>/<repo> require a GitHub token\n\
                         that can read <owner>/<repo>; other names are published without\n\
                         credentials.\n\n\
                         Examples:\n\
                           registry-admission serve --port 8080\n\
                           registry-admission login --scope read:user")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> CliResult<()> {
        if self.verbose && std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var("RUST_LOG", "registry_admission=debug");
        }
        registry_admission::init_logging();

        let result = match self.command {
            Commands::Serve(args) => serve::execute_serve(args).await,
            Commands::Login(args) => login::execute_login(args).await,
            Commands::Version(args) => version::execute_version(args).await,
        };

        if let Err(e) = &result {
            eprintln!("Error: {}", e);
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["registry-admission", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve(_)));
    }

    #[test]
    fn test_parse_login_scope() {
        let cli =
            Cli::try_parse_from(["registry-admission", "login", "--scope", "read:user"]).unwrap();
        match cli.command {
            Commands::Login(args) => assert_eq!(args.scope.as_deref(), Some("read:user")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["registry-admission"]).is_err());
    }
}
