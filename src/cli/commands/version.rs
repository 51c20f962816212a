//! Version command implementation

use crate::cli::error::CliResult;
use clap::Args;

/// Display the registry-admission version
#[derive(Debug, Args)]
pub struct VersionArgs {}

/// The line printed by `registry-admission version`
pub fn version_line() -> String {
    format!("registry-admission {}", registry_admission::VERSION)
}

pub async fn execute_version(_args: VersionArgs) -> CliResult<()> {
    println!("{}", version_line());
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_line_names_binary_and_crate_version() {
        let line = version_line();
        let (name, version) = line.split_once(' ').unwrap();
        assert_eq!(name, "registry-admission");
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
        assert!(semver::Version::parse(version).is_ok());
    }

    #[tokio::test]
    async fn test_execute_version() {
        let result = execute_version(VersionArgs {}).await;
        assert!(result.is_ok());
    }
}
