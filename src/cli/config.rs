//! Service configuration loading for the CLI

use crate::cli::error::{CliError, CliResult};
use config::{Config, Environment, File, FileFormat};
use registry_admission::ServiceConfig;
use std::path::Path;
use tracing::debug;

/// Config file read from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "registry-admission.toml";

/// Environment variable prefix, e.g. `REGISTRY_ADMISSION__GITHUB__CLIENT_ID`
pub const ENV_PREFIX: &str = "REGISTRY_ADMISSION";

/// Load configuration from the optional TOML file and the environment.
///
/// An explicitly named file must exist; the default file is optional.
/// Environment variables override file values.
pub fn load_service_config(path: Option<&Path>) -> CliResult<ServiceConfig> {
    build_config(path, Environment::with_prefix(ENV_PREFIX))
}

fn build_config(path: Option<&Path>, env: Environment) -> CliResult<ServiceConfig> {
    let file = match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            debug!("Loading configuration from {}", path.display());
            File::from(path).format(FileFormat::Toml).required(true)
        }
        None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
    };

    let config: ServiceConfig = Config::builder()
        .add_source(file)
        .add_source(env.separator("__").try_parsing(true))
        .build()?
        .try_deserialize()?;

    config.github.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_missing_explicit_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let result = build_config(Some(&path), env(&[]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
provider_timeout_secs = 3

[github]
client_id = "Iv1.abc"
api_base_url = "https://ghe.example.com/api/v3"

[http]
port = 9090
"#
        )
        .unwrap();

        let config = build_config(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.provider_timeout_secs, 3);
        assert_eq!(config.github.client_id, "Iv1.abc");
        assert_eq!(config.github.api_base_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.http.port, 9090);
        assert_eq!(config.http.host, "localhost");
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[github]\nclient_id = \"from-file\"").unwrap();

        let config = build_config(
            Some(file.path()),
            env(&[
                ("REGISTRY_ADMISSION__GITHUB__CLIENT_ID", "from-env"),
                ("REGISTRY_ADMISSION__HTTP__PORT", "7000"),
            ]),
        )
        .unwrap();
        assert_eq!(config.github.client_id, "from-env");
        assert_eq!(config.http.port, 7000);
    }

    #[test]
    fn test_invalid_provider_url_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[github]\napi_base_url = \"ftp://example.com\"").unwrap();

        let result = build_config(Some(file.path()), env(&[]));
        assert!(result.is_err());
    }
}
