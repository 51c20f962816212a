//! Interactive GitHub login via the device-authorization flow

use crate::cli::config::load_service_config;
use crate::cli::error::{CliError, CliResult};
use clap::Args;
use registry_admission::{AuthMethod, AuthService, AuthStatus, GitHubDeviceAuth};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Login command arguments
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// OAuth scope to request (defaults to the configured scope)
    #[arg(long)]
    pub scope: Option<String>,

    /// Path to the configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn execute_login(args: LoginArgs) -> CliResult<()> {
    let config = load_service_config(args.config.as_deref())?;
    let scope = args
        .scope
        .unwrap_or_else(|| config.github.default_scope.clone());

    let github = GitHubDeviceAuth::new(config.github.clone(), config.provider_timeout())?;
    let auth = AuthService::new(github);

    let started = auth.start_auth_flow(AuthMethod::GitHub, &scope).await?;
    let instruction = |key: &str| {
        started
            .instructions
            .get(key)
            .cloned()
            .unwrap_or_default()
    };

    println!("To authenticate, open {}", instruction("verification_uri"));
    println!("and enter the code: {}", instruction("user_code"));

    let interval_secs: u64 = instruction("interval").parse().unwrap_or(5);
    let token = poll_until_done(&auth, &started.session_handle, interval_secs).await?;

    println!("Authenticated. Use this token as a bearer credential:");
    println!("{}", token);
    Ok(())
}

/// Poll `session_handle` at the provider's pace until the login finishes
async fn poll_until_done(
    auth: &AuthService,
    session_handle: &str,
    mut interval_secs: u64,
) -> CliResult<String> {
    loop {
        tokio::time::sleep(Duration::from_secs(interval_secs)).await;

        match auth.check_auth_status(session_handle).await? {
            AuthStatus::Pending { interval_secs: next } => {
                if next != interval_secs {
                    debug!("Provider asked to poll every {}s", next);
                }
                interval_secs = next;
            }
            AuthStatus::Authorized { access_token } => return Ok(access_token),
            AuthStatus::Denied => {
                return Err(CliError::Login("access was denied".to_string()));
            }
            AuthStatus::Expired => {
                return Err(CliError::Login(
                    "the device code expired before it was approved".to_string(),
                ));
            }
        }
    }
}
