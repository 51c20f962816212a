//! Command modules for CLI

pub mod login;
pub mod serve;
pub mod version;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
#[command(about = "Registry admission commands")]
pub enum Commands {
    /// Run the HTTP API
    #[command(about = "Serve the admission API over HTTP")]
    Serve(serve::ServeArgs),

    /// Log in with GitHub and print an access token
    #[command(about = "Log in with GitHub using the device-authorization flow")]
    Login(login::LoginArgs),

    /// Show version information
    #[command(about = "Show version information")]
    Version(version::VersionArgs),
}
