use clap::{Parser, Subcommand};

/// Inventrack backend server.
///
/// Runs the HTTP API, or inspects and resets the saved database setup.
#[derive(Parser, Debug)]
#[command(name = "inventrack-server", version, about = "Inventrack backend server")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Print whether database setup has been completed
    Status,
    /// Delete the saved database configuration so setup runs again
    Reset,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
