//! Command-line interface for the warden-server binary.

use clap::{Parser, Subcommand};

/// Warden - super-admin back office
///
/// Run without arguments to start the server. Configuration comes from the
/// environment (a `.env` file is honored); `JWT_SECRET` is required.
#[derive(Parser, Debug)]
#[command(
    name = "warden-server",
    version,
    about = "Warden - super-admin back office",
    after_help = "EXAMPLES:\n    \
                  warden-server          # Start the server\n    \
                  warden-server seed     # Create the bootstrap superadmin and exit"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seed the database with the superadmin role and bootstrap administrator
    ///
    /// Idempotent: existing records are left alone. The server also seeds on
    /// startup; this exists for provisioning a database ahead of first run.
    Seed,
}
