// Forum plugin installer
// Library entry point

pub mod config;
pub mod database;
pub mod error;
pub mod security;
pub mod utils;
pub mod wizard;

use crate::config::InstallerConfig;
use crate::database::connection::RealDbConnector;
use crate::wizard::prompt::TerminalPrompter;
use crate::wizard::{InstallOutcome, InstallWizard};

/// Run the interactive installer against a loaded configuration.
pub async fn run_installer(config: InstallerConfig) -> InstallOutcome {
    let mut wizard = InstallWizard::new(config, TerminalPrompter, RealDbConnector);
    wizard.run().await
}
