use anyhow::Result;
use clap::Args;

use super::GlobalOptions;
use asana_export::ui;

/// Delete the stored encrypted access token
#[derive(Args, Debug, Default)]
pub struct ForgetCommand {}

impl ForgetCommand {
    pub fn run(&self, options: &GlobalOptions) -> Result<()> {
        let vault = options.vault();

        if vault.forget()? {
            ui::print_success(&format!(
                "Removed stored access token {}",
                vault.secret_path().display()
            ));
        } else {
            ui::print_info("No stored access token to remove");
        }
        Ok(())
    }
}
