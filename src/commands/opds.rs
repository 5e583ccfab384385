use anyhow::Result;
use owo_colors::OwoColorize;

use super::Controller;
use crate::utils::tui::with_spinner;

pub async fn run(controller: &mut Controller) -> Result<()> {
    let names = with_spinner("Fetching OPDs...", controller.load_opds()).await?;

    if names.is_empty() {
        println!("{}", "No OPDs configured".dimmed());
        return Ok(());
    }

    for name in names {
        println!("  {}", name);
    }
    Ok(())
}
