use anyhow::Result;

use super::Session;
use crate::ui::list::{print_app_footer, print_app_header, print_app_row};

/// List all applications in the catalog
pub async fn list(session: &Session) -> Result<()> {
    let apps = session.service.list_applications(&session.caller).await?;

    if apps.is_empty() {
        println!();
        println!("  No applications in the catalog.");
        println!("  Run 'depot --admin app add <name>' to register one.");
        return Ok(());
    }

    print_app_header();
    for summary in &apps {
        print_app_row(summary);
    }
    let releases = apps.iter().map(|s| s.version_count).sum();
    print_app_footer(apps.len(), releases);

    Ok(())
}
