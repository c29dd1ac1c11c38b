//! Extra file commands

use anyhow::Result;
use depot_core::ExtraFields;
use depot_schema::ExtraId;

use super::Session;
use crate::ArtifactArgs;
use crate::ui::list::{print_done, print_extra_row};

pub async fn add(
    session: &Session,
    key: &str,
    name: String,
    notes: Option<String>,
    artifact: &ArtifactArgs,
) -> Result<()> {
    let app = session.application(key).await?;
    let artifact = session.artifact(artifact).await?;

    let extra = session
        .service
        .add_extra(&session.caller, app.id, ExtraFields { name, notes }, artifact)
        .await?;
    print_done(&format!("Added extra {} (#{}) to {}", extra.name, extra.id, app.name));
    Ok(())
}

pub async fn list(session: &Session, key: &str) -> Result<()> {
    let app = session.application(key).await?;
    let extras = session.service.list_extras(&session.caller, app.id).await?;

    println!();
    if extras.is_empty() {
        println!("  No extras for {}.", app.name);
        return Ok(());
    }
    for extra in &extras {
        print_extra_row(extra);
    }
    Ok(())
}

pub async fn remove(session: &Session, id: ExtraId) -> Result<()> {
    let extra = session.service.delete_extra(&session.caller, id).await?;
    print_done(&format!("Deleted extra {} (#{id})", extra.name));
    Ok(())
}
