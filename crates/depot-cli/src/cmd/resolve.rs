//! Resolve command

use anyhow::Result;
use crossterm::style::Stylize;
use depot_schema::{Axis, Resolution, Selection};

use super::Session;
use crate::ui::list::print_release_detail;

/// Command-line flag that sets a choice on `axis`.
pub fn flag(axis: Axis) -> &'static str {
    match axis {
        Axis::OperatingSystem => "--os",
        Axis::Version => "--version",
        Axis::Architecture => "--arch",
        Axis::PackageType => "--type",
    }
}

/// One-line explanation of an unresolved selection.
pub fn describe(resolution: &Resolution) -> Option<String> {
    match resolution {
        Resolution::Resolved(_) => None,
        Resolution::NeedsMoreInput { axis, options } => Some(format!(
            "Choose {} {}: {}",
            axis,
            flag(*axis),
            options.join(", ")
        )),
        Resolution::NoMatch { axis: None } => Some("No releases yet".to_string()),
        Resolution::NoMatch { axis: Some(axis) } => Some(format!(
            "No release matches the chosen {axis} ({})",
            flag(*axis)
        )),
    }
}

/// Narrow an application's releases and show where the selection stands
pub async fn resolve(session: &Session, key: &str, selection: &Selection) -> Result<()> {
    let app = session.application(key).await?;
    let resolution = session
        .service
        .resolve(&session.caller, app.id, selection)
        .await?;

    match &resolution {
        Resolution::Resolved(release) => print_release_detail(release),
        Resolution::NeedsMoreInput { .. } => {
            println!();
            if let Some(message) = describe(&resolution) {
                println!("  {}", message.yellow());
            }
        }
        Resolution::NoMatch { .. } => {
            if let Some(message) = describe(&resolution) {
                anyhow::bail!("{}: {message}", app.name);
            }
        }
    }
    Ok(())
}
