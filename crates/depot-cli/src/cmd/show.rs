//! Show command

use anyhow::Result;
use crossterm::style::Stylize;
use depot_schema::{Architecture, check_integrity};

use super::Session;
use crate::ui::list::{print_extra_row, print_field, print_release_row, print_warning};

/// Show an application with its variant tree and extras
pub async fn show(session: &Session, key: &str) -> Result<()> {
    let app = session.application(key).await?;
    let caller = &session.caller;
    let tree = session.service.variants(caller, app.id).await?;
    let extras = session.service.list_extras(caller, app.id).await?;

    println!();
    println!(
        "  {} {}",
        app.name.as_str().white().bold(),
        format!("#{}", app.id).dark_grey()
    );
    if let Some(description) = &app.description {
        println!("  {}", description.as_str().dark_grey());
    }
    println!();

    let fields = [
        ("Developer", &app.developer),
        ("Publisher", &app.publisher),
        ("Homepage", &app.homepage),
        ("Icon", &app.icon_url),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            print_field(label, value);
        }
    }
    if !app.tags.is_empty() {
        let tags: Vec<&str> = app.tags.iter().map(String::as_str).collect();
        print_field("Tags", &tags.join(", "));
    }
    print_field(
        "Platforms",
        if app.has_multiple_operating_systems {
            "multiple"
        } else {
            "single"
        },
    );

    println!();
    if tree.is_empty() {
        println!("  No releases yet.");
    }
    for version in &tree {
        let heading = match &version.operating_system {
            Some(os) => format!("{} ({os})", version.version_label),
            None => version.version_label.clone(),
        };
        println!("  {}", heading.cyan().bold());
        for group in &version.architecture_groups {
            let slot = group
                .architecture
                .as_ref()
                .map_or("default", Architecture::as_str);
            println!("    {}", slot.dark_grey());
            for release in &group.releases {
                let downloads = session.service.download_count(caller, release.id).await?;
                print_release_row(release, downloads);
            }
        }
    }

    for problem in check_integrity(&tree) {
        print_warning(&problem.to_string());
    }

    if !extras.is_empty() {
        println!();
        println!("  {}", "Extras".white().bold());
        for extra in &extras {
            print_extra_row(extra);
        }
    }

    Ok(())
}
