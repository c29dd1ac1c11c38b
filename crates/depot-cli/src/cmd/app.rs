//! Application management commands

use anyhow::Result;
use depot_core::{ApplicationFields, ApplicationPatch};

use super::{Session, field_patch};
use crate::ui::list::print_done;
use crate::{AppDetails, AppField};

pub async fn add(
    session: &Session,
    name: String,
    details: AppDetails,
    tags: Vec<String>,
) -> Result<()> {
    let fields = ApplicationFields {
        name,
        description: details.description,
        developer: details.developer,
        publisher: details.publisher,
        icon_url: details.icon_url,
        homepage: details.homepage,
        tags,
    };
    let app = session
        .service
        .create_application(&session.caller, fields)
        .await?;
    print_done(&format!("Created application {} (#{})", app.name, app.id));
    Ok(())
}

pub async fn edit(
    session: &Session,
    key: &str,
    name: Option<String>,
    details: AppDetails,
    tags: Option<Vec<String>>,
    clear: &[AppField],
) -> Result<()> {
    let app = session.application(key).await?;
    let cleared = |field| clear.contains(&field);

    let patch = ApplicationPatch {
        name,
        description: field_patch(details.description, cleared(AppField::Description)),
        developer: field_patch(details.developer, cleared(AppField::Developer)),
        publisher: field_patch(details.publisher, cleared(AppField::Publisher)),
        icon_url: field_patch(details.icon_url, cleared(AppField::IconUrl)),
        homepage: field_patch(details.homepage, cleared(AppField::Homepage)),
        tags: match tags {
            Some(tags) => Some(tags),
            None if cleared(AppField::Tags) => Some(Vec::new()),
            None => None,
        },
    };

    let app = session
        .service
        .update_application(&session.caller, app.id, patch)
        .await?;
    print_done(&format!("Updated application {} (#{})", app.name, app.id));
    Ok(())
}

pub async fn remove(session: &Session, key: &str) -> Result<()> {
    let app = session.application(key).await?;
    session
        .service
        .delete_application(&session.caller, app.id)
        .await?;
    print_done(&format!("Deleted application {} (#{})", app.name, app.id));
    Ok(())
}
