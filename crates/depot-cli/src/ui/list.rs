//! Column-aligned rendering for catalog listings.

use crossterm::style::Stylize;
use depot_schema::{ApplicationSummary, Architecture, Extra, Release};

use super::theme::{Theme, format_size};

/// Print a `label value` line of a detail block
pub fn print_field(label: &str, value: &str) {
    let theme = Theme::default();
    let label = format!("{label:<lw$}", lw = theme.layout.label_width);
    println!("  {}{}", label.dark_grey(), value);
}

/// Print column headers for `depot list`
pub fn print_app_header() {
    let theme = Theme::default();
    let header = format!(
        "  {:>iw$}  {:<nw$} {:<vw$} {:>8}",
        "id",
        "name",
        "latest",
        "releases",
        iw = theme.layout.id_width,
        nw = theme.layout.name_width,
        vw = theme.layout.version_width,
    );
    println!();
    println!("{}", header.dark_grey());
}

/// Print a single row for `depot list`
pub fn print_app_row(summary: &ApplicationSummary) {
    let theme = Theme::default();
    let app = &summary.application;

    let id_part = format!("{:>w$}", app.id.get(), w = theme.layout.id_width);
    let name_part = format!("{:<w$}", app.name, w = theme.layout.name_width);
    let latest = summary.latest_version.as_deref().unwrap_or("-");
    let version_part = format!("{:<w$}", latest, w = theme.layout.version_width);

    println!(
        "  {}  {} {} {:>8}",
        id_part.with(theme.colors.secondary),
        name_part.with(theme.colors.name),
        version_part.with(theme.colors.version),
        summary.version_count.to_string().with(theme.colors.secondary),
    );
}

/// Print footer for `depot list`
pub fn print_app_footer(count: usize, releases: u64) {
    println!();
    let msg = format!("  {count} applications, {releases} releases");
    println!("{}", msg.dark_grey());
}

/// Print one release line under a variant heading
pub fn print_release_row(release: &Release, downloads: u64) {
    let theme = Theme::default();

    let id_part = format!("#{:<w$}", release.id.get(), w = theme.layout.id_width);
    let type_part = format!("{:<10}", release.package_type.label());
    let size_part = format!("{:>9}", format_size(release.file_size_bytes));
    let date = release.display_date().format("%Y-%m-%d").to_string();
    let file = release.file_name().unwrap_or("?");

    println!(
        "      {} {} {}  {}  {}  {}",
        id_part.with(theme.colors.secondary),
        type_part.with(theme.colors.name),
        size_part.with(theme.colors.secondary),
        date.with(theme.colors.secondary),
        file,
        format!("{downloads} downloads").with(theme.colors.secondary),
    );
}

/// Print one extra line
pub fn print_extra_row(extra: &Extra) {
    let theme = Theme::default();

    let id_part = format!("#{:<w$}", extra.id.get(), w = theme.layout.id_width);
    let name_part = format!("{:<w$}", extra.name, w = theme.layout.name_width);
    let size_part = format!("{:>9}", format_size(extra.file_size_bytes));

    println!(
        "  {} {} {}  {}",
        id_part.with(theme.colors.secondary),
        name_part.with(theme.colors.name),
        size_part.with(theme.colors.secondary),
        extra.file_name().unwrap_or("?"),
    );
    if let Some(notes) = &extra.notes {
        println!("  {:w$} {}", "", notes.as_str().dark_grey(), w = theme.layout.id_width + 1);
    }
}

/// Print a release as a detail block
pub fn print_release_detail(release: &Release) {
    println!();
    println!(
        "  {} {}",
        format!("#{}", release.id).white().bold(),
        release.version_label.as_str().cyan()
    );
    print_field("Type", release.package_type.label());
    print_field(
        "OS",
        release.operating_system.as_deref().unwrap_or("unspecified"),
    );
    let archs = if release.architectures.is_empty() {
        "default".to_string()
    } else {
        release
            .architectures
            .iter()
            .map(Architecture::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    print_field("Arch", &archs);
    print_field("Size", &format_size(release.file_size_bytes));
    print_field(
        "Date",
        &release.display_date().format("%Y-%m-%d").to_string(),
    );
    print_field("File", &release.file_path.display().to_string());
    if let Some(notes) = &release.notes {
        print_field("Notes", notes);
    }
}

/// Print a green confirmation line
pub fn print_done(message: &str) {
    let theme = Theme::default();
    println!("  {} {}", "✓".with(theme.colors.success), message);
}

/// Print a yellow warning line
pub fn print_warning(message: &str) {
    let theme = Theme::default();
    println!("  {} {}", "!".with(theme.colors.warning), message);
}
