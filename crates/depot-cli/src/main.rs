//! depot - application and release catalog CLI

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use depot_cli::cmd::{self, Session};
use depot_cli::{AppCommands, Cli, Commands, ExtraCommands, ReleaseCommands};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = cmd::error_code(&err);
            eprintln!("{} {err:#}", format!("{code}:").red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session = Session::open(cli.user, cli.admin)?;

    match cli.command {
        Commands::List => cmd::list::list(&session).await,
        Commands::Show { app } => cmd::show::show(&session, &app).await,
        Commands::App { command } => match command {
            AppCommands::Add {
                name,
                details,
                tags,
            } => cmd::app::add(&session, name, details, tags).await,
            AppCommands::Edit {
                app,
                name,
                details,
                tags,
                clear,
            } => cmd::app::edit(&session, &app, name, details, tags, &clear).await,
            AppCommands::Rm { app } => cmd::app::remove(&session, &app).await,
        },
        Commands::Release { command } => match command {
            ReleaseCommands::Add {
                app,
                version_label,
                package_type,
                os,
                architectures,
                artifact,
                date,
                notes,
                sort_order,
            } => {
                let fields = depot_core::ReleaseFields {
                    version_label,
                    package_type,
                    operating_system: os,
                    architectures: cmd::release::architectures(&architectures),
                    release_date: date,
                    notes,
                    sort_order,
                };
                cmd::release::add(&session, &app, fields, &artifact).await
            }
            ReleaseCommands::Edit {
                id,
                version_label,
                package_type,
                os,
                architectures,
                artifact,
                date,
                notes,
                sort_order,
                clear,
            } => {
                let edit = cmd::release::ReleaseEdit {
                    version_label,
                    package_type,
                    os,
                    architectures,
                    date,
                    notes,
                    sort_order,
                    clear,
                };
                cmd::release::edit(&session, id, edit, &artifact).await
            }
            ReleaseCommands::Rm { id } => cmd::release::remove(&session, id).await,
            ReleaseCommands::Reorder { app, ids } => {
                cmd::release::reorder(&session, &app, &ids).await
            }
        },
        Commands::Resolve { app, selection } => {
            cmd::resolve::resolve(&session, &app, &selection.to_selection()).await
        }
        Commands::Download {
            app,
            selection,
            release,
            out,
        } => {
            let target = match (release, app) {
                (Some(id), _) => cmd::download::Target::Release(id),
                (None, Some(app)) => cmd::download::Target::Resolve {
                    app,
                    selection: selection.to_selection(),
                },
                (None, None) => anyhow::bail!("Name an application or pass --release"),
            };
            cmd::download::download(&session, target, out).await
        }
        Commands::Extra { command } => match command {
            ExtraCommands::Add {
                app,
                name,
                artifact,
                notes,
            } => cmd::extra::add(&session, &app, name, notes, &artifact).await,
            ExtraCommands::List { app } => cmd::extra::list(&session, &app).await,
            ExtraCommands::Rm { id } => cmd::extra::remove(&session, id).await,
        },
    }
}
