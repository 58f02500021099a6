mod app;
mod bundle;
mod calendar;
mod config;
mod handlers;
mod render;
mod state;
mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use listenfd::ListenFd;
use reserveit_config::{app_config_from_env, load_app_config, load_resources, LoadError};
use reserveit_core::app_config::AppConfig;
use reserveit_core::resource::ResourceMap;
use reserveit_site::DirectoryHost;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::create_app,
    bundle::{ResourceBundles, StorageBackend},
    calendar::InMemoryCalendar,
    config::ServerConfig,
    state::AppState,
};

/// reserveit - Reservation forms for resources backed by calendars
#[derive(Parser, Debug)]
#[command(name = "reserveit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the reservation forms
    Serve(ServeArgs),
    /// Build the static site described by a site file
    Build {
        /// Site file with the host settings and plugin options
        #[arg(default_value = "site.yaml")]
        site_file: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,

    /// Global app config document; settings come from the environment when omitted
    #[arg(long, env = "RESERVEIT_APP_CONFIG")]
    app_config: Option<PathBuf>,

    /// Directory of resource documents
    #[arg(long, default_value = "resource-configs", env = "RESERVEIT_RESOURCE_DIR")]
    resource_dir: PathBuf,

    /// Directory holding one SQLite database per resource
    #[arg(long, default_value = "sqlite-dbs", env = "RESERVEIT_SQLITE_DIR")]
    sqlite_dir: PathBuf,

    /// Directory served under /images
    #[arg(long, env = "RESERVEIT_IMAGE_DIR")]
    image_dir: Option<PathBuf>,

    /// Reservation storage backend
    #[arg(long, value_enum, default_value_t = StorageKind::Sqlite, env = "RESERVEIT_STORAGE")]
    storage: StorageKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StorageKind {
    Sqlite,
    Memory,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reserveit=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Build { site_file } => build(site_file),
    }
}

/// Logs a configuration error with its file and resource, then hands it back.
fn report_load_error(err: LoadError) -> anyhow::Error {
    tracing::error!(
        file = %err.path().display(),
        resource = err.resource().unwrap_or("-"),
        error = %err,
        "Invalid configuration"
    );
    err.into()
}

fn load_configuration(args: &ServeArgs) -> Result<(AppConfig, ResourceMap)> {
    let app = match &args.app_config {
        Some(path) => load_app_config(path),
        None => app_config_from_env(),
    }
    .map_err(report_load_error)?;
    let resources = load_resources(&args.resource_dir, &app).map_err(report_load_error)?;

    tracing::info!(
        resources = resources.len(),
        dir = %args.resource_dir.display(),
        "Loaded resources"
    );
    Ok((app, resources))
}

async fn serve(args: ServeArgs) -> Result<()> {
    let (app_config, resources) = load_configuration(&args)?;
    let server_config = ServerConfig::from_env();

    let backend = match args.storage {
        StorageKind::Sqlite => StorageBackend::Sqlite {
            dir: args.sqlite_dir.clone(),
            echo: app_config.db_echo,
        },
        StorageKind::Memory => StorageBackend::Memory,
    };
    let bundles =
        ResourceBundles::assemble(&resources, &server_config.schema_selection(), &backend).await?;

    let calendar = InMemoryCalendar::new();
    bundles
        .reconcile_all(&calendar, &app_config.timezone)
        .await;

    let mut state = AppState::new(app_config, bundles, Arc::new(calendar), server_config);
    if let Some(dir) = &args.image_dir {
        state = state.with_image_dir(dir);
    }

    serve_state(&args, state).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Serves `state` until shutdown, then releases its stores on every exit path.
async fn serve_state(args: &ServeArgs, state: AppState) -> Result<()> {
    // Build the application router
    let app = create_app(state.clone());

    let served = listen_and_serve(args, app).await;
    state.close().await;
    served
}

async fn listen_and_serve(args: &ServeArgs, app: axum::Router) -> Result<()> {
    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", args.host, args.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build(site_file: PathBuf) -> Result<()> {
    let mut host = DirectoryHost::from_site_file(&site_file)?;
    let report = host.build()?;

    tracing::info!(
        pages = report.pages.len(),
        site_dir = %host.config().site_dir.display(),
        "Site built"
    );
    Ok(())
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reserveit_core::reservation::SchemaSelection;
    use reserveit_core::resource::{CalendarInfo, ResourceConfig, ResourceConfigSpec};

    fn args(dir: &std::path::Path, port: u16) -> ServeArgs {
        ServeArgs {
            host: "127.0.0.1".to_string(),
            port,
            app_config: None,
            resource_dir: dir.join("resources"),
            sqlite_dir: dir.join("db"),
            image_dir: None,
            storage: StorageKind::Sqlite,
        }
    }

    #[tokio::test]
    async fn test_stores_released_when_listener_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let args = args(dir.path(), taken.local_addr().unwrap().port());

        let mut resources = ResourceMap::new();
        resources
            .insert(
                ResourceConfig::try_from(
                    ResourceConfigSpec::new("courts", "Courts")
                        .with_calendar("court-1", CalendarInfo::new("c1@group")),
                )
                .unwrap(),
            )
            .unwrap();
        let bundles = ResourceBundles::assemble(
            &resources,
            &SchemaSelection::default(),
            &StorageBackend::Sqlite {
                dir: args.sqlite_dir.clone(),
                echo: false,
            },
        )
        .await
        .unwrap();
        let store = Arc::clone(&bundles.bundles[0].store);
        let state = AppState::new(
            AppConfig::new("courts@example.org", "UTC"),
            bundles,
            Arc::new(InMemoryCalendar::new()),
            ServerConfig::default(),
        );

        assert!(serve_state(&args, state).await.is_err());

        let day = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap();
        let result = store
            .list_overlapping(
                day.and_hms_opt(0, 0, 0).unwrap(),
                day.and_hms_opt(23, 0, 0).unwrap(),
            )
            .await;
        assert!(result.is_err());
    }
}
