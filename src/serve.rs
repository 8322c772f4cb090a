use std::path::PathBuf;

use anyhow::Context as _;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cli::ServeArgs;

pub fn router(site_dir: PathBuf) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(site_dir).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let site_dir = PathBuf::from(&args.dir);
    if !site_dir.is_dir() {
        anyhow::bail!(
            "site directory does not exist: {} (run `novelsite build` first)",
            site_dir.display()
        );
    }

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;
    tracing::info!(addr = %args.addr, dir = %site_dir.display(), "serving site");

    axum::serve(listener, router(site_dir))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("serve site")?;
    Ok(())
}
