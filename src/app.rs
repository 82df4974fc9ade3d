/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config 読み込み → passphrase 初期化 (listener を開く前に同期的に完了させる) → Router 組み立て
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware::{
    self,
    auth::{AuthGate, UninitializedPolicy},
    http::HttpLimits,
};
use crate::services::auth::{AllowList, PassphraseError, PassphraseStore};

fn init_tracing() {
    // RUST_LOG=info,edge_authgate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting edge-authgate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let gate = build_gate(&config)?;
    let app = build_router(gate, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize the passphrase store (if configured) and wrap it in the gate.
///
/// A directory that cannot be created aborts startup. Without
/// `AUTH_PASSPHRASE_DIR` the store stays uninitialized and the gate falls back
/// to the configured `UninitializedPolicy`.
pub fn build_gate(config: &Config) -> Result<AuthGate, PassphraseError> {
    let store = PassphraseStore::new();
    let policy = config.uninitialized_policy();

    match &config.passphrase_dir {
        Some(dir) => {
            let passphrase = store.init(dir)?;
            tracing::info!(
                path = %dir.display(),
                source = ?passphrase.source(),
                "passphrase ready"
            );
        }
        None if policy == UninitializedPolicy::PermitUnauthenticated => {
            tracing::warn!("AUTH_PASSPHRASE_DIR is not set; every request is forwarded unauthenticated")
        }
        None => {
            tracing::warn!("AUTH_PASSPHRASE_DIR is not set; only exempt paths are reachable")
        }
    }

    let allow_list = AllowList::default().with_extra(config.extra_exempt_paths.iter().cloned());
    tracing::debug!(paths = ?allow_list.paths().collect::<Vec<_>>(), "exempt paths");

    Ok(AuthGate::new(Arc::new(store), allow_list).with_uninitialized_policy(policy))
}

pub fn build_router(gate: AuthGate, config: &Config) -> Router {
    let router = Router::new().nest("/api/v1", api::v1::routes());
    let router = middleware::auth::apply(router, gate);
    middleware::http::apply(router, HttpLimits::from(config))
}
