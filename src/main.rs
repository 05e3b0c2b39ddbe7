use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use login_guard::config::Args;
use login_guard::router;
use login_guard::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "login_guard=info,security=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();
    let state = Arc::new(AppState::from_args(&args)?);

    let ip = state.ip_guard.config();
    let account = state.account_guard.config();
    tracing::info!(
        threshold = ip.threshold(),
        lockout_secs = ip.lockout().as_secs(),
        "IP lockout policy"
    );
    tracing::info!(
        threshold = account.threshold(),
        lockout_secs = account.lockout().as_secs(),
        "account lockout policy"
    );
    if let Some(max) = args.max_tracked {
        tracing::info!(max, "attempt tables bounded");
    }

    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("login guard listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
