use api::setup_router;
use app::{config::Config, state::AppState};

pub async fn run() {
    let config = Config::from_env();

    let state = AppState::new(config.clone());
    let router = setup_router(state);

    let listener = tokio::net::TcpListener::bind(config.get_server_url())
        .await
        .expect("bind to port");
    tracing::debug!(
        "listening on http://{}",
        listener.local_addr().expect("local addr")
    );

    axum::serve(listener, router).await.expect("start server");
}
