// Error handling with Result and ?
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("not authorized")]
    Auth,
}

async fn fetch_data(url: &str) -> Result<Data, ApiError> {
    tokio::time::sleep(Duration::from_millis(1500)).await;

    if rand::random::<bool>() {
        return Err(ApiError::Network(format!("failed to fetch {url}")));
    }
    Ok(Data::default())
}

async fn load() -> Option<Data> {
    match fetch_data("https://api.example.com/data").await {
        Ok(data) => Some(data),
        Err(ApiError::Network(msg)) => {
            tracing::warn!(%msg, "network problem, showing cached data");
            None
        }
        Err(ApiError::Auth) => {
            tracing::warn!("redirecting to login");
            None
        }
    }
}
