// Timeout: give up on an operation that takes too long
async fn fetch_with_timeout(url: &str, limit: Duration) -> Result<Data, ApiError> {
    match tokio::time::timeout(limit, fetch(url)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ApiError::Timeout(limit)),
    }
}

#[tokio::main]
async fn main() {
    // The request takes 5s but we only wait 2s
    let result = fetch_with_timeout("https://api.example.com/slow", Duration::from_secs(2)).await;
    if let Err(ApiError::Timeout(limit)) = result {
        eprintln!("request timed out after {limit:?}");
    }
}
