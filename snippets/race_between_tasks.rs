// Race between tasks with select!
async fn fetch_with_fallback(primary: &str, fallback: &str) -> Result<Response, ApiError> {
    tokio::select! {
        res = fetch_from(primary) => {
            tracing::info!("primary answered first");
            res
        }
        res = fetch_from(fallback) => {
            tracing::info!("fallback answered first");
            res
        }
    }
    // The losing future is dropped here
}

async fn fetch_from(url: &str) -> Result<Response, ApiError> {
    let latency = if url.contains("primary") { 3000 } else { 1500 };
    tokio::time::sleep(Duration::from_millis(latency)).await;
    Ok(Response::new(url))
}
