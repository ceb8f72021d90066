// Retry with exponential backoff
async fn fetch_with_retry(url: &str, max_attempts: u32) -> Result<Data, ApiError> {
    let mut attempt = 0;

    loop {
        attempt += 1;
        match fetch(url).await {
            Ok(data) => return Ok(data),
            Err(err) if attempt >= max_attempts => {
                return Err(ApiError::Exhausted { attempts: attempt, last: Box::new(err) });
            }
            Err(err) => {
                let delay = Duration::from_millis(1000 * 2u64.pow(attempt));
                tracing::warn!(attempt, ?delay, %err, "retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
