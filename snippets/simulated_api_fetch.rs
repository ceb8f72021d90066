// Simulated API fetch
async fn fetch_user(id: u64) -> Result<User, ApiError> {
    tracing::info!(id, "sending request");
    tokio::time::sleep(Duration::from_millis(1000)).await;

    tracing::info!("waiting for response");
    tokio::time::sleep(Duration::from_millis(1000)).await;

    Ok(User {
        id,
        name: "John Doe".into(),
        email: "john@example.com".into(),
    })
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let user = fetch_user(1).await?;
    println!("loaded {}", user.name);
    Ok(())
}
