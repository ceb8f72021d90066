// Processing a list of items asynchronously
async fn process_sequentially(users: &[User]) -> Vec<Processed> {
    let mut results = Vec::with_capacity(users.len());
    for user in users {
        results.push(process(user).await);
    }
    results
}

async fn process_concurrently(users: &[User]) -> Vec<Processed> {
    futures::future::join_all(users.iter().map(process)).await
}

async fn process(user: &User) -> Processed {
    tokio::time::sleep(Duration::from_millis(500)).await;
    Processed { id: user.id, name: user.name.clone(), done: true }
}
