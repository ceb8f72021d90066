// Sequential async calls: each call needs the previous result
async fn load_dashboard(user_id: u64) -> Result<Dashboard, ApiError> {
    let user = fetch_user(user_id).await?;
    let posts = fetch_posts(user.id).await?;
    let comments = fetch_comments(posts[0].id).await?;

    Ok(Dashboard { user, posts, comments })
}

async fn fetch_user(id: u64) -> Result<User, ApiError> {
    tokio::time::sleep(Duration::from_millis(1000)).await;
    Ok(User { id, name: "John Doe".into() })
}

async fn fetch_posts(user_id: u64) -> Result<Vec<Post>, ApiError> {
    tokio::time::sleep(Duration::from_millis(1000)).await;
    Ok(vec![Post::new(1, user_id, "First Post"), Post::new(2, user_id, "Second Post")])
}

async fn fetch_comments(post_id: u64) -> Result<Vec<Comment>, ApiError> {
    tokio::time::sleep(Duration::from_millis(1000)).await;
    Ok(vec![Comment::new(post_id, "Great post!")])
}
