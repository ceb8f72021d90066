// Parallel async calls with try_join!
async fn load_profile_page(user_id: u64) -> Result<ProfilePage, ApiError> {
    // All three requests are in flight at once; total time is the slowest one
    let (user, posts, notifications) = tokio::try_join!(
        fetch_user(user_id),          // ~2000ms
        fetch_posts(user_id),         // ~1500ms
        fetch_notifications(user_id), // ~1000ms
    )?;

    Ok(ProfilePage { user, posts, notifications })
}
