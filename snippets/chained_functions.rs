// Chaining async functions: each output feeds the next
async fn create_session(username: &str, password: &str) -> Result<Session, AuthError> {
    let auth = authenticate(username, password).await?;     // ~1000ms
    let profile = fetch_profile(&auth.user_id).await?;      // ~800ms
    let permissions = fetch_permissions(&profile.role).await?; // ~600ms

    Ok(Session {
        user: profile,
        auth,
        permissions,
        is_active: true,
    })
}
