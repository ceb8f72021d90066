// User-triggered action with button state
async fn on_submit(form: Form, button: &mut Button) -> Result<(), SubmitError> {
    if form.email.is_empty() || form.password.is_empty() {
        return Err(SubmitError::MissingFields);
    }

    button.set(ButtonState::Loading, "Processing...");

    match submit(&form).await {
        Ok(()) => button.set(ButtonState::Success, "Success!"),
        Err(err) => {
            button.set(ButtonState::Error, "Error!");
            return Err(err);
        }
    }

    tokio::time::sleep(Duration::from_millis(1500)).await;
    button.set(ButtonState::Idle, "Submit");
    Ok(())
}
