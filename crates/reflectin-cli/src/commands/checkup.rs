use reflectin_core::{ChatBackend, HttpChatBackend};

/// Fetch and print the backend's check-up prompt.
pub async fn run(base_url: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::chat::load_config(base_url)?;
    let backend = HttpChatBackend::new(&config.backend)?;
    let message = backend.checkup().await?;
    println!("{message}");
    Ok(())
}
