//! Example of using the Arkime client
use arkime::{ClientBuilder, RequestOptions};
use serde_json::Value;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Enable logging
    env_logger::init();

    // Initialize client from ARKIME_URL / ARKIME_CA_CERT
    let client = ClientBuilder::from_env().build()?;

    // Current user, shared between concurrent callers
    let (user, again) = tokio::join!(client.current_user(), client.current_user());
    let user = user?;
    println!("Current user: {} (same lookup: {})", user.user_id, again.is_ok());
    println!("Can search email: {}", user.has_permission("emailSearch"));

    // Sessions for the last hour
    let options = RequestOptions::get("api/sessions")
        .param("date", 1)
        .param("length", 10)
        .param("expression", Value::Null);

    match client.fetch(options).await {
        Ok(sessions) => println!("Sessions: \n{:#}", sessions),
        Err(e) => eprintln!("Session query failed: {}", e.message()),
    }

    if let Some(elapsed) = client.state().response_time() {
        println!("Server response time: {:?}", elapsed);
    }

    Ok(())
}
