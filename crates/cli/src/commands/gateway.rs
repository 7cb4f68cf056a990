//! `docrelay gateway`: start the HTTP API server.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("DocRelay Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Documents: {}", config.documents.database_url);
    println!(
        "   Auth:      {}",
        if config.gateway.bearer_tokens.is_empty() { "disabled" } else { "bearer token" }
    );

    docrelay_gateway::start(config).await?;

    Ok(())
}
