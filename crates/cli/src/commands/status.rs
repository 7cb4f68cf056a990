//! `docrelay status`: show configuration and provider status.

use docrelay_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    println!("DocRelay Status");
    println!("===============");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Documents:     {}", config.documents.database_url);
    println!("  Gateway:       {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  Auth:          {}",
        if config.gateway.bearer_tokens.is_empty() {
            "disabled".to_string()
        } else {
            format!("{} bearer token(s)", config.gateway.bearer_tokens.len())
        }
    );
    println!("  Safety margin: {} tokens", config.relay.safety_margin);
    println!("  Default max:   {} tokens", config.relay.default_max_tokens);

    println!("\n  Providers:");
    for (name, provider) in config.providers.iter() {
        let key = if provider.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            "operator key set"
        } else {
            "no operator key"
        };
        println!(
            "    {name:<7} {:<20} {} ({}s timeout, {key})",
            provider.model, provider.api_url, provider.timeout_secs
        );
    }

    // Check config file existence
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found: {}", config_path.display());
    } else {
        println!("\n  No config file at {}; using defaults", config_path.display());
    }

    Ok(())
}
