//! `docrelay models`: list model profiles.

use docrelay_relay::ModelCatalog;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let catalog = ModelCatalog::from_config(&config.models)?;

    let in_use: Vec<(&str, &str)> = config
        .providers
        .iter()
        .map(|(name, p)| (name, p.model.as_str()))
        .collect();

    println!("{:<24} {:>10}  {:<12} {}", "MODEL", "CONTEXT", "TOKENIZER", "USED BY");
    for profile in catalog.list() {
        let used_by: Vec<&str> = in_use
            .iter()
            .filter(|(_, model)| *model == profile.model_id)
            .map(|(name, _)| *name)
            .collect();
        println!(
            "{:<24} {:>10}  {:<12} {}",
            profile.model_id,
            profile.context_window_tokens,
            profile.tokenizer.as_str(),
            used_by.join(", ")
        );
    }

    for (name, model) in &in_use {
        if catalog.get(model).is_err() {
            println!(
                "\nwarning: {name} uses model '{model}' which has no profile; \
                 add it under [[models]]"
            );
        }
    }

    Ok(())
}
