//! `docrelay ask`: relay one prompt over stored documents.

use std::sync::Arc;

use docrelay_core::provider::ProviderKind;
use docrelay_core::request::PromptRequest;
use docrelay_relay::RelayPipeline;

pub struct AskArgs {
    pub api: String,
    pub document_ids: Vec<String>,
    pub prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub api_key: Option<String>,
}

/// Translate command-line arguments into the same request the gateway takes.
pub fn build_request(args: AskArgs) -> PromptRequest {
    let mut request = PromptRequest {
        api: args.api,
        prompt: args.prompt,
        selected_document_ids: args.document_ids,
        max_tokens: args.max_tokens.map(serde_json::Value::from),
        ..Default::default()
    };

    if let Some(key) = args.api_key {
        request.use_frontend_api_key = true;
        match request.api.parse::<ProviderKind>() {
            Ok(ProviderKind::OpenAi) => request.open_ai_api_key = Some(key),
            Ok(ProviderKind::Claude) => request.claude_api_key = Some(key),
            Ok(ProviderKind::Custom) => request.custom_api_key = Some(key),
            // Rejected by normalization before anything else happens.
            Err(_) => {}
        }
    }

    request
}

pub async fn run(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = Arc::new(super::open_store(&config).await?);
    let pipeline = RelayPipeline::from_config(&config, store.clone())?;

    let outcome = pipeline.handle(build_request(args)).await;
    store.close().await;
    let result = outcome?;

    eprintln!(
        "[{} / {}: {} input tokens, {} output tokens allowed]",
        result.provider, result.model, result.input_tokens, result.output_token_budget
    );
    println!("{}", result.answer_text);

    Ok(())
}
