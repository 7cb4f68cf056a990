//! Final prompt assembly.
//!
//! Layout, in caller order:
//!
//! ```text
//! <doc 1>\n\n<doc 2>\n\n...<doc n>\n\n<prompt>\n\nFormat the response in Markdown.
//! ```
//!
//! The same text goes to every provider. Assembly is deterministic.

use docrelay_core::document::Document;
use docrelay_core::request::DEFAULT_PROMPT;

/// Joins documents, prompt and directive.
pub const SEPARATOR: &str = "\n\n";

/// Appended to every prompt.
pub const MARKDOWN_DIRECTIVE: &str = "Format the response in Markdown.";

/// Build the single string sent to a provider.
///
/// A blank `user_prompt` is replaced with the default prompt.
pub fn assemble(documents: &[Document], user_prompt: &str) -> String {
    let prompt = if user_prompt.trim().is_empty() {
        DEFAULT_PROMPT
    } else {
        user_prompt
    };

    let capacity = documents.iter().map(|d| d.content.len()).sum::<usize>()
        + prompt.len()
        + MARKDOWN_DIRECTIVE.len()
        + SEPARATOR.len() * (documents.len() + 1);
    let mut out = String::with_capacity(capacity);

    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            out.push_str(SEPARATOR);
        }
        out.push_str(&doc.content);
    }
    out.push_str(SEPARATOR);
    out.push_str(prompt);
    out.push_str(SEPARATOR);
    out.push_str(MARKDOWN_DIRECTIVE);
    out
}
