use quill_types::TransformKind;

/// Build the model prompt for a transformation. Every prompt asks for the bare
/// result so the response can be spliced into a document as-is.
pub fn build_prompt(text: &str, kind: TransformKind) -> String {
    let instruction = match kind {
        TransformKind::Enhance => {
            "Enhance the following text to make it clearer, more engaging, and more professional:"
        }
        TransformKind::Expand => {
            "Expand the following text with more details, examples, and explanations:"
        }
        TransformKind::Simplify => {
            "Simplify the following text to make it easier to understand, using simpler words and shorter sentences:"
        }
        TransformKind::Summarize => {
            "Summarize the following text into a concise version that captures the main points:"
        }
        TransformKind::Rewrite => {
            "Rewrite the following text in a different style while preserving the core meaning:"
        }
        TransformKind::Command => {
            return format!(
                "{}\n\nRespond directly without prefacing with explanations or conclusions.",
                text
            );
        }
    };

    format!(
        "{}\n\n\"{}\"\n\nProvide only the {} text without any additional explanations.",
        instruction,
        text,
        result_noun(kind)
    )
}

fn result_noun(kind: TransformKind) -> &'static str {
    match kind {
        TransformKind::Enhance => "enhanced",
        TransformKind::Expand => "expanded",
        TransformKind::Simplify => "simplified",
        TransformKind::Summarize => "summarized",
        TransformKind::Rewrite => "rewritten",
        TransformKind::Command => "requested",
    }
}

/// Strip the wrapping a model tends to add around an answer: surrounding
/// whitespace, a markdown code fence, or a single pair of quotes echoed from
/// the prompt.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(inner) = text.strip_prefix("```") {
        // Drop an optional language tag on the opening fence.
        let inner = match inner.find('\n') {
            Some(idx) => &inner[idx + 1..],
            None => inner,
        };
        text = inner.strip_suffix("```").unwrap_or(inner).trim();
    }

    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}')] {
        if text.len() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            // Leave text alone when the quotes belong to separate quotations.
            if !inner.contains(open) && !inner.contains(close) {
                text = inner.trim();
            }
            break;
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_prompts_quote_the_input() {
        for kind in TransformKind::ALL {
            if kind == TransformKind::Command {
                continue;
            }
            let prompt = build_prompt("the cat sat", kind);
            assert!(prompt.contains("\"the cat sat\""), "{kind}: {prompt}");
            assert!(prompt.contains("Provide only the"), "{kind}: {prompt}");
        }
        assert!(build_prompt("x", TransformKind::Summarize).starts_with("Summarize"));
    }

    #[test]
    fn command_prompt_is_the_instruction_itself() {
        let prompt = build_prompt("List three synonyms for happy", TransformKind::Command);
        assert!(prompt.starts_with("List three synonyms for happy\n"));
        assert!(!prompt.contains('"'));
    }

    #[test]
    fn cleans_quotes_and_fences() {
        assert_eq!(clean_response("  \"the cat sits\"\n"), "the cat sits");
        assert_eq!(clean_response("\u{201c}hello\u{201d}"), "hello");
        assert_eq!(clean_response("```text\nplain body\n```"), "plain body");
        assert_eq!(clean_response("\"a\" and \"b\""), "\"a\" and \"b\"");
        assert_eq!(clean_response("   "), "");
    }
}
