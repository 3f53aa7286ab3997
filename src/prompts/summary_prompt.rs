//! Conversation summarization prompt

/// Placeholder replaced with the rendered transcript
const CONVERSATION_PLACEHOLDER: &str = "{conversation}";

const SUMMARY_TEMPLATE: &str = r#"You are an expert at summarizing conversations clearly and concisely.

Follow these rules strictly:
- Keep the summary objective and factual
- Include only the most important points, decisions, questions, conclusions
- Preserve original meaning; do not add interpretations or opinions
- Use neutral language
- Structure logically (chronological or by topic)
- Highlight open questions, action items, unresolved issues
- Be concise: aim for 15-30% of original length unless very short
- Indicate speakers when relevant

Conversation:
{conversation}

Summary:
"#;

/// Builds the summarization request for a rendered transcript
pub fn generate_summary_prompt(conversation: &str) -> String {
    SUMMARY_TEMPLATE.replace(CONVERSATION_PLACEHOLDER, conversation)
}
