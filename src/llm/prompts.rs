//! Prompt templates for grounded question answering

use std::collections::HashMap;

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, &str>) -> String {
        let mut result = self.template.clone();
        for var in &self.variables {
            if let Some(value) = values.get(var.as_str()) {
                result = result.replace(&format!("{{{{{var}}}}}"), value);
            }
        }
        result
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next(); // skip second '{'
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// Prompts used by the answer generator
pub struct RagPrompts;

impl RagPrompts {
    /// System instruction fixing the assistant's grounding rules
    #[must_use]
    pub fn system(subject: &str) -> String {
        PromptTemplate::new(
            r#"You are an AI assistant that answers questions about {{subject}}.
Your rules:
1. Answer ONLY using the provided context
2. If the context doesn't have the answer, say "I don't have that information"
3. Be conversational and friendly
4. Keep answers concise but informative
5. Cite which part of the context you're using

Remember: Be helpful, accurate, and honest."#,
        )
        .render(&HashMap::from([("subject", subject)]))
    }

    /// Context-based QA prompt
    #[must_use]
    pub fn context_qa() -> PromptTemplate {
        PromptTemplate::new(
            r"Context:
{{context}}

Question: {{question}}

Based on the context above, please answer the question.
If the context doesn't contain the answer, say so clearly.",
        )
    }

    /// Conversation summary prompt
    #[must_use]
    pub fn conversation_summary() -> PromptTemplate {
        PromptTemplate::new(
            r"Summarize the following conversation in 2-3 sentences.
Focus on what the user wanted to know and what they learned.

{{conversation}}",
        )
    }
}
