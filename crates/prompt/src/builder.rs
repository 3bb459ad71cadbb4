//! Prompt builder for rendering templates and injecting retrieved evidence.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use medassist_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// This function:
/// 1. Injects the definition's fixed instructions as `instructions`
/// 2. Injects retrieved evidence as `evidence` if the definition asks for it
/// 3. Renders the template using Handlebars with the collected variables
///
/// # Arguments
/// * `definition` - Prompt definition loaded from YAML
/// * `variables` - Template variables (e.g., "condition" -> user input)
/// * `evidence` - Text retrieved from trusted sources, if any
///
/// # Example
/// ```no_run
/// use medassist_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("condition".to_string(), "flu".to_string());
///
/// let built = build_prompt(&def, vars, Some("Influenza is a viral infection."))?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    mut variables: HashMap<String, String>,
    evidence: Option<&str>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    variables.insert(
        "instructions".to_string(),
        definition.instructions.combined(),
    );

    let evidence_included = if definition.context.include_evidence {
        match evidence {
            Some(text) => {
                variables.insert("evidence".to_string(), text.to_string());
                tracing::debug!("Injected {} chars of evidence", text.chars().count());
                true
            }
            None => {
                tracing::warn!("Evidence requested by prompt but none provided");
                false
            }
        }
    } else {
        false
    };

    let rendered = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        None,
        rendered,
        definition.id.clone(),
        evidence_included,
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Evidence is scraped HTML text; it must reach the model verbatim
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{builtin_prompt, DEFAULT_ADVICE_PROMPT_ID};
    use crate::types::{PromptBehavior, PromptContextConfig, PromptInstructions, PromptOutputSpec};

    fn create_test_definition(include_evidence: bool) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PromptBehavior {
                tone: "professional".to_string(),
                style: "concise".to_string(),
            },
            context: PromptContextConfig { include_evidence },
            instructions: PromptInstructions {
                persona: "Doctor.".to_string(),
                format: "Tables.".to_string(),
            },
            template: "{{evidence}}|{{instructions}}|{{condition}}".to_string(),
            output: PromptOutputSpec {
                format: "markdown".to_string(),
            },
        }
    }

    fn condition_vars(condition: &str) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("condition".to_string(), condition.to_string());
        vars
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Condition: {{condition}}", &condition_vars("flu"));
        assert_eq!(result.unwrap(), "Condition: flu");
    }

    #[test]
    fn test_build_prompt_with_evidence() {
        let def = create_test_definition(true);
        let built = build_prompt(&def, condition_vars("flu"), Some("E")).unwrap();

        assert_eq!(built.user, "E|Doctor.\n\nTables.|flu");
        assert!(built.metadata.evidence_included);
        assert!(built.system.is_none());
    }

    #[test]
    fn test_build_prompt_evidence_disabled() {
        let def = create_test_definition(false);
        let built = build_prompt(&def, condition_vars("flu"), Some("E")).unwrap();

        assert_eq!(built.user, "|Doctor.\n\nTables.|flu");
        assert!(!built.metadata.evidence_included);
    }

    #[test]
    fn test_evidence_is_not_html_escaped() {
        let def = create_test_definition(true);
        let built = build_prompt(&def, condition_vars("a & b"), Some("<5% \"risk\"")).unwrap();
        assert!(built.user.starts_with("<5% \"risk\"|"));
        assert!(built.user.ends_with("|a & b"));
    }

    #[test]
    fn test_builtin_advice_prompt_layout() {
        let def = builtin_prompt(DEFAULT_ADVICE_PROMPT_ID).unwrap().unwrap();
        let built = build_prompt(&def, condition_vars("flu"), Some("Excerpt A\n\nExcerpt B")).unwrap();

        let expected = format!(
            "The following medical content was retrieved from trusted sources to enhance accuracy:\n\n\
             Excerpt A\n\nExcerpt B\n\n---\n\n{}\n\nCondition: flu",
            def.instructions.combined()
        );
        assert_eq!(built.user, expected);
    }

    #[test]
    fn test_render_template_missing_variable() {
        let result = render_template("Condition: {{missing}}", &HashMap::new());
        // Handlebars renders missing variables as empty string
        assert_eq!(result.unwrap(), "Condition: ");
    }
}
