//! Prompt types for MedAssist.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Behavioral settings
    pub behavior: PromptBehavior,

    /// Context injection settings
    #[serde(default)]
    pub context: PromptContextConfig,

    /// Fixed instruction text injected as `{{instructions}}`
    #[serde(default)]
    pub instructions: PromptInstructions,

    /// Template string with Handlebars syntax
    pub template: String,

    /// Output specification
    pub output: PromptOutputSpec,
}

/// Behavioral settings for prompt execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptBehavior {
    /// Tone (e.g., "professional", "casual")
    pub tone: String,

    /// Style (e.g., "concise", "structured")
    pub style: String,
}

/// Context injection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContextConfig {
    /// Inject retrieved evidence as `{{evidence}}`
    #[serde(rename = "includeEvidence", default = "default_true")]
    pub include_evidence: bool,
}

impl Default for PromptContextConfig {
    fn default() -> Self {
        Self {
            include_evidence: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Two-part system instruction: who the model is, and the shape of its answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptInstructions {
    #[serde(default)]
    pub persona: String,

    #[serde(default)]
    pub format: String,
}

impl PromptInstructions {
    /// Persona and format joined by a blank line. Empty parts are dropped.
    pub fn combined(&self) -> String {
        [self.persona.trim(), self.format.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Output specification for the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOutputSpec {
    /// Output format (e.g., "text", "markdown")
    pub format: String,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Whether retrieved evidence was injected
    #[serde(rename = "evidenceIncluded")]
    pub evidence_included: bool,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        evidence_included: bool,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                evidence_included,
                resolved_variables,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: test.prompt
title: Test Prompt
apiVersion: "1.0"
createdBy: test
behavior:
  tone: professional
  style: concise
context:
  includeEvidence: false
instructions:
  persona: "You are a pharmacist."
template: "{{condition}}"
output:
  format: markdown
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "test.prompt");
        assert_eq!(def.behavior.tone, "professional");
        assert!(!def.context.include_evidence);
        assert_eq!(def.instructions.persona, "You are a pharmacist.");
        assert!(def.instructions.format.is_empty());
    }

    #[test]
    fn test_context_defaults_to_evidence() {
        let yaml = r#"
id: minimal
title: Minimal
apiVersion: "1.0"
behavior: { tone: plain, style: short }
template: "{{condition}}"
output: { format: text }
"#;
        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(def.context.include_evidence);
    }

    #[test]
    fn test_instructions_combined() {
        let instructions = PromptInstructions {
            persona: "  Persona.\n".to_string(),
            format: "Format.".to_string(),
        };
        assert_eq!(instructions.combined(), "Persona.\n\nFormat.");

        let persona_only = PromptInstructions {
            persona: "Persona.".to_string(),
            format: String::new(),
        };
        assert_eq!(persona_only.combined(), "Persona.");
    }

    #[test]
    fn test_built_prompt_creation() {
        let mut vars = HashMap::new();
        vars.insert("condition".to_string(), "flu".to_string());

        let built = BuiltPrompt::new(
            None,
            "User message".to_string(),
            "test.prompt".to_string(),
            true,
            vars,
        );

        assert_eq!(built.user, "User message");
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
        assert!(built.metadata.evidence_included);
    }
}
