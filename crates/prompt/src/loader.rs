//! Prompt loader for YAML prompt definitions.
//!
//! Prompts are looked up in `.medassist/prompts/<id>.yml` inside the
//! workspace first; prompts that ship with the binary are used when no
//! override file exists.

use crate::types::PromptDefinition;
use medassist_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Identifier of the built-in advice prompt.
pub const DEFAULT_ADVICE_PROMPT_ID: &str = "medical.advice.default";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[(
    DEFAULT_ADVICE_PROMPT_ID,
    include_str!("../prompts/medical.advice.default.yml"),
)];

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".medassist/prompts")
}

/// Load a prompt definition by ID.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.medassist/`
/// * `prompt_id` - Prompt identifier (e.g., "medical.advice.default")
///
/// # Example
/// ```no_run
/// use medassist_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "medical.advice.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    tracing::debug!("Looking for prompt override at: {:?}", prompt_file);

    if !prompt_file.exists() {
        return builtin_prompt(prompt_id)?.ok_or_else(|| {
            AppError::Prompt(format!("Prompt file not found: {:?}", prompt_file))
        });
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents)
        .map_err(|e| AppError::Prompt(format!("{:?}: {}", prompt_file, e)))?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Return a prompt compiled into the binary, if `prompt_id` names one.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<Option<PromptDefinition>> {
    BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .map(|(_, yaml)| parse_prompt(yaml))
        .transpose()
}

/// List all available prompt IDs: workspace overrides plus built-ins.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !prompt_ids.iter().any(|id| id == stem) {
                        prompt_ids.push(stem.to_string());
                    }
                }
            }
        }
    }

    Ok(prompt_ids)
}

fn parse_prompt(contents: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML: {}", e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.template.contains("{{condition}}") {
        return Err(AppError::Prompt(format!(
            "Prompt {} never uses {{{{condition}}}}",
            def.id
        )));
    }

    if def.context.include_evidence && !def.template.contains("{{evidence}}") {
        return Err(AppError::Prompt(format!(
            "Prompt {} sets includeEvidence but its template has no {{{{evidence}}}}",
            def.id
        )));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
