//! Prompt rendering and completion shared by the LLM-backed stages.

use std::collections::HashMap;

use lynx_rag_core::traits::ChatModel;
use lynx_rag_core::{ExecutionContext, PromptTemplate, Result};

/// Parse `template` and check that it binds every `required` variable.
pub(crate) fn validated_template(template: &str, required: &[&str]) -> Result<PromptTemplate> {
    let template = PromptTemplate::new(template)?;
    template.validate_variables(required)?;
    Ok(template)
}

/// Render `template` with `values`, complete it, and trim the answer.
pub(crate) async fn complete(
    ctx: &ExecutionContext,
    model: &dyn ChatModel,
    template: &PromptTemplate,
    values: &HashMap<&str, String>,
) -> Result<String> {
    let prompt = template.render(values)?;
    let completion = ctx.run(model.complete(&prompt)).await?;
    Ok(completion.trim().to_string())
}
