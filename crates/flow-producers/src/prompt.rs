//! Prompt text sent to language-model producers

use flow_engine::GenerationRequest;

/// Closing directive appended to every prompt
pub const GROUNDING_DIRECTIVE: &str =
    "Create high-quality, engaging content based ONLY on the notes provided.";

/// Render a request as a CONTEXT / TASK / FORMAT prompt
pub fn render_prompt(request: &GenerationRequest) -> String {
    format!(
        "CONTEXT:\n{}\n\nTASK:\n{}\n\nFORMAT:\n{}\n\n{}",
        request.input.trim(),
        request.instruction.trim(),
        request.format_label.trim(),
        GROUNDING_DIRECTIVE
    )
}
