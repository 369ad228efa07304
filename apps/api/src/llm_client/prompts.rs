// Shared prompt fragments. Stage templates live in analysis/prompts.rs.

/// Default system prompt: JSON-only output.
/// The extractor still tolerates prose and fences when the model ignores this.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured resume analyst. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Slightly warmer system prompt for stages that write resume copy.
pub const RESUME_WRITER_SYSTEM: &str = "You are an expert resume writer. \
    Write concise, factual resume content grounded only in the supplied resume. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object.";
