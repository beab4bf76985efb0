// Resume tailoring: prompt building, model calls, output normalization, keyword matching.
// All inference calls go through llm_client — no direct HTTP calls here.

pub mod handlers;
pub mod matcher;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
