// Adapters layer: concrete implementations for external systems.
// GitHub REST (App auth) and the Gemini analysis API live here; the core
// pipeline only sees the domain ports.

pub mod gemini;
pub mod github;
