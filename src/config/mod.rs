//! Configuration module for Recast.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{DocumentPrompts, InsightPrompts, Prompts, SocialPrompts};
pub use settings::{
    ExtractionSettings, GeneralSettings, GenerationProvider, GenerationSettings, PromptSettings,
    SegmenterSettings, Settings, SocialSettings, StageSettings, StoreSettings, SynthesisSettings,
};
