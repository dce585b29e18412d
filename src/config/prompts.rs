//! Prompt templates for Recast.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub insights: InsightPrompts,
    pub chapters: DocumentPrompts,
    pub blogs: DocumentPrompts,
    pub social: SocialPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            insights: InsightPrompts::default(),
            chapters: DocumentPrompts::chapters(),
            blogs: DocumentPrompts::blogs(),
            social: SocialPrompts::default(),
            variables: std::collections::HashMap::new(),
        }
    }
}

/// Prompts for insight refinement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightPrompts {
    pub system: String,
    pub user: String,
}

impl Default for InsightPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an editor distilling a speaker's own words into crisp insights.

Rules:
- Use only what the excerpt says. Never add facts, numbers or examples that are not in it.
- Keep the speaker's wording wherever possible; prefer quoting over paraphrasing.
- Keep the speaker's point of view (first person stays first person).
- Drop filler, false starts and speaker labels.
- Reply with the insight text only, no heading and no preamble."#
                .to_string(),

            user: r#"Insight title: {{title}}

Draft insight:
{{draft}}

Source excerpt:
{{source}}

Rewrite the draft into a clear 1-3 sentence insight."#
                .to_string(),
        }
    }
}

/// Prompts for long-form documents (chapters and blog posts).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentPrompts {
    pub system: String,
    pub user: String,
}

impl Default for DocumentPrompts {
    fn default() -> Self {
        Self::chapters()
    }
}

impl DocumentPrompts {
    /// Default prompts for book chapters.
    pub fn chapters() -> Self {
        Self {
            system: r#"You turn livestream and talk transcripts into book chapters written in the speaker's authentic voice.

Rules:
- Build the chapter from the draft, which is assembled from the speaker's own sentences.
- Reuse the speaker's phrases literally wherever you can; light edits for flow only.
- Preserve the narrative voice described below (first person, second person, or mixed).
- Never invent stories, statistics, names or claims absent from the draft.
- Remove filler words, repetitions and transcript artifacts.
- Reply with the chapter body only, in plain paragraphs."#
                .to_string(),

            user: r#"Chapter title: {{title}}

Voice: {{voice}}
Characteristic phrases to keep: {{phrases}}
Target length: about {{target_chars}} characters.

Draft:
{{draft}}"#
                .to_string(),
        }
    }

    /// Default prompts for blog posts.
    pub fn blogs() -> Self {
        Self {
            system: r#"You turn transcript excerpts into publish-ready blog posts in the speaker's authentic voice.

Rules:
- Start from the draft; it is made of the speaker's own sentences grouped under insights.
- Keep the speaker's phrasing and point of view; light edits for readability only.
- Use short sections with markdown subheadings where the draft has them.
- Never introduce facts, quotes or claims that are not in the draft.
- Reply with the post body only."#
                .to_string(),

            user: r#"Blog post title: {{title}}

Voice: {{voice}}
Characteristic phrases to keep: {{phrases}}
Target length: about {{target_chars}} characters.

Draft:
{{draft}}"#
                .to_string(),
        }
    }
}

/// Prompts for short-form social posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialPrompts {
    pub system: String,
    pub user: String,
    /// Follow-up used when a post breaks the length ceiling.
    pub retry: String,
}

impl Default for SocialPrompts {
    fn default() -> Self {
        Self {
            system: r#"You write short social media posts from a speaker's insights.

Rules:
- One idea per post, in the speaker's voice.
- Stay strictly under the character limit, hashtags included.
- Only use what the insight says."#
                .to_string(),

            user: r#"Insight: {{title}}

{{draft}}

Write one post of at most {{max_chars}} characters."#
                .to_string(),

            retry: r#"That post was too long. Rewrite this in at most {{max_chars}} characters:

{{draft}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let insights_path = custom_path.join("insights.toml");
            if insights_path.exists() {
                let content = std::fs::read_to_string(&insights_path)?;
                prompts.insights = toml::from_str(&content)?;
            }

            let chapters_path = custom_path.join("chapters.toml");
            if chapters_path.exists() {
                let content = std::fs::read_to_string(&chapters_path)?;
                prompts.chapters = toml::from_str(&content)?;
            }

            let blogs_path = custom_path.join("blogs.toml");
            if blogs_path.exists() {
                let content = std::fs::read_to_string(&blogs_path)?;
                prompts.blogs = toml::from_str(&content)?;
            }

            let social_path = custom_path.join("social.toml");
            if social_path.exists() {
                let content = std::fs::read_to_string(&social_path)?;
                prompts.social = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.insights.system.is_empty());
        assert!(prompts.chapters.system.contains("book chapters"));
        assert!(prompts.blogs.system.contains("blog posts"));
        assert!(prompts.social.user.contains("{{max_chars}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_call_site_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("audience".to_string(), "founders".to_string());
        prompts.variables.insert("title".to_string(), "ignored".to_string());

        let mut vars = HashMap::new();
        vars.insert("title".to_string(), "Pricing".to_string());

        let rendered = prompts.render_with_custom("{{title}} for {{audience}}", &vars);
        assert_eq!(rendered, "Pricing for founders");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("social.toml"),
            "system = \"be brief\"\nuser = \"{{draft}}\"\nretry = \"shorter\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.social.system, "be brief");
        assert!(prompts.blogs.system.contains("blog posts"));
    }
}
