//! Static content registries: skills, projects and links.
//!
//! Content is read-only. It is either the built-in set or loaded from a
//! TOML file:
//!
//! ```toml
//! [[skills]]
//! name = "Rust"
//! category = "Core"
//!
//! [[projects]]
//! title = "Folio"
//! description = "This page"
//! tech = ["Rust", "tokio"]
//! image = "folio.png"
//! link = "#"
//!
//! [social]
//! github = "https://github.com/someone"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Skill grouping, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    Core,
    Tools,
    Testing,
    Specialized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub category: SkillCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech: Vec<String>,
    pub image: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub whatsapp: Option<String>,
}

impl SocialLinks {
    /// Configured links as (network, url) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("github", &self.github),
            ("linkedin", &self.linkedin),
            ("twitter", &self.twitter),
            ("whatsapp", &self.whatsapp),
        ]
        .into_iter()
        .filter_map(|(name, url)| url.as_deref().map(|url| (name, url)))
    }
}

/// An in-page navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub label: String,
    /// Section anchor, e.g. `#about`
    pub href: String,
}

impl NavLink {
    fn new(label: &str, href: &str) -> Self {
        Self {
            label: label.to_string(),
            href: href.to_string(),
        }
    }

    /// Section id without the leading `#`.
    pub fn target_id(&self) -> &str {
        self.href.trim_start_matches('#')
    }
}

/// All static page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub social: SocialLinks,
    pub nav: Vec<NavLink>,
}

impl Content {
    /// Loads content from a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Skills grouped by category, categories in display order.
    pub fn skills_by_category(&self) -> BTreeMap<SkillCategory, Vec<&Skill>> {
        let mut groups: BTreeMap<SkillCategory, Vec<&Skill>> = BTreeMap::new();
        for skill in &self.skills {
            groups.entry(skill.category).or_default().push(skill);
        }
        groups
    }
}

impl Default for Content {
    fn default() -> Self {
        let skill = |name: &str, category| Skill {
            name: name.to_string(),
            category,
        };

        Self {
            skills: vec![
                skill("TypeScript", SkillCategory::Core),
                skill("React", SkillCategory::Core),
                skill("Git", SkillCategory::Tools),
                skill("Docker", SkillCategory::Tools),
                skill("Jest", SkillCategory::Testing),
                skill("Design Systems", SkillCategory::Specialized),
            ],
            projects: Vec::new(),
            social: SocialLinks::default(),
            nav: vec![
                NavLink::new("About", "#about"),
                NavLink::new("Projects", "#portfolio"),
                NavLink::new("Contact", "#contact"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_in_display_order() {
        let content = Content::default();
        let groups = content.skills_by_category();
        let order: Vec<_> = groups.keys().copied().collect();
        assert_eq!(
            order,
            vec![
                SkillCategory::Core,
                SkillCategory::Tools,
                SkillCategory::Testing,
                SkillCategory::Specialized
            ]
        );
        assert_eq!(groups[&SkillCategory::Core].len(), 2);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.toml");
        std::fs::write(
            &path,
            r##"
            [[skills]]
            name = "Rust"
            category = "Core"

            [[projects]]
            title = "Folio"
            description = "This page"
            image = "folio.png"
            link = "#"

            [social]
            github = "https://github.com/someone"
            "##,
        )
        .unwrap();

        let content = Content::load_from(&path).unwrap();
        assert_eq!(content.skills.len(), 1);
        assert!(content.projects[0].tech.is_empty());
        assert_eq!(
            content.social.iter().collect::<Vec<_>>(),
            vec![("github", "https://github.com/someone")]
        );
        // Sections left out fall back to the built-in defaults
        assert_eq!(content.nav.len(), 3);
        assert_eq!(content.nav[1].target_id(), "portfolio");
    }
}
