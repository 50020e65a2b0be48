use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CollectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    Batchfile,
    Shellscript,
}

impl ScriptLanguage {
    pub const ALL: [ScriptLanguage; 2] = [ScriptLanguage::Batchfile, ScriptLanguage::Shellscript];

    pub fn name(self) -> &'static str {
        match self {
            ScriptLanguage::Batchfile => "batchfile",
            ScriptLanguage::Shellscript => "shellscript",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CollectionError> {
        let normalized = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|language| language.name() == normalized)
            .ok_or_else(|| {
                CollectionError::new(
                    "UNSUPPORTED_LANGUAGE",
                    format!(
                        "Unsupported language: \"{}\". Supported languages: {}.",
                        name,
                        Self::ALL.map(ScriptLanguage::name).join(", ")
                    ),
                )
            })
    }
}

impl ScriptLanguage {
    pub fn file_extension(self) -> &'static str {
        match self {
            ScriptLanguage::Batchfile => "bat",
            ScriptLanguage::Shellscript => "sh",
        }
    }
}

impl fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Windows,
    Linux,
    Macos,
}

impl OperatingSystem {
    pub const ALL: [OperatingSystem; 3] = [
        OperatingSystem::Windows,
        OperatingSystem::Linux,
        OperatingSystem::Macos,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OperatingSystem::Windows => "windows",
            OperatingSystem::Linux => "linux",
            OperatingSystem::Macos => "macos",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CollectionError> {
        let normalized = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|os| os.name() == normalized)
            .ok_or_else(|| {
                CollectionError::new(
                    "UNSUPPORTED_OS",
                    format!(
                        "Unsupported operating system: \"{}\". Supported: {}.",
                        name,
                        Self::ALL.map(OperatingSystem::name).join(", ")
                    ),
                )
            })
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Language of a collection plus the code wrapped around every generated
/// script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptingDefinition {
    pub language: ScriptLanguage,
    pub start_code: String,
    pub end_code: String,
}

impl ScriptingDefinition {
    pub fn file_extension(&self) -> &'static str {
        self.language.file_extension()
    }
}

/// Ordered from least to most aggressive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationLevel {
    Standard,
    Strict,
}

impl RecommendationLevel {
    pub const ALL: [RecommendationLevel; 2] =
        [RecommendationLevel::Standard, RecommendationLevel::Strict];

    pub fn display_name(self) -> &'static str {
        match self {
            RecommendationLevel::Standard => "Standard",
            RecommendationLevel::Strict => "Strict",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(RecommendationLevel::Standard),
            "strict" => Some(RecommendationLevel::Strict),
            _ => None,
        }
    }
}

/// Final, ready-to-run code of a script. A missing `revert` means the script
/// cannot be reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptCode {
    pub execute: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub name: String,
    pub docs: Vec<String>,
    pub code: ScriptCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_level: Option<RecommendationLevel>,
}

impl Script {
    pub fn can_revert(&self) -> bool {
        self.code.revert.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: usize,
    pub name: String,
    pub docs: Vec<String>,
    pub subcategories: Vec<Category>,
    pub scripts: Vec<Script>,
}

impl Category {
    /// Scripts of this category and all of its descendants, depth first.
    pub fn all_scripts(&self) -> Vec<&Script> {
        let mut out = Vec::new();
        self.collect_scripts(&mut out);
        out
    }

    fn collect_scripts<'a>(&'a self, out: &mut Vec<&'a Script>) {
        out.extend(self.scripts.iter());
        for subcategory in &self.subcategories {
            subcategory.collect_scripts(out);
        }
    }

    pub fn find_category(&self, id: usize) -> Option<&Category> {
        if self.id == id {
            return Some(self);
        }
        self.subcategories
            .iter()
            .find_map(|subcategory| subcategory.find_category(id))
    }

    pub fn total_categories(&self) -> usize {
        1 + self
            .subcategories
            .iter()
            .map(Category::total_categories)
            .sum::<usize>()
    }
}

/// Top-level result of compiling one collection source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCollection {
    pub language: ScriptLanguage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OperatingSystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripting: Option<ScriptingDefinition>,
    pub actions: Vec<Category>,
}

impl CategoryCollection {
    pub fn all_scripts(&self) -> Vec<&Script> {
        self.actions
            .iter()
            .flat_map(|category| category.all_scripts())
            .collect()
    }

    /// Scripts recommended at `level` or at a less aggressive level.
    pub fn scripts_by_level(&self, level: RecommendationLevel) -> Vec<&Script> {
        self.all_scripts()
            .into_iter()
            .filter(|script| {
                script
                    .recommendation_level
                    .is_some_and(|script_level| script_level <= level)
            })
            .collect()
    }

    pub fn find_script(&self, name: &str) -> Option<&Script> {
        self.all_scripts()
            .into_iter()
            .find(|script| script.name == name)
    }

    pub fn find_category(&self, id: usize) -> Option<&Category> {
        self.actions
            .iter()
            .find_map(|category| category.find_category(id))
    }

    pub fn total_scripts(&self) -> usize {
        self.all_scripts().len()
    }

    pub fn total_categories(&self) -> usize {
        self.actions.iter().map(Category::total_categories).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(name: &str) -> Script {
        Script {
            name: name.to_string(),
            docs: Vec::new(),
            code: ScriptCode {
                execute: format!("echo {}", name),
                revert: None,
            },
            recommendation_level: None,
        }
    }

    fn leveled(name: &str, level: RecommendationLevel) -> Script {
        Script {
            recommendation_level: Some(level),
            ..script(name)
        }
    }

    fn sample_collection() -> CategoryCollection {
        let nested = Category {
            id: 0,
            name: "Nested".to_string(),
            docs: Vec::new(),
            subcategories: Vec::new(),
            scripts: vec![script("b"), leveled("strict", RecommendationLevel::Strict)],
        };
        let root = Category {
            id: 1,
            name: "Root".to_string(),
            docs: Vec::new(),
            subcategories: vec![nested],
            scripts: vec![script("a"), leveled("standard", RecommendationLevel::Standard)],
        };
        CategoryCollection {
            language: ScriptLanguage::Shellscript,
            os: None,
            scripting: None,
            actions: vec![root],
        }
    }

    #[test]
    fn language_names_round_trip_case_insensitively() {
        assert_eq!(
            ScriptLanguage::from_name("BatchFile").expect("batchfile"),
            ScriptLanguage::Batchfile
        );
        assert_eq!(ScriptLanguage::Shellscript.to_string(), "shellscript");
    }

    #[test]
    fn unknown_language_is_rejected() {
        let error = ScriptLanguage::from_name("powershell").expect_err("unsupported");
        assert_eq!(error.code, "UNSUPPORTED_LANGUAGE");
        assert!(error.message.contains("powershell"));
    }

    #[test]
    fn recommendation_levels_parse_case_insensitively() {
        assert_eq!(
            RecommendationLevel::from_name("Strict"),
            Some(RecommendationLevel::Strict)
        );
        assert_eq!(RecommendationLevel::from_name("loose"), None);
    }

    #[test]
    fn collection_queries_walk_the_whole_tree() {
        let collection = sample_collection();
        assert_eq!(collection.total_scripts(), 4);
        assert_eq!(collection.total_categories(), 2);
        assert_eq!(
            collection.find_category(0).map(|c| c.name.as_str()),
            Some("Nested")
        );
        assert!(collection.find_script("b").is_some());
        assert!(collection.find_script("c").is_none());
    }

    #[test]
    fn scripts_by_level_includes_less_aggressive_levels() {
        let collection = sample_collection();
        let names = |level| {
            collection
                .scripts_by_level(level)
                .into_iter()
                .map(|script| script.name.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(RecommendationLevel::Standard), vec!["standard"]);
        assert_eq!(names(RecommendationLevel::Strict), vec!["standard", "strict"]);
    }

    #[test]
    fn operating_systems_parse_case_insensitively() {
        assert_eq!(
            OperatingSystem::from_name("Windows").expect("windows"),
            OperatingSystem::Windows
        );
        let error = OperatingSystem::from_name("beos").expect_err("unsupported");
        assert_eq!(error.code, "UNSUPPORTED_OS");
    }

    #[test]
    fn scripting_definition_knows_its_file_extension() {
        let definition = ScriptingDefinition {
            language: ScriptLanguage::Batchfile,
            start_code: "@echo off".to_string(),
            end_code: "exit /b 0".to_string(),
        };
        assert_eq!(definition.file_extension(), "bat");
        let json = serde_json::to_value(&definition).expect("serialize");
        assert_eq!(json["startCode"], "@echo off");
    }

    #[test]
    fn script_code_without_revert_skips_field_in_json() {
        let json = serde_json::to_value(script("a")).expect("serialize");
        assert!(json["code"].get("revert").is_none());
        assert!(json.get("recommendationLevel").is_none());
    }
}
