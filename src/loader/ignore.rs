//! Per-pack ignore files: `.pack-ignore` and `.secrets-ignore`

use std::collections::BTreeSet;

use wax::{CandidatePath, Glob, Pattern};

/// One `[file:<glob>]` section of a `.pack-ignore`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSection {
    pub pattern: String,
    pub rule_ids: BTreeSet<String>,
}

/// Parsed `.pack-ignore`: rule ids suppressed per file glob
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackIgnore {
    pub sections: Vec<IgnoreSection>,
    /// Entries of the `[known_words]` section
    pub known_words: Vec<String>,
}

impl PackIgnore {
    pub fn parse(text: &str) -> Self {
        let mut ignore = PackIgnore::default();
        let mut current: Option<IgnoreSection> = None;
        let mut in_known_words = false;

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                if let Some(section) = current.take() {
                    ignore.sections.push(section);
                }
                in_known_words = header == "known_words";
                current = header.strip_prefix("file:").map(|pattern| IgnoreSection {
                    pattern: pattern.trim().to_string(),
                    rule_ids: BTreeSet::new(),
                });
                continue;
            }
            if in_known_words {
                ignore.known_words.push(line.to_string());
                continue;
            }
            let Some(section) = current.as_mut() else {
                continue;
            };
            if let Some(value) = line
                .split_once('=')
                .filter(|(key, _)| key.trim() == "ignore")
                .map(|(_, value)| value)
            {
                section.rule_ids.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|r| !r.is_empty())
                        .map(str::to_string),
                );
            }
        }
        if let Some(section) = current {
            ignore.sections.push(section);
        }
        ignore
    }

    /// Rule ids suppressed for a path relative to the pack root.
    ///
    /// A section matches either the full relative path or the file name.
    pub fn ignored_rules(&self, relative_path: &str) -> BTreeSet<String> {
        let normalized = relative_path.replace('\\', "/");
        let file_name = normalized.rsplit('/').next().unwrap_or(&normalized).to_string();
        let path_candidate = CandidatePath::from(normalized.as_str());
        let name_candidate = CandidatePath::from(file_name.as_str());

        let mut rules = BTreeSet::new();
        for section in &self.sections {
            let matched = match Glob::new(&section.pattern) {
                Ok(glob) => {
                    glob.matched(&path_candidate).is_some() || glob.matched(&name_candidate).is_some()
                }
                Err(_) => section.pattern == file_name || section.pattern == normalized,
            };
            if matched {
                rules.extend(section.rule_ids.iter().cloned());
            }
        }
        rules
    }

    /// Whether `rule_id` is suppressed for `relative_path`
    pub fn is_ignored(&self, relative_path: &str, rule_id: &str) -> bool {
        self.ignored_rules(relative_path).contains(rule_id)
    }
}

/// Parsed `.secrets-ignore`: literal tokens and `file:` path prefixes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretsIgnore {
    pub tokens: BTreeSet<String>,
    pub path_prefixes: Vec<String>,
}

impl SecretsIgnore {
    pub fn parse(text: &str) -> Self {
        let mut ignore = SecretsIgnore::default();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.strip_prefix("file:") {
                Some(prefix) => ignore.path_prefixes.push(prefix.trim().to_string()),
                None => {
                    ignore.tokens.insert(line.to_string());
                }
            }
        }
        ignore
    }

    pub fn allows_token(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn allows_path(&self, path: &str) -> bool {
        self.path_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACK_IGNORE: &str = "\
[file:HelloWorld.yml]
ignore=IF111,DO106

[file:Playbooks/*.yml]
ignore=PB100

[known_words]
HelloWorld
acme
";

    #[test]
    fn test_parse_pack_ignore() {
        let ignore = PackIgnore::parse(PACK_IGNORE);
        assert_eq!(ignore.sections.len(), 2);
        assert_eq!(ignore.sections[0].pattern, "HelloWorld.yml");
        assert!(ignore.sections[0].rule_ids.contains("DO106"));
        assert_eq!(ignore.known_words, vec!["HelloWorld", "acme"]);
    }

    #[test]
    fn test_match_by_file_name() {
        let ignore = PackIgnore::parse(PACK_IGNORE);
        assert!(ignore.is_ignored("Integrations/HelloWorld/HelloWorld.yml", "IF111"));
        assert!(!ignore.is_ignored("Integrations/HelloWorld/HelloWorld.yml", "PB100"));
    }

    #[test]
    fn test_match_by_glob() {
        let ignore = PackIgnore::parse(PACK_IGNORE);
        assert!(ignore.is_ignored("Playbooks/playbook-Triage.yml", "PB100"));
        assert!(!ignore.is_ignored("Scripts/X/X.yml", "PB100"));
    }

    #[test]
    fn test_parse_secrets_ignore() {
        let ignore = SecretsIgnore::parse("8.8.8.8\nfile:Integrations/HelloWorld/test_data\n\n");
        assert!(ignore.allows_token("8.8.8.8"));
        assert!(ignore.allows_path("Integrations/HelloWorld/test_data/a.json"));
        assert!(!ignore.allows_path("Scripts/X"));
    }
}
