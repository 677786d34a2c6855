//! Name mappings for `classtool rename`.
//!
//! A mapping file holds one rule per line:
//!
//! ```txt
//! # exact class
//! class a/b/C=x/y/Z
//! # a package and everything below it
//! package com.example=shaded.com.example
//! ```

use anyhow::{bail, Context, Result};
use std::{collections::HashMap, fs, path::Path};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mapping {
    classes: HashMap<String, String>,
    packages: Vec<(String, String)>,
}

/// Binary names use slashes; accept the dotted source form too.
fn normalize(name: &str) -> String {
    name.trim().trim_end_matches(|c| c == '/' || c == '.').replace('.', "/")
}

/// Splits `FROM=TO` into its normalized halves.
pub fn parse_rule(rule: &str) -> Result<(String, String)> {
    match rule.split_once('=') {
        Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
            Ok((normalize(from), normalize(to)))
        }
        _ => bail!("expected a rule of the form FROM=TO, got `{}`", rule),
    }
}

impl Mapping {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.packages.is_empty()
    }

    pub fn add_class(&mut self, from: String, to: String) {
        self.classes.insert(from, to);
    }

    pub fn add_package(&mut self, from: String, to: String) {
        self.packages.push((from, to));
        // Longest prefix first, so the most specific package wins.
        self.packages.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    pub fn load(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read mapping file {}", path.display()))?;
        self.parse_rules(&text)
            .with_context(|| format!("invalid mapping file {}", path.display()))
    }

    pub fn parse_rules(&mut self, text: &str) -> Result<()> {
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (kind, rule) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let (from, to) = parse_rule(rule).with_context(|| format!("line {}", number + 1))?;
            match kind {
                "class" => self.add_class(from, to),
                "package" => self.add_package(from, to),
                other => bail!(
                    "line {}: unknown rule kind `{}`, expected `class` or `package`",
                    number + 1,
                    other
                ),
            }
        }
        Ok(())
    }

    /// The new binary name for `name`, if a rule covers it.
    ///
    /// Class rules also move the nested classes of the class they name.
    pub fn map(&self, name: &str) -> Option<String> {
        if let Some(to) = self.classes.get(name) {
            return Some(to.clone());
        }

        if let Some((outer, nested)) = name.split_once('$') {
            if let Some(to) = self.classes.get(outer) {
                return Some(format!("{}${}", to, nested));
            }
        }

        self.packages.iter().find_map(|(from, to)| {
            let rest = name.strip_prefix(from.as_str())?.strip_prefix('/')?;
            Some(format!("{}/{}", to, rest))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_rules_accept_dotted_names() {
        assert_eq!(
            parse_rule("com.example.Foo=shaded/Foo").unwrap(),
            ("com/example/Foo".to_owned(), "shaded/Foo".to_owned())
        );
        assert!(parse_rule("a/b/C").is_err());
        assert!(parse_rule("=x/Y").is_err());
    }

    #[test]
    fn test_longest_package_wins() {
        let mut mapping = Mapping::default();
        mapping.add_package("a".to_owned(), "x".to_owned());
        mapping.add_package("a/b".to_owned(), "y".to_owned());

        assert_eq!(mapping.map("a/b/C").as_deref(), Some("y/C"));
        assert_eq!(mapping.map("a/d/E").as_deref(), Some("x/d/E"));
        assert_eq!(mapping.map("ab/C"), None);
    }

    #[test]
    fn test_class_rule_beats_package_rule() {
        let mut mapping = Mapping::default();
        mapping.add_package("a/b".to_owned(), "y".to_owned());
        mapping.add_class("a/b/C".to_owned(), "z/Z".to_owned());

        assert_eq!(mapping.map("a/b/C").as_deref(), Some("z/Z"));
        assert_eq!(mapping.map("a/b/C$Inner").as_deref(), Some("z/Z$Inner"));
        assert_eq!(mapping.map("a/b/D").as_deref(), Some("y/D"));
    }

    #[test]
    fn test_load_mapping_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# relocations").unwrap();
        writeln!(file, "class a/b/C=x/y/Z").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "package org.lib = shaded.org.lib").unwrap();

        let mut mapping = Mapping::default();
        mapping.load(file.path()).unwrap();

        assert_eq!(mapping.map("a/b/C").as_deref(), Some("x/y/Z"));
        assert_eq!(
            mapping.map("org/lib/util/Strings").as_deref(),
            Some("shaded/org/lib/util/Strings")
        );
        assert_eq!(mapping.map("java/lang/Object"), None);
    }

    #[test]
    fn test_bad_mapping_file_names_the_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "class a/b/C=x/y/Z").unwrap();
        writeln!(file, "module foo=bar").unwrap();

        let err = Mapping::default().load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}
