// Servobench
// Copyright (C) 2026 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Navigation-data files of the generated API documentation.
//!
//! Doc generators ship their sidebar tree as a JavaScript file holding one
//! global assignment, `var <name> = [ ... ];`, where every entry is a
//! `[label, target, children]` triple and `children` is `null`, a string
//! referencing another navigation file, or a nested list of triples. The
//! body of the assignment is JSON, so [`NavTree::parse_str`] peels off the
//! assignment wrapper and hands the rest to a JSON parser, then checks the
//! triple shape.
//!
//! [`NavTree::validate`] enforces the model invariants a well-formed tree
//! carries: labels are non-empty and unique among siblings, targets and
//! references are never empty strings. [`NavTree::to_js`] renders the file
//! back byte-for-byte in the generator's layout, so a parsed file survives
//! a round trip unchanged.

use thiserror::Error;

mod emit;
mod parse;

/// Errors from parsing or validating navigation data.
#[derive(Debug, Error)]
pub enum NavDataError {
    #[error("missing `var <name> =` assignment prefix")]
    MissingPrefix,

    #[error("missing trailing `;`")]
    MissingTerminator,

    #[error("`{0}` is not a valid identifier")]
    BadIdentifier(String),

    #[error("body is not well-formed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("entry {path}: {problem}")]
    BadEntry { path: String, problem: String },

    #[error("duplicate label `{label}` among the children of {path}")]
    DuplicateLabel { path: String, label: String },
}

/// The third slot of an entry triple.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavChildren {
    /// No children (`null`).
    #[default]
    None,
    /// Children live in another navigation file with this base name.
    External(String),
    /// Children given inline.
    Nested(Vec<NavEntry>),
}

/// One `[label, target, children]` triple.
///
/// `label` is the text shown in the sidebar. `target` is the page the
/// label links to, usually an `.html` file name with an optional `#anchor`
/// suffix; entries that only group others carry no target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub label: String,
    pub target: Option<String>,
    pub children: NavChildren,
}

impl NavEntry {
    /// Entry with a label only, no target and no children.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: None,
            children: NavChildren::None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Point the children slot at another navigation file.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.children = NavChildren::External(reference.into());
        self
    }

    pub fn with_children(mut self, children: Vec<NavEntry>) -> Self {
        self.children = NavChildren::Nested(children);
        self
    }
}

/// A whole navigation file: the assigned identifier plus its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTree {
    var_name: String,
    entries: Vec<NavEntry>,
}

impl NavTree {
    /// Build a tree, checking only that `var_name` is a legal identifier.
    /// Model invariants are checked separately by [`validate`](Self::validate).
    pub fn new(var_name: impl Into<String>, entries: Vec<NavEntry>) -> Result<Self, NavDataError> {
        let var_name = var_name.into();
        if !parse::is_valid_identifier(&var_name) {
            return Err(NavDataError::BadIdentifier(var_name));
        }
        Ok(Self { var_name, entries })
    }

    /// Identifier the file assigns to.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the model invariants across the whole tree.
    ///
    /// Labels must be non-empty and unique within each sibling list;
    /// targets and external references must not be empty strings. The
    /// error names the offending sibling list by its label path.
    pub fn validate(&self) -> Result<(), NavDataError> {
        validate_level(&self.entries, &self.var_name)
    }
}

fn validate_level(entries: &[NavEntry], path: &str) -> Result<(), NavDataError> {
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if entry.label.is_empty() {
            return Err(NavDataError::BadEntry {
                path: path.to_string(),
                problem: "label must not be empty".to_string(),
            });
        }
        if !seen.insert(entry.label.as_str()) {
            return Err(NavDataError::DuplicateLabel {
                path: path.to_string(),
                label: entry.label.clone(),
            });
        }
        if matches!(entry.target.as_deref(), Some("")) {
            return Err(NavDataError::BadEntry {
                path: format!("{path}/{}", entry.label),
                problem: "target must not be empty".to_string(),
            });
        }
        if matches!(&entry.children, NavChildren::External(r) if r.is_empty()) {
            return Err(NavDataError::BadEntry {
                path: format!("{path}/{}", entry.label),
                problem: "child reference must not be empty".to_string(),
            });
        }
    }
    for entry in entries {
        if let NavChildren::Nested(children) = &entry.children {
            validate_level(children, &format!("{path}/{}", entry.label))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_covers_all_child_shapes() {
        let leaf = NavEntry::new("reset").with_target("page.html#a3c47");
        assert_eq!(leaf.children, NavChildren::None);

        let external = NavEntry::new("sched").with_target("sched.html").with_reference("sched_members");
        assert_eq!(external.children, NavChildren::External("sched_members".into()));

        let nested = NavEntry::new("hw").with_children(vec![leaf.clone()]);
        assert_eq!(nested.children, NavChildren::Nested(vec![leaf]));
    }

    #[test]
    fn tree_rejects_bad_identifiers() {
        assert!(NavTree::new("nav_data", vec![]).is_ok());
        assert!(NavTree::new("_private", vec![]).is_ok());
        assert!(NavTree::new("$jq", vec![]).is_ok());
        assert!(matches!(NavTree::new("2fast", vec![]), Err(NavDataError::BadIdentifier(_))));
        assert!(matches!(NavTree::new("has space", vec![]), Err(NavDataError::BadIdentifier(_))));
        assert!(matches!(NavTree::new("", vec![]), Err(NavDataError::BadIdentifier(_))));
    }

    #[test]
    fn validate_accepts_unique_siblings() {
        let tree = NavTree::new(
            "nav",
            vec![
                NavEntry::new("control").with_target("control.html"),
                NavEntry::new("sched").with_target("sched.html"),
            ],
        )
        .unwrap();
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_siblings_at_top_level() {
        let tree = NavTree::new(
            "nav",
            vec![NavEntry::new("sched"), NavEntry::new("sched")],
        )
        .unwrap();
        match tree.validate() {
            Err(NavDataError::DuplicateLabel { path, label }) => {
                assert_eq!(path, "nav");
                assert_eq!(label, "sched");
            }
            other => panic!("expected duplicate label error, got {other:?}"),
        }
    }

    #[test]
    fn validate_names_the_nested_sibling_list() {
        let tree = NavTree::new(
            "nav",
            vec![NavEntry::new("hw").with_children(vec![NavEntry::new("motor"), NavEntry::new("motor")])],
        )
        .unwrap();
        match tree.validate() {
            Err(NavDataError::DuplicateLabel { path, label }) => {
                assert_eq!(path, "nav/hw");
                assert_eq!(label, "motor");
            }
            other => panic!("expected duplicate label error, got {other:?}"),
        }
    }

    #[test]
    fn validate_allows_same_label_in_different_sibling_lists() {
        let tree = NavTree::new(
            "nav",
            vec![
                NavEntry::new("a").with_children(vec![NavEntry::new("reset")]),
                NavEntry::new("b").with_children(vec![NavEntry::new("reset")]),
            ],
        )
        .unwrap();
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_label_target_and_reference() {
        let tree = NavTree::new("nav", vec![NavEntry::new("")]).unwrap();
        assert!(matches!(tree.validate(), Err(NavDataError::BadEntry { .. })));

        let tree = NavTree::new("nav", vec![NavEntry::new("x").with_target("")]).unwrap();
        assert!(matches!(tree.validate(), Err(NavDataError::BadEntry { .. })));

        let tree = NavTree::new("nav", vec![NavEntry::new("x").with_reference("")]).unwrap();
        assert!(matches!(tree.validate(), Err(NavDataError::BadEntry { .. })));
    }
}
