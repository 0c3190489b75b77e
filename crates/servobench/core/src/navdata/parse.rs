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

use super::{NavChildren, NavDataError, NavEntry, NavTree};
use serde_json::Value;

pub(super) fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl NavTree {
    /// Parse a navigation file.
    ///
    /// # Workflow
    ///
    /// 1. Peel the `var <name> =` prefix and the trailing `;` off the
    ///    assignment.
    /// 2. Parse the remaining body as JSON.
    /// 3. Walk the value checking that every node is a
    ///    `[label, target, children]` triple of the right types.
    ///
    /// Shape violations name the offending entry by its index path, for
    /// example `nav[4][0]`. Model invariants such as sibling label
    /// uniqueness are not checked here; run
    /// [`validate`](NavTree::validate) on the result for that.
    pub fn parse_str(input: &str) -> Result<Self, NavDataError> {
        let rest = input.trim().strip_prefix("var").ok_or(NavDataError::MissingPrefix)?;
        // `var` must be its own word
        let rest = rest.strip_prefix(|c: char| c.is_whitespace()).ok_or(NavDataError::MissingPrefix)?;
        let eq = rest.find('=').ok_or(NavDataError::MissingPrefix)?;
        let name = rest[..eq].trim();
        if !is_valid_identifier(name) {
            return Err(NavDataError::BadIdentifier(name.to_string()));
        }

        let body = rest[eq + 1..].trim().strip_suffix(';').ok_or(NavDataError::MissingTerminator)?;
        let value: Value = serde_json::from_str(body)?;

        let Value::Array(items) = value else {
            return Err(NavDataError::BadEntry {
                path: name.to_string(),
                problem: "top level must be an array".to_string(),
            });
        };

        let entries = items
            .iter()
            .enumerate()
            .map(|(i, item)| entry_from_value(item, &format!("{name}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            var_name: name.to_string(),
            entries,
        })
    }
}

fn entry_from_value(value: &Value, path: &str) -> Result<NavEntry, NavDataError> {
    let bad = |problem: &str| NavDataError::BadEntry {
        path: path.to_string(),
        problem: problem.to_string(),
    };

    let Some(parts) = value.as_array() else {
        return Err(bad("expected a [label, target, children] triple"));
    };
    if parts.len() != 3 {
        return Err(NavDataError::BadEntry {
            path: path.to_string(),
            problem: format!("expected 3 elements, found {}", parts.len()),
        });
    }

    let label = parts[0].as_str().ok_or_else(|| bad("label must be a string"))?;
    if label.is_empty() {
        return Err(bad("label must not be empty"));
    }

    let target = match &parts[1] {
        Value::Null => None,
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) => return Err(bad("target must not be empty")),
        _ => return Err(bad("target must be a string or null")),
    };

    let children = match &parts[2] {
        Value::Null => NavChildren::None,
        Value::String(s) if !s.is_empty() => NavChildren::External(s.clone()),
        Value::String(_) => return Err(bad("child reference must not be empty")),
        Value::Array(items) => {
            let nested = items
                .iter()
                .enumerate()
                .map(|(i, item)| entry_from_value(item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()?;
            NavChildren::Nested(nested)
        }
        _ => return Err(bad("children must be an array, a string reference or null")),
    };

    Ok(NavEntry {
        label: label.to_string(),
        target,
        children,
    })
}
