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

use super::{NavChildren, NavEntry, NavTree};
use serde_json::Value;

/// JSON string literal for `s`, with all escaping handled.
fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

impl NavTree {
    /// Render the tree in the documentation generator's file layout.
    ///
    /// Top-level entries are indented four spaces, each nesting level adds
    /// two more, and a nested child list closes with `] ]` on the parent's
    /// indent. Output from [`parse_str`](NavTree::parse_str) followed by
    /// `to_js` reproduces a generator-written file byte for byte.
    pub fn to_js(&self) -> String {
        let mut out = format!("var {} =\n[\n", self.var_name());
        let rendered: Vec<String> = self.entries().iter().map(|e| render_entry(e, 4)).collect();
        out.push_str(&rendered.join(",\n"));
        // Generator files end at the `;` with no final newline
        out.push_str("\n];");
        out
    }

    /// The entry list as the JSON value the file body would parse to.
    pub fn to_json(&self) -> Value {
        Value::Array(self.entries().iter().map(entry_value).collect())
    }
}

fn render_entry(entry: &NavEntry, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let label = js_string(&entry.label);
    let target = entry.target.as_deref().map_or_else(|| "null".to_string(), js_string);
    match &entry.children {
        NavChildren::None => format!("{pad}[ {label}, {target}, null ]"),
        NavChildren::External(reference) => {
            format!("{pad}[ {label}, {target}, {} ]", js_string(reference))
        }
        NavChildren::Nested(children) if children.is_empty() => {
            format!("{pad}[ {label}, {target}, [ ] ]")
        }
        NavChildren::Nested(children) => {
            let inner: Vec<String> = children.iter().map(|c| render_entry(c, indent + 2)).collect();
            format!("{pad}[ {label}, {target}, [\n{}\n{pad}] ]", inner.join(",\n"))
        }
    }
}

fn entry_value(entry: &NavEntry) -> Value {
    let target = entry.target.as_ref().map_or(Value::Null, |t| Value::String(t.clone()));
    let children = match &entry.children {
        NavChildren::None => Value::Null,
        NavChildren::External(reference) => Value::String(reference.clone()),
        NavChildren::Nested(kids) => Value::Array(kids.iter().map(entry_value).collect()),
    };
    Value::Array(vec![Value::String(entry.label.clone()), target, children])
}
