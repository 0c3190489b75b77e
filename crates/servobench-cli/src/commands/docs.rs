use crate::DocsCommands;
use anyhow::{Context, Result};
use servobench_core::navdata::{NavChildren, NavEntry, NavTree};
use std::path::Path;

pub fn handle(command: DocsCommands) -> Result<()> {
    match command {
        DocsCommands::Validate { file } => validate(&file),
        DocsCommands::Export { file, pretty } => export(&file, pretty),
    }
}

fn load(file: &Path) -> Result<NavTree> {
    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let tree = NavTree::parse_str(&text).with_context(|| format!("parsing {}", file.display()))?;
    Ok(tree)
}

fn validate(file: &Path) -> Result<()> {
    let tree = load(file)?;
    tree.validate()?;
    println!(
        "{}: ok (var {}, {} top-level entries, {} total)",
        file.display(),
        tree.var_name(),
        tree.len(),
        count_entries(tree.entries()),
    );
    Ok(())
}

fn export(file: &Path, pretty: bool) -> Result<()> {
    let tree = load(file)?;
    tree.validate()?;
    let value = tree.to_json();
    let text = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{text}");
    Ok(())
}

fn count_entries(entries: &[NavEntry]) -> usize {
    entries
        .iter()
        .map(|entry| {
            1 + match &entry.children {
                NavChildren::Nested(children) => count_entries(children),
                _ => 0,
            }
        })
        .sum()
}
