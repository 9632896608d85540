use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::MatchSet;
use super::search::resolve_code;
use crate::taxonomy::{NodeId, Taxonomy};

#[derive(Clone, Debug, PartialEq)]
pub struct UserListEntry {
    pub code: String,
    /// `None` when the code is not part of the loaded taxonomy.
    pub node: Option<NodeId>,
    pub checked: bool,
}

/// A user-supplied subset of codes, each with a visibility checkbox.
///
/// The match closure is computed once on load. Checking or unchecking an
/// entry only flips that node's visual state.
#[derive(Clone, Debug)]
pub struct UserList {
    entries: Vec<UserListEntry>,
    position_by_code: HashMap<String, usize>,
    /// Unchecked entries per node; several spellings may resolve to one node.
    unchecked: HashMap<NodeId, usize>,
    matches: MatchSet,
}

impl UserList {
    pub fn new(taxonomy: &Taxonomy, codes: Vec<String>) -> Self {
        let entries = codes
            .into_iter()
            .map(|code| UserListEntry {
                node: resolve_code(taxonomy, &code),
                code,
                checked: true,
            })
            .collect::<Vec<_>>();

        let matched = entries
            .iter()
            .filter_map(|entry| entry.node)
            .collect::<HashSet<_>>();
        if let Some(first) = entries.iter().find(|entry| entry.node.is_none()) {
            warn!(
                unknown = entries.iter().filter(|entry| entry.node.is_none()).count(),
                first = %first.code,
                "user list contains codes missing from the taxonomy"
            );
        }

        let position_by_code = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.code.clone(), position))
            .collect();

        info!(
            codes = entries.len(),
            matched = matched.len(),
            "user list loaded"
        );

        Self {
            entries,
            position_by_code,
            unchecked: HashMap::new(),
            matches: MatchSet::new(taxonomy, matched),
        }
    }

    pub fn entries(&self) -> &[UserListEntry] {
        &self.entries
    }

    pub fn matches(&self) -> &MatchSet {
        &self.matches
    }

    pub fn unknown_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.node.is_none()).count()
    }

    /// Flips one code's checkbox. Unknown codes are a no-op; returns whether
    /// anything changed.
    pub fn set_checked(&mut self, code: &str, checked: bool) -> bool {
        let Some(&position) = self.position_by_code.get(code) else {
            return false;
        };
        let entry = &mut self.entries[position];
        if entry.checked == checked {
            return false;
        }

        entry.checked = checked;
        let Some(node) = entry.node else {
            return true;
        };
        if !checked {
            *self.unchecked.entry(node).or_default() += 1;
        } else if let Entry::Occupied(mut count) = self.unchecked.entry(node) {
            *count.get_mut() -= 1;
            if *count.get() == 0 {
                count.remove();
            }
        }
        true
    }

    pub fn set_all_checked(&mut self, checked: bool) {
        for entry in &mut self.entries {
            entry.checked = checked;
        }
        self.unchecked.clear();
        if !checked {
            for node in self.entries.iter().filter_map(|entry| entry.node) {
                *self.unchecked.entry(node).or_default() += 1;
            }
        }
    }

    /// Hidden while any entry naming the node is unchecked.
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.unchecked.contains_key(&id)
    }
}

/// Newline-delimited codes; blank lines and `#` comments are skipped and
/// duplicates dropped, keeping first-seen order.
pub fn parse_code_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(*line))
        .map(str::to_owned)
        .collect()
}

pub fn load_code_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read code list {}", path.display()))?;
    Ok(parse_code_list(&text))
}
