use std::collections::HashSet;

use crate::taxonomy::{NodeId, Taxonomy};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchFields {
    pub name: bool,
    pub description: bool,
}

impl Default for SearchFields {
    fn default() -> Self {
        Self {
            name: true,
            description: false,
        }
    }
}

/// Splits a query on whitespace, commas and newlines into lower-cased terms.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Nodes where any term is a case-insensitive substring of an enabled field.
pub fn search(taxonomy: &Taxonomy, query: &str, fields: SearchFields) -> HashSet<NodeId> {
    search_terms(taxonomy, &tokenize(query), fields)
}

pub fn search_terms(taxonomy: &Taxonomy, terms: &[String], fields: SearchFields) -> HashSet<NodeId> {
    if terms.is_empty() || (!fields.name && !fields.description) {
        return HashSet::new();
    }

    taxonomy
        .ids()
        .filter(|&id| {
            let node = taxonomy.node(id);
            let name = fields.name.then(|| node.name.to_lowercase());
            let description = if fields.description {
                node.description.as_deref().map(str::to_lowercase)
            } else {
                None
            };

            terms.iter().any(|term| {
                name.as_deref().is_some_and(|name| name.contains(term.as_str()))
                    || description
                        .as_deref()
                        .is_some_and(|description| description.contains(term.as_str()))
            })
        })
        .collect()
}

/// Exact code lookup for list-upload mode, retried upper-cased.
pub fn resolve_code(taxonomy: &Taxonomy, code: &str) -> Option<NodeId> {
    taxonomy
        .find(code)
        .or_else(|| taxonomy.find(&code.to_ascii_uppercase()))
}

pub fn subtree_contains_match(taxonomy: &Taxonomy, node: NodeId, matches: &HashSet<NodeId>) -> bool {
    if matches.is_empty() {
        return false;
    }

    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        if matches.contains(&id) {
            return true;
        }
        stack.extend(taxonomy.children(id).iter().copied());
    }
    false
}
