mod search;
mod user_list;

use std::collections::HashSet;

use crate::taxonomy::{NodeId, Taxonomy};

pub use search::{SearchFields, search, subtree_contains_match, tokenize};
pub use user_list::{UserList, load_code_list};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    Outside,
    /// A genuine hit; the only state that gets highlight colouring.
    Match,
    /// Pass-through: shown because something below it matches.
    ContainsMatch,
    /// Pass-through: shown because it sits inside a matching category.
    WithinMatch,
}

impl Membership {
    pub fn passes(self) -> bool {
        self != Self::Outside
    }
}

#[derive(Clone, Debug)]
pub struct MatchSet {
    matches: HashSet<NodeId>,
    membership: Vec<Membership>,
}

impl MatchSet {
    pub fn new(taxonomy: &Taxonomy, matches: HashSet<NodeId>) -> Self {
        let mut membership = vec![Membership::Outside; taxonomy.len()];
        for id in &matches {
            membership[id.index()] = Membership::Match;
        }

        for &id in &matches {
            for ancestor in taxonomy.ancestors(id) {
                match membership[ancestor.index()] {
                    Membership::ContainsMatch => break,
                    Membership::Match => {}
                    _ => membership[ancestor.index()] = Membership::ContainsMatch,
                }
            }
        }

        for id in taxonomy.breadth_first() {
            if membership[id.index()] != Membership::Outside {
                continue;
            }
            let inherited = taxonomy.parent(id).is_some_and(|parent| {
                matches!(
                    membership[parent.index()],
                    Membership::Match | Membership::WithinMatch
                )
            });
            if inherited {
                membership[id.index()] = Membership::WithinMatch;
            }
        }

        Self {
            matches,
            membership,
        }
    }

    pub fn matches(&self) -> &HashSet<NodeId> {
        &self.matches
    }

    pub fn membership(&self, id: NodeId) -> Membership {
        self.membership
            .get(id.index())
            .copied()
            .unwrap_or(Membership::Outside)
    }
}

#[derive(Clone, Debug, Default)]
pub enum ActiveFilter {
    #[default]
    None,
    SearchResults(MatchSet),
    UserList(UserList),
}

impl ActiveFilter {
    pub fn match_set(&self) -> Option<&MatchSet> {
        match self {
            Self::None => None,
            Self::SearchResults(set) => Some(set),
            Self::UserList(list) => Some(list.matches()),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// `true` for every node when no filter is active.
    pub fn passes(&self, id: NodeId) -> bool {
        self.match_set()
            .is_none_or(|set| set.membership(id).passes())
    }

    pub fn is_genuine_match(&self, id: NodeId) -> bool {
        self.match_set()
            .is_some_and(|set| set.membership(id) == Membership::Match)
    }

    /// Visual-only hide from an unchecked user-list entry.
    pub fn is_hidden(&self, id: NodeId) -> bool {
        match self {
            Self::UserList(list) => list.is_hidden(id),
            _ => false,
        }
    }

    pub fn user_list(&self) -> Option<&UserList> {
        match self {
            Self::UserList(list) => Some(list),
            _ => None,
        }
    }

    pub fn user_list_mut(&mut self) -> Option<&mut UserList> {
        match self {
            Self::UserList(list) => Some(list),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Self::None => "no filter".to_owned(),
            Self::SearchResults(set) => format!("search: {} matches", set.matches().len()),
            Self::UserList(list) => format!(
                "user list: {} codes ({} unknown)",
                list.entries().len(),
                list.unknown_count()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::sample_taxonomy;

    #[test]
    fn closure_marks_ancestors_and_descendants() {
        let taxonomy = sample_taxonomy();
        let a = taxonomy.find("A").unwrap();
        let set = MatchSet::new(&taxonomy, HashSet::from([a]));

        assert_eq!(set.membership(a), Membership::Match);
        assert_eq!(set.membership(taxonomy.root()), Membership::ContainsMatch);
        assert_eq!(set.membership(taxonomy.find("A1").unwrap()), Membership::WithinMatch);
        assert_eq!(set.membership(taxonomy.find("A2").unwrap()), Membership::WithinMatch);
        assert_eq!(set.membership(taxonomy.find("B").unwrap()), Membership::Outside);
    }

    #[test]
    fn leaf_match_excludes_its_siblings() {
        let taxonomy = sample_taxonomy();
        let a1 = taxonomy.find("A1").unwrap();
        let filter = ActiveFilter::SearchResults(MatchSet::new(&taxonomy, HashSet::from([a1])));

        let passing = taxonomy
            .ids()
            .filter(|id| filter.passes(*id))
            .map(|id| taxonomy.node(id).name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(passing.len(), 3);
        assert!(passing.contains(&"root") && passing.contains(&"A") && passing.contains(&"A1"));
        assert!(filter.is_genuine_match(a1));
        assert!(!filter.is_genuine_match(taxonomy.find("A").unwrap()));
    }

    #[test]
    fn nested_matches_keep_match_state() {
        let taxonomy = sample_taxonomy();
        let a = taxonomy.find("A").unwrap();
        let a1 = taxonomy.find("A1").unwrap();
        let set = MatchSet::new(&taxonomy, HashSet::from([a, a1]));
        assert_eq!(set.membership(a), Membership::Match);
        assert_eq!(set.membership(a1), Membership::Match);
        assert_eq!(set.membership(taxonomy.root()), Membership::ContainsMatch);
    }

    #[test]
    fn no_filter_passes_everything() {
        let taxonomy = sample_taxonomy();
        let filter = ActiveFilter::default();
        assert!(!filter.is_active());
        assert!(taxonomy.ids().all(|id| filter.passes(id) && !filter.is_hidden(id)));
    }
}
