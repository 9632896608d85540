use tracing::{debug, info};

use super::zoom::{Easing, View, ZoomPath, interpolate_zoom};
use crate::filter::{ActiveFilter, MatchSet, SearchFields, UserList, search, tokenize};
use crate::pack::PackLayout;
use crate::taxonomy::{NodeId, Taxonomy};

/// Font size divisor applied to on-screen radii.
pub const LABEL_FONT_DIVISOR: f64 = 2.2;

/// Extra levels folded into the opacity denominator so the deepest level
/// never turns fully opaque.
const OPACITY_DEPTH_PADDING: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomOptions {
    /// Layout units added around the focus circle.
    pub margin: f64,
    /// Seconds per transition.
    pub duration: f64,
    /// Duration multiplier for slow-motion transitions.
    pub slow_motion_factor: f64,
    pub easing: Easing,
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            margin: 20.0,
            duration: 0.75,
            slow_motion_factor: 10.0,
            easing: Easing::Linear,
        }
    }
}

/// Continuation handle for one transition. Starting another transition
/// invalidates every earlier token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransitionToken(u64);

#[derive(Clone, Debug)]
pub struct Transition {
    token: TransitionToken,
    path: ZoomPath,
    target: View,
    started_at: f64,
    duration: f64,
}

#[derive(Clone, Debug)]
pub enum Motion {
    AtRest,
    Transitioning(Transition),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    /// The token belongs to a superseded transition; nothing was committed.
    Stale,
    InFlight(View),
    Finished(View),
}

/// Focus, viewport, filter and visibility of the diagram.
#[derive(Clone, Debug)]
pub struct ViewState {
    focus: NodeId,
    view: View,
    filter: ActiveFilter,
    motion: Motion,
    shown: Vec<bool>,
    selected: Option<NodeId>,
    next_token: u64,
    options: ZoomOptions,
}

impl ViewState {
    pub fn new(taxonomy: &Taxonomy, layout: &PackLayout, options: ZoomOptions) -> Self {
        let root = taxonomy.root();
        let mut state = Self {
            focus: root,
            view: View::framing(layout.get(root), options.margin),
            filter: ActiveFilter::None,
            motion: Motion::AtRest,
            shown: vec![false; taxonomy.len()],
            selected: None,
            next_token: 0,
            options,
        };
        state.shown = state.target_visibility(taxonomy);
        state
    }

    pub fn focus(&self) -> NodeId {
        self.focus
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn filter(&self) -> &ActiveFilter {
        &self.filter
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn options(&self) -> ZoomOptions {
        self.options
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.motion, Motion::Transitioning(_))
    }

    pub fn select(&mut self, node: Option<NodeId>) {
        self.selected = node;
    }

    /// Zooms to `node`. Leaves only become the selection; zooming to the
    /// current focus or to an unknown id does nothing.
    pub fn zoom_in(
        &mut self,
        taxonomy: &Taxonomy,
        layout: &PackLayout,
        node: NodeId,
        now: f64,
        slow_motion: bool,
    ) -> Option<TransitionToken> {
        let target = taxonomy.get(node)?;
        if target.is_leaf() {
            self.selected = Some(node);
            return None;
        }
        if node == self.focus {
            return None;
        }
        Some(self.begin_transition(taxonomy, layout, node, now, slow_motion))
    }

    pub fn zoom_out(
        &mut self,
        taxonomy: &Taxonomy,
        layout: &PackLayout,
        now: f64,
        slow_motion: bool,
    ) -> Option<TransitionToken> {
        let parent = taxonomy.parent(self.focus)?;
        self.zoom_in(taxonomy, layout, parent, now, slow_motion)
    }

    pub fn reset_to_root(
        &mut self,
        taxonomy: &Taxonomy,
        layout: &PackLayout,
        now: f64,
        slow_motion: bool,
    ) -> Option<TransitionToken> {
        let root = taxonomy.root();
        if self.focus == root {
            return None;
        }
        Some(self.begin_transition(taxonomy, layout, root, now, slow_motion))
    }

    /// Brings `node` into view: categories are zoomed into, leaves are
    /// selected and their parent zoomed into.
    pub fn focus_on(
        &mut self,
        taxonomy: &Taxonomy,
        layout: &PackLayout,
        node: NodeId,
        now: f64,
    ) -> Option<TransitionToken> {
        let target = taxonomy.get(node)?;
        self.selected = Some(node);
        let zoom_target = if target.is_leaf() {
            target.parent?
        } else {
            node
        };
        self.zoom_in(taxonomy, layout, zoom_target, now, false)
    }

    fn begin_transition(
        &mut self,
        taxonomy: &Taxonomy,
        layout: &PackLayout,
        target: NodeId,
        now: f64,
        slow_motion: bool,
    ) -> TransitionToken {
        self.next_token = self.next_token.wrapping_add(1);
        let token = TransitionToken(self.next_token);

        let to = View::framing(layout.get(target), self.options.margin);
        let duration = if slow_motion {
            self.options.duration * self.options.slow_motion_factor
        } else {
            self.options.duration
        };

        debug!(
            from = %taxonomy.node(self.focus).name,
            to = %taxonomy.node(target).name,
            duration,
            interrupted = self.is_transitioning(),
            "zoom transition started"
        );

        // Start from the live view so an interrupted transition continues smoothly.
        self.motion = Motion::Transitioning(Transition {
            token,
            path: interpolate_zoom(self.view, to),
            target: to,
            started_at: now,
            duration,
        });
        self.focus = target;
        self.show_early(taxonomy);

        token
    }

    pub fn advance(&mut self, taxonomy: &Taxonomy, token: TransitionToken, now: f64) -> FrameOutcome {
        let Motion::Transitioning(transition) = &self.motion else {
            return FrameOutcome::Stale;
        };
        if transition.token != token {
            return FrameOutcome::Stale;
        }

        let progress = if transition.duration > 0.0 {
            ((now - transition.started_at) / transition.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };

        if progress >= 1.0 {
            self.view = transition.target;
            self.motion = Motion::AtRest;
            self.shown = self.target_visibility(taxonomy);
            return FrameOutcome::Finished(self.view);
        }

        self.view = transition.path.at(self.options.easing.apply(progress));
        FrameOutcome::InFlight(self.view)
    }

    /// Applies a free-text search. A blank query clears the filter. Returns
    /// the number of genuine matches.
    pub fn apply_search(&mut self, taxonomy: &Taxonomy, query: &str, fields: SearchFields) -> usize {
        if tokenize(query).is_empty() {
            self.clear_filter(taxonomy);
            return 0;
        }

        let matches = search(taxonomy, query, fields);
        let count = matches.len();
        info!(query = query.trim(), matches = count, "search applied");

        self.filter = ActiveFilter::SearchResults(MatchSet::new(taxonomy, matches));
        self.refresh_visibility(taxonomy);
        count
    }

    /// Search form submission: applies the query and, unless it was blank,
    /// zooms back out to the root so every result is in view.
    pub fn submit_search(
        &mut self,
        taxonomy: &Taxonomy,
        layout: &PackLayout,
        query: &str,
        fields: SearchFields,
        now: f64,
    ) -> (usize, Option<TransitionToken>) {
        let count = self.apply_search(taxonomy, query, fields);
        if !self.filter.is_active() {
            return (count, None);
        }
        (count, self.reset_to_root(taxonomy, layout, now, false))
    }

    pub fn load_user_list(&mut self, taxonomy: &Taxonomy, codes: Vec<String>) {
        self.filter = ActiveFilter::UserList(UserList::new(taxonomy, codes));
        self.refresh_visibility(taxonomy);
    }

    pub fn clear_filter(&mut self, taxonomy: &Taxonomy) {
        self.filter = ActiveFilter::None;
        self.refresh_visibility(taxonomy);
    }

    /// Visual toggle of one user-list code. Does not re-evaluate the filter.
    pub fn set_code_checked(&mut self, code: &str, checked: bool) -> bool {
        self.filter
            .user_list_mut()
            .is_some_and(|list| list.set_checked(code, checked))
    }

    pub fn set_all_codes_checked(&mut self, checked: bool) {
        if let Some(list) = self.filter.user_list_mut() {
            list.set_all_checked(checked);
        }
    }

    fn refresh_visibility(&mut self, taxonomy: &Taxonomy) {
        if self.is_transitioning() {
            self.show_early(taxonomy);
        } else {
            self.shown = self.target_visibility(taxonomy);
        }
    }

    /// Nodes entering view appear at transition start; leavers stay until it ends.
    fn show_early(&mut self, taxonomy: &Taxonomy) {
        let target = self.target_visibility(taxonomy);
        for (shown, next) in self.shown.iter_mut().zip(target) {
            *shown |= next;
        }
    }

    /// Focus and its ancestors always; descendants of the focus when they
    /// pass the active filter.
    fn target_visibility(&self, taxonomy: &Taxonomy) -> Vec<bool> {
        let mut visible = vec![false; taxonomy.len()];
        for id in taxonomy.path_from_root(self.focus) {
            visible[id.index()] = true;
        }
        for id in taxonomy.descendants(self.focus) {
            visible[id.index()] = self.filter.passes(id);
        }
        visible
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.shown.get(id.index()).copied().unwrap_or(false) && !self.filter.is_hidden(id)
    }

    #[cfg(test)]
    pub fn visible_set(&self, taxonomy: &Taxonomy) -> std::collections::HashSet<NodeId> {
        taxonomy.ids().filter(|id| self.is_visible(*id)).collect()
    }

    /// Only one generation of labels: the children of the focus.
    pub fn label_visible(&self, taxonomy: &Taxonomy, id: NodeId) -> bool {
        taxonomy.parent(id) == Some(self.focus) && self.is_visible(id)
    }

    /// Deeper nodes get more opaque; anything more than one level below the
    /// focus is fully transparent.
    pub fn fill_opacity(&self, taxonomy: &Taxonomy, id: NodeId) -> f32 {
        let depth = taxonomy.node(id).depth;
        if depth > taxonomy.node(self.focus).depth + 1 {
            return 0.0;
        }
        let levels = taxonomy.max_depth() as f64 + 1.0;
        ((depth as f64 + 1.0) / (levels + OPACITY_DEPTH_PADDING)) as f32
    }

    pub fn breadcrumb<'a>(&self, taxonomy: &'a Taxonomy) -> Vec<&'a str> {
        taxonomy
            .path_from_root(self.focus)
            .into_iter()
            .map(|id| taxonomy.node(id).name.as_str())
            .collect()
    }

    pub fn breadcrumb_text(&self, taxonomy: &Taxonomy) -> String {
        self.breadcrumb(taxonomy).join("→")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::pack::{PackOptions, layout};
    use crate::taxonomy::sample_taxonomy;

    struct Fixture {
        taxonomy: Taxonomy,
        layout: PackLayout,
        state: ViewState,
    }

    impl Fixture {
        fn new() -> Self {
            let taxonomy = sample_taxonomy();
            let layout = layout(&taxonomy, &PackOptions::default());
            let state = ViewState::new(&taxonomy, &layout, ZoomOptions::default());
            Self {
                taxonomy,
                layout,
                state,
            }
        }

        fn id(&self, name: &str) -> NodeId {
            self.taxonomy.find(name).unwrap()
        }

        fn names(&self, ids: HashSet<NodeId>) -> Vec<String> {
            let mut names = ids
                .into_iter()
                .map(|id| self.taxonomy.node(id).name.clone())
                .collect::<Vec<_>>();
            names.sort();
            names
        }

        fn visible(&self) -> Vec<String> {
            self.names(self.state.visible_set(&self.taxonomy))
        }

        fn zoom_in(&mut self, name: &str, now: f64) -> Option<TransitionToken> {
            let id = self.id(name);
            self.state.zoom_in(&self.taxonomy, &self.layout, id, now, false)
        }

        fn finish(&mut self, token: TransitionToken) {
            let outcome = self.state.advance(&self.taxonomy, token, 1e6);
            assert!(matches!(outcome, FrameOutcome::Finished(_)));
        }
    }

    #[test]
    fn starts_at_root_with_everything_visible() {
        let fixture = Fixture::new();
        assert_eq!(fixture.state.focus(), fixture.taxonomy.root());
        assert_eq!(fixture.visible(), ["A", "A1", "A2", "B", "root"]);
        assert_eq!(fixture.state.breadcrumb_text(&fixture.taxonomy), "root");
        assert!(fixture.state.label_visible(&fixture.taxonomy, fixture.id("A")));
        assert!(!fixture.state.label_visible(&fixture.taxonomy, fixture.id("A1")));
    }

    #[test]
    fn zoom_into_category() {
        let mut fixture = Fixture::new();
        let token = fixture.zoom_in("A", 0.0).unwrap();

        assert_eq!(fixture.state.focus(), fixture.id("A"));
        assert_eq!(fixture.state.breadcrumb_text(&fixture.taxonomy), "root→A");
        // Leaving nodes stay on screen until the transition ends.
        assert!(fixture.state.is_visible(fixture.id("B")));

        fixture.finish(token);
        assert_eq!(fixture.visible(), ["A", "A1", "A2", "root"]);
        assert!(fixture.state.label_visible(&fixture.taxonomy, fixture.id("A1")));
        assert!(!fixture.state.label_visible(&fixture.taxonomy, fixture.id("A")));

        let a = fixture.layout.get(fixture.id("A"));
        assert_eq!(fixture.state.view(), View::framing(a, 20.0));
    }

    #[test]
    fn leaves_are_not_zoom_targets() {
        let mut fixture = Fixture::new();
        assert!(fixture.zoom_in("B", 0.0).is_none());
        assert_eq!(fixture.state.focus(), fixture.taxonomy.root());
        assert_eq!(fixture.state.selected(), Some(fixture.id("B")));
        assert!(!fixture.state.is_transitioning());
    }

    #[test]
    fn zoom_in_then_out_round_trips() {
        let mut fixture = Fixture::new();
        let token = fixture.zoom_in("A", 0.0).unwrap();
        fixture.finish(token);

        let (taxonomy, layout) = (&fixture.taxonomy, &fixture.layout);
        let token = fixture.state.zoom_out(taxonomy, layout, 1.0, false).unwrap();
        fixture.finish(token);
        assert_eq!(fixture.state.focus(), fixture.taxonomy.root());
        assert_eq!(fixture.visible(), ["A", "A1", "A2", "B", "root"]);

        let (taxonomy, layout) = (&fixture.taxonomy, &fixture.layout);
        assert!(fixture.state.zoom_out(taxonomy, layout, 2.0, false).is_none());
    }

    #[test]
    fn reset_to_root_from_any_depth() {
        let mut fixture = Fixture::new();
        let token = fixture.zoom_in("A", 0.0).unwrap();
        fixture.finish(token);

        let (taxonomy, layout) = (&fixture.taxonomy, &fixture.layout);
        let token = fixture.state.reset_to_root(taxonomy, layout, 5.0, false).unwrap();
        fixture.finish(token);
        assert_eq!(fixture.state.focus(), fixture.taxonomy.root());
        let (taxonomy, layout) = (&fixture.taxonomy, &fixture.layout);
        assert!(fixture.state.reset_to_root(taxonomy, layout, 6.0, false).is_none());
    }

    #[test]
    fn interrupted_transition_starts_from_live_view() {
        let mut fixture = Fixture::new();
        let first = fixture.zoom_in("A", 0.0).unwrap();
        let midway = match fixture.state.advance(&fixture.taxonomy, first, 0.3) {
            FrameOutcome::InFlight(view) => view,
            other => panic!("expected in-flight frame, got {other:?}"),
        };

        let (taxonomy, layout) = (&fixture.taxonomy, &fixture.layout);
        let second = fixture.state.reset_to_root(taxonomy, layout, 0.3, false).unwrap();
        assert_ne!(first, second);

        // The superseded continuation no longer commits anything.
        assert_eq!(fixture.state.advance(&fixture.taxonomy, first, 0.5), FrameOutcome::Stale);
        assert_eq!(fixture.state.view(), midway);

        // The new transition begins exactly where the old one was interrupted.
        assert_eq!(
            fixture.state.advance(&fixture.taxonomy, second, 0.3),
            FrameOutcome::InFlight(midway)
        );
        fixture.finish(second);
        let root = fixture.layout.get(fixture.taxonomy.root());
        assert_eq!(fixture.state.view(), View::framing(root, 20.0));
    }

    #[test]
    fn slow_motion_stretches_duration() {
        let mut fixture = Fixture::new();
        let id = fixture.id("A");
        let token = fixture
            .state
            .zoom_in(&fixture.taxonomy, &fixture.layout, id, 0.0, true)
            .unwrap();
        assert!(matches!(
            fixture.state.advance(&fixture.taxonomy, token, 1.0),
            FrameOutcome::InFlight(_)
        ));
        assert!(matches!(
            fixture.state.advance(&fixture.taxonomy, token, 7.5),
            FrameOutcome::Finished(_)
        ));
    }

    #[test]
    fn description_search_shows_match_and_pass_through_ancestors() {
        let mut fixture = Fixture::new();
        let fields = SearchFields {
            name: false,
            description: true,
        };
        let count = fixture.state.apply_search(&fixture.taxonomy, "vibrio", fields);
        assert_eq!(count, 1);
        assert_eq!(fixture.visible(), ["A", "A1", "root"]);
        assert!(fixture.state.filter().is_genuine_match(fixture.id("A1")));
        assert!(!fixture.state.filter().is_genuine_match(fixture.id("A")));

        // Same query again, same result.
        fixture.state.apply_search(&fixture.taxonomy, "vibrio", fields);
        assert_eq!(fixture.visible(), ["A", "A1", "root"]);

        // Blank query clears the filter.
        assert_eq!(fixture.state.apply_search(&fixture.taxonomy, "  ", fields), 0);
        assert!(!fixture.state.filter().is_active());
        assert_eq!(fixture.visible(), ["A", "A1", "A2", "B", "root"]);
    }

    #[test]
    fn filter_applies_at_any_focus_depth() {
        let mut fixture = Fixture::new();
        let token = fixture.zoom_in("A", 0.0).unwrap();
        fixture.finish(token);

        fixture
            .state
            .apply_search(&fixture.taxonomy, "A2", SearchFields::default());
        assert_eq!(fixture.state.focus(), fixture.id("A"));
        assert_eq!(fixture.visible(), ["A", "A2", "root"]);

        // A filter that misses the focused subtree still keeps the focus path.
        fixture
            .state
            .apply_search(&fixture.taxonomy, "B", SearchFields::default());
        assert_eq!(fixture.visible(), ["A", "root"]);
    }

    #[test]
    fn submitted_search_returns_to_root() {
        let mut fixture = Fixture::new();
        let token = fixture.zoom_in("A", 0.0).unwrap();
        fixture.finish(token);

        let (taxonomy, layout) = (&fixture.taxonomy, &fixture.layout);
        let (count, token) =
            fixture
                .state
                .submit_search(taxonomy, layout, "B", SearchFields::default(), 10.0);
        assert_eq!(count, 1);
        fixture.finish(token.unwrap());
        assert_eq!(fixture.state.focus(), fixture.taxonomy.root());
        assert_eq!(fixture.visible(), ["B", "root"]);

        // Already at the root: nothing to animate.
        let (taxonomy, layout) = (&fixture.taxonomy, &fixture.layout);
        let (_, token) =
            fixture
                .state
                .submit_search(taxonomy, layout, "A1", SearchFields::default(), 20.0);
        assert!(token.is_none());
        assert_eq!(fixture.visible(), ["A", "A1", "root"]);
    }

    #[test]
    fn blank_submission_keeps_focus() {
        let mut fixture = Fixture::new();
        let token = fixture.zoom_in("A", 0.0).unwrap();
        fixture.finish(token);

        let (taxonomy, layout) = (&fixture.taxonomy, &fixture.layout);
        let (count, token) =
            fixture
                .state
                .submit_search(taxonomy, layout, " ", SearchFields::default(), 10.0);
        assert_eq!((count, token), (0, None));
        assert_eq!(fixture.state.focus(), fixture.id("A"));
    }

    #[test]
    fn unchecking_user_list_code_hides_only_that_code() {
        let mut fixture = Fixture::new();
        fixture
            .state
            .load_user_list(&fixture.taxonomy, vec!["A2".to_owned()]);
        let before = fixture.visible();
        assert_eq!(before, ["A", "A2", "root"]);

        assert!(fixture.state.set_code_checked("A2", false));
        assert_eq!(fixture.visible(), ["A", "root"]);
        assert_eq!(fixture.state.focus(), fixture.taxonomy.root());
        assert!(!fixture.state.label_visible(&fixture.taxonomy, fixture.id("A2")));

        assert!(!fixture.state.set_code_checked("gone", false));
        assert!(fixture.state.set_code_checked("A2", true));
        assert_eq!(fixture.visible(), before);
    }

    #[test]
    fn focus_on_leaf_zooms_to_parent_and_selects() {
        let mut fixture = Fixture::new();
        let a1 = fixture.id("A1");
        let token = fixture
            .state
            .focus_on(&fixture.taxonomy, &fixture.layout, a1, 0.0)
            .unwrap();
        fixture.finish(token);
        assert_eq!(fixture.state.focus(), fixture.id("A"));
        assert_eq!(fixture.state.selected(), Some(a1));
    }

    #[test]
    fn opacity_grows_with_depth_and_hides_deep_levels() {
        let fixture = Fixture::new();
        let taxonomy = &fixture.taxonomy;
        let root = fixture.state.fill_opacity(taxonomy, taxonomy.root());
        let a = fixture.state.fill_opacity(taxonomy, fixture.id("A"));
        let a1 = fixture.state.fill_opacity(taxonomy, fixture.id("A1"));
        assert!(root > 0.0 && a > root);
        assert_eq!(a1, 0.0);
        assert!((root - 1.0 / 8.0).abs() < 1e-6);
    }
}
