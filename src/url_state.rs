//! Location fragment codec.
//!
//! The fragment is the only persisted view state of the browser:
//!
//! ```text
//! <route>[/<id>][?tag=<v>&...&category=<v>&phase=<1..5>&...&q=<v>&view=grid|list]
//! ```
//!
//! [`decode`] turns a fragment into a [`RouteState`]; [`encode`] and
//! [`FragmentBuilder`] produce the canonical form back. Filter toggles are
//! expressed as `RouteState -> fragment` functions so a navigation always
//! recomputes the whole state from the new fragment.
//!
//! ```
//! use fachkatalog::url_state::decode;
//!
//! let state = decode("usecase/uc010?phase=1");
//! assert_eq!(state.toggle_phase(3), "usecases?phase=1&phase=3");
//! ```

use percent_encoding::{
    AsciiSet,
    NON_ALPHANUMERIC,
    percent_decode_str,
    utf8_percent_encode,
};
use serde::Serialize;

use crate::{
    record::{MAX_PHASE, MIN_PHASE},
    route::Route,
};

/// Fragment used when the location has none.
pub const DEFAULT_FRAGMENT: &str = "home";

/// Characters left unescaped in parameter values, matching the browser's
/// `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Catalog presentation mode.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }

    /// Accepts exactly `grid` or `list`; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "grid" => Some(Self::Grid),
            "list" => Some(Self::List),
            _ => None,
        }
    }
}

/// Structured form of a location fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteState {
    pub route: Route,
    pub id: Option<String>,
    /// Active tag filters in first-seen order. Duplicates are kept.
    pub tags: Vec<String>,
    /// Active phase filters, each within `1..=5`.
    pub phases: Vec<u8>,
    pub search_query: String,
    pub category: String,
    pub view: ViewMode,
}

impl Default for RouteState {
    fn default() -> Self {
        Self {
            route: Route::Home,
            id: None,
            tags: Vec::new(),
            phases: Vec::new(),
            search_query: String::new(),
            category: String::new(),
            view: ViewMode::Grid,
        }
    }
}

impl RouteState {
    pub fn has_filters(&self) -> bool {
        !self.tags.is_empty()
            || !self.category.is_empty()
            || !self.phases.is_empty()
    }

    /// Route that filter changes navigate to.
    ///
    /// Detail pages have no filtered variant, so a filter toggled there
    /// lands on the parent listing instead.
    pub fn target_route(&self) -> Route {
        match (&self.id, self.route.parent()) {
            (Some(_), Some(parent)) => parent,
            _ => self.route.clone(),
        }
    }

    /// `view=` is only carried along when it differs from the default.
    fn view_param(&self) -> Option<ViewMode> {
        (self.view != ViewMode::default()).then_some(self.view)
    }

    fn base(&self) -> String {
        match &self.id {
            Some(id) => format!("{}/{id}", self.route),
            None => self.route.to_string(),
        }
    }

    /// Canonical fragment for the whole state, including `q`.
    pub fn to_fragment(&self) -> String {
        FragmentBuilder::new(self.base())
            .tags(&self.tags)
            .category(&self.category)
            .phases(&self.phases)
            .query(&self.search_query)
            .view(self.view_param())
            .build()
    }

    /// Add `tag` if absent, remove its first occurrence otherwise.
    pub fn toggle_tag(&self, tag: &str) -> String {
        let mut tags = self.tags.clone();
        if let Some(pos) = tags.iter().position(|t| t == tag) {
            tags.remove(pos);
        } else if !tag.is_empty() {
            tags.push(tag.to_string());
        }
        self.reencode(&tags, &self.category, &self.phases)
    }

    /// Select `category`, or clear it when it is already selected.
    pub fn toggle_category(&self, category: &str) -> String {
        let next = if self.category == category {
            ""
        } else {
            category
        };
        self.reencode(&self.tags, next, &self.phases)
    }

    /// Add `phase` if absent, remove it otherwise. Values outside `1..=5`
    /// leave the phase set untouched.
    pub fn toggle_phase(&self, phase: u8) -> String {
        let mut phases = self.phases.clone();
        if let Some(pos) = phases.iter().position(|p| *p == phase) {
            phases.remove(pos);
        } else if (MIN_PHASE..=MAX_PHASE).contains(&phase) {
            phases.push(phase);
        }
        self.reencode(&self.tags, &self.category, &phases)
    }

    /// Re-encode the current filters with an explicit view mode.
    pub fn switch_view(&self, view: ViewMode) -> String {
        encode(
            self.target_route().as_str(),
            &self.tags,
            &self.category,
            &self.phases,
            Some(view),
        )
    }

    /// Fragment with every filter removed. Detail pages keep their id.
    pub fn clear_filters(&self) -> String {
        self.base()
    }

    /// Carry the current filters over to another route.
    pub fn navigate_with_filters(&self, target: &Route) -> String {
        encode(
            target.as_str(),
            &self.tags,
            &self.category,
            &self.phases,
            self.view_param(),
        )
    }

    fn reencode(&self, tags: &[String], category: &str, phases: &[u8]) -> String {
        encode(
            self.target_route().as_str(),
            tags,
            category,
            phases,
            self.view_param(),
        )
    }
}

/// Decode a location fragment. Never fails: malformed parameters are
/// dropped and unknown routes are left for the router to redirect.
pub fn decode(fragment: &str) -> RouteState {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let fragment = if fragment.is_empty() {
        DEFAULT_FRAGMENT
    } else {
        fragment
    };

    let (path, query) = match fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (fragment, None),
    };

    let mut state = RouteState::default();
    match path.split_once('/') {
        Some((kind, rest)) if Route::parse(kind).is_detail() => {
            state.route = Route::parse(kind);
            state.id = rest
                .split('/')
                .next()
                .filter(|id| !id.is_empty())
                .map(str::to_string);
        }
        _ => state.route = Route::parse(path),
    }

    let Some(query) = query else {
        return state;
    };

    let mut query_seen = false;
    let mut category_seen = false;
    let mut view_seen = false;
    for (key, value) in parse_pairs(query) {
        match key.as_str() {
            "tag" if !value.is_empty() => state.tags.push(value),
            "phase" => {
                if let Some(phase) = parse_phase(&value) {
                    state.phases.push(phase);
                }
            }
            "q" if !query_seen => {
                query_seen = true;
                state.search_query = value;
            }
            "category" if !category_seen => {
                category_seen = true;
                state.category = value;
            }
            "view" if !view_seen => {
                view_seen = true;
                if let Some(view) = ViewMode::parse(&value) {
                    state.view = view;
                }
            }
            _ => {}
        }
    }

    state
}

/// Build the canonical fragment for a route and filter set.
///
/// Parameters appear in fixed order: tags, category, phases, view. An empty
/// category and a `None` view are omitted; with no parameters the bare
/// route is returned.
pub fn encode(
    route: &str,
    tags: &[String],
    category: &str,
    phases: &[u8],
    view: Option<ViewMode>,
) -> String {
    FragmentBuilder::new(route)
        .tags(tags)
        .category(category)
        .phases(phases)
        .view(view)
        .build()
}

/// Fragment of the full search results page for `query`.
pub fn search_fragment(query: &str) -> String {
    FragmentBuilder::new(Route::Search.as_str())
        .query(query)
        .build()
}

/// Incremental builder for canonical fragments.
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    base: String,
    params: Vec<String>,
}

impl FragmentBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            params: Vec::new(),
        }
    }

    pub fn tags(mut self, tags: &[String]) -> Self {
        for tag in tags {
            self.push("tag", tag);
        }
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        if !category.is_empty() {
            self.push("category", category);
        }
        self
    }

    pub fn phases(mut self, phases: &[u8]) -> Self {
        for phase in phases {
            self.params.push(format!("phase={phase}"));
        }
        self
    }

    pub fn query(mut self, query: &str) -> Self {
        if !query.is_empty() {
            self.push("q", query);
        }
        self
    }

    pub fn view(mut self, view: Option<ViewMode>) -> Self {
        if let Some(view) = view {
            self.params.push(format!("view={}", view.as_str()));
        }
        self
    }

    pub fn build(self) -> String {
        if self.params.is_empty() {
            self.base
        } else {
            format!("{}?{}", self.base, self.params.join("&"))
        }
    }

    fn push(&mut self, key: &str, value: &str) {
        self.params
            .push(format!("{key}={}", utf8_percent_encode(value, COMPONENT)));
    }
}

/// Split a form-encoded query into decoded key/value pairs.
fn parse_pairs(query: &str) -> impl Iterator<Item = (String, String)> + '_ {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Parse a phase value the way a lenient integer parser does: leading
/// whitespace and an optional sign, then as many digits as are present.
fn parse_phase(raw: &str) -> Option<u8> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value: u64 = rest[..digits_end].parse().ok()?;
    if negative {
        return None;
    }
    u8::try_from(value)
        .ok()
        .filter(|phase| (MIN_PHASE..=MAX_PHASE).contains(phase))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_fragment_is_home() {
        assert_eq!(decode(""), RouteState::default());
        assert_eq!(decode("#").route, Route::Home);
    }

    #[test]
    fn leading_hash_is_ignored() {
        assert_eq!(decode("#elements"), decode("elements"));
    }

    #[test]
    fn decodes_filters_and_defaults() {
        let state = decode("elements?tag=Holz&tag=Beton&category=Tragwerk");
        assert_eq!(
            state,
            RouteState {
                route: Route::Elements,
                id: None,
                tags: strings(&["Holz", "Beton"]),
                phases: vec![],
                search_query: String::new(),
                category: "Tragwerk".to_string(),
                view: ViewMode::Grid,
            }
        );
    }

    #[test]
    fn decodes_detail_route() {
        let state = decode("epd/xyz");
        assert_eq!(state.route, Route::Epd);
        assert_eq!(state.id.as_deref(), Some("xyz"));
    }

    #[test]
    fn detail_route_without_id_has_no_id() {
        let state = decode("element/");
        assert_eq!(state.route, Route::Element);
        assert_eq!(state.id, None);
    }

    #[test]
    fn non_entity_path_with_slash_stays_raw() {
        let state = decode("handbook/kapitel-2");
        assert_eq!(state.route, Route::Unknown("handbook/kapitel-2".into()));
        assert_eq!(state.id, None);
    }

    #[test]
    fn malformed_phases_are_dropped() {
        let state = decode("usecases?phase=0&phase=2&phase=six&phase=9&phase=-3&phase=4");
        assert_eq!(state.phases, vec![2, 4]);
    }

    #[test]
    fn phase_with_trailing_garbage_keeps_numeric_prefix() {
        assert_eq!(decode("usecases?phase=3abc").phases, vec![3]);
        assert_eq!(decode("usecases?phase=%203").phases, vec![3]);
    }

    #[test]
    fn empty_tags_are_dropped_and_duplicates_kept() {
        let state = decode("elements?tag=&tag=Holz&tag=Holz");
        assert_eq!(state.tags, strings(&["Holz", "Holz"]));
    }

    #[test]
    fn unknown_view_falls_back_to_grid() {
        assert_eq!(decode("elements?view=table").view, ViewMode::Grid);
        assert_eq!(decode("elements?view=LIST").view, ViewMode::Grid);
        assert_eq!(decode("elements?view=list").view, ViewMode::List);
    }

    #[test]
    fn single_value_params_take_first_occurrence() {
        let state = decode("search?q=beton&q=holz&category=A&category=B");
        assert_eq!(state.search_query, "beton");
        assert_eq!(state.category, "A");
    }

    #[test]
    fn values_are_percent_and_plus_decoded() {
        let state = decode("search?q=Beton+C25%2F30&tag=W%C3%A4rme");
        assert_eq!(state.search_query, "Beton C25/30");
        assert_eq!(state.tags, strings(&["Wärme"]));
    }

    #[test]
    fn only_first_question_mark_splits() {
        let state = decode("search?q=was?");
        assert_eq!(state.search_query, "was?");
    }

    #[test]
    fn encode_uses_fixed_parameter_order() {
        let fragment = encode(
            "elements",
            &strings(&["Holz", "Beton"]),
            "Tragwerk",
            &[1, 3],
            Some(ViewMode::List),
        );
        assert_eq!(
            fragment,
            "elements?tag=Holz&tag=Beton&category=Tragwerk&phase=1&phase=3&view=list"
        );
    }

    #[test]
    fn encode_without_params_is_bare_route() {
        assert_eq!(encode("models", &[], "", &[], None), "models");
    }

    #[test]
    fn encode_escapes_reserved_characters() {
        let fragment =
            encode("elements", &strings(&["A&B", "x=y", "Wärme 1+1"]), "", &[], None);
        assert_eq!(
            fragment,
            "elements?tag=A%26B&tag=x%3Dy&tag=W%C3%A4rme%201%2B1"
        );
        assert_eq!(decode(&fragment).tags, strings(&["A&B", "x=y", "Wärme 1+1"]));
    }

    #[test]
    fn toggle_phase_on_detail_page_lands_on_listing() {
        let state = decode("usecase/uc010?phase=1");
        assert_eq!(state.toggle_phase(3), "usecases?phase=1&phase=3");
    }

    #[test]
    fn toggle_phase_removes_present_phase() {
        let state = decode("usecases?phase=1&phase=3&phase=5");
        assert_eq!(state.toggle_phase(3), "usecases?phase=1&phase=5");
    }

    #[test]
    fn toggle_phase_ignores_out_of_range() {
        let state = decode("usecases?phase=2");
        assert_eq!(state.toggle_phase(7), "usecases?phase=2");
    }

    #[test]
    fn toggle_tag_preserves_order_of_remaining_tags() {
        let state = decode("elements?tag=a&tag=b&tag=c");
        assert_eq!(state.toggle_tag("b"), "elements?tag=a&tag=c");
        assert_eq!(state.toggle_tag("d"), "elements?tag=a&tag=b&tag=c&tag=d");
    }

    #[test]
    fn toggle_category_clears_on_reselect() {
        let state = decode("documents?category=Vertrag");
        assert_eq!(state.toggle_category("Vertrag"), "documents");
        assert_eq!(state.toggle_category("Bau"), "documents?category=Bau");
    }

    #[test]
    fn toggles_keep_non_default_view() {
        let state = decode("models?view=list");
        assert_eq!(state.toggle_tag("IFC"), "models?tag=IFC&view=list");
    }

    #[test]
    fn toggle_on_detail_page_keeps_other_filters() {
        let state = decode("element/e1?tag=Holz&category=Tragwerk");
        assert_eq!(
            state.toggle_tag("Beton"),
            "elements?tag=Holz&tag=Beton&category=Tragwerk"
        );
    }

    #[test]
    fn switch_view_emits_explicit_view() {
        let state = decode("epds?tag=Beton");
        assert_eq!(state.switch_view(ViewMode::Grid), "epds?tag=Beton&view=grid");
        assert_eq!(state.switch_view(ViewMode::List), "epds?tag=Beton&view=list");
    }

    #[test]
    fn clear_filters_keeps_detail_id() {
        assert_eq!(decode("element/e7?tag=Holz").clear_filters(), "element/e7");
        assert_eq!(decode("elements?tag=Holz&view=list").clear_filters(), "elements");
    }

    #[test]
    fn navigate_with_filters_carries_state() {
        let state = decode("elements?tag=Holz&phase=2&view=list");
        assert_eq!(
            state.navigate_with_filters(&Route::Documents),
            "documents?tag=Holz&phase=2&view=list"
        );
    }

    #[test]
    fn search_fragment_encodes_query() {
        assert_eq!(search_fragment("Beton C25"), "search?q=Beton%20C25");
        assert_eq!(search_fragment(""), "search");
        assert_eq!(decode(&search_fragment("a&b")).search_query, "a&b");
    }

    #[test]
    fn to_fragment_round_trips_full_state() {
        let fragment = "usecase/uc010?tag=BIM&category=Planung&phase=2&q=koord&view=list";
        assert_eq!(decode(fragment).to_fragment(), fragment);
    }

    #[test]
    fn encode_canonicalizes_parameter_order() {
        let state = decode("elements?view=list&phase=2&category=K&tag=b&tag=a");
        assert_eq!(
            state.to_fragment(),
            "elements?tag=b&tag=a&category=K&phase=2&view=list"
        );
    }

    #[derive(Debug, Clone)]
    enum Toggle {
        Tag(String),
        Category(String),
        Phase(u8),
        View(ViewMode),
    }

    fn toggle_strategy() -> impl Strategy<Value = Toggle> {
        let label = "[A-Za-zÄÖÜäöü0-9 &=+%?#/-]{1,10}";
        prop_oneof![
            label.prop_map(Toggle::Tag),
            label.prop_map(Toggle::Category),
            (1u8..=5).prop_map(Toggle::Phase),
            prop_oneof![Just(ViewMode::Grid), Just(ViewMode::List)]
                .prop_map(Toggle::View),
        ]
    }

    fn route_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("elements"),
            Just("documents"),
            Just("usecases"),
            Just("models"),
            Just("epds"),
            Just("element/e1"),
            Just("usecase/uc010"),
        ]
    }

    fn apply(state: &RouteState, toggle: &Toggle) -> String {
        match toggle {
            Toggle::Tag(tag) => state.toggle_tag(tag),
            Toggle::Category(category) => state.toggle_category(category),
            Toggle::Phase(phase) => state.toggle_phase(*phase),
            Toggle::View(view) => state.switch_view(*view),
        }
    }

    proptest! {
        #[test]
        fn prop_reachable_states_round_trip(
            start in route_strategy(),
            toggles in prop::collection::vec(toggle_strategy(), 0..12)
        ) {
            let mut state = decode(start);
            for toggle in &toggles {
                state = decode(&apply(&state, toggle));
                prop_assert!(state.id.is_none());
                prop_assert_eq!(decode(&state.to_fragment()), state.clone());
            }
        }

        #[test]
        fn prop_double_tag_toggle_restores_tags(
            tags in prop::collection::vec("[a-zä]{1,6}", 0..5),
            tag in "[a-zä &]{1,6}"
        ) {
            let mut state = decode("elements");
            for t in &tags {
                if !state.tags.contains(t) {
                    state = decode(&state.toggle_tag(t));
                }
            }
            let before = state.tags.clone();
            let once = decode(&state.toggle_tag(&tag));
            let twice = decode(&once.toggle_tag(&tag));
            if before.contains(&tag) {
                // re-added at the end
                prop_assert_eq!(twice.tags.len(), before.len());
                prop_assert_eq!(twice.tags.last(), Some(&tag));
            } else {
                prop_assert_eq!(twice.tags, before);
            }
        }
    }
}
