//! Navigation: fragment in, exactly one rendered page out.
//!
//! [`dispatch`] is a pure mapping from a decoded [`RouteState`] to either a
//! [`Page`] or a redirect. [`Router`] owns the current location and drives
//! a [`ViewRenderer`] through navigations and filter toggles.

use std::{collections::BTreeMap, ops::Range};

use serde::Serialize;

use crate::{
    breadcrumb::{self, Crumb},
    error::Result,
    filter::{self, FilterSet},
    pagination::Pagination,
    provider::DataProvider,
    record::{Record, RecordKind},
    route::Route,
    search::{self, SearchHit, SearchSort},
    url_state::{self, DEFAULT_FRAGMENT, RouteState, ViewMode},
};

/// Redirect hops followed before giving up and rendering `home`.
pub const MAX_REDIRECTS: usize = 4;

/// Outcome of dispatching a decoded location.
#[derive(Debug)]
pub enum Dispatch<'a> {
    Render(Page<'a>),
    Redirect(String),
}

/// Entry of the home page overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: RecordKind,
    pub label: &'static str,
    pub route: Route,
    pub count: usize,
}

/// Data handed to the renderer for one page.
#[derive(Debug, Serialize)]
#[serde(tag = "page", rename_all = "kebab-case")]
pub enum Page<'a> {
    Home {
        sections: Vec<Section>,
    },
    Search {
        query: String,
        sort: SearchSort,
        hits: Vec<SearchHit>,
    },
    Catalog(CatalogPage<'a>),
    Handbook,
    ApiDocs,
    Detail {
        kind: RecordKind,
        id: String,
        /// `None` when no record has this id.
        record: Option<&'a Record>,
    },
}

/// A filtered, sorted list page with its facets.
#[derive(Debug, Serialize)]
pub struct CatalogPage<'a> {
    pub kind: RecordKind,
    pub view: ViewMode,
    /// Every record that passed the filters, sorted by title.
    pub records: Vec<&'a Record>,
    /// Records in the whole collection, before filtering.
    pub collection_size: usize,
    pub categories: BTreeMap<String, usize>,
    pub tags: BTreeMap<String, usize>,
    pub pagination: Pagination,
}

impl CatalogPage<'_> {
    /// Slice of [`CatalogPage::records`] loaded so far.
    pub fn visible(&self) -> &[&Record] {
        &self.records[self.pagination.loaded_range()]
    }

    /// Load the next batch; returns the newly visible index range.
    pub fn load_more(&mut self) -> Range<usize> {
        self.pagination.next_batch().range
    }
}

/// Map a decoded location to a page.
///
/// Detail routes without an id redirect to their list, and unknown routes
/// redirect to `home`. Both redirects keep the active filters.
pub fn dispatch<'a, P>(
    provider: &'a P,
    state: &RouteState,
    sort: SearchSort,
) -> Dispatch<'a>
where
    P: DataProvider + ?Sized,
{
    let page = match &state.route {
        Route::Home => Page::Home {
            sections: RecordKind::ALL
                .iter()
                .map(|&kind| Section {
                    kind,
                    label: kind.group_label(),
                    route: Route::listing(kind),
                    count: provider.records(kind).len(),
                })
                .collect(),
        },
        Route::Search => Page::Search {
            query: state.search_query.clone(),
            sort,
            hits: search::full_search(provider, &state.search_query, sort),
        },
        Route::Elements
        | Route::Documents
        | Route::Usecases
        | Route::Models
        | Route::Epds => match state.route.listing_kind() {
            Some(kind) => Page::Catalog(catalog_page(provider, kind, state)),
            None => return Dispatch::Redirect(DEFAULT_FRAGMENT.to_string()),
        },
        Route::Handbook => Page::Handbook,
        Route::ApiDocs => Page::ApiDocs,
        Route::Element
        | Route::Document
        | Route::Usecase
        | Route::Model
        | Route::Epd => {
            let (Some(kind), Some(id)) = (state.route.detail_kind(), &state.id)
            else {
                let parent = state.route.parent().unwrap_or(Route::Home);
                return Dispatch::Redirect(state.navigate_with_filters(&parent));
            };
            Page::Detail {
                kind,
                id: id.clone(),
                record: provider.find(kind, id),
            }
        }
        Route::Unknown(_) => {
            return Dispatch::Redirect(state.navigate_with_filters(&Route::Home));
        }
    };
    Dispatch::Render(page)
}

/// category, tags, phases, then the quick text filter; sorted by title.
fn catalog_page<'a, P>(
    provider: &'a P,
    kind: RecordKind,
    state: &RouteState,
) -> CatalogPage<'a>
where
    P: DataProvider + ?Sized,
{
    let collection = provider.records(kind);
    let filtered = FilterSet::from(state).apply(collection);
    let filtered = filter::filter_by_text(filtered, &state.search_query);
    let records = filter::sort_by_title(filtered);

    let mut pagination = Pagination::new(records.len());
    pagination.next_batch();

    CatalogPage {
        kind,
        view: state.view,
        collection_size: collection.len(),
        categories: filter::category_counts(collection),
        tags: filter::tag_counts(collection),
        pagination,
        records,
    }
}

/// Display title of the record a detail location points at.
pub fn resolve_title<P>(provider: &P, state: &RouteState) -> Option<String>
where
    P: DataProvider + ?Sized,
{
    let kind = state.route.detail_kind()?;
    let id = state.id.as_deref()?;
    provider.find(kind, id).map(|r| r.title.clone())
}

/// Everything the renderer needs for one navigation.
#[derive(Debug, Serialize)]
pub struct View<'a> {
    pub location: &'a RouteState,
    pub fragment: String,
    pub title: Option<String>,
    pub breadcrumbs: Vec<Crumb>,
    pub active_nav: Option<Route>,
    #[serde(flatten)]
    pub page: Page<'a>,
}

/// Consumer of rendered pages. Called exactly once per navigation.
pub trait ViewRenderer {
    fn render(&mut self, view: &View<'_>) -> Result<()>;
}

impl<R: ViewRenderer + ?Sized> ViewRenderer for &mut R {
    fn render(&mut self, view: &View<'_>) -> Result<()> {
        (**self).render(view)
    }
}

/// Owns the current location and renders every navigation.
#[derive(Debug)]
pub struct Router<P, R> {
    provider: P,
    renderer: R,
    location: RouteState,
    search_sort: SearchSort,
}

impl<P: DataProvider, R: ViewRenderer> Router<P, R> {
    pub fn new(provider: P, renderer: R) -> Self {
        Self {
            provider,
            renderer,
            location: RouteState::default(),
            search_sort: SearchSort::default(),
        }
    }

    pub fn location(&self) -> &RouteState {
        &self.location
    }

    pub fn fragment(&self) -> String {
        self.location.to_fragment()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Swap in freshly loaded data and re-render the current location.
    pub fn replace_provider(&mut self, provider: P) -> Result<()> {
        self.provider = provider;
        self.refresh()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub fn search_sort(&self) -> SearchSort {
        self.search_sort
    }

    /// Decode `fragment`, follow redirects, and render the resulting page.
    pub fn navigate(&mut self, fragment: &str) -> Result<()> {
        let mut target = fragment.to_string();
        let mut hops = 0;

        loop {
            let state = url_state::decode(&target);
            let page = match dispatch(&self.provider, &state, self.search_sort) {
                Dispatch::Render(page) => page,
                Dispatch::Redirect(next) => {
                    hops += 1;
                    tracing::debug!(from = %target, to = %next, "redirect");
                    target = if hops > MAX_REDIRECTS {
                        tracing::warn!(%fragment, "too many redirects");
                        DEFAULT_FRAGMENT.to_string()
                    } else {
                        next
                    };
                    continue;
                }
            };

            let title = resolve_title(&self.provider, &state);
            let view = View {
                location: &state,
                fragment: state.to_fragment(),
                breadcrumbs: breadcrumb::trail(&state, title.as_deref()),
                active_nav: breadcrumb::active_nav(&state.route),
                title,
                page,
            };
            self.renderer.render(&view)?;

            self.location = state;
            return Ok(());
        }
    }

    /// Render the current location again.
    pub fn refresh(&mut self) -> Result<()> {
        let fragment = self.fragment();
        self.navigate(&fragment)
    }

    pub fn toggle_tag(&mut self, tag: &str) -> Result<()> {
        let next = self.location.toggle_tag(tag);
        self.navigate(&next)
    }

    pub fn toggle_category(&mut self, category: &str) -> Result<()> {
        let next = self.location.toggle_category(category);
        self.navigate(&next)
    }

    pub fn toggle_phase(&mut self, phase: u8) -> Result<()> {
        let next = self.location.toggle_phase(phase);
        self.navigate(&next)
    }

    pub fn switch_view(&mut self, view: ViewMode) -> Result<()> {
        let next = self.location.switch_view(view);
        self.navigate(&next)
    }

    pub fn clear_filters(&mut self) -> Result<()> {
        let next = self.location.clear_filters();
        self.navigate(&next)
    }

    pub fn search(&mut self, query: &str) -> Result<()> {
        self.navigate(&url_state::search_fragment(query))
    }

    /// Change the full-search order. Re-renders when a search page is shown.
    pub fn set_search_sort(&mut self, sort: SearchSort) -> Result<()> {
        self.search_sort = sort;
        if self.location.route == Route::Search {
            self.refresh()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Catalog;

    /// Records the fragment and page kind of every render call.
    #[derive(Default)]
    struct Recorder {
        renders: Vec<(String, String, Option<String>)>,
    }

    impl ViewRenderer for Recorder {
        fn render(&mut self, view: &View<'_>) -> Result<()> {
            let page = match &view.page {
                Page::Home { .. } => "home",
                Page::Search { .. } => "search",
                Page::Catalog(_) => "catalog",
                Page::Handbook => "handbook",
                Page::ApiDocs => "api-docs",
                Page::Detail { .. } => "detail",
            };
            self.renders
                .push((view.fragment.clone(), page.to_string(), view.title.clone()));
            Ok(())
        }
    }

    fn catalog() -> Catalog {
        let usecases = (1..=30)
            .map(|i| {
                Record::new(
                    RecordKind::UseCase,
                    format!("uc{i:03}"),
                    format!("Anwendung {i:02}"),
                    if i % 2 == 0 { "Planung" } else { "Betrieb" },
                )
                .with_tags(["BIM"])
                .with_phases([(i % 5) as u8 + 1])
            })
            .collect();

        Catalog::builder()
            .with(RecordKind::UseCase, usecases)
            .with(
                RecordKind::Element,
                vec![
                    Record::new(RecordKind::Element, "e2", "Wand", "Tragwerk")
                        .with_tags(["Holz"]),
                    Record::new(RecordKind::Element, "e1", "Dach", "Hülle")
                        .with_tags(["Holz", "Ziegel"]),
                ],
            )
            .build()
    }

    fn router() -> Router<Catalog, Recorder> {
        Router::new(catalog(), Recorder::default())
    }

    #[test]
    fn missing_detail_record_yields_no_title() {
        let catalog = catalog();
        let state = url_state::decode("epd/xyz");
        assert_eq!(resolve_title(&catalog, &state), None);

        match dispatch(&catalog, &state, SearchSort::default()) {
            Dispatch::Render(Page::Detail { kind, id, record }) => {
                assert_eq!(kind, RecordKind::Epd);
                assert_eq!(id, "xyz");
                assert!(record.is_none());
            }
            other => panic!("expected a detail page, got {other:?}"),
        }
    }

    #[test]
    fn detail_title_is_resolved() {
        let mut router = router();
        router.navigate("usecase/uc003").unwrap();
        let (_, page, title) = &router.renderer().renders[0];
        assert_eq!(page, "detail");
        assert_eq!(title.as_deref(), Some("Anwendung 03"));
    }

    #[test]
    fn unknown_route_redirects_home_with_filters() {
        let mut router = router();
        router.navigate("impressum?tag=BIM").unwrap();

        let renders = &router.renderer().renders;
        assert_eq!(renders.len(), 1, "renderer must be called exactly once");
        assert_eq!(renders[0].0, "home?tag=BIM");
        assert_eq!(renders[0].1, "home");
        assert_eq!(router.location().route, Route::Home);
    }

    #[test]
    fn detail_without_id_redirects_to_list() {
        let mut router = router();
        router.navigate("element?category=Tragwerk").unwrap();
        assert_eq!(router.renderer().renders[0].0, "elements?category=Tragwerk");
        assert_eq!(router.renderer().renders[0].1, "catalog");
    }

    #[test]
    fn empty_fragment_renders_home() {
        let mut router = router();
        router.navigate("").unwrap();
        assert_eq!(router.renderer().renders[0].1, "home");
    }

    #[test]
    fn catalog_page_filters_sorts_and_paginates() {
        let catalog = catalog();

        let state = url_state::decode("elements?tag=Holz");
        let Dispatch::Render(Page::Catalog(page)) =
            dispatch(&catalog, &state, SearchSort::default())
        else {
            panic!("expected a catalog page");
        };
        let titles: Vec<_> = page.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Dach", "Wand"]);
        assert_eq!(page.tags.get("Holz"), Some(&2));

        let state = url_state::decode("usecases");
        let Dispatch::Render(Page::Catalog(mut page)) =
            dispatch(&catalog, &state, SearchSort::default())
        else {
            panic!("expected a catalog page");
        };
        assert_eq!(page.records.len(), 30);
        assert_eq!(page.visible().len(), 24, "first batch holds 24 records");
        assert_eq!(page.load_more(), 24..30);
        assert_eq!(page.visible().len(), 30);
    }

    #[test]
    fn catalog_filters_combine() {
        let catalog = catalog();
        let state = url_state::decode("usecases?category=Planung&phase=1&phase=3&q=anwendung");
        let Dispatch::Render(Page::Catalog(page)) =
            dispatch(&catalog, &state, SearchSort::default())
        else {
            panic!("expected a catalog page");
        };
        assert!(!page.records.is_empty());
        for record in &page.records {
            assert_eq!(record.category, "Planung");
            assert!(record.phase_slice().iter().any(|p| [1, 3].contains(p)));
        }
    }

    #[test]
    fn toggle_on_detail_page_lands_on_filtered_list() {
        let mut router = router();
        router.navigate("usecase/uc010?phase=1").unwrap();
        router.toggle_phase(3).unwrap();

        assert_eq!(router.fragment(), "usecases?phase=1&phase=3");
        let last = router.renderer().renders.last().unwrap();
        assert_eq!(last.1, "catalog");
    }

    #[test]
    fn view_switch_and_clear() {
        let mut router = router();
        router.navigate("elements?tag=Holz").unwrap();
        router.switch_view(ViewMode::List).unwrap();
        assert_eq!(router.fragment(), "elements?tag=Holz&view=list");

        router.toggle_tag("Ziegel").unwrap();
        assert_eq!(router.fragment(), "elements?tag=Holz&tag=Ziegel&view=list");

        router.clear_filters().unwrap();
        assert_eq!(router.fragment(), "elements");
    }

    #[test]
    fn search_sort_rerenders_search_page() {
        let mut router = router();
        router.search("anwendung").unwrap();
        router.set_search_sort(SearchSort::Relevance).unwrap();

        assert_eq!(router.search_sort(), SearchSort::Relevance);
        assert_eq!(router.renderer().renders.len(), 2);
        assert_eq!(router.fragment(), "search?q=anwendung");
    }
}
