use serde::Serialize;

use crate::{route::Route, url_state::RouteState};

/// Label of the breadcrumb leaf on the home page.
pub const HOME_TITLE: &str = "Fachdatenkatalog";

/// Entries of the main navigation, in display order.
pub const NAV_ROUTES: [Route; 7] = [
    Route::Elements,
    Route::Documents,
    Route::Usecases,
    Route::Models,
    Route::Epds,
    Route::Handbook,
    Route::ApiDocs,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub label: String,
    /// Link target; `None` marks the current page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Crumb {
    fn link(label: &str, route: &Route) -> Self {
        Self {
            label: label.to_string(),
            href: Some(format!("#{route}")),
        }
    }

    fn current(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: None,
        }
    }

    pub fn is_current(&self) -> bool {
        self.href.is_none()
    }
}

/// German display name of a route, if it has one.
pub fn route_label(route: &Route) -> Option<&'static str> {
    let label = match route {
        Route::Home => "Startseite",
        Route::Elements => "Elemente",
        Route::Element => "Element",
        Route::Documents => "Dokumente",
        Route::Document => "Dokument",
        Route::Usecases => "Anwendungsfälle",
        Route::Usecase => "Anwendungsfall",
        Route::Models => "Fachmodelle",
        Route::Model => "Fachmodell",
        Route::Epds | Route::Epd => "Ökobilanzdaten",
        Route::Handbook => "Handbuch & Downloads",
        Route::Search => "Suchergebnisse",
        Route::ApiDocs | Route::Unknown(_) => return None,
    };
    Some(label)
}

fn label_or_raw(route: &Route) -> String {
    route_label(route).map_or_else(|| route.to_string(), str::to_string)
}

/// Trail for the page at `state`. `title` names the record on detail pages;
/// when it is `None` the route's own label is used instead.
///
/// The parent link of a detail page carries the active filters and view so
/// going back restores the list as it was.
pub fn trail(state: &RouteState, title: Option<&str>) -> Vec<Crumb> {
    let route = &state.route;
    let home = Crumb::link("Startseite", &Route::Home);

    if *route == Route::Home {
        return vec![home, Crumb::current(HOME_TITLE)];
    }

    if let Some(parent) = route.parent() {
        let leaf = title.map_or_else(|| label_or_raw(route), str::to_string);
        let back = Crumb {
            label: label_or_raw(&parent),
            href: Some(format!("#{}", state.navigate_with_filters(&parent))),
        };
        return vec![home, back, Crumb::current(leaf)];
    }

    vec![home, Crumb::current(label_or_raw(route))]
}

/// Navigation entry highlighted for `route`. Detail pages highlight their
/// list page.
pub fn active_nav(route: &Route) -> Option<Route> {
    let target = route.parent().unwrap_or_else(|| route.clone());
    NAV_ROUTES.contains(&target).then_some(target)
}
