use std::fmt;

use serde::{Serialize, Serializer};

use crate::record::RecordKind;

/// Logical page identifier, the first segment of a location fragment.
///
/// The set is closed: every route the browser knows is a variant here, and
/// anything else decodes to [`Route::Unknown`] so the router can redirect it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Search,
    Elements,
    Documents,
    Usecases,
    Models,
    Epds,
    Handbook,
    ApiDocs,
    Element,
    Document,
    Usecase,
    Model,
    Epd,
    Unknown(String),
}

impl Route {
    pub fn parse(segment: &str) -> Self {
        match segment {
            "home" => Self::Home,
            "search" => Self::Search,
            "elements" => Self::Elements,
            "documents" => Self::Documents,
            "usecases" => Self::Usecases,
            "models" => Self::Models,
            "epds" => Self::Epds,
            "handbook" => Self::Handbook,
            "api-docs" => Self::ApiDocs,
            "element" => Self::Element,
            "document" => Self::Document,
            "usecase" => Self::Usecase,
            "model" => Self::Model,
            "epd" => Self::Epd,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Home => "home",
            Self::Search => "search",
            Self::Elements => "elements",
            Self::Documents => "documents",
            Self::Usecases => "usecases",
            Self::Models => "models",
            Self::Epds => "epds",
            Self::Handbook => "handbook",
            Self::ApiDocs => "api-docs",
            Self::Element => "element",
            Self::Document => "document",
            Self::Usecase => "usecase",
            Self::Model => "model",
            Self::Epd => "epd",
            Self::Unknown(raw) => raw,
        }
    }

    /// Detail route for a record kind (`element`, `usecase`, ...).
    pub const fn detail(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Element => Self::Element,
            RecordKind::UseCase => Self::Usecase,
            RecordKind::Document => Self::Document,
            RecordKind::Model => Self::Model,
            RecordKind::Epd => Self::Epd,
        }
    }

    /// List route for a record kind (`elements`, `usecases`, ...).
    pub const fn listing(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Element => Self::Elements,
            RecordKind::UseCase => Self::Usecases,
            RecordKind::Document => Self::Documents,
            RecordKind::Model => Self::Models,
            RecordKind::Epd => Self::Epds,
        }
    }

    /// Record kind addressed by a detail route.
    pub const fn detail_kind(&self) -> Option<RecordKind> {
        match self {
            Self::Element => Some(RecordKind::Element),
            Self::Usecase => Some(RecordKind::UseCase),
            Self::Document => Some(RecordKind::Document),
            Self::Model => Some(RecordKind::Model),
            Self::Epd => Some(RecordKind::Epd),
            _ => None,
        }
    }

    /// Record kind listed by a catalog route.
    pub const fn listing_kind(&self) -> Option<RecordKind> {
        match self {
            Self::Elements => Some(RecordKind::Element),
            Self::Usecases => Some(RecordKind::UseCase),
            Self::Documents => Some(RecordKind::Document),
            Self::Models => Some(RecordKind::Model),
            Self::Epds => Some(RecordKind::Epd),
            _ => None,
        }
    }

    /// Listing route a detail route belongs to.
    pub fn parent(&self) -> Option<Route> {
        self.detail_kind().map(Self::listing)
    }

    pub const fn is_detail(&self) -> bool {
        self.detail_kind().is_some()
    }
}

impl From<&str> for Route {
    fn from(segment: &str) -> Self {
        Self::parse(segment)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[&str] = &[
        "home", "search", "elements", "documents", "usecases", "models", "epds",
        "handbook", "api-docs", "element", "document", "usecase", "model", "epd",
    ];

    #[test]
    fn known_routes_round_trip() {
        for name in KNOWN {
            let route = Route::parse(name);
            assert!(
                !matches!(route, Route::Unknown(_)),
                "{name} should be a known route"
            );
            assert_eq!(route.as_str(), *name);
        }
    }

    #[test]
    fn unknown_route_keeps_raw_name() {
        let route = Route::parse("impressum");
        assert_eq!(route, Route::Unknown("impressum".to_string()));
        assert_eq!(route.to_string(), "impressum");
    }

    #[test]
    fn detail_routes_have_listing_parents() {
        assert_eq!(Route::Element.parent(), Some(Route::Elements));
        assert_eq!(Route::Usecase.parent(), Some(Route::Usecases));
        assert_eq!(Route::Epd.parent(), Some(Route::Epds));
        assert_eq!(Route::Elements.parent(), None);
        assert_eq!(Route::Home.parent(), None);
    }

    #[test]
    fn kind_mapping_is_symmetric() {
        for kind in RecordKind::ALL {
            assert_eq!(Route::detail(kind).detail_kind(), Some(kind));
            assert_eq!(Route::listing(kind).listing_kind(), Some(kind));
            assert_eq!(Route::detail(kind).as_str(), kind.route_prefix());
            assert_eq!(Route::listing(kind).as_str(), kind.collection());
        }
    }
}
