//! fachkatalog - browse, filter and search a construction reference catalog.
//!
//! The catalog holds five record collections (elements, use cases,
//! documents, models and EPDs). Every view is addressed by a location
//! fragment such as `usecases?tag=BIM&phase=2`, which decodes into a
//! [`RouteState`] and is rendered by a [`Router`].
//!
//! # Quick start
//!
//! ```no_run
//! use fachkatalog::{Router, Settings};
//! use fachkatalog::config::Overrides;
//! use fachkatalog::render::TextRenderer;
//!
//! let settings = Settings::resolve(&Overrides::default()).unwrap();
//! let catalog = settings.loader().unwrap().load();
//!
//! let mut router = Router::new(catalog, TextRenderer::new(std::io::stdout()));
//! router.navigate("usecases?phase=2").unwrap();
//! router.toggle_tag("BIM").unwrap();
//! println!("now at #{}", router.fragment());
//! ```

pub mod breadcrumb;
pub mod cli;
pub mod config;
pub mod data_dir;
pub mod error;
pub mod filter;
pub mod i18n;
pub mod pagination;
pub mod provider;
pub mod record;
pub mod remote;
pub mod render;
pub mod route;
pub mod router;
pub mod search;
pub mod url_state;

pub use config::Settings;
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use provider::{Catalog, DataProvider, Loader};
pub use record::{Record, RecordKind};
pub use route::Route;
pub use router::{Router, ViewRenderer};
pub use url_state::RouteState;
