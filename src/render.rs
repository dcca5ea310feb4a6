//! Terminal renderers for routed pages and search previews.

use std::io::Write;

use chrono::Datelike;
use serde_json::Value;

use crate::{
    error::Result,
    record::Record,
    router::{CatalogPage, Page, View, ViewRenderer},
    search::{SearchGroup, SearchHit, parse_date},
    url_state::ViewMode,
};

const MONTHS: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// German name of a lifecycle phase.
pub fn phase_label(phase: u8) -> Option<&'static str> {
    match phase {
        1 => Some("Entwicklung"),
        2 => Some("Planung"),
        3 => Some("Ausführung"),
        4 => Some("Betrieb"),
        5 => Some("Rückbau"),
        _ => None,
    }
}

/// `2024-01-15` → `15.01.2024`. Unparseable input is returned unchanged,
/// a missing date becomes `—`.
pub fn format_date_short(raw: Option<&str>) -> String {
    match raw {
        None => "—".to_string(),
        Some(raw) => parse_date(raw)
            .map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| raw.to_string()),
    }
}

/// `2024-01-15` → `15. Januar 2024`.
pub fn format_date_long(raw: &str) -> Option<String> {
    let date = parse_date(raw)?;
    let month = MONTHS[date.month0() as usize];
    Some(format!("{}. {month} {}", date.day(), date.year()))
}

/// Display text for a kind-specific detail value.
///
/// `retention` is a number of years where 0 means unlimited. Lists are
/// joined with commas and classification entries read `system code name`.
pub fn detail_text(key: &str, value: &Value) -> String {
    match (key, value) {
        ("retention", Value::Number(n)) if n.as_u64() == Some(0) => {
            "unbefristet".to_string()
        }
        ("retention", Value::Number(n)) => format!("{n} Jahre"),
        _ => value_text(value),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(true) => "ja".to_string(),
        Value::Bool(false) => "nein".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) if map.contains_key("code") => ["system", "code", "name"]
            .iter()
            .filter_map(|k| map.get(*k).map(value_text))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", value_text(v)))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

/// Human-readable output in the style of a terminal listing.
#[derive(Debug)]
pub struct TextRenderer<W> {
    out: W,
    show_all: bool,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_all: false,
        }
    }

    /// Print every catalog record instead of only the first batch.
    pub fn show_all(mut self, show_all: bool) -> Self {
        self.show_all = show_all;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn header(&mut self, view: &View<'_>) -> Result<()> {
        let trail: Vec<&str> =
            view.breadcrumbs.iter().map(|c| c.label.as_str()).collect();
        writeln!(self.out, "{}", trail.join(" › "))?;
        writeln!(self.out, "#{}", view.fragment)?;
        if view.location.has_filters() {
            let state = view.location;
            let mut active: Vec<String> = Vec::new();
            if !state.category.is_empty() {
                active.push(format!("Kategorie: {}", state.category));
            }
            for tag in &state.tags {
                active.push(format!("Tag: {tag}"));
            }
            for &phase in &state.phases {
                active.push(format!(
                    "Phase: {}",
                    phase_label(phase).unwrap_or("?")
                ));
            }
            writeln!(self.out, "Filter: {}", active.join(", "))?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn catalog(&mut self, page: &CatalogPage<'_>) -> Result<()> {
        if page.records.is_empty() {
            writeln!(self.out, "Keine Einträge gefunden.")?;
            return Ok(());
        }

        let shown: &[&Record] = if self.show_all {
            &page.records
        } else {
            page.visible()
        };
        for record in shown {
            match page.view {
                ViewMode::Grid => {
                    writeln!(self.out, "[{}] {}", record.id, record.title)?;
                    if !record.category.is_empty() {
                        writeln!(self.out, "     {}", record.category)?;
                    }
                }
                ViewMode::List => {
                    writeln!(
                        self.out,
                        "{:<10} {:<40} {}",
                        record.id,
                        record.title,
                        record.tag_slice().join(", ")
                    )?;
                }
            }
        }

        writeln!(
            self.out,
            "\n{} von {} Einträgen",
            shown.len(),
            page.records.len()
        )?;
        if shown.len() < page.records.len() {
            writeln!(self.out, "(--all zeigt alle Einträge)")?;
        }
        Ok(())
    }

    fn detail(&mut self, record: &Record) -> Result<()> {
        writeln!(self.out, "{}", record.title)?;
        writeln!(self.out, "{}", "=".repeat(record.title.chars().count()))?;
        writeln!(self.out, "Typ:              {}", record.kind.type_label())?;
        writeln!(self.out, "ID:               {}", record.id)?;
        if !record.category.is_empty() {
            writeln!(self.out, "Kategorie:        {}", record.category)?;
        }
        if let Some(code) = &record.code {
            writeln!(self.out, "Code:             {code}")?;
        }
        if let Some(version) = &record.version {
            writeln!(self.out, "Version:          {version}")?;
        }
        writeln!(
            self.out,
            "Letzte Änderung:  {}",
            format_date_short(record.last_change.as_deref())
        )?;
        if !record.tag_slice().is_empty() {
            writeln!(self.out, "Tags:             {}", record.tag_slice().join(", "))?;
        }
        if !record.phase_slice().is_empty() {
            let phases: Vec<&str> = record
                .phase_slice()
                .iter()
                .filter_map(|&p| phase_label(p))
                .collect();
            writeln!(self.out, "Phasen:           {}", phases.join(", "))?;
        }
        for (key, label, value) in record.detail_entries() {
            writeln!(
                self.out,
                "{:<17} {}",
                format!("{label}:"),
                detail_text(key, value)
            )?;
        }
        if let Some(description) = &record.description {
            writeln!(self.out, "\n{description}")?;
        }
        Ok(())
    }

    /// Print a full search result list.
    pub fn results(&mut self, hits: &[SearchHit]) -> Result<()> {
        if hits.is_empty() {
            writeln!(self.out, "Keine Ergebnisse gefunden.")?;
            return Ok(());
        }

        for (i, hit) in hits.iter().enumerate() {
            let date = hit
                .date
                .as_deref()
                .and_then(format_date_long)
                .unwrap_or_default();
            writeln!(
                self.out,
                "{:>3}. [{}] {}  #{}  {}",
                i + 1,
                hit.type_label,
                hit.title,
                hit.fragment(),
                date
            )?;
        }
        writeln!(self.out, "\n{} Ergebnis(se)", hits.len())?;
        Ok(())
    }

    /// Print grouped search-as-you-type results.
    pub fn preview(&mut self, groups: &[SearchGroup<'_>]) -> Result<()> {
        let mut any = false;
        for group in groups.iter().filter(|g| !g.items.is_empty()) {
            any = true;
            writeln!(self.out, "{}", group.label)?;
            for record in &group.items {
                writeln!(self.out, "  {}  #{}", record.title, record.fragment())?;
            }
        }
        if !any {
            writeln!(self.out, "Keine Ergebnisse gefunden.")?;
        }
        Ok(())
    }
}

impl<W: Write> ViewRenderer for TextRenderer<W> {
    fn render(&mut self, view: &View<'_>) -> Result<()> {
        self.header(view)?;
        match &view.page {
            Page::Home { sections } => {
                for section in sections {
                    writeln!(
                        self.out,
                        "{:<20} {:>5}  #{}",
                        section.label, section.count, section.route
                    )?;
                }
            }
            Page::Search { query, sort, hits } => {
                writeln!(self.out, "Suche nach \"{query}\" ({})", sort.as_str())?;
                self.results(hits)?;
            }
            Page::Catalog(page) => self.catalog(page)?,
            Page::Handbook => {
                writeln!(self.out, "Handbuch & Downloads")?;
            }
            Page::ApiDocs => {
                writeln!(self.out, "REST-API: /rest/v1/<tabelle>?select=*")?;
            }
            Page::Detail { record: Some(record), .. } => self.detail(record)?,
            Page::Detail { kind, id, record: None } => {
                writeln!(
                    self.out,
                    "{} \"{id}\" wurde nicht gefunden.",
                    kind.type_label()
                )?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON document per rendered page.
#[derive(Debug)]
pub struct JsonRenderer<W> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ViewRenderer for JsonRenderer<W> {
    fn render(&mut self, view: &View<'_>) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, view)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
