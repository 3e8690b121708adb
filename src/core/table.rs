/// Paginated table state
///
/// The table never talks to the network itself. `begin_load` hands out a
/// tagged ticket, the caller runs the request, and `finish_load` applies the
/// result. Only the latest ticket may change what is displayed.

use chrono::{DateTime, Local};

use super::api::ApiError;
use super::record::{PageMeta, PageResult, Record};
use super::schema::Resource;

/// Handle for one issued list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub tag: u64,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Records replaced
    Applied,
    /// Request failed; previous records kept
    Failed(ApiError),
    /// A newer request was issued meanwhile; result ignored
    Stale,
}

/// Previous/next availability for the navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavControls {
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

#[derive(Debug, Default)]
pub struct PaginatedTable {
    page: u32,
    records: Vec<Record>,
    meta: Option<PageMeta>,
    loading: bool,
    latest_tag: u64,
    last_error: Option<ApiError>,
    loaded_at: Option<DateTime<Local>>,
    selected: usize,
}

impl PaginatedTable {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Default::default()
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn meta(&self) -> Option<&PageMeta> {
        self.meta.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Local>> {
        self.loaded_at
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Start loading `page` (clamped to 1). Supersedes any load in flight.
    pub fn begin_load(&mut self, page: u32) -> LoadTicket {
        self.latest_tag += 1;
        self.loading = true;
        LoadTicket {
            tag: self.latest_tag,
            page: page.max(1),
        }
    }

    /// Reload the displayed page
    pub fn refresh(&mut self) -> LoadTicket {
        self.begin_load(self.page)
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<PageResult, ApiError>) -> LoadOutcome {
        if ticket.tag != self.latest_tag {
            return LoadOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(result) => {
                self.page = result.meta.page;
                self.records = result.records;
                self.meta = Some(result.meta);
                self.last_error = None;
                self.loaded_at = Some(Local::now());
                self.selected = self.selected.min(self.records.len().saturating_sub(1));
                LoadOutcome::Applied
            }
            Err(error) => {
                self.last_error = Some(error.clone());
                LoadOutcome::Failed(error)
            }
        }
    }

    pub fn nav(&self) -> NavControls {
        match &self.meta {
            Some(meta) => NavControls {
                prev_enabled: meta.has_prev(),
                next_enabled: meta.has_next(),
            },
            None => NavControls {
                prev_enabled: self.page > 1,
                next_enabled: false,
            },
        }
    }

    /// `None` when already on the last page
    pub fn next_page(&mut self) -> Option<LoadTicket> {
        if self.nav().next_enabled {
            Some(self.begin_load(self.page + 1))
        } else {
            None
        }
    }

    /// `None` when already on the first page
    pub fn prev_page(&mut self) -> Option<LoadTicket> {
        if self.nav().prev_enabled {
            Some(self.begin_load(self.page - 1))
        } else {
            None
        }
    }

    /// Display rows for the given resource, in received order
    pub fn rows(&self, resource: &Resource) -> Vec<Vec<String>> {
        self.records.iter().map(|r| resource.row(r)).collect()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&Record> {
        self.records.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.records.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// "Page 2/3 · 25 records" style summary
    pub fn page_label(&self) -> String {
        let mut label = match self.meta.as_ref().and_then(|m| m.pages()) {
            Some(pages) => format!("Page {}/{}", self.page, pages),
            None => format!("Page {}", self.page),
        };
        if let Some(count) = self.meta.as_ref().and_then(|m| m.total_count) {
            label.push_str(&format!(" · {} records", count));
        }
        label
    }
}
