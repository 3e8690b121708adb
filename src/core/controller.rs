/// Page controller: one paginated table plus one create form for a resource
///
/// State changes happen synchronously on the caller's thread. Network work is
/// described as a `Job`, executed elsewhere (spawned task or inline await),
/// and its `Completion` is fed back through `apply`.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::api::{ApiError, CollectionApi};
use super::form::{FormOverlay, OverlayState, SubmitOutcome, SubmitRejected};
use super::record::{display_value, FormPayload, PageResult, Record};
use super::schema::Resource;
use super::table::{LoadOutcome, LoadTicket, PaginatedTable};

/// Network work requested by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Load(LoadTicket),
    Create(FormPayload),
    Delete(Value),
}

/// Result of a finished `Job`
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Loaded {
        ticket: LoadTicket,
        result: Result<PageResult, ApiError>,
    },
    Created(Result<Record, ApiError>),
    Deleted {
        id: Value,
        result: Result<(), ApiError>,
    },
}

pub struct PageController<A: ?Sized> {
    api: Arc<A>,
    resource: Resource,
    table: PaginatedTable,
    overlay: FormOverlay,
    pending_delete: Option<Value>,
    deleting: bool,
    status: Option<String>,
}

impl<A: CollectionApi + ?Sized + 'static> PageController<A> {
    pub fn new(api: Arc<A>, resource: Resource) -> Self {
        let overlay = FormOverlay::new(resource.form.clone());
        Self {
            api,
            resource,
            table: PaginatedTable::new(),
            overlay,
            pending_delete: None,
            deleting: false,
            status: None,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn table(&self) -> &PaginatedTable {
        &self.table
    }

    pub fn overlay(&self) -> &FormOverlay {
        &self.overlay
    }

    /// Mutable access for text input; state transitions go through the controller
    pub fn overlay_mut(&mut self) -> &mut FormOverlay {
        &mut self.overlay
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn pending_delete(&self) -> Option<&Value> {
        self.pending_delete.as_ref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.table.clear_error();
    }

    pub fn load(&mut self, page: u32) -> Job {
        Job::Load(self.table.begin_load(page))
    }

    pub fn refresh(&mut self) -> Job {
        Job::Load(self.table.refresh())
    }

    pub fn next_page(&mut self) -> Option<Job> {
        self.table.next_page().map(Job::Load)
    }

    pub fn prev_page(&mut self) -> Option<Job> {
        self.table.prev_page().map(Job::Load)
    }

    pub fn select_next(&mut self) {
        self.table.select_next();
    }

    pub fn select_prev(&mut self) {
        self.table.select_prev();
    }

    pub fn open_form(&mut self) -> bool {
        self.overlay.open()
    }

    pub fn cancel_form(&mut self) -> bool {
        self.overlay.cancel()
    }

    /// Validate the form and, if it passes, request the create call
    pub fn submit_form(&mut self) -> Result<Job, SubmitRejected> {
        let payload = self.overlay.begin_submit()?;
        debug!(resource = %self.resource.name, fields = payload.len(), "submitting form");
        Ok(Job::Create(payload))
    }

    /// Arm a delete confirmation for the selected record
    pub fn request_delete(&mut self) -> bool {
        if self.deleting || self.overlay.is_visible() {
            return false;
        }
        match self.table.selected() {
            Some(record) => {
                self.pending_delete = Some(record.id().clone());
                true
            }
            None => false,
        }
    }

    pub fn dismiss_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn confirm_delete(&mut self) -> Option<Job> {
        let id = self.pending_delete.take()?;
        self.deleting = true;
        Some(Job::Delete(id))
    }

    /// Apply a finished job. Returns the follow-up refresh, if any.
    pub fn apply(&mut self, completion: Completion) -> Option<Job> {
        match completion {
            Completion::Loaded { ticket, result } => {
                match self.table.finish_load(ticket, result) {
                    LoadOutcome::Applied => {
                        debug!(resource = %self.resource.name, page = self.table.page(), "page loaded");
                    }
                    LoadOutcome::Failed(error) => {
                        warn!(resource = %self.resource.name, page = ticket.page, error = %error, "page load failed");
                        self.status = Some(format!("✗ Failed to load page {}: {}", ticket.page, error));
                    }
                    LoadOutcome::Stale => {
                        debug!(resource = %self.resource.name, tag = ticket.tag, "discarding stale page");
                    }
                }
                None
            }
            Completion::Created(result) => match self.overlay.finish_submit(result) {
                SubmitOutcome::Created(record) => {
                    info!(resource = %self.resource.name, id = %record.id(), "record created");
                    self.status = Some(format!("✓ Created {} {}", self.resource.title, display_value(record.id())));
                    Some(self.refresh())
                }
                SubmitOutcome::Failed(error) => {
                    warn!(resource = %self.resource.name, kind = error.kind(), error = %error, "create failed");
                    None
                }
                SubmitOutcome::Ignored => None,
            },
            Completion::Deleted { id, result } => {
                self.deleting = false;
                match result {
                    Ok(()) => {
                        info!(resource = %self.resource.name, id = %id, "record deleted");
                        self.status = Some(format!("✓ Deleted {} {}", self.resource.title, display_value(&id)));
                        // Removing the last row of a page steps back one page
                        let page = self.table.page();
                        if self.table.records().len() <= 1 && page > 1 {
                            Some(self.load(page - 1))
                        } else {
                            Some(self.refresh())
                        }
                    }
                    Err(error) => {
                        warn!(resource = %self.resource.name, id = %id, error = %error, "delete failed");
                        self.status = Some(format!("✗ Failed to delete {}: {}", display_value(&id), error));
                        None
                    }
                }
            }
        }
    }

    /// Run one job against the API
    pub async fn execute(api: &A, endpoint: &str, job: Job) -> Completion {
        match job {
            Job::Load(ticket) => Completion::Loaded {
                ticket,
                result: api.list(endpoint, ticket.page).await,
            },
            Job::Create(payload) => Completion::Created(api.create(endpoint, &payload).await),
            Job::Delete(id) => {
                let result = api.delete(endpoint, &id).await;
                Completion::Deleted { id, result }
            }
        }
    }

    /// Run a job on the tokio runtime and hand the completion to `deliver`
    pub fn dispatch<F>(&self, job: Job, deliver: F)
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let endpoint = self.resource.endpoint.clone();
        tokio::spawn(async move {
            let completion = Self::execute(api.as_ref(), &endpoint, job).await;
            deliver(completion);
        });
    }

    /// Run a job and its follow-ups inline until nothing is left
    pub async fn drive(&mut self, job: Job) {
        let mut next = Some(job);
        while let Some(job) = next {
            let completion = Self::execute(self.api.as_ref(), &self.resource.endpoint, job).await;
            next = self.apply(completion);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.table.is_loading() || self.deleting || self.overlay.state() == OverlayState::Submitting
    }
}
