pub mod api;
pub mod controller;
pub mod form;
pub mod http;
pub mod record;
pub mod schema;
pub mod table;

pub use api::{ApiError, CollectionApi};
pub use controller::{Completion, Job, PageController};
pub use form::{FormOverlay, OverlayState, SubmitOutcome, SubmitRejected};
pub use http::{ClientSettings, HttpApiClient};
pub use record::{FieldValue, FormPayload, PageMeta, PageResult, Record};
pub use schema::{Column, FieldDef, FieldKind, FormSchema, Resource, ResourceSpec};
pub use table::{LoadOutcome, LoadTicket, NavControls, PaginatedTable};
