/// Create-form overlay
///
/// `Closed -> Open -> Submitting -> Closed` on success, back to `Open` on
/// failure with the entered values intact. `cancel` goes `Open -> Closed`.

use std::collections::BTreeMap;

use super::api::ApiError;
use super::record::{FormPayload, Record};
use super::schema::{FieldError, FormSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Closed,
    Open,
    Submitting,
}

/// Why `begin_submit` did not produce a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejected {
    /// Overlay is not open
    NotOpen,
    /// A submission is already in flight
    Busy,
    /// Client-side validation failed; errors are attached to the fields
    Invalid(BTreeMap<String, FieldError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Record),
    Failed(ApiError),
    /// No submission was in flight
    Ignored,
}

#[derive(Debug)]
pub struct FormOverlay {
    schema: FormSchema,
    state: OverlayState,
    inputs: Vec<String>,
    focus: usize,
    field_errors: BTreeMap<String, String>,
    banner: Option<String>,
}

impl FormOverlay {
    pub fn new(schema: FormSchema) -> Self {
        let inputs = vec![String::new(); schema.len()];
        Self {
            schema,
            state: OverlayState::Closed,
            inputs,
            focus: 0,
            field_errors: BTreeMap::new(),
            banner: None,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state != OverlayState::Closed
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&str> {
        self.schema.position(name).map(|i| self.inputs[i].as_str())
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn field_error(&self, name: &str) -> Option<&str> {
        self.field_errors.get(name).map(String::as_str)
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Closed -> Open with empty inputs; no-op otherwise
    pub fn open(&mut self) -> bool {
        if self.state != OverlayState::Closed {
            return false;
        }
        self.reset();
        self.state = OverlayState::Open;
        true
    }

    /// Open -> Closed, discarding input. Refused while submitting.
    pub fn cancel(&mut self) -> bool {
        if self.state != OverlayState::Open {
            return false;
        }
        self.reset();
        self.state = OverlayState::Closed;
        true
    }

    fn reset(&mut self) {
        self.inputs = vec![String::new(); self.schema.len()];
        self.focus = 0;
        self.field_errors.clear();
        self.banner = None;
    }

    fn editable(&self) -> bool {
        self.state == OverlayState::Open && !self.inputs.is_empty()
    }

    pub fn insert_char(&mut self, c: char) {
        if self.editable() {
            self.inputs[self.focus].push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.editable() {
            self.inputs[self.focus].pop();
        }
    }

    /// Replace a whole input by field name
    pub fn set_input(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.schema.position(name) {
            Some(index) if self.state == OverlayState::Open => {
                self.inputs[index] = value.into();
                true
            }
            _ => false,
        }
    }

    pub fn focus_next(&mut self) {
        if !self.inputs.is_empty() {
            self.focus = (self.focus + 1) % self.inputs.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.inputs.is_empty() {
            self.focus = (self.focus + self.inputs.len() - 1) % self.inputs.len();
        }
    }

    /// Open -> Submitting when the inputs validate.
    ///
    /// On validation failure the overlay stays open with messages attached
    /// to the offending fields.
    pub fn begin_submit(&mut self) -> Result<FormPayload, SubmitRejected> {
        match self.state {
            OverlayState::Closed => return Err(SubmitRejected::NotOpen),
            OverlayState::Submitting => return Err(SubmitRejected::Busy),
            OverlayState::Open => {}
        }

        self.banner = None;
        match self.schema.validate(&self.inputs) {
            Ok(payload) => {
                self.field_errors.clear();
                self.state = OverlayState::Submitting;
                Ok(payload)
            }
            Err(errors) => {
                self.field_errors = errors.iter().map(|(k, e)| (k.clone(), e.to_string())).collect();
                self.focus_first_error();
                Err(SubmitRejected::Invalid(errors))
            }
        }
    }

    /// Apply the create result of the submission in flight
    pub fn finish_submit(&mut self, result: Result<Record, ApiError>) -> SubmitOutcome {
        if self.state != OverlayState::Submitting {
            return SubmitOutcome::Ignored;
        }

        match result {
            Ok(record) => {
                self.reset();
                self.state = OverlayState::Closed;
                SubmitOutcome::Created(record)
            }
            Err(error) => {
                self.state = OverlayState::Open;
                self.attach_error(&error);
                SubmitOutcome::Failed(error)
            }
        }
    }

    fn attach_error(&mut self, error: &ApiError) {
        self.field_errors.clear();
        self.banner = None;

        let mut unmatched = Vec::new();
        if let ApiError::Validation { message, fields, .. } = error {
            for (field, messages) in fields {
                if self.schema.position(field).is_some() {
                    self.field_errors.insert(field.clone(), messages.join("; "));
                } else {
                    unmatched.push(format!("{}: {}", field, messages.join("; ")));
                }
            }
            if !unmatched.is_empty() || self.field_errors.is_empty() {
                unmatched.insert(0, message.clone());
                self.banner = Some(unmatched.join(" | "));
            }
            self.focus_first_error();
        } else {
            self.banner = Some(error.to_string());
        }
    }

    fn focus_first_error(&mut self) {
        if let Some(index) = self
            .schema
            .defs()
            .position(|d| self.field_errors.contains_key(&d.name))
        {
            self.focus = index;
        }
    }
}
