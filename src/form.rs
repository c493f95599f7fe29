//! Query input form.
//!
//! Two text fields: the instant to look at (`YYYY-MM-DDTHH:MM`, local time)
//! and the span to aggregate over (e.g. `5m`). Submitting converts the
//! instant to a Unix timestamp and produces a [`FlowQuery`].

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use thiserror::Error;

use crate::source::FlowQuery;

/// Format of the instant field.
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Errors raised on submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid time '{0}', expected YYYY-MM-DDTHH:MM")]
    InvalidInstant(String),
}

/// Which field receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Instant,
    Span,
}

/// Values handed to the data source on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Unix seconds, or `None` when the instant was left empty.
    pub timestamp: Option<i64>,
    pub span: String,
}

impl Submission {
    pub fn into_query(self) -> FlowQuery {
        let time = self.timestamp.map(|t| t.to_string()).unwrap_or_default();
        FlowQuery::new(time, self.span)
    }
}

/// The form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub instant: String,
    pub span: String,
    pub focus: Field,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// A form preset to the current local minute with no span.
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    /// A form preset to the given instant.
    pub fn at<Tz: TimeZone>(now: DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            instant: now.format(INSTANT_FORMAT).to_string(),
            span: String::new(),
            focus: Field::default(),
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Instant => &self.instant,
            Field::Span => &self.span,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Instant => &mut self.instant,
            Field::Span => &mut self.span,
        }
    }

    /// Append a character to the focused field.
    pub fn push(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    /// Remove the last character of the focused field.
    pub fn pop(&mut self) {
        self.focused_mut().pop();
    }

    /// Clear the focused field.
    pub fn clear(&mut self) {
        self.focused_mut().clear();
    }

    /// Validate the fields, reading the instant as local time.
    pub fn submit(&self) -> Result<Submission, FormError> {
        self.submit_in(&Local)
    }

    /// Validate the fields, reading the instant in the given time zone.
    pub fn submit_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<Submission, FormError> {
        let instant = self.instant.trim();
        let timestamp = if instant.is_empty() {
            None
        } else {
            let naive = NaiveDateTime::parse_from_str(instant, INSTANT_FORMAT)
                .map_err(|_| FormError::InvalidInstant(instant.to_string()))?;
            // Ambiguous local times (DST fold) take the earlier instant.
            let local = tz
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| FormError::InvalidInstant(instant.to_string()))?;
            Some(local.timestamp())
        };

        Ok(Submission {
            timestamp,
            span: self.span.clone(),
        })
    }
}
