//! Error reporting for the MWEL front-end.
//!
//! The lexer, parser, and pipeline entry points never fail with a `Result`
//! at their public boundaries; they report every problem to an [`ErrorSink`]
//! and keep going where recovery is possible. A sink collects records for
//! later inspection — typically an [`ErrorCollector`] — and a compilation is
//! considered successful only when the sink stayed empty.

use std::fmt;

use mwel_position_tracking::Position;
use serde::{Deserialize, Serialize};

/// One reported problem.
///
/// `token` is the offending source fragment when there is one (an illegal
/// character, the unexpected token's text); it is absent for end-of-input
/// errors. `position` locates the report in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub message: String,
    pub token: Option<String>,
    pub position: Option<Position>,
}

impl ErrorRecord {
    pub fn new(
        message: impl Into<String>,
        token: Option<String>,
        position: Option<Position>,
    ) -> Self {
        ErrorRecord { message: message.into(), token, position }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(position) = self.position {
            write!(f, " (line {}, column {})", position.line, position.column)?;
        }
        Ok(())
    }
}

/// Receiver for front-end diagnostics.
///
/// Implementations must not fail; reporting is fire-and-forget from the
/// reporting stage's point of view.
pub trait ErrorSink {
    fn report(&mut self, record: ErrorRecord);

    /// Convenience wrapper building the record in place.
    fn error(
        &mut self,
        message: impl Into<String>,
        token: Option<&str>,
        position: Option<Position>,
    ) where
        Self: Sized,
    {
        self.report(ErrorRecord::new(message, token.map(str::to_owned), position));
    }
}

/// The standard sink: accumulates records in order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCollector {
    records: Vec<ErrorRecord>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        ErrorCollector::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ErrorRecord> {
        self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }
}

impl ErrorSink for ErrorCollector {
    fn report(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }
}

/// A sink that drops everything. Useful when only the produced tree or
/// op-list matters and failure is detected by other means.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn report(&mut self, _record: ErrorRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collector_keeps_order() {
        let mut sink = ErrorCollector::new();
        sink.error("first", Some("$"), Some(Position::new(1, 0)));
        sink.error("second", None, None);

        assert_eq!(2, sink.len());
        assert_eq!("first", sink.records()[0].message);
        assert_eq!(Some("$".to_owned()), sink.records()[0].token);
        assert_eq!("second", sink.records()[1].message);
        assert_eq!(None, sink.records()[1].position);
    }

    #[test]
    fn display_with_and_without_position() {
        let with = ErrorRecord::new("Illegal character '$'", Some("$".to_owned()), Some(Position::new(2, 7)));
        assert_eq!("Illegal character '$' (line 2, column 7)", with.to_string());

        let without = ErrorRecord::new("Input ended unexpectedly", None, None);
        assert_eq!("Input ended unexpectedly", without.to_string());
    }
}
