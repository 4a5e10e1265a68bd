//! Total classification of anything a tick can throw.
//!
//! Classification is kept apart from reporting: [`classify`] only inspects the
//! thrown value, [`ErrorRecord::log_lines`] renders it for the console.

use std::any::Any;
use std::fmt;

use crate::core::world::ValidationError;

/// A value that escaped tick work, either returned as an error or raised as a panic.
pub enum Thrown {
    Error(anyhow::Error),
    Panic(Box<dyn Any + Send>),
}

impl fmt::Debug for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thrown::Error(err) => f.debug_tuple("Error").field(err).finish(),
            Thrown::Panic(_) => f.write_str("Panic(..)"),
        }
    }
}

impl From<anyhow::Error> for Thrown {
    fn from(err: anyhow::Error) -> Self {
        Thrown::Error(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The host world view failed validation.
    Validation,
    /// Any other error that carries a message.
    Runtime,
    /// A value of unknown shape.
    Unrecognized,
}

impl ErrorKind {
    pub fn tag(self) -> &'static str {
        match self {
            ErrorKind::Validation => "[Type Error]",
            ErrorKind::Runtime => "[Runtime Error]",
            ErrorKind::Unrecognized => "[Unknown Error]",
        }
    }
}

/// Classified failure of one tick. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub trace: Option<String>,
}

impl ErrorRecord {
    /// Tagged headline followed by any trace lines.
    pub fn log_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("{} {}", self.kind.tag(), single_line(&self.message))];
        if let Some(trace) = &self.trace {
            lines.extend(trace.lines().map(str::to_string));
        }
        lines
    }
}

const UNKNOWN_PAYLOAD: &str = "<non-string panic payload>";

/// Map a thrown value onto exactly one [`ErrorKind`].
pub fn classify(thrown: &Thrown) -> ErrorRecord {
    match thrown {
        Thrown::Error(err) => classify_error(err),
        Thrown::Panic(payload) => classify_panic(&**payload),
    }
}

fn classify_error(err: &anyhow::Error) -> ErrorRecord {
    let kind = if err.chain().any(|cause| cause.is::<ValidationError>()) {
        ErrorKind::Validation
    } else {
        ErrorKind::Runtime
    };
    ErrorRecord {
        kind,
        message: err.to_string(),
        trace: cause_trace(err),
    }
}

fn classify_panic(payload: &(dyn Any + Send)) -> ErrorRecord {
    if let Some(validation) = payload.downcast_ref::<ValidationError>() {
        return ErrorRecord {
            kind: ErrorKind::Validation,
            message: validation.to_string(),
            trace: None,
        };
    }
    if let Some(err) = payload.downcast_ref::<anyhow::Error>() {
        return classify_error(err);
    }
    let message = if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        UNKNOWN_PAYLOAD.to_string()
    };
    ErrorRecord {
        kind: ErrorKind::Unrecognized,
        message,
        trace: None,
    }
}

/// `caused by:` lines for every source below the top-level error.
fn cause_trace(err: &anyhow::Error) -> Option<String> {
    let causes: Vec<String> = err
        .chain()
        .skip(1)
        .map(|cause| format!("    caused by: {cause}"))
        .collect();
    if causes.is_empty() {
        None
    } else {
        Some(causes.join("\n"))
    }
}

fn single_line(message: &str) -> String {
    message.lines().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::world::Capability;
    use anyhow::{Context, anyhow};

    fn validation() -> ValidationError {
        ValidationError {
            missing: Capability::Rooms,
        }
    }

    #[test]
    fn validation_error_is_validation() {
        let record = classify(&Thrown::Error(validation().into()));
        assert_eq!(record.kind, ErrorKind::Validation);
        assert_eq!(record.message, "Invalid Game object: missing rooms");
        assert_eq!(record.trace, None);
    }

    #[test]
    fn validation_wrapped_in_context_is_still_validation() {
        let err = Err::<(), _>(validation())
            .context("kernel rejected world")
            .expect_err("error");
        let record = classify(&Thrown::Error(err));
        assert_eq!(record.kind, ErrorKind::Validation);
        assert_eq!(record.message, "kernel rejected world");
        assert_eq!(
            record.trace.as_deref(),
            Some("    caused by: Invalid Game object: missing rooms")
        );
    }

    #[test]
    fn generic_error_is_runtime_with_trace() {
        let err = Err::<(), _>(anyhow!("spawn queue corrupt"))
            .context("kernel run")
            .expect_err("error");
        let record = classify(&Thrown::Error(err));
        assert_eq!(record.kind, ErrorKind::Runtime);
        assert_eq!(record.message, "kernel run");
        assert_eq!(
            record.trace.as_deref(),
            Some("    caused by: spawn queue corrupt")
        );
    }

    #[test]
    fn string_panic_is_unrecognized() {
        let record = classify(&Thrown::Panic(Box::new("boom")));
        assert_eq!(record.kind, ErrorKind::Unrecognized);
        assert_eq!(record.message, "boom");

        let record = classify(&Thrown::Panic(Box::new(String::from("owned boom"))));
        assert_eq!(record.kind, ErrorKind::Unrecognized);
        assert_eq!(record.message, "owned boom");
    }

    #[test]
    fn unknown_panic_payload_is_unrecognized() {
        let record = classify(&Thrown::Panic(Box::new(17_u32)));
        assert_eq!(record.kind, ErrorKind::Unrecognized);
        assert_eq!(record.message, UNKNOWN_PAYLOAD);
    }

    #[test]
    fn panic_with_typed_payloads_keeps_their_kind() {
        let record = classify(&Thrown::Panic(Box::new(validation())));
        assert_eq!(record.kind, ErrorKind::Validation);
        let record = classify(&Thrown::Panic(Box::new(anyhow!("typed"))));
        assert_eq!(record.kind, ErrorKind::Runtime);
    }

    #[test]
    fn each_kind_has_a_distinct_tagged_headline() {
        let records = [
            classify(&Thrown::Error(validation().into())),
            classify(&Thrown::Error(anyhow!("bad"))),
            classify(&Thrown::Panic(Box::new("raw"))),
        ];
        let headlines: Vec<String> = records
            .iter()
            .map(|record| record.log_lines().remove(0))
            .collect();
        assert_eq!(
            headlines,
            vec![
                "[Type Error] Invalid Game object: missing rooms",
                "[Runtime Error] bad",
                "[Unknown Error] raw",
            ]
        );
    }

    #[test]
    fn multi_line_messages_collapse_to_one_line() {
        let record = classify(&Thrown::Error(anyhow!("first\nsecond")));
        assert_eq!(record.log_lines(), vec!["[Runtime Error] first second"]);
    }
}
