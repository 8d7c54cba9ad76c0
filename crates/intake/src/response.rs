use serde::{Deserialize, Serialize};
use sg_domain::record::IntakeRecord;

use crate::schema::Field;
use crate::tools::FeeQuote;

/// The classified outcome of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseKind {
    /// Ask the resident for exactly one field.
    Ask {
        message: String,
        missing_fields: Vec<Field>,
        next_field: Option<Field>,
    },
    /// Everything is filled in; awaiting はい/いいえ.
    Review {
        message: String,
        record: IntakeRecord,
        fee_quote: Option<FeeQuote>,
    },
    Answer {
        message: String,
    },
    Error {
        message: String,
    },
}

impl ResponseKind {
    pub fn message(&self) -> &str {
        match self {
            ResponseKind::Ask { message, .. }
            | ResponseKind::Review { message, .. }
            | ResponseKind::Answer { message }
            | ResponseKind::Error { message } => message,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResponseKind::Ask { .. } => "ask",
            ResponseKind::Review { .. } => "review",
            ResponseKind::Answer { .. } => "answer",
            ResponseKind::Error { .. } => "error",
        }
    }

    pub fn next_field(&self) -> Option<Field> {
        match self {
            ResponseKind::Ask { next_field, .. } => *next_field,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let ask = ResponseKind::Ask {
            message: "お名前を教えてください".into(),
            missing_fields: vec![Field::Name, Field::Phone],
            next_field: Some(Field::Name),
        };
        let json = serde_json::to_value(&ask).unwrap();
        assert_eq!(json["kind"], "ask");
        assert_eq!(json["next_field"], "name");
        assert_eq!(json["missing_fields"][1], "phone");

        let err = serde_json::to_value(ResponseKind::Error { message: "x".into() }).unwrap();
        assert_eq!(err["kind"], "error");
    }
}
