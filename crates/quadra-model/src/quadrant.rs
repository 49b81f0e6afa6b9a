// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::task::ParseError;

/// Eisenhower-matrix category for an active task.
///
/// The finished list is not a quadrant: a completed task keeps the quadrant
/// it held at completion time so restoring it can return it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    Inbox,
    UrgentImportant,
    NotUrgentImportant,
    UrgentNotImportant,
    NotUrgentNotImportant,
}

impl Quadrant {
    /// Canonical display order: inbox first, then the matrix row by row.
    pub const ALL: [Self; 5] = [
        Self::Inbox,
        Self::UrgentImportant,
        Self::NotUrgentImportant,
        Self::UrgentNotImportant,
        Self::NotUrgentNotImportant,
    ];

    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "inbox" => Ok(Self::Inbox),
            "urgent_important" => Ok(Self::UrgentImportant),
            "not_urgent_important" => Ok(Self::NotUrgentImportant),
            "urgent_not_important" => Ok(Self::UrgentNotImportant),
            "not_urgent_not_important" => Ok(Self::NotUrgentNotImportant),
            _ => Err(ParseError::InvalidFormat(
                "quadrant must be one of inbox, urgent_important, not_urgent_important, urgent_not_important, not_urgent_not_important",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::UrgentImportant => "urgent_important",
            Self::NotUrgentImportant => "not_urgent_important",
            Self::UrgentNotImportant => "urgent_not_important",
            Self::NotUrgentNotImportant => "not_urgent_not_important",
        }
    }

    /// Human label for board rendering.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::UrgentImportant => "Urgent & Important",
            Self::NotUrgentImportant => "Not Urgent & Important",
            Self::UrgentNotImportant => "Urgent & Not Important",
            Self::NotUrgentNotImportant => "Not Urgent & Not Important",
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_variant() {
        for q in Quadrant::ALL {
            assert_eq!(Quadrant::parse(q.as_str()), Ok(q));
        }
    }

    #[test]
    fn parse_rejects_unknown_and_cased_input() {
        assert!(Quadrant::parse("finished").is_err());
        assert!(Quadrant::parse("Inbox").is_err());
        assert!(Quadrant::parse("").is_err());
    }

    #[test]
    fn wire_form_is_snake_case() {
        let encoded = serde_json::to_string(&Quadrant::UrgentImportant).expect("serialize");
        assert_eq!(encoded, "\"urgent_important\"");
        let decoded: Quadrant = serde_json::from_str("\"not_urgent_important\"").expect("parse");
        assert_eq!(decoded, Quadrant::NotUrgentImportant);
    }
}
