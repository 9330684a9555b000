/**
 * Student roster entries
 *
 * A `StudentRecord` is one row of an event roster. Two fields are
 * conditional: `other_illness` only carries text when the illness is
 * `Other`, and `medication_details` only when `taking_medication` is set.
 * `normalized()` enforces both so that persistence and change detection
 * see the same values.
 */
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::format::lenient;

/// Medical condition flagged for a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Illness {
    #[default]
    None,
    Asthma,
    AllergiesMild,
    AllergiesSevere,
    Epilepsy,
    Diabetes,
    Heart,
    Other,
}

impl Illness {
    /// Every variant, in the order the roster dropdown lists them
    pub const ALL: [Illness; 8] = [
        Illness::None,
        Illness::Asthma,
        Illness::AllergiesMild,
        Illness::AllergiesSevere,
        Illness::Epilepsy,
        Illness::Diabetes,
        Illness::Heart,
        Illness::Other,
    ];

    /// Label stored by the backend
    pub fn label(self) -> &'static str {
        match self {
            Illness::None => "None",
            Illness::Asthma => "Asthma",
            Illness::AllergiesMild => "Allergies – Mild",
            Illness::AllergiesSevere => "Allergies – Severe / Anaphylaxis",
            Illness::Epilepsy => "Epilepsy / Seizure disorder",
            Illness::Diabetes => "Diabetes",
            Illness::Heart => "Heart condition",
            Illness::Other => "Other (specify)",
        }
    }

    /// Parse a stored label or one of the short spellings.
    ///
    /// Blank input is `None`; unknown labels are `Other`.
    pub fn from_label(label: &str) -> Self {
        let key: String = label
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "" | "none" => Illness::None,
            "asthma" => Illness::Asthma,
            "allergiesmild" => Illness::AllergiesMild,
            "allergiessevere" | "allergiessevereanaphylaxis" => Illness::AllergiesSevere,
            "epilepsy" | "epilepsyseizuredisorder" => Illness::Epilepsy,
            "diabetes" => Illness::Diabetes,
            "heart" | "heartcondition" => Illness::Heart,
            _ => Illness::Other,
        }
    }
}

impl fmt::Display for Illness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Illness {
    fn from(label: String) -> Self {
        Illness::from_label(&label)
    }
}

impl From<Illness> for String {
    fn from(illness: Illness) -> Self {
        illness.label().to_string()
    }
}

/// One roster entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub form: String,
    #[serde(deserialize_with = "lenient::string")]
    pub contact: String,
    pub illness: Illness,
    #[serde(deserialize_with = "lenient::string")]
    pub other_illness: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub taking_medication: bool,
    #[serde(deserialize_with = "lenient::string")]
    pub medication_details: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub permission: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub present: bool,
}

impl StudentRecord {
    /// Create a student with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Placeholder rows have a blank name and are never counted or persisted
    pub fn is_placeholder(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// Copy with the conditional fields cleared when their switch is off
    pub fn normalized(&self) -> Self {
        let mut student = self.clone();
        if student.illness != Illness::Other {
            student.other_illness.clear();
        }
        if !student.taking_medication {
            student.medication_details.clear();
        }
        student
    }
}
