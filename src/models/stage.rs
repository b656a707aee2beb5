use serde::{Deserialize, Serialize};

/// Canonical consultation stage, in consultation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Symptoms,
    PreviousHistory,
    MedicationHistory,
    AdditionalSymptoms,
    Diagnosis,
    Criticality,
    End,
}

/// Every raw stage token the backend is known to report, with its canonical stage.
///
/// Single lookup table for alias resolution; nothing else should compare raw tokens.
pub const STAGE_ALIASES: &[(&str, Stage)] = &[
    ("start", Stage::Start),
    ("symptoms", Stage::Symptoms),
    ("collect_symptoms", Stage::Symptoms),
    ("initial_assessment", Stage::Symptoms),
    ("dynamic_symptoms", Stage::Symptoms),
    ("injury_assessment", Stage::Symptoms),
    ("infection_assessment", Stage::Symptoms),
    ("digestive_assessment", Stage::Symptoms),
    ("respiratory_assessment", Stage::Symptoms),
    ("chronic_condition", Stage::Symptoms),
    ("urgent_follow_up", Stage::Symptoms),
    ("emergency_services", Stage::Symptoms),
    ("previous_history", Stage::PreviousHistory),
    ("prev_history_node", Stage::PreviousHistory),
    ("medication_history", Stage::MedicationHistory),
    ("med_history_node", Stage::MedicationHistory),
    ("additional_symptoms", Stage::AdditionalSymptoms),
    ("additional_symptoms_node", Stage::AdditionalSymptoms),
    ("diagnosis_prep", Stage::Diagnosis),
    ("diagnosis", Stage::Diagnosis),
    ("diagnosis_node", Stage::Diagnosis),
    ("criticality", Stage::Criticality),
    ("criticality_node", Stage::Criticality),
    ("end", Stage::End),
];

impl Stage {
    /// All stages in consultation order.
    pub const ALL: [Stage; 8] = [
        Stage::Start,
        Stage::Symptoms,
        Stage::PreviousHistory,
        Stage::MedicationHistory,
        Stage::AdditionalSymptoms,
        Stage::Diagnosis,
        Stage::Criticality,
        Stage::End,
    ];

    /// Canonical token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Symptoms => "symptoms",
            Self::PreviousHistory => "previous_history",
            Self::MedicationHistory => "medication_history",
            Self::AdditionalSymptoms => "additional_symptoms",
            Self::Diagnosis => "diagnosis",
            Self::Criticality => "criticality",
            Self::End => "end",
        }
    }

    /// Resolve a raw backend token through the alias table.
    ///
    /// Whitespace and ASCII case are ignored. Unknown tokens (the backend
    /// reports `"unknown"` when it lost track) yield `None`.
    pub fn from_token(token: &str) -> Option<Stage> {
        let token = token.trim();
        STAGE_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(token))
            .map(|(_, stage)| *stage)
    }

    /// Criticality (recommendations) or end.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Criticality | Self::End)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_tokens_resolve_to_themselves() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_token(stage.as_str()), Some(stage));
        }
    }

    #[test]
    fn node_aliases_resolve() {
        assert_eq!(Stage::from_token("criticality_node"), Some(Stage::Criticality));
        assert_eq!(Stage::from_token("diagnosis_prep"), Some(Stage::Diagnosis));
        assert_eq!(Stage::from_token("diagnosis_node"), Some(Stage::Diagnosis));
        assert_eq!(Stage::from_token("prev_history_node"), Some(Stage::PreviousHistory));
        assert_eq!(Stage::from_token("med_history_node"), Some(Stage::MedicationHistory));
    }

    #[test]
    fn assessment_variants_count_as_symptoms() {
        assert_eq!(Stage::from_token("respiratory_assessment"), Some(Stage::Symptoms));
        assert_eq!(Stage::from_token("emergency_services"), Some(Stage::Symptoms));
    }

    #[test]
    fn token_matching_ignores_case_and_padding() {
        assert_eq!(Stage::from_token("  Criticality "), Some(Stage::Criticality));
        assert_eq!(Stage::from_token("END"), Some(Stage::End));
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        assert_eq!(Stage::from_token("unknown"), None);
        assert_eq!(Stage::from_token(""), None);
        assert_eq!(Stage::from_token("criticality-node"), None);
    }

    #[test]
    fn every_alias_is_unique() {
        for (i, (a, _)) in STAGE_ALIASES.iter().enumerate() {
            assert!(
                STAGE_ALIASES[i + 1..].iter().all(|(b, _)| a != b),
                "duplicate alias {a}"
            );
        }
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Criticality.is_terminal());
        assert!(Stage::End.is_terminal());
        assert!(!Stage::Diagnosis.is_terminal());
    }

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Start < Stage::Symptoms);
        assert!(Stage::Diagnosis < Stage::Criticality);
    }
}
