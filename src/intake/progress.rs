use serde::Serialize;

use crate::models::{PatientRecord, Stage};

/// Checklist entries shown in the progress panel, in order.
const CHECKLIST: &[(Stage, &str)] = &[
    (Stage::Symptoms, "Symptoms"),
    (Stage::PreviousHistory, "Medical History"),
    (Stage::MedicationHistory, "Medications"),
    (Stage::AdditionalSymptoms, "Additional Info"),
    (Stage::Diagnosis, "Diagnosis"),
    (Stage::Criticality, "Recommendations"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressStep {
    pub stage: Stage,
    pub label: &'static str,
    pub completed: bool,
    /// The consultation is currently at this step.
    pub current: bool,
}

/// Display name of the current stage.
pub fn stage_label(stage: Stage, is_complete: bool) -> &'static str {
    if is_complete {
        return "Consultation Complete";
    }
    match stage {
        Stage::Start => "Welcome",
        Stage::Symptoms => "Collecting Symptoms",
        Stage::PreviousHistory => "Medical History",
        Stage::MedicationHistory => "Medication History",
        Stage::AdditionalSymptoms => "Additional Symptoms",
        Stage::Diagnosis => "Diagnosis",
        Stage::Criticality => "Recommendations",
        Stage::End => "Consultation Complete",
    }
}

/// Build the progress checklist from the stage, record and completion flag.
pub fn progress(stage: Stage, record: &PatientRecord, is_complete: bool) -> Vec<ProgressStep> {
    CHECKLIST
        .iter()
        .map(|&(step, label)| ProgressStep {
            stage: step,
            label,
            completed: completed_by_stage(stage, step)
                || completed_by_record(step, record, is_complete),
            current: stage == step,
        })
        .collect()
}

/// Reaching a stage marks every step up to it done. Any assessment stage
/// means symptoms have been reported.
fn completed_by_stage(stage: Stage, step: Stage) -> bool {
    match stage {
        Stage::Start => false,
        Stage::End => true,
        _ => step <= stage,
    }
}

/// Collected data completes a step even when the stage lags behind.
fn completed_by_record(step: Stage, record: &PatientRecord, is_complete: bool) -> bool {
    match step {
        Stage::Symptoms => !record.symptoms.is_empty(),
        Stage::PreviousHistory => !record.previous_history.is_empty(),
        Stage::MedicationHistory => !record.medication_history.is_empty(),
        Stage::AdditionalSymptoms => !record.additional_symptoms.is_empty(),
        Stage::Diagnosis => !record.diagnosis.is_empty(),
        Stage::Criticality => is_complete,
        Stage::Start | Stage::End => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(steps: &[ProgressStep]) -> Vec<&'static str> {
        steps.iter().filter(|s| s.completed).map(|s| s.label).collect()
    }

    #[test]
    fn labels_per_stage() {
        assert_eq!(stage_label(Stage::Start, false), "Welcome");
        assert_eq!(stage_label(Stage::Symptoms, false), "Collecting Symptoms");
        assert_eq!(stage_label(Stage::Criticality, false), "Recommendations");
        assert_eq!(stage_label(Stage::End, false), "Consultation Complete");
    }

    #[test]
    fn complete_consultation_always_labelled_complete() {
        assert_eq!(stage_label(Stage::Diagnosis, true), "Consultation Complete");
    }

    #[test]
    fn start_completes_nothing() {
        let record = PatientRecord::default();
        assert!(completed(&progress(Stage::Start, &record, false)).is_empty());
    }

    #[test]
    fn symptom_stage_completes_symptoms_step() {
        let steps = progress(Stage::Symptoms, &PatientRecord::default(), false);
        assert_eq!(completed(&steps), vec!["Symptoms"]);
        assert!(steps[0].current);
    }

    #[test]
    fn stage_completes_everything_up_to_itself() {
        let steps = progress(Stage::MedicationHistory, &PatientRecord::default(), false);
        assert_eq!(completed(&steps), vec!["Symptoms", "Medical History", "Medications"]);
        let current: Vec<_> = steps.iter().filter(|s| s.current).map(|s| s.label).collect();
        assert_eq!(current, vec!["Medications"]);
    }

    #[test]
    fn end_completes_all() {
        let steps = progress(Stage::End, &PatientRecord::default(), true);
        assert!(steps.iter().all(|s| s.completed));
        assert!(steps.iter().all(|s| !s.current));
    }

    #[test]
    fn record_fields_complete_steps() {
        let record = PatientRecord {
            symptoms: vec!["fever".into()],
            diagnosis: "Influenza".into(),
            ..PatientRecord::default()
        };
        let steps = progress(Stage::Symptoms, &record, false);
        assert_eq!(completed(&steps), vec!["Symptoms", "Diagnosis"]);
    }

    #[test]
    fn recommendations_follow_completion_flag() {
        let steps = progress(Stage::Diagnosis, &PatientRecord::default(), true);
        assert!(steps.last().unwrap().completed);
    }
}
