use crate::models::{latest_assistant, Message, Stage};

/// Substrings that only appear in the backend's final recommendation output.
const RECOMMENDATION_MARKERS: &[&str] = &["URGENCY LEVEL", "PRECAUTIONS", "TIMEFRAME"];

/// Markers that count only when they appear together.
const DIAGNOSIS_MARKER_PAIR: (&str, &str) = ("LIKELY CONDITION", "ACTION STEPS");

/// True when the text carries the recommendation markers.
pub fn has_recommendation_markers(content: &str) -> bool {
    RECOMMENDATION_MARKERS.iter().any(|m| content.contains(m))
        || (content.contains(DIAGNOSIS_MARKER_PAIR.0) && content.contains(DIAGNOSIS_MARKER_PAIR.1))
}

/// Inputs the classifier reconciles into one canonical stage.
#[derive(Debug, Clone, Copy)]
pub struct StageSignals<'a> {
    /// Raw stage token from the latest backend reply, if any.
    pub reported: Option<&'a str>,
    pub messages: &'a [Message],
    pub exchange_count: u32,
    /// Stage before this reply.
    pub previous: Stage,
}

/// Derive the canonical stage from the reported token, message content and history.
pub fn classify(signals: &StageSignals<'_>) -> Stage {
    let content = latest_assistant(signals.messages)
        .filter(|m| has_recommendation_markers(&m.content))
        .map(|_| Stage::Criticality);

    let reported = signals.reported.and_then(Stage::from_token);

    let fallback = if signals.previous == Stage::Start && signals.exchange_count > 0 {
        Stage::Symptoms
    } else {
        signals.previous
    };

    let stage = merge_signals(content, reported, fallback);
    tracing::debug!(
        reported = ?signals.reported,
        content = ?content,
        stage = ?stage,
        "Classified consultation stage"
    );
    stage
}

/// Precedence: content markers, then the reported token, then the fallback.
pub fn merge_signals(content: Option<Stage>, reported: Option<Stage>, fallback: Stage) -> Stage {
    content.or(reported).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::STAGE_ALIASES;

    fn signals<'a>(reported: Option<&'a str>, messages: &'a [Message]) -> StageSignals<'a> {
        StageSignals {
            reported,
            messages,
            exchange_count: 1,
            previous: Stage::Symptoms,
        }
    }

    // ── Markers ──

    #[test]
    fn single_markers_match() {
        assert!(has_recommendation_markers("## URGENCY LEVEL\nLow"));
        assert!(has_recommendation_markers("PRECAUTIONS: avoid screens"));
        assert!(has_recommendation_markers("TIMEFRAME: 2 days"));
    }

    #[test]
    fn paired_markers_need_both() {
        assert!(!has_recommendation_markers("LIKELY CONDITION: migraine"));
        assert!(!has_recommendation_markers("ACTION STEPS: rest"));
        assert!(has_recommendation_markers(
            "## LIKELY CONDITION\nViral pharyngitis\n## ACTION STEPS\n- Rest"
        ));
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert!(!has_recommendation_markers("the urgency level is low"));
    }

    // ── Classification ──

    #[test]
    fn reported_token_resolves_through_aliases() {
        let history = vec![Message::assistant("What are your symptoms?")];
        assert_eq!(
            classify(&signals(Some("med_history_node"), &history)),
            Stage::MedicationHistory
        );
    }

    #[test]
    fn content_markers_override_reported_token() {
        let history = vec![Message::assistant("URGENCY LEVEL: moderate")];
        assert_eq!(
            classify(&signals(Some("symptoms"), &history)),
            Stage::Criticality
        );
    }

    #[test]
    fn markers_only_read_from_latest_assistant_message() {
        let history = vec![
            Message::assistant("URGENCY LEVEL: moderate"),
            Message::user("thanks"),
            Message::assistant("Anything else?"),
        ];
        assert_eq!(classify(&signals(Some("end"), &history)), Stage::End);
    }

    #[test]
    fn transient_placeholder_is_not_scanned() {
        let history = vec![
            Message::assistant("Tell me more"),
            Message::transient("TIMEFRAME"),
        ];
        assert_eq!(classify(&signals(None, &history)), Stage::Symptoms);
    }

    #[test]
    fn unknown_token_falls_back_to_previous_stage() {
        let history = vec![Message::assistant("Go on")];
        let s = StageSignals {
            reported: Some("unknown"),
            messages: &history,
            exchange_count: 3,
            previous: Stage::PreviousHistory,
        };
        assert_eq!(classify(&s), Stage::PreviousHistory);
    }

    #[test]
    fn start_advances_to_symptoms_after_first_exchange() {
        let history = vec![Message::assistant("Hello")];
        let mut s = StageSignals {
            reported: None,
            messages: &history,
            exchange_count: 0,
            previous: Stage::Start,
        };
        assert_eq!(classify(&s), Stage::Start);
        s.exchange_count = 1;
        assert_eq!(classify(&s), Stage::Symptoms);
    }

    #[test]
    fn classify_is_deterministic() {
        let history = vec![
            Message::user("headache"),
            Message::assistant("LIKELY CONDITION and ACTION STEPS follow"),
        ];
        let s = signals(Some("diagnosis"), &history);
        assert_eq!(classify(&s), classify(&s));
    }

    #[test]
    fn aliases_of_same_stage_classify_identically() {
        let history = vec![Message::assistant("Next question")];
        for (alias, stage) in STAGE_ALIASES {
            assert_eq!(classify(&signals(Some(alias), &history)), *stage, "alias {alias}");
        }
    }

    #[test]
    fn merge_precedence() {
        assert_eq!(
            merge_signals(Some(Stage::Criticality), Some(Stage::Symptoms), Stage::Start),
            Stage::Criticality
        );
        assert_eq!(
            merge_signals(None, Some(Stage::Diagnosis), Stage::Start),
            Stage::Diagnosis
        );
        assert_eq!(merge_signals(None, None, Stage::PreviousHistory), Stage::PreviousHistory);
    }
}
