//! Precedence reduction of rule outcomes into a [`Verdict`].

use carwatch_core::{Message, Severity, Status, Verdict};

use crate::rule::Outcome;

/// Fold outcomes, in rule order, into one verdict.
///
/// A Critical outcome moves the status to `SeriousProblem`, which is never
/// downgraded. A Warning outcome only upgrades from `Normal`. Every outcome's
/// message is kept, tagged with its own severity, in the order given. With no
/// outcomes the verdict is the all-clear.
pub fn aggregate(outcomes: Vec<Outcome>) -> Verdict {
    if outcomes.is_empty() {
        return Verdict::all_clear();
    }

    let mut status = Status::Normal;
    let mut messages = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        match outcome.severity {
            Severity::Critical => status = Status::SeriousProblem,
            Severity::Warning if status == Status::Normal => status = Status::Warning,
            _ => {}
        }
        messages.push(Message::new(outcome.severity, outcome.message));
    }

    Verdict { status, messages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleId;

    fn outcome(rule: RuleId, severity: Severity) -> Outcome {
        Outcome {
            rule,
            severity,
            message: format!("{} {}", rule, severity),
        }
    }

    #[test]
    fn empty_is_all_clear() {
        let verdict = aggregate(Vec::new());
        assert_eq!(verdict.status, Status::Normal);
        assert_eq!(verdict.messages.len(), 1);
        assert_eq!(verdict.messages[0].severity, Severity::Info);
    }

    #[test]
    fn single_warning() {
        let verdict = aggregate(vec![outcome(RuleId::HighEngineTemp, Severity::Warning)]);
        assert_eq!(verdict.status, Status::Warning);
        assert_eq!(verdict.messages.len(), 1);
    }

    #[test]
    fn critical_is_a_sink() {
        let verdict = aggregate(vec![
            outcome(RuleId::HighEngineTemp, Severity::Critical),
            outcome(RuleId::RoughGearChange, Severity::Warning),
            outcome(RuleId::LowCoolant, Severity::Warning),
        ]);
        assert_eq!(verdict.status, Status::SeriousProblem);
        assert_eq!(verdict.messages.len(), 3);
    }

    #[test]
    fn late_critical_overrides_earlier_warnings() {
        let verdict = aggregate(vec![
            outcome(RuleId::HighEngineTemp, Severity::Warning),
            outcome(RuleId::ExternalAnomaly, Severity::Critical),
        ]);
        assert_eq!(verdict.status, Status::SeriousProblem);
    }

    #[test]
    fn messages_keep_order_and_own_severity() {
        let verdict = aggregate(vec![
            outcome(RuleId::HighEngineTemp, Severity::Warning),
            outcome(RuleId::Leakage, Severity::Critical),
            outcome(RuleId::ExternalAnomaly, Severity::Critical),
        ]);

        let tagged: Vec<(Severity, &str)> = verdict
            .messages
            .iter()
            .map(|m| (m.severity, m.text.as_str()))
            .collect();
        assert_eq!(
            tagged,
            vec![
                (Severity::Warning, "high-engine-temp Warning"),
                (Severity::Critical, "leakage Critical"),
                (Severity::Critical, "external-anomaly Critical"),
            ]
        );
    }

    #[test]
    fn status_is_independent_of_order() {
        let forward = vec![
            outcome(RuleId::HighEngineTemp, Severity::Warning),
            outcome(RuleId::LowEngineOil, Severity::Critical),
            outcome(RuleId::HighAccelSound, Severity::Warning),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(aggregate(forward).status, aggregate(reversed).status);
    }
}
