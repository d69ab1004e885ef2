use crate::pricing::normalize_model;
use crate::store::PricedEvent;
use crate::types::Summary;
use std::collections::HashSet;

/// Aggregate a set of events into a `Summary`. Order-independent; an
/// empty input yields the all-zero summary, not a failure.
pub fn summarize<'a, I>(events: I) -> Summary
where
    I: IntoIterator<Item = &'a PricedEvent>,
{
    let mut summary = Summary::default();
    let mut sessions = HashSet::new();
    let mut projects = HashSet::new();

    for priced in events {
        let event = &priced.event;

        summary.event_count += 1;
        summary.tokens += event.tokens;
        sessions.insert(&event.session);
        if let Some(project) = &event.project {
            projects.insert(project);
        }

        let per_model = summary
            .by_model
            .entry(normalize_model(&event.model))
            .or_default();
        per_model.requests += 1;
        per_model.tokens += event.tokens;

        match &priced.cost {
            Some(breakdown) => {
                let total = breakdown.total();
                summary.total_cost += total;
                summary.cache_savings += breakdown.cache_savings;
                per_model.cost += total;
            }
            None => summary.unpriced_count += 1,
        }
    }

    summary.session_count = sessions.len();
    summary.project_count = projects.len();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CostBreakdown, ProjectName, SessionId, TokenCounts, UsageEvent};

    fn priced(session: &str, project: Option<&str>, model: &str, input: u64) -> PricedEvent {
        PricedEvent {
            event: UsageEvent {
                session: SessionId::from(session),
                project: project.map(ProjectName::from),
                model: model.to_string(),
                timestamp: "2025-01-15T09:00:00Z".parse().unwrap(),
                tokens: TokenCounts {
                    input,
                    output: 2 * input,
                    cache_creation: 0,
                    cache_read: 0,
                },
            },
            cost: Some(CostBreakdown {
                input_cost: input as f64 * 0.5,
                output_cost: 0.0,
                cache_creation_cost: 0.0,
                cache_read_cost: 0.0,
                cache_savings: 0.0,
            }),
        }
    }

    #[test]
    fn test_empty_input_yields_zero_summary() {
        let summary = summarize(std::iter::empty());
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_totals_and_distinct_counts() {
        let events = vec![
            priced("s1", Some("alpha"), "sonnet", 100),
            priced("s1", Some("alpha"), "sonnet", 50),
            priced("s2", Some("beta"), "opus", 25),
            priced("s3", None, "opus", 10),
        ];
        let summary = summarize(&events);

        assert_eq!(summary.event_count, 4);
        assert_eq!(summary.tokens.input, 185);
        assert_eq!(summary.tokens.output, 370);
        assert_eq!(summary.session_count, 3);
        // The unknown project does not count as a distinct project
        assert_eq!(summary.project_count, 2);
        assert!((summary.total_cost - 92.5).abs() < 1e-12);
    }

    #[test]
    fn test_by_model_breakdown_uses_normalized_keys() {
        let events = vec![
            priced("s1", None, "Claude-Sonnet-4-20250514", 100),
            priced("s1", None, "claude-sonnet-4-20250514", 50),
        ];
        let summary = summarize(&events);

        assert_eq!(summary.by_model.len(), 1);
        let usage = &summary.by_model["claude-sonnet-4-20250514"];
        assert_eq!(usage.requests, 2);
        assert_eq!(usage.tokens.input, 150);
    }

    #[test]
    fn test_unpriced_events_count_tokens_but_not_cost() {
        let mut unpriced = priced("s1", None, "mystery", 100);
        unpriced.cost = None;
        let events = vec![unpriced, priced("s2", None, "sonnet", 10)];
        let summary = summarize(&events);

        assert_eq!(summary.event_count, 2);
        assert_eq!(summary.unpriced_count, 1);
        assert_eq!(summary.tokens.input, 110);
        assert!((summary.total_cost - 5.0).abs() < 1e-12);
        assert_eq!(summary.by_model["mystery"].cost, 0.0);
    }

    #[test]
    fn test_summation_is_order_independent() {
        let events = vec![
            priced("s1", Some("alpha"), "sonnet", 100),
            priced("s2", Some("beta"), "opus", 25),
            priced("s3", None, "opus", 10),
        ];
        let mut reversed: Vec<_> = events.clone();
        reversed.reverse();

        assert_eq!(summarize(&events), summarize(&reversed));
    }
}
