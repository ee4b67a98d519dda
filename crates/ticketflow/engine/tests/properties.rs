//! Property tests: routing decisions hold for every score and query.

use proptest::prelude::*;
use ticketflow_capability::FixedScore;
use ticketflow_engine::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn run(score: u32, threshold: u32, query: &str) -> RunOutcome {
    WorkflowExecutor::builder()
        .with_config(
            WorkflowConfig::default()
                .with_threshold(threshold)
                .with_score_range(0, 200),
        )
        .with_score_source(FixedScore::new(score))
        .build()
        .unwrap()
        .run(SeedRecord::new(7, "Sam Lee", "sam@example.com", query, "Normal"))
        .unwrap()
}

/// Queries that may or may not name a product
fn arb_query() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{0,20}",
        ("[a-z ]{0,10}", "[A-Za-z0-9]{1,6}").prop_map(|(p, w)| format!("{} product {}", p, w)),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Scores below the threshold escalate, everything else resolves
    #[test]
    fn decision_follows_threshold(score in 0u32..=200, threshold in 0u32..=200) {
        let outcome = run(score, threshold, "product Z broke");
        let expected = if score < threshold { Decision::Escalate } else { Decision::Resolve };
        prop_assert_eq!(outcome.payload.decision, Some(expected));
        prop_assert_eq!(outcome.payload.solution_score, Some(score));
    }

    /// Escalated runs never reach UPDATE, CREATE or DO; resolved runs
    /// visit them in that order before COMPLETE
    #[test]
    fn tail_stages_follow_decision(score in 0u32..=100, query in arb_query()) {
        let outcome = run(score, 90, &query);
        let tail = [StageId::Update, StageId::Create, StageId::Do, StageId::Complete];

        if outcome.is_escalated() {
            prop_assert_eq!(outcome.path.last(), Some(&StageId::Decide));
            for stage in tail {
                prop_assert!(!outcome.record.logs().has_marker(stage));
            }
        } else {
            let n = outcome.path.len();
            prop_assert_eq!(&outcome.path[n - 4..], &tail[..]);
            prop_assert!(outcome.payload.final_response_to_customer.is_some());
        }
    }

    /// WAIT runs exactly when no product was extracted
    #[test]
    fn wait_iff_no_product(query in arb_query()) {
        let outcome = run(95, 90, &query);
        let has_product = outcome.record.product().is_some();
        prop_assert_eq!(outcome.visited(StageId::Wait), !has_product);
        prop_assert_eq!(outcome.record.clarifying_question.is_some(), !has_product);
    }

    /// Audit log entries are non-empty and each stage leaves its marker
    #[test]
    fn every_visited_stage_is_logged(score in 0u32..=100, query in arb_query()) {
        let outcome = run(score, 90, &query);
        prop_assert_eq!(outcome.record.logs().stage_markers(), outcome.path.clone());
        prop_assert!(outcome.payload.full_log.iter().all(|e| !e.trim().is_empty()));
    }
}
