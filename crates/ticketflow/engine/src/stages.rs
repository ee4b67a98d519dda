//! Stage implementations
//!
//! Each stage takes the case record by value, asks the router for the
//! operations it needs, writes the fields it owns, appends its audit
//! entries and hands the record back. Providers only ever see a shared
//! borrow, so stages are the sole writers of state.
//!
//! Every stage opens with its marker entry (`Stage N: NAME - ...`) and
//! may add indented detail lines after it.

use crate::answer::AnswerSource;
use crate::config::WorkflowConfig;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use ticketflow_capability::CapabilityRouter;
use ticketflow_types::{
    CapabilityOutput, CaseRecord, CompletionPayload, Decision, Operation, ProviderId, StageId,
    WorkflowError, WorkflowResult,
};

/// Runs individual stages against a router, answer source and config
pub struct StageRunner<'a> {
    router: &'a CapabilityRouter,
    answers: &'a dyn AnswerSource,
    config: &'a WorkflowConfig,
}

impl<'a> StageRunner<'a> {
    pub fn new(
        router: &'a CapabilityRouter,
        answers: &'a dyn AnswerSource,
        config: &'a WorkflowConfig,
    ) -> Self {
        Self {
            router,
            answers,
            config,
        }
    }

    /// Run one stage
    pub fn run(&self, stage: StageId, record: CaseRecord) -> WorkflowResult<CaseRecord> {
        tracing::debug!(stage = %stage, ticket_id = %record.ticket_id(), "Entering stage");
        let result = match stage {
            StageId::Intake => self.intake(record),
            StageId::Understand => self.understand(record),
            StageId::Prepare => self.prepare(record),
            StageId::Ask => self.ask(record),
            StageId::Wait => self.wait(record),
            StageId::Retrieve => self.retrieve(record),
            StageId::Decide => self.decide(record),
            StageId::Update => self.update(record),
            StageId::Create => self.create(record),
            StageId::Do => self.act(record),
            StageId::Complete => self.complete(record),
        };
        result.map_err(|e| e.in_stage(stage))
    }

    fn dispatch(
        &self,
        provider: ProviderId,
        operation: Operation,
        record: &CaseRecord,
    ) -> WorkflowResult<CapabilityOutput> {
        self.router.dispatch(provider, operation, record)
    }

    fn open(record: &mut CaseRecord, stage: StageId, summary: &str) {
        let entry = format!("{} - {}", stage.marker(), summary);
        tracing::trace!("{}", entry);
        record.log(entry);
    }

    fn detail(record: &mut CaseRecord, detail: impl std::fmt::Display) {
        let entry = format!("  - {}", detail);
        tracing::trace!("{}", entry);
        record.log(entry);
    }

    // ── 1. INTAKE ────────────────────────────────────────────────────

    fn intake(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let summary = format!("Accepted payload for ticket_id: {}.", record.ticket_id());
        Self::open(&mut record, StageId::Intake, &summary);
        Ok(record)
    }

    // ── 2. UNDERSTAND ────────────────────────────────────────────────

    fn understand(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let stage = StageId::Understand;
        Self::open(
            &mut record,
            stage,
            "Parsing request and extracting entities.",
        );

        let parsed = self
            .dispatch(ProviderId::Common, Operation::ParseRequestText, &record)?
            .into_text(Operation::ParseRequestText)?;
        let entities = self
            .dispatch(ProviderId::Atlas, Operation::ExtractEntities, &record)?
            .into_string_mapping(Operation::ExtractEntities)?;

        let rendered = render_strings(&entities);
        record.parsed_text = Some(parsed);
        record.set_entities(stage, entities)?;
        Self::detail(&mut record, format!("Extracted entities: {}", rendered));
        Ok(record)
    }

    // ── 3. PREPARE ───────────────────────────────────────────────────

    fn prepare(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        Self::open(
            &mut record,
            StageId::Prepare,
            "Normalizing fields, enriching records, and calculating flags.",
        );

        let normalized = self
            .dispatch(ProviderId::Common, Operation::NormalizeFields, &record)?
            .into_string_mapping(Operation::NormalizeFields)?;
        let enriched = self
            .dispatch(ProviderId::Atlas, Operation::EnrichRecords, &record)?
            .into_mapping(Operation::EnrichRecords)?;
        let flags = self
            .dispatch(ProviderId::Common, Operation::AddFlagsCalculations, &record)?
            .into_string_mapping(Operation::AddFlagsCalculations)?;

        let details = [
            format!("Normalized Fields: {}", render_strings(&normalized)),
            format!("Enriched Records: {}", render_map(&enriched)),
            format!("Calculated Flags: {}", render_strings(&flags)),
        ];
        record.normalized_fields = Some(normalized);
        record.enriched_records = Some(enriched);
        record.calculated_flags = Some(flags);
        for detail in details {
            Self::detail(&mut record, detail);
        }
        Ok(record)
    }

    // ── 4. ASK ───────────────────────────────────────────────────────

    fn ask(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let stage = StageId::Ask;
        CaseRecord::require(stage, "entities", record.entities())?;
        Self::open(&mut record, stage, "Checking if clarification is needed.");

        let question = self
            .dispatch(ProviderId::Atlas, Operation::ClarifyQuestion, &record)?
            .into_optional_text(Operation::ClarifyQuestion)?;

        match &question {
            Some(q) => Self::detail(&mut record, format!("Question for user: {}", q)),
            None => Self::detail(&mut record, "No clarification needed."),
        }
        record.clarifying_question = question;
        Ok(record)
    }

    // ── 5. WAIT ──────────────────────────────────────────────────────

    fn wait(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let stage = StageId::Wait;
        let question =
            CaseRecord::require(stage, "clarifying_question", record.clarifying_question.as_deref())?
                .to_string();
        Self::open(&mut record, stage, "Capturing and storing user's answer.");

        let answer = self.answers.answer(&question, &record);
        record.user_answer = Some(answer);

        let extracted = self
            .dispatch(ProviderId::Atlas, Operation::ExtractAnswer, &record)?
            .into_text(Operation::ExtractAnswer)?;
        Self::detail(&mut record, format!("Stored Answer: {}", extracted));
        Ok(record)
    }

    // ── 6. RETRIEVE ──────────────────────────────────────────────────

    fn retrieve(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let stage = StageId::Retrieve;
        CaseRecord::require(stage, "entities", record.entities())?;
        Self::open(&mut record, stage, "Searching knowledge base.");

        let retrieved = self
            .dispatch(ProviderId::Atlas, Operation::KnowledgeBaseSearch, &record)?
            .into_text(Operation::KnowledgeBaseSearch)?;
        Self::detail(&mut record, format!("Retrieved data: '{}'", retrieved));
        record.retrieved_data = Some(retrieved);
        Ok(record)
    }

    // ── 7. DECIDE ────────────────────────────────────────────────────

    fn decide(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let stage = StageId::Decide;
        CaseRecord::require(stage, "retrieved_data", record.retrieved_data.as_deref())?;
        Self::open(
            &mut record,
            stage,
            "Evaluating solution and making escalation decision.",
        );

        let operation = Operation::SolutionEvaluation;
        let raw = self
            .dispatch(ProviderId::Common, operation, &record)?
            .into_integer(operation)?;
        let score = u32::try_from(raw).map_err(|_| WorkflowError::UnexpectedOutput {
            operation,
            expected: "non-negative score",
        })?;
        record.solution_score = Some(score);
        Self::detail(&mut record, format!("Solution Score: {}", score));

        let threshold = self.config.escalation_threshold;
        let decision = Decision::for_score(score, threshold);
        record.set_decision(stage, decision)?;

        match decision {
            Decision::Escalate => {
                Self::detail(
                    &mut record,
                    format!(
                        "Decision: Score is < {}. Escalating to human agent.",
                        threshold
                    ),
                );
                let assignment = self
                    .dispatch(ProviderId::Atlas, Operation::EscalationDecision, &record)?
                    .into_text(Operation::EscalationDecision)?;
                tracing::warn!(
                    ticket_id = %record.ticket_id(),
                    score,
                    threshold,
                    "Ticket escalated"
                );
                Self::detail(&mut record, format!("Escalation Result: {}", assignment));
            }
            Decision::Resolve => {
                Self::detail(
                    &mut record,
                    format!(
                        "Decision: Score is >= {}. Proceeding with automated resolution.",
                        threshold
                    ),
                );
            }
        }
        Ok(record)
    }

    // ── 8. UPDATE ────────────────────────────────────────────────────

    fn update(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let stage = StageId::Update;
        require_resolved(stage, &record)?;
        Self::open(
            &mut record,
            stage,
            "Updating and closing ticket in external system.",
        );

        let updated = self
            .dispatch(ProviderId::Atlas, Operation::UpdateTicket, &record)?
            .into_text(Operation::UpdateTicket)?;
        let closed = self
            .dispatch(ProviderId::Atlas, Operation::CloseTicket, &record)?
            .into_text(Operation::CloseTicket)?;
        Self::detail(&mut record, format!("Update Result: {}", updated));
        Self::detail(&mut record, format!("Close Result: {}", closed));
        Ok(record)
    }

    // ── 9. CREATE ────────────────────────────────────────────────────

    fn create(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let stage = StageId::Create;
        require_resolved(stage, &record)?;
        Self::open(&mut record, stage, "Generating final customer response.");

        let response = self
            .dispatch(ProviderId::Common, Operation::ResponseGeneration, &record)?
            .into_text(Operation::ResponseGeneration)?;
        Self::detail(&mut record, format!("Generated Response: '{}'", response));
        record.final_response = Some(response);
        Ok(record)
    }

    // ── 10. DO ───────────────────────────────────────────────────────

    fn act(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let stage = StageId::Do;
        CaseRecord::require(stage, "final_response", record.final_response.as_deref())?;
        Self::open(
            &mut record,
            stage,
            "Executing final API calls and notifications.",
        );

        let api = self
            .dispatch(ProviderId::Atlas, Operation::ExecuteApiCalls, &record)?
            .into_text(Operation::ExecuteApiCalls)?;
        let notified = self
            .dispatch(ProviderId::Atlas, Operation::TriggerNotifications, &record)?
            .into_text(Operation::TriggerNotifications)?;
        Self::detail(&mut record, format!("API Call Result: {}", api));
        Self::detail(&mut record, format!("Notification Result: {}", notified));
        Ok(record)
    }

    // ── 11. COMPLETE ─────────────────────────────────────────────────

    fn complete(&self, mut record: CaseRecord) -> WorkflowResult<CaseRecord> {
        let stage = StageId::Complete;
        require_resolved(stage, &record)?;
        Self::open(
            &mut record,
            stage,
            "Workflow finished. Outputting final payload.",
        );

        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload = CompletionPayload::from_record(&record);
            if let Ok(json) = serde_json::to_string(&payload) {
                tracing::debug!(payload = %json, "Final structured payload");
            }
        }
        Ok(record)
    }
}

fn require_resolved(stage: StageId, record: &CaseRecord) -> WorkflowResult<()> {
    match record.decision() {
        Some(Decision::Resolve) => Ok(()),
        Some(other) => Err(WorkflowError::precondition(
            stage,
            format!("runs only on the RESOLVE path, decision is {}", other),
        )),
        None => Err(WorkflowError::precondition(
            stage,
            "`decision` has not been produced",
        )),
    }
}

fn render_strings(map: &BTreeMap<String, String>) -> String {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
    .to_string()
}

fn render_map(map: &Map<String, Value>) -> String {
    Value::Object(map.clone()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::CannedAnswer;
    use ticketflow_capability::{FixedScore, ScriptedProvider};
    use ticketflow_types::SeedRecord;

    struct Fixture {
        router: CapabilityRouter,
        answers: CannedAnswer,
        config: WorkflowConfig,
    }

    impl Fixture {
        fn new(score: u32) -> Self {
            let config = WorkflowConfig::default();
            Self {
                router: CapabilityRouter::standard(FixedScore::new(score), config.score_range()),
                answers: CannedAnswer::new(config.clarification_answer.clone()),
                config,
            }
        }

        fn runner(&self) -> StageRunner<'_> {
            StageRunner::new(&self.router, &self.answers, &self.config)
        }

        fn run_through(&self, stages: &[StageId], seed: SeedRecord) -> CaseRecord {
            let mut record = CaseRecord::from_seed(seed).unwrap();
            for stage in stages {
                record = self.runner().run(*stage, record).unwrap();
            }
            record
        }
    }

    fn seed_with_query(query: &str) -> SeedRecord {
        let mut seed = SeedRecord::sample();
        seed.query = Some(query.into());
        seed
    }

    #[test]
    fn test_intake_appends_exactly_one_entry() {
        let f = Fixture::new(95);
        let before = CaseRecord::from_seed(SeedRecord::sample()).unwrap();
        let after = f.runner().run(StageId::Intake, before.clone()).unwrap();

        assert_eq!(after.logs().len(), before.logs().len() + 1);
        assert_eq!(
            after.logs().last(),
            Some("Stage 1: INTAKE - Accepted payload for ticket_id: 54321.")
        );

        // Nothing but the log changed
        let mut expected = before;
        expected.log("Stage 1: INTAKE - Accepted payload for ticket_id: 54321.");
        assert_eq!(after, expected);
    }

    #[test]
    fn test_understand_writes_text_and_entities() {
        let f = Fixture::new(95);
        let record = f.run_through(&[StageId::Intake, StageId::Understand], SeedRecord::sample());
        assert_eq!(
            record.parsed_text.as_deref(),
            Some("My subscription for Product B is not working.")
        );
        assert_eq!(record.product(), Some("B"));
        assert_eq!(
            record.logs().last(),
            Some("  - Extracted entities: {\"product\":\"B\"}")
        );
    }

    #[test]
    fn test_understand_without_product_yields_empty_entities() {
        let f = Fixture::new(95);
        let record = f.run_through(
            &[StageId::Intake, StageId::Understand],
            seed_with_query("It doesn't work"),
        );
        assert!(record.entities().unwrap().is_empty());
        assert_eq!(record.product(), None);
    }

    #[test]
    fn test_understand_twice_is_rejected() {
        let f = Fixture::new(95);
        let record = f.run_through(&[StageId::Understand], SeedRecord::sample());
        let err = f.runner().run(StageId::Understand, record).unwrap_err();
        assert_eq!(err.stage(), Some(StageId::Understand));
    }

    #[test]
    fn test_prepare_writes_three_fields() {
        let f = Fixture::new(95);
        let record = f.run_through(&[StageId::Intake, StageId::Prepare], SeedRecord::sample());
        assert_eq!(
            record.normalized_fields.as_ref().unwrap()["normalized_ticket_id"],
            "TCKT-0054321"
        );
        let enriched = record.enriched_records.as_ref().unwrap();
        assert_eq!(enriched["sla"], "Gold");
        assert_eq!(enriched["historical_ticket_count"], 5);
        assert_eq!(record.calculated_flags.as_ref().unwrap()["sla_risk"], "High");
        assert_eq!(record.logs().len(), 5);
    }

    #[test]
    fn test_ask_requires_entities() {
        let f = Fixture::new(95);
        let record = CaseRecord::from_seed(SeedRecord::sample()).unwrap();
        let err = f.runner().run(StageId::Ask, record).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::PreconditionViolated {
                stage: StageId::Ask,
                ..
            }
        ));
    }

    #[test]
    fn test_wait_requires_question() {
        let f = Fixture::new(95);
        let record = f.run_through(
            &[StageId::Intake, StageId::Understand, StageId::Ask],
            SeedRecord::sample(),
        );
        assert!(record.clarifying_question.is_none());
        let err = f.runner().run(StageId::Wait, record).unwrap_err();
        assert_eq!(err.stage(), Some(StageId::Wait));
    }

    #[test]
    fn test_wait_stores_answer() {
        let f = Fixture::new(95);
        let record = f.run_through(
            &[
                StageId::Intake,
                StageId::Understand,
                StageId::Ask,
                StageId::Wait,
            ],
            seed_with_query("It doesn't work"),
        );
        assert_eq!(
            record.user_answer.as_deref(),
            Some("The user replied: It's about Product C.")
        );
        assert_eq!(
            record.logs().last(),
            Some("  - Stored Answer: The user replied: It's about Product C.")
        );
        // The answer does not rewrite extracted entities
        assert_eq!(record.product(), None);
    }

    #[test]
    fn test_decide_requires_retrieval() {
        let f = Fixture::new(95);
        let record = f.run_through(&[StageId::Intake, StageId::Understand], SeedRecord::sample());
        let err = f.runner().run(StageId::Decide, record).unwrap_err();
        assert!(err.to_string().contains("retrieved_data"));
    }

    #[test]
    fn test_decide_escalates_below_threshold() {
        let f = Fixture::new(85);
        let record = f.run_through(
            &[
                StageId::Intake,
                StageId::Understand,
                StageId::Retrieve,
                StageId::Decide,
            ],
            SeedRecord::sample(),
        );
        assert_eq!(record.solution_score, Some(85));
        assert_eq!(record.decision(), Some(Decision::Escalate));
        assert_eq!(
            record.logs().last(),
            Some("  - Escalation Result: Ticket 54321 assigned to Human Agent Tier 2.")
        );
    }

    #[test]
    fn test_decide_boundary_resolves() {
        let f = Fixture::new(90);
        let record = f.run_through(
            &[
                StageId::Intake,
                StageId::Understand,
                StageId::Retrieve,
                StageId::Decide,
            ],
            SeedRecord::sample(),
        );
        assert_eq!(record.decision(), Some(Decision::Resolve));
    }

    #[test]
    fn test_decide_rejects_negative_score() {
        let mut f = Fixture::new(95);
        f.router.register(
            ScriptedProvider::new(ProviderId::Common)
                .with_output(Operation::SolutionEvaluation, CapabilityOutput::Integer(-3)),
        );
        let mut record = CaseRecord::from_seed(SeedRecord::sample()).unwrap();
        record.retrieved_data = Some("kb".into());
        let err = f.runner().run(StageId::Decide, record).unwrap_err();
        match err {
            WorkflowError::StageFailed { stage, source } => {
                assert_eq!(stage, StageId::Decide);
                assert!(matches!(*source, WorkflowError::UnexpectedOutput { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_update_refuses_escalated_record() {
        let f = Fixture::new(95);
        let mut record = CaseRecord::from_seed(SeedRecord::sample()).unwrap();
        record
            .set_decision(StageId::Decide, Decision::Escalate)
            .unwrap();
        let err = f.runner().run(StageId::Update, record).unwrap_err();
        assert!(err.to_string().contains("RESOLVE path"));
    }

    #[test]
    fn test_router_errors_name_the_stage() {
        let config = WorkflowConfig::default();
        let router = CapabilityRouter::new();
        let answers = CannedAnswer::new("x");
        let runner = StageRunner::new(&router, &answers, &config);
        let record = CaseRecord::from_seed(SeedRecord::sample()).unwrap();

        let err = runner.run(StageId::Understand, record).unwrap_err();
        match err {
            WorkflowError::StageFailed { stage, source } => {
                assert_eq!(stage, StageId::Understand);
                assert!(matches!(*source, WorkflowError::UnknownOperation { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
