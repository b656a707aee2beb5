use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use super::completion::{is_complete, CompletionLatch};
use super::continuation::{
    should_auto_continue, should_force_diagnosis, ContinuationTicket, ForcePolicy,
    CONTINUE_ANYWAY_TOKEN, CONTINUE_TOKEN,
};
use super::cues::{available_actions, cue_for, ActionContext, ERROR_PREFIX};
use super::progress::{progress, stage_label};
use super::stage::{classify, StageSignals};
use super::types::{
    CallKind, CallTicket, ConsultationState, DialogueRequest, HistoryEntry, PendingCall,
    RecordTicket, Settlement, TurnOrigin, DIAGNOSIS_PLACEHOLDER, LOADING_PLACEHOLDER,
    SUMMARY_PLACEHOLDER,
};
use super::IntakeError;
use crate::config::IntakeConfig;
use crate::dialogue::{DialogueError, DialogueService, PatientRecordService, Reply};
use crate::models::{latest_assistant, Action, Message, PatientRecord, Phase, SessionId, Stage};
use crate::render::{instructions_for, Intent, RenderFrame, RenderTarget};
use crate::summary::{self, Formatted};

// ═══════════════════════════════════════════
// Consultation state machine
// ═══════════════════════════════════════════

/// What the consultation is waiting on. At most one of these at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    AwaitingResponse(CallTicket),
    AwaitingContinuation(ContinuationTicket),
}

/// One consultation session: transcript, reconciled stage, and the call in flight.
///
/// Purely synchronous. Every outbound call is returned as a `PendingCall`
/// for the caller to execute, and its result is handed back to `settle`.
#[derive(Debug, Clone)]
pub struct Consultation {
    config: IntakeConfig,
    session: SessionId,
    next_seq: u64,
    stage: Stage,
    latch: CompletionLatch,
    exchange_count: u32,
    patient_record: PatientRecord,
    messages: Vec<Message>,
    history: Vec<HistoryEntry>,
    activity: Activity,
    record_fetch: Option<RecordTicket>,
    forced_diagnosis_issued: bool,
    summary_generated: bool,
    pending_user_text: Option<String>,
}

impl Consultation {
    pub fn new(config: IntakeConfig) -> Self {
        let session = SessionId::new();
        tracing::info!(session = %session, "Consultation started");
        Self {
            messages: vec![Message::assistant(config.greeting.clone())],
            config,
            session,
            next_seq: 0,
            stage: Stage::Start,
            latch: CompletionLatch::new(),
            exchange_count: 0,
            patient_record: PatientRecord::default(),
            history: Vec::new(),
            activity: Activity::Idle,
            record_fetch: None,
            forced_diagnosis_issued: false,
            summary_generated: false,
            pending_user_text: None,
        }
    }

    // ── Accessors ──

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_complete(&self) -> bool {
        self.latch.is_set()
    }

    pub fn exchange_count(&self) -> u32 {
        self.exchange_count
    }

    pub fn patient_record(&self) -> &PatientRecord {
        &self.patient_record
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn is_busy(&self) -> bool {
        self.activity != Activity::Idle
    }

    pub fn snapshot(&self) -> ConsultationState {
        ConsultationState {
            stage: self.stage,
            is_complete: self.is_complete(),
            exchange_count: self.exchange_count,
            patient_record: self.patient_record.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_complete() {
            return Phase::Complete;
        }
        if self.stage == Stage::Start {
            return Phase::Start;
        }
        let diagnosing = match self.activity {
            Activity::AwaitingContinuation(_) => true,
            Activity::AwaitingResponse(ticket) => {
                matches!(ticket.kind, CallKind::Diagnosis { .. })
            }
            Activity::Idle => false,
        };
        if diagnosing || self.stage >= Stage::Diagnosis {
            Phase::AwaitingDiagnosis
        } else {
            Phase::Collecting
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        available_actions(&ActionContext {
            busy: self.is_busy(),
            continuation_pending: matches!(self.activity, Activity::AwaitingContinuation(_)),
            is_complete: self.is_complete(),
            stage: self.stage,
            summary_generated: self.summary_generated,
            latest_cue: latest_assistant(&self.messages).map(cue_for),
        })
    }

    pub fn frame(&self) -> RenderFrame {
        let is_complete = self.is_complete();
        RenderFrame {
            instructions: instructions_for(&self.messages),
            state: self.snapshot(),
            phase: self.phase(),
            stage_label: stage_label(self.stage, is_complete),
            progress: progress(self.stage, &self.patient_record, is_complete),
            actions: self.actions(),
            history: self.history.clone(),
            busy: self.is_busy(),
        }
    }

    // ── Intents ──

    /// Apply a user intent. Reset yields no call.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Option<PendingCall>, IntakeError> {
        match intent {
            Intent::Submit(text) => self.submit(&text).map(Some),
            Intent::RequestDiagnosis => self.request_diagnosis().map(Some),
            Intent::RequestSummary => self.request_summary().map(Some),
            Intent::ContinueAnyway => self.continue_anyway().map(Some),
            Intent::ContinueNow => self.continue_now().map(Some),
            Intent::Reset => {
                self.reset();
                Ok(None)
            }
        }
    }

    pub fn submit(&mut self, text: &str) -> Result<PendingCall, IntakeError> {
        self.ensure_idle()?;
        if self.is_complete() {
            return Err(IntakeError::ConsultationComplete);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(IntakeError::EmptyInput);
        }

        self.messages.push(Message::user(text));
        self.pending_user_text = Some(text.to_string());
        Ok(self.issue(
            CallKind::Turn {
                origin: TurnOrigin::User,
            },
            DialogueRequest::Turn { input: text.into() },
        ))
    }

    /// Skip answer validation for the current question.
    pub fn continue_anyway(&mut self) -> Result<PendingCall, IntakeError> {
        self.ensure_available(Action::ContinueAnyway)?;
        Ok(self.issue(
            CallKind::Turn {
                origin: TurnOrigin::ContinueAnyway,
            },
            DialogueRequest::Turn {
                input: CONTINUE_ANYWAY_TOKEN.into(),
            },
        ))
    }

    /// Fire the pending continuation now instead of waiting out the delay.
    pub fn continue_now(&mut self) -> Result<PendingCall, IntakeError> {
        match self.activity {
            Activity::AwaitingContinuation(ticket) => {
                tracing::debug!(session = %self.session, seq = ticket.seq, "Continuation fired early");
                self.activity = Activity::Idle;
                Ok(self.issue_continuation())
            }
            Activity::AwaitingResponse(_) => Err(IntakeError::Busy),
            Activity::Idle => Err(IntakeError::NotAvailable(Action::ContinueNow)),
        }
    }

    pub fn request_diagnosis(&mut self) -> Result<PendingCall, IntakeError> {
        self.ensure_available(Action::RequestDiagnosis)?;
        Ok(self.issue(
            CallKind::Diagnosis { forced: false },
            DialogueRequest::ForceDiagnosis,
        ))
    }

    pub fn request_summary(&mut self) -> Result<PendingCall, IntakeError> {
        self.ensure_available(Action::RequestSummary)?;
        Ok(self.issue(CallKind::Summary, DialogueRequest::Summary))
    }

    /// Start a fresh session. Results of calls issued before this are stale.
    pub fn reset(&mut self) {
        let previous = self.session;
        *self = Self::new(self.config.clone());
        tracing::info!(previous = %previous, session = %self.session, "Consultation reset");
    }

    // ── Results ──

    /// Apply the result of the outstanding call.
    pub fn settle(
        &mut self,
        ticket: CallTicket,
        result: Result<Reply, DialogueError>,
    ) -> Settlement {
        if self.activity != Activity::AwaitingResponse(ticket) {
            tracing::warn!(
                session = %ticket.session,
                seq = ticket.seq,
                "Discarding stale dialogue result"
            );
            return Settlement::stale();
        }

        self.activity = Activity::Idle;
        self.messages.retain(|m| !m.is_transient);

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(session = %self.session, kind = ?ticket.kind, error = %e, "Dialogue call failed");
                self.pending_user_text = None;
                self.messages.push(Message::assistant(error_message(&e)));
                return Settlement::default();
            }
        };

        match ticket.kind {
            CallKind::Summary => {
                self.apply_summary(&reply.text);
                Settlement::default()
            }
            CallKind::Turn { .. } | CallKind::Diagnosis { .. } => self.apply_reply(ticket.kind, reply),
        }
    }

    /// Fire a scheduled continuation. Stale tickets yield nothing.
    pub fn fire_continuation(&mut self, ticket: ContinuationTicket) -> Option<PendingCall> {
        if self.activity != Activity::AwaitingContinuation(ticket) {
            tracing::debug!(seq = ticket.seq, "Ignoring stale continuation");
            return None;
        }
        self.activity = Activity::Idle;
        Some(self.issue_continuation())
    }

    /// Apply a patient-record fetch. Failures keep the current record.
    ///
    /// Returns whether the result belonged to the outstanding fetch.
    pub fn apply_record(
        &mut self,
        ticket: RecordTicket,
        result: Result<PatientRecord, DialogueError>,
    ) -> bool {
        if self.record_fetch != Some(ticket) {
            tracing::warn!(session = %ticket.session, "Discarding stale patient record");
            return false;
        }
        self.record_fetch = None;

        match result {
            Ok(record) => {
                tracing::info!(session = %self.session, "Patient record refreshed");
                self.patient_record = record;
            }
            Err(e) => {
                tracing::warn!(session = %self.session, error = %e, "Patient record fetch failed");
            }
        }
        true
    }

    /// Schedule a deferred continuation unless something is already pending.
    pub(crate) fn schedule_continuation(&mut self) -> Option<ContinuationTicket> {
        if self.is_busy() {
            return None;
        }
        let ticket = ContinuationTicket {
            session: self.session,
            seq: self.next_seq(),
        };
        self.activity = Activity::AwaitingContinuation(ticket);
        tracing::debug!(session = %self.session, seq = ticket.seq, "Continuation scheduled");
        Some(ticket)
    }

    // ── Internals ──

    fn apply_reply(&mut self, kind: CallKind, reply: Reply) -> Settlement {
        self.messages.push(Message::assistant(reply.text.clone()));

        if let CallKind::Turn {
            origin: TurnOrigin::User,
        } = kind
        {
            self.exchange_count += 1;
            if let Some(user_text) = self.pending_user_text.take() {
                self.history.insert(0, HistoryEntry::new(&user_text, &reply.text));
            }
        }

        self.stage = classify(&StageSignals {
            reported: reply.stage.as_deref(),
            messages: &self.messages,
            exchange_count: self.exchange_count,
            previous: self.stage,
        });

        let mut settlement = Settlement::default();
        if self.latch.observe(is_complete(self.stage, &self.messages)) {
            tracing::info!(session = %self.session, stage = %self.stage, "Consultation complete");
            settlement.record_fetch = Some(self.start_record_fetch());
        }

        // The exchange ceiling outranks a continuation.
        if let CallKind::Turn { .. } = kind {
            settlement.follow_up = self.force_diagnosis_if_due();
        }
        if settlement.follow_up.is_none() {
            let triggers = latest_assistant(&self.messages).is_some_and(should_auto_continue);
            if triggers && !self.is_complete() {
                settlement.continuation = self.schedule_continuation();
            }
        }
        settlement
    }

    fn apply_summary(&mut self, raw: &str) {
        let message = match summary::format(raw) {
            Formatted::Document(doc) => {
                let markup = summary::to_markup(&doc);
                Message::summary(doc, markup)
            }
            Formatted::Passthrough(text) => Message::assistant(text),
        };
        self.messages.push(message);
        self.summary_generated = true;
        tracing::info!(session = %self.session, "Case summary generated");
    }

    fn force_diagnosis_if_due(&mut self) -> Option<PendingCall> {
        let due = should_force_diagnosis(&ForcePolicy {
            exchange_count: self.exchange_count,
            exchange_limit: self.config.exchange_limit,
            is_complete: self.is_complete(),
            stage: self.stage,
            already_forced: self.forced_diagnosis_issued,
        });
        if !due {
            return None;
        }

        tracing::info!(
            session = %self.session,
            exchanges = self.exchange_count,
            "Exchange limit reached, forcing diagnosis"
        );
        self.forced_diagnosis_issued = true;
        Some(self.issue(
            CallKind::Diagnosis { forced: true },
            DialogueRequest::ForceDiagnosis,
        ))
    }

    fn start_record_fetch(&mut self) -> RecordTicket {
        let ticket = RecordTicket {
            session: self.session,
            seq: self.next_seq(),
        };
        self.record_fetch = Some(ticket);
        ticket
    }

    fn issue_continuation(&mut self) -> PendingCall {
        self.issue(
            CallKind::Turn {
                origin: TurnOrigin::Continuation,
            },
            DialogueRequest::Turn {
                input: CONTINUE_TOKEN.into(),
            },
        )
    }

    fn issue(&mut self, kind: CallKind, request: DialogueRequest) -> PendingCall {
        let placeholder = match kind {
            CallKind::Turn { .. } => LOADING_PLACEHOLDER,
            CallKind::Diagnosis { .. } => DIAGNOSIS_PLACEHOLDER,
            CallKind::Summary => SUMMARY_PLACEHOLDER,
        };
        self.messages.push(Message::transient(placeholder));

        let ticket = CallTicket {
            session: self.session,
            seq: self.next_seq(),
            kind,
        };
        self.activity = Activity::AwaitingResponse(ticket);
        PendingCall { ticket, request }
    }

    fn ensure_idle(&self) -> Result<(), IntakeError> {
        if self.is_busy() {
            return Err(IntakeError::Busy);
        }
        Ok(())
    }

    fn ensure_available(&self, action: Action) -> Result<(), IntakeError> {
        self.ensure_idle()?;
        if !self.actions().contains(&action) {
            return Err(IntakeError::NotAvailable(action));
        }
        Ok(())
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Assistant message shown in place of a failed reply.
pub fn error_message(error: &DialogueError) -> String {
    format!("{ERROR_PREFIX} {error}. Please try again.")
}

// ═══════════════════════════════════════════
// Async driver
// ═══════════════════════════════════════════

type CallFuture<'a> = Pin<Box<dyn Future<Output = (CallTicket, Result<Reply, DialogueError>)> + 'a>>;
type RecordFuture<'a> =
    Pin<Box<dyn Future<Output = (RecordTicket, Result<PatientRecord, DialogueError>)> + 'a>>;

enum Event {
    Intent(Option<Intent>),
    Call(CallTicket, Result<Reply, DialogueError>),
    Record(RecordTicket, Result<PatientRecord, DialogueError>),
    ContinuationDue,
}

/// Runs a `Consultation` against a dialogue backend and a render target.
///
/// Single task: one in-flight call, one record fetch and one continuation
/// timer at most. A frame is rendered after every event.
pub struct ConsultationDriver<D, R> {
    consultation: Consultation,
    dialogue: D,
    target: R,
}

impl<D, R> ConsultationDriver<D, R>
where
    D: DialogueService + PatientRecordService,
    R: RenderTarget,
{
    pub fn new(config: IntakeConfig, dialogue: D, target: R) -> Self {
        Self {
            consultation: Consultation::new(config),
            dialogue,
            target,
        }
    }

    pub fn consultation(&self) -> &Consultation {
        &self.consultation
    }

    pub fn into_parts(self) -> (Consultation, D, R) {
        (self.consultation, self.dialogue, self.target)
    }

    /// Process intents until the channel closes and outstanding work drains.
    pub async fn run(&mut self, mut intents: mpsc::Receiver<Intent>) {
        let Self {
            consultation,
            dialogue,
            target,
        } = self;
        let dialogue: &D = dialogue;
        let delay = consultation.config().continuation_delay;

        let mut call: Option<CallFuture<'_>> = None;
        let mut fetch: Option<RecordFuture<'_>> = None;
        let mut timer: Option<(ContinuationTicket, Instant)> = None;
        let mut intents_open = true;

        target.render(&consultation.frame());

        loop {
            if !intents_open && call.is_none() && fetch.is_none() && timer.is_none() {
                break;
            }

            let deadline = timer.map(|(_, at)| at).unwrap_or_else(Instant::now);
            let event = tokio::select! {
                intent = intents.recv(), if intents_open => Event::Intent(intent),
                (ticket, result) = next_in(&mut call) => Event::Call(ticket, result),
                (ticket, result) = next_in(&mut fetch) => Event::Record(ticket, result),
                _ = sleep_until(deadline), if timer.is_some() => Event::ContinuationDue,
            };

            match event {
                Event::Intent(None) => {
                    intents_open = false;
                    continue;
                }
                Event::Intent(Some(intent)) => {
                    let is_reset = intent == Intent::Reset;
                    match consultation.dispatch(intent.clone()) {
                        Ok(pending) => {
                            if is_reset {
                                call = None;
                                fetch = None;
                            }
                            if is_reset || intent == Intent::ContinueNow {
                                timer = None;
                            }
                            if let Some(pending) = pending {
                                call = Some(start_call(dialogue, pending));
                            }
                        }
                        Err(e) => {
                            tracing::warn!(intent = %intent.action(), error = %e, "Intent rejected");
                        }
                    }
                }
                Event::Call(ticket, result) => {
                    call = None;
                    let settlement = consultation.settle(ticket, result);
                    if let Some(ticket) = settlement.continuation {
                        timer = Some((ticket, Instant::now() + delay));
                    }
                    if let Some(pending) = settlement.follow_up {
                        call = Some(start_call(dialogue, pending));
                    }
                    if let Some(ticket) = settlement.record_fetch {
                        fetch = Some(start_fetch(dialogue, ticket));
                    }
                }
                Event::Record(ticket, result) => {
                    fetch = None;
                    consultation.apply_record(ticket, result);
                }
                Event::ContinuationDue => {
                    if let Some((ticket, _)) = timer.take() {
                        if let Some(pending) = consultation.fire_continuation(ticket) {
                            call = Some(start_call(dialogue, pending));
                        }
                    }
                }
            }

            target.render(&consultation.frame());
        }
    }
}

/// Await the future in `slot`, or never resolve when the slot is empty.
async fn next_in<'a, T>(slot: &mut Option<Pin<Box<dyn Future<Output = T> + 'a>>>) -> T {
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

fn start_call<'a, D: DialogueService>(dialogue: &'a D, pending: PendingCall) -> CallFuture<'a> {
    let PendingCall { ticket, request } = pending;
    Box::pin(async move {
        let result = match request {
            DialogueRequest::Turn { input } => dialogue.send_turn(&ticket.session, &input).await,
            DialogueRequest::ForceDiagnosis => dialogue.force_diagnosis(&ticket.session).await,
            DialogueRequest::Summary => dialogue
                .generate_summary(&ticket.session)
                .await
                .map(Reply::new),
        };
        (ticket, result)
    })
}

fn start_fetch<'a, D: PatientRecordService>(dialogue: &'a D, ticket: RecordTicket) -> RecordFuture<'a> {
    Box::pin(async move { (ticket, dialogue.fetch_record(&ticket.session).await) })
}
