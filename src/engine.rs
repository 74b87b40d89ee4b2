//! The row-processing workflow engine.
//!
//! Drives one review session through the full lifecycle: session restore or
//! login, queue fetch, per-row enrichment from the monitoring portal and the
//! registry, evaluation-form edits, decision commit, and advancement. One row
//! is active at a time (the head of the queue); the enriched record and the
//! evaluation form always belong to that row or are reset.
//!
//! Every remote failure is caught at the intent boundary and converted to a
//! user-visible error message with `is_loading` cleared, leaving the queue
//! and form untouched so the operator can retry the same intent.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clients::types::{ContextParams, MonitoringRecord, RegistryRecord};
use crate::clients::{ClientError, RemoteServices};
use crate::rules;
use crate::store::{QueueCache, SessionStore};
use crate::workflow::{CachedQueue, Phase, Queue};

/// The operator's verdict on the active row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    /// Status flag sent to the monitoring portal.
    fn flag(self) -> &'static str {
        match self {
            Decision::Accept => "A",
            Decision::Reject => "R",
        }
    }
}

/// Read-only enrichment snapshot for the active row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDetails {
    pub monitoring: MonitoringRecord,
    pub registry: RegistryRecord,
}

/// Observable engine state, rendered by the presentation layer.
#[derive(Debug, Clone)]
pub struct VervalState {
    pub phase: Phase,
    pub display_name: String,
    pub error_message: Option<String>,
    pub is_loading: bool,
    pub queue: Queue,
    pub row_details: Option<RowDetails>,
    pub evaluation_form: BTreeMap<String, String>,
    pub rejection_messages: Vec<String>,
    pub rejection_reason: String,
    pub has_credential: bool,
    /// Identity of the current fetch batch; results tagged with an older
    /// batch are discarded instead of applied.
    pub batch_id: Option<Uuid>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Default for VervalState {
    fn default() -> Self {
        Self {
            phase: Phase::Unauthenticated,
            display_name: String::new(),
            error_message: None,
            is_loading: false,
            queue: Queue::default(),
            row_details: None,
            evaluation_form: rules::default_form(),
            rejection_messages: Vec::new(),
            rejection_reason: String::new(),
            has_credential: false,
            batch_id: None,
            fetched_at: None,
        }
    }
}

pub struct Engine<R: RemoteServices> {
    remote: R,
    session: SessionStore,
    cache: QueueCache,
    state: VervalState,
}

impl<R: RemoteServices> Engine<R> {
    pub fn new(remote: R, session: SessionStore, cache: QueueCache) -> Self {
        Self {
            remote,
            session,
            cache,
            state: VervalState::default(),
        }
    }

    pub fn state(&self) -> &VervalState {
        &self.state
    }

    /// Restore persisted state and re-establish the session.
    ///
    /// A stored cookie is validated first; on failure a silent re-login with
    /// the stored credentials is attempted. With neither available the
    /// partial auth data is cleared and the engine stays unauthenticated.
    pub async fn start(&mut self) {
        if let Some(blob) = self.session.service_account()
            && self.remote.init_spreadsheet(&blob).is_ok()
        {
            self.state.has_credential = true;
        }
        if let Some(snapshot) = self.cache.load() {
            self.state.batch_id = Some(snapshot.batch_id);
            self.state.fetched_at = Some(snapshot.fetched_at);
            self.state.queue = snapshot.queue;
        }

        let Some(cookie) = self.session.cookie() else {
            self.state.phase = Phase::Unauthenticated;
            return;
        };

        self.state.phase = Phase::Authenticating;
        match self.remote.validate(&cookie).await {
            Ok(name) => {
                self.state.display_name = name;
                self.enter_idle();
            }
            Err(_) => self.relogin().await,
        }
    }

    async fn relogin(&mut self) {
        let (Some(username), Some(password)) = (self.session.username(), self.session.password())
        else {
            self.session.clear_auth();
            self.state.phase = Phase::Unauthenticated;
            return;
        };
        self.login(&username, &password).await;
    }

    /// Authenticate against the portal and persist the session.
    ///
    /// On success the displayed name is optimistically the given username;
    /// a follow-up validation replaces it with the portal's display name and
    /// its failure is deliberately ignored.
    pub async fn login(&mut self, username: &str, password: &str) {
        self.state.phase = Phase::Authenticating;
        self.state.error_message = None;

        match self.remote.login(username, password).await {
            Ok(cookie) => {
                self.session.save_auth(&cookie, username, password);
                self.state.display_name = username.to_string();
                self.enter_idle();
                if let Ok(name) = self.remote.validate(&cookie).await {
                    self.state.display_name = name;
                }
            }
            Err(err) => {
                self.state.error_message = Some(err.to_string());
                self.state.phase = Phase::Unauthenticated;
            }
        }
    }

    /// Persist the service-account credential blob and construct the
    /// spreadsheet handle from it.
    pub fn import_credential(&mut self, blob: &str) {
        self.session.save_service_account(blob);
        match self.remote.init_spreadsheet(blob) {
            Ok(()) => {
                self.state.has_credential = true;
                self.state.error_message = None;
            }
            Err(err) => self.fail(err),
        }
    }

    /// Fetch the pending-row queue for the stored verifier.
    ///
    /// A refetch is the drained-queue follow-up: an empty refetch result
    /// means every assigned row is verified, which is a completion notice
    /// rather than an error.
    pub async fn fetch_pending_rows(&mut self, is_refetch: bool) {
        if !self.remote.spreadsheet_ready() {
            match self.session.service_account() {
                Some(blob) => {
                    if let Err(err) = self.remote.init_spreadsheet(&blob) {
                        return self.fail(err);
                    }
                    self.state.has_credential = true;
                }
                None => {
                    return self.fail(ClientError::Auth("Service account belum dipilih.".into()));
                }
            }
        }
        let Some(verifier) = self.session.username() else {
            return self.fail(ClientError::Auth("User session not found.".into()));
        };

        self.state.is_loading = true;
        self.state.phase = Phase::QueueLoading;
        self.state.error_message =
            is_refetch.then(|| "Mengecek data yang dilewati...".to_string());
        self.state.queue.rows.clear();

        match self.remote.fetch_pending_rows(&verifier).await {
            Ok((header, rows)) => {
                if rows.is_empty() && is_refetch {
                    self.state.is_loading = false;
                    self.state.row_details = None;
                    self.state.error_message = Some("Semua data telah diverifikasi.".into());
                    self.state.phase = Phase::AuthenticatedIdle;
                    return;
                }
                self.state.queue = Queue::new(header, rows);
                self.state.batch_id = Some(Uuid::new_v4());
                self.state.fetched_at = Some(Utc::now());
                self.persist_queue();
                self.state.is_loading = false;
                self.state.error_message = None;
                self.state.phase = if self.state.queue.is_empty() {
                    Phase::AuthenticatedIdle
                } else {
                    Phase::QueueReady
                };
            }
            Err(err) => {
                self.cache.clear();
                self.state.phase = Phase::AuthenticatedIdle;
                self.fail(err);
            }
        }
    }

    /// Begin (or resume) reviewing the head of the queue.
    pub async fn start_review(&mut self) {
        self.advance().await;
    }

    /// Record one evaluation choice and recompute the rejection summary from
    /// the whole form. Recomputation is total, so repeating an edit is
    /// idempotent.
    pub fn update_evaluation(&mut self, col: &str, value: &str) {
        self.state
            .evaluation_form
            .insert(col.to_string(), value.to_string());
        let (messages, joined) = rules::rejection_summary(&self.state.evaluation_form);
        self.state.rejection_messages = messages;
        self.state.rejection_reason = joined;
    }

    /// Operator hand-edit of the reject rationale.
    pub fn update_rejection_reason(&mut self, text: &str) {
        self.state.rejection_reason = text.to_string();
    }

    /// Commit the operator's decision to the portal and the worksheet, then
    /// advance to the next row.
    ///
    /// The session cookie is revalidated before anything is written; a stale
    /// cookie aborts early. The head row is dropped only after both external
    /// writes succeed, so any failure leaves the decision resubmittable.
    pub async fn submit_decision(&mut self, decision: Decision) {
        self.state.is_loading = true;
        self.state.error_message = None;
        self.state.phase = Phase::Submitting;

        match self.try_submit(decision).await {
            Ok(()) => {
                self.state.row_details = None;
                self.advance().await;
            }
            Err(err) => {
                self.state.phase = Phase::RowReady;
                self.fail(err);
            }
        }
    }

    async fn try_submit(&mut self, decision: Decision) -> Result<(), ClientError> {
        let head = self
            .state
            .queue
            .head()
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Tidak ada data untuk diupdate.".into()))?;
        let context = self
            .state
            .row_details
            .as_ref()
            .and_then(|d| d.monitoring.details.as_ref())
            .map(|d| d.context.clone())
            .ok_or_else(|| ClientError::NotFound("Tidak ada data DKM untuk diupdate.".into()))?;
        let cookie = self
            .session
            .cookie()
            .ok_or_else(|| ClientError::Auth("Cookie portal monitoring tidak ditemukan.".into()))?;

        // Validate-then-use: a stale session aborts before any write.
        self.remote.validate(&cookie).await.map_err(|_| {
            ClientError::Auth("Cookie portal monitoring kadaluarsa atau tidak valid.".into())
        })?;

        let params = decision_params(&context, decision, &self.state.rejection_reason);
        self.remote.submit_decision(&params, &cookie).await?;

        // Only a hand-edited rationale goes to the sheet's override column.
        let (_, generated) = rules::rejection_summary(&self.state.evaluation_form);
        let custom = self.state.rejection_reason.clone();
        let custom_reason =
            (!custom.is_empty() && custom != generated).then_some(custom.as_str());
        self.remote
            .commit_decision(head.row_index, &self.state.evaluation_form, custom_reason)
            .await?;

        self.state.queue.drop_head();
        self.persist_queue();
        Ok(())
    }

    /// Defer the head row to the tail of the queue (a sole row is dropped
    /// instead) and move on.
    pub async fn skip_current(&mut self) {
        self.state.queue.rotate_head_to_tail();
        self.persist_queue();
        self.state.row_details = None;
        self.advance().await;
    }

    /// End the review session: clear the queue, the cache, and all
    /// in-progress row state.
    pub fn stop_review(&mut self) {
        self.cache.clear();
        self.state.queue = Queue::default();
        self.state.batch_id = None;
        self.state.fetched_at = None;
        self.state.row_details = None;
        self.state.evaluation_form = rules::default_form();
        self.state.rejection_messages.clear();
        self.state.rejection_reason.clear();
        self.state.error_message = None;
        self.state.is_loading = false;
        self.state.phase = Phase::AuthenticatedIdle;
    }

    /// Drop the session regardless of in-flight work. The credential blob
    /// and the cached queue survive; only the auth triple is cleared.
    pub fn logout(&mut self) {
        self.session.clear_auth();
        self.state.display_name.clear();
        self.state.error_message = None;
        self.state.is_loading = false;
        self.state.phase = Phase::LoggedOut;
    }

    /// The row-advance trampoline.
    ///
    /// Runs enrichment for the head row; not-ready rows are marked skipped in
    /// the sheet and dropped without operator involvement, looping to the new
    /// head. A drained queue triggers a refetch. Written as a loop rather
    /// than recursion so a long run of auto-skips cannot grow the stack.
    async fn advance(&mut self) {
        loop {
            if self.state.queue.is_empty() {
                self.fetch_pending_rows(true).await;
                if self.state.queue.is_empty() {
                    return;
                }
            }
            let batch_id = self.state.batch_id;
            let Some(head) = self.state.queue.head().cloned() else {
                return;
            };

            self.state.is_loading = true;
            self.state.phase = Phase::RowEnriching;
            self.state.row_details = None;
            self.state.error_message = None;
            self.state.rejection_messages.clear();
            self.state.rejection_reason.clear();

            let Some(npsn) = head.cell(&self.state.queue.header, "NPSN").map(str::to_string)
            else {
                self.state.phase = Phase::QueueReady;
                return self.fail(ClientError::NotFound("Kolom NPSN tidak ditemukan.".into()));
            };
            let Some(cookie) = self.session.cookie() else {
                self.state.phase = Phase::QueueReady;
                return self.fail(ClientError::Auth(
                    "Session expired. Please login again.".into(),
                ));
            };

            let record = match self.remote.fetch_school_record(&npsn, &cookie).await {
                Ok(record) => record,
                Err(err) => {
                    self.state.phase = Phase::QueueReady;
                    return self.fail(err);
                }
            };
            // A competing fetch may have replaced the batch mid-flight;
            // results for the old batch are discarded, not applied.
            if self.state.batch_id != batch_id {
                return;
            }

            if !record.ready {
                if let Err(err) = self.remote.mark_skipped(head.row_index, true).await {
                    self.state.phase = Phase::QueueReady;
                    return self.fail(err);
                }
                self.state.queue.drop_head();
                self.persist_queue();
                continue;
            }

            let registry = match self.remote.fetch_school_registry(&npsn).await {
                Ok(registry) => registry,
                Err(err) => {
                    self.state.phase = Phase::QueueReady;
                    return self.fail(err);
                }
            };
            if self.state.batch_id != batch_id {
                return;
            }

            let installation_date = record
                .details
                .as_ref()
                .map(|d| d.context.itgle.clone())
                .unwrap_or_default();
            let mut form = rules::default_form();
            form.insert("X".to_string(), installation_date);
            self.state.evaluation_form = form;
            self.state.rejection_messages.clear();
            self.state.rejection_reason.clear();
            self.state.row_details = Some(RowDetails {
                monitoring: record,
                registry,
            });
            self.state.is_loading = false;
            self.state.phase = Phase::RowReady;
            return;
        }
    }

    fn enter_idle(&mut self) {
        self.state.phase = if self.state.queue.is_empty() {
            Phase::AuthenticatedIdle
        } else {
            Phase::QueueReady
        };
    }

    fn persist_queue(&mut self) {
        let snapshot = CachedQueue {
            batch_id: self.state.batch_id.unwrap_or_else(Uuid::new_v4),
            fetched_at: self.state.fetched_at.unwrap_or_else(Utc::now),
            queue: self.state.queue.clone(),
        };
        self.state.batch_id = Some(snapshot.batch_id);
        self.state.fetched_at = Some(snapshot.fetched_at);
        self.cache.save(&snapshot);
    }

    fn fail(&mut self, err: ClientError) {
        self.state.error_message = Some(err.to_string());
        self.state.is_loading = false;
    }
}

/// The decision query, in wire order: the round-tripped context parameters
/// with the status flag and (on reject) the rationale applied.
fn decision_params(
    context: &ContextParams,
    decision: Decision,
    rationale: &str,
) -> Vec<(String, String)> {
    let rationale = match decision {
        Decision::Accept => "",
        Decision::Reject => rationale,
    };
    vec![
        ("q".into(), context.q.clone()),
        ("s".into(), decision.flag().into()),
        ("v".into(), rationale.to_string()),
        ("npsn".into(), context.npsn.clone()),
        ("iprop".into(), context.iprop.clone()),
        ("ikab".into(), context.ikab.clone()),
        ("ikec".into(), context.ikec.clone()),
        ("iins".into(), context.iins.clone()),
        ("ijenjang".into(), context.ijenjang.clone()),
        ("ibp".into(), context.ibp.clone()),
        ("iss".into(), context.iss.clone()),
        ("isf".into(), context.isf.clone()),
        ("istt".into(), context.istt.clone()),
        ("itgl".into(), context.itgl.clone()),
        ("itgla".into(), context.itgla.clone()),
        ("itgle".into(), context.itgle.clone()),
        ("ipet".into(), context.ipet.clone()),
        ("ihnd".into(), context.ihnd.clone()),
    ]
}
