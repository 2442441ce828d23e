use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};
use uuid::Uuid;

use inkread_core::{
    Conversion, ConversionId, ConversionPatch, ConversionStore, ImageData, ListQuery,
    NewConversion, OcrClient, StoreError,
};
use inkread_logging::ConversionEvent;

use crate::event::SessionEvent;
use crate::history::History;
use crate::phase::{Phase, RequestToken};
use crate::report::{Notice, Reporter, Severity};

const EVENT_CAPACITY: usize = 64;

/// How a `submit_image` or `retry_save` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Extracted and stored; the conversion is current.
    Saved(ConversionId),
    /// Extracted, but the store create failed.
    Unsaved,
    /// OCR failed.
    Failed,
    /// A newer submission or a selection took over. Carries the id if this
    /// call's record was still created.
    Superseded(Option<ConversionId>),
    /// Nothing to retry.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    NoSelection,
    Busy,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Failed,
}

/// Point-in-time copy of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub is_saving: bool,
    pub notice: Option<Notice>,
    pub history: Vec<Conversion>,
    pub history_loading: bool,
}

impl SessionSnapshot {
    pub fn current_text(&self) -> &str {
        self.phase.current_text()
    }

    pub fn current_id(&self) -> Option<&ConversionId> {
        self.phase.conversion_id()
    }

    pub fn is_processing(&self) -> bool {
        self.phase.is_processing()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.message.as_str())
    }
}

struct Session {
    phase: Phase,
    last_request: u64,
    is_saving: bool,
    notice: Option<Notice>,
    history: History,
    history_loading: bool,
    loads_in_flight: usize,
    /// Ids deleted while a listing was in flight; those rows are stale.
    deleted_during_load: HashSet<ConversionId>,
}

impl Session {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            last_request: 0,
            is_saving: false,
            notice: None,
            history: History::new(),
            // Nothing has been listed yet, so renderers show the loading state
            // until the first `load_history` settles.
            history_loading: true,
            loads_in_flight: 0,
            deleted_during_load: HashSet::new(),
        }
    }

    fn next_request(&mut self) -> RequestToken {
        self.last_request += 1;
        RequestToken(self.last_request)
    }
}

/// Drives one user session: upload, OCR, store, review, save, history.
pub struct ConversionController {
    ocr: Arc<dyn OcrClient>,
    store: Arc<dyn ConversionStore>,
    session: Mutex<Session>,
    reporter: Reporter,
}

impl ConversionController {
    pub fn new(ocr: Arc<dyn OcrClient>, store: Arc<dyn ConversionStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let session_id = Uuid::new_v4().to_string();
        info!(session_id = %session_id, ocr = ocr.name(), "Conversion session started");
        Self {
            ocr,
            store,
            session: Mutex::new(Session::new()),
            reporter: Reporter::new(session_id, events),
        }
    }

    pub fn session_id(&self) -> &str {
        self.reporter.session_id()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.reporter.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        SessionSnapshot {
            phase: session.phase.clone(),
            is_saving: session.is_saving,
            notice: session.notice.clone(),
            history: session.history.as_slice().to_vec(),
            history_loading: session.history_loading,
        }
    }

    pub async fn phase(&self) -> Phase {
        self.session.lock().await.phase.clone()
    }

    pub async fn history(&self) -> Vec<Conversion> {
        self.session.lock().await.history.as_slice().to_vec()
    }

    pub async fn find(&self, id: &ConversionId) -> Option<Conversion> {
        self.session.lock().await.history.get(id).cloned()
    }

    pub async fn dismiss_notice(&self) {
        let mut session = self.session.lock().await;
        if session.notice.take().is_some() {
            self.reporter.emit(SessionEvent::NoticeCleared);
        }
    }

    /// Fill history from the store. Failures are logged only and leave the
    /// list as it was.
    pub async fn load_history(&self) -> Result<usize, StoreError> {
        {
            let mut session = self.session.lock().await;
            session.loads_in_flight += 1;
            session.history_loading = true;
        }
        self.reporter.emit(SessionEvent::HistoryLoading { loading: true });

        let result = self.store.list(ListQuery::default()).await;

        let mut session = self.session.lock().await;
        session.loads_in_flight -= 1;
        let deleted = if session.loads_in_flight == 0 {
            session.history_loading = false;
            self.reporter.emit(SessionEvent::HistoryLoading { loading: false });
            std::mem::take(&mut session.deleted_during_load)
        } else {
            session.deleted_during_load.clone()
        };
        match result {
            Ok(rows) => {
                let pinned = session.phase.conversion_id().cloned();
                session.history.merge_loaded(rows, pinned.as_ref(), &deleted);
                let len = session.history.len();
                debug!(len, "History loaded");
                self.reporter.emit(SessionEvent::HistoryChanged { len });
                Ok(len)
            }
            Err(e) => {
                self.reporter.report(
                    &mut session.notice,
                    Severity::Background,
                    "load_history",
                    "Failed to load history".into(),
                    &e,
                );
                Err(e)
            }
        }
    }

    /// Run OCR on `image` and store the result. Overwrites the current
    /// session; an older call still in flight loses its right to touch it.
    pub async fn submit_image(&self, image: ImageData) -> SubmitOutcome {
        let request = {
            let mut session = self.session.lock().await;
            let request = session.next_request();
            session.phase = Phase::Processing {
                request,
                image: image.clone(),
                text: None,
            };
            self.clear_notice(&mut session.notice);
            request
        };
        self.reporter.emit(SessionEvent::PhaseChanged { phase: "processing" });
        self.reporter.log(ConversionEvent::Submitted {
            request: request.value(),
            image_bytes: image.len(),
        });

        let extracted = self.ocr.extract_text(&image).await;

        let text = {
            let mut session = self.session.lock().await;
            if !session.phase.is_request(request) {
                drop(session);
                return self.superseded(request, None);
            }
            match extracted {
                Ok(text) => {
                    session.phase = Phase::Processing {
                        request,
                        image: image.clone(),
                        text: Some(text.clone()),
                    };
                    text
                }
                Err(e) => {
                    session.phase = Phase::Failed { image };
                    self.reporter.emit(SessionEvent::PhaseChanged { phase: "failed" });
                    self.reporter.report(
                        &mut session.notice,
                        Severity::Error,
                        "submit_image",
                        e.to_string(),
                        &e,
                    );
                    return SubmitOutcome::Failed;
                }
            }
        };
        self.reporter.log(ConversionEvent::Extracted {
            request: request.value(),
            chars: text.chars().count(),
        });

        self.store_extracted(request, image, text).await
    }

    /// Re-issue the create for an `Unsaved` conversion.
    pub async fn retry_save(&self) -> SubmitOutcome {
        let (request, image, text) = {
            let mut session = self.session.lock().await;
            let Phase::Unsaved { image, text } = session.phase.clone() else {
                return SubmitOutcome::Ignored;
            };
            let request = session.next_request();
            session.phase = Phase::Processing {
                request,
                image: image.clone(),
                text: Some(text.clone()),
            };
            self.clear_notice(&mut session.notice);
            (request, image, text)
        };
        self.reporter.emit(SessionEvent::PhaseChanged { phase: "processing" });
        info!(request = %request, "Retrying conversion save");

        self.store_extracted(request, image, text).await
    }

    async fn store_extracted(
        &self,
        request: RequestToken,
        image: ImageData,
        text: String,
    ) -> SubmitOutcome {
        let created = self
            .store
            .create(NewConversion {
                image_url: image.clone(),
                extracted_text: text.clone(),
            })
            .await;

        let mut session = self.session.lock().await;
        let current = session.phase.is_request(request);
        match created {
            Ok(record) => {
                let id = record.id.clone();
                self.reporter.log(ConversionEvent::Stored {
                    request: request.value(),
                    conversion_id: id.to_string(),
                });

                // The record exists either way, so history gets it. A stale
                // request must not push out whatever is current now.
                let pinned = session.phase.conversion_id().cloned();
                session.history.prepend(record, pinned.as_ref());
                let len = session.history.len();
                self.reporter.emit(SessionEvent::HistoryChanged { len });

                if !current {
                    drop(session);
                    return self.superseded(request, Some(id));
                }
                session.phase = Phase::Extracted {
                    id: id.clone(),
                    image,
                    text,
                };
                self.reporter.emit(SessionEvent::PhaseChanged { phase: "extracted" });
                SubmitOutcome::Saved(id)
            }
            Err(e) => {
                self.reporter.log(ConversionEvent::StoreFailed {
                    request: request.value(),
                    error_msg: e.to_string(),
                });
                if !current {
                    drop(session);
                    return self.superseded(request, None);
                }
                session.phase = Phase::Unsaved { image, text };
                self.reporter.emit(SessionEvent::PhaseChanged { phase: "unsaved" });
                self.reporter.report(
                    &mut session.notice,
                    Severity::Error,
                    "create",
                    format!("Text extracted but not saved: {e}"),
                    &e,
                );
                SubmitOutcome::Unsaved
            }
        }
    }

    /// Persist `text` as the edited text of the current conversion.
    pub async fn save_edits(&self, text: impl Into<String>) -> SaveOutcome {
        let text = text.into();
        let id = {
            let mut session = self.session.lock().await;
            if session.is_saving {
                return SaveOutcome::Busy;
            }
            let Some(id) = session.phase.conversion_id().cloned() else {
                return SaveOutcome::NoSelection;
            };
            session.is_saving = true;
            id
        };
        self.reporter.emit(SessionEvent::SavingChanged { saving: true });

        let patch = ConversionPatch::edited_now(text.clone());
        let updated_at = patch.updated_at;
        let result = self.store.update(&id, patch).await;

        let mut session = self.session.lock().await;
        session.is_saving = false;
        self.reporter.emit(SessionEvent::SavingChanged { saving: false });
        match result {
            Ok(()) => {
                if !session.history.apply_edit(&id, &text, updated_at) {
                    debug!(conversion_id = %id, "Saved conversion is no longer in history");
                }
                let len = session.history.len();
                self.reporter.emit(SessionEvent::HistoryChanged { len });
                if let Phase::Extracted { id: current, text: shown, .. } = &mut session.phase {
                    if *current == id {
                        shown.clone_from(&text);
                    }
                }
                self.reporter.log(ConversionEvent::Saved {
                    conversion_id: id.to_string(),
                    chars: text.chars().count(),
                });
                SaveOutcome::Saved
            }
            Err(e) => {
                self.reporter.report(
                    &mut session.notice,
                    Severity::Error,
                    "save_edits",
                    "Failed to save changes".into(),
                    &e,
                );
                SaveOutcome::Failed
            }
        }
    }

    /// Make a history entry current. Returns false if `id` is not in history.
    pub async fn select_conversion(&self, id: &ConversionId) -> bool {
        let mut session = self.session.lock().await;
        let Some(record) = session.history.get(id).cloned() else {
            debug!(conversion_id = %id, "Selection of unknown conversion ignored");
            return false;
        };
        if let Phase::Processing { request, .. } = &session.phase {
            debug!(request = %request, "Selection supersedes in-flight submission");
        }
        let text = record.display_text().to_string();
        session.phase = Phase::Extracted {
            id: record.id,
            image: record.image_source,
            text,
        };
        self.clear_notice(&mut session.notice);
        self.reporter.emit(SessionEvent::PhaseChanged { phase: "extracted" });
        self.reporter.log(ConversionEvent::Selected {
            conversion_id: id.to_string(),
        });
        true
    }

    /// Delete from the store first, then from history.
    pub async fn delete_conversion(&self, id: &ConversionId) -> DeleteOutcome {
        let result = self.store.delete(id).await;

        let mut session = self.session.lock().await;
        match result {
            Ok(()) => {
                session.history.remove(id);
                if session.loads_in_flight > 0 {
                    session.deleted_during_load.insert(id.clone());
                }
                let len = session.history.len();
                self.reporter.emit(SessionEvent::HistoryChanged { len });
                if session.phase.conversion_id() == Some(id) {
                    session.phase = Phase::Idle;
                    self.reporter.emit(SessionEvent::PhaseChanged { phase: "idle" });
                }
                self.reporter.log(ConversionEvent::Deleted {
                    conversion_id: id.to_string(),
                });
                DeleteOutcome::Deleted
            }
            Err(e) => {
                self.reporter.report(
                    &mut session.notice,
                    Severity::Warning,
                    "delete_conversion",
                    "Failed to delete conversion".into(),
                    &e,
                );
                DeleteOutcome::Failed
            }
        }
    }

    fn clear_notice(&self, notice: &mut Option<Notice>) {
        if notice.take().is_some() {
            self.reporter.emit(SessionEvent::NoticeCleared);
        }
    }

    fn superseded(&self, request: RequestToken, id: Option<ConversionId>) -> SubmitOutcome {
        debug!(request = %request, "Stale completion ignored");
        self.reporter.log(ConversionEvent::Superseded {
            request: request.value(),
        });
        SubmitOutcome::Superseded(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;
    use inkread_core::OcrServiceError;
    use inkread_ocr::MockOcrClient;
    use inkread_store::{InMemoryConversionStore, StoreOp};

    fn image(tag: &str) -> ImageData {
        ImageData::from_base64("image/png", tag)
    }

    fn controller(
        ocr: MockOcrClient,
    ) -> (ConversionController, Arc<MockOcrClient>, Arc<InMemoryConversionStore>) {
        let store = Arc::new(InMemoryConversionStore::new());
        controller_with_store(ocr, store)
    }

    fn controller_with_store(
        ocr: MockOcrClient,
        store: Arc<InMemoryConversionStore>,
    ) -> (ConversionController, Arc<MockOcrClient>, Arc<InMemoryConversionStore>) {
        let ocr = Arc::new(ocr);
        let controller = ConversionController::new(ocr.clone(), store.clone());
        (controller, ocr, store)
    }

    #[tokio::test]
    async fn submit_stores_and_prepends() {
        let (controller, _, store) = controller(MockOcrClient::new().then_text("Hello World"));

        let outcome = controller.submit_image(image("AAAA")).await;
        assert_eq!(outcome, SubmitOutcome::Saved("c1".into()));

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.current_id().map(|id| id.as_str()), Some("c1"));
        assert_eq!(snapshot.current_text(), "Hello World");
        assert!(!snapshot.is_processing());
        assert_eq!(snapshot.history[0].id.as_str(), "c1");
        assert_eq!(snapshot.history[0].extracted_text, "Hello World");
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn ocr_failure_leaves_no_record() {
        let (controller, _, store) = controller(
            MockOcrClient::new().then_error(OcrServiceError::Transport("connection refused".into())),
        );

        assert_eq!(controller.submit_image(image("AAAA")).await, SubmitOutcome::Failed);

        let snapshot = controller.snapshot().await;
        assert!(matches!(snapshot.phase, Phase::Failed { .. }));
        assert!(snapshot.current_id().is_none());
        assert!(!snapshot.error_message().unwrap_or_default().is_empty());
        assert!(snapshot.history.is_empty());
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn create_failure_is_unsaved_and_retryable() {
        let store = Arc::new(InMemoryConversionStore::new());
        store.fail_next(StoreOp::Create, 1);
        let (controller, ocr, _) =
            controller_with_store(MockOcrClient::new().then_text("Draft"), store.clone());

        assert_eq!(controller.submit_image(image("AAAA")).await, SubmitOutcome::Unsaved);
        let snapshot = controller.snapshot().await;
        assert!(matches!(snapshot.phase, Phase::Unsaved { .. }));
        assert_eq!(snapshot.current_text(), "Draft");
        assert!(snapshot.current_id().is_none());
        assert!(snapshot.history.is_empty());
        assert!(snapshot.error_message().unwrap().starts_with("Text extracted but not saved"));

        assert_eq!(controller.retry_save().await, SubmitOutcome::Saved("c1".into()));
        let snapshot = controller.snapshot().await;
        assert!(snapshot.notice.is_none());
        assert_eq!(snapshot.history.len(), 1);
        // OCR is not repeated.
        assert_eq!(ocr.calls(), 1);
    }

    #[tokio::test]
    async fn retry_outside_unsaved_is_ignored() {
        let (controller, _, _) = controller(MockOcrClient::new());
        assert_eq!(controller.retry_save().await, SubmitOutcome::Ignored);
    }

    #[tokio::test]
    async fn save_updates_store_and_history() {
        let (controller, _, store) = controller(MockOcrClient::new().then_text("Hello World"));
        controller.submit_image(image("AAAA")).await;

        assert_eq!(controller.save_edits("Hello Universe").await, SaveOutcome::Saved);

        let updates = store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0.as_str(), "c1");
        assert_eq!(updates[0].1.edited_text, "Hello Universe");

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.history[0].display_text(), "Hello Universe");
        assert_eq!(snapshot.history[0].extracted_text, "Hello World");
        assert_eq!(snapshot.current_text(), "Hello Universe");
        assert!(!snapshot.is_saving);
    }

    #[tokio::test]
    async fn repeated_save_refreshes_timestamp() {
        let (controller, _, store) = controller(MockOcrClient::new());
        controller.submit_image(image("AAAA")).await;

        controller.save_edits("same").await;
        controller.save_edits("same").await;

        let updates = store.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].1.edited_text, updates[1].1.edited_text);
        assert!(updates[1].1.updated_at >= updates[0].1.updated_at);
    }

    #[tokio::test]
    async fn save_without_selection_is_noop() {
        let (controller, _, store) = controller(MockOcrClient::new());
        assert_eq!(controller.save_edits("text").await, SaveOutcome::NoSelection);
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn save_failure_sets_message() {
        let (controller, _, store) = controller(MockOcrClient::new());
        controller.submit_image(image("AAAA")).await;
        store.fail_next(StoreOp::Update, 1);

        assert_eq!(controller.save_edits("edit").await, SaveOutcome::Failed);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.error_message(), Some("Failed to save changes"));
        assert!(!snapshot.is_saving);
        assert!(!snapshot.history[0].is_edited());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_save_is_busy() {
        let store = Arc::new(InMemoryConversionStore::new().with_latency(Duration::from_millis(100)));
        let (controller, _, _) = controller_with_store(MockOcrClient::new(), store.clone());
        controller.submit_image(image("AAAA")).await;

        let (first, second) = tokio::join!(controller.save_edits("one"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.save_edits("two").await
        });
        assert_eq!(first, SaveOutcome::Saved);
        assert_eq!(second, SaveOutcome::Busy);
        assert_eq!(store.updates().len(), 1);
    }

    #[tokio::test]
    async fn select_shows_display_text_and_clears_notice() {
        let (controller, _, store) = controller(
            MockOcrClient::new().then_error(OcrServiceError::Transport("offline".into())),
        );
        store.seed([Conversion {
            id: "old".into(),
            image_source: image("BBBB"),
            extracted_text: "raw".into(),
            edited_text: Some("fixed".into()),
            created_at: Utc::now(),
            updated_at: None,
        }]);
        controller.load_history().await.unwrap();
        controller.submit_image(image("AAAA")).await;
        assert!(controller.snapshot().await.notice.is_some());

        assert!(controller.select_conversion(&"old".into()).await);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.current_text(), "fixed");
        assert_eq!(snapshot.phase.current_image(), Some(&image("BBBB")));
        assert!(snapshot.notice.is_none());

        assert!(!controller.select_conversion(&"missing".into()).await);
    }

    #[tokio::test]
    async fn deleting_current_resets_to_idle() {
        let (controller, _, store) = controller(MockOcrClient::new());
        controller.submit_image(image("AAAA")).await;

        assert_eq!(controller.delete_conversion(&"c1".into()).await, DeleteOutcome::Deleted);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.history.is_empty());
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn deleting_other_leaves_session() {
        let (controller, _, _) = controller(MockOcrClient::new());
        controller.submit_image(image("AAAA")).await;
        controller.submit_image(image("BBBB")).await;

        controller.delete_conversion(&"c1".into()).await;
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.current_id().map(|id| id.as_str()), Some("c2"));
        assert_eq!(snapshot.history.len(), 1);
    }

    #[tokio::test]
    async fn delete_failure_warns_and_keeps_state() {
        let (controller, _, store) = controller(MockOcrClient::new());
        controller.submit_image(image("AAAA")).await;
        store.fail_next(StoreOp::Delete, 1);

        assert_eq!(controller.delete_conversion(&"c1".into()).await, DeleteOutcome::Failed);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.current_id().map(|id| id.as_str()), Some("c1"));
        let notice = snapshot.notice.unwrap();
        assert_eq!(notice.severity, Severity::Warning);
    }

    #[tokio::test]
    async fn load_history_is_sorted_and_capped() {
        let store = Arc::new(InMemoryConversionStore::new());
        let base = Utc::now();
        store.seed((0..70).map(|i| Conversion {
            id: ConversionId::new(format!("s{i}")),
            image_source: image("AAAA"),
            extracted_text: format!("note {i}"),
            edited_text: None,
            created_at: base + chrono::Duration::seconds(i),
            updated_at: None,
        }));
        let (controller, _, _) = controller_with_store(MockOcrClient::new(), store);

        assert_eq!(controller.load_history().await.unwrap(), 50);
        let snapshot = controller.snapshot().await;
        assert!(!snapshot.history_loading);
        assert_eq!(snapshot.history[0].id.as_str(), "s69");
        assert!(snapshot.history.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn load_history_failure_is_silent() {
        let store = Arc::new(InMemoryConversionStore::new());
        store.fail_next(StoreOp::List, 1);
        let (controller, _, _) = controller_with_store(MockOcrClient::new(), store);

        assert!(controller.load_history().await.is_err());
        let snapshot = controller.snapshot().await;
        assert!(snapshot.history.is_empty());
        assert!(snapshot.notice.is_none());
        assert!(!snapshot.history_loading);
    }

    #[tokio::test]
    async fn history_is_loading_until_first_listing() {
        let (controller, _, _) = controller(MockOcrClient::new());
        assert!(controller.snapshot().await.history_loading);

        controller.load_history().await.unwrap();
        assert!(!controller.snapshot().await.history_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_during_listing_stays_deleted() {
        let store = Arc::new(
            InMemoryConversionStore::new()
                .with_reply_delay(StoreOp::List, Duration::from_millis(200)),
        );
        let (earlier, _, _) = controller_with_store(MockOcrClient::new(), store.clone());
        earlier.submit_image(image("AAAA")).await;
        let (controller, _, _) = controller_with_store(MockOcrClient::new(), store.clone());

        let (loaded, deleted) = tokio::join!(controller.load_history(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.delete_conversion(&"c1".into()).await
        });

        assert_eq!(deleted, DeleteOutcome::Deleted);
        assert_eq!(loaded.unwrap(), 0);
        assert!(store.records().is_empty());
        let snapshot = controller.snapshot().await;
        assert!(snapshot.history.is_empty());
        assert!(!snapshot.history_loading);
        assert!(!controller.select_conversion(&"c1".into()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn deletes_only_filter_the_listing_they_overlap() {
        let store = Arc::new(
            InMemoryConversionStore::new()
                .with_reply_delay(StoreOp::List, Duration::from_millis(200)),
        );
        let (controller, _, _) = controller_with_store(MockOcrClient::new(), store.clone());
        controller.submit_image(image("AAAA")).await;
        controller.submit_image(image("BBBB")).await;

        let (_, deleted) = tokio::join!(controller.load_history(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.delete_conversion(&"c1".into()).await
        });
        assert_eq!(deleted, DeleteOutcome::Deleted);

        assert_eq!(controller.load_history().await.unwrap(), 1);
        let ids: Vec<String> = controller
            .history()
            .await
            .iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(ids, ["c2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn save_landing_after_delete_keeps_session_idle() {
        let store = Arc::new(
            InMemoryConversionStore::new()
                .with_reply_delay(StoreOp::Update, Duration::from_millis(200)),
        );
        let (controller, _, _) =
            controller_with_store(MockOcrClient::new().then_text("Hello World"), store.clone());
        controller.submit_image(image("AAAA")).await;

        let (saved, deleted) = tokio::join!(controller.save_edits("Hello Universe"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.delete_conversion(&"c1".into()).await
        });

        assert_eq!(saved, SaveOutcome::Saved);
        assert_eq!(deleted, DeleteOutcome::Deleted);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.history.is_empty());
        assert!(!snapshot.is_saving);
        assert!(snapshot.notice.is_none());
        assert!(store.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_submission_wins_over_slower_older_one() {
        let (controller, _, store) = controller(
            MockOcrClient::new()
                .then_delayed_text(Duration::from_millis(500), "first")
                .then_delayed_text(Duration::from_millis(10), "second"),
        );

        let (older, newer) = tokio::join!(controller.submit_image(image("AAAA")), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            controller.submit_image(image("BBBB")).await
        });

        assert_eq!(newer, SubmitOutcome::Saved("c1".into()));
        assert_eq!(older, SubmitOutcome::Superseded(None));
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.current_text(), "second");
        assert_eq!(snapshot.current_id().map(|id| id.as_str()), Some("c1"));
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_create_still_lands_in_history() {
        let store = Arc::new(InMemoryConversionStore::new().with_latency(Duration::from_millis(200)));
        let (controller, _, _) = controller_with_store(
            MockOcrClient::new()
                .then_text("first")
                .then_delayed_text(Duration::from_millis(500), "second"),
            store,
        );

        let (older, newer) = tokio::join!(controller.submit_image(image("AAAA")), async {
            // The older call is inside its store create by now.
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.submit_image(image("BBBB")).await
        });

        assert_eq!(older, SubmitOutcome::Superseded(Some("c1".into())));
        assert_eq!(newer, SubmitOutcome::Saved("c2".into()));
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.current_text(), "second");
        let ids: Vec<&str> = snapshot.history.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c2", "c1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn selection_supersedes_in_flight_submission() {
        let (controller, _, store) = controller(
            MockOcrClient::new()
                .then_text("kept")
                .then_delayed_text(Duration::from_millis(300), "late"),
        );
        controller.submit_image(image("AAAA")).await;

        let (late, selected) = tokio::join!(controller.submit_image(image("BBBB")), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.select_conversion(&"c1".into()).await
        });

        assert!(selected);
        assert_eq!(late, SubmitOutcome::Superseded(None));
        assert_eq!(controller.snapshot().await.current_text(), "kept");
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn events_follow_the_lifecycle() {
        let (controller, _, _) = controller(MockOcrClient::new());
        let mut events = controller.subscribe();

        controller.submit_image(image("AAAA")).await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                SessionEvent::PhaseChanged { phase: "processing" },
                SessionEvent::HistoryChanged { len: 1 },
                SessionEvent::PhaseChanged { phase: "extracted" },
            ]
        );
    }

    #[tokio::test]
    async fn dismiss_clears_notice() {
        let (controller, _, _) = controller(
            MockOcrClient::new().then_error(OcrServiceError::Status {
                status: 500,
                message: "OCR processing failed".into(),
            }),
        );
        controller.submit_image(image("AAAA")).await;
        assert_eq!(
            controller.snapshot().await.error_message(),
            Some("OCR processing failed")
        );

        controller.dismiss_notice().await;
        assert!(controller.snapshot().await.notice.is_none());
    }
}
