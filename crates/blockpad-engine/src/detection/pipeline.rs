//! The auto-detection state machine.
//!
//! Per block: `Idle → Scheduled → Detecting → Applied | Rejected | Idle`.
//!
//! `on_patch` runs after every transaction. For each auto block the edit
//! touched it either resets an emptied block to the default language, skips
//! short content, gates on the edit distance to the last classified sample,
//! or dispatches a request. `poll` drains responses and applies the ones
//! that still describe the document: same block, same content fingerprint,
//! no undo/redo since dispatch.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::time::{Duration, Instant};

use blockpad_syntax::Language;

use crate::detection::distance::bounded_levenshtein;
use crate::detection::worker::{DetectionBackend, DetectionRequest, DetectionResponse, GlobalWorker};
use crate::dispatch::LanguageRegistry;
use crate::editing::{Block, BlockId, BlockRef, Cmd, Document, Origin, Patch};

/// Oldest in-flight requests beyond this are forgotten.
const MAX_IN_FLIGHT: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSettings {
    pub enabled: bool,
    /// Content must be strictly longer than this (bytes) to be classified.
    pub min_content_length: usize,
    /// Re-detect only once the edit distance to the last sample reaches
    /// this fraction of the content length.
    pub diff_fraction: f32,
    pub confidence_threshold: f32,
    pub request_timeout: Duration,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_content_length: 8,
            diff_fraction: 0.1,
            confidence_threshold: 0.15,
            request_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Scheduled,
    Detecting,
    Applied,
    Rejected,
}

/// Content last sent for classification, and what came back.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSample {
    pub block_id: BlockId,
    pub ordinal: usize,
    pub content: String,
    pub last_language: Option<Language>,
    pub last_confidence: f32,
}

#[derive(Debug, Clone)]
struct InFlight {
    block_id: BlockId,
    ordinal: usize,
    fingerprint: u64,
    generation: u64,
    dispatched_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetectionStats {
    pub dispatched: usize,
    pub applied: usize,
    pub rejected: usize,
    /// Edits skipped because the content barely changed.
    pub gated: usize,
}

/// Why a response was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Unknown,
    NoLanguage,
    NotDetectable,
    LowConfidence,
    BlockGone,
    AutoOff,
    SameLanguage,
    Stale,
    HistoryMoved,
}

pub fn fingerprint(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

pub struct AutoDetector<B: DetectionBackend = GlobalWorker> {
    settings: DetectionSettings,
    backend: B,
    registry: &'static LanguageRegistry,
    samples: HashMap<BlockId, DetectionSample>,
    in_flight: BTreeMap<u64, InFlight>,
    phases: HashMap<BlockId, Phase>,
    next_id: u64,
    replies: Sender<DetectionResponse>,
    inbox: Receiver<DetectionResponse>,
    stats: DetectionStats,
}

impl AutoDetector<GlobalWorker> {
    /// A detector backed by the process-wide classifier worker.
    pub fn new(settings: DetectionSettings) -> Self {
        Self::with_backend(settings, GlobalWorker)
    }
}

impl<B: DetectionBackend> AutoDetector<B> {
    pub fn with_backend(settings: DetectionSettings, backend: B) -> Self {
        let (replies, inbox) = channel();
        Self {
            settings,
            backend,
            registry: LanguageRegistry::global(),
            samples: HashMap::new(),
            in_flight: BTreeMap::new(),
            phases: HashMap::new(),
            next_id: 1,
            replies,
            inbox,
            stats: DetectionStats::default(),
        }
    }

    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// React to a committed transaction. Returns the patches of any
    /// language changes this caused (emptied blocks reset to the default).
    pub fn on_patch(&mut self, doc: &mut Document, patch: &Patch) -> Vec<Patch> {
        if !self.settings.enabled || patch.origin != Origin::User || !patch.is_text_change() {
            return Vec::new();
        }
        self.forget_vanished(doc);

        let touched: Vec<BlockId> = doc
            .index()
            .blocks()
            .iter()
            .filter(|b| b.language.auto_detect && touches(b, &patch.changed))
            .map(|b| b.id)
            .collect();

        let mut applied = Vec::new();
        for id in touched {
            if let Some(patch) = self.consider(doc, id) {
                applied.push(patch);
            }
        }
        applied
    }

    /// Queue every auto block regardless of what was edited, e.g. after
    /// loading a document.
    pub fn detect_all(&mut self, doc: &mut Document) -> Vec<Patch> {
        if !self.settings.enabled {
            return Vec::new();
        }
        self.forget_vanished(doc);
        let ids: Vec<BlockId> = doc
            .index()
            .blocks()
            .iter()
            .filter(|b| b.language.auto_detect)
            .map(|b| b.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.consider(doc, id))
            .collect()
    }

    fn consider(&mut self, doc: &mut Document, id: BlockId) -> Option<Patch> {
        let block = doc.index().block_by_id(id)?.clone();
        let content = doc.block_content(&block).to_string();

        if content.is_empty() {
            self.samples.remove(&id);
            return self.reset_to_default(doc, &block);
        }
        if content.len() <= self.settings.min_content_length {
            self.set_phase(id, Phase::Idle);
            return None;
        }

        self.set_phase(id, Phase::Scheduled);
        if let Some(sample) = self.samples.get(&id)
            && !self.differs_enough(&sample.content, &content)
        {
            self.stats.gated += 1;
            self.set_phase(id, Phase::Idle);
            return None;
        }

        self.dispatch(doc, &block, content);
        None
    }

    /// An emptied auto block falls back to the default language without
    /// asking the classifier.
    fn reset_to_default(&mut self, doc: &mut Document, block: &Block) -> Option<Patch> {
        self.set_phase(block.id, Phase::Idle);
        let default = doc.default_language();
        if doc.redo_pending() || block.language.language == Some(default) {
            return None;
        }
        log::debug!("block {} emptied, back to {}", block.id, default.token());
        doc.apply_with_origin(
            Cmd::RetypeBlock {
                target: BlockRef::Id(block.id),
                language: default,
                auto_detect: true,
            },
            Origin::LanguageChange,
        )
    }

    fn differs_enough(&self, sample: &str, content: &str) -> bool {
        let chars = content.chars().count();
        let threshold = (self.settings.diff_fraction * chars as f32).ceil() as usize;
        if threshold == 0 {
            return true;
        }
        // Distance below the threshold means "not meaningfully different".
        bounded_levenshtein(sample, content, threshold - 1).is_none()
    }

    fn dispatch(&mut self, doc: &Document, block: &Block, content: String) {
        let correlation_id = self.next_id;
        self.next_id += 1;

        let flight = InFlight {
            block_id: block.id,
            ordinal: block.ordinal,
            fingerprint: fingerprint(&content),
            generation: doc.history_generation(),
            dispatched_at: Instant::now(),
        };
        self.in_flight.insert(correlation_id, flight);
        while self.in_flight.len() > MAX_IN_FLIGHT {
            if let Some((evicted, flight)) = self.in_flight.pop_first() {
                log::debug!("detection request {evicted} evicted");
                self.settle(flight.block_id, Phase::Idle);
            }
        }

        let sample = self.samples.entry(block.id).or_insert_with(|| DetectionSample {
            block_id: block.id,
            ordinal: block.ordinal,
            content: String::new(),
            last_language: block.language.language,
            last_confidence: 0.0,
        });
        sample.ordinal = block.ordinal;
        sample.content = content.clone();

        self.set_phase(block.id, Phase::Detecting);
        self.stats.dispatched += 1;
        log::debug!(
            "detection request {correlation_id} for block {} ({} bytes)",
            block.ordinal,
            content.len()
        );
        self.backend.submit(
            DetectionRequest {
                content,
                correlation_id,
            },
            self.replies.clone(),
        );
    }

    /// Apply whatever responses have arrived. Never blocks.
    pub fn poll(&mut self, doc: &mut Document) -> Vec<Patch> {
        self.expire();
        let mut applied = Vec::new();
        loop {
            match self.inbox.try_recv() {
                Ok(response) => {
                    if let Some(patch) = self.handle_response(doc, response) {
                        applied.push(patch);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Block until nothing is in flight or `timeout` passes, applying
    /// responses as they arrive.
    pub fn wait(&mut self, doc: &mut Document, timeout: Duration) -> Vec<Patch> {
        let deadline = Instant::now() + timeout;
        let mut applied = self.poll(doc);
        while !self.in_flight.is_empty() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            match self.inbox.recv_timeout(left) {
                Ok(response) => {
                    if let Some(patch) = self.handle_response(doc, response) {
                        applied.push(patch);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        applied.extend(self.poll(doc));
        applied
    }

    fn expire(&mut self) {
        let timeout = self.settings.request_timeout;
        let expired: Vec<u64> = self
            .in_flight
            .iter()
            .filter(|(_, f)| f.dispatched_at.elapsed() >= timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(flight) = self.in_flight.remove(&id) {
                log::debug!("detection request {id} timed out");
                self.settle(flight.block_id, Phase::Idle);
            }
        }
    }

    fn handle_response(&mut self, doc: &mut Document, response: DetectionResponse) -> Option<Patch> {
        let correlation_id = response.correlation_id;
        let Some(flight) = self.in_flight.remove(&correlation_id) else {
            return self.reject(None, correlation_id, Rejection::Unknown);
        };

        let language = match self.accept(doc, &flight, &response) {
            Ok(language) => language,
            Err(why) => {
                // Only an answer about the current content says anything
                // about the block.
                if is_current(doc, &flight)
                    && let Some(sample) = self.samples.get_mut(&flight.block_id)
                {
                    sample.last_language = Language::from_token(&response.language);
                    sample.last_confidence = response.confidence;
                }
                return self.reject(Some(flight.block_id), correlation_id, why);
            }
        };

        let patch = doc.apply_with_origin(
            Cmd::RetypeBlock {
                target: BlockRef::Id(flight.block_id),
                language,
                auto_detect: true,
            },
            Origin::LanguageChange,
        );
        match patch {
            Some(patch) => {
                log::info!(
                    "block {} detected as {} ({:.2})",
                    doc.index().ordinal_of(flight.block_id).unwrap_or(flight.ordinal),
                    language.display_name(),
                    response.confidence
                );
                self.samples.remove(&flight.block_id);
                self.stats.applied += 1;
                self.settle(flight.block_id, Phase::Applied);
                Some(patch)
            }
            None => self.reject(Some(flight.block_id), correlation_id, Rejection::Stale),
        }
    }

    fn accept(
        &self,
        doc: &Document,
        flight: &InFlight,
        response: &DetectionResponse,
    ) -> Result<Language, Rejection> {
        if response.language.is_empty() {
            return Err(Rejection::NoLanguage);
        }
        let language = Language::from_token(&response.language).ok_or(Rejection::NoLanguage)?;
        if !self.registry.is_detectable(language) {
            return Err(Rejection::NotDetectable);
        }
        if response.confidence <= 0.0 || response.confidence < self.settings.confidence_threshold {
            return Err(Rejection::LowConfidence);
        }
        let block = doc.index().block_by_id(flight.block_id).ok_or(Rejection::BlockGone)?;
        if !block.language.auto_detect {
            return Err(Rejection::AutoOff);
        }
        if block.language.language == Some(language) {
            return Err(Rejection::SameLanguage);
        }
        if fingerprint(doc.block_content(block)) != flight.fingerprint {
            return Err(Rejection::Stale);
        }
        if doc.history_generation() != flight.generation {
            return Err(Rejection::HistoryMoved);
        }
        Ok(language)
    }

    fn reject(&mut self, block: Option<BlockId>, correlation_id: u64, why: Rejection) -> Option<Patch> {
        log::debug!("detection response {correlation_id} rejected: {why:?}");
        self.stats.rejected += 1;
        if let Some(block) = block {
            self.settle(block, Phase::Rejected);
        }
        None
    }

    /// Leave `Detecting` only once the block has nothing else in flight.
    fn settle(&mut self, block: BlockId, phase: Phase) {
        if self.in_flight.values().any(|f| f.block_id == block) {
            self.set_phase(block, Phase::Detecting);
        } else {
            self.set_phase(block, phase);
        }
    }

    fn set_phase(&mut self, block: BlockId, phase: Phase) {
        self.phases.insert(block, phase);
    }

    fn forget_vanished(&mut self, doc: &Document) {
        let live: HashSet<BlockId> = doc.index().blocks().iter().map(|b| b.id).collect();
        self.samples.retain(|id, _| live.contains(id));
        self.phases.retain(|id, _| live.contains(id));
    }

    pub fn phase(&self, block: BlockId) -> Phase {
        self.phases.get(&block).copied().unwrap_or_default()
    }

    pub fn sample(&self, block: BlockId) -> Option<&DetectionSample> {
        self.samples.get(&block)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> DetectionStats {
        self.stats
    }
}

/// Whether the block still holds the content `flight` was sent with.
fn is_current(doc: &Document, flight: &InFlight) -> bool {
    doc.history_generation() == flight.generation
        && doc
            .index()
            .block_by_id(flight.block_id)
            .is_some_and(|block| fingerprint(doc.block_content(block)) == flight.fingerprint)
}

/// Whether any changed range lands in the block's content. A collapsed
/// range at the very end of a block belongs to it.
fn touches(block: &Block, changed: &[Range<usize>]) -> bool {
    changed
        .iter()
        .any(|range| range.start <= block.range.end && range.end >= block.content_range.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::classifier::HeuristicClassifier;
    use crate::detection::worker::QueuedBackend;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const JSON: &str = "{\"name\": \"blockpad\", \"tags\": [1, 2]}";

    fn detector() -> AutoDetector<QueuedBackend> {
        AutoDetector::with_backend(DetectionSettings::default(), QueuedBackend::new())
    }

    fn type_text(doc: &mut Document, at: usize, text: &str) -> Patch {
        doc.apply(Cmd::InsertText {
            at,
            text: text.to_string(),
        })
        .unwrap()
    }

    fn append(doc: &mut Document, text: &str) -> Patch {
        let at = doc.len();
        type_text(doc, at, text)
    }

    fn respond(detector: &AutoDetector<QueuedBackend>, id: u64, language: &str, confidence: f32) {
        assert!(detector.backend().respond(DetectionResponse {
            language: language.to_string(),
            confidence,
            correlation_id: id,
        }));
    }

    #[test]
    fn test_typing_json_into_auto_block_retypes_it() {
        let mut doc = Document::new();
        let mut detector = detector();
        let patch = append(&mut doc, JSON);
        assert!(detector.on_patch(&mut doc, &patch).is_empty());

        let id = doc.index().first_block().id;
        assert_eq!(detector.phase(id), Phase::Detecting);
        assert_eq!(detector.backend().submitted(), 1);

        detector.backend().respond_all(&HeuristicClassifier);
        let applied = detector.poll(&mut doc);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].origin, Origin::LanguageChange);
        assert_eq!(doc.text(), format!("∞∞∞json-a\n{JSON}"));
        assert_eq!(detector.phase(id), Phase::Applied);
        assert_eq!(doc.index().first_block().id, id);
        assert!(detector.sample(id).is_none());
    }

    #[test]
    fn test_short_content_never_dispatches() {
        let mut doc = Document::new();
        let mut detector = detector();
        let patch = append(&mut doc, "{\"a\":1}");
        detector.on_patch(&mut doc, &patch);
        assert_eq!(detector.backend().submitted(), 0);
        assert_eq!(detector.phase(doc.index().first_block().id), Phase::Idle);
    }

    #[test]
    fn test_small_edits_are_gated() {
        let mut doc = Document::new();
        let mut detector = detector();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);
        assert_eq!(detector.backend().submitted(), 1);

        let patch = append(&mut doc, " ");
        detector.on_patch(&mut doc, &patch);
        assert_eq!(detector.backend().submitted(), 1);
        assert_eq!(detector.stats().gated, 1);

        let patch = append(&mut doc, "\n{\"more\": [true, false]}");
        detector.on_patch(&mut doc, &patch);
        assert_eq!(detector.backend().submitted(), 2);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut doc = Document::new();
        let mut detector = detector();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);

        // Edit after dispatch without telling the detector.
        append(&mut doc, "x");
        respond(&detector, 1, "json", 0.9);
        assert!(detector.poll(&mut doc).is_empty());
        assert!(doc.index().first_block().language.language == Some(Language::Text));
        assert_eq!(detector.phase(doc.index().first_block().id), Phase::Rejected);
        assert_eq!(detector.stats().rejected, 1);
    }

    #[test]
    fn test_stale_response_leaves_sample_alone() {
        let mut doc = Document::new();
        let mut detector = detector();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);
        let id = doc.index().first_block().id;

        respond(&detector, 1, "json", 0.1);
        assert!(detector.poll(&mut doc).is_empty());
        let sample = detector.sample(id).unwrap();
        assert_eq!(sample.last_language, Some(Language::Json));
        assert_eq!(sample.last_confidence, 0.1);

        let patch = append(&mut doc, "\n{\"more\": [true, false]}");
        detector.on_patch(&mut doc, &patch);
        assert_eq!(detector.backend().submitted(), 2);
        append(&mut doc, "x");
        respond(&detector, 2, "py", 0.9);
        assert!(detector.poll(&mut doc).is_empty());

        let sample = detector.sample(id).unwrap();
        assert_eq!(sample.last_language, Some(Language::Json));
        assert_eq!(sample.last_confidence, 0.1);
    }

    #[test]
    fn test_undo_since_dispatch_rejects() {
        let mut doc = Document::new();
        let mut detector = detector();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);
        doc.undo().unwrap();
        doc.redo().unwrap();

        respond(&detector, 1, "json", 0.9);
        assert!(detector.poll(&mut doc).is_empty());
        assert_eq!(doc.index().first_block().language.token, "text");
    }

    #[rstest]
    #[case("", 0.9)]
    #[case("json", 0.1)]
    #[case("json", 0.0)]
    #[case("text", 0.9)]
    #[case("nosuchlang", 0.9)]
    fn test_unacceptable_responses_are_rejected(#[case] language: &str, #[case] confidence: f32) {
        let mut doc = Document::new();
        let mut detector = detector();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);
        respond(&detector, 1, language, confidence);
        assert!(detector.poll(&mut doc).is_empty());
        assert_eq!(doc.text(), format!("∞∞∞text-a\n{JSON}"));
    }

    #[test]
    fn test_unknown_correlation_id_is_ignored() {
        let mut doc = Document::new();
        let mut detector = detector();
        detector.replies.send(DetectionResponse::unclassified(42)).unwrap();
        assert!(detector.poll(&mut doc).is_empty());
        assert_eq!(detector.stats().rejected, 1);
    }

    #[test]
    fn test_emptied_block_resets_to_default_without_classifier() {
        let mut doc = Document::from_text("∞∞∞json-a\n{}");
        let mut detector = detector();
        let patch = doc.apply(Cmd::DeleteRange { range: 16..18 }).unwrap();
        let applied = detector.on_patch(&mut doc, &patch);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].origin, Origin::LanguageChange);
        assert_eq!(doc.text(), "∞∞∞text-a\n");
        assert_eq!(detector.backend().submitted(), 0);
    }

    #[test]
    fn test_emptied_block_kept_while_redo_pending() {
        let mut doc = Document::from_text("∞∞∞json-a\n");
        let mut detector = detector();
        type_text(&mut doc, 16, "{}");
        let undo = doc.undo().unwrap();
        assert!(doc.redo_pending());

        let patch = Patch {
            origin: Origin::User,
            ..undo
        };
        assert!(detector.on_patch(&mut doc, &patch).is_empty());
        assert_eq!(doc.text(), "∞∞∞json-a\n");
    }

    #[test]
    fn test_language_change_patches_are_ignored() {
        let mut doc = Document::new();
        let mut detector = detector();
        let patch = doc
            .apply_with_origin(
                Cmd::InsertText {
                    at: doc.len(),
                    text: JSON.to_string(),
                },
                Origin::LanguageChange,
            )
            .unwrap();
        detector.on_patch(&mut doc, &patch);
        assert_eq!(detector.backend().submitted(), 0);
    }

    #[test]
    fn test_non_auto_blocks_are_left_alone() {
        let mut doc = Document::from_text("∞∞∞text\n");
        let mut detector = detector();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);
        assert_eq!(detector.backend().submitted(), 0);
    }

    #[test]
    fn test_response_follows_moved_block() {
        let mut doc = Document::from_text("∞∞∞text\nfirst\n∞∞∞text-a\n");
        let mut detector = detector();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);
        let id = doc.index().last_block().id;

        doc.apply(Cmd::InsertBlock {
            placement: crate::editing::Placement::BeforeFirst,
            language: Some(Language::Python),
            auto_detect: false,
        })
        .unwrap();
        assert_eq!(doc.index().ordinal_of(id), Some(2));

        respond(&detector, 1, "json", 0.9);
        assert_eq!(detector.poll(&mut doc).len(), 1);
        let block = doc.index().block_by_id(id).unwrap();
        assert_eq!(block.language.token, "json");
        assert_eq!(doc.block_content(block), JSON);
    }

    #[test]
    fn test_out_of_order_responses() {
        let mut doc = Document::new();
        let mut detector = detector();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);
        let patch = append(&mut doc, "\n[\"second\", \"array\", 3, 4]");
        detector.on_patch(&mut doc, &patch);
        let id = doc.index().first_block().id;

        respond(&detector, 2, "json", 0.9);
        respond(&detector, 1, "json", 0.9);
        let applied = detector.poll(&mut doc);
        assert_eq!(applied.len(), 1);
        assert_eq!(doc.index().first_block().language.token, "json");
        assert_eq!(detector.phase(id), Phase::Rejected);
    }

    #[test]
    fn test_timed_out_requests_are_dropped() {
        let settings = DetectionSettings {
            request_timeout: Duration::ZERO,
            ..DetectionSettings::default()
        };
        let mut detector = AutoDetector::with_backend(settings, QueuedBackend::new());
        let mut doc = Document::new();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);
        assert_eq!(detector.in_flight_len(), 1);

        detector.poll(&mut doc);
        assert_eq!(detector.in_flight_len(), 0);
        assert_eq!(detector.phase(doc.index().first_block().id), Phase::Idle);
        respond(&detector, 1, "json", 0.9);
        assert!(detector.poll(&mut doc).is_empty());
    }

    #[test]
    fn test_disabled_detector_does_nothing() {
        let settings = DetectionSettings {
            enabled: false,
            ..DetectionSettings::default()
        };
        let mut detector = AutoDetector::with_backend(settings, QueuedBackend::new());
        let mut doc = Document::new();
        let patch = append(&mut doc, JSON);
        detector.on_patch(&mut doc, &patch);
        assert!(detector.detect_all(&mut doc).is_empty());
        assert_eq!(detector.backend().submitted(), 0);
    }

    #[test]
    fn test_detect_all_queues_every_auto_block() {
        let mut doc = Document::from_text(&format!(
            "∞∞∞text-a\n{JSON}\n∞∞∞text\n{JSON}\n∞∞∞text-a\nimport os\ndef f(x):\n    return x\n"
        ));
        let mut detector = detector();
        detector.detect_all(&mut doc);
        assert_eq!(detector.backend().submitted(), 2);

        detector.backend().respond_all(&HeuristicClassifier);
        detector.poll(&mut doc);
        let tokens: Vec<_> = doc
            .index()
            .blocks()
            .iter()
            .map(|b| b.language.token.clone())
            .collect();
        assert_eq!(tokens, vec!["json", "text", "py"]);
    }

    #[test]
    fn test_fingerprint_depends_on_content() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
    }
}
