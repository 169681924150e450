//! Session controller.
//!
//! One owned object drives a whole round. The phase state machine is the
//! only driver; every other component reacts to the transitions it makes,
//! and the sequencer and timer feed requests back into it.
//!
//! A dispatched transition is processed in a fixed order:
//!
//! 1. apply the event to `SessionState` (rejected inside the cooldown)
//! 2. tear down the outgoing phase: sequencer, retention cue, timer
//! 3. transition side effects: history, timer flag, user, stats
//! 4. start the incoming phase's audio
//! 5. re-evaluate the wake-lock predicate
//! 6. schedule the session save when the round is complete
//!
//! Network work is never performed here. The controller queues `Outbound`
//! requests; the front end executes them and reports back through
//! `on_save_finished` / `on_stats_loaded`.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::phase::{Phase, PhaseEvent, SessionState, Transition, TransitionError, TransitionLock};
use super::user::{CurrentUser, RetentionHistoryItem, UserType};
use crate::api::{ApiError, SaveSessionRequest, SAVE_FAILED, STATS_FAILED};
use crate::audio::{AudioSequencer, InstructionCue, RetentionFocusCue, SequenceProgress};
use crate::events::Event;
use crate::platform::{Clock, MediaBackend, MediaEvent, Visibility, WakeLockHandle, WakeLockPlatform};
use crate::round::{self, ChakraStage, STAGE_COUNT};
use crate::stats::UserStats;
use crate::timer::RetentionTimer;
use crate::wake_lock::{WakeLockChange, WakeLockManager};

/// Capabilities injected into the controller.
pub struct Platform {
    pub clock: Box<dyn Clock>,
    pub media: Box<dyn MediaBackend>,
    pub wake_lock: Box<dyn WakeLockPlatform>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    /// Terminal for this round; never retried.
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsView {
    pub stats: Option<UserStats>,
    pub loading: bool,
    pub error: Option<String>,
}

impl StatsView {
    /// Stats to render; zero/empty while missing.
    pub fn or_default(&self) -> UserStats {
        self.stats.clone().unwrap_or_default()
    }
}

/// Work the front end must perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    SaveSession(SaveSessionRequest),
    FetchStats { user_id: String },
}

/// Serializable view of the controller for front ends.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub chakra_index: usize,
    pub chakra: &'static str,
    pub retention_seconds: u64,
    pub timer_running: bool,
    pub total_duration_secs: u64,
    pub history: Vec<RetentionHistoryItem>,
    pub save: SaveStatus,
    /// Guidance clip the current phase is on, if any.
    pub guidance_clip: Option<&'static str>,
    pub audio_stalled: bool,
    pub keep_awake: bool,
    pub wake_lock_message: String,
    pub user: Option<CurrentUser>,
    pub at: DateTime<Utc>,
}

pub struct SessionController {
    platform: Platform,
    state: SessionState,
    lock: TransitionLock,
    user: Option<CurrentUser>,
    history: Vec<RetentionHistoryItem>,
    timer: RetentionTimer,
    sequencer: AudioSequencer,
    instructions: InstructionCue,
    retention_focus: RetentionFocusCue,
    wake_lock: WakeLockManager,
    save: SaveStatus,
    stats: StatsView,
    outbox: VecDeque<Outbound>,
    events: Vec<Event>,
}

impl SessionController {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            state: SessionState::new(),
            lock: TransitionLock::new(),
            user: None,
            history: Vec::new(),
            timer: RetentionTimer::new(),
            sequencer: AudioSequencer::new(),
            instructions: InstructionCue::new(),
            retention_focus: RetentionFocusCue::new(),
            wake_lock: WakeLockManager::new(),
            save: SaveStatus::Idle,
            stats: StatsView::default(),
            outbox: VecDeque::new(),
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn chakra_index(&self) -> usize {
        self.state.current_chakra_index
    }

    pub fn stage(&self) -> &'static ChakraStage {
        // The index never leaves the round.
        &round::ROUND[self.state.current_chakra_index.min(round::LAST_STAGE_INDEX)]
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn history(&self) -> &[RetentionHistoryItem] {
        &self.history
    }

    pub fn retention_seconds(&self) -> u64 {
        self.timer.seconds()
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.save
    }

    pub fn save_complete(&self) -> bool {
        self.save == SaveStatus::Saved
    }

    pub fn stats(&self) -> &StatsView {
        &self.stats
    }

    pub fn instructions(&self) -> &InstructionCue {
        &self.instructions
    }

    pub fn wake_lock(&self) -> &WakeLockManager {
        &self.wake_lock
    }

    pub fn is_audio_stalled(&self) -> bool {
        self.sequencer.is_stalled()
    }

    /// Whether a transition requested now would hit the cooldown.
    pub fn is_transition_locked(&self) -> bool {
        self.lock.is_locked(self.now())
    }

    /// The wake-lock predicate.
    pub fn should_keep_screen_awake(&self) -> bool {
        self.state.phase.is_session_active()
            || (self.state.phase == Phase::Disclaimer && self.instructions.is_playing())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.state.phase,
            chakra_index: self.state.current_chakra_index,
            chakra: self.stage().name,
            retention_seconds: self.timer.seconds(),
            timer_running: self.timer.is_running(),
            total_duration_secs: self.state.total_duration_secs,
            history: self.history.clone(),
            save: self.save.clone(),
            guidance_clip: self.sequencer.current_source(),
            audio_stalled: self.sequencer.is_stalled(),
            keep_awake: self.should_keep_screen_awake(),
            wake_lock_message: self.wake_lock.status_message().to_string(),
            user: self.user.clone(),
            at: self.now(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        self.outbox.drain(..).collect()
    }

    // ── User operations ──────────────────────────────────────────────

    pub fn acknowledge(&mut self) -> Result<Transition, TransitionError> {
        self.dispatch(PhaseEvent::Acknowledge)
    }

    /// Play or stop the spoken instructions. Only available on the
    /// disclaimer; returns whether they are playing afterwards.
    pub fn toggle_instructions(&mut self) -> bool {
        if self.state.phase != Phase::Disclaimer {
            return false;
        }
        let playing = self.instructions.toggle(self.platform.media.as_mut());
        self.emit_instructions();
        self.sync_wake_lock();
        playing
    }

    /// Enter the dashboard as a registered user.
    pub fn login_succeeded(&mut self, user: CurrentUser) -> Result<Transition, TransitionError> {
        if user.user_type == UserType::Guest {
            return self.start_as_guest();
        }
        let transition = self.dispatch(PhaseEvent::LoginSucceeded)?;
        info!(user_id = %user.id, "user logged in");
        self.user = Some(user);
        self.stats = StatsView::default();
        self.request_stats();
        Ok(transition)
    }

    /// Start a round straight away as a guest.
    pub fn start_as_guest(&mut self) -> Result<Transition, TransitionError> {
        let transition = self.dispatch(PhaseEvent::GuestStart)?;
        self.user = Some(CurrentUser::guest());
        self.stats = StatsView::default();
        Ok(transition)
    }

    pub fn start_round(&mut self) -> Result<Transition, TransitionError> {
        self.dispatch(PhaseEvent::StartRound)
    }

    /// The user signals the end of the retention.
    pub fn tap_retention(&mut self) -> Result<Transition, TransitionError> {
        self.dispatch(PhaseEvent::RetentionTap)
    }

    /// Leave the summary. Any unsaved result is discarded.
    pub fn continue_from_summary(&mut self) -> Result<Transition, TransitionError> {
        let user_type = self.user_type();
        self.dispatch(PhaseEvent::Continue(user_type))
    }

    pub fn logout(&mut self) -> Result<Transition, TransitionError> {
        self.dispatch(PhaseEvent::Logout)
    }

    /// Back to the disclaimer with a fresh state. Not subject to the cooldown.
    pub fn reset(&mut self) -> Result<Transition, TransitionError> {
        self.dispatch(PhaseEvent::Reset)
    }

    /// Retry a clip the platform refused to autoplay. Must be called from a
    /// user gesture. Returns false when nothing was stalled.
    pub fn retry_playback(&mut self) -> bool {
        match self.sequencer.retry(self.platform.media.as_mut()) {
            Some(progress) => {
                self.apply_progress(progress);
                true
            }
            None => false,
        }
    }

    // ── Platform notifications ───────────────────────────────────────

    /// Advance the retention timer and retry a deferred sequence completion.
    /// Call periodically (at least once per second).
    pub fn tick(&mut self) {
        let now = self.now();
        if let Some(seconds) = self.timer.tick(self.state.phase, now) {
            self.events.push(Event::RetentionTick { seconds, at: now });
        }
        self.try_complete_sequence();
    }

    pub fn on_media_event(&mut self, event: MediaEvent) {
        if self.instructions.handle(event) {
            self.emit_instructions();
            self.sync_wake_lock();
            return;
        }
        let progress = self.sequencer.handle(self.platform.media.as_mut(), event);
        self.apply_progress(progress);
    }

    pub fn on_visibility_change(&mut self, visibility: Visibility) {
        let change = self
            .wake_lock
            .on_visibility_change(self.platform.wake_lock.as_mut(), visibility);
        self.emit_wake_lock(change);
    }

    pub fn on_wake_lock_released(&mut self, handle: WakeLockHandle) {
        self.wake_lock.on_released(handle);
    }

    // ── Collaborator results ─────────────────────────────────────────

    /// Result of an `Outbound::SaveSession`. Ignored unless a save is in
    /// flight for the current summary.
    pub fn on_save_finished<T>(&mut self, result: Result<T, ApiError>) {
        if self.save != SaveStatus::Saving {
            debug!("dropping save result for a discarded round");
            return;
        }
        let now = self.now();
        match result {
            Ok(_) => {
                info!("session saved");
                self.save = SaveStatus::Saved;
                self.events.push(Event::SaveSucceeded { at: now });
                self.request_stats();
            }
            Err(err) => {
                warn!(error = %err, "session save failed");
                let message = format!("Fout: {}", err.user_message(SAVE_FAILED));
                self.save = SaveStatus::Failed(message.clone());
                self.events.push(Event::SaveFailed { message, at: now });
            }
        }
    }

    /// Result of an `Outbound::FetchStats` for `user_id`.
    pub fn on_stats_loaded(&mut self, user_id: &str, result: Result<UserStats, ApiError>) {
        if self.user.as_ref().map(|u| u.id.as_str()) != Some(user_id) {
            debug!(user_id, "dropping stats for another user");
            return;
        }
        let now = self.now();
        self.stats.loading = false;
        match result {
            Ok(stats) => {
                self.events.push(Event::StatsLoaded {
                    session_count: stats.session_count,
                    at: now,
                });
                self.stats.stats = Some(stats);
                self.stats.error = None;
            }
            Err(err) => {
                warn!(error = %err, "stats request failed");
                let message = err.user_message(STATS_FAILED);
                self.stats.error = Some(message.clone());
                self.events.push(Event::StatsFailed { message, at: now });
            }
        }
    }

    /// Queue the save of a completed round.
    ///
    /// Fires at most once per round: only in SUMMARY, with a full history,
    /// and while no save has been started, finished or failed.
    pub fn request_save(&mut self) -> bool {
        if self.state.phase != Phase::Summary
            || self.history.len() != STAGE_COUNT
            || self.save != SaveStatus::Idle
        {
            return false;
        }
        let user_type = self.user_type();
        let user_id = match (&self.user, user_type) {
            (Some(user), UserType::User) => Some(user.id.clone()),
            _ => None,
        };
        let request = SaveSessionRequest {
            total_duration: self.state.total_duration_secs,
            user_type,
            user_id,
            records: self.history.clone(),
        };
        self.save = SaveStatus::Saving;
        self.events.push(Event::SaveStarted {
            records: request.records.len(),
            total_duration: request.total_duration,
            at: self.now(),
        });
        self.outbox.push_back(Outbound::SaveSession(request));
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn now(&self) -> DateTime<Utc> {
        self.platform.clock.now()
    }

    fn user_type(&self) -> UserType {
        self.user
            .as_ref()
            .map(|u| u.user_type)
            .unwrap_or(UserType::Guest)
    }

    fn dispatch(&mut self, event: PhaseEvent) -> Result<Transition, TransitionError> {
        let now = self.now();
        if event != PhaseEvent::Reset {
            if let Err(err) = self.lock.check(now) {
                self.reject(err.clone(), now);
                return Err(err);
            }
        }

        let previous = (self.state.phase, self.state.current_chakra_index);
        let transition = match self.state.apply(event, now) {
            Ok(transition) => transition,
            Err(err) => {
                self.reject(err.clone(), now);
                return Err(err);
            }
        };
        self.lock.engage(now);
        info!(from = %transition.from, to = %transition.to, chakra = transition.chakra_index, "phase transition");

        let current = (self.state.phase, self.state.current_chakra_index);
        let moved = current != previous;
        if moved {
            self.teardown_outgoing(previous.0, now);
        }
        self.apply_side_effects(&transition, now);
        self.events.push(Event::PhaseChanged {
            from: transition.from,
            to: transition.to,
            chakra_index: transition.chakra_index,
            at: now,
        });
        if moved {
            self.start_incoming();
        }
        self.sync_wake_lock();
        self.request_save();
        Ok(transition)
    }

    fn reject(&mut self, err: TransitionError, now: DateTime<Utc>) {
        debug!(phase = %self.state.phase, error = %err, "transition rejected");
        self.events.push(Event::TransitionRejected {
            phase: self.state.phase,
            reason: err.to_string(),
            at: now,
        });
    }

    fn teardown_outgoing(&mut self, outgoing: Phase, now: DateTime<Utc>) {
        let media = self.platform.media.as_mut();
        self.sequencer.teardown(media);
        if outgoing == Phase::Retention {
            self.retention_focus.stop(media);
        }
        self.timer.stop(now);
    }

    fn apply_side_effects(&mut self, t: &Transition, now: DateTime<Utc>) {
        match t.event {
            PhaseEvent::Acknowledge => {
                self.instructions.stop(self.platform.media.as_mut());
                self.clear_round();
            }
            PhaseEvent::LoginSucceeded | PhaseEvent::GuestStart | PhaseEvent::StartRound => {
                self.clear_round();
            }
            PhaseEvent::AudioSequenceComplete if t.to == Phase::Retention => {
                self.timer.reset();
                self.timer.start(now);
            }
            PhaseEvent::AudioSequenceComplete if t.to == Phase::Breathing => {
                self.timer.reset();
            }
            PhaseEvent::AudioSequenceComplete => {
                info!(total_secs = self.state.total_duration_secs, "round complete");
            }
            PhaseEvent::RetentionTap => {
                self.record_retention(t.chakra_index, now);
                self.timer.reset();
            }
            PhaseEvent::Continue(user_type) => {
                self.clear_round();
                match user_type {
                    UserType::User => self.request_stats(),
                    UserType::Guest => {
                        self.user = None;
                        self.stats = StatsView::default();
                    }
                }
            }
            PhaseEvent::Logout => {
                self.clear_round();
                self.user = None;
                self.stats = StatsView::default();
            }
            PhaseEvent::Reset => {
                self.instructions.stop(self.platform.media.as_mut());
                self.instructions.clear_error();
                self.clear_round();
                self.user = None;
                self.stats = StatsView::default();
            }
        }
    }

    fn clear_round(&mut self) {
        self.history.clear();
        self.timer.reset();
        self.save = SaveStatus::Idle;
    }

    /// Append the retention for `index`; a second append for the same
    /// index is a no-op.
    fn record_retention(&mut self, index: usize, now: DateTime<Utc>) {
        if self.history.len() > index {
            debug!(index, "retention already recorded");
            return;
        }
        let Some(stage) = round::stage(index) else {
            return;
        };
        let item = RetentionHistoryItem {
            chakra: stage.name.to_string(),
            time: self.timer.seconds(),
        };
        info!(chakra = %item.chakra, seconds = item.time, "retention recorded");
        self.events.push(Event::RetentionRecorded {
            chakra: item.chakra.clone(),
            seconds: item.time,
            at: now,
        });
        self.history.push(item);
    }

    fn start_incoming(&mut self) {
        let phase = self.state.phase;
        if phase != Phase::Disclaimer {
            self.instructions.stop(self.platform.media.as_mut());
            self.instructions.clear_error();
        }
        match phase {
            Phase::Breathing | Phase::Meditation => {
                let index = self.state.current_chakra_index;
                if let Some(progress) =
                    self.sequencer
                        .start(self.platform.media.as_mut(), phase, index)
                {
                    self.apply_progress(progress);
                }
            }
            Phase::Retention => self.retention_focus.start(self.platform.media.as_mut()),
            _ => {}
        }
    }

    fn apply_progress(&mut self, progress: SequenceProgress) {
        let now = self.now();
        match progress {
            SequenceProgress::Stale => {}
            SequenceProgress::Playing { position, source } => {
                self.events.push(Event::ClipStarted {
                    source,
                    position,
                    at: now,
                });
            }
            SequenceProgress::Stalled { source, .. } => {
                self.events.push(Event::AudioStalled { source, at: now });
            }
            SequenceProgress::Complete(epoch) => {
                self.events.push(Event::SequenceCompleted {
                    phase: epoch.phase,
                    chakra_index: epoch.chakra_index,
                    at: now,
                });
                self.try_complete_sequence();
            }
        }
    }

    /// Request "audio sequence complete" for a finished run that still
    /// belongs to the current phase. Inside the cooldown the request is
    /// left pending and retried from `tick`.
    fn try_complete_sequence(&mut self) {
        let Some(epoch) = self.sequencer.completed() else {
            return;
        };
        if epoch.phase != self.state.phase || epoch.chakra_index != self.state.current_chakra_index {
            debug!(generation = epoch.generation, "ignoring completion of a stale sequence");
            return;
        }
        if self.lock.is_locked(self.now()) {
            debug!("sequence complete during cooldown, deferring");
            return;
        }
        if let Err(err) = self.dispatch(PhaseEvent::AudioSequenceComplete) {
            warn!(error = %err, "sequence completion rejected");
        }
    }

    fn request_stats(&mut self) {
        let Some(user) = self.user.as_ref().filter(|u| u.is_registered()) else {
            return;
        };
        self.stats.loading = true;
        self.stats.error = None;
        self.outbox.push_back(Outbound::FetchStats {
            user_id: user.id.clone(),
        });
    }

    fn sync_wake_lock(&mut self) {
        let should_hold = self.should_keep_screen_awake();
        let change = self
            .wake_lock
            .sync(self.platform.wake_lock.as_mut(), should_hold);
        self.emit_wake_lock(change);
    }

    fn emit_wake_lock(&mut self, change: WakeLockChange) {
        if change != WakeLockChange::Unchanged {
            let at = self.now();
            self.events.push(Event::WakeLock { change, at });
        }
    }

    fn emit_instructions(&mut self) {
        let at = self.now();
        self.events.push(Event::InstructionsToggled {
            playing: self.instructions.is_playing(),
            error: self.instructions.error().map(str::to_string),
            at,
        });
    }
}
