//! Bubble field session
//!
//! One session per visible bubble screen: it owns the feed subscription and
//! the engine, drives them from the host's frame loop, and hands selections
//! to the navigation layer. Everything runs on the caller's thread; feed
//! inserts queue in a channel until the next frame drains them.

use crate::consts::MAX_FRAME_DT;
use crate::creation::{BubbleCreator, CreateBubbleRequest, CreatedBubble, RollbackPolicy};
use crate::error::{CreateError, FeedError, NotFoundError};
use crate::feed::{BubbleFeed, FeedAdapter};
use crate::leaderboard::TopBubbles;
use crate::platform::Clock;
use crate::render::RenderBubble;
use crate::settings::EngineSettings;
use crate::sim::{Bubble, Cadence, EngineEvent, OrbitEngine, RandomSource};

/// Navigation collaborator, told when a selected bubble's pulse has finished
pub trait Navigator {
    fn open_chat(&mut self, bubble_id: &str);
}

/// Navigator that ignores selections
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNavigation;

impl Navigator for NoNavigation {
    fn open_chat(&mut self, _bubble_id: &str) {}
}

/// Feed + engine + cadences for one screen
pub struct Session<F: BubbleFeed> {
    adapter: FeedAdapter<F>,
    engine: OrbitEngine,
    navigator: Box<dyn Navigator>,
    collisions: Cadence,
    expiry: Cadence,
    closed: bool,
}

impl<F: BubbleFeed> Session<F> {
    /// Subscribe, load the startup snapshot, and seed the engine
    ///
    /// Feed failures are non-fatal: the session starts with whatever loaded
    /// and the errors are returned for the caller to surface or retry.
    pub fn open(
        feed: F,
        settings: EngineSettings,
        clock: Box<dyn Clock>,
        random: Box<dyn RandomSource>,
        navigator: Box<dyn Navigator>,
    ) -> (Self, Vec<FeedError>) {
        let collisions = Cadence::new(settings.collision_interval_secs);
        let expiry = Cadence::new(settings.expiry_interval_secs);
        let adapter = FeedAdapter::new(feed, settings.ttl_ms);
        let engine = OrbitEngine::new(settings, clock, random);

        let mut session = Self {
            adapter,
            engine,
            navigator,
            collisions,
            expiry,
            closed: false,
        };

        let mut errors = Vec::new();
        // Subscribe before loading so inserts racing the snapshot are queued;
        // the engine absorbs the resulting duplicates.
        if let Err(err) = session.adapter.subscribe_inserts() {
            errors.push(err);
        }
        let now = session.engine.now_ms();
        match session.adapter.load_initial_snapshot(now) {
            Ok(records) => {
                session.engine.load_snapshot(records);
            }
            Err(err) => errors.push(err),
        }

        log::info!(
            "Bubble session open: {} bubbles, {} feed errors",
            session.engine.len(),
            errors.len()
        );
        (session, errors)
    }

    /// Run one frame: apply queued inserts, advance motion, run any due
    /// repulsion / expiry pass, and dispatch finished selections.
    pub fn frame(&mut self, dt: f32) -> Vec<EngineEvent> {
        if self.closed {
            return Vec::new();
        }
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };

        for row in self.adapter.drain() {
            self.engine.ingest_remote(&row);
        }

        self.engine.tick(dt);

        if self.collisions.advance(dt) {
            let pushed = self.engine.resolve_collisions();
            log::trace!("Collision pass: {} pairs", pushed);
        }
        if self.expiry.advance(dt) {
            let now = self.engine.now_ms();
            let expired = self.engine.expire_stale(now);
            log::trace!("Expiry sweep: {} removed", expired);
        }

        let events = self.engine.drain_events();
        for event in &events {
            if let EngineEvent::PulseCompleted { id } = event {
                self.navigator.open_chat(id);
            }
        }
        events
    }

    /// User tapped a bubble
    pub fn reflect(&mut self, id: &str) -> Result<Bubble, NotFoundError> {
        self.engine.reflect(id)
    }

    /// Insert the optimistic bubble for a create that is about to be sent
    pub fn begin_create(&mut self, request: &CreateBubbleRequest) -> Bubble {
        self.engine.add_local(&request.label, 0)
    }

    /// Reconcile the optimistic bubble with the create call's result
    pub fn finish_create(
        &mut self,
        local: Bubble,
        result: Result<CreatedBubble, CreateError>,
        policy: RollbackPolicy,
    ) -> Result<Bubble, CreateError> {
        match result {
            Ok(created) => {
                match self.engine.confirm_created(&local.id, &created.id, created.reflection_count) {
                    Ok(bubble) => Ok(bubble),
                    Err(err) => {
                        // Pending entry vanished (expired); the echo will bring it back
                        log::debug!("Create confirmed after local removal: {}", err);
                        Ok(local)
                    }
                }
            }
            Err(err) => {
                log::warn!("Bubble creation failed for {}: {}", local.id, err);
                if policy == RollbackPolicy::Discard {
                    self.engine.discard_pending(&local.id);
                }
                Err(err)
            }
        }
    }

    /// Optimistic create through a synchronous collaborator
    pub fn create_bubble(
        &mut self,
        creator: &mut dyn BubbleCreator,
        request: &CreateBubbleRequest,
        policy: RollbackPolicy,
    ) -> Result<Bubble, CreateError> {
        let local = self.begin_create(request);
        let result = creator.create(request);
        self.finish_create(local, result, policy)
    }

    /// Renderable positions for this frame
    pub fn snapshot(&self) -> Vec<RenderBubble> {
        self.engine.snapshot()
    }

    pub fn top_bubbles(&self) -> TopBubbles {
        self.engine.top_bubbles()
    }

    pub fn engine(&self) -> &OrbitEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut OrbitEngine {
        &mut self.engine
    }

    pub fn feed_mut(&mut self) -> &mut F {
        self.adapter.feed_mut()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Tear down: release the subscription and stop the cadences. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.adapter.unsubscribe();
        self.expiry.cancel();
        self.collisions.cancel();
        self.closed = true;
        log::info!("Bubble session closed ({} bubbles live)", self.engine.len());
    }
}

impl<F: BubbleFeed> Drop for Session<F> {
    fn drop(&mut self) {
        self.close();
    }
}
