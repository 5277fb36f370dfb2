//! Orbit simulation engine
//!
//! Owns the canonical set of live bubbles and is the only thing that mutates
//! it. Every operation is short and synchronous; callers on one logical
//! thread interleave them (feed drain, frame tick, repulsion, expiry sweep).

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use super::bubble::{Bubble, BubbleStatus};
use super::collision;
use super::rng::{RandomSource, SeededRandom};
use crate::error::NotFoundError;
use crate::feed::{BubbleRecord, RawBubbleRecord};
use crate::leaderboard::TopBubbles;
use crate::platform::Clock;
use crate::render::RenderBubble;
use crate::settings::EngineSettings;

/// Something observable that happened inside the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    Added { id: String, status: BubbleStatus },
    Confirmed { id: String },
    /// Pending bubble re-keyed to the id the server assigned
    Rekeyed { from: String, to: String },
    Discarded { id: String },
    Reflected { id: String, reflection_count: u32 },
    /// Glow pulse finished; the caller may now open the bubble's chat
    PulseCompleted { id: String },
    Expired { id: String },
}

/// What `ingest_remote` did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted,
    /// Matched a pending local bubble and confirmed it in place
    Promoted,
    Duplicate,
    Stale,
    Malformed,
}

/// Running counters, for logging and diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub inserted: u64,
    pub promoted: u64,
    pub duplicates: u64,
    pub stale: u64,
    pub dropped_malformed: u64,
    pub expired: u64,
}

/// The bubble lifecycle and orbital layout engine
pub struct OrbitEngine {
    settings: EngineSettings,
    /// Live bubbles in arrival order
    bubbles: Vec<Bubble>,
    clock: Box<dyn Clock>,
    random: Box<dyn RandomSource>,
    events: Vec<EngineEvent>,
    stats: EngineStats,
}

impl OrbitEngine {
    pub fn new(
        settings: EngineSettings,
        clock: Box<dyn Clock>,
        random: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            settings,
            bubbles: Vec::new(),
            clock,
            random,
            events: Vec::new(),
            stats: EngineStats::default(),
        }
    }

    /// Engine with PCG randomness from `seed`
    pub fn seeded(settings: EngineSettings, clock: Box<dyn Clock>, seed: u64) -> Self {
        Self::new(settings, clock, Box::new(SeededRandom::new(seed)))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn get(&self, id: &str) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Take every event recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.bubbles.iter().position(|b| b.id == id)
    }

    /// Place a new bubble on the orbit and append it to the live set.
    /// Radius is `base + live_count * step + jitter`.
    fn spawn(&mut self, id: String, label: String, count: u32, created_at_ms: i64, status: BubbleStatus) -> &Bubble {
        let s = &self.settings;
        let mut bubble = Bubble::new(id, label, count, created_at_ms, status);
        bubble.angle = self.random.range(0.0, TAU);
        bubble.angular_speed = self.random.range(s.min_angular_speed, s.max_angular_speed);
        let jitter = self.random.range(0.0, s.orbit_jitter);
        bubble.orbit_radius = (s.base_orbit + self.bubbles.len() as f32 * s.orbit_step + jitter)
            .max(s.min_orbit_radius);

        self.events.push(EngineEvent::Added {
            id: bubble.id.clone(),
            status,
        });
        self.bubbles.push(bubble);
        &self.bubbles[self.bubbles.len() - 1]
    }

    /// Fresh client-side id, unique within the live set
    fn generate_id(&mut self) -> String {
        loop {
            let id = uuid::Builder::from_random_bytes(self.random.next_bytes())
                .into_uuid()
                .to_string();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Optimistically create a `Pending` bubble with a generated id
    pub fn add_local(&mut self, label: &str, initial_reflection_count: u32) -> Bubble {
        let id = self.generate_id();
        self.add_local_with_id(&id, label, initial_reflection_count)
    }

    /// Optimistically create a `Pending` bubble with a caller-chosen id.
    /// If the id is already live the existing bubble is returned unchanged.
    pub fn add_local_with_id(&mut self, id: &str, label: &str, initial_reflection_count: u32) -> Bubble {
        if let Some(existing) = self.get(id) {
            log::debug!("add_local: bubble {} already live", id);
            return existing.clone();
        }
        let now = self.clock.now_ms();
        let bubble = self
            .spawn(
                id.to_string(),
                label.to_string(),
                initial_reflection_count,
                now,
                BubbleStatus::Pending,
            )
            .clone();
        log::debug!("Added pending bubble {} ({})", bubble.id, bubble.label);
        bubble
    }

    /// Normalize and apply one feed-delivered row
    pub fn ingest_remote(&mut self, raw: &RawBubbleRecord) -> IngestOutcome {
        match raw.normalize() {
            Ok(record) => self.ingest_record(record),
            Err(err) => {
                self.stats.dropped_malformed += 1;
                log::warn!("Dropped malformed bubble record: {}", err);
                IngestOutcome::Malformed
            }
        }
    }

    /// Apply one validated row
    ///
    /// Stale rows and rows for already-confirmed ids are ignored. A row
    /// matching a pending bubble confirms it without touching its position.
    pub fn ingest_record(&mut self, record: BubbleRecord) -> IngestOutcome {
        let now = self.clock.now_ms();
        if !record.is_live(now, self.settings.ttl_ms) {
            self.stats.stale += 1;
            log::debug!("Ignored stale bubble {}", record.id);
            return IngestOutcome::Stale;
        }

        if let Some(idx) = self.index_of(&record.id) {
            let bubble = &mut self.bubbles[idx];
            if bubble.status == BubbleStatus::Confirmed {
                self.stats.duplicates += 1;
                return IngestOutcome::Duplicate;
            }
            bubble.status = BubbleStatus::Confirmed;
            bubble.reflection_count = bubble.reflection_count.max(record.reflection_count);
            self.stats.promoted += 1;
            self.events.push(EngineEvent::Confirmed { id: record.id.clone() });
            log::debug!("Confirmed pending bubble {}", record.id);
            return IngestOutcome::Promoted;
        }

        self.spawn(
            record.id,
            record.label,
            record.reflection_count,
            record.created_at_ms,
            BubbleStatus::Confirmed,
        );
        self.stats.inserted += 1;
        IngestOutcome::Inserted
    }

    /// Seed from an ordered startup snapshot (oldest first)
    pub fn load_snapshot(&mut self, records: Vec<BubbleRecord>) -> usize {
        let mut inserted = 0;
        for record in records {
            if self.ingest_record(record) == IngestOutcome::Inserted {
                inserted += 1;
            }
        }
        log::info!("Seeded engine with {} bubbles", inserted);
        inserted
    }

    /// Reconcile a pending bubble with the server's create response
    ///
    /// The pending entry is re-keyed to `server_id`. If the feed echo for
    /// `server_id` already arrived, that bubble wins and the pending
    /// duplicate is dropped.
    pub fn confirm_created(
        &mut self,
        local_id: &str,
        server_id: &str,
        reflection_count: u32,
    ) -> Result<Bubble, NotFoundError> {
        let idx = self.index_of(local_id).ok_or_else(|| NotFoundError::new(local_id))?;
        if local_id == server_id {
            let bubble = &mut self.bubbles[idx];
            bubble.reflection_count = bubble.reflection_count.max(reflection_count);
            return Ok(bubble.clone());
        }

        if let Some(echo) = self.index_of(server_id) {
            let echoed = self.bubbles[echo].clone();
            self.bubbles.remove(idx);
            self.events.push(EngineEvent::Discarded { id: local_id.to_string() });
            log::debug!("Pending {} superseded by echoed {}", local_id, server_id);
            return Ok(echoed);
        }

        let bubble = &mut self.bubbles[idx];
        bubble.id = server_id.to_string();
        bubble.reflection_count = bubble.reflection_count.max(reflection_count);
        let bubble = bubble.clone();
        self.events.push(EngineEvent::Rekeyed {
            from: local_id.to_string(),
            to: server_id.to_string(),
        });
        Ok(bubble)
    }

    /// Roll back a pending bubble. Confirmed bubbles are never removed this way.
    pub fn discard_pending(&mut self, id: &str) -> Option<Bubble> {
        let idx = self.index_of(id)?;
        if self.bubbles[idx].status != BubbleStatus::Pending {
            return None;
        }
        let removed = self.bubbles.remove(idx);
        self.events.push(EngineEvent::Discarded { id: removed.id.clone() });
        log::debug!("Discarded pending bubble {}", removed.id);
        Some(removed)
    }

    /// Advance every bubble by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("Ignoring invalid tick delta {}", dt);
            return;
        }
        for bubble in &mut self.bubbles {
            if bubble.advance(dt, &self.settings) {
                self.events.push(EngineEvent::PulseCompleted { id: bubble.id.clone() });
            }
        }
    }

    /// One repulsion pass. Returns the number of pairs pushed apart.
    pub fn resolve_collisions(&mut self) -> usize {
        collision::resolve_collisions(&mut self.bubbles, &self.settings)
    }

    /// Count a reflection on `id` and start its glow pulse
    pub fn reflect(&mut self, id: &str) -> Result<Bubble, NotFoundError> {
        let idx = self.index_of(id).ok_or_else(|| NotFoundError::new(id))?;
        let bubble = &mut self.bubbles[idx];
        bubble.reflect();
        self.events.push(EngineEvent::Reflected {
            id: bubble.id.clone(),
            reflection_count: bubble.reflection_count,
        });
        Ok(bubble.clone())
    }

    /// Remove every bubble with `now - created_at > ttl`. Returns how many.
    pub fn expire_stale(&mut self, now_ms: i64) -> usize {
        let ttl = self.settings.ttl_ms;
        let before = self.bubbles.len();
        let events = &mut self.events;
        self.bubbles.retain(|b| {
            let live = b.is_live(now_ms, ttl);
            if !live {
                events.push(EngineEvent::Expired { id: b.id.clone() });
            }
            live
        });
        let removed = before - self.bubbles.len();
        if removed > 0 {
            self.stats.expired += removed as u64;
            log::debug!("Expired {} bubbles", removed);
        }
        removed
    }

    /// Renderable projection of the live set, in arrival order
    pub fn snapshot(&self) -> Vec<RenderBubble> {
        self.bubbles
            .iter()
            .map(|b| RenderBubble::from_bubble(b, &self.settings))
            .collect()
    }

    /// Most-reflected live bubbles
    pub fn top_bubbles(&self) -> TopBubbles {
        TopBubbles::rank(&self.bubbles)
    }
}
