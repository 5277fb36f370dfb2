//! Bubble Trouble headless demo
//!
//! Seeds an in-memory feed, runs a few seconds of frames at 60 Hz and prints
//! the final bubble field as JSON. Optional first argument: settings file.

use bubble_trouble::creation::{BubbleCreator, CreateBubbleRequest, CreatedBubble, RollbackPolicy};
use bubble_trouble::feed::{InMemoryFeed, RawBubbleRecord};
use bubble_trouble::platform::{Clock, SystemClock};
use bubble_trouble::session::NoNavigation;
use bubble_trouble::sim::SeededRandom;
use bubble_trouble::{CreateError, EngineSettings, Session};

const FRAME_DT: f32 = 1.0 / 60.0;
const DEMO_SECS: u32 = 5;
const HOUR: i64 = 60 * 60 * 1000;

/// Creator that accepts everything and assigns sequential server ids
struct DemoCreator {
    next: u32,
}

impl BubbleCreator for DemoCreator {
    fn create(&mut self, _request: &CreateBubbleRequest) -> Result<CreatedBubble, CreateError> {
        self.next += 1;
        Ok(CreatedBubble {
            id: format!("srv-{}", self.next),
            reflection_count: 0,
        })
    }
}

fn load_settings() -> EngineSettings {
    match std::env::args().nth(1) {
        Some(path) => EngineSettings::load(&path).unwrap_or_else(|err| {
            log::warn!("Falling back to default settings: {}", err);
            EngineSettings::default()
        }),
        None => EngineSettings::default(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bubble Trouble (headless) starting...");

    let settings = load_settings();
    let now = SystemClock.now_ms();
    let feed = InMemoryFeed::with_rows(vec![
        RawBubbleRecord::new("filosofia", "Filosofia", 3, now - 5 * HOUR),
        RawBubbleRecord::new("musica", "Musica", 7, now - 2 * HOUR),
        RawBubbleRecord::new("arte", "Arte", 0, now - HOUR),
        RawBubbleRecord::new("ieri", "Ieri", 1, now - 30 * HOUR),
    ]);

    let (mut session, errors) = Session::open(
        feed,
        settings,
        Box::new(SystemClock),
        Box::new(SeededRandom::new(2024)),
        Box::new(NoNavigation),
    );
    for err in &errors {
        log::warn!("{}", err);
    }

    let mut creator = DemoCreator { next: 0 };
    let frames = DEMO_SECS * 60;
    for frame in 0..frames {
        if frame == 30 {
            match CreateBubbleRequest::new("Tecnologia", Some("Tecnologia"), None) {
                Ok(request) => {
                    if let Err(err) = session.create_bubble(&mut creator, &request, RollbackPolicy::Keep) {
                        log::warn!("{}", err);
                    }
                }
                Err(err) => log::warn!("{}", err),
            }
        }
        if frame == 60 {
            session
                .feed_mut()
                .publish(RawBubbleRecord::new("srv-1", "Tecnologia", 0, SystemClock.now_ms()));
        }
        if frame == 90 {
            if let Err(err) = session.reflect("arte") {
                log::warn!("{}", err);
            }
        }
        for event in session.frame(FRAME_DT) {
            log::debug!("{:?}", event);
        }
    }

    if let Some(leader) = session.top_bubbles().leader() {
        log::info!("Top bubble: {} ({} reflections)", leader.label, leader.reflection_count);
    }
    match serde_json::to_string_pretty(&session.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Could not encode snapshot: {}", err),
    }
    session.close();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host app on the web; nothing to run here
}
