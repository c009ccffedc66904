use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};

use crate::scene::{Animation, GameObject, ObjectId, ObjectKind, PhysicsBody, Vec3};

/// Fixed artificial delay of the placeholder generator.
const GENERATION_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorPhase {
    Idle,
    Generating,
}

#[derive(Debug, Clone)]
struct PendingPrompt {
    prompt: String,
    deadline: Instant,
}

/// The "AI character generator": a two-state task that waits out a fixed
/// delay and then fabricates an object with randomized fields. There is no
/// model behind it. Callers poll it from their loop and must `cancel` on
/// teardown so no pending prompt outlives its owner.
#[derive(Debug)]
pub struct PromptGenerator {
    delay: Duration,
    pending: Option<PendingPrompt>,
    last_issued_ms: i64,
}

impl Default for PromptGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptGenerator {
    pub fn new() -> Self {
        Self::with_delay(GENERATION_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            last_issued_ms: 0,
        }
    }

    pub fn phase(&self) -> GeneratorPhase {
        if self.pending.is_some() {
            GeneratorPhase::Generating
        } else {
            GeneratorPhase::Idle
        }
    }

    /// Arms the task. Returns `false` without state change for a blank
    /// prompt or while a generation is already in flight.
    pub fn begin(&mut self, prompt: &str, now: Instant) -> bool {
        let trimmed = prompt.trim();
        if trimmed.is_empty() || self.pending.is_some() {
            return false;
        }
        info!(prompt = trimmed, "generation_started");
        self.pending = Some(PendingPrompt {
            prompt: trimmed.to_string(),
            deadline: now + self.delay,
        });
        true
    }

    /// Returns the fabricated object once the delay has elapsed, dropping
    /// back to `Idle`. `None` while still waiting or when idle.
    pub fn poll(&mut self, now: Instant) -> Option<GameObject> {
        if now < self.pending.as_ref()?.deadline {
            return None;
        }
        let prompt = self.pending.take()?.prompt;
        let object = self.fabricate(&prompt);
        info!(prompt = prompt.as_str(), id = %object.id, "generation_finished");
        Some(object)
    }

    /// Drops any in-flight prompt. Idempotent; the mandatory teardown path.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            debug!("generation_cancelled");
        }
    }

    fn fabricate(&mut self, prompt: &str) -> GameObject {
        let mut rng = rand::thread_rng();
        // Monotonic id stamp so two fast generations never collide.
        let now_ms = Utc::now().timestamp_millis();
        self.last_issued_ms = now_ms.max(self.last_issued_ms + 1);

        GameObject {
            id: ObjectId::new(format!("ai_{}", self.last_issued_ms)),
            name: format!("AI {prompt}"),
            kind: ObjectKind::Player,
            position: Vec3::new(
                rng.gen_range(-2.0..=2.0),
                0.0,
                rng.gen_range(-2.0..=2.0),
            ),
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            color: format!("#{:06x}", rng.gen_range(0..0x100_0000)),
            physics: PhysicsBody {
                enabled: true,
                mass: 1.0,
                gravity: true,
                kinematic: false,
            },
            behaviors: ["move", "jump", "ai_behavior"]
                .into_iter()
                .map(str::to_string)
                .collect::<BTreeSet<String>>(),
            animation: Animation::default(),
            material: "ai_generated".to_string(),
            opacity: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_prompt_is_rejected() {
        let mut generator = PromptGenerator::new();
        assert!(!generator.begin("   ", Instant::now()));
        assert_eq!(generator.phase(), GeneratorPhase::Idle);
    }

    #[test]
    fn poll_waits_out_the_full_delay() {
        let mut generator = PromptGenerator::new();
        let start = Instant::now();
        assert!(generator.begin("a brave knight", start));
        assert_eq!(generator.phase(), GeneratorPhase::Generating);

        assert!(generator.poll(start + Duration::from_secs(1)).is_none());
        let object = generator
            .poll(start + Duration::from_secs(2))
            .expect("deadline elapsed");
        assert_eq!(generator.phase(), GeneratorPhase::Idle);
        assert_eq!(object.name, "AI a brave knight");
    }

    #[test]
    fn second_begin_while_generating_is_rejected() {
        let mut generator = PromptGenerator::new();
        let start = Instant::now();
        assert!(generator.begin("first", start));
        assert!(!generator.begin("second", start));

        let object = generator
            .poll(start + Duration::from_secs(2))
            .expect("object");
        assert_eq!(object.name, "AI first");
    }

    #[test]
    fn cancel_discards_the_pending_prompt() {
        let mut generator = PromptGenerator::new();
        let start = Instant::now();
        assert!(generator.begin("doomed", start));
        generator.cancel();
        generator.cancel(); // idempotent

        assert_eq!(generator.phase(), GeneratorPhase::Idle);
        assert!(generator.poll(start + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn fabricated_object_matches_the_placeholder_shape() {
        let mut generator = PromptGenerator::with_delay(Duration::ZERO);
        let start = Instant::now();
        assert!(generator.begin("robot", start));
        let object = generator.poll(start).expect("immediate");

        assert_eq!(object.kind, ObjectKind::Player);
        assert!(object.id.as_str().starts_with("ai_"));
        assert!((-2.0..=2.0).contains(&object.position.x));
        assert_eq!(object.position.y, 0.0);
        assert!((-2.0..=2.0).contains(&object.position.z));
        assert_eq!(object.color.len(), 7);
        assert!(object.color.starts_with('#'));
        assert!(object.physics.gravity);
        assert!(object.behaviors.contains("ai_behavior"));
        assert_eq!(object.material, "ai_generated");
    }

    #[test]
    fn consecutive_generations_get_distinct_ids() {
        let mut generator = PromptGenerator::with_delay(Duration::ZERO);
        let start = Instant::now();
        assert!(generator.begin("one", start));
        let first = generator.poll(start).expect("first");
        assert!(generator.begin("two", start));
        let second = generator.poll(start).expect("second");

        assert_ne!(first.id, second.id);
    }
}
