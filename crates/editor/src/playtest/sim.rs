use std::collections::HashMap;

use crate::scene::{ObjectId, SceneStore, Vec3};

/// Per-object velocity accumulators for the gravity integration. Velocities
/// live outside `GameObject` and are never persisted; stopping play mode
/// discards them, so resuming always restarts from zero.
#[derive(Debug, Default)]
pub struct Simulation {
    velocities: HashMap<ObjectId, Vec3>,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// One fixed-timestep gravity tick. Only player objects with physics and
    /// gravity enabled are integrated; every other kind is exempt regardless
    /// of its flags. Positions are written back into the store in place.
    pub fn step(&mut self, store: &mut SceneStore, dt: f32) {
        let gravity = store.settings().gravity;
        let eligible: Vec<ObjectId> = store
            .objects()
            .iter()
            .filter(|object| object.is_gravity_bound())
            .map(|object| object.id.clone())
            .collect();

        for id in eligible {
            let velocity = self.velocities.entry(id.clone()).or_insert(Vec3::ZERO);
            velocity.y -= gravity * dt;
            let Some(object) = store.object_mut(&id) else {
                continue;
            };
            object.position.y += velocity.y * dt;
            if object.position.y < 0.0 {
                object.position.y = 0.0;
                velocity.y = 0.0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.velocities.clear();
    }

    pub fn velocity(&self, id: &ObjectId) -> Option<Vec3> {
        self.velocities.get(id).copied()
    }
}
