mod object;
mod store;

pub use object::{
    Animation, GameObject, ObjectId, ObjectKind, ObjectPatch, PhysicsBody, Settings, SettingsPatch,
    Vec3, ViewMode,
};
pub use store::{SceneStore, StoreError};
