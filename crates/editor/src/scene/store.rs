use thiserror::Error;
use tracing::{debug, info};

use crate::templates::{Template, TemplateId};

use super::{GameObject, ObjectId, ObjectPatch, Settings, SettingsPatch, ViewMode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("object id '{0}' is already present in the scene")]
    DuplicateId(ObjectId),
}

/// Single source of truth for the scene. All mutation goes through the
/// methods below; the play-test loop is the only other writer and touches
/// nothing but positions of gravity-bound objects.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStore {
    current_template: Option<TemplateId>,
    selected: Option<ObjectId>,
    playing: bool,
    view_mode: ViewMode,
    objects: Vec<GameObject>,
    settings: Settings,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self {
            current_template: None,
            selected: None,
            playing: false,
            view_mode: ViewMode::ThreeD,
            objects: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn current_template(&self) -> Option<&TemplateId> {
        self.current_template.as_ref()
    }

    pub fn selected_id(&self) -> Option<&ObjectId> {
        self.selected.as_ref()
    }

    /// Live view of the selected object, if any. The selection is stored by
    /// id, so it always reflects the latest state of the object list.
    pub fn selected_object(&self) -> Option<&GameObject> {
        let selected = self.selected.as_ref()?;
        self.objects.iter().find(|object| &object.id == selected)
    }

    pub fn find_object(&self, id: &ObjectId) -> Option<&GameObject> {
        self.objects.iter().find(|object| &object.id == id)
    }

    pub fn add_object(&mut self, object: GameObject) -> Result<(), StoreError> {
        if self.contains(&object.id) {
            return Err(StoreError::DuplicateId(object.id));
        }
        debug!(id = %object.id, kind = object.kind.as_token(), "object_added");
        self.objects.push(object);
        Ok(())
    }

    /// Selects the object with the matching id. Selection simply clears when
    /// the id is absent; this is not an error.
    pub fn select_object(&mut self, id: &ObjectId) {
        self.selected = self.contains(id).then(|| id.clone());
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Shallow merge of `patch` into the matching object. Returns `false`
    /// (leaving the store untouched) when the id is absent.
    pub fn update_object(&mut self, id: &ObjectId, patch: &ObjectPatch) -> bool {
        let Some(object) = self.objects.iter_mut().find(|object| &object.id == id) else {
            return false;
        };
        patch.apply_to(object);
        true
    }

    pub fn delete_object(&mut self, id: &ObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|object| &object.id != id);
        let removed = self.objects.len() != before;
        if removed {
            debug!(id = %id, "object_deleted");
            if self.selected.as_ref() == Some(id) {
                self.selected = None;
            }
        }
        removed
    }

    /// Replaces the object list and settings with fresh copies of the
    /// template contents. A selection whose id does not survive into the new
    /// object list is cleared rather than left dangling.
    pub fn load_template(&mut self, template: &Template) {
        self.objects = template.objects.clone();
        self.settings = template.settings.clone();
        self.current_template = Some(template.id.clone());
        if let Some(selected) = self.selected.clone() {
            if !self.contains(&selected) {
                self.selected = None;
            }
        }
        info!(
            template = template.id.as_str(),
            object_count = self.objects.len(),
            "template_loaded"
        );
    }

    pub fn toggle_play_mode(&mut self) -> bool {
        self.playing = !self.playing;
        info!(playing = self.playing, "play_mode_toggled");
        self.playing
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) {
        patch.apply_to(&mut self.settings);
    }

    /// Restores a previously saved scene wholesale. Used by the persistence
    /// layer; the same dangling-selection rule as `load_template` applies.
    pub fn restore(
        &mut self,
        objects: Vec<GameObject>,
        settings: Settings,
        template: Option<TemplateId>,
    ) {
        self.objects = objects;
        self.settings = settings;
        self.current_template = template;
        if let Some(selected) = self.selected.clone() {
            if !self.contains(&selected) {
                self.selected = None;
            }
        }
    }

    pub(crate) fn object_mut(&mut self, id: &ObjectId) -> Option<&mut GameObject> {
        self.objects.iter_mut().find(|object| &object.id == id)
    }

    fn contains(&self, id: &ObjectId) -> bool {
        self.objects.iter().any(|object| &object.id == id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::scene::{Animation, ObjectKind, PhysicsBody, Vec3};
    use crate::templates::catalog;

    fn object(id: &str, kind: ObjectKind) -> GameObject {
        GameObject {
            id: ObjectId::new(id),
            name: id.to_string(),
            kind,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            color: "#ff4444".to_string(),
            physics: PhysicsBody::default(),
            behaviors: BTreeSet::new(),
            animation: Animation::default(),
            material: "default".to_string(),
            opacity: 100,
        }
    }

    #[test]
    fn add_then_delete_leaves_exactly_the_surviving_objects() {
        let mut store = SceneStore::new();
        store.add_object(object("a", ObjectKind::Player)).unwrap();
        store.add_object(object("b", ObjectKind::Enemy)).unwrap();
        store
            .add_object(object("c", ObjectKind::Collectible))
            .unwrap();
        assert!(store.delete_object(&ObjectId::new("b")));

        let ids: Vec<&str> = store.objects().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut store = SceneStore::new();
        store.add_object(object("a", ObjectKind::Player)).unwrap();
        let err = store
            .add_object(object("a", ObjectKind::Enemy))
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(ObjectId::new("a")));
        assert_eq!(store.objects().len(), 1);
        assert_eq!(store.objects()[0].kind, ObjectKind::Player);
    }

    #[test]
    fn select_then_delete_clears_selection() {
        let mut store = SceneStore::new();
        store.add_object(object("a", ObjectKind::Player)).unwrap();
        store.select_object(&ObjectId::new("a"));
        assert!(store.selected_object().is_some());

        store.delete_object(&ObjectId::new("a"));
        assert!(store.selected_object().is_none());
        assert!(store.selected_id().is_none());
    }

    #[test]
    fn selecting_unknown_id_clears_selection_without_error() {
        let mut store = SceneStore::new();
        store.add_object(object("a", ObjectKind::Player)).unwrap();
        store.select_object(&ObjectId::new("a"));
        store.select_object(&ObjectId::new("missing"));
        assert!(store.selected_id().is_none());
    }

    #[test]
    fn update_patches_only_named_fields() {
        let mut store = SceneStore::new();
        let mut obj = object("a", ObjectKind::Player);
        obj.opacity = 100;
        obj.color = "#123456".to_string();
        store.add_object(obj).unwrap();

        let patch = ObjectPatch {
            opacity: Some(50),
            ..ObjectPatch::default()
        };
        assert!(store.update_object(&ObjectId::new("a"), &patch));

        let updated = store.find_object(&ObjectId::new("a")).unwrap();
        assert_eq!(updated.opacity, 50);
        assert_eq!(updated.color, "#123456");
        assert_eq!(updated.name, "a");
    }

    #[test]
    fn update_with_unknown_id_leaves_store_unchanged() {
        let mut store = SceneStore::new();
        store.add_object(object("a", ObjectKind::Player)).unwrap();
        let snapshot = store.clone();

        let patch = ObjectPatch {
            opacity: Some(50),
            ..ObjectPatch::default()
        };
        assert!(!store.update_object(&ObjectId::new("missing"), &patch));
        assert_eq!(store, snapshot);
    }

    #[test]
    fn selection_view_reflects_latest_update() {
        let mut store = SceneStore::new();
        store.add_object(object("a", ObjectKind::Player)).unwrap();
        store.select_object(&ObjectId::new("a"));

        let patch = ObjectPatch {
            name: Some("renamed".to_string()),
            ..ObjectPatch::default()
        };
        store.update_object(&ObjectId::new("a"), &patch);
        assert_eq!(store.selected_object().unwrap().name, "renamed");
    }

    #[test]
    fn load_template_copies_objects_and_settings() {
        let template = &catalog()[0];
        let mut store = SceneStore::new();
        store.load_template(template);

        assert_eq!(store.objects(), template.objects.as_slice());
        assert_eq!(store.settings(), &template.settings);
        assert_eq!(store.current_template(), Some(&template.id));

        // Mutating the store must not reach back into the catalog.
        let first_id = store.objects()[0].id.clone();
        let patch = ObjectPatch {
            name: Some("mutated".to_string()),
            ..ObjectPatch::default()
        };
        store.update_object(&first_id, &patch);
        assert_ne!(store.objects()[0].name, template.objects[0].name);
    }

    #[test]
    fn load_template_clears_selection_when_id_does_not_survive() {
        let mut store = SceneStore::new();
        store
            .add_object(object("transient", ObjectKind::Enemy))
            .unwrap();
        store.select_object(&ObjectId::new("transient"));

        store.load_template(&catalog()[0]);
        assert!(store.selected_id().is_none());
    }

    #[test]
    fn load_template_keeps_selection_when_id_persists() {
        let template = &catalog()[0];
        let shared_id = template.objects[0].id.clone();

        let mut store = SceneStore::new();
        let mut obj = object(shared_id.as_str(), ObjectKind::Player);
        obj.id = shared_id.clone();
        store.add_object(obj).unwrap();
        store.select_object(&shared_id);

        store.load_template(template);
        assert_eq!(store.selected_id(), Some(&shared_id));
    }

    #[test]
    fn toggle_play_mode_twice_is_identity_for_flag_and_objects() {
        let mut store = SceneStore::new();
        store.add_object(object("a", ObjectKind::Player)).unwrap();
        let objects_before = store.objects().to_vec();

        assert!(store.toggle_play_mode());
        assert!(!store.toggle_play_mode());
        assert!(!store.is_playing());
        assert_eq!(store.objects(), objects_before.as_slice());
    }

    #[test]
    fn update_settings_merges_shallowly() {
        let mut store = SceneStore::new();
        let patch = SettingsPatch {
            gravity: Some(15.0),
            ..SettingsPatch::default()
        };
        store.update_settings(&patch);

        assert_eq!(store.settings().gravity, 15.0);
        assert_eq!(store.settings().background_color, "#000000");
    }

    #[test]
    fn default_store_starts_empty_and_stopped() {
        let store = SceneStore::new();
        assert!(store.objects().is_empty());
        assert!(!store.is_playing());
        assert_eq!(store.view_mode(), ViewMode::ThreeD);
        assert!(store.current_template().is_none());
        assert_eq!(store.settings().camera_position, Vec3::new(0.0, 5.0, 10.0));
    }
}
