use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::scene::{Animation, GameObject, ObjectId, ObjectKind, PhysicsBody, Settings, Vec3};

use super::{Dimension, Template, TemplateId};

/// Default-filled preset object. Players and enemies get gravity enabled;
/// platforms, collectibles and backgrounds do not. Players start with the
/// basic movement behaviors.
fn preset_object(
    id: &str,
    name: &str,
    kind: ObjectKind,
    position: Vec3,
    color: &str,
) -> GameObject {
    let gravity = matches!(kind, ObjectKind::Player | ObjectKind::Enemy);
    let behaviors: BTreeSet<String> = if kind == ObjectKind::Player {
        ["jump", "move", "collect"]
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        BTreeSet::new()
    };

    GameObject {
        id: ObjectId::new(id),
        name: name.to_string(),
        kind,
        position,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
        color: color.to_string(),
        physics: PhysicsBody {
            enabled: true,
            mass: 1.0,
            gravity,
            kinematic: false,
        },
        behaviors,
        animation: Animation::default(),
        material: "default".to_string(),
        opacity: 100,
    }
}

fn settings(gravity: f32, background_color: &str, camera_position: Vec3) -> Settings {
    Settings {
        gravity,
        background_color: background_color.to_string(),
        camera_position,
    }
}

fn template(
    id: &str,
    name: &str,
    dimension: Dimension,
    description: &str,
    objects: Vec<GameObject>,
    settings: Settings,
) -> Template {
    Template {
        id: TemplateId::new(id),
        name: name.to_string(),
        dimension,
        description: description.to_string(),
        objects,
        settings,
    }
}

/// The fixed preset list. Built once and never mutated at runtime.
pub fn catalog() -> &'static [Template] {
    static CATALOG: OnceLock<Vec<Template>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

pub fn find_template(id: &str) -> Option<&'static Template> {
    catalog()
        .iter()
        .find(|template| template.id.as_str() == id)
}

fn build_catalog() -> Vec<Template> {
    vec![
        template(
            "shooting",
            "Shooting Game",
            Dimension::ThreeD,
            "First-person shooter with enemies and weapons",
            vec![
                preset_object(
                    "player1",
                    "Player",
                    ObjectKind::Player,
                    Vec3::new(0.0, 0.0, 0.0),
                    "#00ff00",
                ),
                preset_object(
                    "enemy1",
                    "Enemy 1",
                    ObjectKind::Enemy,
                    Vec3::new(5.0, 0.0, 0.0),
                    "#ff0000",
                ),
                preset_object(
                    "enemy2",
                    "Enemy 2",
                    ObjectKind::Enemy,
                    Vec3::new(-5.0, 0.0, 0.0),
                    "#ff0000",
                ),
                preset_object(
                    "platform1",
                    "Ground",
                    ObjectKind::Platform,
                    Vec3::new(0.0, -2.0, 0.0),
                    "#666666",
                ),
            ],
            settings(9.8, "#001122", Vec3::new(0.0, 2.0, 8.0)),
        ),
        template(
            "running",
            "Running Game",
            Dimension::TwoDThreeD,
            "Endless runner with obstacles and collectibles",
            vec![
                preset_object(
                    "player1",
                    "Runner",
                    ObjectKind::Player,
                    Vec3::new(-3.0, 0.0, 0.0),
                    "#00ff00",
                ),
                preset_object(
                    "collectible1",
                    "Coin 1",
                    ObjectKind::Collectible,
                    Vec3::new(2.0, 1.0, 0.0),
                    "#ffff00",
                ),
                preset_object(
                    "collectible2",
                    "Coin 2",
                    ObjectKind::Collectible,
                    Vec3::new(5.0, 2.0, 0.0),
                    "#ffff00",
                ),
                preset_object(
                    "platform1",
                    "Ground",
                    ObjectKind::Platform,
                    Vec3::new(0.0, -2.0, 0.0),
                    "#666666",
                ),
                preset_object(
                    "platform2",
                    "Platform 1",
                    ObjectKind::Platform,
                    Vec3::new(3.0, 0.0, 0.0),
                    "#888888",
                ),
            ],
            settings(12.0, "#87CEEB", Vec3::new(0.0, 2.0, 8.0)),
        ),
        template(
            "flying",
            "Flying Game",
            Dimension::ThreeD,
            "Fly through obstacles and collect items",
            vec![
                preset_object(
                    "player1",
                    "Bird",
                    ObjectKind::Player,
                    Vec3::new(0.0, 0.0, 0.0),
                    "#00ffff",
                ),
                preset_object(
                    "collectible1",
                    "Star 1",
                    ObjectKind::Collectible,
                    Vec3::new(3.0, 2.0, 0.0),
                    "#ffff00",
                ),
                preset_object(
                    "collectible2",
                    "Star 2",
                    ObjectKind::Collectible,
                    Vec3::new(-2.0, -1.0, 0.0),
                    "#ffff00",
                ),
                preset_object(
                    "enemy1",
                    "Obstacle",
                    ObjectKind::Enemy,
                    Vec3::new(5.0, 0.0, 0.0),
                    "#ff0000",
                ),
            ],
            settings(5.0, "#87CEEB", Vec3::new(0.0, 0.0, 10.0)),
        ),
        template(
            "flappy",
            "Flappy Bird",
            Dimension::TwoD,
            "Classic flappy bird mechanics",
            vec![
                preset_object(
                    "player1",
                    "Bird",
                    ObjectKind::Player,
                    Vec3::new(-2.0, 0.0, 0.0),
                    "#ffff00",
                ),
                preset_object(
                    "enemy1",
                    "Pipe Top",
                    ObjectKind::Enemy,
                    Vec3::new(3.0, 3.0, 0.0),
                    "#00ff00",
                ),
                preset_object(
                    "enemy2",
                    "Pipe Bottom",
                    ObjectKind::Enemy,
                    Vec3::new(3.0, -3.0, 0.0),
                    "#00ff00",
                ),
                preset_object(
                    "collectible1",
                    "Point",
                    ObjectKind::Collectible,
                    Vec3::new(3.0, 0.0, 0.0),
                    "#ffffff",
                ),
            ],
            settings(15.0, "#87CEEB", Vec3::new(0.0, 0.0, 8.0)),
        ),
        template(
            "speedrunner",
            "Speed Runner",
            Dimension::TwoDThreeD,
            "Fast-paced platformer with time challenges",
            vec![
                preset_object(
                    "player1",
                    "Speed Runner",
                    ObjectKind::Player,
                    Vec3::new(-4.0, 0.0, 0.0),
                    "#ff00ff",
                ),
                preset_object(
                    "platform1",
                    "Start Platform",
                    ObjectKind::Platform,
                    Vec3::new(-4.0, -1.0, 0.0),
                    "#666666",
                ),
                preset_object(
                    "platform2",
                    "Jump Platform",
                    ObjectKind::Platform,
                    Vec3::new(0.0, 1.0, 0.0),
                    "#888888",
                ),
                preset_object(
                    "platform3",
                    "End Platform",
                    ObjectKind::Platform,
                    Vec3::new(4.0, 0.0, 0.0),
                    "#666666",
                ),
                preset_object(
                    "collectible1",
                    "Speed Boost",
                    ObjectKind::Collectible,
                    Vec3::new(0.0, 2.0, 0.0),
                    "#00ffff",
                ),
            ],
            settings(10.0, "#2a0845", Vec3::new(0.0, 2.0, 8.0)),
        ),
        template(
            "whackamole",
            "Whack-the-Mole",
            Dimension::TwoDThreeD,
            "Click the moles as they pop up",
            vec![
                preset_object(
                    "enemy1",
                    "Mole 1",
                    ObjectKind::Enemy,
                    Vec3::new(-2.0, 0.0, 0.0),
                    "#8B4513",
                ),
                preset_object(
                    "enemy2",
                    "Mole 2",
                    ObjectKind::Enemy,
                    Vec3::new(0.0, 0.0, 0.0),
                    "#8B4513",
                ),
                preset_object(
                    "enemy3",
                    "Mole 3",
                    ObjectKind::Enemy,
                    Vec3::new(2.0, 0.0, 0.0),
                    "#8B4513",
                ),
                preset_object(
                    "platform1",
                    "Ground",
                    ObjectKind::Platform,
                    Vec3::new(0.0, -1.0, 0.0),
                    "#228B22",
                ),
            ],
            settings(0.0, "#228B22", Vec3::new(0.0, 2.0, 6.0)),
        ),
        template(
            "match3",
            "Match-3",
            Dimension::TwoD,
            "Match three or more gems in a row",
            vec![
                preset_object(
                    "collectible1",
                    "Red Gem",
                    ObjectKind::Collectible,
                    Vec3::new(-1.0, 1.0, 0.0),
                    "#ff0000",
                ),
                preset_object(
                    "collectible2",
                    "Blue Gem",
                    ObjectKind::Collectible,
                    Vec3::new(0.0, 1.0, 0.0),
                    "#0000ff",
                ),
                preset_object(
                    "collectible3",
                    "Green Gem",
                    ObjectKind::Collectible,
                    Vec3::new(1.0, 1.0, 0.0),
                    "#00ff00",
                ),
                preset_object(
                    "collectible4",
                    "Red Gem 2",
                    ObjectKind::Collectible,
                    Vec3::new(-1.0, 0.0, 0.0),
                    "#ff0000",
                ),
                preset_object(
                    "collectible5",
                    "Yellow Gem",
                    ObjectKind::Collectible,
                    Vec3::new(0.0, 0.0, 0.0),
                    "#ffff00",
                ),
                preset_object(
                    "collectible6",
                    "Purple Gem",
                    ObjectKind::Collectible,
                    Vec3::new(1.0, 0.0, 0.0),
                    "#ff00ff",
                ),
            ],
            settings(0.0, "#4a0e4e", Vec3::new(0.0, 0.0, 5.0)),
        ),
        template(
            "crossyroad",
            "Crossy Road",
            Dimension::ThreeD,
            "Cross the road avoiding cars",
            vec![
                preset_object(
                    "player1",
                    "Chicken",
                    ObjectKind::Player,
                    Vec3::new(0.0, 0.0, -3.0),
                    "#ffff00",
                ),
                preset_object(
                    "enemy1",
                    "Car 1",
                    ObjectKind::Enemy,
                    Vec3::new(-3.0, 0.0, 0.0),
                    "#ff0000",
                ),
                preset_object(
                    "enemy2",
                    "Car 2",
                    ObjectKind::Enemy,
                    Vec3::new(3.0, 0.0, 2.0),
                    "#0000ff",
                ),
                preset_object(
                    "platform1",
                    "Road",
                    ObjectKind::Platform,
                    Vec3::new(0.0, -0.5, 0.0),
                    "#333333",
                ),
                preset_object(
                    "collectible1",
                    "Coin",
                    ObjectKind::Collectible,
                    Vec3::new(0.0, 0.0, 3.0),
                    "#ffff00",
                ),
            ],
            settings(9.8, "#87CEEB", Vec3::new(0.0, 5.0, 5.0)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_has_the_eight_presets_with_unique_ids() {
        let ids: Vec<&str> = catalog().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "shooting",
                "running",
                "flying",
                "flappy",
                "speedrunner",
                "whackamole",
                "match3",
                "crossyroad",
            ]
        );
        let unique: HashSet<&&str> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn find_template_resolves_known_ids_only() {
        assert!(find_template("flappy").is_some());
        assert!(find_template("bogus").is_none());
    }

    #[test]
    fn object_ids_are_unique_within_each_template() {
        for template in catalog() {
            let mut seen = HashSet::new();
            for object in &template.objects {
                assert!(
                    seen.insert(object.id.clone()),
                    "duplicate object id {} in template {}",
                    object.id,
                    template.id
                );
            }
        }
    }

    #[test]
    fn gravity_defaults_follow_object_kind() {
        for template in catalog() {
            for object in &template.objects {
                let expected = matches!(object.kind, ObjectKind::Player | ObjectKind::Enemy);
                assert_eq!(
                    object.physics.gravity, expected,
                    "object {} in template {}",
                    object.id, template.id
                );
            }
        }
    }

    #[test]
    fn players_carry_default_behaviors_and_others_none() {
        for template in catalog() {
            for object in &template.objects {
                if object.kind == ObjectKind::Player {
                    assert!(object.behaviors.contains("jump"));
                    assert!(object.behaviors.contains("move"));
                    assert!(object.behaviors.contains("collect"));
                } else {
                    assert!(object.behaviors.is_empty());
                }
            }
        }
    }

    #[test]
    fn per_template_gravity_constants_match_presets() {
        let gravity: Vec<f32> = catalog().iter().map(|t| t.settings.gravity).collect();
        assert_eq!(gravity, vec![9.8, 12.0, 5.0, 15.0, 10.0, 0.0, 0.0, 9.8]);
    }

    #[test]
    fn template_wire_format_uses_type_for_dimension() {
        let value = serde_json::to_value(&catalog()[0]).expect("serialize");
        assert_eq!(value["type"], "3D");
        let runner = serde_json::to_value(&catalog()[1]).expect("serialize");
        assert_eq!(runner["type"], "2D/3D");
    }
}
