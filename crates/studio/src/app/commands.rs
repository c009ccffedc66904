use std::fmt;

use editor::{ObjectKind, Vec3, ViewMode};

/// One line of a session script, mapped onto a store operation. Mirrors the
/// operations the editor panels used to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Add {
        kind: ObjectKind,
        id: String,
        position: Vec3,
    },
    Select {
        id: String,
    },
    Deselect,
    Delete {
        id: String,
    },
    Move {
        id: String,
        position: Vec3,
    },
    Rotate {
        id: String,
        rotation: Vec3,
    },
    Scale {
        id: String,
        scale: Vec3,
    },
    Mass {
        id: String,
        mass: f32,
    },
    Opacity {
        id: String,
        opacity: u8,
    },
    Rename {
        id: String,
        name: String,
    },
    Recolor {
        id: String,
        color: String,
    },
    Load {
        template_id: String,
    },
    Play,
    View {
        mode: ViewMode,
    },
    Gravity {
        gravity: f32,
    },
    Background {
        color: String,
    },
    Generate {
        prompt: String,
    },
    Save,
    Export,
    Share {
        base_url: String,
    },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandParseError {
    reason: String,
    usage: String,
}

impl CommandParseError {
    fn new(reason: impl Into<String>, usage: &str) -> Self {
        Self {
            reason: reason.into(),
            usage: usage.to_string(),
        }
    }
}

impl fmt::Display for CommandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (usage: {})", self.reason, self.usage)
    }
}

/// Form inputs never reject bad numbers; they fall back to the field's safe
/// default instead. Position and rotation components default to 0.
pub(crate) fn parse_coord(raw: &str) -> f32 {
    raw.parse().unwrap_or(0.0)
}

/// Scale and mass default to 1 so a typo never collapses an object.
pub(crate) fn parse_unit(raw: &str) -> f32 {
    raw.parse().unwrap_or(1.0)
}

fn coord_triple(args: &[&str]) -> Vec3 {
    Vec3::new(
        args.first().map_or(0.0, |raw| parse_coord(raw)),
        args.get(1).map_or(0.0, |raw| parse_coord(raw)),
        args.get(2).map_or(0.0, |raw| parse_coord(raw)),
    )
}

fn unit_triple(args: &[&str]) -> Vec3 {
    Vec3::new(
        args.first().map_or(1.0, |raw| parse_unit(raw)),
        args.get(1).map_or(1.0, |raw| parse_unit(raw)),
        args.get(2).map_or(1.0, |raw| parse_unit(raw)),
    )
}

/// Parses one script line. Blank lines and `#` comments yield `Ok(None)`.
pub(crate) fn parse_line(line: &str) -> Result<Option<Command>, CommandParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let Some((name, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match *name {
        "add" => {
            const USAGE: &str = "add <kind> <id> [x y z]";
            let kind_token = args
                .first()
                .ok_or_else(|| CommandParseError::new("missing object kind", USAGE))?;
            let kind = ObjectKind::from_token(kind_token).ok_or_else(|| {
                CommandParseError::new(format!("unknown object kind '{kind_token}'"), USAGE)
            })?;
            let id = args
                .get(1)
                .ok_or_else(|| CommandParseError::new("missing object id", USAGE))?;
            Command::Add {
                kind,
                id: id.to_string(),
                position: coord_triple(&args[2..]),
            }
        }
        "select" => Command::Select {
            id: required_arg(args, 0, "select <id>")?.to_string(),
        },
        "deselect" => Command::Deselect,
        "delete" => Command::Delete {
            id: required_arg(args, 0, "delete <id>")?.to_string(),
        },
        "move" => Command::Move {
            id: required_arg(args, 0, "move <id> <x> <y> <z>")?.to_string(),
            position: coord_triple(&args[1..]),
        },
        "rotate" => Command::Rotate {
            id: required_arg(args, 0, "rotate <id> <x> <y> <z>")?.to_string(),
            rotation: coord_triple(&args[1..]),
        },
        "scale" => Command::Scale {
            id: required_arg(args, 0, "scale <id> <x> <y> <z>")?.to_string(),
            scale: unit_triple(&args[1..]),
        },
        "mass" => Command::Mass {
            id: required_arg(args, 0, "mass <id> <value>")?.to_string(),
            mass: args.get(1).map_or(1.0, |raw| parse_unit(raw)),
        },
        "opacity" => {
            const USAGE: &str = "opacity <id> <0-100>";
            let id = required_arg(args, 0, USAGE)?;
            let raw = required_arg(args, 1, USAGE)?;
            let opacity: u8 = raw.parse().map_err(|_| {
                CommandParseError::new(format!("invalid opacity '{raw}'"), USAGE)
            })?;
            if opacity > 100 {
                return Err(CommandParseError::new(
                    format!("opacity {opacity} out of range"),
                    USAGE,
                ));
            }
            Command::Opacity {
                id: id.to_string(),
                opacity,
            }
        }
        "rename" => {
            const USAGE: &str = "rename <id> <name...>";
            let id = required_arg(args, 0, USAGE)?;
            if args.len() < 2 {
                return Err(CommandParseError::new("missing name", USAGE));
            }
            Command::Rename {
                id: id.to_string(),
                name: args[1..].join(" "),
            }
        }
        "recolor" => Command::Recolor {
            id: required_arg(args, 0, "recolor <id> <color>")?.to_string(),
            color: required_arg(args, 1, "recolor <id> <color>")?.to_string(),
        },
        "load" => Command::Load {
            template_id: required_arg(args, 0, "load <template_id>")?.to_string(),
        },
        "play" => Command::Play,
        "view" => {
            const USAGE: &str = "view <2d|3d>";
            let raw = required_arg(args, 0, USAGE)?;
            let mode = ViewMode::from_token(raw).ok_or_else(|| {
                CommandParseError::new(format!("unknown view mode '{raw}'"), USAGE)
            })?;
            Command::View { mode }
        }
        "gravity" => {
            const USAGE: &str = "gravity <value>";
            let raw = required_arg(args, 0, USAGE)?;
            let gravity: f32 = raw.parse().map_err(|_| {
                CommandParseError::new(format!("invalid gravity '{raw}'"), USAGE)
            })?;
            Command::Gravity { gravity }
        }
        "background" => Command::Background {
            color: required_arg(args, 0, "background <color>")?.to_string(),
        },
        "generate" => {
            const USAGE: &str = "generate <prompt...>";
            if args.is_empty() {
                return Err(CommandParseError::new("missing prompt", USAGE));
            }
            Command::Generate {
                prompt: args.join(" "),
            }
        }
        "save" => Command::Save,
        "export" => Command::Export,
        "quit" => Command::Quit,
        "share" => Command::Share {
            base_url: args
                .first()
                .map_or_else(|| "https://epicenders.local".to_string(), |s| s.to_string()),
        },
        other => {
            return Err(CommandParseError::new(
                format!("unknown command '{other}'"),
                "see session script reference",
            ));
        }
    };

    Ok(Some(command))
}

fn required_arg<'a>(
    args: &[&'a str],
    index: usize,
    usage: &str,
) -> Result<&'a str, CommandParseError> {
    args.get(index)
        .copied()
        .ok_or_else(|| CommandParseError::new("missing argument", usage))
}
