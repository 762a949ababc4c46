//! Command kinds understood by the agent service
//!
//! The command identifier table is shared with the server and has to move in
//! lockstep with it. An identifier missing from this table is not an error:
//! the descriptor carrying it is dropped by the parser.

use thiserror::Error;
use tracing::debug;

use super::params::{ParamError, Params, Rotator, Vec2, Vec3};

/// Actor class spawned when `scene.createActor` names none
pub const DEFAULT_ACTOR_CLASS: &str = "Actor";

/// Transaction description used when `session.beginTransaction` names none
pub const DEFAULT_TRANSACTION_DESCRIPTION: &str = "Agent action";

/// Falloff used by landscape brushes when the server omits it
pub const DEFAULT_BRUSH_FALLOFF: f64 = 0.5;

/// All command identifiers, in table order
pub const COMMAND_IDS: [&str; 23] = [
    "scene.modifyActor",
    "scene.createActor",
    "scene.deleteActor",
    "scene.modifyComponent",
    "scene.setComponentMaterial",
    "scene.setStaticMesh",
    "scene.addTag",
    "scene.setFolder",
    "scene.addLabelPrefix",
    "scene.duplicateActors",
    "scene.setDirectionalLightIntensity",
    "scene.setFogDensity",
    "scene.setPostProcessExposure",
    "landscape.sculpt",
    "landscape.paintLayer",
    "landscape.generate",
    "editor.undo",
    "editor.redo",
    "session.beginTransaction",
    "session.commitTransaction",
    "session.rollbackTransaction",
    "context.sceneSummary",
    "context.selection",
];

/// One automation command with its kind-specific parameters
///
/// An empty `targets` list means "apply to the editor's current selection".
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    ModifyActor {
        delta_location: Vec3,
        delta_rotation: Rotator,
        delta_scale: Vec3,
        targets: Vec<String>,
    },
    CreateActor {
        actor_class: String,
        location: Vec3,
        rotation: Rotator,
        scale: Vec3,
        count: u32,
        label: Option<String>,
    },
    DeleteActor {
        targets: Vec<String>,
    },
    ModifyComponent {
        component_name: String,
        delta_location: Vec3,
        delta_rotation: Rotator,
        delta_scale: Vec3,
        visible: Option<bool>,
        targets: Vec<String>,
    },
    SetMaterial {
        material_path: String,
        component_name: Option<String>,
        slot: u32,
        targets: Vec<String>,
    },
    SetStaticMesh {
        mesh_path: String,
        component_name: Option<String>,
        targets: Vec<String>,
    },
    AddTag {
        tag: String,
        targets: Vec<String>,
    },
    SetFolder {
        folder_path: String,
        targets: Vec<String>,
    },
    AddLabelPrefix {
        prefix: String,
        targets: Vec<String>,
    },
    DuplicateActors {
        count: u32,
        offset: Vec3,
        targets: Vec<String>,
    },
    SetDirectionalLightIntensity {
        intensity: f64,
        targets: Vec<String>,
    },
    SetFogDensity {
        density: f64,
        targets: Vec<String>,
    },
    SetPostProcessExposure {
        exposure_compensation: f64,
        targets: Vec<String>,
    },
    LandscapeSculpt {
        center: Vec2,
        size: Vec2,
        strength: f64,
        falloff: f64,
        invert: bool,
        seed: u64,
    },
    LandscapePaintLayer {
        center: Vec2,
        size: Vec2,
        layer_name: String,
        strength: f64,
        falloff: f64,
        invert: bool,
    },
    LandscapeGenerate {
        theme: String,
        size: Option<Vec2>,
        seed: u64,
        max_height: Option<f64>,
    },
    Undo {
        steps: u32,
    },
    Redo {
        steps: u32,
    },
    BeginTransaction {
        description: String,
    },
    CommitTransaction,
    RollbackTransaction,
    GetSceneSummary,
    GetSelection,
}

/// Why a command identifier and its params did not yield a kind
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KindError {
    #[error("unrecognized command '{0}'")]
    Unknown(String),

    #[error("invalid params for '{command}': {source}")]
    Invalid { command: String, source: ParamError },
}

impl ActionKind {
    /// Build a kind from a command identifier and its params
    pub fn from_command(command: &str, params: &Params<'_>) -> Result<Self, KindError> {
        debug!(%command, "from_command: called");
        match Self::parse_known(command, params) {
            Ok(Some(kind)) => Ok(kind),
            Ok(None) => {
                debug!(%command, "from_command: unknown command");
                Err(KindError::Unknown(command.to_string()))
            }
            Err(source) => {
                debug!(%command, error = %source, "from_command: invalid params");
                Err(KindError::Invalid {
                    command: command.to_string(),
                    source,
                })
            }
        }
    }

    /// Returns `Ok(None)` for an identifier outside the table
    fn parse_known(id: &str, p: &Params<'_>) -> Result<Option<Self>, ParamError> {
        let kind = match id {
            "scene.modifyActor" => Self::ModifyActor {
                delta_location: p.vec3_or("deltaLocation", Vec3::ZERO)?,
                delta_rotation: p.rotator_or("deltaRotation", Rotator::ZERO)?,
                delta_scale: p.vec3_or("deltaScale", Vec3::ZERO)?,
                targets: p.targets()?,
            },
            "scene.createActor" => Self::CreateActor {
                actor_class: p.str_or("actorClass", DEFAULT_ACTOR_CLASS)?,
                location: p.vec3_or("location", Vec3::ZERO)?,
                rotation: p.rotator_or("rotation", Rotator::ZERO)?,
                scale: p.vec3_or("scale", Vec3::ONE)?,
                count: p.count_or("count", 1)?,
                label: p.str_opt("label")?,
            },
            "scene.deleteActor" => Self::DeleteActor { targets: p.targets()? },
            "scene.modifyComponent" => Self::ModifyComponent {
                component_name: p.str_req("componentName")?,
                delta_location: p.vec3_or("deltaLocation", Vec3::ZERO)?,
                delta_rotation: p.rotator_or("deltaRotation", Rotator::ZERO)?,
                delta_scale: p.vec3_or("deltaScale", Vec3::ZERO)?,
                visible: p.bool_opt("visible")?,
                targets: p.targets()?,
            },
            "scene.setComponentMaterial" => Self::SetMaterial {
                material_path: p.str_req("materialPath")?,
                component_name: p.str_opt("componentName")?,
                slot: p.u32_or("slot", 0)?,
                targets: p.targets()?,
            },
            "scene.setStaticMesh" => Self::SetStaticMesh {
                mesh_path: p.str_req("meshPath")?,
                component_name: p.str_opt("componentName")?,
                targets: p.targets()?,
            },
            "scene.addTag" => Self::AddTag {
                tag: p.str_req("tag")?,
                targets: p.targets()?,
            },
            "scene.setFolder" => Self::SetFolder {
                folder_path: p.str_req("folderPath")?,
                targets: p.targets()?,
            },
            "scene.addLabelPrefix" => Self::AddLabelPrefix {
                prefix: p.str_req("prefix")?,
                targets: p.targets()?,
            },
            "scene.duplicateActors" => Self::DuplicateActors {
                count: p.count_or("count", 1)?,
                offset: p.vec3_or("offset", Vec3::ZERO)?,
                targets: p.targets()?,
            },
            "scene.setDirectionalLightIntensity" => Self::SetDirectionalLightIntensity {
                intensity: p.f64_req("intensity")?,
                targets: p.targets()?,
            },
            "scene.setFogDensity" => Self::SetFogDensity {
                density: p.f64_req("density")?,
                targets: p.targets()?,
            },
            "scene.setPostProcessExposure" => Self::SetPostProcessExposure {
                exposure_compensation: p.f64_req("exposureCompensation")?,
                targets: p.targets()?,
            },
            "landscape.sculpt" => Self::LandscapeSculpt {
                center: p.vec2_req("center")?,
                size: p.vec2_req("size")?,
                strength: p.f64_req("strength")?,
                falloff: p.f64_or("falloff", DEFAULT_BRUSH_FALLOFF)?,
                invert: p.bool_or("invert", false)?,
                seed: p.u64_or("seed", 0)?,
            },
            "landscape.paintLayer" => Self::LandscapePaintLayer {
                center: p.vec2_req("center")?,
                size: p.vec2_req("size")?,
                layer_name: p.str_req("layerName")?,
                strength: p.f64_req("strength")?,
                falloff: p.f64_or("falloff", DEFAULT_BRUSH_FALLOFF)?,
                invert: p.bool_or("invert", false)?,
            },
            "landscape.generate" => Self::LandscapeGenerate {
                theme: p.str_req("theme")?,
                size: p.vec2_opt("size")?,
                seed: p.u64_or("seed", 0)?,
                max_height: p.f64_opt("maxHeight")?,
            },
            "editor.undo" => Self::Undo {
                steps: p.count_or("steps", 1)?,
            },
            "editor.redo" => Self::Redo {
                steps: p.count_or("steps", 1)?,
            },
            "session.beginTransaction" => Self::BeginTransaction {
                description: p.str_or("description", DEFAULT_TRANSACTION_DESCRIPTION)?,
            },
            "session.commitTransaction" => Self::CommitTransaction,
            "session.rollbackTransaction" => Self::RollbackTransaction,
            "context.sceneSummary" => Self::GetSceneSummary,
            "context.selection" => Self::GetSelection,
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }

    /// The wire identifier for this kind
    pub fn command_id(&self) -> &'static str {
        match self {
            Self::ModifyActor { .. } => "scene.modifyActor",
            Self::CreateActor { .. } => "scene.createActor",
            Self::DeleteActor { .. } => "scene.deleteActor",
            Self::ModifyComponent { .. } => "scene.modifyComponent",
            Self::SetMaterial { .. } => "scene.setComponentMaterial",
            Self::SetStaticMesh { .. } => "scene.setStaticMesh",
            Self::AddTag { .. } => "scene.addTag",
            Self::SetFolder { .. } => "scene.setFolder",
            Self::AddLabelPrefix { .. } => "scene.addLabelPrefix",
            Self::DuplicateActors { .. } => "scene.duplicateActors",
            Self::SetDirectionalLightIntensity { .. } => "scene.setDirectionalLightIntensity",
            Self::SetFogDensity { .. } => "scene.setFogDensity",
            Self::SetPostProcessExposure { .. } => "scene.setPostProcessExposure",
            Self::LandscapeSculpt { .. } => "landscape.sculpt",
            Self::LandscapePaintLayer { .. } => "landscape.paintLayer",
            Self::LandscapeGenerate { .. } => "landscape.generate",
            Self::Undo { .. } => "editor.undo",
            Self::Redo { .. } => "editor.redo",
            Self::BeginTransaction { .. } => "session.beginTransaction",
            Self::CommitTransaction => "session.commitTransaction",
            Self::RollbackTransaction => "session.rollbackTransaction",
            Self::GetSceneSummary => "context.sceneSummary",
            Self::GetSelection => "context.selection",
        }
    }

    /// Actors this command is aimed at (empty = current selection or not actor-scoped)
    pub fn targets(&self) -> &[String] {
        match self {
            Self::ModifyActor { targets, .. }
            | Self::DeleteActor { targets }
            | Self::ModifyComponent { targets, .. }
            | Self::SetMaterial { targets, .. }
            | Self::SetStaticMesh { targets, .. }
            | Self::AddTag { targets, .. }
            | Self::SetFolder { targets, .. }
            | Self::AddLabelPrefix { targets, .. }
            | Self::DuplicateActors { targets, .. }
            | Self::SetDirectionalLightIntensity { targets, .. }
            | Self::SetFogDensity { targets, .. }
            | Self::SetPostProcessExposure { targets, .. } => targets,
            _ => &[],
        }
    }

    /// Whether executing this command changes the scene
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::GetSceneSummary | Self::GetSelection)
    }

    /// Parameter summary used in previews
    pub fn describe(&self) -> String {
        match self {
            Self::ModifyActor {
                delta_location,
                delta_rotation,
                delta_scale,
                targets,
            } => format!(
                "move {} rotate {} scale {} on {}",
                delta_location,
                delta_rotation,
                delta_scale,
                target_label(targets)
            ),
            Self::CreateActor {
                actor_class,
                location,
                rotation,
                scale,
                count,
                label,
            } => {
                let mut text = format!(
                    "spawn {} x {} at {} rotation {} scale {}",
                    count, actor_class, location, rotation, scale
                );
                if let Some(label) = label {
                    text.push_str(&format!(" as '{}'", label));
                }
                text
            }
            Self::DeleteActor { targets } => format!("delete {}", target_label(targets)),
            Self::ModifyComponent {
                component_name,
                delta_location,
                delta_rotation,
                delta_scale,
                visible,
                targets,
            } => {
                let mut text = format!(
                    "component '{}' move {} rotate {} scale {}",
                    component_name, delta_location, delta_rotation, delta_scale
                );
                if let Some(visible) = visible {
                    text.push_str(&format!(" visible={}", visible));
                }
                text.push_str(&format!(" on {}", target_label(targets)));
                text
            }
            Self::SetMaterial {
                material_path,
                component_name,
                slot,
                targets,
            } => format!(
                "material '{}' slot {}{} on {}",
                material_path,
                slot,
                component_suffix(component_name),
                target_label(targets)
            ),
            Self::SetStaticMesh {
                mesh_path,
                component_name,
                targets,
            } => format!(
                "mesh '{}'{} on {}",
                mesh_path,
                component_suffix(component_name),
                target_label(targets)
            ),
            Self::AddTag { tag, targets } => format!("tag '{}' on {}", tag, target_label(targets)),
            Self::SetFolder { folder_path, targets } => {
                format!("folder '{}' on {}", folder_path, target_label(targets))
            }
            Self::AddLabelPrefix { prefix, targets } => {
                format!("prefix '{}' on {}", prefix, target_label(targets))
            }
            Self::DuplicateActors { count, offset, targets } => format!(
                "duplicate {} x{} offset {}",
                target_label(targets),
                count,
                offset
            ),
            Self::SetDirectionalLightIntensity { intensity, targets } => {
                format!("intensity {} on {}", intensity, target_label(targets))
            }
            Self::SetFogDensity { density, targets } => {
                format!("density {} on {}", density, target_label(targets))
            }
            Self::SetPostProcessExposure {
                exposure_compensation,
                targets,
            } => format!("exposure {} on {}", exposure_compensation, target_label(targets)),
            Self::LandscapeSculpt {
                center,
                size,
                strength,
                falloff,
                invert,
                seed,
            } => format!(
                "{} at {} size {} strength {} falloff {} seed {}",
                if *invert { "lower" } else { "raise" },
                center,
                size,
                strength,
                falloff,
                seed
            ),
            Self::LandscapePaintLayer {
                center,
                size,
                layer_name,
                strength,
                falloff,
                invert,
            } => format!(
                "{} '{}' at {} size {} strength {} falloff {}",
                if *invert { "erase" } else { "paint" },
                layer_name,
                center,
                size,
                strength,
                falloff
            ),
            Self::LandscapeGenerate {
                theme,
                size,
                seed,
                max_height,
            } => {
                let mut text = format!("generate '{}'", theme);
                if let Some(size) = size {
                    text.push_str(&format!(" size {}", size));
                }
                text.push_str(&format!(" seed {}", seed));
                if let Some(max_height) = max_height {
                    text.push_str(&format!(" max height {}", max_height));
                }
                text
            }
            Self::Undo { steps } => format!("undo {} step(s)", steps),
            Self::Redo { steps } => format!("redo {} step(s)", steps),
            Self::BeginTransaction { description } => format!("begin '{}'", description),
            Self::CommitTransaction => "commit".to_string(),
            Self::RollbackTransaction => "rollback".to_string(),
            Self::GetSceneSummary => "read scene summary".to_string(),
            Self::GetSelection => "read selection".to_string(),
        }
    }
}

fn target_label(targets: &[String]) -> String {
    if targets.is_empty() {
        "selection".to_string()
    } else {
        format!("[{}]", targets.join(", "))
    }
}

fn component_suffix(component_name: &Option<String>) -> String {
    component_name
        .as_ref()
        .map(|name| format!(" on component '{}'", name))
        .unwrap_or_default()
}
