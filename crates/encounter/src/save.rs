use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PlayerTuning;

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SavedVec3 {
    pub fn from_vec3(value: Vec3) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Fields handed to the persistence collaborator at save checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub save_version: u32,
    pub player_position: SavedVec3,
    pub player_health: u32,
    pub player_entropy: u32,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("parse save json: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("parse save json at {path}: {source}")]
    ParseAt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode save json: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("validation failed at {path}: {message}")]
    Invalid { path: &'static str, message: String },
    #[error("read save '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write save '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn parse_save_game_json(raw: &str) -> Result<SaveGame, SaveError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, SaveGame>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        if path.is_empty() || path == "." {
            SaveError::Parse { source }
        } else {
            SaveError::ParseAt { path, source }
        }
    })
}

pub fn encode_save_game_json(save: &SaveGame) -> Result<String, SaveError> {
    serde_json::to_string_pretty(save).map_err(|source| SaveError::Encode { source })
}

fn expected_actual(path: &'static str, expected: impl Display, actual: impl Display) -> SaveError {
    SaveError::Invalid {
        path,
        message: format!("expected {expected}, got {actual}"),
    }
}

pub fn validate_save_game(save: &SaveGame, tuning: &PlayerTuning) -> Result<(), SaveError> {
    if save.save_version != SAVE_VERSION {
        return Err(expected_actual(
            "save_version",
            SAVE_VERSION,
            save.save_version,
        ));
    }
    let position = save.player_position;
    for (path, value) in [
        ("player_position.x", position.x),
        ("player_position.y", position.y),
        ("player_position.z", position.z),
    ] {
        if !value.is_finite() {
            return Err(expected_actual(path, "finite number", value));
        }
    }
    if save.player_health > tuning.max_health {
        return Err(expected_actual(
            "player_health",
            format!("<= {}", tuning.max_health),
            save.player_health,
        ));
    }
    if save.player_entropy > tuning.max_entropy {
        return Err(expected_actual(
            "player_entropy",
            format!("<= {}", tuning.max_entropy),
            save.player_entropy,
        ));
    }
    Ok(())
}

pub fn write_save_file(path: &Path, save: &SaveGame) -> Result<(), SaveError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SaveError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = encode_save_game_json(save)?;
    fs::write(path, json).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_save_file(path: &Path, tuning: &PlayerTuning) -> Result<SaveGame, SaveError> {
    let raw = fs::read_to_string(path).map_err(|source| SaveError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let save = parse_save_game_json(&raw)?;
    validate_save_game(&save, tuning)?;
    Ok(save)
}
