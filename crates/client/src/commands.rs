//! JSON-lines command protocol.
//!
//! One JSON object per stdin line, tagged by `op`:
//!
//! ```text
//! {"op":"start","difficulty":"easy"}
//! {"op":"join","participant":"u1","name":"Ash","class":"fighter","position":1}
//! {"op":"queue","participant":"u1","ability":"strike","target":"Goblin"}
//! {"op":"confirm","participant":"u1"}
//! {"op":"status"}
//! ```

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::{Value, json};

use expedition_core::{CharacterClass, Difficulty, GameError};
use expedition_runtime::{EncounterHandle, RuntimeError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum HostCommand {
    Start {
        difficulty: String,
    },
    Join {
        participant: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        class: Option<String>,
        #[serde(default)]
        position: Option<u8>,
    },
    Queue {
        participant: String,
        ability: String,
        #[serde(default)]
        target: Option<String>,
    },
    Confirm {
        participant: String,
    },
    Status,
}

impl HostCommand {
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line).context("malformed command")
    }

    /// Sends the command and renders the reply as one JSON object.
    /// Rejections are replies, not errors.
    pub async fn dispatch(self, handle: &EncounterHandle) -> Result<Value> {
        let outcome = match self {
            Self::Start { difficulty } => {
                let difficulty: Difficulty = difficulty
                    .parse()
                    .map_err(|_| anyhow!("unknown difficulty '{difficulty}'"))?;
                handle
                    .start_encounter(difficulty)
                    .await
                    .map(|()| json!({ "type": "started", "difficulty": difficulty }))
            }
            Self::Join {
                participant,
                name,
                class,
                position,
            } => {
                let class = class
                    .map(|c| {
                        c.parse::<CharacterClass>()
                            .map_err(|_| anyhow!("unknown class '{c}'"))
                    })
                    .transpose()?;
                let name = name.unwrap_or_else(|| participant.clone());
                handle
                    .join(participant.as_str(), name, class, position)
                    .await
                    .map(|receipt| {
                        json!({
                            "type": "joined",
                            "participant": participant,
                            "position": receipt.position,
                            "late": receipt.late,
                        })
                    })
            }
            Self::Queue {
                participant,
                ability,
                target,
            } => handle
                .queue_action(participant.as_str(), ability, target)
                .await
                .map(|receipt| {
                    json!({
                        "type": "queued",
                        "participant": participant,
                        "ability": receipt.ability,
                        "target": receipt.target,
                    })
                }),
            Self::Confirm { participant } => handle
                .confirm_action(participant.as_str())
                .await
                .map(|receipt| {
                    json!({
                        "type": "confirmed",
                        "participant": participant,
                        "all_confirmed": receipt.all_confirmed,
                    })
                }),
            Self::Status => handle
                .snapshot()
                .await
                .map(|snapshot| json!({ "type": "status", "snapshot": snapshot })),
        };

        match outcome {
            Ok(reply) => Ok(reply),
            Err(err) => render_error(err),
        }
    }
}

fn render_error(err: RuntimeError) -> Result<Value> {
    match err {
        RuntimeError::Rejected(rejection) => Ok(json!({
            "type": "rejected",
            "code": rejection.reason.error_code(),
            "message": rejection.to_string(),
            "participant": rejection.participant,
        })),
        RuntimeError::Start(reason) => Ok(json!({
            "type": "start_failed",
            "code": reason.error_code(),
            "message": reason.to_string(),
        })),
        other => Err(other.into()),
    }
}
