use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One activity record from the GitHub events API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub actor: Actor,
    pub repo: Repo,
    #[serde(default)]
    pub payload: Payload,
    #[serde(default)]
    pub public: bool,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} by {} on {}",
            self.event_type, self.actor.login, self.repo.name
        );
        match self.payload.commits.len() {
            0 => {}
            1 => line.push_str(" (1 commit)"),
            n => line.push_str(&format!(" ({} commits)", n)),
        }
        line
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: u64,
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_login: Option<String>,
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Repo {
    pub id: u64,
    pub name: String,
    pub url: String,
}

/// Event-type specific data. A missing field means it does not apply to
/// this kind of event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_size: Option<u32>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<Commit>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Commit {
    pub sha: String,
    pub author: CommitAuthor,
    pub message: String,
    pub distinct: bool,
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommitAuthor {
    pub email: String,
    pub name: String,
}
