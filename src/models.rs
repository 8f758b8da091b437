// src/models.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of the vote cooldown window.
pub const VOTE_COOLDOWN_HOURS: i64 = 24;

/// A guild-like directory entry with votes, cooldown and membership sub-records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: u64,
    #[serde(rename = "urlSlug")]
    pub slug: Option<String>,
    pub name: String,
    pub description: String,
    pub requirements: String,
    #[serde(rename = "inviteLink")]
    pub invite_link: String,
    pub tag: String,
    pub language: String,
    pub icon: Option<String>,
    pub ranking: Option<u32>,
    pub votes: u64,
    #[serde(rename = "canVote")]
    pub can_vote: bool,
    #[serde(rename = "nextVoteAt")]
    pub next_vote_at: Option<DateTime<Utc>>,
    pub platforms: Vec<String>,
}

impl Guild {
    /// Apply the guessable outcome of a successful vote: one more vote and a
    /// fresh cooldown window. `can_vote` and `next_vote_at` only ever change
    /// together, through this method or through a [`GuildPatch`].
    pub fn record_vote(&mut self, now: DateTime<Utc>) {
        self.votes += 1;
        self.can_vote = false;
        self.next_vote_at = Some(now + Duration::hours(VOTE_COOLDOWN_HOURS));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildMember {
    pub id: u64,
    pub name: String,
    pub role: MemberRole,
    #[serde(rename = "joinedAt")]
    pub joined_at: DateTime<Utc>,
}

/// A pending membership application, present only when explicitly requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildApplication {
    pub id: u64,
    pub applicant: String,
    pub description: String,
    pub platforms: Vec<String>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
}

/// The filter descriptor for the paginated list. `None` means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildFilters {
    pub platform: Option<String>,
    pub language: Option<String>,
}

/// Partial update merged into a stored [`Guild`]. Cooldown fields travel as a
/// pair so the `can_vote`/`next_vote_at` invariant survives patching.
#[derive(Debug, Clone, Default)]
pub struct GuildPatch {
    pub votes: Option<u64>,
    pub cooldown: Option<(bool, Option<DateTime<Utc>>)>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub invite_link: Option<String>,
    pub tag: Option<String>,
    pub language: Option<String>,
    pub ranking: Option<Option<u32>>,
    pub platforms: Option<Vec<String>>,
}

impl GuildPatch {
    /// The patch both stores produce for an optimistic vote.
    pub fn voted(now: DateTime<Utc>, current_votes: u64) -> Self {
        GuildPatch {
            votes: Some(current_votes + 1),
            cooldown: Some((false, Some(now + Duration::hours(VOTE_COOLDOWN_HOURS)))),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, guild: &mut Guild) {
        if let Some(votes) = self.votes {
            guild.votes = votes;
        }
        if let Some((can_vote, next_vote_at)) = self.cooldown.clone() {
            guild.can_vote = can_vote;
            guild.next_vote_at = next_vote_at;
        }
        if let Some(name) = &self.name {
            guild.name = name.clone();
        }
        if let Some(description) = &self.description {
            guild.description = description.clone();
        }
        if let Some(requirements) = &self.requirements {
            guild.requirements = requirements.clone();
        }
        if let Some(invite_link) = &self.invite_link {
            guild.invite_link = invite_link.clone();
        }
        if let Some(tag) = &self.tag {
            guild.tag = tag.clone();
        }
        if let Some(language) = &self.language {
            guild.language = language.clone();
        }
        if let Some(ranking) = self.ranking {
            guild.ranking = ranking;
        }
        if let Some(platforms) = &self.platforms {
            guild.platforms = platforms.clone();
        }
    }
}

/// Create/update payload. An `id` routes the call to an update; the id itself
/// is never part of the serialized body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildWrite {
    #[serde(skip_serializing)]
    pub id: Option<u64>,
    pub name: String,
    pub icon: Option<String>,
    pub description: String,
    pub requirements: String,
    #[serde(rename = "inviteLink")]
    pub invite_link: String,
    pub tag: String,
    pub language: String,
    pub platforms: Vec<String>,
}

/// Membership application payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub platforms: Vec<String>,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_guild() -> Guild {
        Guild {
            id: 1,
            slug: Some("sample".to_string()),
            name: "Sample".to_string(),
            description: "A sample guild".to_string(),
            requirements: String::new(),
            invite_link: String::new(),
            tag: "SMP".to_string(),
            language: "en".to_string(),
            icon: None,
            ranking: Some(3),
            votes: 5,
            can_vote: true,
            next_vote_at: None,
            platforms: vec!["pc".to_string()],
        }
    }

    #[test]
    fn record_vote_sets_cooldown_pair() {
        let mut guild = sample_guild();
        let now = Utc::now();
        guild.record_vote(now);
        assert_eq!(guild.votes, 6);
        assert!(!guild.can_vote);
        assert_eq!(guild.next_vote_at, Some(now + Duration::hours(24)));
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut guild = sample_guild();
        let patch = GuildPatch {
            votes: Some(9),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        patch.apply_to(&mut guild);
        assert_eq!(guild.votes, 9);
        assert_eq!(guild.name, "Renamed");
        // Untouched fields survive.
        assert!(guild.can_vote);
        assert_eq!(guild.language, "en");
    }

    #[test]
    fn write_payload_never_serializes_id() {
        let write = GuildWrite {
            id: Some(42),
            name: "New".to_string(),
            icon: None,
            description: String::new(),
            requirements: String::new(),
            invite_link: String::new(),
            tag: "NEW".to_string(),
            language: "en".to_string(),
            platforms: vec![],
        };
        let json = serde_json::to_value(&write).unwrap();
        assert!(json.get("id").is_none());
    }
}
