use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub participants: Vec<String>,
    pub last_message_at: Option<OffsetDateTime>,
    pub created_at: Option<OffsetDateTime>,
}

impl Conversation {
    /// Timestamp used to rank conversations sharing a participant set.
    #[must_use]
    pub fn recency(&self) -> Option<OffsetDateTime> {
        self.last_message_at.or(self.created_at)
    }

    #[must_use]
    pub fn participant_key(&self) -> ParticipantKey {
        ParticipantKey::new(self.participants.as_slice())
    }

    #[must_use]
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }
}

/// Order-independent identity of a participant set.
///
/// Grouping compares the sorted id list itself, so two different sets can never
/// share a key even if an id happens to contain the display separator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantKey(Vec<String>);

impl ParticipantKey {
    #[must_use]
    pub fn new<S: AsRef<str>>(participants: &[S]) -> Self {
        let mut ids: Vec<String> = participants.iter().map(|p| p.as_ref().to_string()).collect();
        ids.sort();
        ids.dedup();
        Self(ids)
    }

    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("_"))
    }
}

/// Ranks `a` against `b`; the greater conversation survives.
///
/// Newest recency wins, a missing timestamp ranks oldest, and exact ties go to
/// the lowest id.
fn survivor_order(a: &Conversation, b: &Conversation) -> Ordering {
    a.recency().cmp(&b.recency()).then_with(|| b.id.cmp(&a.id))
}

/// Picks the conversation that survives deduplication of `group`.
#[must_use]
pub fn pick_canonical(group: &[Conversation]) -> Option<&Conversation> {
    group.iter().max_by(|a, b| survivor_order(a, b))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub key: ParticipantKey,
    pub kept_id: String,
    pub duplicate_ids: Vec<String>,
}

/// Partitions conversations by participant set and returns every group that
/// holds more than one conversation, ordered by key.
#[must_use]
pub fn plan_duplicates(conversations: Vec<Conversation>) -> Vec<DuplicateGroup> {
    let mut groups: BTreeMap<ParticipantKey, Vec<Conversation>> = BTreeMap::new();
    for conversation in conversations {
        groups.entry(conversation.participant_key()).or_default().push(conversation);
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .filter_map(|(key, members)| {
            let kept_id = pick_canonical(&members)?.id.clone();
            let mut duplicate_ids: Vec<String> =
                members.into_iter().map(|c| c.id).filter(|id| *id != kept_id).collect();
            duplicate_ids.sort();
            Some(DuplicateGroup { key, kept_id, duplicate_ids })
        })
        .collect()
}
