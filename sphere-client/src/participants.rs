use indexmap::IndexMap;
use sphere_core::{MediaState, Participant, PeerId};

/// Remote participants in join order, one entry per id.
///
/// Roster events own membership, name and roles; media updates only ever
/// touch the media flags of an existing entry.
#[derive(Debug, Default)]
pub struct ParticipantTable {
    entries: IndexMap<PeerId, Participant>,
}

impl ParticipantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes roster data. Returns true when the id is new.
    pub fn upsert(&mut self, participant: Participant) -> bool {
        match self.entries.get_mut(&participant.id) {
            Some(existing) => {
                existing.name = participant.name;
                existing.is_admin = participant.is_admin;
                existing.is_creator = participant.is_creator;
                existing.media = participant.media;
                false
            }
            None => {
                self.entries.insert(participant.id.clone(), participant);
                true
            }
        }
    }

    pub fn set_media(&mut self, id: &PeerId, media: MediaState) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        entry.media = media;
        true
    }

    pub fn remove(&mut self, id: &PeerId) -> Option<Participant> {
        self.entries.shift_remove(id)
    }

    pub fn get(&self, id: &PeerId) -> Option<&Participant> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Participant> {
        self.entries
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn to_vec(&self) -> Vec<Participant> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
