//! Conversation aggregation - Unione di amici, compagni di stanza e chat dirette
//!
//! Usata dalla vista di supervisione dei genitori: ogni interlocutore dello studente
//! compare una sola volta con i flag delle sorgenti da cui proviene.

use crate::dtos::{
    ConversationEntryDTO, ConversationSummaryDTO, ConversationType, SharedRoomDTO, UserDTO,
};
use crate::entities::User;
use crate::repositories::{CoMemberRow, DirectPartnerRow};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
struct Accumulator {
    is_friend: bool,
    shared_rooms: Vec<SharedRoomDTO>,
    message_count: i64,
    last_message_at: Option<DateTime<Utc>>,
}

/// Id distinti degli interlocutori, utili per caricare gli utenti in una sola query
pub fn partner_ids(
    child_id: i32,
    friends: &[i32],
    co_members: &[CoMemberRow],
    partners: &[DirectPartnerRow],
) -> Vec<i32> {
    let mut ids: Vec<i32> = friends
        .iter()
        .copied()
        .chain(co_members.iter().map(|r| r.user_id))
        .chain(partners.iter().map(|p| p.partner_id))
        .filter(|id| *id != child_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Unisce le tre sorgenti in una lista deduplicata ed etichettata
///
/// Gli interlocutori senza utente corrispondente in `users` vengono scartati.
pub fn merge_conversations(
    child_id: i32,
    friends: &[i32],
    co_members: &[CoMemberRow],
    partners: &[DirectPartnerRow],
    users: Vec<User>,
) -> Vec<ConversationEntryDTO> {
    // BTreeMap per un ordine stabile prima dell'ordinamento finale
    let mut merged: BTreeMap<i32, Accumulator> = BTreeMap::new();

    for friend_id in friends.iter().filter(|id| **id != child_id) {
        merged.entry(*friend_id).or_default().is_friend = true;
    }

    for row in co_members.iter().filter(|r| r.user_id != child_id) {
        let entry = merged.entry(row.user_id).or_default();
        if !entry.shared_rooms.iter().any(|r| r.room_id == row.room_id) {
            entry.shared_rooms.push(SharedRoomDTO {
                room_id: row.room_id,
                name: row.room_name.clone(),
            });
        }
    }

    for partner in partners.iter().filter(|p| p.partner_id != child_id) {
        let entry = merged.entry(partner.partner_id).or_default();
        entry.message_count += partner.message_count;
        entry.last_message_at = entry.last_message_at.max(Some(partner.last_message_at));
    }

    let mut users_by_id: HashMap<i32, User> = users.into_iter().map(|u| (u.user_id, u)).collect();

    let mut entries: Vec<ConversationEntryDTO> = merged
        .into_iter()
        .filter_map(|(user_id, acc)| {
            let user = users_by_id.remove(&user_id)?;
            let has_direct_chat = acc.message_count > 0;
            let is_room_member = !acc.shared_rooms.is_empty();
            let conversation_type = if has_direct_chat {
                ConversationType::Direct
            } else if is_room_member {
                ConversationType::Room
            } else {
                ConversationType::Friend
            };
            Some(ConversationEntryDTO {
                user: UserDTO::from(user),
                is_friend: acc.is_friend,
                is_room_member,
                has_direct_chat,
                conversation_type,
                shared_rooms: acc.shared_rooms,
                message_count: acc.message_count,
                last_message_at: acc.last_message_at,
            })
        })
        .collect();

    entries.sort_by(compare_entries);
    entries
}

/// Più recenti prima, poi chi non ha messaggi; a parità per nome e id
fn compare_entries(a: &ConversationEntryDTO, b: &ConversationEntryDTO) -> Ordering {
    match (a.last_message_at, b.last_message_at) {
        (Some(x), Some(y)) if x != y => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => a
            .user
            .full_name
            .to_lowercase()
            .cmp(&b.user.full_name.to_lowercase())
            .then(a.user.id.cmp(&b.user.id)),
    }
}

pub fn summarize(entries: &[ConversationEntryDTO]) -> ConversationSummaryDTO {
    ConversationSummaryDTO {
        total: entries.len(),
        friends: entries.iter().filter(|e| e.is_friend).count(),
        room_members: entries.iter().filter(|e| e.is_room_member).count(),
        direct_chats: entries.iter().filter(|e| e.has_direct_chat).count(),
    }
}
