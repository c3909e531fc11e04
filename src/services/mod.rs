//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod analysis;
pub mod attachment;
pub mod auth;
pub mod faculty;
pub mod friends;
pub mod health;
pub mod message;
pub mod room;
pub mod stream;
pub mod user;

// Re-exports per facilitare l'import
pub use analysis::analyze_chat;
pub use attachment::download_attachment;
pub use auth::{login, logout, me, onboard, signup};
pub use faculty::{send_file, send_message};
pub use friends::{
    accept_friend_request, list_friend_requests, list_friends, reject_friend_request,
    send_friend_request,
};
pub use health::health_check;
pub use message::{get_direct_messages, list_direct_conversations, send_direct_message};
pub use room::{
    add_members, bulk_delete_rooms, create_room, delete_room, get_room, get_room_messages,
    leave_room, list_rooms, post_room_message, remove_member,
};
pub use stream::get_stream_token;
pub use user::{
    get_child_conversations, get_user_by_id, link_child, list_children, search_users,
};
