//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod attachment;
pub mod enums;
pub mod friend_request;
pub mod message;
pub mod parent_link;
pub mod room;
pub mod user;

// Re-exports per facilitare l'import
pub use attachment::Attachment;
pub use enums::{FriendRequestStatus, UserRole};
pub use friend_request::FriendRequest;
pub use message::Message;
pub use parent_link::ParentLink;
pub use room::{Room, RoomMember};
pub use user::User;
