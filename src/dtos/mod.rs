//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API, in camelCase per il client SPA)
//! dalla rappresentazione interna (entities).

pub mod analysis;
pub mod attachment;
pub mod conversation;
pub mod friend_request;
pub mod message;
pub mod query;
pub mod room;
pub mod user;

pub use analysis::AnalyzeChatRequestDTO;
pub use attachment::{AttachmentDTO, CreateAttachmentDTO};
pub use conversation::{
    ChildConversationsDTO, ConversationEntryDTO, ConversationSummaryDTO, ConversationType,
    DirectConversationDTO, SharedRoomDTO,
};
pub use friend_request::{CreateFriendRequestDTO, FriendRequestDTO, FriendRequestsDTO};
pub use message::{CreateMessageDTO, FacultyMessageDTO, MessageDTO, MessageTarget, SendMessageDTO};
pub use query::{MessagesQuery, UserSearchQuery};
pub use room::{
    AddMembersDTO, BulkDeleteResultDTO, BulkDeleteRoomsDTO, CreateRoomDTO, CreateRoomRequestDTO,
    RoomDTO,
};
pub use user::{
    AuthResponseDTO, CreateUserDTO, LinkChildDTO, LoginDTO, SignupDTO, UpdateProfileDTO, UserDTO,
};
