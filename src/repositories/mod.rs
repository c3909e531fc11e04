//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza i repository in sotto-moduli separati per una migliore manutenibilità.
//! Ogni repository gestisce le operazioni di database per una specifica entità.

// ************************* NOTA SULLE QUERY ************************* //

/*
   Le query usano le funzioni runtime di sqlx (query / query_as / query_scalar) con
   #[derive(sqlx::FromRow)] sulle entity, quindi la compilazione non richiede un database
   raggiungibile. Lo schema vive in migrations/ e viene applicato all'avvio (e da #[sqlx::test]).

   Promemoria sui metodi di fetch:
   Number of Rows	Method to Call	    Returns
   None	            .execute(...)	    QueryResult (INSERT/UPDATE/DELETE senza RETURNING)
   Zero or One	    .fetch_optional()	Option<T>
   Exactly One	    .fetch_one()	    T, errore RowNotFound se vuoto
   Multiple	        .fetch_all()	    Vec<T>

   Le date sono salvate come TEXT RFC3339 in UTC: l'ordinamento lessicografico coincide con
   quello temporale, per cui i confronti created_at < ? sono corretti.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod attachment;
pub mod friend_request;
pub mod message;
pub mod parent_link;
pub mod room;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, ReadMany, Update};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use attachment::AttachmentRepository;
pub use friend_request::FriendRequestRepository;
pub use message::{DirectPartnerRow, MessageRepository};
pub use parent_link::ParentLinkRepository;
pub use room::{CoMemberRow, RoomRepository};
pub use user::UserRepository;
