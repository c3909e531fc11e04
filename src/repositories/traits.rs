//! Repository traits - Interfacce CRUD condivise dai repository
//!
//! I future restituiti sono `Send`, così i repository si possono usare
//! direttamente dagli handler axum e dentro `tokio::try_join!`.

use std::future::Future;

/// Inserimento: `Input` non contiene l'id, assegnato dal database
pub trait Create<Entity, Input> {
    fn create(&self, data: &Input) -> impl Future<Output = Result<Entity, sqlx::Error>> + Send;
}

/// Lettura per chiave primaria, `Ok(None)` se la riga non esiste
pub trait Read<Entity, Id> {
    fn read(&self, id: &Id) -> impl Future<Output = Result<Option<Entity>, sqlx::Error>> + Send;
}

/// Lettura di più righe in una sola query
///
/// L'ordine segue il database, non quello di `ids`; gli id assenti vengono ignorati.
pub trait ReadMany<Entity, Id> {
    fn read_many(&self, ids: &[Id]) -> impl Future<Output = Result<Vec<Entity>, sqlx::Error>> + Send;
}

/// Aggiornamento parziale; `RowNotFound` se l'id non esiste
pub trait Update<Entity, Patch, Id> {
    fn update(
        &self,
        id: &Id,
        data: &Patch,
    ) -> impl Future<Output = Result<Entity, sqlx::Error>> + Send;
}

pub trait Delete<Id> {
    fn delete(&self, id: &Id) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}
