//! FileStore - Archiviazione su disco degli allegati
//!
//! Ogni file viene salvato con una chiave generata (uuid + estensione), il nome originale
//! resta solo nei metadati dell'allegato.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Salva i byte e ritorna la chiave di archiviazione
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn put(&self, original_name: &str, data: &[u8]) -> io::Result<String> {
        fs::create_dir_all(&self.root).await?;

        let key = match extension_of(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        fs::write(self.root.join(&key), data).await?;

        info!("Stored file {} as {}", original_name, key);
        Ok(key)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> io::Result<Vec<u8>> {
        let path = self.resolve(key)?;
        debug!("Reading stored file {}", path.display());
        fs::read(path).await
    }

    pub async fn delete(&self, key: &str) -> io::Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Le chiavi sono nomi di file semplici, mai percorsi
    fn resolve(&self, key: &str) -> io::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid storage key"));
        }
        Ok(self.root.join(key))
    }
}

/// Estensione in minuscolo, solo alfanumerica e di lunghezza ragionevole
fn extension_of(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

/// Nome file sicuro da riportare nei metadati e nell'header Content-Disposition
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\' && *c != '/')
        .take(255)
        .collect();
    if cleaned.trim().is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("uploads"));

        let key = store.put("notes.PDF", b"hello").await.unwrap();
        assert!(key.ends_with(".pdf"));
        assert_eq!(store.get(&key).await.unwrap(), b"hello");

        store.delete(&key).await.unwrap();
        assert!(store.get(&key).await.is_err());
        // delete di un file assente non è un errore
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let err = store.get("../secret").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_extension_and_file_name_sanitizing() {
        assert_eq!(extension_of("a.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("weird.ex$"), None);
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("re\"port.txt"), "report.txt");
        assert_eq!(sanitize_file_name(""), "file");
    }
}
