use std::fs;
use std::io;
use std::path::Path;

use tracing::info;

/// Loads the persistent gateway sender id, creating and storing a fresh
/// one on first run (or when the stored value is unreadable).
pub fn load_or_create_sender_id(path: &Path) -> Result<u32, io::Error> {
    match fs::read_to_string(path) {
        Ok(text) => {
            if let Ok(id) = text.trim().parse::<u32>() {
                return Ok(id);
            }
            create_sender_id(path)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => create_sender_id(path),
        Err(err) => Err(err),
    }
}

fn create_sender_id(path: &Path) -> Result<u32, io::Error> {
    let id: u32 = rand::random();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, id.to_string())?;
    info!("created sender id {id} at {}", path.display());
    Ok(id)
}
