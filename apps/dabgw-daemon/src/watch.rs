use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use dabgw_node::confirm::Orchestrator;
use dabgw_node::store::Message;

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn list_message_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("txt"))
        .collect();
    files.sort();
    files
}

fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    Ok(std::fs::read_to_string(path)?
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect())
}

/// Scans `dir` once, parsing every message file not seen before.
fn collect_new_messages(dir: &Path, seen: &mut HashSet<PathBuf>, arrived_at: u64) -> Vec<Message> {
    let mut messages = Vec::new();
    for path in list_message_files(dir) {
        if !seen.insert(path.clone()) {
            continue;
        }
        let lines = match read_lines(&path) {
            Ok(lines) => lines,
            Err(err) => {
                warn!("unreadable message file {}: {err}", path.display());
                continue;
            }
        };
        match Message::from_lines(lines, arrived_at) {
            Ok(message) => {
                info!("new dab message {} from {}", message.id, path.display());
                messages.push(message);
            }
            Err(err) => warn!("malformed message file {}: {err}", path.display()),
        }
    }
    messages
}

/// Polls the watch directory and hands every new message file to the
/// orchestrator as an independent attempt.
///
/// Files already present at startup are treated as handled, matching
/// the create-event semantics of the original folder monitor.
pub async fn run_watcher(
    orchestrator: Arc<Orchestrator>,
    dir: PathBuf,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
) {
    let mut seen: HashSet<PathBuf> = list_message_files(&dir).into_iter().collect();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        tokio::time::sleep(interval).await;
        for message in collect_new_messages(&dir, &mut seen, now_unix_secs()) {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::task::spawn_blocking(move || orchestrator.handle_new_message(message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::collect_new_messages;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let pid = std::process::id();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be monotonic enough for tests")
            .as_nanos();
        dir.push(format!("dabgw-watch-{name}-{pid}-{nanos}"));
        std::fs::create_dir_all(&dir).expect("fixture dir should create");
        dir
    }

    #[test]
    fn new_files_are_parsed_once() {
        let dir = temp_dir("once");
        std::fs::write(dir.join("msg.txt"), "42\n1\nweather\npayload\n")
            .expect("fixture should write");
        let mut seen = HashSet::new();

        let messages = collect_new_messages(&dir, &mut seen, 7);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, 42);
        assert_eq!(messages[0].arrived_at, 7);
        assert!(collect_new_messages(&dir, &mut seen, 8).is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn non_txt_and_malformed_files_are_skipped() {
        let dir = temp_dir("skip");
        std::fs::write(dir.join("ignored.csv"), "1,2,3").expect("fixture should write");
        std::fs::write(dir.join("broken.txt"), "not-a-number\n").expect("fixture should write");
        let mut seen = HashSet::new();

        assert!(collect_new_messages(&dir, &mut seen, 7).is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }
}
