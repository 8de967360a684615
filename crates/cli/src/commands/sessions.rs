//! `hubblet sessions`: List the user's chat sessions.

use super::load_config;
use hubblet_core::{ChatSession, UserId};
use hubblet_memory::ChatHistoryStore;

pub async fn run(
    user: &str,
    assistant: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = UserId::new(user).ok_or("The user id must not be empty")?;
    let config = load_config()?;
    let store = ChatHistoryStore::new(config.storage.chat_history_file());

    let mut sessions = filter_sessions(store.list_sessions(&user), assistant);
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }
    if sessions.is_empty() {
        println!("  No chat sessions for '{user}'.");
        return Ok(());
    }

    println!("💬 Chat sessions for '{user}' ({})", sessions.len());
    for s in &sessions {
        let updated = s.updated_at.with_timezone(&chrono::Local);
        println!(
            "   {}  {:<32} {:>4} messages  {}",
            updated.format("%Y-%m-%d %H:%M"),
            s.title,
            s.messages.len(),
            &s.id[..8.min(s.id.len())]
        );
    }
    Ok(())
}

/// Sessions titled for `assistant` (including numbered ones), or all.
fn filter_sessions(sessions: Vec<ChatSession>, assistant: Option<&str>) -> Vec<ChatSession> {
    let Some(assistant) = assistant else {
        return sessions;
    };
    let base = hubblet_memory::session_title(assistant);
    sessions
        .into_iter()
        .filter(|s| s.title == base || s.title.starts_with(&format!("{base} (")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_assistant_title() {
        let sessions = vec![
            ChatSession::new("ana", "Chat with Aurora"),
            ChatSession::new("ana", "Chat with Aurora (2)"),
            ChatSession::new("ana", "Chat with Aurora Pro"),
            ChatSession::new("ana", "Chat with Atlas"),
        ];
        let titles: Vec<String> = filter_sessions(sessions.clone(), Some("Aurora"))
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Chat with Aurora", "Chat with Aurora (2)"]);
        assert_eq!(filter_sessions(sessions, None).len(), 4);
    }
}
