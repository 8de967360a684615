//! `hubblet chat`: Interactive or single-message chat with an assistant.

use super::prompt::{print_reply, read_line};
use super::{load_config, missing_key_help, print_warnings};
use hubblet_agent::{AssistantWorkspace, ChatOrchestrator, TurnError};
use hubblet_core::UserId;

pub async fn run(
    user: &str,
    name: &str,
    message: Option<String>,
    new: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = UserId::new(user).ok_or("The user id must not be empty")?;
    let config = load_config()?;

    // Check for the API key early to give a clear error
    if !config.has_api_key() {
        missing_key_help();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let orchestrator = ChatOrchestrator::from_config(&config);
    let (mut workspace, warnings) = orchestrator.open(&user, name).await?;
    print_warnings(&warnings);
    if new {
        orchestrator.new_conversation(&user, &mut workspace)?;
    }

    if let Some(msg) = message {
        // Single message mode
        let outcome = orchestrator.chat_turn(&user, &mut workspace, &msg).await?;
        print_warnings(&outcome.warnings);
        println!("{}", outcome.reply);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║           Hubblet Chat — Interactive         ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Assistant: {}", workspace.profile.name);
    println!("  Model:     {}", config.chat_model);
    println!("  Memory:    {}", orchestrator.memory().name());
    println!("  Documents: {} chunks", workspace.knowledge.chunks().len());
    println!("  Session:   {} ({} messages)", workspace.session.title, workspace.session.messages.len());
    println!();
    println!("  Type your message and press Enter. /new starts a new conversation.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    show_recent(&workspace);

    while let Some(input) = read_line("You")? {
        if input.is_empty() {
            continue;
        }
        if input == "/new" {
            orchestrator.new_conversation(&user, &mut workspace)?;
            println!("  Started '{}'", workspace.session.title);
            continue;
        }

        eprint!("  ...");
        let result = orchestrator.chat_turn(&user, &mut workspace, &input).await;
        eprint!("\r     \r");
        match result {
            Ok(outcome) => {
                print_warnings(&outcome.warnings);
                if verbose {
                    let m = &outcome.metadata;
                    eprintln!(
                        "  [context] memories={} chunks={} history={} dropped={}",
                        m.memory_records, m.document_chunks, m.history_included, m.history_dropped
                    );
                }
                print_reply(&workspace.profile.name, &outcome.reply);
            }
            Err(TurnError::MissingApiKey) => {
                missing_key_help();
                break;
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

/// Replay the tail of a resumed conversation.
fn show_recent(workspace: &AssistantWorkspace) {
    let recent = workspace.session.recent(4);
    if recent.is_empty() {
        println!();
        return;
    }
    println!();
    println!("  ── earlier ──");
    for message in recent {
        let speaker = match message.role {
            hubblet_core::Role::User => "You",
            _ => workspace.profile.name.as_str(),
        };
        print_reply(speaker, &message.content);
    }
}
