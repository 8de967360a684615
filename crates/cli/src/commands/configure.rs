//! `hubblet create` / `hubblet edit`: the configuration dialogue.

use super::assistants::{print_report, read_sources};
use super::prompt::{print_reply, read_line};
use super::{load_config, missing_key_help, print_warnings};
use hubblet_agent::dialogue::user_turns;
use hubblet_agent::{ChatOrchestrator, ConfigDialogue, DialogueError, DialogueSettings, TurnError};
use hubblet_memory::KnowledgeBase;
use std::path::PathBuf;

pub async fn create(files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = ChatOrchestrator::from_config(&config);
    let dialogue = ConfigDialogue::new(DialogueSettings::from_config(&config));
    run(&orchestrator, dialogue, KnowledgeBase::new(), files).await
}

pub async fn edit(name: &str, files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let orchestrator = ChatOrchestrator::from_config(&config);
    let embedder = orchestrator.embedder();
    let loaded = orchestrator.profiles().load(name, embedder.as_ref()).await;
    print_warnings(&loaded.warnings);
    if !loaded.found {
        return Err(format!("Assistant '{name}' not found. Run `hubblet list`.").into());
    }

    let dialogue = ConfigDialogue::edit(loaded.profile, DialogueSettings::from_config(&config));
    run(&orchestrator, dialogue, loaded.knowledge, files).await
}

async fn run(
    orchestrator: &ChatOrchestrator,
    mut dialogue: ConfigDialogue,
    mut knowledge: KnowledgeBase,
    files: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       Hubblet — Assistant Configuration      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Type /save to save, /show to print the instructions,");
    println!("  'exit' or Ctrl+D to leave without saving.");
    print_reply("Hubblet", dialogue.opening());

    loop {
        let Some(input) = read_line("You")? else {
            println!("  Not saved.");
            break;
        };
        match input.as_str() {
            "/save" => match save(orchestrator, &mut dialogue, &mut knowledge, files).await {
                Ok(()) => break,
                Err(e) => eprintln!("  [Error] {e}"),
            },
            "/show" => match dialogue.profile().instructions() {
                Some(text) => print_reply("Instructions", text),
                None => println!("  No final instructions yet."),
            },
            _ => match dialogue.respond(&input, orchestrator.provider()).await {
                Ok(reply) => {
                    print_reply("Hubblet", &reply.message);
                    if reply.instructions_captured {
                        println!("  ✅ Final instructions ready. Type /save to keep them.");
                    }
                }
                Err(DialogueError::MissingApiKey) => missing_key_help(),
                Err(e) => eprintln!("  [Error] {e}"),
            },
        }
    }
    Ok(())
}

async fn save(
    orchestrator: &ChatOrchestrator,
    dialogue: &mut ConfigDialogue,
    knowledge: &mut KnowledgeBase,
    files: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let profile = dialogue.finalize()?;

    if !files.is_empty() {
        match orchestrator.ingest(knowledge, &read_sources(files)).await {
            Ok(report) => print_report(&report),
            Err(TurnError::MissingApiKey) => {
                eprintln!("  ⚠️  No API key: documents were not added to the knowledge base");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let paths = orchestrator.save(&profile, knowledge)?;
    println!(
        "  ✅ Assistant '{}' saved after {} turns ({})",
        profile.name,
        user_turns(dialogue.transcript()),
        paths.config.display()
    );
    Ok(())
}
