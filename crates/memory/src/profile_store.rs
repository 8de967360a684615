//! Assistant profile persistence as flat files.
//!
//! For an assistant whose sanitized name is `<safe>`, the profile directory
//! holds:
//!
//! | File | Contents |
//! |---|---|
//! | `assistant_<safe>_config.md` | `# Assistant: <name>` header, blank line, final instructions |
//! | `assistant_<safe>_chunks.json` | JSON array of chunk strings |
//! | `assistant_<safe>_index.bin` | [`FlatL2Index`] snapshot |
//! | `assistant_<safe>_uploaded_files.json` | JSON array of ingested file names |
//!
//! Writes are not transactional across files; the last writer wins.

use crate::index::FlatL2Index;
use crate::knowledge::{Embedder, KnowledgeBase};
use hubblet_core::error::StoreError;
use hubblet_core::profile::{display_name_from_safe, sanitize_name};
use hubblet_core::AssistantProfile;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FILE_PREFIX: &str = "assistant_";
const CONFIG_SUFFIX: &str = "_config.md";
const HEADER: &str = "# Assistant:";
const LEGACY_HEADER: &str = "# Configuração do Assistente:";

/// File locations for one assistant.
#[derive(Debug, Clone)]
pub struct ProfilePaths {
    pub config: PathBuf,
    pub chunks: PathBuf,
    pub index: PathBuf,
    pub uploaded_files: PathBuf,
}

/// Everything [`ProfileStore::load`] recovered, plus what went wrong.
#[derive(Debug, Clone, Default)]
pub struct LoadedProfile {
    pub profile: AssistantProfile,
    pub knowledge: KnowledgeBase,
    /// True when any file for this assistant existed
    pub found: bool,
    pub warnings: Vec<String>,
}

impl LoadedProfile {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self, name: &str) -> ProfilePaths {
        let safe = sanitize_name(name);
        let file = |suffix: &str| self.dir.join(format!("{FILE_PREFIX}{safe}{suffix}"));
        ProfilePaths {
            config: file(CONFIG_SUFFIX),
            chunks: file("_chunks.json"),
            index: file("_index.bin"),
            uploaded_files: file("_uploaded_files.json"),
        }
    }

    /// Persist the instructions file, the index snapshot when it holds
    /// vectors, and the chunk and uploaded-file lists when there are chunks.
    /// A file with nothing to hold is removed so a later load cannot pick up
    /// stale documents. Chunks kept without an index are rebuilt on load.
    pub fn save(
        &self,
        profile: &AssistantProfile,
        knowledge: &KnowledgeBase,
    ) -> Result<ProfilePaths, StoreError> {
        let name = profile.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidName(profile.name.clone()));
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let paths = self.paths(name);

        let instructions = profile.final_instructions.as_deref().unwrap_or_default();
        let config = format!("{HEADER} {name}\n\n{instructions}");
        write_file(&paths.config, config.as_bytes())?;

        match knowledge.index().filter(|i| !i.is_empty()) {
            Some(index) => index.save(&paths.index)?,
            None => remove_file(&paths.index)?,
        }
        if knowledge.chunks().is_empty() {
            remove_file(&paths.chunks)?;
            remove_file(&paths.uploaded_files)?;
        } else {
            write_json(&paths.chunks, knowledge.chunks())?;
            write_json(&paths.uploaded_files, knowledge.uploaded_files())?;
        }

        info!(
            assistant = %name,
            chunks = knowledge.chunks().len(),
            "Assistant profile saved"
        );
        Ok(paths)
    }

    /// Load an assistant, tolerating any subset of its files being absent.
    ///
    /// When chunks exist but the index does not, the index is rebuilt from
    /// the chunks (if an embedder is available) and written back. Failures
    /// fall back to empty defaults and are reported as warnings.
    pub async fn load(&self, name: &str, embedder: Option<&Embedder>) -> LoadedProfile {
        let mut loaded = LoadedProfile {
            profile: AssistantProfile::named(name.trim()),
            ..LoadedProfile::default()
        };
        if name.trim().is_empty() {
            return loaded;
        }
        let paths = self.paths(name);

        if paths.config.exists() {
            loaded.found = true;
            match std::fs::read_to_string(&paths.config) {
                Ok(content) => {
                    let (display, instructions) = parse_config(&content);
                    if let Some(display) = display {
                        loaded.profile.name = display;
                    }
                    loaded.profile.final_instructions =
                        Some(instructions).filter(|s| !s.trim().is_empty());
                }
                Err(e) => loaded.warn(format!(
                    "Could not read instructions for '{name}': {e}"
                )),
            }
        }

        match (paths.chunks.exists(), paths.index.exists()) {
            (true, true) => {
                loaded.found = true;
                match read_knowledge(&paths) {
                    Ok(kb) => loaded.knowledge = kb,
                    Err(e) => {
                        loaded.warn(format!(
                            "Could not load documents for '{name}': {e}. Starting with an empty knowledge base"
                        ));
                        loaded.knowledge = KnowledgeBase::new();
                    }
                }
            }
            (true, false) => {
                loaded.found = true;
                loaded.warn(format!(
                    "Chunks for '{name}' found without an index; rebuilding"
                ));
                self.rebuild(&paths, embedder, &mut loaded).await;
            }
            _ => debug!(assistant = %name, "No stored documents"),
        }

        loaded
    }

    async fn rebuild(
        &self,
        paths: &ProfilePaths,
        embedder: Option<&Embedder>,
        loaded: &mut LoadedProfile,
    ) {
        let chunks: Vec<String> = match read_json(&paths.chunks) {
            Ok(chunks) => chunks,
            Err(e) => {
                loaded.warn(format!("Could not read stored chunks: {e}"));
                return;
            }
        };
        let uploaded: Vec<String> = read_json_or_default(&paths.uploaded_files, loaded);
        let mut kb = KnowledgeBase::from_parts(chunks, None, uploaded);

        let Some(embedder) = embedder else {
            loaded.warn("No embedding provider available; documents stay unsearchable until the index is rebuilt".into());
            loaded.knowledge = kb;
            return;
        };
        if kb.chunks().is_empty() {
            loaded.knowledge = kb;
            return;
        }

        let before = kb.chunks().len();
        let report = kb.rebuild_index(embedder).await;
        loaded.warnings.extend(report.warnings);

        if let Some(index) = kb.index() {
            let result = index.save(&paths.index).and_then(|()| {
                if kb.chunks().len() != before {
                    write_json(&paths.chunks, kb.chunks())
                } else {
                    Ok(())
                }
            });
            match result {
                Ok(()) => info!(vectors = index.len(), "Rebuilt index saved"),
                Err(e) => loaded.warn(format!("Could not save rebuilt index: {e}")),
            }
        } else {
            loaded.warn("Could not rebuild the index: no chunk could be embedded".into());
        }
        loaded.knowledge = kb;
    }

    /// Display names of all saved assistants, deduplicated and sorted.
    pub fn list(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "Profile directory not readable");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                let safe = file_name
                    .strip_prefix(FILE_PREFIX)?
                    .strip_suffix(CONFIG_SUFFIX)?
                    .to_string();
                if safe.is_empty() {
                    return None;
                }
                let header = std::fs::read_to_string(entry.path())
                    .ok()
                    .and_then(|content| parse_config(&content).0);
                Some(header.unwrap_or_else(|| display_name_from_safe(&safe)))
            })
            .collect();

        names.sort();
        names.dedup();
        names
    }
}

/// Split a config file into (display name from header, instructions).
fn parse_config(content: &str) -> (Option<String>, String) {
    let (first, rest) = content.split_once('\n').unwrap_or((content, ""));
    let header = [HEADER, LEGACY_HEADER]
        .iter()
        .find_map(|h| first.trim_end().strip_prefix(h))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    match header {
        Some(name) => (Some(name), rest.trim_start_matches(['\r', '\n']).to_string()),
        None => (None, content.to_string()),
    }
}

fn read_knowledge(paths: &ProfilePaths) -> Result<KnowledgeBase, StoreError> {
    let chunks: Vec<String> = read_json(&paths.chunks)?;
    let index = FlatL2Index::load(&paths.index)?;
    let uploaded: Vec<String> = if paths.uploaded_files.exists() {
        read_json(&paths.uploaded_files)?
    } else {
        Vec::new()
    };
    Ok(KnowledgeBase::from_parts(chunks, Some(index), uploaded))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StoreError::corrupt(path, e))
}

fn read_json_or_default<T: serde::de::DeserializeOwned + Default>(
    path: &Path,
    loaded: &mut LoadedProfile,
) -> T {
    if !path.exists() {
        return T::default();
    }
    read_json(path).unwrap_or_else(|e| {
        loaded.warn(format!("{e}"));
        T::default()
    })
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::io(path, e))?;
    write_file(path, json.as_bytes())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    std::fs::write(path, bytes).map_err(|e| StoreError::io(path, e))
}

fn remove_file(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale document file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::tests::{stub_vector, StubEmbeddings};
    use crate::knowledge::{IngestOptions, SourceFile};

    fn profile(name: &str, instructions: Option<&str>) -> AssistantProfile {
        AssistantProfile {
            final_instructions: instructions.map(String::from),
            ..AssistantProfile::named(name)
        }
    }

    async fn sample_knowledge() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.ingest(
            &[
                SourceFile::new("faq.md", "refunds take five days"),
                SourceFile::new("policy.txt", "shipping is free over fifty"),
            ],
            &StubEmbeddings::embedder(None),
            &IngestOptions {
                chunk_size: 10,
                ..IngestOptions::default()
            },
        )
        .await;
        kb
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let kb = sample_knowledge().await;
        let saved = profile("Sales Helper", Some("Answer politely.\nUse the FAQ."));

        let paths = store.save(&saved, &kb).unwrap();
        assert!(paths.config.ends_with("assistant_sales_helper_config.md"));
        assert!(paths.index.exists());

        let loaded = store.load("sales helper", None).await;
        assert!(loaded.found);
        assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
        assert_eq!(loaded.profile.name, "Sales Helper");
        assert_eq!(
            loaded.profile.final_instructions.as_deref(),
            Some("Answer politely.\nUse the FAQ.")
        );
        assert_eq!(loaded.knowledge.chunks(), kb.chunks());
        assert_eq!(loaded.knowledge.uploaded_files(), &["faq.md", "policy.txt"]);

        let query = stub_vector("shipping i");
        assert_eq!(
            loaded.knowledge.nearest_chunks(&query, 3).unwrap(),
            kb.nearest_chunks(&query, 3).unwrap()
        );
    }

    #[tokio::test]
    async fn empty_index_writes_only_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let paths = store
            .save(&profile("Plain", Some("Be brief.")), &KnowledgeBase::new())
            .unwrap();

        assert!(paths.config.exists());
        assert!(!paths.chunks.exists());
        assert!(!paths.index.exists());
        assert!(!paths.uploaded_files.exists());
    }

    #[tokio::test]
    async fn resave_without_documents_removes_old_ones() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let paths = store
            .save(&profile("Aurora", Some("v1")), &sample_knowledge().await)
            .unwrap();
        assert!(paths.chunks.exists() && paths.index.exists() && paths.uploaded_files.exists());

        store
            .save(&profile("Aurora", Some("v2")), &KnowledgeBase::new())
            .unwrap();
        assert!(!paths.chunks.exists());
        assert!(!paths.index.exists());
        assert!(!paths.uploaded_files.exists());

        let loaded = store.load("Aurora", None).await;
        assert_eq!(loaded.profile.final_instructions.as_deref(), Some("v2"));
        assert!(loaded.knowledge.chunks().is_empty());
        assert!(loaded.knowledge.uploaded_files().is_empty());
        assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
    }

    #[tokio::test]
    async fn unindexed_chunks_survive_a_resave() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let paths = store
            .save(&profile("Docs", None), &sample_knowledge().await)
            .unwrap();
        std::fs::remove_file(&paths.index).unwrap();

        let loaded = store.load("Docs", None).await;
        store.save(&profile("Docs", Some("edited")), &loaded.knowledge).unwrap();
        assert!(paths.chunks.exists());
        assert!(!paths.index.exists());

        let embedder = StubEmbeddings::embedder(None);
        let rebuilt = store.load("Docs", Some(&embedder)).await;
        assert_eq!(rebuilt.knowledge.chunks(), loaded.knowledge.chunks());
        assert!(rebuilt.knowledge.is_paired());
    }

    #[tokio::test]
    async fn path_like_names_stay_in_the_profile_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("assistants"));
        let paths = store.save(&profile("../Escape/Bot", Some("x")), &KnowledgeBase::new()).unwrap();
        assert_eq!(paths.config.parent(), Some(store.dir()));
        assert!(paths.config.exists());
        assert_eq!(store.list(), vec!["../Escape/Bot"]);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let err = store
            .save(&profile("   ", None), &KnowledgeBase::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }

    #[tokio::test]
    async fn missing_assistant_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("not-created-yet"));
        let loaded = store.load("Ghost", None).await;
        assert!(!loaded.found);
        assert_eq!(loaded.profile.name, "Ghost");
        assert!(loaded.profile.final_instructions.is_none());
        assert!(loaded.knowledge.is_empty());
    }

    #[tokio::test]
    async fn missing_index_is_rebuilt_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let kb = sample_knowledge().await;
        let paths = store.save(&profile("Docs", Some("x")), &kb).unwrap();
        std::fs::remove_file(&paths.index).unwrap();

        let embedder = StubEmbeddings::embedder(None);
        let loaded = store.load("Docs", Some(&embedder)).await;
        assert_eq!(loaded.knowledge.index_len(), kb.chunks().len());
        assert!(paths.index.exists());

        let again = store.load("Docs", None).await;
        assert!(again.warnings.is_empty());
        assert_eq!(again.knowledge.index_len(), kb.chunks().len());
    }

    #[tokio::test]
    async fn missing_index_without_embedder_keeps_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let paths = store
            .save(&profile("Docs", None), &sample_knowledge().await)
            .unwrap();
        std::fs::remove_file(&paths.index).unwrap();

        let loaded = store.load("Docs", None).await;
        assert!(!loaded.knowledge.chunks().is_empty());
        assert!(loaded.knowledge.is_empty());
        assert!(!loaded.warnings.is_empty());
    }

    #[tokio::test]
    async fn corrupt_chunks_fall_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let paths = store
            .save(&profile("Broken", Some("keep me")), &sample_knowledge().await)
            .unwrap();
        std::fs::write(&paths.chunks, "{not json").unwrap();

        let loaded = store.load("Broken", None).await;
        assert_eq!(loaded.profile.final_instructions.as_deref(), Some("keep me"));
        assert!(loaded.knowledge.chunks().is_empty());
        assert!(loaded.knowledge.uploaded_files().is_empty());
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[tokio::test]
    async fn list_prefers_header_then_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        store
            .save(&profile("McKinsey Bot", None), &KnowledgeBase::new())
            .unwrap();
        std::fs::write(dir.path().join("assistant_old_helper_config.md"), "legacy text").unwrap();
        std::fs::write(dir.path().join("assistant_old_helper_chunks.json"), "[]").unwrap();
        std::fs::write(dir.path().join("unrelated.md"), "x").unwrap();

        assert_eq!(store.list(), vec!["McKinsey Bot", "Old Helper"]);
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let store = ProfileStore::new("/nonexistent/hubblet/assistants");
        assert!(store.list().is_empty());
    }

    #[test]
    fn parse_config_variants() {
        let (name, body) = parse_config("# Assistant: Aurora\n\nBe kind.");
        assert_eq!(name.as_deref(), Some("Aurora"));
        assert_eq!(body, "Be kind.");

        let (name, body) = parse_config("# Configuração do Assistente: Vendas\n\nSeja breve.");
        assert_eq!(name.as_deref(), Some("Vendas"));
        assert_eq!(body, "Seja breve.");

        let (name, body) = parse_config("No header here.");
        assert!(name.is_none());
        assert_eq!(body, "No header here.");
    }
}
