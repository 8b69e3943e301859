//! api.rs
//! Public entry points.
//!
//! Every call takes a `PipelineContext` holding the key store, dictionary and
//! config for that call. The context also keeps the signer of the last
//! successfully verified document; nothing is process-global.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use tracing::{debug, info_span};

use crate::compression::Dictionary;
use crate::config::PipelineConfig;
use crate::crypto::KeyStore;
use crate::headers::SignerInfo;
use crate::pipeline::{ActionList, ReadContext, WriteEnv};
use crate::telemetry::{TelemetrySnapshot, TelemetryTimer};
use crate::terminal::{self, DocumentHeader};
use crate::types::Result;

#[derive(Debug)]
pub struct PipelineContext {
    keys: Option<KeyStore>,
    dictionary: Dictionary,
    config: PipelineConfig,
    signer: Option<SignerInfo>,
}

impl PipelineContext {
    /// Context with the built-in dictionary and no key store.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { keys: None, dictionary: Dictionary::builtin(), config, signer: None })
    }

    pub fn with_keys(mut self, keys: KeyStore) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.dictionary = dictionary;
        self
    }

    pub fn keys(&self) -> Option<&KeyStore> {
        self.keys.as_ref()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Signer of the last document whose signature verified.
    pub fn get_signer_info(&self) -> Option<&SignerInfo> {
        self.signer.as_ref()
    }

    pub fn clear_signer_info(&mut self) {
        self.signer = None;
    }

    fn write_env(&self) -> WriteEnv<'_> {
        WriteEnv::new(self.keys.as_ref(), &self.dictionary, self.config.compression_level)
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self { keys: None, dictionary: Dictionary::builtin(), config: PipelineConfig::default(), signer: None }
    }
}

/// A fully read document.
#[derive(Debug, Clone)]
pub struct Document {
    pub header: DocumentHeader,
    pub data: Vec<u8>,
    /// Signer verified while reading, if the document was signed.
    pub signer: Option<SignerInfo>,
    pub telemetry: TelemetrySnapshot,
}

fn read_with<R: std::io::Read>(input: &mut R, cx: &mut PipelineContext) -> Result<Document> {
    cx.clear_signer_info();
    let mut timer = TelemetryTimer::new();

    let (header, data, signer, counters) = {
        let mut rcx = ReadContext::new(cx.keys.as_ref(), &cx.dictionary);
        let header = terminal::read_document(input, &mut rcx, cx.config.read_cache_size)?;
        (header, rcx.document, rcx.signer, rcx.counters)
    };

    timer.finish();
    cx.signer = signer.clone();
    debug!(bytes = data.len(), signed = signer.is_some(), "document opened");
    Ok(Document { header, data, signer, telemetry: TelemetrySnapshot::from(&counters, &timer) })
}

pub fn open(path: impl AsRef<Path>, cx: &mut PipelineContext) -> Result<Document> {
    let path = path.as_ref();
    let _span = info_span!("open", path = %path.display()).entered();
    let mut file = File::open(path)?;
    read_with(&mut file, cx)
}

pub fn open_from_memory(bytes: &[u8], cx: &mut PipelineContext) -> Result<Document> {
    let _span = info_span!("open_from_memory", len = bytes.len()).entered();
    let mut cursor = Cursor::new(bytes);
    read_with(&mut cursor, cx)
}

/// Open the document embedded in a runtime bundle.
pub fn open_runtime(path: impl AsRef<Path>, cx: &mut PipelineContext) -> Result<Document> {
    let path = path.as_ref();
    let _span = info_span!("open_runtime", path = %path.display()).entered();
    let mut file = File::open(path)?;
    terminal::locate_document(&mut file)?;
    read_with(&mut file, cx)
}

/// Write `payload` to `path` through `actions`. Returns the bytes written.
pub fn save(path: impl AsRef<Path>, payload: &[u8], actions: &ActionList, cx: &PipelineContext) -> Result<u64> {
    let path = path.as_ref();
    let _span = info_span!("save", path = %path.display(), actions = actions.len()).entered();
    let mut file = File::create(path)?;
    let mut env = cx.write_env();
    let n = terminal::write_document(&mut file, payload, actions, &mut env, cx.config.line_ending, cx.config.flags)?;
    file.sync_all()?;
    Ok(n)
}

pub fn save_to_memory(payload: &[u8], actions: &ActionList, cx: &PipelineContext) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let mut env = cx.write_env();
    terminal::write_document(&mut cursor, payload, actions, &mut env, cx.config.line_ending, cx.config.flags)?;
    Ok(cursor.into_inner())
}

/// Write `executable` followed by the document and a runtime trailer.
pub fn save_runtime(
    path: impl AsRef<Path>,
    executable: &[u8],
    payload: &[u8],
    actions: &ActionList,
    cx: &PipelineContext,
) -> Result<u64> {
    let path = path.as_ref();
    let _span = info_span!("save_runtime", path = %path.display()).entered();
    let mut file = File::create(path)?;
    let mut env = cx.write_env();
    let n = terminal::write_runtime(
        &mut file,
        executable,
        payload,
        actions,
        &mut env,
        cx.config.line_ending,
        cx.config.flags,
    )?;
    file.sync_all()?;
    Ok(n)
}
