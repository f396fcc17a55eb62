//! Document data structures and per-session state
//!
//! This module provides the open-file table entries, the server configuration,
//! and the session context that owns client capability flags and the
//! per-document settings cache.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use tower_lsp::lsp_types::{ClientCapabilities, PositionEncodingKind, Url};

use crate::types::PositionEncoding;

/// Configuration section requested from the client
pub const CONFIGURATION_SECTION: &str = "lmc";

/// Configuration for the language server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Published diagnostics are truncated to this many entries
    pub max_number_of_problems: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            max_number_of_problems: 1000,
        }
    }
}

impl Configuration {
    /// Overlay the keys present in a settings object. Accepts either the
    /// section itself or an object wrapping it under `lmc`.
    pub fn update_from_json(&mut self, value: &Value) {
        let section = value.get(CONFIGURATION_SECTION).unwrap_or(value);

        self.max_number_of_problems = section
            .get("maxNumberOfProblems")
            .and_then(Value::as_u64)
            .map(|x| x as usize)
            .unwrap_or(self.max_number_of_problems);
    }

    pub fn from_json(value: &Value) -> Self {
        let mut config = Configuration::default();
        config.update_from_json(value);
        config
    }
}

/// What the client told us it supports, captured once at `initialize`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCapabilities {
    pub configuration: bool,
    pub workspace_folders: bool,
    pub related_information: bool,
    pub position_encoding: PositionEncoding,
}

impl From<&ClientCapabilities> for SessionCapabilities {
    fn from(capabilities: &ClientCapabilities) -> Self {
        let workspace = capabilities.workspace.as_ref();
        SessionCapabilities {
            configuration: workspace.and_then(|w| w.configuration).unwrap_or(false),
            workspace_folders: workspace.and_then(|w| w.workspace_folders).unwrap_or(false),
            related_information: capabilities
                .text_document
                .as_ref()
                .and_then(|t| t.publish_diagnostics.as_ref())
                .and_then(|p| p.related_information)
                .unwrap_or(false),
            position_encoding: capabilities
                .general
                .as_ref()
                .and_then(|g| g.position_encodings.as_ref())
                .filter(|encodings| encodings.contains(&PositionEncodingKind::UTF32))
                .map_or(PositionEncoding::Utf16, |_| PositionEncoding::Utf32),
        }
    }
}

/// Per-session context: capability flags, global settings, and settings
/// fetched per document. Cached settings live from first use until the
/// document closes or the configuration changes.
#[derive(Debug, Default)]
pub struct SessionContext {
    capabilities: RwLock<SessionCapabilities>,
    global_settings: RwLock<Configuration>,
    document_settings: DashMap<Url, Configuration>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capabilities(&self) -> SessionCapabilities {
        *self.capabilities.read()
    }

    pub fn set_capabilities(&self, capabilities: SessionCapabilities) {
        *self.capabilities.write() = capabilities;
    }

    pub fn position_encoding(&self) -> PositionEncoding {
        self.capabilities.read().position_encoding
    }

    pub fn global_settings(&self) -> Configuration {
        self.global_settings.read().clone()
    }

    /// Replace the global settings; keys missing from `value` fall back to
    /// their defaults
    pub fn set_global_settings(&self, value: &Value) {
        *self.global_settings.write() = Configuration::from_json(value);
    }

    pub fn cached_settings(&self, uri: &Url) -> Option<Configuration> {
        self.document_settings.get(uri).map(|entry| entry.value().clone())
    }

    pub fn cache_settings(&self, uri: Url, settings: Configuration) {
        self.document_settings.insert(uri, settings);
    }

    /// Drop the cached settings of a closed document
    pub fn forget_document(&self, uri: &Url) {
        self.document_settings.remove(uri);
    }

    pub fn clear_document_settings(&self) {
        self.document_settings.clear();
    }

    pub fn cached_document_count(&self) -> usize {
        self.document_settings.len()
    }
}

/// Document data: the full current text and its revision markers
#[derive(Debug, Clone)]
pub struct DocumentData {
    pub url: Url,
    pub content: String,
    /// Client-supplied version, echoed back when publishing
    pub version: Option<i32>,
    /// Bumped on every content update; a finished analysis only publishes
    /// while its generation is still current
    pub generation: u64,
}

/// Complete file data for an open document
#[derive(Debug, Clone)]
pub struct FileData {
    pub document_data: DocumentData,
}
