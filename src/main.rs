//! # LMC Language Server (lmclsp)
//!
//! A Language Server Protocol implementation for Little Man Computer assembly.
//! The analysis itself lives in the `lmclsp` library; this binary hosts it
//! behind `tower-lsp` and adds the editor plumbing around it.
//!
//! ## Key Features
//! - Diagnostics for labels, mnemonics and operands, published after a short debounce
//! - Quick fixes for every diagnostic that has a mechanical correction
//! - Starter templates offered as code actions on empty documents
//! - Keyword completion, hover documentation, go-to-definition and document symbols
//! - A `--diagnose` mode that prints diagnostics for files without an editor

use std::collections::HashMap;
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::RwLock,
};
use tower_lsp::{async_trait, jsonrpc::Result, lsp_types::*, Client};
use tower_lsp::{LanguageServer, LspService, Server};

/// Command-line interface handling
mod cli;

/// Performance benchmarking and tracking
mod performance;

/// Enhanced tooltip/hover documentation with examples
mod tooltip_documentation;

/// Type conversions and position/range utilities
mod types;

/// Document data, configuration and session state
mod document;

/// Diagnostic conversion helpers
mod diagnostic_helpers;

/// LSP completion handler
mod lsp_completion;

/// LSP diagnostics handler
mod lsp_diagnostics;

/// LSP hover handler
mod lsp_hover;

/// LSP handlers for code actions, goto definition and symbols
mod lsp_handlers;

use document::*;
use types::PositionEncoding;

#[derive(Clone)]
struct Backend {
    client: Client,
    files: Arc<RwLock<HashMap<Url, FileData>>>,
    // Capability flags, global settings and per-document settings cache
    session: Arc<SessionContext>,
    // Runtime flag to allow diagnostics suppression without restart
    diagnostics_enabled: Arc<RwLock<bool>>,
    perf_tracker: Arc<performance::PerformanceTracker>,
    // Debounce: pending diagnostic task per file
    pending_diagnostics: Arc<tokio::sync::Mutex<HashMap<Url, tokio::task::JoinHandle<()>>>>,
    // Diagnostics by content hash
    diagnostic_cache: Arc<dashmap::DashMap<String, Vec<Diagnostic>>>,
}

const DIAGNOSTIC_DEBOUNCE_MS: u64 = 250;
const DIAGNOSTIC_DEBOUNCE_LARGE_FILE_MS: u64 = 400; // For files >500 lines
const LARGE_FILE_LINES: usize = 500;

const DEFAULT_PORT: u16 = 9257;

#[async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let capabilities = SessionCapabilities::from(&params.capabilities);
        self.session.set_capabilities(capabilities);
        self.client
            .log_message(
                MessageType::INFO,
                format!(
                    "Initialize called: configuration={} workspaceFolders={} relatedInformation={} positionEncoding={:?}",
                    capabilities.configuration,
                    capabilities.workspace_folders,
                    capabilities.related_information,
                    capabilities.position_encoding
                ),
            )
            .await;

        if let Some(init_options) = params.initialization_options {
            self.session.set_global_settings(&init_options);
            self.client
                .log_message(
                    MessageType::INFO,
                    format!(
                        "Initial config - maxNumberOfProblems: {}",
                        self.session.global_settings().max_number_of_problems
                    ),
                )
                .await;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        "version".to_string(),
                        "setDiagnostics".to_string(),
                        "lmc.server.enableBenchmarking".to_string(),
                        "lmc.server.getBenchmarkReport".to_string(),
                    ],
                    work_done_progress_options: WorkDoneProgressOptions {
                        work_done_progress: None,
                    },
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                        ..Default::default()
                    },
                )),
                // UTF-16 is the protocol default and needs no announcement
                position_encoding: (capabilities.position_encoding == PositionEncoding::Utf32)
                    .then_some(PositionEncodingKind::UTF32),
                document_symbol_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                workspace: capabilities.workspace_folders.then(|| WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: None,
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "lmclsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        if !self.session.capabilities().configuration {
            return;
        }
        let registration = Registration {
            id: "lmc-configuration".to_string(),
            method: "workspace/didChangeConfiguration".to_string(),
            register_options: None,
        };
        if let Err(err) = self.client.register_capability(vec![registration]).await {
            self.client
                .log_message(
                    MessageType::WARNING,
                    format!("Could not register for configuration changes: {}", err),
                )
                .await;
        }
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        match params.command.as_str() {
            "version" => {
                self.client
                    .show_message(
                        MessageType::INFO,
                        concat!("LMC LSP Version: ", env!("CARGO_PKG_VERSION")),
                    )
                    .await;
            }
            "setDiagnostics" => {
                if let Some(enabled) = params.arguments.first().and_then(Value::as_bool) {
                    *self.diagnostics_enabled.write().await = enabled;
                    // re-run or clear diagnostics for all open documents
                    self.refresh_all_diagnostics().await;
                }
            }
            "lmc.server.enableBenchmarking" => {
                if let Some(enabled) = params.arguments.first().and_then(Value::as_bool) {
                    self.perf_tracker.set_enabled(enabled);
                    let message = if enabled {
                        "LMC LSP Server benchmarking enabled. Collecting performance data..."
                    } else {
                        "LMC LSP Server benchmarking disabled."
                    };
                    self.client.show_message(MessageType::INFO, message).await;
                }
            }
            "lmc.server.getBenchmarkReport" => {
                let report = self.perf_tracker.generate_report();
                self.client.log_message(MessageType::INFO, report.clone()).await;
                return Ok(Some(Value::String(report)));
            }
            _ => {}
        }
        Ok(None)
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.update_content(
            uri.clone(),
            params.text_document.text,
            Some(params.text_document.version),
        )
        .await;
        self.client
            .log_message(MessageType::INFO, format!("Opened {}", uri))
            .await;

        self.run_diagnostics(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // Full sync: the last change carries the whole document
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.update_content(uri.clone(), change.text, Some(params.text_document.version))
            .await;

        let debounce_ms = {
            let files = self.files.read().await;
            match files.get(&uri) {
                Some(file_data)
                    if file_data.document_data.content.lines().count() > LARGE_FILE_LINES =>
                {
                    DIAGNOSTIC_DEBOUNCE_LARGE_FILE_MS
                }
                _ => DIAGNOSTIC_DEBOUNCE_MS,
            }
        };

        // Diagnostics run X ms after the LAST change
        let mut pending = self.pending_diagnostics.lock().await;
        if let Some(handle) = pending.remove(&uri) {
            handle.abort();
        }

        let backend = self.clone();
        let uri_for_task = uri.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(debounce_ms)).await;
            backend.run_diagnostics(&uri_for_task).await;
            backend.pending_diagnostics.lock().await.remove(&uri_for_task);
        });
        pending.insert(uri, handle);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(handle) = self.pending_diagnostics.lock().await.remove(&uri) {
            handle.abort();
        }
        self.files.write().await.remove(&uri);
        self.session.forget_document(&uri);

        self.client.publish_diagnostics(uri.clone(), vec![], None).await;
        self.client
            .log_message(
                MessageType::INFO,
                format!(
                    "Closed {} ({} documents with cached settings)",
                    uri,
                    self.session.cached_document_count()
                ),
            )
            .await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if self.session.capabilities().configuration {
            self.session.clear_document_settings();
        } else {
            self.session.set_global_settings(&params.settings);
        }
        self.client
            .log_message(
                MessageType::INFO,
                format!(
                    "Configuration changed: {}",
                    serde_json::to_string(&params.settings)
                        .unwrap_or_else(|_| "Failed to serialize".to_string())
                ),
            )
            .await;

        self.refresh_all_diagnostics().await;
    }

    async fn did_change_workspace_folders(&self, _params: DidChangeWorkspaceFoldersParams) {
        self.client
            .log_message(MessageType::INFO, "Workspace folder change event received.")
            .await;
    }

    async fn did_change_watched_files(&self, _params: DidChangeWatchedFilesParams) {
        self.client
            .log_message(MessageType::INFO, "We received a file change event")
            .await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        lsp_completion::handle_completion(self, params).await
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        lsp_hover::handle_hover(self, params).await
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        lsp_handlers::handle_goto_definition(self, params).await
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        lsp_handlers::handle_document_symbol(self, params).await
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        lsp_handlers::handle_code_action(self, params).await
    }
}

impl Backend {
    fn new(client: Client) -> Self {
        Backend {
            client,
            files: Arc::new(RwLock::new(HashMap::new())),
            session: Arc::new(SessionContext::new()),
            diagnostics_enabled: Arc::new(RwLock::new(true)),
            perf_tracker: Arc::new(performance::PerformanceTracker::new()),
            pending_diagnostics: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            diagnostic_cache: Arc::new(dashmap::DashMap::new()),
        }
    }

    async fn update_content(&self, uri: Url, text: String, version: Option<i32>) {
        let mut files = self.files.write().await;
        match files.entry(uri) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                let url = entry.key().clone();
                entry.insert(FileData {
                    document_data: DocumentData {
                        url,
                        content: text,
                        version,
                        generation: 0,
                    },
                });
            }
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                let document = &mut entry.get_mut().document_data;
                document.content = text;
                document.version = version;
                document.generation += 1;
            }
        }
    }

    /// Settings that apply to `uri`: fetched from the client and cached when
    /// it supports workspace configuration, the global settings otherwise
    async fn document_settings(&self, uri: &Url) -> Configuration {
        if !self.session.capabilities().configuration {
            return self.session.global_settings();
        }
        if let Some(settings) = self.session.cached_settings(uri) {
            return settings;
        }

        let items = vec![ConfigurationItem {
            scope_uri: Some(uri.clone()),
            section: Some(CONFIGURATION_SECTION.to_string()),
        }];
        match self.client.configuration(items).await {
            Ok(values) => {
                let settings = values
                    .first()
                    .map(Configuration::from_json)
                    .unwrap_or_default();
                self.session.cache_settings(uri.clone(), settings.clone());
                settings
            }
            Err(err) => {
                self.client
                    .log_message(
                        MessageType::WARNING,
                        format!("workspace/configuration failed for {}: {}", uri, err),
                    )
                    .await;
                self.session.global_settings()
            }
        }
    }

    async fn refresh_all_diagnostics(&self) {
        let uris = {
            let files = self.files.read().await;
            files.keys().cloned().collect::<Vec<_>>()
        };
        for uri in uris {
            self.run_diagnostics(&uri).await;
        }
    }

    /// Run full diagnostics on a document - delegates to lsp_diagnostics module
    async fn run_diagnostics(&self, uri: &Url) {
        lsp_diagnostics::run_diagnostics(self, uri).await
    }
}

fn severity_label(severity: Option<DiagnosticSeverity>) -> &'static str {
    match severity {
        Some(DiagnosticSeverity::ERROR) => "ERROR",
        Some(DiagnosticSeverity::WARNING) => "WARN",
        Some(DiagnosticSeverity::INFORMATION) => "INFO",
        Some(DiagnosticSeverity::HINT) => "HINT",
        _ => "UNKNOWN",
    }
}

/// One output line of the `--diagnose` runner
fn format_diagnostic(d: &Diagnostic) -> String {
    let code = match &d.code {
        Some(NumberOrString::String(code)) => format!(" [{}]", code),
        Some(NumberOrString::Number(code)) => format!(" [{}]", code),
        None => String::new(),
    };
    format!(
        "  {}:{}:{} - {}{}",
        severity_label(d.severity),
        d.range.start.line,
        d.range.start.character,
        d.message,
        code
    )
}

fn run_diagnose(cli: &cli::Cli) {
    for path in &cli.diagnose {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        // terminal columns count characters
        let mut diagnostics =
            lsp_diagnostics::compute_diagnostics_for_text(&content, PositionEncoding::Utf32);
        diagnostics.truncate(cli.max_problems);

        println!("Diagnostics for {}:", path.display());
        if diagnostics.is_empty() {
            println!("  (no diagnostics)");
        }
        for d in &diagnostics {
            println!("{}", format_diagnostic(d));
        }
        println!();
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    use clap::Parser as _;
    let cli = cli::Cli::parse();

    // Diagnostic runner mode: print diagnostics for each file, then exit
    if !cli.diagnose.is_empty() {
        run_diagnose(&cli);
        return Ok(());
    }

    let (service, socket) = LspService::new(Backend::new);

    if !cli.listen && cli.host.is_none() {
        Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
            .serve(service)
            .await;
    } else if cli.listen {
        let host = cli
            .host
            .as_deref()
            .unwrap_or("127.0.0.1")
            .parse::<Ipv4Addr>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let port = cli.port.unwrap_or(DEFAULT_PORT);

        let stream = {
            let listener = TcpListener::bind((host, port)).await?;
            let (stream, _) = listener.accept().await?;
            stream
        };

        let (input, output) = tokio::io::split(stream);
        Server::new(input, output, socket).serve(service).await;
    } else {
        let (Some(host), Some(port)) = (cli.host, cli.port) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--host requires --port",
            ));
        };

        let stream = TcpStream::connect((host, port)).await?;
        let (input, output) = tokio::io::split(stream);
        Server::new(input, output, socket).serve(service).await;
    }
    Ok(())
}
