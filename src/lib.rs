//! # LMC Analysis Library
//!
//! The analysis core behind the LMC language server. Everything in here is a
//! pure, synchronous function of the document text: no protocol types, no
//! shared state.
//!
//! ## Modules
//! - `span` - Zero-based positions and half-open ranges
//! - `instructions` - The LMC mnemonic catalog and its documentation
//! - `parser` - Turns source text into per-line records
//! - `labels` - Label table construction and duplicate detection
//! - `operand` - Operand classification and the numeric domain
//! - `validator` - Per-line instruction/operand rules and diagnostic kinds
//! - `analysis` - The `analyze` entry point tying the passes together
//! - `quick_fix` - Corrective edit suggestions for diagnostics
//! - `templates` - Example programs offered for empty documents

pub mod analysis;
pub mod instructions;
pub mod labels;
pub mod operand;
pub mod parser;
pub mod quick_fix;
pub mod span;
pub mod templates;
pub mod validator;

pub use analysis::{analyze, Analysis};
pub use validator::{DiagnosticKind, LmcDiagnostic, DIAGNOSTIC_SOURCE};
