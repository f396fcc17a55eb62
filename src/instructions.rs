//! The LMC instruction catalog.
//!
//! Eleven mnemonics, each exactly three uppercase letters. Lookups go through
//! static `phf` sets so the validator and the fix engine share one source of
//! truth.

use phf::{phf_map, phf_set};

/// Every mnemonic, in catalog order. Suggestion lists follow this order.
pub const MNEMONICS: [&str; 11] = [
    "INP", "OUT", "ADD", "SUB", "STA", "LDA", "BRA", "BRZ", "BRP", "DAT", "HLT",
];

pub const INSTRUCTIONS: phf::Set<&'static str> = phf_set!(
    "INP", "OUT", "ADD", "SUB", "STA", "LDA", "BRA", "BRZ", "BRP", "DAT", "HLT"
);

/// Instructions that never take an operand. A stray operand is ignored.
pub const NO_OPERAND: phf::Set<&'static str> = phf_set!("INP", "OUT", "HLT");

/// Branches jump to code, so a missing branch target becomes a code label.
pub const BRANCHES: phf::Set<&'static str> = phf_set!("BRA", "BRZ", "BRP");

/// The data directive; its operand is optional and follows its own rules.
pub const DAT: &str = "DAT";

/// How an instruction consumes its operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// `INP`, `OUT`, `HLT`
    None,
    /// `DAT`: optional number, label or immediate
    Data,
    /// Everything else: immediate, direct or indirect label reference
    Required,
}

pub fn is_instruction(mnemonic: &str) -> bool {
    INSTRUCTIONS.contains(mnemonic)
}

pub fn is_branch(mnemonic: &str) -> bool {
    BRANCHES.contains(mnemonic)
}

pub fn operand_kind(mnemonic: &str) -> OperandKind {
    if mnemonic == DAT {
        OperandKind::Data
    } else if NO_OPERAND.contains(mnemonic) {
        OperandKind::None
    } else {
        OperandKind::Required
    }
}

pub const INSTRUCTION_DOCS: phf::Map<&'static str, &'static str> = phf_map! {
    "INP" => "Read a value from the input tray into the accumulator.",
    "OUT" => "Copy the accumulator to the output tray.",
    "ADD" => "Add the operand to the accumulator.",
    "SUB" => "Subtract the operand from the accumulator.",
    "STA" => "Store the accumulator into the mailbox named by the operand.",
    "LDA" => "Load the operand into the accumulator.",
    "BRA" => "Branch unconditionally to the operand.",
    "BRZ" => "Branch to the operand if the accumulator is zero.",
    "BRP" => "Branch to the operand if the accumulator is zero or positive.",
    "DAT" => "Reserve a mailbox, optionally initialised with a value.",
    "HLT" => "Stop the program.",
};

/// Operand shape shown next to each mnemonic in completion lists
pub const OPERAND_SYNTAX: phf::Map<&'static str, &'static str> = phf_map! {
    "INP" => "",
    "OUT" => "",
    "HLT" => "",
    "DAT" => "[value|label|#value]",
    "ADD" => "#value|label|@label",
    "SUB" => "#value|label|@label",
    "STA" => "label|@label",
    "LDA" => "#value|label|@label",
    "BRA" => "label",
    "BRZ" => "label",
    "BRP" => "label",
};
