use phf::phf_map;

use lmclsp::instructions::{INSTRUCTION_DOCS, OPERAND_SYNTAX};

/// Short usage examples for instruction hover tooltips and completion docs

pub(crate) const INSTRUCTION_EXAMPLES: phf::Map<&'static str, &'static str> = phf_map! {
    "INP" => "INP            ; accumulator = next input",
    "OUT" => "OUT            ; print the accumulator",
    "ADD" => "ADD ONE        ; accumulator += ONE\nADD #5         ; accumulator += 5\nADD @PTR       ; accumulator += mailbox named by PTR",
    "SUB" => "SUB ONE        ; accumulator -= ONE\nSUB #1         ; accumulator -= 1",
    "STA" => "STA TOTAL      ; TOTAL = accumulator\nSTA @PTR       ; store through PTR",
    "LDA" => "LDA TOTAL      ; accumulator = TOTAL\nLDA #0         ; accumulator = 0",
    "BRA" => "BRA LOOP       ; jump to LOOP",
    "BRZ" => "BRZ DONE       ; jump to DONE if accumulator == 0",
    "BRP" => "BRP LOOP       ; jump to LOOP if accumulator >= 0",
    "DAT" => "ONE  DAT 1     ; mailbox ONE holds 1\nTMP  DAT       ; mailbox TMP, initially 0",
    "HLT" => "HLT            ; end of program",
};

pub(crate) const INSTRUCTION_CATEGORIES: phf::Map<&'static str, &'static str> = phf_map! {
    "INP" => "Input/Output",
    "OUT" => "Input/Output",
    "ADD" => "Arithmetic",
    "SUB" => "Arithmetic",
    "STA" => "Memory",
    "LDA" => "Memory",
    "BRA" => "Branch",
    "BRZ" => "Branch",
    "BRP" => "Branch",
    "DAT" => "Data",
    "HLT" => "Control",
};

/// Signature line such as `LDA #value|label|@label`
pub fn instruction_signature(mnemonic: &str) -> String {
    match OPERAND_SYNTAX.get(mnemonic) {
        Some(syntax) if !syntax.is_empty() => format!("{} {}", mnemonic, syntax),
        _ => mnemonic.to_string(),
    }
}

/// Markdown body used by hover and completion documentation
pub fn instruction_markdown(mnemonic: &str) -> Option<String> {
    let description = INSTRUCTION_DOCS.get(mnemonic)?;
    let mut md = format!("```lmc\n{}\n```\n\n{}", instruction_signature(mnemonic), description);

    if let Some(category) = INSTRUCTION_CATEGORIES.get(mnemonic) {
        md.push_str(&format!("\n\n**Category:** {}", category));
    }
    if let Some(example) = INSTRUCTION_EXAMPLES.get(mnemonic) {
        md.push_str(&format!("\n\n**Example:**\n```lmc\n{}\n```", example));
    }
    Some(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmclsp::instructions::MNEMONICS;

    #[test]
    fn every_mnemonic_is_documented() {
        for mnemonic in MNEMONICS {
            assert!(INSTRUCTION_EXAMPLES.contains_key(mnemonic), "{}", mnemonic);
            assert!(INSTRUCTION_CATEGORIES.contains_key(mnemonic), "{}", mnemonic);
            assert!(instruction_markdown(mnemonic).is_some(), "{}", mnemonic);
        }
        assert!(instruction_markdown("FOO").is_none());
    }

    #[test]
    fn signatures() {
        assert_eq!(instruction_signature("HLT"), "HLT");
        assert_eq!(instruction_signature("LDA"), "LDA #value|label|@label");
    }
}
