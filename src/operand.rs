//! Operand classification
//!
//! Classification only looks at the leading character; range and label checks
//! happen afterwards in the validator.

/// Syntactic shape of an operand token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandForm<'a> {
    /// Bare decimal digits, `42`
    NumericLiteral(&'a str),
    /// `#42`; holds the text after `#` (possibly empty)
    Immediate(&'a str),
    /// `@LABEL`; holds the text after `@`
    IndirectRef(&'a str),
    /// Anything else is read as a label name
    DirectRef(&'a str),
}

impl<'a> OperandForm<'a> {
    pub fn classify(operand: &'a str) -> Self {
        if let Some(rest) = operand.strip_prefix('#') {
            OperandForm::Immediate(rest)
        } else if let Some(rest) = operand.strip_prefix('@') {
            OperandForm::IndirectRef(rest)
        } else if is_decimal_literal(operand) {
            OperandForm::NumericLiteral(operand)
        } else {
            OperandForm::DirectRef(operand)
        }
    }
}

/// One or more ASCII digits and nothing else
pub fn is_decimal_literal(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a value in the machine's numeric domain, `0..=u64::MAX`.
///
/// Anything that is not plain decimal digits fails, as does anything past
/// the 64-bit bound. Both cases are the same error to the caller.
pub fn parse_value(text: &str) -> Option<u64> {
    if !is_decimal_literal(text) {
        return None;
    }
    text.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_by_prefix() {
        assert_eq!(OperandForm::classify("12"), OperandForm::NumericLiteral("12"));
        assert_eq!(OperandForm::classify("#12"), OperandForm::Immediate("12"));
        assert_eq!(OperandForm::classify("#"), OperandForm::Immediate(""));
        assert_eq!(OperandForm::classify("@PTR"), OperandForm::IndirectRef("PTR"));
        assert_eq!(OperandForm::classify("PTR"), OperandForm::DirectRef("PTR"));
        assert_eq!(OperandForm::classify("-1"), OperandForm::DirectRef("-1"));
    }

    #[test]
    fn numeric_domain_is_u64() {
        assert_eq!(parse_value("0"), Some(0));
        assert_eq!(parse_value("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_value("18446744073709551616"), None);
        assert_eq!(parse_value("00000000000000000000000042"), Some(42));
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("+5"), None);
        assert_eq!(parse_value("-5"), None);
        assert_eq!(parse_value("0x10"), None);
        assert_eq!(parse_value("12a"), None);
    }
}
