//! Example programs offered when a document is empty.

use phf::phf_map;

pub const TEMPLATES: phf::Map<&'static str, &'static str> = phf_map! {
    "Add two numbers" => "\
\tINP
\tSTA FIRST
\tINP
\tADD FIRST
\tOUT
\tHLT
FIRST\tDAT 0
",
    "Countdown" => "\
\tINP
LOOP\tOUT
\tSUB ONE
\tBRP LOOP
\tHLT
ONE\tDAT 1
",
    "Maximum of two" => "\
\tINP
\tSTA A
\tINP
\tSTA B
\tSUB A
\tBRP SHOWB
\tLDA A
\tOUT
\tHLT
SHOWB\tLDA B
\tOUT
\tHLT
A\tDAT 0
B\tDAT 0
",
    "Multiply two numbers" => "\
\tINP
\tSTA X
\tINP
\tSTA Y
LOOP\tLDA Y
\tBRZ DONE
\tSUB ONE
\tSTA Y
\tLDA RESULT
\tADD X
\tSTA RESULT
\tBRA LOOP
DONE\tLDA RESULT
\tOUT
\tHLT
X\tDAT 0
Y\tDAT 0
RESULT\tDAT 0
ONE\tDAT 1
",
};
