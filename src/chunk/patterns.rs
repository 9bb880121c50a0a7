//! Per-language line-anchored boundary patterns for C1.

use regex::Regex;

pub struct LangPatterns {
    pub boundaries: Vec<Regex>,
}

const RESERVED_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "match", "else", "catch", "try", "loop",
];

pub fn is_reserved_name(name: &str) -> bool {
    name.starts_with('_') || RESERVED_NAMES.contains(&name)
}

/// Returns the boundary patterns for `language`, or `None` if the language
/// has no patterns (the chunker falls back to the sliding window).
pub fn patterns_for(language: &str) -> Option<Vec<Regex>> {
    let raw: &[&str] = match language {
        "typescript" | "javascript" => &[
            r"^\s*(?:export\s+)?(?:async\s+)?function\s+(?P<name>[A-Za-z_$][\w$]*)",
            r"^\s*(?:export\s+)?class\s+(?P<name>[A-Za-z_$][\w$]*)",
            r"^\s*(?:export\s+)?(?:default\s+)?(?:const|let)\s+(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(?:async\s*)?\(",
            r"^\s*(?:public|private|protected|static|async)*\s*(?P<name>[A-Za-z_$][\w$]*)\s*\([^)]*\)\s*\{",
        ],
        "python" => &[
            r"^\s*def\s+(?P<name>[A-Za-z_]\w*)\s*\(",
            r"^\s*class\s+(?P<name>[A-Za-z_]\w*)",
        ],
        "go" => &[
            r"^func\s+(?:\([^)]*\)\s*)?(?P<name>[A-Za-z_]\w*)\s*\(",
            r"^type\s+(?P<name>[A-Za-z_]\w*)\s+(?:struct|interface)\b",
        ],
        "rust" => &[
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(?P<name>[A-Za-z_]\w*)",
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?struct\s+(?P<name>[A-Za-z_]\w*)",
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?enum\s+(?P<name>[A-Za-z_]\w*)",
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?trait\s+(?P<name>[A-Za-z_]\w*)",
            r"^\s*impl\s+(?:<[^>]*>\s*)?(?P<name>[A-Za-z_]\w*)",
        ],
        "java" | "csharp" => &[
            r"^\s*(?:public|private|protected|static|final|async)*\s*(?:class|interface|enum)\s+(?P<name>[A-Za-z_]\w*)",
            r"^\s*(?:public|private|protected|static|final|virtual|override|async)*\s*[\w<>\[\],\s]+\s+(?P<name>[A-Za-z_]\w*)\s*\([^)]*\)\s*\{",
        ],
        "ruby" => &[
            r"^\s*def\s+(?P<name>[A-Za-z_]\w*[?!]?)",
            r"^\s*class\s+(?P<name>[A-Za-z_]\w*)",
            r"^\s*module\s+(?P<name>[A-Za-z_]\w*)",
        ],
        _ => return None,
    };
    Some(raw.iter().map(|p| Regex::new(p).unwrap()).collect())
}
