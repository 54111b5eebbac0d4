//! Languages offered to clients

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub id: &'static str,
    pub name: &'static str,
}

const fn lang(id: &'static str, name: &'static str) -> LanguageInfo {
    LanguageInfo { id, name }
}

/// Targets for `solve`; `auto` lets the model pick
pub const SOLVE_LANGUAGES: &[LanguageInfo] = &[
    lang("auto", "Auto Detect"),
    lang("python", "Python"),
    lang("javascript", "JavaScript"),
    lang("java", "Java"),
    lang("cpp", "C++"),
    lang("c", "C"),
    lang("csharp", "C#"),
    lang("go", "Go"),
    lang("rust", "Rust"),
    lang("php", "PHP"),
    lang("ruby", "Ruby"),
    lang("web", "Web (HTML/CSS/JS)"),
];

/// Languages the run simulator is offered for
pub const RUN_LANGUAGES: &[LanguageInfo] = &[
    lang("python", "Python"),
    lang("javascript", "JavaScript"),
    lang("c", "C"),
    lang("cpp", "C++"),
    lang("java", "Java"),
    lang("go", "Go"),
];

pub fn find_language(list: &[LanguageInfo], id: &str) -> Option<LanguageInfo> {
    let id = id.trim();
    list.iter().copied().find(|l| l.id.eq_ignore_ascii_case(id))
}

/// Guess a language id from a source file extension
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let id = match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "go" => "go",
        "rs" => "rust",
        "php" => "php",
        "rb" => "ruby",
        "html" | "htm" => "web",
        _ => return None,
    };
    Some(id)
}
