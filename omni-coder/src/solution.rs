//! The shape of a `solve` answer and the best-effort parser for model replies

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// A generated solution, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Solution {
    Web(WebSolution),
    Logic(LogicSolution),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSolution {
    #[serde(default, deserialize_with = "lenient_string")]
    pub html: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub css: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub js: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicSolution {
    #[serde(default, deserialize_with = "lenient_string")]
    pub explanation: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(default = "default_language", deserialize_with = "lenient_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_option")]
    pub complexity: Option<String>,
}

fn default_language() -> String {
    "text".to_string()
}

impl Solution {
    /// The shape used whenever no real solution is available
    pub fn logic_error(message: impl Into<String>) -> Self {
        Solution::Logic(LogicSolution {
            explanation: message.into(),
            code: String::new(),
            language: default_language(),
            complexity: None,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Solution::Web(_) => "web",
            Solution::Logic(_) => "logic",
        }
    }

    /// A standalone HTML document for web solutions; `None` for logic ones
    pub fn preview_document(&self) -> Option<String> {
        match self {
            Solution::Web(web) => Some(web.preview_document()),
            Solution::Logic(_) => None,
        }
    }
}

impl WebSolution {
    /// CSS goes in the head, the markup in the body, and the script last so
    /// it sees the DOM. Script errors are caught and logged to the console.
    pub fn preview_document(&self) -> String {
        format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             <meta charset=\"utf-8\">\n\
             <style>\n{css}\n</style>\n\
             </head>\n\
             <body>\n\
             {html}\n\
             <script>\n\
             try {{\n{js}\n}} catch (err) {{\n  console.error(err);\n}}\n\
             </script>\n\
             </body>\n\
             </html>\n",
            css = self.css,
            html = self.html,
            js = self.js,
        )
    }
}

/// Parse a model reply into a `Solution`.
///
/// Markdown fences are stripped first. Anything that still fails to parse
/// becomes a logic solution whose explanation is the raw reply.
pub fn parse_solution(raw: &str) -> Solution {
    let cleaned = raw.replace("```json", "").replace("```", "");
    match serde_json::from_str::<Solution>(cleaned.trim()) {
        Ok(solution) => solution,
        Err(e) => {
            warn!(
                error = %e,
                reply_len = raw.len(),
                "model reply is not a solution object, falling back to raw text"
            );
            Solution::logic_error(raw)
        }
    }
}

// ============================================================================
// Lenient field decoding - models emit nulls and numbers where strings belong
// ============================================================================

fn value_to_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_text(value).unwrap_or_default())
}

fn lenient_language<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_text(value)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_language))
}

fn lenient_option<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_text(value).filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_logic_solution() {
        let raw = r#"{"type":"logic","explanation":"Use two pointers.","code":"def rev(xs): return xs[::-1]","language":"python","complexity":"Time: O(n) | Space: O(n)"}"#;
        match parse_solution(raw) {
            Solution::Logic(logic) => {
                assert_eq!(logic.language, "python");
                assert_eq!(logic.complexity.as_deref(), Some("Time: O(n) | Space: O(n)"));
                assert!(logic.code.starts_with("def rev"));
            }
            other => panic!("expected logic, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_web_solution_inside_fences() {
        let raw = "```json\n{\"type\":\"web\",\"html\":\"<button>Go</button>\",\"css\":\"button{color:red}\"}\n```";
        let solution = parse_solution(raw);
        assert_eq!(
            solution,
            Solution::Web(WebSolution {
                html: "<button>Go</button>".into(),
                css: "button{color:red}".into(),
                js: String::new(),
            })
        );
    }

    #[test]
    fn test_fallback_keeps_raw_reply() {
        let raw = "  Sorry, here is prose instead of JSON.  ";
        assert_eq!(parse_solution(raw), Solution::logic_error(raw));

        let unknown_type = r#"{"type":"essay","body":"..."}"#;
        assert_eq!(parse_solution(unknown_type), Solution::logic_error(unknown_type));
    }

    #[test]
    fn test_lenient_fields() {
        let raw = json!({
            "type": "logic",
            "explanation": null,
            "code": 42,
            "language": "",
            "complexity": { "time": "O(1)" }
        })
        .to_string();

        match parse_solution(&raw) {
            Solution::Logic(logic) => {
                assert_eq!(logic.explanation, "");
                assert_eq!(logic.code, "42");
                assert_eq!(logic.language, "text");
                assert_eq!(logic.complexity.as_deref(), Some(r#"{"time":"O(1)"}"#));
            }
            other => panic!("expected logic, got {:?}", other),
        }
    }

    #[test]
    fn test_serialize_shape() {
        let value = serde_json::to_value(Solution::logic_error("**Error**: boom")).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "logic",
                "explanation": "**Error**: boom",
                "code": "",
                "language": "text"
            })
        );

        let web = serde_json::to_value(Solution::Web(WebSolution::default())).unwrap();
        assert_eq!(web, json!({ "type": "web", "html": "", "css": "", "js": "" }));
    }

    #[test]
    fn test_preview_document() {
        let web = Solution::Web(WebSolution {
            html: "<h1 id=\"t\">Hi</h1>".into(),
            css: "h1 { color: teal; }".into(),
            js: "document.getElementById('t').textContent = 'Bye';".into(),
        });
        let doc = web.preview_document().unwrap();

        assert!(doc.starts_with("<!DOCTYPE html>"));
        let style = doc.find("h1 { color: teal; }").unwrap();
        let body = doc.find("<h1 id=\"t\">Hi</h1>").unwrap();
        let script = doc.find("textContent = 'Bye'").unwrap();
        assert!(style < body && body < script);
        assert!(doc.contains("catch (err)"));

        assert!(Solution::logic_error("x").preview_document().is_none());
    }
}
