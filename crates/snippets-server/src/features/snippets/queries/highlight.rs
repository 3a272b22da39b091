//! Render a snippet as a standalone HTML page
//!
//! Output is escaped source wrapped in a `pre` block carrying the language
//! and style as CSS classes, with an optional line-number gutter.

use mediator::Request;
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use super::get::{load, GetSnippetError};
use crate::context::UserRef;
use crate::models::Snippet;
use crate::store::EntityStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightSnippetQuery {
    pub id: i64,
}

impl Request<Result<String, GetSnippetError>> for HighlightSnippetQuery {}

impl crate::cqrs::Query for HighlightSnippetQuery {}

pub fn render_html(snippet: &Snippet) -> String {
    let title = escape(snippet.title.as_str());
    let language = escape(snippet.language.as_str());
    let style = escape(snippet.style.as_str());

    let mut body = String::new();
    if snippet.linenos {
        let count = snippet.code.lines().count().max(1);
        let gutter: Vec<String> = (1..=count).map(|n| n.to_string()).collect();
        body.push_str(&format!(
            "<table class=\"highlighttable\"><tr><td class=\"linenos\"><pre>{}</pre></td><td class=\"code\">",
            gutter.join("\n")
        ));
    }
    body.push_str(&format!(
        "<div class=\"highlight style-{style}\"><pre class=\"language-{language}\"><code>{}</code></pre></div>",
        escape(snippet.code.as_str())
    ));
    if snippet.linenos {
        body.push_str("</td></tr></table>");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h2>{title}</h2>\n{body}\n</body>\n</html>\n"
    )
}

#[tracing::instrument(skip(store, _actor))]
pub async fn handle(
    store: EntityStore,
    _actor: Option<UserRef>,
    query: HighlightSnippetQuery,
) -> Result<String, GetSnippetError> {
    let snippet = load(&store, query.id).await?;
    Ok(render_html(&snippet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snippet(code: &str, linenos: bool) -> Snippet {
        Snippet {
            id: 1,
            owner_id: 1,
            owner_username: "alice".to_string(),
            title: "<demo>".to_string(),
            code: code.to_string(),
            linenos,
            language: "python".to_string(),
            style: "friendly".to_string(),
            created: Utc::now(),
        }
    }

    #[test]
    fn test_render_escapes_markup() {
        let html = render_html(&snippet("if a < b && c:\n    pass", false));
        assert!(html.contains("<title>&lt;demo&gt;</title>"));
        assert!(html.contains("if a &lt; b &amp;&amp; c:"));
        assert!(html.contains("language-python"));
        assert!(html.contains("style-friendly"));
        assert!(!html.contains("linenos"));
    }

    #[test]
    fn test_render_line_numbers() {
        let html = render_html(&snippet("a\nb\nc", true));
        assert!(html.contains("<td class=\"linenos\"><pre>1\n2\n3</pre></td>"));
    }
}
