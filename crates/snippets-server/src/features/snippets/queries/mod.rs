pub mod get;
pub mod highlight;
pub mod list;

pub use get::{GetSnippetError, GetSnippetQuery, GetSnippetResponse};
pub use highlight::{render_html, HighlightSnippetQuery};
pub use list::{ListSnippetsError, ListSnippetsQuery, ListSnippetsResponse};
