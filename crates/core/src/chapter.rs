//! Chapter assembly: one thread page becomes one chapter.
//!
//! The chapter text is Markdown, the same dialect the forum stores. It is the
//! post title as a heading, the post body, every top-level reply the original
//! poster wrote (each behind a horizontal rule), and a link back to the page.
//! Replies from anyone else are left out: the book follows one author.

use pulldown_cmark::{Options, Parser, html};
use tracing::debug;

use crate::thread::ParsedPage;
use crate::{RedditEpubError, Result};

/// A rendered chapter, ready to be appended to a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    /// HTML fragment rendered from the chapter Markdown.
    pub html: String,
    /// The page the chapter was built from, as given.
    pub source_url: String,
}

/// Builds the Markdown source of a chapter.
///
/// # Errors
///
/// Returns [`RedditEpubError::MissingField`] if the opening post has no title
/// or no body, whatever its comments hold.
pub fn chapter_markdown(page: &ParsedPage, source_url: &str) -> Result<String> {
    let title = page
        .title
        .as_deref()
        .ok_or_else(|| RedditEpubError::MissingField { field: "title", url: source_url.to_string() })?;
    let body = page
        .body
        .as_deref()
        .ok_or_else(|| RedditEpubError::MissingField { field: "body", url: source_url.to_string() })?;

    let mut markdown = format!("# {}\n\n{}", title, body);

    for comment in page.comments.iter().filter(|c| c.author == page.author) {
        match &comment.body {
            Some(text) => {
                markdown.push_str("\n\n---\n\n");
                markdown.push_str(text);
            }
            None => debug!(comment = %comment.id, "skipping author comment without body"),
        }
    }

    markdown.push_str(&format!("\n\n[{}]({})", source_url, source_url));
    Ok(markdown)
}

/// Renders Markdown to an HTML fragment.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Assembles and renders the chapter for `page`.
pub fn assemble(page: &ParsedPage, source_url: &str) -> Result<Chapter> {
    let markdown = chapter_markdown(page, source_url)?;
    let title = page.title.clone().unwrap_or_default();

    Ok(Chapter { title, html: render_markdown(&markdown), source_url: source_url.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::Comment;

    const SOURCE: &str = "https://www.reddit.com/r/HFY/comments/abc/first/";

    fn comment(author: &str, body: Option<&str>) -> Comment {
        Comment { author: author.to_string(), id: format!("c-{}", author), body: body.map(str::to_string) }
    }

    fn page(comments: Vec<Comment>) -> ParsedPage {
        ParsedPage {
            author: "op".to_string(),
            id: "p1".to_string(),
            title: Some("First Contact".to_string()),
            body: Some("The *ship* arrived.".to_string()),
            comments,
        }
    }

    #[test]
    fn test_markdown_layout() {
        let markdown = chapter_markdown(&page(vec![]), SOURCE).unwrap();
        assert_eq!(
            markdown,
            format!("# First Contact\n\nThe *ship* arrived.\n\n[{0}]({0})", SOURCE)
        );
    }

    #[test]
    fn test_only_author_comments_in_order() {
        let markdown = chapter_markdown(
            &page(vec![
                comment("op", Some("part two")),
                comment("reader", Some("great story")),
                comment("op", Some("part three")),
                comment("critic", Some("meh")),
            ]),
            SOURCE,
        )
        .unwrap();

        assert!(markdown.contains("\n\n---\n\npart two\n\n---\n\npart three\n\n["));
        assert!(!markdown.contains("great story"));
        assert!(!markdown.contains("meh"));
    }

    #[test]
    fn test_author_comment_without_body_is_skipped() {
        let markdown = chapter_markdown(&page(vec![comment("op", None)]), SOURCE).unwrap();
        assert!(!markdown.contains("---"));
    }

    #[test]
    fn test_missing_title_fails() {
        let mut p = page(vec![comment("op", Some("still here"))]);
        p.title = None;
        let result = assemble(&p, SOURCE);
        assert!(matches!(result, Err(RedditEpubError::MissingField { field: "title", .. })));
    }

    #[test]
    fn test_missing_body_fails() {
        let mut p = page(vec![]);
        p.body = None;
        let result = assemble(&p, SOURCE);
        assert!(matches!(result, Err(RedditEpubError::MissingField { field: "body", .. })));
    }

    #[test]
    fn test_empty_body_is_allowed() {
        let mut p = page(vec![]);
        p.body = Some(String::new());
        assert!(assemble(&p, SOURCE).is_ok());
    }

    #[test]
    fn test_rendered_html() {
        let chapter = assemble(&page(vec![comment("op", Some("**bold** move"))]), SOURCE).unwrap();

        assert_eq!(chapter.title, "First Contact");
        assert_eq!(chapter.source_url, SOURCE);
        assert!(chapter.html.contains("<h1>First Contact</h1>"));
        assert!(chapter.html.contains("<em>ship</em>"));
        assert!(chapter.html.contains("<hr />"));
        assert!(chapter.html.contains("<strong>bold</strong>"));
        assert!(chapter.html.contains(&format!("<a href=\"{}\">", SOURCE)));
    }
}
