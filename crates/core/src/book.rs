//! The book being assembled and its EPUB serialization.

use std::io::Write;

use epub_builder::{EpubBuilder, EpubContent, ZipLibrary};

use crate::chapter::Chapter;
use crate::{RedditEpubError, Result};

/// Ordered chapters plus book metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub title: String,
    /// Author of the most recently processed page.
    pub author: Option<String>,
    pub language: String,
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(title: impl Into<String>, language: impl Into<String>) -> Self {
        Self { title: title.into(), author: None, language: language.into(), chapters: Vec::new() }
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = Some(author.into());
    }

    pub fn push_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Serializes the book as an EPUB container into `out`.
    ///
    /// Each chapter becomes `text/chapter-NNNN.xhtml` with its title in the
    /// table of contents.
    pub fn write_epub<W: Write>(&self, mut out: W) -> Result<()> {
        let mut builder = EpubBuilder::new(ZipLibrary::new().map_err(output_err)?).map_err(output_err)?;

        builder.set_title(self.title.as_str());
        builder.set_languages(vec![self.language.clone()]);
        if let Some(author) = &self.author {
            builder.add_author(author.as_str());
        }

        for (i, chapter) in self.chapters.iter().enumerate() {
            let file_name = format!("text/chapter-{:04}.xhtml", i + 1);
            let xhtml = wrap_xhtml(&chapter.title, &chapter.html, &self.language);

            builder
                .add_content(EpubContent::new(file_name, xhtml.as_bytes()).title(chapter.title.as_str()))
                .map_err(output_err)?;
        }

        builder.generate(&mut out).map_err(output_err)?;
        out.flush()?;
        Ok(())
    }
}

fn output_err(e: impl std::fmt::Display) -> RedditEpubError {
    RedditEpubError::Output(e.to_string())
}

/// Wraps a chapter fragment in an XHTML 1.1 document.
fn wrap_xhtml(title: &str, body: &str, language: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{}">
<head>
    <meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8" />
    <title>{}</title>
</head>
<body>
{}
</body>
</html>"#,
        escape_text(language),
        escape_text(title),
        body
    )
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
