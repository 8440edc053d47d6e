//! Decoding Reddit thread JSON into a [`ParsedPage`].
//!
//! A thread's `.json` endpoint answers with two listings: the first holds the
//! opening post, the second the top-level comments. Each child is a
//! `{ "kind": ..., "data": { ... } }` record whose `data` carries close to a
//! hundred fields. Only a handful matter here, so children are first decoded
//! loosely (kind plus raw `data`) and then projected into small structs that
//! name exactly the fields the pipeline reads.

use serde::Deserialize;
use serde_json::Value;

use crate::{RedditEpubError, Result};

/// Placeholder child in a comment listing standing in for collapsed replies.
const MORE_KIND: &str = "more";

/// One thread page: its opening post and top-level comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub author: String,
    pub id: String,
    /// Absent for anything that is not a self-post.
    pub title: Option<String>,
    /// The post's `selftext`. Absent and empty are distinct.
    pub body: Option<String>,
    /// Top-level comments in the order the listing returned them.
    pub comments: Vec<Comment>,
}

/// A top-level comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    pub id: String,
    pub body: Option<String>,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    kind: String,
    data: Value,
}

#[derive(Deserialize)]
struct PostData {
    author: String,
    id: String,
    title: Option<String>,
    selftext: Option<String>,
}

#[derive(Deserialize)]
struct CommentData {
    author: String,
    id: String,
    body: Option<String>,
}

/// Decodes a thread page.
///
/// # Errors
///
/// - [`RedditEpubError::Json`] when the bytes are not JSON, or a post or
///   comment lacks `author` or `id`.
/// - [`RedditEpubError::Decode`] when the document is not exactly two
///   listings, or the first listing does not hold exactly one post.
pub fn parse_thread(bytes: &[u8]) -> Result<ParsedPage> {
    let listings: Vec<Listing> = serde_json::from_slice(bytes)?;

    let [root, comments]: [Listing; 2] = listings
        .try_into()
        .map_err(|l: Vec<Listing>| RedditEpubError::Decode(format!("expected 2 listings, found {}", l.len())))?;

    let mut root_children = root.data.children;
    if root_children.len() != 1 {
        return Err(RedditEpubError::Decode(format!(
            "expected exactly one opening post, found {}",
            root_children.len()
        )));
    }
    let post: PostData = serde_json::from_value(root_children.remove(0).data)?;

    let comments = comments
        .data
        .children
        .into_iter()
        .filter(|thing| thing.kind != MORE_KIND)
        .map(|thing| {
            let data: CommentData = serde_json::from_value(thing.data)?;
            Ok(Comment { author: data.author, id: data.id, body: data.body })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedPage { author: post.author, id: post.id, title: post.title, body: post.selftext, comments })
}
