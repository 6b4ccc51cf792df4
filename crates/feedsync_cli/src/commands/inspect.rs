//! Inspect command implementation.

use super::{open_store_read_only, scan_log, LogSummary};
use feedsync_core::Post;
use serde::Serialize;
use std::path::Path;

/// Cache inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Cache path.
    pub path: String,
    /// Post log size in bytes.
    pub log_bytes: u64,
    /// Log record counts.
    pub log: LogSummary,
    /// Number of cached posts.
    pub post_count: usize,
    /// Posts carrying a server id of 0.
    pub unconfirmed_count: usize,
    /// Posts the local user likes.
    pub liked_count: usize,
    /// Cached posts, newest first (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<Post>>,
}

/// Runs the inspect command.
pub fn run(path: &Path, show_posts: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, show_posts)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect(path: &Path, show_posts: bool) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let log = scan_log(path)?;
    let store = open_store_read_only(path)?;
    let posts = store.all();

    Ok(InspectResult {
        path: path.display().to_string(),
        log_bytes: log.bytes,
        log,
        post_count: posts.len(),
        unconfirmed_count: posts.iter().filter(|p| p.is_local()).count(),
        liked_count: posts.iter().filter(|p| p.liked_by_me).count(),
        posts: show_posts.then_some(posts),
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Post cache: {}", result.path);
    println!();
    println!("Log:");
    println!("  Size:      {} bytes", result.log_bytes);
    println!("  Puts:      {}", result.log.puts);
    println!("  Deletes:   {}", result.log.deletes);
    if result.log.torn_bytes > 0 {
        println!(
            "  Torn tail: {} bytes (cut on the next writable open)",
            result.log.torn_bytes
        );
    }
    println!();
    println!("Posts:");
    println!("  Cached:      {}", result.post_count);
    println!("  Unconfirmed: {}", result.unconfirmed_count);
    println!("  Liked:       {}", result.liked_count);

    if let Some(posts) = &result.posts {
        println!();
        for post in posts {
            println!(
                "  #{:<6} {:<16} {:>5} likes{}  {}",
                post.id,
                post.author,
                post.likes,
                if post.liked_by_me { " *" } else { "  " },
                post.content.lines().next().unwrap_or_default()
            );
        }
    }
}
