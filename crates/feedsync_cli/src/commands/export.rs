//! Export command implementation.

use super::open_store_read_only;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Runs the export command.
///
/// Writes the cached posts, newest first, in the same JSON shape the feed
/// service uses.
pub fn run(path: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store_read_only(path)?;
    let posts = store.all();

    match output {
        Some(file) => {
            let mut writer = io::BufWriter::new(File::create(file)?);
            serde_json::to_writer_pretty(&mut writer, &posts)?;
            writer.flush()?;
            eprintln!("Exported {} posts to {:?}", posts.len(), file);
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, &posts)?;
            writeln!(lock)?;
        }
    }

    Ok(())
}
