//! Incremental reading of append-only log files

use log::{debug, info};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read the lines appended to `path` since `last_offset`
///
/// Returns the new lines and the new total line count to store as the next
/// offset. Behavior:
///
/// - missing file: empty batch, offset unchanged;
/// - file unchanged (`total == last_offset`): empty batch, offset unchanged;
/// - file shrank (`total < last_offset`), i.e. rotation or truncation: empty
///   batch and the lowered total, so the next run consumes the new file from
///   the top — never a negative index, never a panic;
/// - file grew: exactly the lines `last_offset+1 ..= total` (1-indexed) and
///   the new total.
///
/// Lines are decoded lossily so a stray invalid UTF-8 byte in a log cannot
/// abort a run. Re-running without new data is a no-op, and a crash between
/// read and offset save only re-processes the same batch next run.
///
/// # Errors
///
/// Returns `io::Error` if the file exists but cannot be opened or read.
pub fn read_new(path: &Path, last_offset: u64) -> io::Result<(Vec<String>, u64)> {
    if !path.exists() {
        debug!("Source {} does not exist, nothing to read", path.display());
        return Ok((Vec::new(), last_offset));
    }

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut batch = Vec::new();
    let mut total: u64 = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        total += 1;
        if total > last_offset {
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
            batch.push(String::from_utf8_lossy(&buf).into_owned());
        }
    }

    if total < last_offset {
        info!(
            "Source {} shrank ({} lines, offset was {}), assuming rotation and restarting from the top",
            path.display(),
            total,
            last_offset
        );
        return Ok((Vec::new(), total));
    }

    Ok((batch, total))
}
