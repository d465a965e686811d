use anyhow::{Context, Result, anyhow};
use flate2::write::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn pump<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    progress: &mut impl FnMut(u64),
) -> io::Result<u64> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
        progress(total);
    }
    Ok(total)
}

/// Stream `reader` into `writer` in chunks of at most `chunk_size` bytes,
/// gunzipping on the fly when `decompress` is set.
///
/// `progress` receives the running count of bytes read after each chunk.
/// Returns the total number of bytes read.
pub fn copy_chunked<R: Read, W: Write>(
    reader: &mut R,
    writer: W,
    decompress: bool,
    chunk_size: usize,
    mut progress: impl FnMut(u64),
) -> io::Result<u64> {
    if decompress {
        let mut decoder = GzDecoder::new(writer);
        let total = pump(reader, &mut decoder, chunk_size, &mut progress)?;
        decoder.finish()?.flush()?;
        Ok(total)
    } else {
        let mut writer = writer;
        let total = pump(reader, &mut writer, chunk_size, &mut progress)?;
        writer.flush()?;
        Ok(total)
    }
}

/// Single-line progress message for a transfer.
pub fn status_line(name: &str, decompress: bool, done: u64, total: u64) -> String {
    let operation = if decompress {
        "Downloading and decompressing"
    } else {
        "Downloading"
    };
    let percent = if total > 0 {
        done as f64 * 100.0 / total as f64
    } else {
        100.0
    };
    format!(
        "{} {}  {:.1} / {:.1} MB [{:.1}%]",
        operation,
        name,
        done as f64 / BYTES_PER_MB,
        total as f64 / BYTES_PER_MB,
        percent
    )
}

/// Fetch `url` into `destination`.
///
/// The server must report `Content-Length`. Nothing is cleaned up when the
/// transfer fails half way.
pub fn download(url: &str, destination: &Path, decompress: bool, chunk_size: usize) -> Result<u64> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("Request failed: {}", url))?;
    let total: u64 = response
        .header("Content-Length")
        .ok_or_else(|| anyhow!("No Content-Length header in response from {}", url))?
        .trim()
        .parse()
        .with_context(|| format!("Malformed Content-Length header from {}", url))?;

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = File::create(destination)
        .with_context(|| format!("Failed to create file: {:?}", destination))?;

    let name = url.rsplit('/').next().unwrap_or(url).to_string();
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message(status_line(&name, decompress, 0, total));

    let mut body = response.into_reader();
    let read = copy_chunked(&mut body, BufWriter::new(file), decompress, chunk_size, |done| {
        pb.set_position(done);
        pb.set_message(status_line(&name, decompress, done, total));
    })
    .with_context(|| format!("Transfer of {} into {:?} failed", url, destination))?;

    pb.finish();
    log::debug!("Fetched {} bytes from {}", read, url);
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn plain_copy_reports_every_chunk() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut seen = Vec::new();
        let mut out = Vec::new();
        let n = copy_chunked(&mut Cursor::new(&data), &mut out, false, 30, |d| seen.push(d)).unwrap();
        assert_eq!(n, 100);
        assert_eq!(out, data);
        assert_eq!(seen, vec![30, 60, 90, 100]);
    }

    #[test]
    fn corrupt_gzip_stream_is_an_error() {
        let mut out = Vec::new();
        // valid gzip header followed by a deflate block of reserved type
        let mut garbage = vec![0x1f, 0x8b, 8, 0, 0, 0, 0, 0, 0, 0xff];
        garbage.extend([0xff; 16]);
        assert!(copy_chunked(&mut Cursor::new(garbage), &mut out, true, 4, |_| {}).is_err());
    }

    #[test]
    fn status_line_matches_progress_format() {
        let line = status_line("case0.vtu.gz", true, 512 * 1024, 2 * 1024 * 1024);
        assert_eq!(line, "Downloading and decompressing case0.vtu.gz  0.5 / 2.0 MB [25.0%]");
        assert!(status_line("piv.vti", false, 0, 0).ends_with("[100.0%]"));
    }

    proptest! {
        #[test]
        fn gzip_stream_round_trips_for_any_chunk_size(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            chunk in 1usize..600,
        ) {
            let compressed = gzip(&data);
            let mut out = Vec::new();
            let read = copy_chunked(&mut Cursor::new(&compressed), &mut out, true, chunk, |_| {}).unwrap();
            prop_assert_eq!(read, compressed.len() as u64);
            prop_assert_eq!(out, data);
        }
    }
}
