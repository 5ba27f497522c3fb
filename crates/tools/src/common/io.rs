//! ファイルI/Oユーティリティ（gzip対応）
//!
//! パス `-` は標準入出力、拡張子 `.gz` は gzip として扱う。
//! 系列入力とサンプル出力はどちらも 1 行 1 フレームのカンマ区切り。

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

const READER_BUF_CAP: usize = 128 * 1024; // 128 KiB

fn is_gz(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

pub fn open_reader<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let p = path.as_ref();
    if p.to_string_lossy() == "-" {
        return Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, io::stdin())));
    }
    let f = File::open(p)?;
    if is_gz(p) {
        let dec = flate2::read::GzDecoder::new(f);
        return Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, dec)));
    }
    Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, f)))
}

/// 圧縮出力の終端処理エラーを呼び出し側に返すための Writer
#[must_use = "call .close() to propagate compression/IO errors"]
pub enum Writer {
    Plain(BufWriter<File>),
    Stdout(io::Stdout),
    Gz(flate2::write::GzEncoder<File>),
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Writer::Plain(f) => f.write(buf),
            Writer::Stdout(s) => s.write(buf),
            Writer::Gz(e) => e.write(buf),
        }
    }
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Writer::Plain(f) => f.flush(),
            Writer::Stdout(s) => s.flush(),
            Writer::Gz(e) => e.flush(),
        }
    }
}

impl Writer {
    /// ストリームを閉じ、ファイル / 標準出力をフラッシュする
    pub fn close(self) -> io::Result<()> {
        match self {
            Writer::Plain(f) => {
                let mut file = f.into_inner().map_err(|e| e.into_error())?;
                file.flush()
            }
            Writer::Stdout(mut s) => s.flush(),
            Writer::Gz(e) => {
                let mut f = e.finish()?;
                f.flush()
            }
        }
    }
}

pub fn open_writer<P: AsRef<Path>>(path: P) -> io::Result<Writer> {
    let p = path.as_ref();
    if p.to_string_lossy() == "-" {
        return Ok(Writer::Stdout(io::stdout()));
    }
    let f = File::create(p)?;
    if is_gz(p) {
        let enc = flate2::write::GzEncoder::new(f, flate2::Compression::default());
        return Ok(Writer::Gz(enc));
    }
    Ok(Writer::Plain(BufWriter::new(f)))
}

// =============================================================================
// CSV
// =============================================================================

/// 系列 CSV を読む（空行と `#` で始まる行は無視）
///
/// 各行がちょうど `n_in` 列であることを確認し、時刻優先で平坦化して返す。
pub fn read_sequence_csv<R: BufRead>(reader: R, n_in: usize) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read error at line {}", lineno + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row: Vec<f64> = line
            .split(',')
            .map(|field| field.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("invalid number at line {}", lineno + 1))?;
        if row.len() != n_in {
            bail!("line {} has {} columns, expected {n_in}", lineno + 1, row.len());
        }
        values.extend(row);
    }
    Ok(values)
}

/// 1 フレームを CSV の 1 行として書く
pub fn write_csv_row<W: Write>(w: &mut W, row: &[f64]) -> io::Result<()> {
    let mut first = true;
    for v in row {
        if !first {
            w.write_all(b",")?;
        }
        write!(w, "{v}")?;
        first = false;
    }
    w.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn test_read_sequence_csv() {
        let src = "# t, x0, x1\n0.5, -1\n\n0.25,2.0\n";
        let v = read_sequence_csv(Cursor::new(src), 2).unwrap();
        assert_eq!(v, vec![0.5, -1.0, 0.25, 2.0]);
    }

    #[test]
    fn test_read_sequence_csv_rejects_wrong_width() {
        let err = read_sequence_csv(Cursor::new("1,2\n3\n"), 2).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(read_sequence_csv(Cursor::new("1,x\n"), 2).is_err());
    }

    #[test]
    fn test_write_csv_row() {
        let mut buf = Vec::new();
        write_csv_row(&mut buf, &[1.5, -0.25, 0.0]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1.5,-0.25,0\n");
    }

    #[test]
    fn test_gz_roundtrip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv.gz");
        let mut w = open_writer(&path).unwrap();
        write_csv_row(&mut w, &[1.0, 2.0]).unwrap();
        w.close().unwrap();

        let mut text = String::new();
        open_reader(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "1,2\n");
    }
}
