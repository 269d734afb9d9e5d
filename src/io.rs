use super::types::Line;
use std::{
    fs::File,
    io::{BufRead, BufReader, Lines, Write},
    path::Path,
};

/// Yields the input one tab-split line at a time. Line numbers are physical
/// and 1-based; blank lines are kept since the layout is positional.
pub struct TsvFileReader<R> {
    line_iter: std::iter::Enumerate<Lines<R>>,
}

impl TsvFileReader<BufReader<File>> {
    pub fn new(input_filename: &Path) -> Result<Self, ReadError> {
        let file = File::open(input_filename).map_err(|source| ReadError::Open {
            path: input_filename.display().to_string(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> TsvFileReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            line_iter: reader.lines().enumerate(),
        }
    }
}

impl<R: BufRead> Iterator for TsvFileReader<R> {
    type Item = Result<Line, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.line_iter.next().map(|(i, result)| {
            let number = i as u64 + 1;
            let text = result.map_err(|source| ReadError::Line {
                line: number,
                source,
            })?;
            // `lines()` only strips the '\n' of a CRLF pair.
            let text = text.strip_suffix('\r').unwrap_or(&text);
            Ok(Line::new(number, text.split('\t').map(String::from).collect()))
        })
    }
}

/// Collects every line up front; inputs are small and human-authored.
pub fn read_lines<R: BufRead>(reader: TsvFileReader<R>) -> Result<Vec<Line>, ReadError> {
    reader.collect()
}

pub fn write_document(path: &Path, contents: &str) -> Result<(), WriteError> {
    let wrap = |source: std::io::Error| WriteError {
        path: path.display().to_string(),
        source,
    };
    let mut f = File::create(path).map_err(wrap)?;
    f.write_all(contents.as_bytes()).map_err(wrap)?;
    f.flush().map_err(wrap)
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("cannot open {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: cannot read")]
    Line {
        line: u64,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("cannot write {path}")]
pub struct WriteError {
    path: String,
    #[source]
    source: std::io::Error,
}

#[cfg(test)]
mod tests {
    use super::{read_lines, write_document, ReadError, TsvFileReader};
    use crate::types::Line;
    use std::path::Path;

    fn read(input: &[u8]) -> Result<Vec<Line>, ReadError> {
        read_lines(TsvFileReader::from_reader(input))
    }

    #[test]
    fn test_reads_tab_fields() {
        let lines = read(b"Page\nTitle\nx\ta\tb\n1\t2\t3\n").unwrap();

        assert_eq!(
            lines,
            vec![
                Line::new(1, vec!["Page".into()]),
                Line::new(2, vec!["Title".into()]),
                Line::new(3, vec!["x".into(), "a".into(), "b".into()]),
                Line::new(4, vec!["1".into(), "2".into(), "3".into()]),
            ]
        );
    }

    #[test]
    fn test_keeps_blank_lines_and_strips_crlf() {
        let lines = read(b"\r\nTitle\r\n\t\r\n\"q\"\t1,5").unwrap();

        assert_eq!(
            lines,
            vec![
                Line::new(1, vec!["".into()]),
                Line::new(2, vec!["Title".into()]),
                Line::new(3, vec!["".into(), "".into()]),
                Line::new(4, vec!["\"q\"".into(), "1,5".into()]),
            ]
        );
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let err = read(b"ok\n\xff\xfe\n").unwrap_err();

        assert!(matches!(err, ReadError::Line { line: 2, .. }));
        assert_eq!(err.to_string(), "line 2: cannot read");
    }

    #[test]
    fn test_missing_input() {
        let err = TsvFileReader::new(Path::new("/nonexistent/input.tsv"))
            .err()
            .unwrap();

        assert!(matches!(err, ReadError::Open { .. }));
        assert_eq!(err.to_string(), "cannot open /nonexistent/input.tsv");
    }

    #[test]
    fn test_write_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");

        write_document(&path, "<p>first</p>").unwrap();
        write_document(&path, "<p>2</p>").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>2</p>");
        assert!(write_document(&dir.path().join("missing/out.html"), "").is_err());
    }
}
