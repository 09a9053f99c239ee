use plugin_traffic_collector::{
    CanonicalRow,
    Error,
    Result,
};
use std::{
    fs::File,
    io::{
        BufWriter,
        Write,
    },
    path::{
        Path,
        PathBuf,
    },
};

/// Widths of every column but the last, which is written unpadded.
const COLUMN_WIDTHS: [usize; CanonicalRow::WIDTH - 1] = [24, 8, 8, 18];

/// Renders a row with fixed column widths so rows line up within and across files.
pub fn render_row(row: &CanonicalRow) -> String {
    let cells = row.cells();
    let mut line = String::new();
    for (index, cell) in cells.iter().enumerate() {
        match COLUMN_WIDTHS.get(index) {
            Some(&width) if index + 1 < cells.len() => line.push_str(&format!("{cell:<width$} ")),
            _ => line.push_str(&cell.to_string()),
        }
    }
    line.truncate(line.trim_end().len());
    line
}

/// A text sink file. Rows are padded to `width` before they are rendered.
pub struct TextFile {
    path: PathBuf,
    writer: BufWriter<File>,
    width: usize,
}

impl TextFile {
    pub fn create(path: impl AsRef<Path>, width: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| Error::sink_write(path.display().to_string(), e))?;
        debug!(path = %path.display(), "opened output file");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            width,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}").map_err(|e| Error::sink_write(self.path.display().to_string(), e))
    }

    pub fn write_row(&mut self, row: &CanonicalRow) -> Result<()> {
        let row = row.clone().padded(self.width);
        self.write_line(&render_row(&row))
    }

    /// Flushes and syncs the file to disk, returning its path.
    pub fn finish(self) -> Result<PathBuf> {
        let Self { path, writer, .. } = self;
        let file = writer
            .into_inner()
            .map_err(|e| Error::sink_write(path.display().to_string(), e.into_error()))?;
        file.sync_all()
            .map_err(|e| Error::sink_write(path.display().to_string(), e))?;
        debug!(path = %path.display(), "closed output file");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugin_traffic_collector::row;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    #[test]
    fn rows_are_column_aligned() {
        let summary = render_row(&row!["views: total_count", 8u64, 2u64, "", ""]);
        let sample = render_row(&row!["", 3u64, "", "06/01/21", ""]);
        assert_eq!(summary, "views: total_count       8        2");
        assert_eq!(sample, "                         3                 06/01/21");
        assert_eq!(summary.find('8'), sample.find('3'));
    }

    #[test]
    fn the_last_column_is_not_padded() {
        let line = render_row(&row!["", 10u64, 4u64, "", "github.com"]);
        assert!(line.ends_with(" github.com"));
        assert_eq!(line.len(), 24 + 1 + 8 + 1 + 8 + 1 + 18 + 1 + "github.com".len());
    }

    #[test]
    fn every_line_has_the_same_columns() {
        let dir = TempDir::new().unwrap();
        let mut file = TextFile::create(dir.child("data_foo"), 3).unwrap();
        file.write_row(&row!["repo", "count", "uniques"]).unwrap();
        file.write_row(&row!["foo", 6u64]).unwrap();
        let path = file.finish().unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "repo                     count    uniques\nfoo                      6\n");
    }

    #[test]
    fn unwritable_paths_are_sink_errors() {
        let dir = TempDir::new().unwrap();
        let err = TextFile::create(dir.child("missing").join("data_foo"), 3).err().unwrap();
        assert!(matches!(err, Error::SinkWrite { .. }));
    }
}
