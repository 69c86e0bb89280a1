use std::{
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use policyscope_analysis::config::{AnalysisConfig, ValidatorConfig};
use serde::Deserialize;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    pub fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.write_all(text.as_bytes())
            .with_context(|| format!("Failed to write report to {}", self.display_path()))?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Contents of the `--config` file
///
/// Both sections are optional; missing keys take their defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub validator: ValidatorConfig,
    pub analysis: AnalysisConfig,
}

/// Read the config file, or the defaults when no path is given
///
/// # Errors
///
/// Returns error if the file cannot be opened or parsed
pub fn read_config_file(path: Option<&Path>) -> anyhow::Result<ConfigFile> {
    match path {
        Some(path) => read_json_file("config", path),
        None => Ok(ConfigFile::default()),
    }
}

/// Whether `file_name` matches `pattern`, where `*` matches any run of characters
fn matches_pattern(file_name: &str, pattern: &str) -> bool {
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = file_name.strip_prefix(first) else {
        return false;
    };

    let parts = parts.collect::<Vec<_>>();
    let Some((last, middle)) = parts.split_last() else {
        // no wildcard
        return rest.is_empty();
    };
    for part in middle {
        let Some(position) = rest.find(part) else {
            return false;
        };
        rest = &rest[position + part.len()..];
    }
    rest.ends_with(last)
}

/// Files in `dir` whose names match `pattern`, sorted by path
///
/// # Errors
///
/// Returns error if the directory cannot be read
pub fn list_files(dir: &Path, pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut paths = vec![];
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        let path = entry.path();
        let matched = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| matches_pattern(name, pattern));
        if matched && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load every matching JSON file in `dir`
///
/// Files that cannot be read or parsed are logged and skipped.
///
/// # Errors
///
/// Returns error if the directory itself cannot be read
pub fn load_json_dir<T>(
    file_kind: &str,
    dir: &Path,
    pattern: &str,
) -> anyhow::Result<Vec<(PathBuf, T)>>
where
    T: serde::de::DeserializeOwned,
{
    let paths = list_files(dir, pattern)?;
    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        match read_json_file(file_kind, &path) {
            Ok(value) => loaded.push((path, value)),
            Err(err) => tracing::warn!("skipping file: {err:#}"),
        }
    }
    tracing::info!(
        dir = %dir.display(),
        loaded = loaded.len(),
        "loaded {file_kind} files"
    );
    Ok(loaded)
}
