use std::path::{Component, Path, PathBuf};

/// Suffix that marks a file name as a PDF candidate.
pub const PDF_SUFFIX: &str = ".pdf";

/// Input and output locations derived from one changed file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Absolute path of the changed file.
    pub input_path: PathBuf,
    /// Absolute path the compressor writes to.
    pub output_path: PathBuf,
    /// Output file name relative to the watched directory.
    pub output_file: String,
    /// True when compressing would write over the input itself.
    pub input_is_same_as_output: bool,
    /// True when the name looks like a PDF and the file exists right now.
    pub is_valid_pdf_file: bool,
}

/// Resolve a raw changed-file name against the watched directory.
///
/// With `fixed_output` set, every name maps to `<fixed_output>.pdf`; otherwise
/// the output is the input name itself (in-place mode). The only I/O performed
/// is the existence check behind `is_valid_pdf_file`; a file deleted right
/// after the check is not guarded against.
pub fn resolve(directory: &Path, raw_filename: &str, fixed_output: Option<&str>) -> ResolvedPaths {
    let output_file = match fixed_output.filter(|name| !name.is_empty()) {
        Some(name) => format!("{name}{PDF_SUFFIX}"),
        None => raw_filename.to_string(),
    };

    let input_path = absolute_in(directory, raw_filename);
    let output_path = absolute_in(directory, &output_file);
    let input_is_same_as_output = input_path == output_path;
    let is_valid_pdf_file = has_pdf_name(raw_filename) && input_path.exists();

    ResolvedPaths {
        input_path,
        output_path,
        output_file,
        input_is_same_as_output,
        is_valid_pdf_file,
    }
}

/// Returns true if `filename` ends in `.pdf` and the part before the suffix is
/// not blank. Bare `.pdf` and `   .pdf` are rejected.
pub fn has_pdf_name(filename: &str) -> bool {
    filename
        .strip_suffix(PDF_SUFFIX)
        .is_some_and(|base| !base.trim().is_empty())
}

/// Normalize the answer to the output-name prompt.
///
/// Trims whitespace and strips one trailing `.pdf`. `None` means in-place mode.
pub fn normalize_output_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let base = trimmed.strip_suffix(PDF_SUFFIX).unwrap_or(trimmed).trim();
    (!base.is_empty()).then(|| base.to_string())
}

/// Join `name` onto `directory` and fold `.`/`..` lexically, without touching
/// the filesystem.
fn absolute_in(directory: &Path, name: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in directory.join(name).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
