//! Interactive picker for observation CSVs.
//!
//! Kept separate from clap parsing: clap handles flags, the picker handles
//! `kelp fit` without `--data`. Only CSVs whose header carries a phase
//! column (`xi`, `phase` or `time`) and a flux column are offered.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::ingest::{HeaderSummary, inspect_header};

/// Directory recursion depth when searching for observation files.
const SEARCH_DEPTH: usize = 3;

/// An observation CSV found on disk.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub header: HeaderSummary,
}

impl Candidate {
    fn describe(&self) -> String {
        format!(
            "{} [{}{}]",
            display_path(&self.path),
            self.header.phase_column.label(),
            if self.header.has_sigma { ", sigma" } else { "" }
        )
    }
}

/// Ask the user for an observation CSV: a number from the list, a path, or `q`.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let candidates = discover_observation_files(Path::new("."));
    if candidates.is_empty() {
        return Err(AppError::input(
            "No observation CSVs found. Pass one with `kelp fit -d <file.csv>` or create one with `kelp simulate`.",
        ));
    }

    println!("Observation files:");
    for (idx, c) in candidates.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, c.describe());
    }

    let stdin = io::stdin();
    loop {
        print!("Choose 1-{}, type a path, or q to quit: ", candidates.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::input(format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let read = stdin
            .read_line(&mut input)
            .map_err(|e| AppError::input(format!("Failed to read input: {e}")))?;
        if read == 0 {
            return Err(AppError::input("No selection made (end of input)."));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::input("Canceled."));
        }

        let chosen = match input.parse::<usize>() {
            Ok(n) if (1..=candidates.len()).contains(&n) => Ok(candidates[n - 1].path.clone()),
            Ok(n) => Err(AppError::input(format!("No file numbered {n}."))),
            Err(_) => validate_csv_path(Path::new(input)),
        };
        match chosen {
            Ok(path) => return Ok(path),
            Err(err) => println!("{err}"),
        }
    }
}

/// Check `path` names an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.is_file() {
        return Err(AppError::input(format!(
            "Observation CSV not found (or not a file): {}",
            path.display()
        )));
    }
    if !has_csv_extension(path) {
        return Err(AppError::input(format!(
            "Expected a .csv file, got {}.",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// Observation CSVs under `root`, sorted by path.
pub fn discover_observation_files(root: &Path) -> Vec<Candidate> {
    let mut out = Vec::new();
    walk(root, SEARCH_DEPTH, &mut out);
    out.sort_by_key(|c| display_path(&c.path));
    out
}

fn walk(dir: &Path, depth_left: usize, out: &mut Vec<Candidate>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if depth_left > 0 && !should_skip_dir(&path) {
                walk(&path, depth_left - 1, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            let header = File::open(&path).ok().and_then(|f| inspect_header(f).ok());
            match header {
                Some(header) => out.push(Candidate { path, header }),
                None => log::debug!("ignoring {} (no phase/flux columns)", path.display()),
            }
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    name.starts_with('.') || matches!(name, "target" | "node_modules")
}

fn display_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::PhaseColumn;

    #[test]
    fn finds_only_observation_files() {
        let root = std::env::temp_dir().join(format!("kelp-picker-{}", std::process::id()));
        let nested = root.join("runs");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.join("obs.csv"), "xi,flux,sigma\n0,1,1\n").unwrap();
        fs::write(nested.join("times.CSV"), "time,flux_ppm\n1,2\n").unwrap();
        fs::write(root.join("filter.csv"), "wavelength,transmission\n3.5,0.4\n").unwrap();
        fs::write(root.join("notes.txt"), "xi,flux\n").unwrap();

        let found = discover_observation_files(&root);
        let _ = fs::remove_dir_all(&root);

        assert_eq!(found.len(), 2);
        assert!(found[0].path.ends_with("obs.csv"));
        assert_eq!(found[0].header.phase_column, PhaseColumn::Xi);
        assert!(found[0].header.has_sigma);
        assert!(found[1].path.ends_with("runs/times.CSV"));
        assert_eq!(found[1].header.phase_column, PhaseColumn::Time);
    }

    #[test]
    fn rejects_directories_and_other_extensions() {
        let dir = std::env::temp_dir();
        assert_eq!(validate_csv_path(&dir).unwrap_err().exit_code(), 2);
        assert!(validate_csv_path(&dir.join("kelp-missing-observations.csv")).is_err());
    }

    #[test]
    fn hidden_and_build_dirs_are_skipped() {
        assert!(should_skip_dir(Path::new("./.git")));
        assert!(should_skip_dir(Path::new("./target")));
        assert!(!should_skip_dir(Path::new("./data")));
    }
}
