use crate::error::{ParseFailure, Result, TallyError};
use crate::parser;
use crate::types::{ProjectName, UsageEvent};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::task;

/// One load cycle's worth of parsed records, in the shape
/// `EventStore::reload` consumes.
pub type ParsedRecords = Vec<std::result::Result<UsageEvent, ParseFailure>>;

/// Walk `projects/*/*.jsonl` under each data path and parse every line.
///
/// Events that did not carry a project name are stamped with the
/// enclosing project directory. A missing `projects/` directory yields an
/// empty batch; an unreadable individual file is skipped. Non-usage lines
/// are dropped here; malformed records come back as failures for the
/// `LoadReport`.
pub async fn load_usage_records(data_paths: &[PathBuf]) -> Result<ParsedRecords> {
    let tasks: Vec<_> = data_paths
        .iter()
        .map(|base_path| {
            let base_path = base_path.clone();
            task::spawn_blocking(move || collect_records(&base_path))
        })
        .collect();

    let mut all_records = Vec::new();
    for task in tasks {
        all_records.extend(task.await??);
    }
    Ok(all_records)
}

fn collect_records(base_path: &Path) -> Result<ParsedRecords> {
    let projects_path = base_path.join("projects");
    if !projects_path.exists() {
        return Ok(Vec::new());
    }

    // Collect all file paths with their project directory first
    let mut all_files = Vec::new();
    for project_entry in read_dir(&projects_path)? {
        let project_entry = project_entry.map_err(|source| TallyError::DirectoryAccess {
            path: projects_path.clone(),
            source,
        })?;
        let entry_path = project_entry.path();
        if !entry_path.is_dir() {
            continue;
        }
        let project = ProjectName::from(project_entry.file_name().to_string_lossy().as_ref());

        for file_entry in read_dir(&entry_path)? {
            let file_entry = file_entry.map_err(|source| TallyError::DirectoryAccess {
                path: entry_path.clone(),
                source,
            })?;
            let file_name = file_entry.file_name();
            if file_name.to_string_lossy().ends_with(".jsonl") {
                all_files.push((file_entry.path(), project.clone()));
            }
        }
    }

    // Parse all files in parallel with line-level parallelism
    let records: ParsedRecords = all_files
        .par_iter()
        .flat_map(|(path, project)| match fs::read_to_string(path) {
            Ok(contents) => contents
                .par_lines()
                .filter(|line| !line.trim().is_empty())
                .filter_map(|line| match parser::parse_line(line) {
                    Ok(Some(mut event)) => {
                        if event.project.is_none() {
                            event.project = Some(project.clone());
                        }
                        Some(Ok(event))
                    }
                    Ok(None) => None,
                    Err(failure) => Some(Err(failure)),
                })
                .collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        })
        .collect();

    Ok(records)
}

fn read_dir(path: &PathBuf) -> Result<fs::ReadDir> {
    fs::read_dir(path).map_err(|source| TallyError::DirectoryAccess {
        path: path.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn usage_line(session: &str, ts: &str, input: u64) -> String {
        format!(
            r#"{{"type":"assistant","timestamp":"{ts}","sessionId":"{session}","message":{{"model":"claude-sonnet-4-20250514","usage":{{"input_tokens":{input},"output_tokens":1}}}}}}"#
        )
    }

    fn write_file(dir: &Path, name: &str, lines: &[String]) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    #[tokio::test]
    async fn test_load_stamps_project_from_directory() {
        let base = tempfile::tempdir().unwrap();
        let alpha = base.path().join("projects/alpha");
        fs::create_dir_all(&alpha).unwrap();
        write_file(
            &alpha,
            "session-1.jsonl",
            &[
                usage_line("s1", "2025-01-15T09:00:00Z", 100),
                usage_line("s1", "2025-01-15T10:00:00Z", 200),
            ],
        );

        let records = load_usage_records(&[base.path().to_path_buf()])
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        for record in &records {
            let event = record.as_ref().unwrap();
            assert_eq!(event.project, Some(ProjectName::from("alpha")));
        }
    }

    #[tokio::test]
    async fn test_record_carried_project_name_wins() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("projects/dir-name");
        fs::create_dir_all(&dir).unwrap();
        let line = r#"{"type":"assistant","timestamp":"2025-01-15T09:00:00Z","sessionId":"s1","projectName":"explicit","message":{"model":"m","usage":{"input_tokens":1}}}"#;
        write_file(&dir, "s.jsonl", &[line.to_string()]);

        let records = load_usage_records(&[base.path().to_path_buf()])
            .await
            .unwrap();

        assert_eq!(
            records[0].as_ref().unwrap().project,
            Some(ProjectName::from("explicit"))
        );
    }

    #[tokio::test]
    async fn test_non_usage_lines_dropped_failures_kept() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("projects/alpha");
        fs::create_dir_all(&dir).unwrap();
        write_file(
            &dir,
            "s.jsonl",
            &[
                usage_line("s1", "2025-01-15T09:00:00Z", 100),
                r#"{"type":"user","sessionId":"s1"}"#.to_string(),
                "not json at all".to_string(),
                String::new(),
            ],
        );

        let records = load_usage_records(&[base.path().to_path_buf()])
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(records.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[tokio::test]
    async fn test_ignores_non_jsonl_and_missing_projects_dir() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("projects/alpha");
        fs::create_dir_all(&dir).unwrap();
        write_file(
            &dir,
            "notes.txt",
            &[usage_line("s1", "2025-01-15T09:00:00Z", 100)],
        );

        let empty_base = tempfile::tempdir().unwrap();

        let records = load_usage_records(&[
            base.path().to_path_buf(),
            empty_base.path().to_path_buf(),
        ])
        .await
        .unwrap();

        assert!(records.is_empty());
    }
}
