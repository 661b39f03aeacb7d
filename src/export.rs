use crate::error::ExportError;
use crate::stimulus::{InkColor, Word};
use crate::trial::{Task, TrialResult};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// CSV row. Field order is the alphabetical column order of the export.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    color: Option<InkColor>,
    congruent: Option<bool>,
    correct: bool,
    correct_response: Option<usize>,
    response: Option<usize>,
    rt: Option<u64>,
    task: Task,
    trial_index: usize,
    user_id: Option<&'a str>,
    word: Option<Word>,
}

impl<'a> From<&'a TrialResult> for CsvRow<'a> {
    fn from(t: &'a TrialResult) -> Self {
        Self {
            color: t.color,
            congruent: t.congruent,
            correct: t.correct,
            correct_response: t.correct_response,
            response: t.response,
            rt: t.rt,
            task: t.task,
            trial_index: t.trial_index,
            user_id: t.user_id.as_deref(),
            word: t.word,
        }
    }
}

pub fn write_csv<W: Write>(log: &[TrialResult], writer: W) -> Result<(), ExportError> {
    if log.is_empty() {
        return Err(ExportError::NoData);
    }
    let mut csv = csv::Writer::from_writer(writer);
    for trial in log {
        csv.serialize(CsvRow::from(trial))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn to_csv_string(log: &[TrialResult]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(log, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn export_csv_file<P: AsRef<Path>>(log: &[TrialResult], path: P) -> Result<(), ExportError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_csv(log, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::Stimulus;
    use crate::trial::{TrialOutcome, TrialSpec};
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn sample_log() -> Vec<TrialResult> {
        let spec = TrialSpec {
            stimulus: Stimulus::new(Word::Red, InkColor::Blue),
            task: Task::Response,
            timeout_ms: 3000,
        };
        vec![
            TrialResult::fixation(0, 420).with_user_id(Some("AB12-CD34-EF56-7890")),
            TrialResult::scored(1, &spec, TrialOutcome::answered(2, 612))
                .with_user_id(Some("AB12-CD34-EF56-7890")),
            TrialResult::scored(2, &spec, TrialOutcome::timed_out()),
        ]
    }

    #[test]
    fn header_is_sorted_and_missing_values_are_empty() {
        let csv = to_csv_string(&sample_log()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "color,congruent,correct,correct_response,response,rt,task,trial_index,user_id,word"
        );
        assert_eq!(lines[1], ",,false,,,420,fixation,0,AB12-CD34-EF56-7890,");
        assert_eq!(
            lines[2],
            "blue,false,true,2,2,612,response,1,AB12-CD34-EF56-7890,RED"
        );
        assert_eq!(lines[3], "blue,false,false,2,,,response,2,,RED");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn values_with_commas_are_quoted() {
        let mut log = sample_log();
        log[0].user_id = Some("odd,\"id\"".to_string());
        let csv = to_csv_string(&log).unwrap();
        assert!(csv.lines().nth(1).unwrap().contains("\"odd,\"\"id\"\"\""));
    }

    #[test]
    fn empty_log_is_an_error() {
        assert_matches!(to_csv_string(&[]), Err(ExportError::NoData));
    }

    #[test]
    fn writes_file_creating_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.csv");
        export_csv_file(&sample_log(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("color,congruent"));
    }
}
