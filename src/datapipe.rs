//! Submission of trial logs to a DataPipe-style collection endpoint.
//!
//! The log is encoded as CSV and posted as JSON
//! `{ "experimentID", "filename", "data" }`. Failed submissions can be parked
//! in an [`Outbox`] directory and resent later with [`Outbox::flush`].

use crate::config::DataPipeConfig;
use crate::error::UploadError;
use crate::export::to_csv_string;
use crate::trial::TrialResult;
use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FAILED_PREFIX: &str = "failed_submission_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "experimentID")]
    pub experiment_id: String,
    pub filename: String,
    pub data: String,
}

/// `<user>_<iso timestamp with ':' and '.' replaced>.csv`
pub fn submission_filename(user_id: &str, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{user_id}_{stamp}.csv")
}

pub fn build_payload(
    config: &DataPipeConfig,
    log: &[TrialResult],
    user_id: &str,
    at: DateTime<Utc>,
) -> Result<Payload, UploadError> {
    Ok(Payload {
        experiment_id: config.experiment_id.clone(),
        filename: submission_filename(user_id, at),
        data: to_csv_string(log)?,
    })
}

/// Sends a JSON body somewhere and returns the response text.
pub trait Transport {
    fn post_json(&self, url: &str, body: &str) -> Result<String, UploadError>;
}

#[derive(Debug, Clone, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn post_json(&self, url: &str, body: &str) -> Result<String, UploadError> {
        let response = ureq::post(url)
            .set("Content-Type", "application/json")
            .set("Accept", "*/*")
            .send_string(body);
        match response {
            Ok(resp) => resp.into_string().map_err(UploadError::Io),
            Err(ureq::Error::Status(status, resp)) => Err(UploadError::Status {
                status,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(UploadError::Transport(e.to_string())),
        }
    }
}

/// Uploads a trial log, reporting progress through `status`.
///
/// Returns the server response parsed as JSON, or `{ "message": text }` when
/// the body is not JSON.
pub fn submit<T: Transport + ?Sized>(
    transport: &T,
    config: &DataPipeConfig,
    log: &[TrialResult],
    user_id: &str,
    status: &mut dyn FnMut(&str),
) -> Result<Value, UploadError> {
    let result = try_submit(transport, config, log, user_id, status);
    match &result {
        Ok(_) => status("Data submitted successfully!"),
        Err(e) => {
            warn!(error = %e, "datapipe submission failed");
            status(&format!("Error: {e}"));
        }
    }
    result
}

fn try_submit<T: Transport + ?Sized>(
    transport: &T,
    config: &DataPipeConfig,
    log: &[TrialResult],
    user_id: &str,
    status: &mut dyn FnMut(&str),
) -> Result<Value, UploadError> {
    if !config.enabled {
        return Err(UploadError::Disabled);
    }
    status("Preparing data for submission...");
    let payload = build_payload(config, log, user_id, Utc::now())?;
    let body = serde_json::to_string(&payload)?;

    status("Uploading data to DataPipe...");
    info!(
        experiment = %payload.experiment_id,
        filename = %payload.filename,
        bytes = payload.data.len(),
        "sending to datapipe"
    );
    let text = transport.post_json(&config.api_url, &body)?;

    status("Processing server response...");
    debug!(response = %text, "datapipe response");
    Ok(serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "message": text })))
}

/// A submission parked for a later attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedSubmission {
    pub data: Vec<TrialResult>,
    pub user_id: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub sent: usize,
    pub failed: usize,
}

/// Directory of failed submissions, one JSON file each
#[derive(Debug, Clone)]
pub struct Outbox {
    dir: PathBuf,
}

impl Outbox {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self, submission: &FailedSubmission) -> Result<PathBuf, UploadError> {
        fs::create_dir_all(&self.dir)?;
        let mut millis = Utc::now().timestamp_millis();
        let mut path = self.dir.join(format!("{FAILED_PREFIX}{millis}.json"));
        while path.exists() {
            millis += 1;
            path = self.dir.join(format!("{FAILED_PREFIX}{millis}.json"));
        }
        fs::write(&path, serde_json::to_vec(submission)?)?;
        info!(path = %path.display(), "failed submission saved for retry");
        Ok(path)
    }

    /// Stored submission files, oldest first
    pub fn pending(&self) -> Result<Vec<PathBuf>, UploadError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_submission = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FAILED_PREFIX) && n.ends_with(".json"));
            if is_submission {
                entries.push(path);
            }
        }
        Ok(entries.into_iter().sorted().collect())
    }

    pub fn load(&self, path: &Path) -> Result<FailedSubmission, UploadError> {
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }

    /// Resends every pending submission once, deleting the ones that succeed.
    pub fn flush<T: Transport + ?Sized>(
        &self,
        transport: &T,
        config: &DataPipeConfig,
    ) -> Result<FlushReport, UploadError> {
        if !config.enabled {
            return Err(UploadError::Disabled);
        }
        let mut report = FlushReport::default();
        for path in self.pending()? {
            let outcome = self.load(&path).and_then(|submission| {
                submit(
                    transport,
                    config,
                    &submission.data,
                    &submission.user_id,
                    &mut |s: &str| debug!(status = s, "retry"),
                )
            });
            match outcome {
                Ok(_) => {
                    fs::remove_file(&path)?;
                    info!(path = %path.display(), "removed successful retry file");
                    report.sent += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "error retrying submission");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

/// Submits, parking the data in `outbox` when the attempt fails.
pub fn submit_or_store<T: Transport + ?Sized>(
    transport: &T,
    config: &DataPipeConfig,
    log: &[TrialResult],
    user_id: &str,
    outbox: &Outbox,
    status: &mut dyn FnMut(&str),
) -> Result<Value, UploadError> {
    match submit(transport, config, log, user_id, status) {
        Ok(v) => Ok(v),
        Err(e @ (UploadError::Disabled | UploadError::Export(_))) => Err(e),
        Err(e) => {
            outbox.store(&FailedSubmission {
                data: log.to_vec(),
                user_id: user_id.to_string(),
            })?;
            Err(e)
        }
    }
}
