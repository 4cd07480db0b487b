// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Hand assembled reports to the out-of-band delivery channel (an outbox directory picked up by a mail relay)
// role: collaborator/delivery
// inputs: recipient address, ReportArtifact
// outputs: <outbox>/<KEY>/message.html, optional CSV attachment, envelope.json; relative paths returned
// side_effects: Creates directories and writes files
// invariants:
// - envelope.json lists exactly the files written for the message
// - returned paths are relative to the outbox root
// errors: DeliveryError with the offending path
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};
use crate::render::{label_slug, ReportArtifact};

pub trait ReportSink {
  fn deliver(&self, recipient: &str, artifact: &ReportArtifact) -> Result<Vec<String>>;
}

pub struct OutboxSink {
  dir: PathBuf,
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
  std::fs::write(path, bytes).map_err(|e| ReportError::Delivery(format!("writing {}: {e}", path.display())))
}

impl OutboxSink {
  pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
    let dir = dir.as_ref().to_path_buf();
    std::fs::create_dir_all(&dir)
      .map_err(|e| ReportError::Delivery(format!("creating outbox {}: {e}", dir.display())))?;
    Ok(Self { dir })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }
}

impl ReportSink for OutboxSink {
  fn deliver(&self, recipient: &str, artifact: &ReportArtifact) -> Result<Vec<String>> {
    let folder = label_slug(&artifact.project_key);
    let target = self.dir.join(&folder);
    std::fs::create_dir_all(&target)
      .map_err(|e| ReportError::Delivery(format!("creating {}: {e}", target.display())))?;

    let mut written: Vec<String> = Vec::new();

    write_file(&target.join("message.html"), artifact.html.as_bytes())?;
    written.push(format!("{folder}/message.html"));

    let mut attachments: Vec<String> = Vec::new();
    if let Some(csv) = &artifact.csv {
      write_file(&target.join(&csv.name), &csv.bytes)?;
      written.push(format!("{folder}/{}", csv.name));
      attachments.push(csv.name.clone());
    }

    let envelope = serde_json::json!({
      "to": recipient,
      "subject": artifact.subject,
      "html": "message.html",
      "attachments": attachments,
    });
    write_file(&target.join("envelope.json"), &serde_json::to_vec_pretty(&envelope)?)?;
    written.push(format!("{folder}/envelope.json"));

    tracing::info!(to = recipient, project = %artifact.project_key, files = written.len(), "report queued in outbox");
    Ok(written)
  }
}
