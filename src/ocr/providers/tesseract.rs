use async_trait::async_trait;
use log::debug;
use std::error::Error;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::OcrConfig;
use crate::ocr::{OcrProvider, ProviderOutput};

/// Runs the local `tesseract` binary, reading the image from stdin and
/// parsing its TSV report.
pub struct TesseractProvider {
    command: String,
}

impl TesseractProvider {
    pub fn new(config: &OcrConfig) -> Self {
        Self::with_command(&config.tesseract_command)
    }

    pub fn with_command(command: &str) -> Self {
        TesseractProvider {
            command: command.to_string(),
        }
    }
}

#[async_trait]
impl OcrProvider for TesseractProvider {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn accuracy(&self) -> f64 {
        0.75
    }

    fn is_offline(&self) -> bool {
        true
    }

    async fn recognize(
        &self,
        image: &[u8],
        language: &str,
    ) -> Result<ProviderOutput, Box<dyn Error + Send + Sync>> {
        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", language, "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to start {}: {}", self.command, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image).await?;
            // Closing stdin lets tesseract start reading
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("tesseract exited with {}: {}", output.status, stderr.trim()).into());
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let parsed = parse_tsv(&tsv);
        debug!(
            "tesseract recognized {} characters at {:.1}",
            parsed.text.len(),
            parsed.confidence
        );
        Ok(parsed)
    }
}

/// Rebuild text from word rows, one output line per tesseract line and a
/// blank line between blocks. Confidence is the mean over words.
pub fn parse_tsv(tsv: &str) -> ProviderOutput {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_key: Option<(u32, u32, u32)> = None;
    let mut current_block: Option<u32> = None;
    let mut conf_sum = 0.0;
    let mut words = 0usize;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let word = cols[11].trim();
        let conf: f64 = match cols[10].parse() {
            Ok(c) => c,
            Err(_) => continue,
        };
        if word.is_empty() || conf < 0.0 {
            continue;
        }
        let num = |i: usize| cols[i].parse::<u32>().unwrap_or(0);
        let key = (num(2), num(3), num(4));

        if current_key != Some(key) {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if current_block.is_some() && current_block != Some(key.0) {
                lines.push(String::new());
            }
            current_key = Some(key);
            current_block = Some(key.0);
        } else {
            current.push(' ');
        }
        current.push_str(word);
        conf_sum += conf;
        words += 1;
    }
    if !current.is_empty() {
        lines.push(current);
    }

    ProviderOutput {
        text: lines.join("\n"),
        confidence: if words == 0 { 0.0 } else { conf_sum / words as f64 },
    }
}
