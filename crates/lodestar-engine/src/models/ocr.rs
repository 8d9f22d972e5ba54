use super::ModelError;
use async_trait::async_trait;
use lodestar_common::protocol::{OcrToken, Rect};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize text regions in a PNG image. Coordinates are image pixels.
    async fn recognize(&self, png: &[u8]) -> Result<Vec<OcrToken>, ModelError>;
}

/// Runs the `tesseract` binary and reads its TSV output.
pub struct TesseractRecognizer {
    binary: String,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(binary: &str, language: &str) -> Self {
        Self {
            binary: binary.to_string(),
            language: language.to_string(),
        }
    }

    /// Check that the binary can be executed at all.
    pub async fn probe(&self) -> Result<(), ModelError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ModelError::Load(format!("{}: {}", self.binary, e)))?;
        if !output.status.success() {
            return Err(ModelError::Load(format!(
                "{} --version exited with {}",
                self.binary, output.status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, png: &[u8]) -> Result<Vec<OcrToken>, ModelError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", &self.language, "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ModelError::Recognition(format!("{}: {}", self.binary, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(png)
                .await
                .map_err(|e| ModelError::Recognition(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ModelError::Recognition(e.to_string()))?;
        if !output.status.success() {
            return Err(ModelError::Recognition(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let tokens = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!("Recognized {} text lines", tokens.len());
        Ok(tokens)
    }
}

struct LineAccumulator {
    key: (u32, u32, u32, u32),
    words: Vec<String>,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
    confidence_sum: f64,
}

impl LineAccumulator {
    fn into_token(self) -> OcrToken {
        let confidence = self.confidence_sum / self.words.len() as f64 / 100.0;
        OcrToken::from_box(
            self.words.join(" "),
            Rect {
                x: self.left,
                y: self.top,
                width: self.right - self.left,
                height: self.bottom - self.top,
            },
            confidence,
        )
    }
}

/// Group tesseract word rows into one token per text line.
///
/// Columns: level, page, block, paragraph, line, word, left, top, width,
/// height, conf, text. Only word rows (level 5) with text are used.
pub fn parse_tsv(tsv: &str) -> Vec<OcrToken> {
    let mut tokens = Vec::new();
    let mut current: Option<LineAccumulator> = None;

    for row in tsv.lines() {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }
        let ints: Option<Vec<u32>> = cols[1..5].iter().map(|c| c.parse().ok()).collect();
        let geometry: Option<Vec<f64>> = cols[6..11].iter().map(|c| c.parse().ok()).collect();
        let (Some(ints), Some(geometry)) = (ints, geometry) else {
            continue;
        };
        let key = (ints[0], ints[1], ints[2], ints[3]);
        let (left, top, width, height, conf) =
            (geometry[0], geometry[1], geometry[2], geometry[3], geometry[4].max(0.0));

        match current.as_mut() {
            Some(line) if line.key == key => {
                line.words.push(text.to_string());
                line.left = line.left.min(left);
                line.top = line.top.min(top);
                line.right = line.right.max(left + width);
                line.bottom = line.bottom.max(top + height);
                line.confidence_sum += conf;
            }
            _ => {
                if let Some(done) = current.take() {
                    tokens.push(done.into_token());
                }
                current = Some(LineAccumulator {
                    key,
                    words: vec![text.to_string()],
                    left,
                    top,
                    right: left + width,
                    bottom: top + height,
                    confidence_sum: conf,
                });
            }
        }
    }

    if let Some(done) = current {
        tokens.push(done.into_token());
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestar_common::protocol::Point;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t1280\t720\t-1\t
4\t1\t1\t1\t1\t0\t100\t50\t150\t20\t-1\t
5\t1\t1\t1\t1\t1\t100\t50\t60\t20\t90\tUser
5\t1\t1\t1\t1\t2\t170\t52\t80\t18\t70\tName
5\t1\t2\t1\t1\t1\t400\t300\t50\t20\t95\tLogin
5\t1\t2\t1\t1\t2\t460\t300\t10\t20\t-1\t ";

    #[test]
    fn test_words_grouped_into_lines() {
        let tokens = parse_tsv(SAMPLE);
        assert_eq!(tokens.len(), 2);

        assert_eq!(tokens[0].text, "User Name");
        assert!((tokens[0].confidence - 0.8).abs() < 1e-9);
        assert_eq!(tokens[0].polygon[0], Point::new(100.0, 50.0));
        assert_eq!(tokens[0].polygon[2], Point::new(250.0, 70.0));

        assert_eq!(tokens[1].text, "Login");
        assert_eq!(tokens[1].center(), Point::new(425.0, 310.0));
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_tsv("").is_empty());
        assert!(parse_tsv("level\tpage_num").is_empty());
    }
}
