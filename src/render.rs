//! Summary image rendering and publication
//!
//! The renderer turns a [`Summary`] into bytes; the reporter writes those
//! bytes to the configured cache path, which `GET /countries/image` serves.

use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::SecondsFormat;

use crate::error::RenderError;
use crate::refresh::summary::Summary;

pub trait SummaryRenderer: Send + Sync {
    fn render(&self, summary: &Summary) -> Result<Vec<u8>, RenderError>;

    /// MIME type of the rendered bytes
    fn content_type(&self) -> &'static str;
}

/// 1000x700 SVG summary card
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgSummaryRenderer;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 700;

impl SummaryRenderer for SvgSummaryRenderer {
    fn render(&self, summary: &Summary) -> Result<Vec<u8>, RenderError> {
        let mut svg = String::new();

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = WIDTH,
            h = HEIGHT
        )?;
        writeln!(svg, r##"  <rect width="100%" height="100%" fill="#ffffff"/>"##)?;
        writeln!(
            svg,
            r##"  <g font-family="sans-serif" fill="#111111">"##
        )?;
        writeln!(
            svg,
            r#"    <text x="30" y="60" font-size="36" font-weight="bold">Country GDP Summary</text>"#
        )?;
        writeln!(
            svg,
            r#"    <text x="30" y="110" font-size="20">Total countries: {}</text>"#,
            summary.total
        )?;
        writeln!(
            svg,
            r#"    <text x="30" y="140" font-size="20">Last refreshed: {}</text>"#,
            summary
                .refreshed_at
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        )?;
        writeln!(
            svg,
            r#"    <text x="30" y="190" font-size="22">Top 5 countries by estimated GDP</text>"#
        )?;

        for (idx, rank) in summary.top5.iter().enumerate() {
            let y = 230 + idx * 40;
            writeln!(
                svg,
                r#"    <text x="40" y="{}" font-size="18">{}. {}: {}</text>"#,
                y,
                idx + 1,
                xml_escape(&rank.name),
                format_gdp(rank.estimated_gdp)
            )?;
        }

        writeln!(svg, "  </g>")?;
        writeln!(svg, "</svg>")?;
        Ok(svg.into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Thousands-grouped, at most two decimals: 1234567.891 -> "1,234,567.89"
pub fn format_gdp(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = frac_part.trim_end_matches('0');
    let sign = if value < 0.0 { "-" } else { "" };
    if frac.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac)
    }
}

/// Renders summaries and stores the latest one on disk
#[derive(Clone)]
pub struct SummaryReporter {
    renderer: Arc<dyn SummaryRenderer>,
    output_path: PathBuf,
}

impl SummaryReporter {
    pub fn new(renderer: Arc<dyn SummaryRenderer>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn content_type(&self) -> &'static str {
        self.renderer.content_type()
    }

    /// Render and replace the cached artifact; readers never see a partial file
    pub async fn publish(&self, summary: &Summary) -> Result<PathBuf, RenderError> {
        let bytes = self.renderer.render(summary)?;
        let path = &self.output_path;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| write_error(dir, e))?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| write_error(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| write_error(path, e))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Summary image written");
        Ok(path.clone())
    }

    /// Bytes of the last published artifact, `None` if there is none yet
    pub async fn load(&self) -> std::io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.output_path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn write_error(path: &Path, source: std::io::Error) -> RenderError {
    RenderError::Write {
        path: path.display().to_string(),
        source,
    }
}
