use std::io::Write;
use std::path::{Path, PathBuf};
use simanbas_common::models::{AnalysisResult, Comment, Question, QuestionKind, QuestionOptionStats};
use simanbas_common::Result;

use crate::format::{format_datetime, format_metric};
use crate::histogram::Histogram;
use crate::quality::{needs_review, DifficultyBand, DiscriminationBand, QualitySummary};

// --- text rendering ---

/// One line per bin: `label |████      | count`. Bars scale to the tallest bin.
pub fn render_histogram(hist: &Histogram, bar_width: usize) -> Vec<String> {
    if hist.is_empty() {
        return vec![format!("{}: no data", hist.series)];
    }
    let bw = bar_width.max(1);
    let max_c = hist.max_count().max(1);
    let label_w = hist.bins.iter().map(|b| b.label.len()).max().unwrap_or(0);
    hist.bins
        .iter()
        .map(|bin| {
            let blen = (bin.count as f64 / max_c as f64 * bw as f64).round() as usize;
            format!("{:>label_w$} |{:<bw$}| {}", bin.label, "█".repeat(blen), bin.count)
        })
        .collect()
}

pub fn render_option_stats(stats: &QuestionOptionStats, bar_width: usize) -> Vec<String> {
    if stats.options_stats.is_empty() {
        return vec!["no option statistics".into()];
    }
    let bw = bar_width.max(1);
    let text_w = stats.options_stats.iter().map(|o| o.option_text.chars().count()).max().unwrap_or(0).min(40);
    stats
        .options_stats
        .iter()
        .map(|o| {
            let pct = o.selection_percentage.clamp(0.0, 100.0);
            let blen = (pct / 100.0 * bw as f64).round() as usize;
            let mark = if o.is_correct { '*' } else { ' ' };
            let text = crate::format::truncate_text(&o.option_text, 40);
            format!("{mark} {text:<text_w$} |{:<bw$}| {:5.1}% ({})", "█".repeat(blen), pct, o.selection_count)
        })
        .collect()
}

/// Question detail: header, per-type body, latest indices and comments.
pub fn render_question(q: &Question, analysis: Option<&AnalysisResult>, comments: &[Comment]) -> Vec<String> {
    let mut lines = vec![q.content.clone()];
    let place = match (q.subject.as_deref(), q.topic.as_deref()) {
        (Some(s), Some(t)) => format!("{s} / {t}"),
        (Some(s), None) => s.to_owned(),
        (None, Some(t)) => t.to_owned(),
        (None, None) => "-".to_owned(),
    };
    lines.push(format!("{} | {place}", q.kind.label()));
    match &q.kind {
        QuestionKind::MultipleChoice { answer_options } => {
            let mut options: Vec<_> = answer_options.iter().collect();
            options.sort_by_key(|o| o.display_order.unwrap_or(i32::MAX));
            for o in options {
                lines.push(format!("  {} {}", if o.is_correct { '*' } else { '-' }, o.option_text));
            }
        }
        QuestionKind::ShortAnswer { correct_answer_text } => {
            lines.push(format!("  answer: {}", correct_answer_text.as_deref().unwrap_or("-")));
        }
        QuestionKind::Essay => {}
    }
    match analysis {
        Some(a) => {
            let p_band = a.difficulty_index_p_value.map_or("n/a", |p| DifficultyBand::classify(p).as_str());
            let d_band = a.discrimination_index.map_or("n/a", |d| DiscriminationBand::classify(d).as_str());
            lines.push(format!(
                "P-Value {} ({p_band})  D-Index {} ({d_band})  responses {}{}",
                format_metric(a.difficulty_index_p_value),
                format_metric(a.discrimination_index),
                a.responses_analyzed_count.map_or("-".into(), |c| c.to_string()),
                if needs_review(a) { "  [review]" } else { "" },
            ));
        }
        None => lines.push("not analysed yet".into()),
    }
    if !comments.is_empty() {
        lines.push(format!("Comments ({})", comments.len()));
        for c in comments {
            lines.push(format!("  {} ({}): {}", c.owner.display_name(), format_datetime(&c.created_at), c.content));
        }
    }
    lines
}

pub fn print_quality_summary(q: &QualitySummary) {
    println!("{:<16} {}", "Records:", q.total);
    println!("{:<16} hard={} ideal={} easy={} n/a={}", "P-Value:", q.hard, q.moderate, q.easy, q.missing_p_value);
    println!("{:<16} poor={} good={} excellent={} n/a={}", "D-Index:", q.poor, q.good, q.excellent, q.missing_d_index);
    println!("{:<16} {}", "Needs review:", q.needs_review);
}

// --- JSON export ---

pub fn export_json(output_path: &Path, histograms: &[Histogram], quality: Option<&QualitySummary>) -> Result<()> {
    let mut doc = serde_json::json!({ "histograms": histograms });
    if let Some(q) = quality {
        doc["quality"] = serde_json::to_value(q)?;
    }
    let mut file = std::fs::File::create(output_path)?;
    serde_json::to_writer_pretty(&mut file, &doc)?;
    writeln!(file)?;
    Ok(())
}

/// A bare file name goes under `output_dir`; anything with a directory part
/// is used as given.
pub fn resolve_export_path(path: &Path, output_dir: &str) -> PathBuf {
    let has_dir = path.parent().is_some_and(|p| !p.as_os_str().is_empty());
    if has_dir || path.is_absolute() || output_dir.trim().is_empty() {
        path.to_path_buf()
    } else {
        Path::new(output_dir).join(path)
    }
}

// --- CSV export ---

pub fn export_csv(output_path: &Path, histograms: &[Histogram]) -> Result<()> {
    let mut file = std::fs::File::create(output_path)?;
    write_csv(&mut file, histograms)
}

pub fn write_csv<W: Write>(out: &mut W, histograms: &[Histogram]) -> Result<()> {
    writeln!(out, "series,label,range_start,range_end,count")?;
    for hist in histograms {
        for bin in &hist.bins {
            writeln!(
                out,
                "{},{},{},{},{}",
                csv_field(&hist.series),
                csv_field(&bin.label),
                bin.range_start,
                bin.range_end,
                bin.count
            )?;
        }
    }
    Ok(())
}

fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
