use simanbas_common::models::StudentScores;
use simanbas_common::{Result, SimanbasError};
use std::collections::BTreeMap;

const ID_COLUMN: &str = "student_identifier";
const SCORE_COLUMN: &str = "total_score";

/// Reads the total scores used for the discrimination index.
///
/// Accepts either a JSON object `{"scores": {"S001": 87.5, ...}}` or a CSV
/// file with `student_identifier` and `total_score` columns (other columns
/// are ignored).
pub fn parse_scores(text: &str) -> Result<StudentScores> {
    let trimmed = text.trim_start();
    let scores = if trimmed.starts_with('{') {
        let parsed: StudentScores = serde_json::from_str(trimmed).map_err(|e| {
            SimanbasError::InvalidArgument(format!("scores JSON must be {{\"scores\": {{...}}}}: {e}"))
        })?;
        parsed.scores
    } else {
        parse_csv(trimmed)?
    };
    if scores.is_empty() {
        return Err(SimanbasError::InvalidArgument("scores file has no students".into()));
    }
    if let Some((id, _)) = scores.iter().find(|(_, s)| !s.is_finite()) {
        return Err(SimanbasError::InvalidArgument(format!("score for {id} is not a number")));
    }
    Ok(StudentScores { scores })
}

fn parse_csv(text: &str) -> Result<BTreeMap<String, f64>> {
    let bad = |e: csv::Error| SimanbasError::InvalidArgument(format!("scores CSV: {e}"));
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers().map_err(bad)?;
    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            SimanbasError::InvalidArgument(format!(
                "scores CSV header must contain '{ID_COLUMN}' and '{SCORE_COLUMN}'"
            ))
        })
    };
    let (id_col, score_col) = (column(ID_COLUMN)?, column(SCORE_COLUMN)?);

    let mut scores = BTreeMap::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(bad)?;
        let id = record.get(id_col).unwrap_or_default();
        if id.is_empty() {
            continue;
        }
        let raw = record.get(score_col).unwrap_or_default();
        let score: f64 = raw.parse().map_err(|_| {
            SimanbasError::InvalidArgument(format!("row {}: '{raw}' is not a score", row + 2))
        })?;
        scores.insert(id.to_owned(), score);
    }
    Ok(scores)
}
