use serde::{Deserialize, Serialize};

/// Query for `GET /analysis/summary-stats`. Blank values are never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryFilter {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub question_type: Option<String>,
    pub min_responses: Option<u32>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl SummaryFilter {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        let text = [
            ("subject", &self.subject),
            ("topic", &self.topic),
            ("question_type", &self.question_type),
        ];
        for (key, val) in text {
            if let Some(v) = val.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                q.push((key, v.to_owned()));
            }
        }
        let nums = [("min_responses", self.min_responses), ("skip", self.skip), ("limit", self.limit)];
        for (key, val) in nums {
            if let Some(v) = val {
                q.push((key, v.to_string()));
            }
        }
        q
    }

    pub fn is_empty(&self) -> bool {
        self.to_query().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_dropped() {
        let f = SummaryFilter {
            subject: Some("  ".into()),
            topic: Some("Algebra ".into()),
            question_type: None,
            min_responses: Some(0),
            skip: None,
            limit: Some(100),
        };
        assert_eq!(
            f.to_query(),
            vec![("topic", "Algebra".to_string()), ("min_responses", "0".to_string()), ("limit", "100".to_string())]
        );
    }

    #[test]
    fn default_is_empty() {
        assert!(SummaryFilter::default().is_empty());
    }
}
