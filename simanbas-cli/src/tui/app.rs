use crate::tui::theme::Theme;
use simanbas_common::models::AnalysisResult;
use simanbas_common::Config;
use simanbas_core::{quality_points, MetricDistributions, QualitySummary, Result};

pub const MAX_BINS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Focus {
    Charts,
    Table,
}

pub struct App {
    pub filter_desc: String,
    pub records: Vec<AnalysisResult>,
    pub distributions: MetricDistributions,
    pub quality: QualitySummary,
    /// `(p_value, d_index)` pairs for the scatter chart
    pub points: Vec<(f64, f64)>,
    pub bins: usize,
    pub view: View,
    pub focus: Focus,
    pub table_selected: usize,
    pub status_msg: String,
    pub should_quit: bool,
    pub theme: Theme,
    pub config: Config,
}

impl App {
    pub fn new(filter_desc: String, records: Vec<AnalysisResult>, bins: usize, config: Config) -> Result<Self> {
        let distributions = MetricDistributions::build(&records, bins)?;
        let quality = QualitySummary::from_results(&records);
        let points = quality_points(&records);
        Ok(Self {
            filter_desc,
            records,
            distributions,
            quality,
            points,
            bins,
            view: View::Dashboard,
            focus: Focus::Charts,
            table_selected: 0,
            status_msg: "Ready | q:quit ?:help".into(),
            should_quit: false,
            theme: Theme::from_name(&config.display.theme),
            config,
        })
    }

    pub fn rebin(&mut self, bins: usize) {
        let bins = bins.clamp(1, MAX_BINS);
        if bins == self.bins {
            return;
        }
        match MetricDistributions::build(&self.records, bins) {
            Ok(d) => {
                self.distributions = d;
                self.bins = bins;
                self.status_msg = format!("{bins} bins");
            }
            Err(e) => self.status_msg = format!("rebin failed: {e}"),
        }
    }

    pub fn more_bins(&mut self) {
        self.rebin(self.bins + 1);
    }

    pub fn fewer_bins(&mut self) {
        self.rebin(self.bins.saturating_sub(1));
    }

    pub fn table_down(&mut self) {
        let max = self.records.len().saturating_sub(1);
        if self.table_selected < max {
            self.table_selected += 1;
        }
    }

    pub fn table_up(&mut self) {
        if self.table_selected > 0 {
            self.table_selected -= 1;
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Charts => Focus::Table,
            Focus::Table => Focus::Charts,
        };
    }

    pub fn selected(&self) -> Option<&AnalysisResult> {
        self.records.get(self.table_selected)
    }
}
