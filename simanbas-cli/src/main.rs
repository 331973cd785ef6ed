mod tui;

use clap::{CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tui::app::App;
use tui::events::handle_key;
use tui::ui::render;
use simanbas_common::{Config, SimanbasError};
use simanbas_core::{
    build_histogram, export_csv, export_json, format_datetime, parse_sample, parse_scores,
    print_quality_summary, render_histogram, render_option_stats, render_question,
    resolve_export_path, validate_bin_count, ApiClient, Histogram, MetricDistributions,
    QualitySummary, Session, SummaryFilter,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "simanbas", version, about = "Item-analysis client for the SiManBaS question bank")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bin a raw sample read from FILE (or stdin)
    Bin {
        file: Option<PathBuf>,
        #[arg(long, allow_negative_numbers = true)]
        bins: Option<i64>,
        #[arg(long, default_value = "Value")]
        label: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    Login {
        #[arg(long)]
        username: String,
        /// falls back to $SIMANBAS_PASSWORD, then a prompt
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in again as the stored session's user
    Refresh {
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    /// P-value and D-index distributions for the analysed questions
    Analysis {
        #[arg(long)] subject: Option<String>,
        #[arg(long)] topic: Option<String>,
        #[arg(long)] question_type: Option<String>,
        #[arg(long)] min_responses: Option<u32>,
        #[arg(long)] limit: Option<u32>,
        #[arg(long, allow_negative_numbers = true)]
        bins: Option<i64>,
        #[arg(long)] tui: bool,
        #[arg(long)] export: Option<PathBuf>,
        #[arg(long)] format: Option<String>,
    },
    /// Answer-option selection stats for one question
    Options { question_id: Uuid },
    /// Recompute a question's indices, optionally with students' total scores
    Trigger {
        question_id: Uuid,
        /// JSON `{"scores": {...}}` or CSV with student_identifier,total_score
        #[arg(long)]
        scores: Option<PathBuf>,
    },
    /// Show a question with its latest analysis
    Question {
        question_id: Uuid,
        #[arg(long)]
        comments: bool,
    },
    Meta {
        #[command(subcommand)]
        list: MetaCommand,
    },
    Sessions,
    Rosters,
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    Completions { shell: clap_complete::Shell },
}

#[derive(Subcommand)]
enum MetaCommand {
    Subjects,
    Topics {
        #[arg(long)]
        subject: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    Path,
    Show,
    /// Write the current settings (defaults if no file yet)
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config not loaded, using defaults: {e}");
            Config::default()
        }
    };
    match cli.command {
        Commands::Bin { file, bins, label, format } => run_bin(file, bins, &label, &format, &config)?,
        Commands::Login { username, password } => run_login(&username, password, &config).await?,
        Commands::Refresh { password } => run_refresh(password, &config).await?,
        Commands::Logout => {
            if Session::clear()? { println!("Logged out"); } else { println!("No stored session"); }
        }
        Commands::Whoami => run_whoami(&config).await?,
        Commands::Analysis { subject, topic, question_type, min_responses, limit, bins, tui, export, format } => {
            let filter = SummaryFilter {
                subject,
                topic,
                question_type,
                min_responses: min_responses.or(config.analysis.min_responses),
                skip: None,
                limit: Some(limit.unwrap_or(config.analysis.limit)),
            };
            run_analysis(filter, bins, tui, export, format, config).await?
        }
        Commands::Options { question_id } => run_options(question_id, &config).await?,
        Commands::Trigger { question_id, scores } => run_trigger(question_id, scores, &config).await?,
        Commands::Question { question_id, comments } => run_question(question_id, comments, &config).await?,
        Commands::Meta { list } => {
            let api = client(&config)?;
            let items = match list {
                MetaCommand::Subjects => api.subjects().await?,
                MetaCommand::Topics { subject } => api.topics(subject.as_deref()).await?,
            };
            for item in items {
                println!("{item}");
            }
        }
        Commands::Sessions => {
            for s in client(&config)?.test_sessions().await? {
                println!("{}  {:<32} {} questions", s.id, s.name, s.questions.len());
            }
        }
        Commands::Rosters => {
            for r in client(&config)?.rosters().await? {
                println!("{}  {:<32} {} students", r.id, r.name, r.students.len());
            }
        }
        Commands::Config { action } => run_config(action, &config)?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "simanbas", &mut io::stdout());
        }
    }
    Ok(())
}

fn resolve_bins(requested: Option<i64>, config: &Config) -> anyhow::Result<usize> {
    Ok(validate_bin_count(requested.unwrap_or(config.analysis.histogram_bins))?)
}

fn client(config: &Config) -> anyhow::Result<ApiClient> {
    Ok(ApiClient::new(&config.api, Session::load())?)
}

fn run_bin(file: Option<PathBuf>, bins: Option<i64>, label: &str, format: &str, config: &Config) -> anyhow::Result<()> {
    let bins = resolve_bins(bins, config)?;
    let text = match &file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let sample = parse_sample(&text)?;
    let hist = build_histogram(&sample, bins, label)?;
    match format {
        "text" => print_histograms(&[hist], config),
        "json" => println!("{}", serde_json::to_string_pretty(&hist)?),
        "chart" => println!("{}", serde_json::to_string_pretty(&hist.chart_rows())?),
        "csv" => simanbas_core::export::write_csv(&mut io::stdout(), &[hist])?,
        _ => anyhow::bail!("Unknown format: {format} (use text, json, chart or csv)"),
    }
    Ok(())
}

fn read_password(flag: Option<String>, username: &str) -> anyhow::Result<String> {
    if let Some(p) = flag.or_else(|| std::env::var("SIMANBAS_PASSWORD").ok()) {
        return Ok(p);
    }
    eprint!("Password for {username}: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

async fn run_login(username: &str, password: Option<String>, config: &Config) -> anyhow::Result<()> {
    let password = read_password(password, username)?;
    let mut api = ApiClient::new(&config.api, None)?;
    let session = api.login(username, &password).await?;
    session.save()?;
    println!("Logged in as {} ({})", session.username, api.base_url());
    Ok(())
}

async fn run_refresh(password: Option<String>, config: &Config) -> anyhow::Result<()> {
    let mut api = client(config)?;
    let Some(username) = api.session().map(|s| s.username.clone()) else {
        anyhow::bail!("Not logged in (run `simanbas login`)");
    };
    let password = read_password(password, &username)?;
    let session = api.refresh(&password).await?;
    session.save()?;
    println!("Token refreshed for {}", session.username);
    Ok(())
}

async fn run_whoami(config: &Config) -> anyhow::Result<()> {
    let api = client(config)?;
    let Some(session) = api.session() else {
        anyhow::bail!("Not logged in (run `simanbas login`)");
    };
    println!("{:<12} {}", "Backend:", session.base_url);
    println!("{:<12} {}", "Since:", format_datetime(&session.obtained_at));
    let me = api.me().await?;
    println!("{:<12} {} <{}>", "User:", me.display_name(), me.email);
    println!("{:<12} {:?}", "Role:", me.role);
    Ok(())
}

fn describe(filter: &SummaryFilter) -> String {
    let parts: Vec<String> = filter
        .to_query()
        .into_iter()
        .filter(|(k, _)| *k != "limit" && *k != "skip")
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    if parts.is_empty() { "all questions".into() } else { parts.join(" ") }
}

async fn run_analysis(
    filter: SummaryFilter,
    bins: Option<i64>,
    tui: bool,
    export: Option<PathBuf>,
    format: Option<String>,
    config: Config,
) -> anyhow::Result<()> {
    let bins = resolve_bins(bins, &config)?;
    let api = client(&config)?;
    let records = api.analysis_summary(&filter).await?;
    if tui {
        let app = App::new(describe(&filter), records, bins, config)?;
        return run_tui(app);
    }
    let dist = MetricDistributions::build(&records, bins)?;
    let quality = QualitySummary::from_results(&records);
    let hists = [dist.difficulty, dist.discrimination];
    if let Some(path) = export {
        let path = resolve_export_path(&path, &config.export.output_dir);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
        }
        let format = format.unwrap_or_else(|| config.export.format.clone());
        match format.as_str() {
            "json" => export_json(&path, &hists, Some(&quality))?,
            "csv" => export_csv(&path, &hists)?,
            _ => anyhow::bail!("Unknown format: {format} (use json or csv)"),
        }
        println!("Exported to {}", path.display());
        return Ok(());
    }
    println!("{} ({} records)", describe(&filter), records.len());
    println!();
    print_histograms(&hists, &config);
    print_quality_summary(&quality);
    Ok(())
}

fn print_histograms(hists: &[Histogram], config: &Config) {
    for hist in hists {
        println!("{}", hist.series);
        for line in render_histogram(hist, config.display.bar_width) {
            println!("  {line}");
        }
        println!();
    }
}

async fn run_options(question_id: Uuid, config: &Config) -> anyhow::Result<()> {
    let api = client(config)?;
    let stats = api.question_option_stats(question_id).await?;
    println!("{}", simanbas_core::truncate_text(&stats.question_content, config.display.content_truncate));
    println!("{} ({} responses)", stats.question_type, stats.total_responses_for_question);
    for line in render_option_stats(&stats, config.display.bar_width) {
        println!("  {line}");
    }
    Ok(())
}

async fn run_trigger(question_id: Uuid, scores: Option<PathBuf>, config: &Config) -> anyhow::Result<()> {
    let scores = match scores {
        Some(path) => Some(parse_scores(&std::fs::read_to_string(&path)?)?),
        None => None,
    };
    let api = client(config)?;
    let result = api.trigger_analysis(question_id, scores.as_ref()).await?;
    if let Some(s) = &scores {
        println!("Analysed with {} student scores", s.scores.len());
    }
    let question = api.question(question_id).await?;
    for line in render_question(&question, Some(&result), &[]) {
        println!("{line}");
    }
    Ok(())
}

async fn run_question(question_id: Uuid, with_comments: bool, config: &Config) -> anyhow::Result<()> {
    let api = client(config)?;
    let question = api.question(question_id).await?;
    let analysis = match api.question_analysis(question_id).await {
        Ok(a) => Some(a),
        Err(SimanbasError::Api { status: 404, .. }) => None,
        Err(e) => return Err(e.into()),
    };
    let comments = if with_comments { api.comments(question_id).await? } else { Vec::new() };
    for line in render_question(&question, analysis.as_ref(), &comments) {
        println!("{line}");
    }
    Ok(())
}

fn run_config(action: ConfigCommand, config: &Config) -> anyhow::Result<()> {
    let path = Config::config_path();
    match action {
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Show => print!("{}", toml::to_string_pretty(config)?),
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config.save()?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn run_tui(mut app: App) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick = Duration::from_millis(66); // 15Hz
    let result = (|| -> anyhow::Result<()> {
        loop {
            terminal.draw(|f| render(f, &app))?;
            if event::poll(tick)? {
                if let Event::Key(key) = event::read()? { handle_key(&mut app, key); }
            }
            if app.should_quit { return Ok(()); }
        }
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}
