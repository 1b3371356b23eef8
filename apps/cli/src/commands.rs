//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use leadgen_analytics::{Period, summarize_campaigns};
use leadgen_core::{
    CampaignOrchestrator, CatalogProspects, CycleReport, InMemoryCrm, ProgressReporter,
    SimulatedOutreach, StatusReport,
};
use leadgen_scoring::QualificationPipeline;
use leadgen_shared::{
    AppConfig, CampaignConfig, CampaignId, CampaignState, CycleStage, FinalReport,
    PersistenceStore, ProspectProvider, QualifiedLead, database_path, init_config, load_config,
    load_config_from,
};
use leadgen_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// leadgen — research, qualify and contact B2B leads in daily cycles.
#[derive(Parser)]
#[command(
    name = "leadgen",
    version,
    about = "Run lead-generation campaigns: research, qualify, reach out, report.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.leadgen/leadgen.toml).
    #[arg(long, env = "LEADGEN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Database file (overrides [storage].database_path).
    #[arg(long, env = "LEADGEN_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Report kinds accepted by `report --period`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
    Final,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start a new campaign.
    Start {
        /// Campaign id (generated when omitted).
        #[arg(long)]
        id: Option<String>,
    },

    /// Pause a running campaign.
    Pause {
        #[arg(long)]
        id: String,
    },

    /// Resume a paused campaign.
    Resume {
        #[arg(long)]
        id: String,
    },

    /// Stop a campaign and print its final report.
    Stop {
        #[arg(long)]
        id: String,
    },

    /// Run research → qualify → outreach → CRM sync for a running campaign.
    RunCycle {
        #[arg(long)]
        id: String,

        /// Number of consecutive cycles to run.
        #[arg(long, default_value = "1")]
        cycles: u32,
    },

    /// Research and score prospects against the configured criteria
    /// without touching any campaign.
    Qualify {
        /// Number of prospects to research.
        #[arg(long, default_value = "25")]
        count: u32,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show campaign status, duration and rates.
    Status {
        #[arg(long)]
        id: String,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the prospect-volume trend and recommendations.
    Insights {
        #[arg(long)]
        id: String,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a daily, weekly, monthly or final report as JSON.
    Report {
        #[arg(long)]
        id: String,

        /// Reference day, YYYY-MM-DD (defaults to today, UTC).
        #[arg(long)]
        day: Option<NaiveDate>,

        #[arg(long, value_enum, default_value = "daily")]
        period: ReportPeriod,
    },

    /// List all campaigns, newest first, with totals across them.
    List,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leadgen=info",
        1 => "leadgen=debug",
        _ => "leadgen=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Resolved configuration shared by every campaign command.
struct Context {
    app: AppConfig,
    campaign: CampaignConfig,
    db_path: PathBuf,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self> {
        let app = match &cli.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        let campaign = CampaignConfig::try_from(&app)?;
        let db_path = match &cli.db {
            Some(path) => path.clone(),
            None => database_path(&app)?,
        };
        Ok(Self {
            app,
            campaign,
            db_path,
        })
    }

    /// Wire the demo providers to `store`.
    fn orchestrator(&self, store: Storage) -> CampaignOrchestrator {
        let prospects =
            CatalogProspects::sample().for_industry(self.campaign.criteria.target_industry.clone());
        CampaignOrchestrator::new(self.campaign.clone(), prospects, store)
            .with_outreach(SimulatedOutreach::new())
            .with_crm(InMemoryCrm::new())
    }

    /// Restore campaign `id`. Read-only opens never create the database.
    async fn open_campaign(&self, id: &str, readonly: bool) -> Result<CampaignOrchestrator> {
        let store = if readonly {
            Storage::open_readonly(&self.db_path).await?
        } else {
            Storage::open(&self.db_path).await?
        };
        let orchestrator = self.orchestrator(store);
        orchestrator.restore(&CampaignId::parse(id)?).await?;
        Ok(orchestrator)
    }
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&Context::load(&cli)?.app),
        };
    }

    let ctx = Context::load(&cli)?;
    match cli.command {
        Command::Start { id } => cmd_start(&ctx, id.as_deref()).await,
        Command::Pause { id } => cmd_pause(&ctx, &id).await,
        Command::Resume { id } => cmd_resume(&ctx, &id).await,
        Command::Stop { id } => cmd_stop(&ctx, &id).await,
        Command::RunCycle { id, cycles } => cmd_run_cycle(&ctx, &id, cycles).await,
        Command::Qualify { count, json } => cmd_qualify(&ctx, count, json).await,
        Command::Status { id, json } => cmd_status(&ctx, &id, json).await,
        Command::Insights { id, json } => cmd_insights(&ctx, &id, json).await,
        Command::Report { id, day, period } => cmd_report(&ctx, &id, day, period).await,
        Command::List => cmd_list(&ctx).await,
        Command::Config { .. } => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Lifecycle commands
// ---------------------------------------------------------------------------

async fn cmd_start(ctx: &Context, id: Option<&str>) -> Result<()> {
    let campaign_id = id.map(CampaignId::parse).transpose()?;
    let store = Storage::open(&ctx.db_path).await?;
    let orchestrator = ctx.orchestrator(store);

    let state = orchestrator.start(campaign_id).await?;
    info!(db = %ctx.db_path.display(), "campaign created");

    println!();
    println!("  Campaign started!");
    println!("  ID:       {}", state.campaign_id);
    println!("  Industry: {}", ctx.campaign.criteria.target_industry);
    println!("  Target:   {} prospects/day", ctx.campaign.daily_lead_target);
    println!();
    println!("  Next: leadgen run-cycle --id {}", state.campaign_id);
    println!();
    Ok(())
}

async fn cmd_pause(ctx: &Context, id: &str) -> Result<()> {
    let state = ctx.open_campaign(id, false).await?.pause().await?;
    println!("Campaign {} is {}", state.campaign_id, state.status);
    Ok(())
}

async fn cmd_resume(ctx: &Context, id: &str) -> Result<()> {
    let state = ctx.open_campaign(id, false).await?.resume().await?;
    println!("Campaign {} is {}", state.campaign_id, state.status);
    Ok(())
}

async fn cmd_stop(ctx: &Context, id: &str) -> Result<()> {
    let orchestrator = ctx.open_campaign(id, false).await?;
    let report = orchestrator
        .stop()
        .await?
        .ok_or_else(|| eyre!("campaign '{id}' is not running or paused"))?;
    print_final_report(&report);
    Ok(())
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

async fn cmd_run_cycle(ctx: &Context, id: &str, cycles: u32) -> Result<()> {
    if cycles == 0 {
        return Err(eyre!("--cycles must be at least 1"));
    }
    let orchestrator = ctx.open_campaign(id, false).await?;

    for n in 1..=cycles {
        let reporter = CliProgress::new();
        let report = orchestrator.run_cycle_with(&reporter).await;
        reporter.spinner.finish_and_clear();
        let report = report?;

        if cycles > 1 {
            println!("  Cycle {n}/{cycles}");
        }
        print_cycle_report(&report);
    }
    Ok(())
}

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, stage: CycleStage) {
        let message = match stage {
            CycleStage::Research => "Researching prospects",
            CycleStage::Qualify => "Qualifying candidates",
            CycleStage::Outreach => "Sending email sequences",
            CycleStage::CrmSync => "Syncing leads to CRM",
            CycleStage::Metrics => "Updating metrics",
            CycleStage::Persist => "Saving campaign state",
        };
        self.spinner.set_message(message);
    }

    fn done(&self, _report: &CycleReport) {
        self.spinner.finish_and_clear();
    }
}

fn print_cycle_report(report: &CycleReport) {
    let c = &report.cycle;
    println!();
    println!("  Cycle complete ({:.1}s)", report.elapsed.as_secs_f64());
    println!("  Researched: {}", c.prospects_researched);
    println!("  Qualified:  {}", c.leads_qualified);
    if let Some(outreach) = &report.outreach {
        println!(
            "  Outreach:   {} sent, {} failed, {} responses, {} meetings",
            outreach.sent, outreach.failed, outreach.responses, outreach.meetings_booked
        );
    }
    if let Some(crm) = &report.crm {
        println!(
            "  CRM:        {} synced, {} failed, {} duplicates",
            crm.successful_syncs, crm.failed_syncs, crm.duplicates_found
        );
    }

    if !report.leads.is_empty() {
        println!();
        for lead in &report.leads {
            println!(
                "  #{:<3} {:<28} {:.2}  {:<5} ${:.0}",
                lead.priority_rank,
                lead.candidate.company_name,
                lead.overall_score(),
                lead.score.qualification_level.as_str(),
                lead.estimated_value,
            );
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// Dry-run qualification
// ---------------------------------------------------------------------------

async fn cmd_qualify(ctx: &Context, count: u32, json: bool) -> Result<()> {
    if count == 0 {
        return Err(eyre!("--count must be at least 1"));
    }
    let criteria = &ctx.campaign.criteria;
    let prospects = CatalogProspects::sample().for_industry(criteria.target_industry.clone());
    let candidates = prospects.research(count).await?;
    let leads = QualificationPipeline::new().qualify(&candidates, criteria);
    info!(
        researched = candidates.len(),
        qualified = leads.len(),
        "dry-run qualification"
    );

    if json {
        return print_json(&leads);
    }

    println!();
    println!(
        "  {} of {} prospects qualified for {}",
        leads.len(),
        candidates.len(),
        criteria.target_industry
    );
    for lead in &leads {
        print_lead_breakdown(lead);
    }
    println!();
    Ok(())
}

fn print_lead_breakdown(lead: &QualifiedLead) {
    let score = &lead.score;
    println!();
    println!(
        "  #{} {}  {:.2} {}  ${:.0} ({:.0}% to convert)",
        lead.priority_rank,
        lead.candidate.company_name,
        score.overall_score,
        score.qualification_level.as_str(),
        lead.estimated_value,
        lead.conversion_probability * 100.0,
    );
    for part in &score.breakdown {
        println!(
            "      {:<21} {:.2} (weighted {:.3})  {}",
            part.criterion.label(),
            part.raw,
            part.weighted,
            part.interpretation
        );
    }
    println!("    Approach: {}", lead.recommended_approach);
    for rec in &score.recommendations {
        println!("    + {rec}");
    }
    for factor in &score.disqualifying_factors {
        println!("    ! {factor}");
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

async fn cmd_status(ctx: &Context, id: &str, json: bool) -> Result<()> {
    let status = ctx.open_campaign(id, true).await?.status().await?;
    if json {
        return print_json(&status);
    }
    print_status(&status);
    Ok(())
}

fn print_status(status: &StatusReport) {
    let state = &status.state;
    let m = &state.metrics;
    println!();
    println!("  Campaign:  {}", state.campaign_id);
    println!("  Status:    {}", state.status);
    println!("  Started:   {}", state.started_at.format("%Y-%m-%d %H:%M UTC"));
    println!("  Updated:   {}", state.last_updated.format("%Y-%m-%d %H:%M UTC"));
    println!("  Days:      {}", status.days_running);
    println!();
    println!("  Prospects: {}", m.prospects_researched);
    println!("  Qualified: {}", m.leads_qualified);
    println!("  Emails:    {}", m.emails_sent);
    println!("  Responses: {}", m.responses_received);
    println!("  Meetings:  {}", m.meetings_booked);
    println!("  Pipeline:  ${:.0}", m.total_pipeline_value);
    println!();
    println!(
        "  Qualification rate: {:.1}%",
        status.rates.qualification_rate * 100.0
    );
    println!("  Response rate:      {:.1}%", status.rates.response_rate * 100.0);
    println!("  Conversion rate:    {:.1}%", status.rates.conversion_rate * 100.0);
    println!(
        "  Daily average:      {:.1} ({:.0}% of target)",
        status.daily_average_prospects,
        status.target_achievement * 100.0
    );
    println!();
}

async fn cmd_insights(ctx: &Context, id: &str, json: bool) -> Result<()> {
    let trend = ctx.open_campaign(id, true).await?.insights().await?;
    if json {
        return print_json(&trend);
    }

    println!();
    println!(
        "  Trend:      {} ({:+.2} prospects/day over {} days)",
        trend.direction, trend.slope, trend.data_points
    );
    println!("  Next day:   ~{} prospects", trend.next_day_prospects);
    println!("  Confidence: {:.0}%", trend.confidence * 100.0);
    if !trend.recommended_actions.is_empty() {
        println!();
        println!("  Recommended actions:");
        for action in &trend.recommended_actions {
            println!("    - {action}");
        }
    }
    if !trend.risk_factors.is_empty() {
        println!();
        println!("  Risk factors:");
        for risk in &trend.risk_factors {
            println!("    - {risk}");
        }
    }
    println!();
    Ok(())
}

async fn cmd_report(
    ctx: &Context,
    id: &str,
    day: Option<NaiveDate>,
    period: ReportPeriod,
) -> Result<()> {
    let orchestrator = ctx.open_campaign(id, true).await?;
    let day = day.unwrap_or_else(|| Utc::now().date_naive());

    match period {
        ReportPeriod::Daily => print_json(&orchestrator.daily_report(day).await?),
        ReportPeriod::Weekly => {
            print_json(&orchestrator.period_summary(Period::Weekly, day).await?)
        }
        ReportPeriod::Monthly => {
            print_json(&orchestrator.period_summary(Period::Monthly, day).await?)
        }
        ReportPeriod::Final => {
            let report = orchestrator
                .final_report()
                .await
                .ok_or_else(|| eyre!("campaign '{id}' has not been stopped"))?;
            print_json(&report)
        }
    }
}

async fn cmd_list(ctx: &Context) -> Result<()> {
    let store = Storage::open_readonly(&ctx.db_path).await?;
    let campaigns: Vec<CampaignState> = store.list().await?;

    if campaigns.is_empty() {
        println!("No campaigns yet. Start one with: leadgen start");
        return Ok(());
    }

    println!(
        "  {:<40} {:<8} {:<17} {:>9} {:>9}",
        "ID", "STATUS", "STARTED", "PROSPECTS", "QUALIFIED"
    );
    for state in &campaigns {
        println!(
            "  {:<40} {:<8} {:<17} {:>9} {:>9}",
            state.campaign_id.as_str(),
            state.status.as_str(),
            state.started_at.format("%Y-%m-%d %H:%M").to_string(),
            state.metrics.prospects_researched,
            state.metrics.leads_qualified,
        );
    }

    let summary = summarize_campaigns(&campaigns);
    println!();
    println!(
        "  {} campaign(s), {} active",
        summary.total_campaigns, summary.active_campaigns
    );
    println!(
        "  Prospects: {}  Qualified: {} ({:.1}%)",
        summary.total_prospects,
        summary.total_qualified_leads,
        summary.overall_qualification_rate * 100.0
    );
    println!(
        "  Emails:    {} ({:.1} per campaign)  Meetings: {}",
        summary.total_emails_sent,
        summary.average_emails_per_campaign,
        summary.total_meetings_booked
    );
    println!(
        "  Pipeline:  ${:.0} (${:.0} per campaign)",
        summary.total_pipeline_value, summary.average_pipeline_value_per_campaign
    );
    Ok(())
}

fn print_final_report(report: &FinalReport) {
    let m = &report.final_metrics;
    println!();
    println!("  Campaign stopped.");
    println!("  ID:        {}", report.campaign_id);
    println!("  Duration:  {} day(s)", report.duration_days);
    println!("  Prospects: {}", m.prospects_researched);
    println!("  Qualified: {}", m.leads_qualified);
    println!("  Emails:    {}", m.emails_sent);
    println!("  Responses: {}", m.responses_received);
    println!("  Meetings:  {}", m.meetings_booked);
    println!(
        "  Target:    {:.1}/day ({:.0}% of target)",
        report.daily_average_prospects,
        report.target_achievement * 100.0
    );
    println!("  Grade:     {}", report.grade);
    println!();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
