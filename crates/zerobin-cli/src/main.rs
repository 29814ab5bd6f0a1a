// ============================================================================
// zerobin - command-line client for the ZeroBin marketplace API
// ============================================================================
// Usage:
//   zerobin quests list                          List waste reports
//   zerobin quests complete ID                   Mark an assigned quest completed
//   zerobin report submit --image P --title T    Upload, analyze and file a report
//   zerobin listing create --image P --title T   Same flow for an e-waste listing
//   zerobin notifications list [--unread-only]   Show the notification feed
//   zerobin dashboard                            Admin metrics (sample data on failure)
//   zerobin bids confirm-weight ID --weight KG   Confirm weighed amount at pickup
//   zerobin stats                                Aggregate counts over recent records
// ============================================================================

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;
use zerobin_core::{
    parse_timestamp, AdminDashboard, ApiClient, BidApi, BidBoard, BidStats, ClientConfig,
    CollectorTaskBoard, CompleteQuestRequest, DataSource, EventSink, GeoPoint, ImageHostUploader,
    ImageUploader, ListingApi, ListingQuery, ListingStats, ListingStatus, ListingSubmission,
    MutationError, NotificationFeed, PageRequest, QuestApi, QuestStats, RecordId,
    ReportSubmission, ReviewDecision, SelectedImage, Session, SubmissionBackend, SubmissionFlow,
    SubmitReviewRequest, ToastLevel, UiEvent,
};

/// ZeroBin marketplace client
#[derive(Parser)]
#[command(name = "zerobin", version, about = "Report waste, trade e-waste and manage ZeroBin from the terminal")]
struct Cli {
    /// API base URL (default: $ZEROBIN_API_URL or http://localhost:8000)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token (default: $ZEROBIN_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Print records as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Waste reports and collector tasks
    Quests {
        #[command(subcommand)]
        action: QuestCommands,
    },

    /// File a new waste report
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },

    /// E-waste listings
    Listing {
        #[command(subcommand)]
        action: ListingCommands,
    },

    /// Notification feed
    Notifications {
        #[command(subcommand)]
        action: NotificationCommands,
    },

    /// Collector workload and location
    Collector {
        #[command(subcommand)]
        action: CollectorCommands,
    },

    /// Admin dashboard metrics
    Dashboard,

    /// Admin review queue
    Reviews {
        #[command(subcommand)]
        action: ReviewCommands,
    },

    /// Bids on e-waste listings
    Bids {
        #[command(subcommand)]
        action: BidCommands,
    },

    /// Aggregate counts over recent quests, listings and bids
    Stats,
}

#[derive(Subcommand)]
enum QuestCommands {
    /// List quests
    List {
        #[arg(long, default_value = "0")]
        skip: u64,
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Mark a quest completed
    Complete {
        id: String,
        /// URL of a proof photo (repeatable)
        #[arg(long = "photo")]
        photos: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Upload a photo, run AI analysis and create the report
    Submit {
        #[command(flatten)]
        form: SubmissionArgs,
    },
}

#[derive(Subcommand)]
enum ListingCommands {
    /// Upload a photo, run AI valuation and create the listing
    Create {
        #[command(flatten)]
        form: SubmissionArgs,
    },

    /// Browse listings
    List {
        /// Filter by status: active, pending-pickup, sold, cancelled
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        device_type: Option<String>,
        #[arg(long, default_value = "0")]
        skip: u64,
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Show a single listing
    Show { id: String },

    /// Listings created by the signed-in user
    Mine,
}

#[derive(Subcommand)]
enum NotificationCommands {
    /// Show notifications
    List {
        #[arg(long)]
        unread_only: bool,
    },

    /// Mark a notification read
    Read { id: String },
}

#[derive(Subcommand)]
enum CollectorCommands {
    /// Show capacity metrics
    Workload,

    /// Update current position
    Location {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
}

#[derive(Subcommand)]
enum ReviewCommands {
    /// Show the flagged-report queue
    List,

    /// Record a decision on a quest
    Submit {
        #[arg(long)]
        quest_id: String,
        /// approve, reject or flag
        #[arg(long)]
        decision: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum BidCommands {
    /// Bids placed by or on the signed-in user
    List,

    /// Accept a pending bid
    Accept { id: String },

    /// Confirm the weighed amount at pickup
    ConfirmWeight {
        id: String,
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
    },
}

#[derive(clap::Args)]
struct SubmissionArgs {
    /// Path to the photo
    #[arg(long)]
    image: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,
}

/// Shared handles for every command
struct Ctx {
    client: ApiClient,
    sink: EventSink,
    json: bool,
}

fn parse_decision(s: &str) -> Result<ReviewDecision> {
    match s.to_lowercase().as_str() {
        "approve" | "approved" => Ok(ReviewDecision::Approve),
        "reject" | "rejected" => Ok(ReviewDecision::Reject),
        "flag" | "flagged" => Ok(ReviewDecision::Flag),
        _ => anyhow::bail!("Unknown decision '{}'. Valid values: approve, reject, flag", s),
    }
}

fn parse_listing_status(s: &str) -> Result<ListingStatus> {
    match s.to_lowercase().as_str() {
        "active" => Ok(ListingStatus::Active),
        "pending-pickup" | "pending_pickup" => Ok(ListingStatus::PendingPickup),
        "sold" => Ok(ListingStatus::Sold),
        "cancelled" | "canceled" => Ok(ListingStatus::Cancelled),
        _ => anyhow::bail!(
            "Unknown status '{}'. Valid values: active, pending-pickup, sold, cancelled",
            s
        ),
    }
}

fn format_timestamp(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => parse_timestamp(raw)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| raw.to_string()),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

fn source_label(source: &DataSource) -> String {
    match source {
        DataSource::Live => "live".to_string(),
        DataSource::Fallback { reason } => format!("SAMPLE DATA ({})", reason),
        DataSource::Unavailable { reason } => format!("unavailable ({})", reason),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal outside development
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("zerobin=info".parse()?)
                .add_directive("zerobin_core=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    let session = match cli.token.or_else(|| config.token.clone()) {
        Some(token) => Session::with_token(token),
        None => Session::anonymous(),
    };
    debug!("Using API at {}", config.api_base_url);

    let client = ApiClient::new(config, session)?;
    let (sink, mut events) = EventSink::channel();
    let ctx = Ctx { client, sink, json };

    let result = match cli.command {
        Commands::Quests { action } => match action {
            QuestCommands::List { skip, limit } => cmd_quests_list(&ctx, skip, limit).await,
            QuestCommands::Complete { id, photos, notes } => {
                cmd_quests_complete(&ctx, &id, photos, notes).await
            }
        },
        Commands::Report {
            action: ReportCommands::Submit { form },
        } => cmd_submit(&ctx, ReportSubmission::new(ctx.client.clone()), form).await,
        Commands::Listing { action } => match action {
            ListingCommands::Create { form } => {
                cmd_submit(&ctx, ListingSubmission::new(ctx.client.clone()), form).await
            }
            ListingCommands::List {
                status,
                device_type,
                skip,
                limit,
            } => cmd_listing_list(&ctx, status, device_type, skip, limit).await,
            ListingCommands::Show { id } => cmd_listing_show(&ctx, &id).await,
            ListingCommands::Mine => cmd_listing_mine(&ctx).await,
        },
        Commands::Notifications { action } => match action {
            NotificationCommands::List { unread_only } => {
                cmd_notifications_list(&ctx, unread_only).await
            }
            NotificationCommands::Read { id } => cmd_notifications_read(&ctx, &id).await,
        },
        Commands::Collector { action } => match action {
            CollectorCommands::Workload => cmd_collector_workload(&ctx).await,
            CollectorCommands::Location { lat, lng } => {
                cmd_collector_location(&ctx, lat, lng).await
            }
        },
        Commands::Dashboard => cmd_dashboard(&ctx).await,
        Commands::Reviews { action } => match action {
            ReviewCommands::List => cmd_reviews_list(&ctx).await,
            ReviewCommands::Submit {
                quest_id,
                decision,
                notes,
            } => cmd_reviews_submit(&ctx, &quest_id, &decision, notes).await,
        },
        Commands::Bids { action } => match action {
            BidCommands::List => cmd_bids_list(&ctx).await,
            BidCommands::Accept { id } => cmd_bids_accept(&ctx, &id).await,
            BidCommands::ConfirmWeight { id, weight } => {
                cmd_bids_confirm_weight(&ctx, &id, weight).await
            }
        },
        Commands::Stats => cmd_stats(&ctx).await,
    };

    drop(ctx);
    drain_events(&mut events, json);
    result
}

/// Present everything the views reported while the command ran
fn drain_events(events: &mut UnboundedReceiver<UiEvent>, json: bool) {
    while let Ok(event) = events.try_recv() {
        if json {
            if let Ok(line) = serde_json::to_string(&event) {
                eprintln!("{}", line);
            }
            continue;
        }

        match event {
            UiEvent::Toast { level, message } => {
                let tag = match level {
                    ToastLevel::Success => "ok",
                    ToastLevel::Info => "info",
                    ToastLevel::Error => "error",
                };
                eprintln!("[{}] {}", tag, message);
            }
            UiEvent::Banner { message } => eprintln!("[!] {}", message),
            UiEvent::Modal(modal) => {
                eprintln!("=== {} ===", modal.title);
                for line in &modal.lines {
                    eprintln!("{}", line);
                }
                eprintln!("{}", "=".repeat(modal.title.chars().count() + 8));
            }
            UiEvent::Navigate { route } => eprintln!("-> {}", route),
        }
    }
}

// ============================================================================
// Quests
// ============================================================================

async fn cmd_quests_list(ctx: &Ctx, skip: u64, limit: Option<u64>) -> Result<()> {
    let limit = limit.unwrap_or(ctx.client.config().page_size);
    let page = ctx.client.list_quests(PageRequest::new(skip, limit)).await?;

    if ctx.json {
        return print_json(&page.items);
    }
    if page.items.is_empty() {
        println!("No quests found.");
        return Ok(());
    }

    println!(
        "{:<10}  {:<12}  {:<10}  {:<8}  {:>6}  {:<16}  {}",
        "ID", "STATUS", "TYPE", "SEVERITY", "BOUNTY", "CREATED", "TITLE"
    );
    println!("{}", "-".repeat(96));
    for quest in &page.items {
        println!(
            "{:<10}  {:<12}  {:<10}  {:<8}  {:>6}  {:<16}  {}",
            truncate(quest.id.as_str(), 10),
            quest.status.to_string(),
            quest.waste_type.to_string(),
            quest.severity.to_string(),
            quest.bounty_points,
            format_timestamp(quest.created_at.as_deref()),
            truncate(&quest.title, 30)
        );
    }

    println!("\nShowing {} of {} quests", page.items.len(), page.total);
    Ok(())
}

async fn cmd_quests_complete(
    ctx: &Ctx,
    id: &str,
    photos: Vec<String>,
    notes: Option<String>,
) -> Result<()> {
    let board = CollectorTaskBoard::new(ctx.client.clone(), ctx.sink.clone());
    board.refresh().await?;

    let proof = CompleteQuestRequest {
        photo_urls: photos,
        notes,
    };
    let outcome = board.complete(&RecordId::from(id), proof).await?;

    if ctx.json {
        return print_json(outcome.record());
    }
    println!("Quest {} is now {}", id, outcome.record().status);
    Ok(())
}

// ============================================================================
// Submissions
// ============================================================================

async fn cmd_submit<B>(ctx: &Ctx, backend: B, form: SubmissionArgs) -> Result<()>
where
    B: SubmissionBackend,
    B::Created: Serialize,
{
    let kind = backend.kind();
    let image = SelectedImage::from_path(&form.image).await?;
    let uploader: Arc<dyn ImageUploader> =
        Arc::new(ImageHostUploader::from_config(ctx.client.config()));

    let mut flow = SubmissionFlow::new(backend, uploader, ctx.sink.clone());
    flow.set_title(form.title);
    if let Some(description) = form.description {
        flow.set_description(description);
    }
    flow.set_location(GeoPoint::new(form.lat, form.lng))?;

    flow.select_image(image)?;
    eprintln!("Uploading and analyzing {}...", form.image);
    flow.upload_and_analyze().await?;
    if let Some(analysis) = &flow.state().analysis {
        eprintln!("Analysis: {:?}", analysis);
    }

    let created = flow.submit().await?;
    if ctx.json {
        return print_json(&created);
    }
    println!("Created {} (submission {})", kind, flow.id());
    Ok(())
}

// ============================================================================
// Listings
// ============================================================================

async fn cmd_listing_list(
    ctx: &Ctx,
    status: Option<String>,
    device_type: Option<String>,
    skip: u64,
    limit: Option<u64>,
) -> Result<()> {
    let query = ListingQuery {
        page: PageRequest::new(skip, limit.unwrap_or(ctx.client.config().page_size)),
        status: status.as_deref().map(parse_listing_status).transpose()?,
        device_type,
    };
    let page = ctx.client.list_listings(&query).await?;

    if ctx.json {
        return print_json(&page.items);
    }
    print_listings(&page.items);
    println!("\nShowing {} of {} listings", page.items.len(), page.total);
    Ok(())
}

async fn cmd_listing_show(ctx: &Ctx, id: &str) -> Result<()> {
    let listing = ctx.client.get_listing(&RecordId::from(id)).await?;
    if ctx.json {
        return print_json(&listing);
    }

    println!("=== {} ===", listing.title);
    println!("ID:        {}", listing.id);
    println!("Status:    {:?}", listing.status);
    println!("Device:    {}", listing.device_type);
    if let Some(brand) = &listing.brand {
        println!("Brand:     {}", brand);
    }
    if let Some(condition) = &listing.condition {
        println!("Condition: {}", condition);
    }
    if let Some(price) = listing.predicted_price {
        println!("Predicted: {:.2}", price);
    }
    if let Some(weight) = listing.estimated_weight_kg {
        println!("Weight:    {} kg", weight);
    }
    println!("Bids:      {}", listing.bid_count);
    println!("Created:   {}", format_timestamp(listing.created_at.as_deref()));
    if !listing.description.is_empty() {
        println!("\n{}", listing.description);
    }
    Ok(())
}

async fn cmd_listing_mine(ctx: &Ctx) -> Result<()> {
    let listings = ctx.client.my_listings().await?;
    if ctx.json {
        return print_json(&listings);
    }
    print_listings(&listings);
    Ok(())
}

fn print_listings(listings: &[zerobin_core::Listing]) {
    if listings.is_empty() {
        println!("No listings found.");
        return;
    }

    println!(
        "{:<10}  {:<15}  {:<12}  {:>10}  {:>4}  {}",
        "ID", "STATUS", "DEVICE", "PREDICTED", "BIDS", "TITLE"
    );
    println!("{}", "-".repeat(80));
    for listing in listings {
        println!(
            "{:<10}  {:<15}  {:<12}  {:>10}  {:>4}  {}",
            truncate(listing.id.as_str(), 10),
            format!("{:?}", listing.status),
            truncate(&listing.device_type, 12),
            listing
                .predicted_price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".into()),
            listing.bid_count,
            truncate(&listing.title, 30)
        );
    }
}

// ============================================================================
// Notifications
// ============================================================================

async fn cmd_notifications_list(ctx: &Ctx, unread_only: bool) -> Result<()> {
    let feed = NotificationFeed::new(ctx.client.clone(), ctx.sink.clone());
    let page = PageRequest::first(ctx.client.config().page_size);
    feed.refresh(page, unread_only).await?;

    let items = feed.items().await;
    if ctx.json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("No notifications.");
        return Ok(());
    }

    for (category, group) in feed.by_category().await {
        println!("--- {} ({}) ---", category, group.len());
        for n in group {
            println!(
                "{} {:<10} {:<16} {}",
                if n.is_read { " " } else { "*" },
                truncate(n.id.as_str(), 10),
                format_timestamp(n.created_at.as_deref()),
                n.title
            );
        }
    }
    println!("\n{} unread", feed.unread_count().await);
    Ok(())
}

/// How many notifications `notifications read` looks through for the id
const NOTIFICATION_SCAN_LIMIT: u64 = 100;

async fn cmd_notifications_read(ctx: &Ctx, id: &str) -> Result<()> {
    let feed = NotificationFeed::new(ctx.client.clone(), ctx.sink.clone());
    // Read ones too, so an already-read id reports as such instead of missing
    feed.refresh(PageRequest::first(NOTIFICATION_SCAN_LIMIT), false)
        .await?;

    let outcome = match feed.mark_read(&RecordId::from(id)).await {
        Ok(outcome) => outcome,
        Err(MutationError::NotFound(_)) => {
            anyhow::bail!(
                "Notification {} is not among the latest {} notifications",
                id,
                NOTIFICATION_SCAN_LIMIT
            )
        }
        Err(err) => return Err(err.into()),
    };
    if ctx.json {
        return print_json(outcome.record());
    }
    if !outcome.sent_request() {
        println!("Notification {} is already read", id);
        return Ok(());
    }
    println!(
        "Notification {} marked read ({} unread remaining)",
        id,
        feed.unread_count().await
    );
    Ok(())
}

// ============================================================================
// Collector
// ============================================================================

async fn cmd_collector_workload(ctx: &Ctx) -> Result<()> {
    let board = CollectorTaskBoard::new(ctx.client.clone(), ctx.sink.clone());
    let loaded = board.workload().await;
    let w = &loaded.data;

    if ctx.json {
        return print_json(&serde_json::json!({
            "source": source_label(&loaded.source),
            "workload": w,
        }));
    }

    println!("=== Collector Workload [{}] ===", source_label(&loaded.source));
    println!("Active quests:       {} / {}", w.active_quests, w.max_concurrent);
    println!("Capacity remaining:  {}", w.capacity_remaining);
    println!("Completed last week: {}", w.completed_last_week);
    println!("Status:              {}", w.status);
    println!("Fraud risk score:    {:.2}", w.fraud_risk_score);
    if w.is_at_capacity() {
        println!("\nAt capacity: finish a quest before taking another.");
    }
    Ok(())
}

async fn cmd_collector_location(ctx: &Ctx, lat: f64, lng: f64) -> Result<()> {
    let board = CollectorTaskBoard::new(ctx.client.clone(), ctx.sink.clone());
    board.update_location(GeoPoint::new(lat, lng)).await?;
    Ok(())
}

// ============================================================================
// Admin
// ============================================================================

async fn cmd_dashboard(ctx: &Ctx) -> Result<()> {
    let dashboard = AdminDashboard::new(ctx.client.clone(), ctx.sink.clone());
    let snapshot = dashboard.load().await;

    if ctx.json {
        return print_json(&serde_json::json!({
            "analytics": { "source": source_label(&snapshot.analytics.source), "data": snapshot.analytics.data },
            "heatmap": { "source": source_label(&snapshot.heatmap.source), "data": snapshot.heatmap.data },
            "leaderboard": { "source": source_label(&snapshot.leaderboard.source), "data": snapshot.leaderboard.data },
            "ewaste": { "source": source_label(&snapshot.ewaste.source), "data": snapshot.ewaste.data },
        }));
    }

    let a = &snapshot.analytics.data;
    println!("=== Analytics [{}] ===", source_label(&snapshot.analytics.source));
    println!("Reports:       {}", a.total_reports);
    println!("Active quests: {}", a.active_quests);
    println!("Completed:     {}", a.completed_quests);
    println!("Collectors:    {}", a.total_collectors);
    println!("Bounty paid:   {}", a.total_bounty_points);
    for (waste_type, count) in &a.reports_by_waste_type {
        println!("  {:12} {}", waste_type, count);
    }

    println!(
        "\n=== Heatmap [{}] ===\n{} hotspots",
        source_label(&snapshot.heatmap.source),
        snapshot.heatmap.data.points.len()
    );

    println!("\n=== Leaderboard [{}] ===", source_label(&snapshot.leaderboard.source));
    for entry in &snapshot.leaderboard.data.entries {
        println!(
            "{:>3}. {:<24} {:>7} pts  {:>4} quests",
            entry.rank,
            truncate(&entry.name, 24),
            entry.bounty_points,
            entry.quests_completed
        );
    }

    let e = &snapshot.ewaste.data;
    println!("\n=== E-waste [{}] ===", source_label(&snapshot.ewaste.source));
    println!("Listings: {} ({} active)", e.total_listings, e.active_listings);
    println!("Bids:     {} ({} accepted)", e.total_bids, e.accepted_bids);
    println!("Value:    {:.2}", e.total_value);
    Ok(())
}

async fn cmd_reviews_list(ctx: &Ctx) -> Result<()> {
    let dashboard = AdminDashboard::new(ctx.client.clone(), ctx.sink.clone());
    dashboard
        .refresh_reviews(PageRequest::first(ctx.client.config().page_size))
        .await;
    let state = dashboard.reviews().await;

    if ctx.json {
        return print_json(&state.items);
    }
    if state.items.is_empty() {
        println!("Review queue is empty [{}]", source_label(&state.source));
        return Ok(());
    }

    println!("{:<10}  {:<10}  {:<8}  {:>6}  {}", "ID", "QUEST", "DECISION", "FRAUD", "NOTES");
    println!("{}", "-".repeat(70));
    for review in &state.items {
        println!(
            "{:<10}  {:<10}  {:<8}  {:>6}  {}",
            truncate(review.id.as_str(), 10),
            truncate(review.quest_id.as_str(), 10),
            format!("{:?}", review.decision),
            review
                .fraud_score
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "-".into()),
            review.notes.as_deref().unwrap_or("-")
        );
    }
    println!(
        "\n{} of {} shown, {} pending",
        state.items.len(),
        state.total,
        dashboard.pending_reviews().await
    );
    Ok(())
}

async fn cmd_reviews_submit(
    ctx: &Ctx,
    quest_id: &str,
    decision: &str,
    notes: Option<String>,
) -> Result<()> {
    let request = SubmitReviewRequest {
        quest_id: RecordId::from(quest_id),
        decision: parse_decision(decision)?,
        notes,
    };
    let dashboard = AdminDashboard::new(ctx.client.clone(), ctx.sink.clone());
    let review = dashboard.submit_review(&request).await?;

    if ctx.json {
        return print_json(&review);
    }
    println!("Review {} recorded for quest {}", review.id, review.quest_id);
    Ok(())
}

// ============================================================================
// Bids
// ============================================================================

async fn cmd_bids_list(ctx: &Ctx) -> Result<()> {
    let bids = ctx.client.my_bids().await?;
    if ctx.json {
        return print_json(&bids);
    }
    if bids.is_empty() {
        println!("No bids found.");
        return Ok(());
    }

    println!(
        "{:<10}  {:<10}  {:<9}  {:>10}  {}",
        "ID", "LISTING", "STATUS", "OFFER", "PICKUP"
    );
    println!("{}", "-".repeat(64));
    for bid in &bids {
        println!(
            "{:<10}  {:<10}  {:<9}  {:>10.2}  {}",
            truncate(bid.id.as_str(), 10),
            truncate(bid.listing_id.as_str(), 10),
            format!("{:?}", bid.status),
            bid.offered_price,
            bid.pickup_time_estimate.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn cmd_bids_accept(ctx: &Ctx, id: &str) -> Result<()> {
    let board = BidBoard::new(ctx.client.clone(), ctx.sink.clone());
    board.refresh().await?;
    let outcome = board.accept(&RecordId::from(id)).await?;

    if ctx.json {
        return print_json(outcome.record());
    }
    println!("Bid {} is {:?}", id, outcome.record().status);
    Ok(())
}

async fn cmd_bids_confirm_weight(ctx: &Ctx, id: &str, weight: f64) -> Result<()> {
    let board = BidBoard::new(ctx.client.clone(), ctx.sink.clone());
    let bid = board.confirm_weight(&RecordId::from(id), weight).await?;

    if ctx.json {
        return print_json(&bid);
    }
    println!("Confirmed {} kg for bid {}", weight, bid.id);
    Ok(())
}

// ============================================================================
// Stats
// ============================================================================

async fn cmd_stats(ctx: &Ctx) -> Result<()> {
    let page = PageRequest::first(100);
    let quests = ctx.client.list_quests(page).await?;
    let listings = ctx
        .client
        .list_listings(&ListingQuery {
            page,
            status: None,
            device_type: None,
        })
        .await?;
    let bids = if ctx.client.session().is_authenticated() {
        Some(BidStats::from_bids(&ctx.client.my_bids().await?))
    } else {
        None
    };

    let quest_stats = QuestStats::from_quests(&quests.items);
    let listing_stats = ListingStats::from_listings(&listings.items);

    if ctx.json {
        return print_json(&serde_json::json!({
            "quests": quest_stats,
            "listings": listing_stats,
            "bids": bids,
        }));
    }

    println!("=== ZeroBin Stats (most recent {}) ===", page.limit);
    println!();
    println!("Quests:   {} total, {} open", quest_stats.total, quest_stats.open);
    for (status, count) in &quest_stats.by_status {
        println!("  {:12} {}", status, count);
    }
    println!(
        "  completion {:.0}%, bounty {} / {} earned",
        quest_stats.completion_rate() * 100.0,
        quest_stats.bounty_earned,
        quest_stats.bounty_total
    );

    println!(
        "Listings: {} total, {} active, {} sold",
        listing_stats.total, listing_stats.active, listing_stats.sold
    );
    for (device, count) in &listing_stats.by_device_type {
        println!("  {:12} {}", device, count);
    }
    println!("  predicted value {:.2}", listing_stats.predicted_value);

    if let Some(bids) = bids {
        println!(
            "Bids:     {} total, {} pending, {} accepted",
            bids.total, bids.pending, bids.accepted
        );
        if let (Some(high), Some(avg)) = (bids.highest_offer, bids.average_offer) {
            println!("  highest {:.2}, average {:.2}", high, avg);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use tiny_http::{Header, Response, Server};

    /// Answer a single request with `body`, sending its URL back
    fn serve_once(body: &'static str) -> (String, mpsc::Receiver<String>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if let Ok(request) = server.recv() {
                let _ = tx.send(request.url().to_string());
                let header =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let _ = request.respond(Response::from_string(body).with_header(header));
            }
        });
        (format!("http://{}", addr), rx)
    }

    fn ctx(base: String) -> Ctx {
        let config = ClientConfig {
            api_base_url: base,
            ..Default::default()
        };
        let client = ApiClient::new(config, Session::with_token("tok")).unwrap();
        let (sink, _events) = EventSink::channel();
        Ctx {
            client,
            sink,
            json: false,
        }
    }

    #[tokio::test]
    async fn test_read_of_already_read_notification_sends_nothing() {
        let (base, urls) = serve_once(
            r#"{"items":[{"id":7,"type":"bid_received","title":"New bid","is_read":true}],"total":1,"unread_count":0}"#,
        );

        // Only one reply is served, so a mark-read request would fail the command
        cmd_notifications_read(&ctx(base), "7").await.unwrap();
        assert_eq!(
            urls.recv().unwrap(),
            "/notifications?skip=0&limit=100&unread_only=false"
        );
    }

    #[tokio::test]
    async fn test_read_of_unknown_notification_names_the_scan_limit() {
        let (base, _urls) = serve_once(r#"{"items":[],"total":0,"unread_count":0}"#);

        let err = cmd_notifications_read(&ctx(base), "42").await.unwrap_err();
        assert!(err.to_string().contains("not among the latest 100"));
    }

    #[test]
    fn test_parse_decision() {
        assert!(matches!(parse_decision("Approved").unwrap(), ReviewDecision::Approve));
        assert!(parse_decision("maybe").is_err());
    }
}
