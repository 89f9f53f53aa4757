// ============================================================================
// agrichain - Command-line shell for the AgriChain supply-chain backend
// ============================================================================
// Usage:
//   agrichain login <EMAIL|USERNAME> --password PASS   Sign in and store tokens
//   agrichain whoami                                  Show the current session
//   agrichain open /distributor/inventory             Run the route guard
//   agrichain batches list [--view inventory]         List batches
//   agrichain batches split 12 --part A:60:7 --part B:40:9
//   agrichain transport list --leg in-transit         Transporter shipments
//   agrichain inspect submit 12 --result warning      File an inspection
//   agrichain trace PB-2024-0001                      Public batch trace
//
// Every role-scoped command runs the same guard the web client uses before
// it touches the backend.
// ============================================================================

use anyhow::{anyhow, bail, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use agri_core::access::{menu_for, GuardDecision, RouteGuard};
use agri_core::api::{ProfileUpdate, StakeholderQuery, UserUpdate};
use agri_core::auth::landing_path;
use agri_core::forms::{
    format_rupees, listable_batches, per_unit_amount, sold_quantity, BatchDraft, InspectionDraft,
    ListingDraft, RegistrationDraft, SplitDraft, SplitPolicy, SplitRow,
};
use agri_core::timeline::{format_timestamp, InspectionTimeline};
use agri_core::views::{
    active_listings, batch_actions, can_suspend, distributor_incoming, distributor_outgoing, inventory,
    retailer_received, shipments, sold_listings, transport_actions, IncomingItem, ShipmentLeg,
};
use agri_core::{
    ApiClient, ApiError, AuthService, Batch, ClientConfig, InspectionRecord, InspectionResult, KycStatus, Navigator,
    RedbTokenStore, ReqwestTransport, Role, Session, SessionStore, TransportRequest, TransportStatus,
};

/// AgriChain supply-chain client
#[derive(Parser)]
#[command(name = "agrichain", version, about = "Role-gated client for the AgriChain traceability backend")]
struct Cli {
    /// API base URL (default: $AGRI_API_URL or http://localhost:8000/api)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Token store file (default: $AGRI_STATE_PATH or ~/.agrichain/session.redb)
    #[arg(long, global = true)]
    state_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email or username
    Login {
        identifier: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out and forget stored tokens
    Logout,

    /// Create a stakeholder account (KYC review follows)
    Register {
        /// farmer, distributor, transporter, retailer, or consumer
        role: Role,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to --password
        #[arg(long)]
        confirm_password: Option<String>,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        organization: String,
        #[arg(long, default_value = "")]
        address: String,
    },

    /// Show the signed-in user
    Whoami,

    /// Show or update your profile
    Profile {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        organization: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// Resolve a client path through the route guard
    Open { path: String },

    /// Show the sidebar menu for your role
    Menu,

    /// Crop batch operations
    #[command(subcommand)]
    Batches(BatchCommand),

    /// Transport requests
    #[command(subcommand)]
    Transport(TransportCommand),

    /// Inspection reports
    #[command(subcommand)]
    Inspect(InspectCommand),

    /// Retail listings
    #[command(subcommand)]
    Listings(ListingCommand),

    /// KYC review (admin)
    #[command(subcommand)]
    Kyc(KycCommand),

    /// User management (admin)
    #[command(subcommand)]
    Users(UserCommand),

    /// Platform counters (admin)
    Stats,

    /// Public trace of a batch by its public id
    Trace { public_id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum BatchView {
    All,
    /// Distributor: stored and split batches
    Inventory,
    /// Retailer: delivered, not yet listed
    Received,
}

#[derive(Subcommand)]
enum BatchCommand {
    /// List batches visible to you
    List {
        #[arg(long, value_enum, default_value = "all")]
        view: BatchView,
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Batch details, inspection timeline, and available actions
    Show { id: i64 },

    /// Register a harvested batch (farmer)
    Create {
        #[arg(long)]
        crop_type: String,
        /// Quantity in kg
        #[arg(long)]
        quantity: String,
        /// YYYY-MM-DD
        #[arg(long)]
        harvest_date: String,
        #[arg(long)]
        farm_location: String,
        /// Base price per kg
        #[arg(long, default_value = "")]
        base_price: String,
    },

    /// Split a stored batch (distributor)
    Split {
        id: i64,
        /// LABEL:QUANTITY[:RETAILER_ID], repeatable
        #[arg(long = "part", value_parser = parse_split_row, required = true)]
        parts: Vec<SplitRow>,
        /// Parts must add up to the whole batch
        #[arg(long)]
        exact: bool,
    },

    /// Suspend a batch you hold
    Suspend { id: i64 },

    /// Store a delivered batch with a margin per kg (distributor)
    Store {
        id: i64,
        #[arg(long, default_value = "")]
        margin: String,
    },

    /// Ask for pickup to a distributor (farmer)
    RequestTransport {
        id: i64,
        #[arg(long)]
        distributor: i64,
    },

    /// Ask for transport to a retailer (distributor)
    SendToRetailer {
        id: i64,
        #[arg(long)]
        retailer: i64,
    },

    /// Record a sale; omit --quantity to sell everything left (retailer)
    MarkSold {
        id: i64,
        #[arg(long)]
        quantity: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LegArg {
    All,
    Farmer,
    Distributor,
    InTransit,
    Completed,
    /// Distributor: shipments on their way to you
    Incoming,
    /// Distributor: shipments you sent onward
    Outgoing,
}

#[derive(Subcommand)]
enum TransportCommand {
    /// List transport requests
    List {
        #[arg(long, value_enum, default_value = "all")]
        leg: LegArg,
        /// Only this status (e.g. PENDING)
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Accept a pickup with a fee per kg (transporter)
    Accept {
        id: i64,
        #[arg(long, default_value = "")]
        fee: String,
    },

    /// Mark a shipment arrived (transporter)
    Arrive { id: i64 },

    /// Confirm a shipment arrived (receiver)
    ConfirmArrival { id: i64 },

    /// Mark a shipment delivered (transporter)
    Deliver { id: i64 },

    /// Decline a pickup (transporter)
    Reject { id: i64 },
}

#[derive(Subcommand)]
enum InspectCommand {
    /// Inspection history of a batch
    Timeline {
        batch: i64,
        /// Show notes for one record
        #[arg(long)]
        expand: Option<i64>,
    },

    /// File your stage's inspection
    Submit {
        batch: i64,
        #[arg(long, default_value = "pass")]
        result: InspectionResult,
        #[arg(long, default_value = "")]
        notes: String,
        /// Report document or photo
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ListingCommand {
    /// Your listings
    List {
        /// Show sold listings instead of active ones
        #[arg(long)]
        sold: bool,
        #[arg(long, default_value = "")]
        search: String,
    },

    /// List a delivered batch for sale (retailer)
    Create {
        batch: i64,
        #[arg(long, default_value = "")]
        farmer_base_price: String,
        #[arg(long, default_value = "")]
        transport_fees: String,
        #[arg(long, default_value = "")]
        distributor_margin: String,
        #[arg(long, default_value = "")]
        retailer_margin: String,
    },
}

#[derive(Subcommand)]
enum KycCommand {
    /// Requests awaiting review
    Pending,

    /// All KYC records
    All {
        /// pending, approved, or rejected
        #[arg(long)]
        status: Option<KycStatus>,
    },

    /// Approve or reject a request
    Decide {
        id: i64,
        /// approved or rejected
        decision: KycStatus,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// All users, optionally by role
    List {
        #[arg(long)]
        role: Option<Role>,
    },

    /// One user's account and profile
    Show { id: i64 },

    /// Enable or disable an account
    SetActive {
        id: i64,
        #[arg(action = ArgAction::Set)]
        active: bool,
    },
}

/// `LABEL:QUANTITY[:RETAILER_ID]`
fn parse_split_row(raw: &str) -> Result<SplitRow, String> {
    let mut parts = raw.splitn(3, ':');
    let label = parts.next().unwrap_or_default();
    let quantity = parts
        .next()
        .ok_or_else(|| format!("expected LABEL:QUANTITY[:RETAILER_ID], got '{}'", raw))?;

    let row = SplitRow::new(label, quantity);
    match parts.next() {
        Some(retailer) => {
            let id = retailer
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid retailer id '{}'", retailer))?;
            Ok(row.to_retailer(id))
        }
        None => Ok(row),
    }
}

fn parse_transport_status(raw: &str) -> Result<TransportStatus> {
    let status = TransportStatus::from(raw.trim().to_uppercase());
    if let TransportStatus::Unknown(other) = &status {
        bail!(
            "Unknown status '{}'. Valid values: PENDING, ACCEPTED, IN_TRANSIT, IN_TRANSIT_TO_RETAILER, ARRIVED, ARRIVAL_CONFIRMED, DELIVERED, REJECTED",
            other
        );
    }
    Ok(status)
}

// ============================================================================
// Application Setup
// ============================================================================

/// Prints redirects instead of following them
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, path: &str) {
        println!("-> {}", path);
    }
}

struct App {
    client: ApiClient,
    auth: AuthService,
    guard: RouteGuard,
}

impl App {
    async fn connect(cli: &Cli) -> Result<Self> {
        let config = ClientConfig::from_env()?.with_overrides(cli.api_url.as_deref(), cli.state_path.as_deref())?;
        let state_path = config.resolve_state_path()?;
        debug!("API {} / state {}", config.api_base_url, state_path.display());

        let tokens = Arc::new(RedbTokenStore::open(&state_path)?);
        let transport = Arc::new(ReqwestTransport::new(config));
        let session = SessionStore::new();
        let navigator: Arc<dyn Navigator> = Arc::new(ConsoleNavigator);

        let client = ApiClient::new(transport, tokens, session.clone(), navigator.clone());
        let auth = AuthService::new(client.clone());
        let guard = RouteGuard::new(session, navigator);

        auth.bootstrap().await;
        Ok(Self { client, auth, guard })
    }

    /// Guard a path; the navigator has already printed any redirect
    async fn require(&self, path: &str) -> Result<Session> {
        self.guard
            .enforce(path)
            .await
            .ok_or_else(|| anyhow!("Access to {} denied", path))?;
        self.client
            .session()
            .current()
            .await
            .ok_or_else(|| anyhow!("Not signed in. Run `agrichain login` first."))
    }

    /// Any signed-in role
    async fn require_session(&self) -> Result<Session> {
        self.require("/profile").await
    }

    /// Public routes render without a session
    async fn require_public(&self, path: &str) -> Result<()> {
        self.guard
            .enforce(path)
            .await
            .map(|_| ())
            .ok_or_else(|| anyhow!("No page at {}", path))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("agrichain=info,agri_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::connect(&cli).await?;

    match cli.command {
        Commands::Login { identifier, password } => cmd_login(&app, &identifier, &password).await,
        Commands::Logout => {
            app.auth.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Commands::Register {
            role,
            username,
            email,
            password,
            confirm_password,
            phone,
            organization,
            address,
        } => {
            let mut draft = RegistrationDraft::new(role);
            draft.username = username;
            draft.email = email;
            draft.confirm_password = confirm_password.unwrap_or_else(|| password.clone());
            draft.password = password;
            draft.phone = phone;
            draft.organization = organization;
            draft.address = address;

            let message = app.auth.register(&draft).await?;
            println!("{}", message);
            Ok(())
        }
        Commands::Whoami => cmd_whoami(&app).await,
        Commands::Profile {
            email,
            phone,
            organization,
            address,
        } => {
            let update = ProfileUpdate {
                email,
                phone,
                organization,
                address,
            };
            cmd_profile(&app, update).await
        }
        Commands::Open { path } => cmd_open(&app, &path).await,
        Commands::Menu => {
            let session = app.require_session().await?;
            for item in menu_for(Some(session.role)) {
                println!("{:<38}  {}", item.path, item.label);
            }
            Ok(())
        }
        Commands::Batches(command) => cmd_batches(&app, command).await,
        Commands::Transport(command) => cmd_transport(&app, command).await,
        Commands::Inspect(command) => cmd_inspect(&app, command).await,
        Commands::Listings(command) => cmd_listings(&app, command).await,
        Commands::Kyc(command) => cmd_kyc(&app, command).await,
        Commands::Users(command) => cmd_users(&app, command).await,
        Commands::Stats => cmd_stats(&app).await,
        Commands::Trace { public_id } => cmd_trace(&app, &public_id).await,
    }
}

// ============================================================================
// Session Commands
// ============================================================================

async fn cmd_login(app: &App, identifier: &str, password: &str) -> Result<()> {
    app.auth.login(identifier, password).await?;
    let session = app
        .client
        .session()
        .current()
        .await
        .ok_or_else(|| anyhow!("Login did not produce a session"))?;

    println!("Signed in as {} ({})", session.user.username, session.role.display_name());
    let landing = landing_path(session.role, session.kyc_status);
    if landing != session.role.dashboard_path() {
        println!("KYC is {}: see {}", kyc_label(session.kyc_status), landing);
    }
    Ok(())
}

async fn cmd_whoami(app: &App) -> Result<()> {
    match app.client.session().current().await {
        Some(session) => {
            println!("User:  {} <{}>", session.user.username, session.user.email);
            println!("Role:  {}", session.role.display_name());
            println!("KYC:   {}", kyc_label(session.kyc_status));
            println!("Home:  {}", session.role.dashboard_path());
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

async fn cmd_profile(app: &App, update: ProfileUpdate) -> Result<()> {
    app.require_session().await?;

    let has_changes =
        update.email.is_some() || update.phone.is_some() || update.organization.is_some() || update.address.is_some();
    if has_changes {
        let response = app.client.update_me(&update).await?;
        println!("{}", message_or(&response.message, "Profile updated."));
        app.auth.refresh_user().await;
    }

    let me = app.client.me().await?;
    println!("Username: {}", me.user.username);
    println!("Email:    {}", me.user.email);
    println!("Role:     {}", me.role.display_name());
    println!("KYC:      {}", kyc_label(me.kyc_status));
    Ok(())
}

async fn cmd_open(app: &App, path: &str) -> Result<()> {
    match app.guard.check(path).await {
        GuardDecision::Render(matched) => {
            println!("Render {:?} at {}", matched.view(), matched.path);
            for (name, value) in &matched.params {
                println!("  {} = {}", name, value);
            }
        }
        GuardDecision::Redirect(target) => println!("Redirect -> {}", target),
        GuardDecision::Pending => println!("Session still loading"),
    }
    Ok(())
}

fn kyc_label(status: Option<KycStatus>) -> &'static str {
    status.map_or("-", |s| s.as_str())
}

// ============================================================================
// Batches
// ============================================================================

fn print_batches(batches: &[&Batch]) {
    if batches.is_empty() {
        println!("No batches found.");
        return;
    }

    println!(
        "{:<6}  {:<16}  {:<14}  {:>10}  {:<32}  {}",
        "ID", "BATCH", "CROP", "QTY (kg)", "STATUS", "CREATED"
    );
    println!("{}", "-".repeat(110));
    for batch in batches {
        let id = if batch.is_child_batch {
            format!("└ {}", batch.id)
        } else {
            batch.id.to_string()
        };
        println!(
            "{:<6}  {:<16}  {:<14}  {:>10.2}  {:<32}  {}",
            id,
            batch.product_batch_id,
            batch.crop_type,
            batch.quantity,
            batch.status.label(),
            format_timestamp(batch.created_at)
        );
    }
    println!("\nTotal: {} batches", batches.len());
}

async fn cmd_batches(app: &App, command: BatchCommand) -> Result<()> {
    match command {
        BatchCommand::List { view, search } => {
            let batches = match view {
                BatchView::All => {
                    app.require_session().await?;
                    app.client.batches().await?
                }
                BatchView::Inventory => {
                    app.require("/distributor/inventory").await?;
                    app.client.batches().await?
                }
                BatchView::Received => {
                    app.require("/retailer/received").await?;
                    app.client.batches().await?
                }
            };

            let shown: Vec<&Batch> = match view {
                BatchView::All => {
                    let term = search.trim().to_lowercase();
                    batches
                        .iter()
                        .filter(|b| {
                            term.is_empty()
                                || b.product_batch_id.to_lowercase().contains(&term)
                                || b.crop_type.to_lowercase().contains(&term)
                        })
                        .collect()
                }
                BatchView::Inventory => inventory(&batches, &search),
                BatchView::Received => retailer_received(&batches, &search),
            };
            print_batches(&shown);
            Ok(())
        }

        BatchCommand::Show { id } => {
            let session = app.require_session().await?;
            let batch = app.client.batch(id).await?;
            let timeline = loaded_timeline(id, app.client.inspection_timeline(id).await);

            println!("{} ({})", batch.product_batch_id, batch.crop_type);
            println!("  Status:     {}", batch.status.label());
            println!("  Quantity:   {:.2} kg", batch.quantity);
            println!("  Trace id:   {}", batch.trace_id());
            if let Some(date) = batch.harvest_date {
                println!("  Harvested:  {}", date);
            }
            if let Some(location) = &batch.farm_location {
                println!("  Farm:       {}", location);
            }
            if let Some(price) = batch.farmer_base_price_per_unit {
                println!("  Base price: {}/kg", format_rupees(price));
            }
            if let Some(timeline) = &timeline {
                println!("  Inspections: {}", timeline.len());
            }

            let actions = batch_actions(session.role, &batch.status, timeline.as_ref());
            if actions.is_empty() {
                println!("  Actions:    none");
            } else {
                let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
                println!("  Actions:    {}", labels.join(", "));
            }
            Ok(())
        }

        BatchCommand::Create {
            crop_type,
            quantity,
            harvest_date,
            farm_location,
            base_price,
        } => {
            app.require("/farmer/batches").await?;
            let draft = BatchDraft {
                crop_type,
                quantity,
                harvest_date,
                farm_location,
                farmer_base_price_per_unit: base_price,
            };
            let request = draft.validate()?;
            let batch = app.client.create_batch(&request).await?;
            println!("Created batch {} (id {})", batch.product_batch_id, batch.id);
            Ok(())
        }

        BatchCommand::Split { id, parts, exact } => {
            app.require("/distributor/inventory").await?;
            let parent = app.client.batch(id).await?;
            let policy = if exact { SplitPolicy::ExactMatch } else { SplitPolicy::AtMost };

            let draft = SplitDraft::new(&parent, policy).with_rows(parts);
            let request = draft.validate()?;
            info!("Split total {} of {} kg", draft.total(), parent.quantity);

            let response = app.client.bulk_split(id, &request).await?;
            println!("{}", message_or(&response.message, "Batch split."));
            Ok(())
        }

        BatchCommand::Suspend { id } => {
            let session = app.require_session().await?;
            let batch = app.client.batch(id).await?;
            if !can_suspend(session.role, &batch.status) {
                bail!(
                    "A {} cannot suspend a batch in status {}",
                    session.role.display_name(),
                    batch.status.label()
                );
            }
            let response = app.client.suspend_batch(id).await?;
            println!("{}", message_or(&response.message, "Batch suspended."));
            Ok(())
        }

        BatchCommand::Store { id, margin } => {
            app.require("/distributor/incoming").await?;
            let margin = per_unit_amount(&margin, "Distributor margin")?;
            let response = app.client.store_batch(id, margin).await?;
            println!("{}", message_or(&response.message, "Batch stored."));
            Ok(())
        }

        BatchCommand::RequestTransport { id, distributor } => {
            app.require("/farmer/batches").await?;
            let response = app.client.request_transport(id, distributor).await?;
            println!("{}", message_or(&response.message, "Transport requested."));
            Ok(())
        }

        BatchCommand::SendToRetailer { id, retailer } => {
            app.require("/distributor/outgoing").await?;
            let retailers = app.client.stakeholders(StakeholderQuery::approved(Role::Retailer)).await?;
            if !retailers.iter().any(|r| r.id == retailer) {
                bail!("Retailer {} is not an approved retailer", retailer);
            }
            let response = app.client.request_transport_to_retailer(id, retailer).await?;
            println!("{}", message_or(&response.message, "Transport to retailer requested."));
            Ok(())
        }

        BatchCommand::MarkSold { id, quantity } => {
            app.require("/retailer/listed").await?;
            let sold = match quantity {
                Some(raw) => {
                    let batch = app.client.batch(id).await?;
                    Some(sold_quantity(&raw, batch.quantity)?)
                }
                None => None,
            };
            let response = app.client.mark_sold(id, sold).await?;
            println!("{}", message_or(&response.message, "Batch marked sold."));
            Ok(())
        }
    }
}

/// Timeline for action gating; a failed fetch is logged and yields `None`
fn loaded_timeline(batch: i64, records: Result<Vec<InspectionRecord>, ApiError>) -> Option<InspectionTimeline> {
    match records {
        Ok(records) => Some(InspectionTimeline::from_records(records)),
        Err(e) => {
            warn!("Could not load inspections for batch {}: {}", batch, e);
            None
        }
    }
}

fn message_or<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() {
        fallback
    } else {
        message
    }
}

// ============================================================================
// Transport
// ============================================================================

fn print_requests(role: Role, requests: &[&TransportRequest]) {
    if requests.is_empty() {
        println!("No shipments found.");
        return;
    }

    println!(
        "{:<6}  {:<16}  {:<18}  {:<18}  {:<24}  {}",
        "ID", "BATCH", "FROM", "TO", "STATUS", "ACTIONS"
    );
    println!("{}", "-".repeat(110));
    for request in requests {
        let batch_id = request
            .batch_details
            .as_ref()
            .map_or_else(|| request.batch.to_string(), |b| b.product_batch_id.clone());
        let org = |p: &Option<agri_core::StakeholderProfile>| p.as_ref().map_or("-", |p| p.display_name()).to_string();
        let actions: Vec<&str> = transport_actions(role, request).iter().map(|a| a.label()).collect();
        println!(
            "{:<6}  {:<16}  {:<18}  {:<18}  {:<24}  {}",
            request.id,
            batch_id,
            org(&request.from_party_details),
            org(&request.to_party_details),
            request.status.label(),
            actions.join(", ")
        );
    }
    println!("\nTotal: {} shipments", requests.len());
}

async fn cmd_transport(app: &App, command: TransportCommand) -> Result<()> {
    match command {
        TransportCommand::List { leg, status, search } => {
            let status = status.as_deref().map(parse_transport_status).transpose()?;

            match leg {
                LegArg::Incoming => {
                    let session = app.require("/distributor/incoming").await?;
                    let requests = app.client.transport_requests().await?;
                    let batches = app.client.batches().await?;
                    for item in distributor_incoming(&requests, &batches, &search) {
                        let kind = match item {
                            IncomingItem::Transport(request) => {
                                let actions: Vec<&str> =
                                    transport_actions(session.role, request).iter().map(|a| a.label()).collect();
                                format!("shipment  {}", actions.join(", "))
                            }
                            IncomingItem::Batch(batch) => {
                                let actions: Vec<&str> = batch_actions(session.role, &batch.status, None)
                                    .iter()
                                    .map(|a| a.label())
                                    .collect();
                                format!("batch     {}", actions.join(", "))
                            }
                        };
                        println!(
                            "{:<6}  {:<16}  {:<14}  {:<32}  {}",
                            item.id(),
                            item.product_batch_id(),
                            item.crop_type(),
                            item.status_label(),
                            kind
                        );
                    }
                    Ok(())
                }
                LegArg::Outgoing => {
                    let session = app.require("/distributor/outgoing").await?;
                    let requests = app.client.transport_requests().await?;
                    print_requests(session.role, &distributor_outgoing(&requests, &search));
                    Ok(())
                }
                _ => {
                    let (path, leg) = match leg {
                        LegArg::Farmer => ("/transporter/farmer-shipments", ShipmentLeg::FromFarmers),
                        LegArg::Distributor => ("/transporter/distributor-shipments", ShipmentLeg::FromDistributors),
                        LegArg::InTransit => ("/transporter/in-transit", ShipmentLeg::InTransit),
                        LegArg::Completed => ("/transporter/completed", ShipmentLeg::Completed),
                        _ => ("/transporter/dashboard", ShipmentLeg::All),
                    };
                    let session = app.require(path).await?;
                    let requests = app.client.transport_requests().await?;
                    println!("=== {} ===", leg.title());
                    print_requests(session.role, &shipments(&requests, leg, status.as_ref(), &search));
                    Ok(())
                }
            }
        }

        TransportCommand::Accept { id, fee } => {
            app.require("/transporter/farmer-shipments").await?;
            let fee = per_unit_amount(&fee, "Transporter fee")?;
            let response = app.client.accept_transport(id, fee).await?;
            println!("{}", message_or(&response.message, "Shipment accepted."));
            Ok(())
        }
        TransportCommand::Arrive { id } => {
            app.require("/transporter/in-transit").await?;
            let response = app.client.arrive_transport(id).await?;
            println!("{}", message_or(&response.message, "Shipment marked arrived."));
            Ok(())
        }
        TransportCommand::ConfirmArrival { id } => {
            let session = app.require_session().await?;
            let request = app.client.transport_request(id).await?;
            if !transport_actions(session.role, &request).contains(&agri_core::views::TransportAction::ConfirmArrival) {
                bail!("Shipment {} is {} and cannot be confirmed by you", id, request.status.label());
            }
            let response = app.client.confirm_arrival(id).await?;
            println!("{}", message_or(&response.message, "Arrival confirmed."));
            Ok(())
        }
        TransportCommand::Deliver { id } => {
            app.require("/transporter/in-transit").await?;
            let response = app.client.deliver_transport(id).await?;
            println!("{}", message_or(&response.message, "Shipment delivered."));
            Ok(())
        }
        TransportCommand::Reject { id } => {
            app.require("/transporter/farmer-shipments").await?;
            let response = app.client.reject_transport(id).await?;
            println!("{}", message_or(&response.message, "Shipment rejected."));
            Ok(())
        }
    }
}

// ============================================================================
// Inspections
// ============================================================================

async fn cmd_inspect(app: &App, command: InspectCommand) -> Result<()> {
    match command {
        InspectCommand::Timeline { batch, expand } => {
            let session = app.require_session().await?;
            let mut timeline = InspectionTimeline::from_records(app.client.inspection_timeline(batch).await?);
            if let Some(id) = expand {
                timeline.toggle(id);
            }

            if timeline.is_empty() {
                println!("No inspections recorded for batch {}.", batch);
            }
            for group in timeline.groups() {
                println!("== {} ==", group.stage.label());
                for record in &group.records {
                    println!(
                        "  #{:<5} {:<8} {:<24} {}",
                        record.id,
                        record.result.label(),
                        format_timestamp(record.timestamp()),
                        record.created_by_username.as_deref().unwrap_or("-")
                    );
                    if timeline.is_expanded(record.id) {
                        println!("         {}", message_or(&record.inspection_notes, "(no notes)"));
                        if let Some(file) = &record.report_file {
                            println!("         report: {}", file);
                        }
                    }
                }
            }

            if let Some(stage) = session.role.inspection_stage() {
                if timeline.already_inspected(stage) {
                    println!("\n{} inspection already filed.", stage.label());
                }
            }
            Ok(())
        }

        InspectCommand::Submit {
            batch,
            result,
            notes,
            report,
        } => {
            let session = app.require_session().await?;
            if session.role == Role::Distributor {
                app.require(&format!("/distributor/inspection/{}", batch)).await?;
            }

            let timeline = InspectionTimeline::from_records(app.client.inspection_timeline(batch).await?);
            if !timeline.can_inspect(session.role) {
                bail!("Batch {} already has a {} inspection", batch, session.role.display_name());
            }

            let mut draft = InspectionDraft::for_role(batch, session.role)?;
            draft.result = result;
            draft.notes = notes;
            draft.report_file = report;

            let record = app.client.create_inspection(&draft).await?;
            println!("{} filed (#{}): {}", draft.title(), record.id, record.result.label());
            Ok(())
        }
    }
}

// ============================================================================
// Listings
// ============================================================================

async fn cmd_listings(app: &App, command: ListingCommand) -> Result<()> {
    match command {
        ListingCommand::List { sold, search } => {
            app.require(if sold { "/retailer/sold" } else { "/retailer/listed" }).await?;
            let listings = app.client.listings().await?;
            let shown = if sold {
                sold_listings(&listings, &search)
            } else {
                active_listings(&listings, &search)
            };

            if shown.is_empty() {
                println!("No listings found.");
                return Ok(());
            }
            println!("{:<6}  {:<16}  {:<14}  {:>12}  {:>14}", "ID", "BATCH", "CROP", "REMAINING", "PRICE/kg");
            println!("{}", "-".repeat(72));
            for listing in shown {
                let (batch_id, crop) = listing
                    .batch_details
                    .as_ref()
                    .map_or(("-", "-"), |b| (b.product_batch_id.as_str(), b.crop_type.as_str()));
                println!(
                    "{:<6}  {:<16}  {:<14}  {:>12}  {:>14}",
                    listing.id,
                    batch_id,
                    crop,
                    listing.remaining_quantity.map_or("-".to_string(), |q| format!("{:.2}", q)),
                    format_rupees(listing.price_breakdown().total())
                );
            }
            Ok(())
        }

        ListingCommand::Create {
            batch,
            farmer_base_price,
            transport_fees,
            distributor_margin,
            retailer_margin,
        } => {
            let session = app.require("/retailer/listing/new").await?;
            let batches = app.client.batches().await?;
            if !listable_batches(&batches, session.user.id).iter().any(|b| b.id == batch) {
                bail!("Batch {} is not delivered to you or is already listed", batch);
            }

            let draft = ListingDraft {
                batch: Some(batch),
                farmer_base_price,
                transport_fees,
                distributor_margin,
                retailer_margin,
            };
            let request = draft.validate()?;
            for (label, value) in draft.breakdown().components() {
                println!("  {:<20} {}", label, format_rupees(value.unwrap_or(0.0)));
            }
            println!("  {:<20} {}", "Total", format_rupees(draft.breakdown().total()));

            let listing = app.client.create_listing(&request).await?;
            println!("Listing {} created.", listing.id);
            Ok(())
        }
    }
}

// ============================================================================
// Admin
// ============================================================================

async fn cmd_kyc(app: &App, command: KycCommand) -> Result<()> {
    app.require("/admin/kyc").await?;

    let records = match command {
        KycCommand::Pending => app.client.pending_kyc().await?,
        KycCommand::All { status } => app.client.all_kyc(status).await?,
        KycCommand::Decide { id, decision, notes } => {
            if decision == KycStatus::Pending {
                bail!("Decision must be approved or rejected");
            }
            let response = app.client.decide_kyc(id, decision, &notes).await?;
            println!("{}", message_or(&response.message, "KYC updated."));
            return Ok(());
        }
    };

    if records.is_empty() {
        println!("No KYC records found.");
        return Ok(());
    }
    println!("{:<6}  {:<18}  {:<12}  {:<14}  {:<10}", "ID", "USER", "ROLE", "DOCUMENT", "STATUS");
    println!("{}", "-".repeat(70));
    for record in &records {
        let (name, role) = record
            .profile_details
            .as_ref()
            .map_or(("-".to_string(), "-"), |p| (p.display_name().to_string(), p.role.display_name()));
        println!(
            "{:<6}  {:<18}  {:<12}  {:<14}  {:<10}",
            record.id,
            name,
            role,
            record.document_type,
            record.status.as_str()
        );
    }
    Ok(())
}

async fn cmd_users(app: &App, command: UserCommand) -> Result<()> {
    app.require("/admin/users").await?;

    match command {
        UserCommand::List { role } => {
            let users = app.client.admin_users(role).await?;
            println!("{:<6}  {:<18}  {:<28}  {:<12}  {}", "ID", "USERNAME", "EMAIL", "ROLE", "ACTIVE");
            println!("{}", "-".repeat(80));
            for user in &users {
                let role = user.stakeholderprofile.as_ref().map_or("-", |p| p.role.display_name());
                println!(
                    "{:<6}  {:<18}  {:<28}  {:<12}  {}",
                    user.id, user.username, user.email, role, user.is_active
                );
            }
            println!("\nTotal: {} users", users.len());
        }
        UserCommand::Show { id } => {
            let user = app.client.admin_user(id).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        UserCommand::SetActive { id, active } => {
            let user = app
                .client
                .update_user(
                    id,
                    &UserUpdate {
                        is_active: Some(active),
                        email: None,
                    },
                )
                .await?;
            println!("{} is now {}", user.username, if user.is_active { "active" } else { "inactive" });
        }
    }
    Ok(())
}

async fn cmd_stats(app: &App) -> Result<()> {
    app.require("/admin/dashboard").await?;
    let stats = app.client.admin_stats().await?;

    println!("=== AgriChain Platform Stats ===");
    println!("Users:        {}", stats.total_users);
    for (role, count) in &stats.users_by_role {
        println!("  {:12} {}", role, count);
    }
    println!("KYC pending:  {}", stats.pending_kyc);
    println!("KYC approved: {}", stats.approved_kyc);
    println!("KYC rejected: {}", stats.rejected_kyc);
    Ok(())
}

// ============================================================================
// Public Trace
// ============================================================================

async fn cmd_trace(app: &App, public_id: &str) -> Result<()> {
    app.require_public(&format!("/trace/{}", public_id.trim())).await?;
    let report = app.client.trace(public_id).await?;

    println!("{} - {} ({:.2} kg)", report.batch.id, report.batch.crop_type, report.batch.quantity);
    println!("Status: {}", report.batch.status.label());
    println!("Farmer: {} ({})", report.farmer.name, message_or(&report.farmer.organization, "-"));
    if let Some(date) = report.batch.harvest_date {
        println!("Harvested: {}", date);
    }

    println!();
    for event in &report.timeline {
        println!("* {:<24} {}", event.stage, format_timestamp(event.date));
        if !event.actor.is_empty() {
            println!("    by {} {}", event.actor, event.location);
        }
        if let Some(prices) = event.price_breakdown() {
            for (label, value) in prices.components() {
                if let Some(value) = value {
                    println!("    {:<20} {}", label, format_rupees(value));
                }
            }
            println!("    {:<20} {}", "Total", format_rupees(prices.total()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_and_login() {
        let cli = Cli::try_parse_from([
            "agrichain",
            "--api-url",
            "http://localhost:9000/api",
            "login",
            "asha@example.com",
            "--password",
            "secret",
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000/api"));
        match cli.command {
            Commands::Login { identifier, password } => {
                assert_eq!(identifier, "asha@example.com");
                assert_eq!(password, "secret");
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_split_parts() {
        let cli = Cli::try_parse_from([
            "agrichain", "batches", "split", "12", "--part", "A:60:7", "--part", "B:40", "--exact",
        ])
        .unwrap();

        match cli.command {
            Commands::Batches(BatchCommand::Split { id, parts, exact }) => {
                assert_eq!(id, 12);
                assert!(exact);
                assert_eq!(parts[0], SplitRow::new("A", "60").to_retailer(7));
                assert_eq!(parts[1], SplitRow::new("B", "40"));
            }
            _ => panic!("expected batches split"),
        }

        assert!(Cli::try_parse_from(["agrichain", "batches", "split", "12", "--part", "nocolon"]).is_err());
        assert!(Cli::try_parse_from(["agrichain", "batches", "split", "12"]).is_err());
    }

    #[test]
    fn test_role_and_kyc_values() {
        let cli = Cli::try_parse_from(["agrichain", "kyc", "decide", "3", "approved", "--notes", "ok"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Kyc(KycCommand::Decide { id: 3, decision: KycStatus::Approved, .. })
        ));

        let cli = Cli::try_parse_from(["agrichain", "users", "list", "--role", "retailer"]).unwrap();
        assert!(matches!(cli.command, Commands::Users(UserCommand::List { role: Some(Role::Retailer) })));

        assert!(Cli::try_parse_from(["agrichain", "users", "list", "--role", "grower"]).is_err());
    }

    #[test]
    fn test_inspection_result_parses() {
        let cli = Cli::try_parse_from(["agrichain", "inspect", "submit", "4", "--result", "warning"]).unwrap();
        match cli.command {
            Commands::Inspect(InspectCommand::Submit { batch, result, report, .. }) => {
                assert_eq!(batch, 4);
                assert_eq!(result, InspectionResult::Warning);
                assert!(report.is_none());
            }
            _ => panic!("expected inspect submit"),
        }
    }

    #[test]
    fn test_timeline_fetch_failure_yields_none() {
        let failed = loaded_timeline(4, Err(ApiError::Network("connection refused".into())));
        assert!(failed.is_none());

        let loaded = loaded_timeline(4, Ok(Vec::new())).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_transport_status_filter() {
        assert_eq!(parse_transport_status("in_transit").unwrap(), TransportStatus::InTransit);
        assert!(parse_transport_status("lost").is_err());

        let cli = Cli::try_parse_from(["agrichain", "transport", "list", "--leg", "in-transit"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Transport(TransportCommand::List { leg: LegArg::InTransit, .. })
        ));
    }
}
