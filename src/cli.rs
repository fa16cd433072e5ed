//! Command-line pages of the dashboard.

use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;

use crate::context::AppContext;
use crate::fetcher::DataFetcher;
use crate::forms::{AddEventForm, CreateShipmentForm, Form, FormController, RateCarrierForm, UpdateStatusForm};
use crate::hooks::QueryState;
use crate::lifecycle::TxState;
use crate::notify::ConsoleNotifier;
use crate::query::TrackSession;
use crate::scheduler;
use crate::views;

#[derive(Parser, Debug)]
#[command(name = "logistics-tracker", version, about = "Track shipments recorded on the logistics contract")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show resolved configuration and environment diagnostics
    Setup {
        /// Also query the node for its chain id
        #[arg(long)]
        check_chain: bool,
    },

    /// Create a shipment, optionally with an escrow deposit
    Create(CreateArgs),

    /// Print an example create command with a fresh shipment code
    Example,

    /// Look up a shipment with its timeline and escrow
    Track {
        code: String,
    },

    /// Add tracking events or update status
    #[command(subcommand)]
    Manage(ManageCommand),

    /// Rate the carrier of a delivered shipment
    Rate(RateArgs),

    /// Show a carrier's rating and statistics
    Profile {
        address: String,
    },

    /// Poll shipments on a cron schedule and report status changes
    Watch {
        #[arg(required = true)]
        codes: Vec<String>,

        /// Cron expression overriding WATCH_SCHEDULE
        #[arg(long)]
        schedule: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub code: String,
    #[arg(long)]
    pub product: String,
    #[arg(long)]
    pub origin: String,
    #[arg(long)]
    pub destination: String,
    /// Carrier wallet address
    #[arg(long)]
    pub carrier: String,
    /// Delivery deadline (YYYY-MM-DD or RFC 3339)
    #[arg(long, default_value = "")]
    pub deadline: String,
    /// Escrow deposit in KAIA
    #[arg(long, default_value = "")]
    pub deposit: String,
}

#[derive(Subcommand, Debug)]
pub enum ManageCommand {
    /// Append a tracking event
    Event {
        #[arg(long)]
        code: String,
        #[arg(long)]
        location: String,
        #[arg(long = "type")]
        event_type: String,
    },

    /// Move a shipment to a new status
    Status {
        #[arg(long)]
        code: String,
        /// Pending, InTransit, Delivered, Canceled (or 0-3)
        #[arg(long)]
        status: String,
        #[arg(long, default_value = "")]
        note: String,
    },
}

#[derive(Args, Debug)]
pub struct RateArgs {
    #[arg(long)]
    pub code: String,
    /// Stars from 1 to 5
    #[arg(long)]
    pub rating: u8,
    #[arg(long)]
    pub feedback: String,
}

pub async fn run(ctx: Arc<AppContext>, command: Command) -> Result<()> {
    match command {
        Command::Setup { check_chain } => setup(&ctx, check_chain).await,
        Command::Create(args) => {
            let form = CreateShipmentForm {
                shipment_code: args.code,
                product_name: args.product,
                origin: args.origin,
                destination: args.destination,
                carrier: args.carrier,
                deadline: args.deadline,
                deposit_amount: args.deposit,
            };
            submit_form(&ctx, form).await
        }
        Command::Example => {
            let now = Utc::now();
            let form = CreateShipmentForm::quick_fill_example(now, now.timestamp_subsec_nanos());
            println!("✅ Example data filled in with unique code: {}", form.shipment_code);
            println!(
                "logistics-tracker create --code {} --product {:?} --origin {:?} --destination {:?} --carrier {} --deadline {} --deposit {}",
                form.shipment_code, form.product_name, form.origin, form.destination, form.carrier, form.deadline, form.deposit_amount,
            );
            Ok(())
        }
        Command::Track { code } => {
            let session = TrackSession::new(ctx.hooks.clone());
            let view = session.search(&code).await.unwrap_or_else(|| session.view());
            print!("{}", views::render_track_view(&view));
            Ok(())
        }
        Command::Manage(ManageCommand::Event { code, location, event_type }) => {
            submit_form(&ctx, AddEventForm { shipment_code: code, location, event_type }).await
        }
        Command::Manage(ManageCommand::Status { code, status, note }) => {
            submit_form(&ctx, UpdateStatusForm { shipment_code: code, new_status: status, note }).await
        }
        Command::Rate(args) => {
            let form = RateCarrierForm {
                shipment_code: args.code,
                rating: args.rating,
                feedback: args.feedback,
            };
            submit_form(&ctx, form).await
        }
        Command::Profile { address } => {
            let mut query = ctx.hooks.carrier_profile_query(&address);
            let address = address.trim();
            match query.refetch().await {
                QueryState::Ready(profile) => print!("{}", views::render_carrier_profile(profile)),
                QueryState::Failed(err) => println!("❌ Failed to load carrier {}: {}", address, err),
                QueryState::Disabled | QueryState::Loading => println!("Enter a carrier address to look up"),
            }
            Ok(())
        }
        Command::Watch { codes, schedule } => {
            let schedule = schedule.unwrap_or_else(|| ctx.config.watch_schedule.clone());
            let fetcher = Arc::new(DataFetcher::new(ctx.hooks.clone(), codes));

            println!("Cron schedule: {}", schedule);
            println!("================================");

            scheduler::create_and_run_scheduler(&schedule, fetcher).await
        }
    }
}

async fn setup(ctx: &AppContext, check_chain: bool) -> Result<()> {
    print!("{}", views::render_config(&ctx.config));
    println!("================================");
    print!("{}", views::render_validation(&ctx.validation));

    if check_chain {
        match ctx.hooks.client().chain_id().await {
            Ok(id) if Some(id) == ctx.config.chain_id => println!("✅ Node reports chain id {}", id),
            Ok(id) => println!("⚠️  Node reports chain id {}, configuration expects {:?}", id, ctx.config.chain_id),
            Err(err) => println!("⚠️  Could not reach {}: {}", ctx.config.rpc_url, err),
        }
    }

    Ok(())
}

async fn submit_form<F: Form>(ctx: &AppContext, form: F) -> Result<()> {
    let mut controller = FormController::with_form(form, ConsoleNotifier);

    let handle = match controller.submit(&ctx.hooks, Utc::now()) {
        Ok(handle) => handle,
        Err(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("❌ {}: {}", field, message);
            }
            bail!("{} invalid field(s)", errors.len());
        }
    };

    println!("⏳ Sending transaction...");

    match controller.drive(&handle).await {
        TxState::Confirmed(receipt) => {
            let hash = receipt.tx_hash.to_string();
            println!("🔗 Transaction: {}", ctx.config.explorer_tx_url(&hash));
            Ok(())
        }
        TxState::Failed(err) => bail!("transaction failed: {}", err),
        TxState::Pending | TxState::Confirming(_) => bail!("transaction did not settle"),
    }
}
