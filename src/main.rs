use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_seating::{config::Config, services::cds::CineDigitalServiceClient, AppState};

/// Выбор мест и бронирование билетов в кинотеатре через Cine Digital Service
#[derive(Debug, Parser)]
#[command(name = "cinema-seating", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show which seats would be booked, without booking them
    Seats {
        #[arg(long)]
        show_id: i64,
        #[arg(long, default_value_t = 1)]
        quantity: usize,
    },
    /// List the movies of the cinema
    Movies,
    /// Book tickets and record their barcodes
    Book {
        #[arg(long)]
        show_id: i64,
        #[arg(long, default_value_t = 1)]
        quantity: usize,
        #[arg(long)]
        venue_id: i64,
    },
    /// Cancel tickets by barcode
    Cancel {
        #[arg(required = true)]
        barcodes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("Starting cinema-seating for cinema {} ({})", config.cds.cinema_id, config.app.environment);

    match cli.command {
        Commands::Seats { show_id, quantity } => {
            let cds = CineDigitalServiceClient::from_config(&config.cds, &config.circuit_breaker)?;
            let show = cds.get_show(show_id).await?;
            let cinema = cds.get_cinema_infos().await?;
            let seats = cds.select_seats(&show, quantity).await?;
            let report = serde_json::json!({
                "show_id": show.id,
                "remaining_quantity": show.remaining_quantity(cinema.is_internet_sale_gauge_active),
                "seats": seats,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Movies => {
            let cds = CineDigitalServiceClient::from_config(&config.cds, &config.circuit_breaker)?;
            let movies = cds.get_venue_movies().await?;
            println!("{}", serde_json::to_string_pretty(&movies)?);
        }
        Commands::Book { show_id, quantity, venue_id } => {
            let state = AppState::new(config).await?;
            let tickets = state
                .bookings
                .book_external_ticket(show_id, quantity, venue_id)
                .await?;
            println!("{}", serde_json::to_string_pretty(&tickets)?);
        }
        Commands::Cancel { barcodes } => {
            let cds = CineDigitalServiceClient::from_config(&config.cds, &config.circuit_breaker)?;
            cds.cancel_booking(&barcodes).await?;
            info!("Cancelled {} ticket(s)", barcodes.len());
        }
    }

    Ok(())
}
