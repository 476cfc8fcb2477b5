use anyhow::Context;
use clap::{Parser, Subcommand};
use mediline_config::load as load_config;
use mediline_database::{AccountType, CreateUserRequest, ConversationRepository, UserRepository};
use mediline_gateway::{create_router, GatewayState};
use mediline_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "mediline-backend")]
#[command(about = "Mediline telehealth backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP/WebSocket server (default)
    Serve,
    /// Seed the database with a demo patient, doctor, and conversation
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::SeedData => seed_data().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Mediline backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = GatewayState::new(
        services.db_pool.clone(),
        config.auth.clone(),
        config.media.clone(),
    );
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(mediline_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("seeding database with demo data");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let users = UserRepository::new(services.db_pool.clone());

    let patient = match users.find_by_username("demo-patient").await? {
        Some(existing) => existing,
        None => {
            let patient = users
                .create(&CreateUserRequest {
                    username: "demo-patient".to_string(),
                    first_name: "Paula".to_string(),
                    last_name: "Stone".to_string(),
                    email: "demo-patient@example.com".to_string(),
                    account_type: AccountType::Patient,
                })
                .await?;
            users.create_patient_profile(patient.id, None).await?;
            patient
        }
    };

    let doctor = match users.find_by_username("demo-doctor").await? {
        Some(existing) => existing,
        None => {
            let doctor = users
                .create(&CreateUserRequest {
                    username: "demo-doctor".to_string(),
                    first_name: "Dana".to_string(),
                    last_name: "Reed".to_string(),
                    email: "demo-doctor@example.com".to_string(),
                    account_type: AccountType::Doctor,
                })
                .await?;
            users
                .create_doctor_profile(doctor.id, None, Some("general practice"))
                .await?;
            doctor
        }
    };

    let conversations = ConversationRepository::new(services.db_pool.clone());
    let conversation = match conversations
        .list_for_user(patient.id)
        .await?
        .into_iter()
        .find(|conversation| conversation.doctor_id == doctor.id)
    {
        Some(existing) => existing,
        None => conversations.create(patient.id, doctor.id).await?,
    };

    let patient_session = services.authenticator.issue_session(patient.id).await?;
    let doctor_session = services.authenticator.issue_session(doctor.id).await?;

    println!("Seeded demo data:");
    println!("- patient {} (id {})", patient.username, patient.id);
    println!("- doctor {} (id {})", doctor.username, doctor.id);
    println!("- conversation {}", conversation.id);
    println!("- patient token: {}", patient_session.token);
    println!("- doctor token: {}", doctor_session.token);
    println!(
        "Connect with: ws://{}:{}/conversation/{}/?token=<token>",
        config.http.address, config.http.port, conversation.id
    );

    Ok(())
}
