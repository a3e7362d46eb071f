use pdf_summary_service::create_app;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Check required environment variables
    for var in [
        "DATABASE_URL",
        "OPENROUTER_API_KEY",
        "UPLOAD_PROVIDER_URL",
        "UPLOAD_PROVIDER_TOKEN",
        "IDENTITY_PROVIDER_URL",
    ] {
        if std::env::var(var).is_err() {
            eprintln!("Error: {} environment variable is required", var);
            std::process::exit(1);
        }
    }

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let app = create_app().await;
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;

    info!("PDF Summary Service starting on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Submission endpoint: POST http://{}/summaries", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
