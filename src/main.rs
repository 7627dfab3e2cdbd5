use petmap::services::MarkerBoard;
use petmap::{AppConfig, AppError, PetMapApp};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

/// Boot, load the current markers once and print the pins the map would draw
async fn run() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let app = PetMapApp::boot(config)?;

    if !app.session.is_authenticated() {
        log::info!("No stored session, listing markers anonymously");
    }

    let mut board = MarkerBoard::new();
    app.refresh_markers(&mut board).await?;

    for marker in board.markers() {
        println!(
            "{}\t{:.5},{:.5}\t{}\t{}",
            marker.id,
            marker.position.lat,
            marker.position.lng,
            marker.color.as_hex(),
            marker.title
        );
    }
    Ok(())
}
