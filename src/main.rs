#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // Run the viewer; file dialogs are spawned on this runtime
    ellipse_scene::run_app()
}
