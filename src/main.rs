use summary_api::error::SummarizerError;

#[tokio::main]
async fn main() -> Result<(), SummarizerError> {
    summary_api::app::run().await
}
