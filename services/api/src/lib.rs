mod cli;
mod infra;
mod routes;
mod server;

use leaselens::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
