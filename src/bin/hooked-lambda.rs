use hooked::config::Config;
use hooked::handler::build_router;
use hooked::lambda;
use hooked::logger;
use hooked::repository;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    let router = build_router(repository::from_env().await)?;
    lambda::run(router, cfg).await?;
    Ok(())
}
