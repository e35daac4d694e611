use std::sync::Arc;

use sdb_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), sdb_core::Error> {
    sdb_core::logging::init("sdb")?;

    let cfg = Arc::new(Config::load()?);

    sdb_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| sdb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
