use crate::api;
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, dsn } => {
            let config = api::AppConfig::new(globals.frontend_url.clone());
            let email_config = api::email::EmailWorkerConfig::new();

            api::new(port, dsn, globals, config, email_config).await?;
        }
    }

    Ok(())
}
