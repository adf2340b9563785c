use boa_db::{connect_from_config, migrations};

use crate::commands::{load_config, runtime, CommandResult, EXIT_PERSISTENCE};

const COMMAND: &str = "migrate";

pub fn run() -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string()))?;
        let before = migrations::applied_count(&pool)
            .await
            .map_err(|error| ("migration", error.to_string()))?;
        migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string()))?;
        let after = migrations::applied_count(&pool)
            .await
            .map_err(|error| ("migration", error.to_string()))?;
        pool.close().await;
        Ok::<i64, (&'static str, String)>(after - before)
    });

    match result {
        Ok(0) => CommandResult::success(COMMAND, "settings database already up to date"),
        Ok(applied) => CommandResult::success(COMMAND, format!("applied {applied} pending migration(s)")),
        Err((error_class, message)) => {
            CommandResult::failure(COMMAND, error_class, message, EXIT_PERSISTENCE)
        }
    }
}
