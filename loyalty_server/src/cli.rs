use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // LPG_TOKEN_SECRET is deliberately absent
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "LPG_HOST",
        "LPG_PORT",
        "LPG_DATABASE_URL",
        "LPG_DB_MAX_CONNECTIONS",
        "LPG_ACCRUAL_SYSTEM_ADDRESS",
        "LPG_ACCRUAL_POLL_INTERVAL_MS",
        "LPG_ACCRUAL_BATCH_SIZE",
        "LPG_ACCRUAL_CONCURRENCY",
        "LPG_ACCRUAL_TIMEOUT_MS",
        "LPG_RECONCILE_INTERVAL_MS",
        "LPG_RUN_WORKERS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
