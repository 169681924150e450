use clap::Args;
use sadhana_core::api::LOGIN_FAILED;
use sadhana_core::stats::{comparison_table, format_duration};
use sadhana_core::{ApiClient, Config};

#[derive(Args)]
pub struct StatsArgs {
    /// Registered user id
    #[arg(long, conflicts_with = "username", required_unless_present = "username")]
    user_id: Option<String>,
    /// Log in with this username to resolve the user id
    #[arg(long, requires = "password")]
    username: Option<String>,
    #[arg(long, env = "SADHANA_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Print the per-chakra comparison of recent sessions instead of JSON
    #[arg(long)]
    table: bool,
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let client = ApiClient::with_timeout(&config.api.base_url, config.api.timeout())?;

    super::runtime()?.block_on(show(args, client))
}

async fn show(args: StatsArgs, client: ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let user_id = match (args.user_id, args.username, args.password) {
        (Some(id), _, _) => id,
        (None, Some(username), Some(password)) => client
            .login(&username, &password)
            .await
            .map_err(|e| e.user_message(LOGIN_FAILED))?
            .id,
        _ => return Err("either --user-id or --username/--password is required".into()),
    };

    let stats = client.fetch_stats(&user_id).await?;
    if !args.table {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "sessies: {}  totaal: {}  gemiddeld: {}  beste retentie: {}",
        stats.session_count,
        format_duration(stats.total_duration),
        format_duration(stats.average_duration),
        format_duration(stats.best_retention),
    );
    let Some(table) = comparison_table(&stats) else {
        println!("Nog geen sessies.");
        return Ok(());
    };
    let header: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{:>12}", format!("{} {}", c.label, c.date)))
        .collect();
    println!("{:<24}{}", "Chakra", header.join(""));
    for row in &table.rows {
        let cells: Vec<String> = row.seconds.iter().map(|s| format!("{s:>11}s")).collect();
        println!("{:<24}{}", row.chakra, cells.join(""));
    }
    let totals: Vec<String> = table.totals.iter().map(|s| format!("{s:>11}s")).collect();
    println!("{:<24}{}", "Totaal", totals.join(""));
    Ok(())
}
