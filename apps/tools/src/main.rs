use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use server_api::{
    add_entity, adjust_entity, bulk_replace, load_dashboard, remove_entity, reset_all, ApiContext,
};
use shared::{
    domain::{RawRow, RawStatus, StatusColor},
    error::ApiError,
    protocol::{AdjustOutcome, DashboardView},
};
use storage::{prepare_database_url, Storage, DEFAULT_DATABASE_URL};
use tracing_subscriber::EnvFilter;

const BAR_CELLS: usize = 20;

#[derive(Parser, Debug)]
#[command(about = "Inspect and edit the status dashboard database")]
struct Cli {
    #[arg(long, default_value = DEFAULT_DATABASE_URL)]
    database_url: String,
    /// Print the resulting dashboard as JSON instead of a table.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    Add {
        name: String,
        #[arg(default_value = "")]
        status: String,
    },
    Adjust {
        name: String,
        #[arg(allow_hyphen_values = true)]
        delta: String,
    },
    Delete {
        name: String,
    },
    Reset,
    /// Replace every entry with `name=status` pairs.
    Replace {
        #[arg(allow_hyphen_values = true)]
        rows: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let database_url = prepare_database_url(&cli.database_url)?;
    let ctx = ApiContext {
        storage: Storage::new(&database_url).await?,
    };

    let view = match cli.command {
        Command::List => load_dashboard(&ctx).await.map_err(user_error)?,
        Command::Add { name, status } => add_entity(&ctx, &name, &status)
            .await
            .map_err(user_error)?,
        Command::Adjust { name, delta } => {
            let response = adjust_entity(&ctx, &name, &delta)
                .await
                .map_err(user_error)?;
            if response.outcome == AdjustOutcome::Unchanged {
                eprintln!("delta is zero; nothing written");
            }
            response.view
        }
        Command::Delete { name } => remove_entity(&ctx, &name).await.map_err(user_error)?,
        Command::Reset => reset_all(&ctx).await.map_err(user_error)?,
        Command::Replace { rows } => {
            let rows: Vec<RawRow> = rows.iter().map(String::as_str).map(parse_row_arg).collect();
            let response = bulk_replace(&ctx, &rows).await.map_err(user_error)?;
            for issue in &response.issues {
                eprintln!(
                    "row {} ({:?}): {:?}",
                    issue.row + 1,
                    issue.name,
                    issue.reason
                );
            }
            response.view
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_table(&view));
    }
    Ok(())
}

fn user_error(err: ApiError) -> anyhow::Error {
    anyhow!("{:?}: {}", err.code, err.message)
}

fn parse_row_arg(arg: &str) -> RawRow {
    match arg.rsplit_once('=') {
        Some((name, status)) => RawRow {
            name: name.to_string(),
            status: Some(RawStatus::Text(status.to_string())),
        },
        None => RawRow {
            name: arg.to_string(),
            status: None,
        },
    }
}

fn render_table(view: &DashboardView) -> String {
    let width = view
        .rows
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);

    let mut out = String::new();
    for row in &view.rows {
        let filled = usize::from(row.bar_width_percent) * BAR_CELLS / 100;
        let sign = match row.color {
            StatusColor::Positive => '+',
            StatusColor::Negative => '-',
            StatusColor::Neutral => ' ',
        };
        out.push_str(&format!(
            "{:<width$}  {:>10} {sign} [{}{}]\n",
            row.name,
            row.formatted_status,
            "#".repeat(filled),
            ".".repeat(BAR_CELLS - filled),
        ));
    }
    out
}
