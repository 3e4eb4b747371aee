use anyhow::{Context, Result};
use tracing::info;
use truck_table::{create_schema, Schema, SqliteConfig, Table, TruckRow, TruckTable};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = SqliteConfig::from_env()?;
    info!(db_path = %config.db_path, "starting truck demo");

    let trucks = TruckTable::new("trucks", config)?;
    create_schema(
        trucks.provider(),
        &Schema::new().add_table(trucks.definition()),
    )
    .context("creating the trucks table")?;

    for (weeks, make) in [(3, "International"), (14, "Ford"), (9, "Caterpillar")] {
        trucks.insert_row(&TruckRow::new(weeks, make))?;
    }

    match trucks.select_by_id(1)? {
        Some(number_one) => println!(
            "Engine in truck number 1 is manufactured by {}",
            number_one.engine_make()
        ),
        None => println!("There is no truck number 1"),
    }
    Ok(())
}
