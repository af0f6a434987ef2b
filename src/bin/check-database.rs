use paris_events::config::Config;
use paris_events::constants::EVENTS_TABLE;
use paris_events::storage::{EventStore, SqliteEventStore};

fn check(config: &Config) -> paris_events::error::Result<()> {
    let store = SqliteEventStore::open_existing(&config.storage.db_path)?;

    let count = store.count()?;
    println!("\n📊 Rows in '{}': {}", EVENTS_TABLE, count);

    println!("\n📋 Table structure:");
    println!("{}", "-".repeat(40));
    for column in store.table_info()? {
        let key = if column.primary_key { " (primary key)" } else { "" };
        println!("   {:>2}  {:<16} {}{}", column.cid, column.name, column.decl_type, key);
    }

    if count == 0 {
        println!("\n⚠️  The table is empty. Run the load step first.");
    }
    Ok(())
}

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            println!("❌ Configuration error: {e}");
            std::process::exit(1);
        }
    };

    println!("🔍 Checking database {}", config.storage.db_path.display());
    println!("{}", "=".repeat(60));

    if let Err(e) = check(&config) {
        println!("❌ Database error: {e}");
        std::process::exit(1);
    }
}
