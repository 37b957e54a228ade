use crate::libs::{
    check_state::CheckStateStore,
    checker::Checker,
    config::Config,
    messages::Message,
    version::APP_METADATA_NAME,
};
use crate::msg_print;
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use prettytable::{row, Table};

/// Prints what the checker would do next, without touching the network.
pub fn cmd() -> Result<()> {
    let config = Config::read()?.checker_or_default();
    let checker = Checker::new(&config)?;
    let store = CheckStateStore::open_default()?;
    let state = store.load();

    let format_time = |time: Option<DateTime<Utc>>| {
        time.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| Message::StatusNever.to_string())
    };
    let next_check = if state.is_due(Utc::now(), checker.interval()) {
        "now".to_string()
    } else {
        format_time(state.next_due(checker.interval()))
    };

    msg_print!(Message::StatusHeader);
    let mut table = Table::new();
    table.add_row(row!["APPLICATION", APP_METADATA_NAME]);
    table.add_row(row!["CURRENT VERSION", checker.current_version()]);
    table.add_row(row!["DESCRIPTOR", checker.descriptor_url()]);
    table.add_row(row!["INTERVAL (H)", config.check_interval_hours]);
    table.add_row(row!["LAST CHECK", format_time(state.last_check_time())]);
    table.add_row(row!["NEXT CHECK", next_check]);
    table.add_row(row!["STATE FILE", store.path().display()]);
    table.printstd();

    Ok(())
}
