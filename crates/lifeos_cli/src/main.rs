//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable that drives one inbox triage round trip.
//! - Keep output deterministic for quick local sanity checks.

use lifeos_core::db::open_db_in_memory;
use lifeos_core::{
    now_epoch_ms, ConversionKind, InboxService, InboxTab, KeywordLabelSuggester, NewInboxItem,
    SqliteConversionTarget, SqliteInboxRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("lifeos_core ping={}", lifeos_core::ping());
    println!("lifeos_core version={}", lifeos_core::core_version());

    match run_smoke() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_smoke() -> Result<(), Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let inbox = InboxService::new(
        SqliteInboxRepository::try_new(&conn)?,
        SqliteConversionTarget::new(&conn),
    )
    .with_suggester(KeywordLabelSuggester);

    let voice = inbox.add_item(NewInboxItem::voice("call mom about sunday", 14))?;
    inbox.add_item(NewInboxItem::note("learn to juggle"))?;
    inbox.add_item(
        NewInboxItem::imported_email("billing@power.co", "Power bill", "Amount due $82.40")
            .with_amount(82.4),
    )?;

    for row in inbox.present(InboxTab::All, now_epoch_ms())? {
        let actions: Vec<_> = row.actions.iter().map(|action| action.label).collect();
        println!(
            "inbox type={} title={:?} badge={} actions={:?}",
            row.kind,
            row.title,
            row.badge.unwrap_or("-"),
            actions
        );
    }

    let outcome = inbox.convert(voice, ConversionKind::ToTask)?;
    println!("convert outcome={outcome:?}");

    let counts = inbox.tab_counts()?;
    println!(
        "tabs all={} voice={} notes={}",
        counts.all, counts.voice, counts.notes
    );
    Ok(())
}
