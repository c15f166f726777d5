//! Test and full upload flows.
//!
//! Each flow returns `Ok(None)` when the user backs out or there is nothing
//! to upload, and the batch report otherwise.

#![allow(clippy::print_stdout)]

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use dialoguer::Select;
use serde_json::Value;
use woo_migrate_core::Order;
use woo_migrate_uploader::export::{LoadMode, estimate_duration, status_breakdown};
use woo_migrate_uploader::shopify::Endpoint;
use woo_migrate_uploader::{BatchReport, BatchUploader};

use super::{CliError, Session, UploadMode};

/// Orders shown before a test upload.
const PREVIEW_COUNT: usize = 3;

/// Upload a few anonymized orders to check the store accepts them.
///
/// # Errors
///
/// Returns an error if the export cannot be read or a prompt fails.
pub async fn test_upload(session: &Session) -> Result<Option<BatchReport>, CliError> {
    let count = session.config.batches.test_order_count;
    println!("🧪 Testing Shopify upload with {count} orders");

    let orders = session.load_orders(LoadMode::Test { count })?;
    if orders.is_empty() {
        println!("❌ No valid orders in the export");
        return Ok(None);
    }

    println!("\n📋 Test orders preview:");
    for (i, order) in orders.iter().take(PREVIEW_COUNT).enumerate() {
        println!("  {}", preview_line(i + 1, order));
    }
    if orders.len() > PREVIEW_COUNT {
        println!("  ... and {} more orders", orders.len() - PREVIEW_COUNT);
    }

    if !session.confirm(&format!("Upload these {} test orders to Shopify?", orders.len()))? {
        println!("❌ Test upload cancelled");
        return Ok(None);
    }

    let report = BatchUploader::new(&session.client, &session.progress)
        .without_progress()
        .run(
            Endpoint::Orders,
            &orders,
            session.config.batches.test_batch_size,
            false,
        )
        .await;

    if report.is_complete() {
        println!("\n✅ Test successful! All {} orders uploaded", report.successes);
    } else {
        println!(
            "\n⚠️  Test issues: only {}/{} orders uploaded",
            report.successes, report.total
        );
    }
    Ok(Some(report))
}

/// Full upload, deciding what to do with existing progress.
///
/// With no `mode` and a non-empty progress file the user picks fresh or
/// resume; `--yes` resumes.
///
/// # Errors
///
/// Returns an error if progress cannot be cleared, the export cannot be
/// read, or a prompt fails.
pub async fn full_upload_with_choice(
    session: &Session,
    mode: Option<UploadMode>,
) -> Result<Option<BatchReport>, CliError> {
    let mode = match mode {
        Some(mode) => mode,
        None if session.progress.load_completed().is_empty() => UploadMode::Fresh,
        None if session.assume_yes => UploadMode::Resume,
        None => match choose_mode()? {
            Some(mode) => mode,
            None => {
                println!("❌ Upload cancelled");
                return Ok(None);
            }
        },
    };

    let resume = match mode {
        UploadMode::Resume => true,
        UploadMode::Fresh => {
            if session.progress.clear()? {
                println!("🗑️  Progress cleared");
            }
            false
        }
    };
    full_upload(session, resume).await
}

fn choose_mode() -> Result<Option<UploadMode>, CliError> {
    let choice = Select::new()
        .with_prompt("⚠️  You have existing progress. Start fresh or resume?")
        .items(&["Resume where you left off", "Start fresh", "Cancel"])
        .default(0)
        .interact()?;
    Ok(match choice {
        0 => Some(UploadMode::Resume),
        1 => Some(UploadMode::Fresh),
        _ => None,
    })
}

/// Upload every valid order in the export.
///
/// # Errors
///
/// Returns an error if the export cannot be read or a prompt fails.
pub async fn full_upload(session: &Session, resume: bool) -> Result<Option<BatchReport>, CliError> {
    let action = if resume { "Resuming" } else { "Starting" };
    println!("\n🚀 {action} full Shopify upload");

    let orders = session.load_orders(LoadMode::Full)?;
    if orders.is_empty() {
        println!("❌ No valid orders in the export");
        return Ok(None);
    }

    let remaining = if resume {
        let completed = session.progress.load_completed();
        let remaining = orders
            .iter()
            .filter(|o| o.source_id().is_none_or(|id| !completed.contains(&id)))
            .count();
        println!("📊 Resume summary:");
        println!("   - Total orders: {}", orders.len());
        println!("   - Completed: {}", orders.len() - remaining);
        println!("   - Remaining: {remaining}");
        remaining
    } else {
        println!("📊 Full upload summary:");
        println!("   - Total orders: {}", orders.len());
        orders.len()
    };
    println!(
        "   - Financial statuses: {}",
        format_breakdown(&status_breakdown(&orders))
    );
    println!(
        "   - Estimated time: {}",
        format_minutes(estimate_duration(remaining))
    );

    let prompt = if resume {
        format!("Resume upload of the remaining {remaining} orders to Shopify?")
    } else {
        format!("Upload all {remaining} orders to Shopify?")
    };
    if !session.confirm(&prompt)? {
        println!("❌ Upload cancelled");
        return Ok(None);
    }

    let report = BatchUploader::new(&session.client, &session.progress)
        .run(
            Endpoint::Orders,
            &orders,
            session.config.batches.full_batch_size,
            resume,
        )
        .await;

    let icon = if report.is_complete() { "✅" } else { "⚠️" };
    println!("\n{icon} Upload complete!");
    println!(
        "Successfully uploaded: {}/{} orders ({} already done)",
        report.successes, report.total, report.resumed
    );
    if !report.is_complete() {
        println!(
            "⚠️  {} orders failed - check the log for details",
            report.total - report.successes
        );
    }
    Ok(Some(report))
}

fn preview_line(n: usize, order: &Order) -> String {
    let text = |key: &str| match order.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let created = text("created_at");
    let date = match created.get(..10) {
        Some(day) => day,
        None if created.is_empty() => "Unknown",
        None => created.as_str(),
    };
    format!(
        "{n}. Order {} - {} - ${} - {date}",
        order.label(),
        order.email().unwrap_or("no email"),
        text("total_price"),
    )
}

fn format_breakdown(counts: &BTreeMap<String, usize>) -> String {
    let mut out = String::new();
    for (i, (status, count)) in counts.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{status}: {count}");
    }
    out
}

fn format_minutes(duration: Duration) -> String {
    format!("{:.1} minutes", duration.as_secs_f64() / 60.0)
}
