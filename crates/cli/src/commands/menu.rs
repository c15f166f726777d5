//! Interactive menu.

#![allow(clippy::print_stdout)]

use dialoguer::Select;

use super::{CliError, Session, UploadMode, progress, upload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Test,
    Full,
    Resume,
    ClearProgress,
    Exit,
}

impl Choice {
    const fn label(self) -> &'static str {
        match self {
            Self::Test => "🧪 Test upload",
            Self::Full => "🚀 Full upload (all orders)",
            Self::Resume => "🔄 Resume upload (continue from where you left off)",
            Self::ClearProgress => "🗑️  Clear progress and start fresh",
            Self::Exit => "❌ Exit",
        }
    }
}

/// Menu entries; resume and clear only make sense with recorded progress.
fn choices(has_progress: bool) -> Vec<Choice> {
    if has_progress {
        vec![
            Choice::Test,
            Choice::Full,
            Choice::Resume,
            Choice::ClearProgress,
            Choice::Exit,
        ]
    } else {
        vec![Choice::Test, Choice::Full, Choice::Exit]
    }
}

/// Show the menu and run the chosen flow.
///
/// # Errors
///
/// Returns an error if a prompt or the chosen flow fails.
pub async fn run(session: &Session) -> Result<(), CliError> {
    let completed = session.progress.load_completed().len();
    if completed > 0 {
        println!("📂 Found existing progress: {completed} orders already uploaded");
    }

    let choices = choices(completed > 0);
    let labels: Vec<String> = choices
        .iter()
        .map(|c| match c {
            Choice::Test => format!(
                "{} ({} orders)",
                c.label(),
                session.config.batches.test_order_count
            ),
            _ => c.label().to_string(),
        })
        .collect();

    let index = Select::new()
        .with_prompt("Choose upload mode")
        .items(&labels)
        .default(0)
        .interact()?;

    match choices.get(index).copied().unwrap_or(Choice::Exit) {
        Choice::Test => {
            let passed = upload::test_upload(session)
                .await?
                .is_some_and(|report| report.is_complete());
            if !passed {
                println!("❌ Test failed. Please fix issues before proceeding.");
            } else if session.confirm("🎉 Test successful! Continue with full upload?")? {
                upload::full_upload(session, false).await?;
            } else {
                println!("✅ Test complete. Run again when ready for the full upload.");
            }
        }
        Choice::Full => {
            upload::full_upload_with_choice(session, None).await?;
        }
        Choice::Resume => {
            upload::full_upload_with_choice(session, Some(UploadMode::Resume)).await?;
        }
        Choice::ClearProgress => progress::clear(session)?,
        Choice::Exit => println!("👋 Exiting"),
    }
    Ok(())
}
