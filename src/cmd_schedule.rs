//! Schedule command handlers.
//!
//! Jobs live in the scheduler of the process that owns them, so each command
//! first rebuilds them from the store, then applies the change to job and
//! stored status together. A running `reclaim run` picks up the new status
//! on its next start.

use crate::cli::ScheduleAction;
use crate::Context;

pub(crate) async fn handle_schedule_command(
    ctx: &Context,
    action: ScheduleAction,
) -> anyhow::Result<()> {
    ctx.manager.reconcile_at_startup().await?;

    match action {
        ScheduleAction::List => schedule_list(ctx).await,
        ScheduleAction::Start { index } => {
            ctx.manager.schedule_task(index).await?;
            println!("Task {} scheduled", index);
            Ok(())
        }
        ScheduleAction::Pause { index } => {
            ctx.manager.pause_task(index).await?;
            println!("Task {} paused", index);
            Ok(())
        }
        ScheduleAction::Resume { index } => {
            ctx.manager.resume_task(index).await?;
            println!("Task {} resumed", index);
            Ok(())
        }
        ScheduleAction::Stop { index } => {
            ctx.manager.unschedule_task(index).await?;
            println!("Task {} unscheduled", index);
            Ok(())
        }
    }
}

async fn schedule_list(ctx: &Context) -> anyhow::Result<()> {
    let jobs = ctx.manager.list_jobs().await?;
    if jobs.is_empty() {
        println!("No scheduled tasks.");
        return Ok(());
    }

    println!(
        "{:<5} {:<24} {:<20} {:<8} {}",
        "ID", "NAME", "TRIGGER", "STATE", "NEXT RUN"
    );
    println!("{}", "-".repeat(80));
    for job in jobs {
        let next = job
            .next_fire
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{:<5} {:<24} {:<20} {:<8} {}",
            job.id, job.name, job.trigger_expr, job.state, next
        );
    }
    Ok(())
}
