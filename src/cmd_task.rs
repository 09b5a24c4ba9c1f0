//! Task and autostart command handlers.

use anyhow::Context as _;
use reclaim_store::{TaskDefinition, TaskStore};

use crate::cli::{NewTask, TaskAction, TaskChanges, Toggle};
use crate::Context;

pub(crate) async fn handle_task_command(ctx: &Context, action: TaskAction) -> anyhow::Result<()> {
    match action {
        TaskAction::List => task_list(ctx).await,
        TaskAction::Show { index } => task_show(ctx, index).await,
        TaskAction::Add(new) => task_add(ctx, new).await,
        TaskAction::Edit { index, changes } => task_edit(ctx, index, changes).await,
        TaskAction::Remove { index } => task_remove(ctx, index).await,
        TaskAction::Exec { index, dry_run } => task_exec(ctx, index, dry_run).await,
    }
}

fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}

fn column_value(task: &TaskDefinition, column: &str) -> String {
    match column {
        "name" => task.name.clone(),
        "root_path" => task.root_path.display().to_string(),
        "pattern" => task.pattern.clone(),
        "recursive" => yes_no(task.recursive),
        "days" => task.days.to_string(),
        "size" => task.size.to_string(),
        "number" => task.number.to_string(),
        "empty_dir" => yes_no(task.empty_dir),
        "trigger_args" => task.trigger_args.clone().unwrap_or_default(),
        "status" => task.status.to_string(),
        _ => "-".to_string(),
    }
}

/// List tasks using the columns stored with them.
async fn task_list(ctx: &Context) -> anyhow::Result<()> {
    let tasks = ctx.store.load().await?;
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    let columns = ctx.store.display_columns().await?;
    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|task| columns.iter().map(|c| column_value(task, c)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c.to_uppercase(), w = *w))
        .collect();
    println!("{:<5} {}", "#", header.join("  "));
    println!("{}", "-".repeat(6 + widths.iter().map(|w| w + 2).sum::<usize>()));

    for (index, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<w$}", v, w = *w))
            .collect();
        println!("{:<5} {}", index, cells.join("  "));
    }
    Ok(())
}

async fn task_show(ctx: &Context, index: usize) -> anyhow::Result<()> {
    let task = ctx.store.get(index).await?;

    println!("Task {}: {}", index, task.name);
    println!("{}", "=".repeat(50));
    println!("Root:      {}", task.root_path.display());
    println!("Pattern:   {}", task.pattern);
    println!("Recursive: {}", task.recursive);
    println!("Days:      {}", task.days);
    println!("Size:      {} MiB", task.size);
    println!("Number:    {}", task.number);
    println!("Empty dir: {}", task.empty_dir);
    println!("Trigger:   {}", task.trigger_args.as_deref().unwrap_or("-"));
    println!("Status:    {}", task.status);
    Ok(())
}

async fn task_add(ctx: &Context, new: NewTask) -> anyhow::Result<()> {
    let mut task = TaskDefinition::new(new.name, new.root)
        .with_pattern(new.pattern)
        .with_recursive(new.recursive)
        .with_days(new.days)
        .with_size(new.size)
        .with_number(new.number)
        .with_empty_dir(new.empty_dir);
    task.trigger_args = new.trigger;

    let index = ctx.store.add(task).await?;
    println!("Added task {}", index);
    Ok(())
}

fn apply_changes(mut task: TaskDefinition, changes: TaskChanges) -> TaskDefinition {
    if let Some(name) = changes.name {
        task.name = name;
    }
    if let Some(root) = changes.root {
        task.root_path = root;
    }
    if let Some(pattern) = changes.pattern {
        task.pattern = pattern;
    }
    if let Some(recursive) = changes.recursive {
        task.recursive = recursive;
    }
    if let Some(days) = changes.days {
        task.days = days;
    }
    if let Some(size) = changes.size {
        task.size = size;
    }
    if let Some(number) = changes.number {
        task.number = number;
    }
    if let Some(empty_dir) = changes.empty_dir {
        task.empty_dir = empty_dir;
    }
    if let Some(trigger) = changes.trigger {
        task.trigger_args = Some(trigger);
    }
    task
}

async fn task_edit(ctx: &Context, index: usize, changes: TaskChanges) -> anyhow::Result<()> {
    let current = ctx.store.get(index).await?;
    let edited = apply_changes(current, changes);

    ctx.manager.reconcile_at_startup().await?;
    ctx.manager.edit_task(index, edited).await?;
    println!("Updated task {}", index);
    Ok(())
}

async fn task_remove(ctx: &Context, index: usize) -> anyhow::Result<()> {
    ctx.manager.reconcile_at_startup().await?;
    let removed = ctx.manager.delete_task(index).await?;
    println!("Removed task {} ('{}')", index, removed.name);
    Ok(())
}

async fn task_exec(ctx: &Context, index: usize, dry_run: bool) -> anyhow::Result<()> {
    let task = ctx.store.get(index).await?;
    let sweep = ctx
        .runner
        .run_task(&task, dry_run)
        .await
        .with_context(|| format!("Task {} ('{}') failed", index, task.name))?;

    let verb = if dry_run { "Would delete" } else { "Deleted" };
    for path in &sweep.affected {
        println!("{} {}", verb, path.display());
    }
    for failure in &sweep.failures {
        println!("Failed  {}: {}", failure.path.display(), failure.reason);
    }
    println!(
        "{} entries {}, {} failures",
        sweep.affected.len(),
        if dry_run { "selected" } else { "deleted" },
        sweep.failures.len()
    );
    Ok(())
}

pub(crate) async fn handle_autostart_command(
    ctx: &Context,
    state: Option<Toggle>,
) -> anyhow::Result<()> {
    if let Some(state) = state {
        ctx.store
            .set_auto_start(matches!(state, Toggle::On))
            .await?;
    }
    let enabled = ctx.store.auto_start().await?;
    println!("Autostart: {}", if enabled { "on" } else { "off" });
    Ok(())
}
