use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::cli::Command;
use crate::datetime::{format_local, parse_reminder_expr};
use crate::manager::TaskManager;
use crate::render::Renderer;

#[instrument(skip(manager, renderer, command))]
pub fn dispatch(
    manager: &mut TaskManager,
    renderer: &mut Renderer,
    command: Option<Command>,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let command = command.unwrap_or(Command::List);
    debug!(?command, "dispatching command");

    match command {
        Command::Add { title } => cmd_add(manager, &title.join(" "), now),
        Command::List => cmd_list(manager, renderer, now),
        Command::Toggle { id } => cmd_toggle(manager, &id),
        Command::Edit {
            id,
            title,
            remind,
            no_reminder,
        } => cmd_edit(manager, &id, title, remind, no_reminder, now),
        Command::Delete { id } => cmd_delete(manager, &id),
        Command::Reminders => cmd_reminders(manager, renderer),
    }
}

#[instrument(skip(manager, title, now))]
fn cmd_add(manager: &mut TaskManager, title: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command add");

    if let Some(task) = manager.add(title, now) {
        println!("Created task {}.", task.id);
    }
    Ok(())
}

#[instrument(skip(manager, renderer, now))]
fn cmd_list(
    manager: &mut TaskManager,
    renderer: &mut Renderer,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command list");

    renderer.print_task_table(manager.tasks(), now)?;
    Ok(())
}

#[instrument(skip(manager))]
fn cmd_toggle(manager: &mut TaskManager, id: &str) -> anyhow::Result<()> {
    info!("command toggle");

    let changed = manager.toggle(id);
    println!("Toggled {} task(s).", u32::from(changed));
    Ok(())
}

#[instrument(skip(manager, title, remind, now))]
fn cmd_edit(
    manager: &mut TaskManager,
    id: &str,
    title: Option<String>,
    remind: Option<String>,
    no_reminder: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command edit");

    let Some(existing) = manager.tasks().iter().find(|task| task.id == id) else {
        println!("Modified 0 task(s).");
        return Ok(());
    };

    // The edit contract takes the full (title, reminder) pair; flags that
    // were omitted fall back to the task's current values.
    let new_title = title.unwrap_or_else(|| existing.title.clone());
    let new_reminder = if no_reminder {
        None
    } else if let Some(expr) = remind {
        Some(parse_reminder_expr(&expr, now)?)
    } else {
        existing.reminder
    };

    let changed = manager.edit(id, &new_title, new_reminder, now)?;
    println!("Modified {} task(s).", u32::from(changed));

    if changed
        && let Some(fire_at) = new_reminder
        && fire_at > now
    {
        println!("Reminder set for {}.", format_local(fire_at));
    }
    Ok(())
}

#[instrument(skip(manager))]
fn cmd_delete(manager: &mut TaskManager, id: &str) -> anyhow::Result<()> {
    info!("command delete");

    let removed = manager.delete(id)?;
    println!("Deleted {} task(s).", u32::from(removed));
    Ok(())
}

#[instrument(skip(manager, renderer))]
fn cmd_reminders(manager: &mut TaskManager, renderer: &mut Renderer) -> anyhow::Result<()> {
    info!("command reminders");

    let scheduled = manager.notifier().scheduled()?;
    renderer.print_reminder_table(&scheduled)?;
    Ok(())
}
