//! Signed-in dashboard loop: renders the grouped task list and drives the
//! task operations against the dashboard controller.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

use taskmaster::dashboard::{Dashboard, View, due_label};
use taskmaster::model::{Priority, Task, TaskDraft, TaskPatch, TaskStatus};
use taskmaster::session::Session;

use super::spinner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    LoggedOut,
    Quit,
}

/// Run the dashboard until the user logs out or quits.
pub async fn dashboard_loop(session: &Session, dashboard: &mut Dashboard) -> Result<Exit> {
    let spinner = spinner("Loading tasks...");
    dashboard.load_tasks(true).await;
    spinner.finish_and_clear();

    loop {
        let today = Local::now().date_naive();
        render(session, dashboard, today);

        let mut items = vec![
            "Toggle completion",
            "Add task",
            "Edit task",
            "Delete task",
            "Switch view",
            "Search",
            "Refresh",
        ];
        if dashboard.error().is_some() {
            items.push("Dismiss message");
        }
        items.push("Log out");
        items.push("Quit");

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Action")
            .items(&items)
            .default(0)
            .interact()?;

        match items[selection] {
            "Toggle completion" => {
                if let Some(id) = pick_task(dashboard, today, "Toggle which task?")? {
                    dashboard.toggle_completion(id).await;
                }
            }
            "Add task" => add_flow(dashboard, today).await?,
            "Edit task" => edit_flow(dashboard, today).await?,
            "Delete task" => delete_flow(dashboard, today).await?,
            "Switch view" => switch_view(dashboard)?,
            "Search" => {
                let query: String = Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("Search (empty clears the filter)")
                    .allow_empty(true)
                    .interact_text()?;
                dashboard.set_query(query);
            }
            "Refresh" => {
                let spinner = super::spinner("Refreshing...");
                dashboard.load_tasks(true).await;
                spinner.finish_and_clear();
            }
            "Dismiss message" => dashboard.dismiss_error(),
            "Log out" => {
                let spinner = super::spinner("Signing out...");
                session.logout().await;
                spinner.finish_and_clear();
                if let Some(message) = session.snapshot().error {
                    println!("{}", style(message).yellow());
                }
                return Ok(Exit::LoggedOut);
            }
            "Quit" => return Ok(Exit::Quit),
            _ => unreachable!(),
        }
    }
}

// ── Rendering ─────────────────────────────────────────────────────────

fn render(session: &Session, dashboard: &Dashboard, today: NaiveDate) {
    println!();
    if let Some(user) = session.snapshot().user() {
        println!(
            "{} {}",
            style("Signed in as").dim(),
            style(&user.name).bold()
        );
    }
    if let Some(message) = dashboard.error() {
        println!("{}", style(message).red());
    }

    let counts = dashboard.view_counts(today);
    println!(
        "{}   {}",
        style(dashboard.view().label()).bold().cyan(),
        style(format!(
            "Inbox {} · Today {} · Completed {}",
            counts.inbox, counts.today, counts.completed
        ))
        .dim()
    );
    if !dashboard.query().is_empty() {
        println!("{} {}", style("Filter:").dim(), dashboard.query());
    }

    let visible = dashboard.visible_tasks(today);
    if visible.is_empty() {
        println!("  {}", style("No tasks here.").dim());
    } else if dashboard.view() == View::Completed {
        for task in &visible {
            println!("  {}", task_line(task, today));
        }
    } else {
        for (priority, tasks) in dashboard.grouped(today) {
            println!("  {}", style(priority.as_str().to_uppercase()).bold());
            for task in tasks {
                println!("    {}", task_line(task, today));
            }
        }
    }

    if let Some(stamp) = dashboard.last_refresh() {
        println!(
            "  {}",
            style(format!("refreshed {}", stamp.format("%H:%M:%S"))).dim()
        );
    }
}

fn task_line(task: &Task, today: NaiveDate) -> String {
    let mark = match task.status {
        TaskStatus::Completed => style("[x]").green(),
        TaskStatus::InProgress => style("[~]").yellow(),
        TaskStatus::Todo => style("[ ]").dim(),
    };
    let label = due_label(task.due_date, today);
    let due = match label.as_str() {
        "Overdue" => style(label).red(),
        "Today" => style(label).yellow(),
        _ => style(label).dim(),
    };
    format!(
        "{} {}  {} · {}",
        mark,
        task.name,
        due,
        style(task.category.to_string()).dim()
    )
}

// ── Task pickers and flows ────────────────────────────────────────────

/// Let the user pick one of the currently visible tasks; `None` on cancel or
/// when nothing is visible.
fn pick_task(dashboard: &Dashboard, today: NaiveDate, prompt: &str) -> Result<Option<i64>> {
    let visible = dashboard.visible_tasks(today);
    if visible.is_empty() {
        println!("  {}", style("No tasks to pick from.").dim());
        return Ok(None);
    }

    let mut labels: Vec<String> = visible.iter().map(|t| task_line(t, today)).collect();
    labels.push("Cancel".to_string());

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(visible.get(selection).map(|t| t.id))
}

async fn add_flow(dashboard: &mut Dashboard, today: NaiveDate) -> Result<()> {
    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Task")
        .validate_with(|s: &String| {
            if s.trim().is_empty() {
                Err("task name must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let priority = prompt_priority(Priority::Medium)?;
    let due_date = prompt_due_date(today)?;

    // The name was validated above, so the draft cannot be blank
    let Ok(draft) = TaskDraft::new(&name, priority, due_date) else {
        return Ok(());
    };

    let spinner = spinner("Creating...");
    dashboard.create_task(&draft).await;
    spinner.finish_and_clear();
    Ok(())
}

async fn edit_flow(dashboard: &mut Dashboard, today: NaiveDate) -> Result<()> {
    let Some(id) = pick_task(dashboard, today, "Edit which task?")? else {
        return Ok(());
    };
    let Some(task) = dashboard.tasks().iter().find(|t| t.id == id) else {
        return Ok(());
    };

    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Task")
        .with_initial_text(task.name.clone())
        .validate_with(|s: &String| {
            if s.trim().is_empty() {
                Err("task name must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let priority = prompt_priority(task.priority)?;
    let status = prompt_status(task.status)?;
    let due_date = prompt_due_date(task.due_date)?;

    let patch = TaskPatch {
        name: name.trim().to_string(),
        priority,
        status,
        due_date,
    };
    let spinner = spinner("Saving...");
    dashboard.update_task(id, &patch).await;
    spinner.finish_and_clear();
    Ok(())
}

async fn delete_flow(dashboard: &mut Dashboard, today: NaiveDate) -> Result<()> {
    let Some(id) = pick_task(dashboard, today, "Delete which task?")? else {
        return Ok(());
    };
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Delete this task?")
        .default(false)
        .interact()?;
    if confirmed {
        let spinner = spinner("Deleting...");
        dashboard.delete_task(id).await;
        spinner.finish_and_clear();
    }
    Ok(())
}

fn switch_view(dashboard: &mut Dashboard) -> Result<()> {
    let labels: Vec<&str> = View::ALL.iter().map(|v| v.label()).collect();
    let current = View::ALL
        .iter()
        .position(|v| *v == dashboard.view())
        .unwrap_or(0);
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("View")
        .items(&labels)
        .default(current)
        .interact()?;
    dashboard.set_view(View::ALL[selection]);
    Ok(())
}

fn prompt_priority(current: Priority) -> Result<Priority> {
    let labels: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();
    let default = Priority::ALL.iter().position(|p| *p == current).unwrap_or(1);
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Priority")
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(Priority::ALL[selection])
}

fn prompt_status(current: TaskStatus) -> Result<TaskStatus> {
    const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed];
    let labels: Vec<String> = ALL.iter().map(|s| s.to_string()).collect();
    let default = ALL.iter().position(|s| *s == current).unwrap_or(0);
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Status")
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(ALL[selection])
}

fn prompt_due_date(default: NaiveDate) -> Result<NaiveDate> {
    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Due date (YYYY-MM-DD)")
        .default(default.format("%Y-%m-%d").to_string())
        .validate_with(|s: &String| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|_| ())
                .map_err(|_| "use YYYY-MM-DD")
        })
        .interact_text()?;
    Ok(NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?)
}
