// Text search over tasks

use crate::models::Task;

/// Case-insensitive substring match against name or details
///
/// An empty query matches every task.
pub fn matches(task: &Task, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let needle = query.to_lowercase();
    task.name.to_lowercase().contains(&needle)
        || task
            .details
            .as_deref()
            .is_some_and(|details| details.to_lowercase().contains(&needle))
}

/// The subsequence of `tasks` matching `query`, order preserved
pub fn filter_tasks<'a>(tasks: &'a [Task], query: Option<&'a str>) -> impl Iterator<Item = &'a Task> + 'a {
    let query = query.unwrap_or("");
    tasks.iter().filter(move |task| matches(task, query))
}
