//! Share-ready text for handing a task to the person responsible for it.

use crate::task::Task;

pub const SIGNATURE: &str = "Sent from Task Manager";

pub fn compose_message(task: &Task) -> String {
    let mut lines = Vec::new();
    if task.responsible_name.is_empty() {
        lines.push("Hello!".to_string());
    } else {
        lines.push(format!("Hello {}!", task.responsible_name));
    }
    lines.push(String::new());
    lines.push("You have a new task:".to_string());
    lines.push(format!("Title: {}", task.title));
    if !task.project.is_empty() {
        lines.push(format!("Project: {}", task.project));
    }
    if let Some(start) = task.start_date {
        lines.push(format!("Start: {start}"));
    }
    if let Some(due) = task.due_date {
        lines.push(format!("Due: {due}"));
    }
    lines.push(format!("Priority: {}", task.priority));
    if !task.description.is_empty() {
        lines.push(String::new());
        lines.push("Description:".to_string());
        lines.push(task.description.clone());
    }
    lines.push(String::new());
    lines.push(SIGNATURE.to_string());
    lines.join("\n")
}

/// A `wa.me` link carrying the message, if the task has a phone number with digits in it.
pub fn share_link(task: &Task) -> Option<String> {
    let digits: String = task
        .responsible_phone
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }
    let text = compose_message(task);
    Some(format!(
        "https://wa.me/{}?text={}",
        digits,
        urlencoding::encode(&text)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskDraft, TaskId};

    fn task() -> Task {
        let mut draft = TaskDraft::titled("Replace flashing");
        draft.responsible_name = "Nino".into();
        draft.project = "A block".into();
        draft.due_date = "2024-04-02".parse().ok();
        Task::new(TaskId(1), 1, draft, vec![])
    }

    #[test]
    fn message_lists_only_present_fields() {
        let message = compose_message(&task());
        assert!(message.starts_with("Hello Nino!\n\nYou have a new task:"));
        assert!(message.contains("Project: A block"));
        assert!(message.contains("Due: 2024-04-02"));
        assert!(!message.contains("Start:"));
        assert!(!message.contains("Description:"));
        assert!(message.ends_with(SIGNATURE));
    }

    #[test]
    fn link_needs_phone_digits() {
        let mut task = task();
        assert_eq!(share_link(&task), None);

        task.responsible_phone = "n/a".into();
        assert_eq!(share_link(&task), None);

        task.responsible_phone = "+995 (555) 12-34".into();
        let link = share_link(&task).unwrap();
        assert!(link.starts_with("https://wa.me/9955551234?text=Hello%20Nino%21"));
    }
}
