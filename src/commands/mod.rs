mod registry;

pub use registry::{all_commands, matching_commands, CommandInvocation};

use crate::core::app::App;

#[cfg(test)]
mod tests;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    ClearConversation,
    Quit,
}

const KEY_HELP: &str = "Keys: Enter send, Alt+Enter newline, Esc interrupt reply, \
Ctrl+L new conversation, Ctrl+C quit, Up/Down/PgUp/PgDn/Home/End scroll.";

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(app, CommandInvocation { args })
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help = String::from("Commands:\n");
    for command in all_commands() {
        help.push_str(&format!("  {:<8} {}\n", command.usage, command.help));
    }
    help.push('\n');
    help.push_str(KEY_HELP);
    app.conversation().add_app_info(help);
    CommandResult::Continue
}

pub(super) fn handle_clear(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if !invocation.args.is_empty() {
        app.conversation().set_status("Usage: /clear");
        return CommandResult::Continue;
    }
    CommandResult::ClearConversation
}

pub(super) fn handle_quit(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
