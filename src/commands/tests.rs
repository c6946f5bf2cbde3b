use super::*;
use crate::core::message::Role;
use crate::utils::test_utils::create_test_app;

#[test]
fn plain_text_is_processed_as_message() {
    let mut app = create_test_app();
    match process_input(&mut app, "Hello there") {
        CommandResult::ProcessAsMessage(message) => assert_eq!(message, "Hello there"),
        _ => panic!("expected a chat message"),
    }
}

#[test]
fn unknown_command_is_sent_as_message() {
    let mut app = create_test_app();
    match process_input(&mut app, "/shrug it happens") {
        CommandResult::ProcessAsMessage(message) => assert_eq!(message, "/shrug it happens"),
        _ => panic!("unknown commands should pass through"),
    }
    assert!(app.ui.messages.is_empty());
}

#[test]
fn lone_slash_is_sent_as_message() {
    let mut app = create_test_app();
    assert!(matches!(
        process_input(&mut app, "/"),
        CommandResult::ProcessAsMessage(_)
    ));
}

#[test]
fn help_lists_every_command() {
    let mut app = create_test_app();
    let result = process_input(&mut app, "/help");
    assert!(matches!(result, CommandResult::Continue));

    let notice = app.ui.messages.back().expect("help notice");
    assert_eq!(notice.role, Role::AppInfo);
    for command in all_commands() {
        assert!(notice.content.contains(command.usage));
    }
}

#[test]
fn command_names_are_case_insensitive() {
    let mut app = create_test_app();
    assert!(matches!(
        process_input(&mut app, "  /QUIT  "),
        CommandResult::Quit
    ));
}

#[test]
fn clear_requests_new_conversation() {
    let mut app = create_test_app();
    assert!(matches!(
        process_input(&mut app, "/clear"),
        CommandResult::ClearConversation
    ));
}

#[test]
fn clear_with_arguments_shows_usage() {
    let mut app = create_test_app();
    assert!(matches!(
        process_input(&mut app, "/clear everything"),
        CommandResult::Continue
    ));
    assert_eq!(app.ui.status.as_deref(), Some("Usage: /clear"));
}

#[test]
fn matching_commands_filters_by_prefix() {
    let names: Vec<_> = matching_commands("Q").iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["quit"]);
    assert_eq!(matching_commands("").len(), all_commands().len());
}
