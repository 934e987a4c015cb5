//! Response formatters for command replies.
//!
//! Plain text is used throughout since replies end up in a chat box.

use crate::commands::CommandInfo;

/// Usage lines shown per help page.
pub const HELP_PAGE_SIZE: usize = 10;

/// Reply for a command name that is not registered.
///
/// # Examples
///
/// ```
/// # use chatcmd::commands::response::format_unknown_command;
/// let msg = format_unknown_command("!");
/// assert!(msg.contains("!help"));
/// ```
pub fn format_unknown_command(prefix: &str) -> String {
    format!("Unknown command. Type `{prefix}help` for more information.")
}

pub fn format_command_not_found(name: &str) -> String {
    format!("Command not found: {name}")
}

/// Detailed help of a single command.
///
/// Lists the aliases, the description and every usage line, sorted and
/// prefixed with the command prefix.
pub fn format_command_help(info: &CommandInfo, prefix: &str) -> String {
    let mut msg = format!("Command {}\n", info.name);

    if !info.aliases.is_empty() {
        msg.push_str(&format!("Aliases: {}\n", info.aliases.join(", ")));
    }

    msg.push_str(info.help.as_deref().unwrap_or("No description."));
    msg.push('\n');

    let mut usage = info.usage.clone();
    usage.sort();
    for line in usage {
        msg.push_str(&format!("{prefix}{line}\n"));
    }

    msg
}

/// One page of the sorted usage lines of all commands.
///
/// `page` starts at 1 and is clamped to the last page. A page of 0 or less
/// lists everything.
///
/// # Examples
///
/// ```
/// # use chatcmd::commands::response::format_help_page;
/// let lines = vec!["warp <name: string>".to_string(), "home".to_string()];
/// let msg = format_help_page(&lines, 1, "!");
/// assert_eq!(msg, "Showing help page 1 of 1\n!home\n!warp <name: string>\n");
/// ```
pub fn format_help_page(lines: &[String], page: i64, prefix: &str) -> String {
    let mut lines = lines.to_vec();
    lines.sort();

    let max_page = lines.len().div_ceil(HELP_PAGE_SIZE);
    let page = page.min(max_page as i64);

    let (mut msg, shown) = if page <= 0 {
        ("Showing help to all commands\n".to_owned(), &lines[..])
    } else {
        let start = (page as usize - 1) * HELP_PAGE_SIZE;
        let end = (start + HELP_PAGE_SIZE).min(lines.len());
        (
            format!("Showing help page {page} of {max_page}\n"),
            &lines[start..end],
        )
    };

    for line in shown {
        msg.push_str(&format!("{prefix}{line}\n"));
    }

    msg
}
