//! Help command handler.
//!
//! `help [page]` lists the usage lines of every command, ten per page.
//! `help <command>` details a single command.

use anyhow::bail;
use log::debug;

use crate::{
    commands::{
        CommandContext, CommandHandler, CommandResult,
        response::{format_command_help, format_command_not_found, format_help_page},
    },
    parser::{ArgDef, ParseResult, SubDef},
};

pub struct HelpCommand;

impl HelpCommand {
    /// Grammar of `help`.
    ///
    /// A page number is tried first, so `help 2` shows a page and `help home`
    /// falls back to the command lookup.
    pub fn grammar() -> SubDef {
        SubDef::new("help", "")
            .help("Show the usage of commands")
            .sub(
                SubDef::unnamed("pg")
                    .arg(ArgDef::new("page", "int").default_value(1).help("Page number")),
            )
            .sub(
                SubDef::unnamed("cmd").arg(
                    ArgDef::new("name", "string")
                        .name("command")
                        .required()
                        .help("Command to describe"),
                ),
            )
    }
}

impl CommandHandler for HelpCommand {
    fn handle(&self, args: &ParseResult, ctx: &CommandContext) -> anyhow::Result<CommandResult> {
        if args.is_set("cmd") {
            let name = args.get_str("name").unwrap_or_default();
            debug!("handling help command for {name}");

            let Some(info) = ctx
                .commands
                .iter()
                .find(|info| info.name == name || info.aliases.iter().any(|alias| alias == name))
            else {
                bail!(format_command_not_found(name));
            };

            return Ok(CommandResult::new(format_command_help(info, &ctx.prefix)));
        }

        let page = args.get_i64("page").unwrap_or(1);
        debug!("handling help command, page {page}");

        let lines: Vec<String> = ctx
            .commands
            .iter()
            .flat_map(|info| info.usage.iter().cloned())
            .collect();

        Ok(CommandResult::new(format_help_page(&lines, page, &ctx.prefix)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::CommandInfo,
        parser::{TypeRegistry, parse_command, tokenize},
    };

    fn create_test_context(command_count: usize) -> CommandContext {
        let mut commands = vec![CommandInfo {
            name: "home".to_string(),
            aliases: vec!["h".to_string()],
            help: Some("Manage homes".to_string()),
            usage: vec!["home set <name: string>".to_string(), "h set <name: string>".to_string()],
        }];
        commands.extend((0..command_count).map(|i| CommandInfo {
            name: format!("cmd{i:02}"),
            aliases: vec![],
            help: None,
            usage: vec![format!("cmd{i:02}")],
        }));

        CommandContext {
            sender: "alice".to_string(),
            prefix: "!".to_string(),
            commands,
            tokens: vec![],
        }
    }

    fn run(line: &str, ctx: &CommandContext) -> anyhow::Result<CommandResult> {
        let args = parse_command(
            &HelpCommand::grammar(),
            line,
            &tokenize(line, 0),
            &TypeRegistry::new(),
        )?;
        HelpCommand.handle(&args, ctx)
    }

    #[test]
    fn test_grammar_is_valid() {
        assert!(HelpCommand::grammar().validate().is_ok());
    }

    #[test]
    fn test_help_first_page_by_default() {
        let result = run("help", &create_test_context(20)).unwrap();
        let lines: Vec<&str> = result.response.lines().collect();

        assert_eq!(lines[0], "Showing help page 1 of 3");
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[1], "!cmd00");
    }

    #[test]
    fn test_help_page() {
        let result = run("help 3", &create_test_context(20)).unwrap();
        let lines: Vec<&str> = result.response.lines().collect();

        assert_eq!(lines[0], "Showing help page 3 of 3");
        assert_eq!(lines[1..], ["!h set <name: string>", "!home set <name: string>"]);
    }

    #[test]
    fn test_help_page_zero_shows_all() {
        let result = run("help 0", &create_test_context(20)).unwrap();
        assert!(result.response.starts_with("Showing help to all commands\n"));
        assert_eq!(result.response.lines().count(), 23);
    }

    #[test]
    fn test_help_command_by_alias() {
        let result = run("help h", &create_test_context(0)).unwrap();
        assert_eq!(
            result.response,
            "Command home\nAliases: h\nManage homes\n!h set <name: string>\n!home set <name: string>\n"
        );
    }

    #[test]
    fn test_help_unknown_command() {
        let err = run("help fly", &create_test_context(0)).unwrap_err();
        assert_eq!(err.to_string(), "Command not found: fly");
    }
}
