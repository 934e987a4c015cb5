//! Usage lines generated from a grammar.
//!
//! Every leaf of the sub-command tree gives one line per name/alias path, e.g.
//! for a `home` command:
//!
//! ```text
//! home set <name: string>
//! home delete [-f] <name: string>
//! home del [-f] <name: string>
//! ```

use crate::parser::grammar::{ArgDef, FlagDef, SubDef};

/// Lists every usage line reachable from `root`, without duplicates.
///
/// # Examples
///
/// ```
/// # use chatcmd::parser::{format_help, ArgDef, FlagDef, SubDef};
/// let grammar = SubDef::new("give", "give")
///     .flag(FlagDef::new("quiet").short('q'))
///     .arg(ArgDef::new("item", "string").required())
///     .arg(ArgDef::new("count", "int"));
/// assert_eq!(format_help(&grammar), vec!["give [-q] <item: string> [count: int]"]);
/// ```
pub fn format_help(root: &SubDef) -> Vec<String> {
    let mut lines = Vec::new();
    collect_usage(root, "", &mut lines);
    lines
}

fn collect_usage(sub: &SubDef, prefix: &str, lines: &mut Vec<String>) {
    let flags = render_flags(&sub.flags);
    let args = render_args(&sub.args);
    let names = std::iter::once(sub.name.as_str()).chain(sub.aliases.iter().map(String::as_str));

    for name in names {
        let line = join_words(&[prefix, name, &flags, &args]);

        if sub.subs.is_empty() {
            if !lines.contains(&line) {
                lines.push(line);
            }
            continue;
        }

        for child in &sub.subs {
            collect_usage(child, &line, lines);
        }
    }
}

/// Switches with a short name go in one `[-abc]` cluster, every other flag
/// gets its own group.
fn render_flags(flags: &[FlagDef]) -> String {
    let mut cluster: Vec<char> = flags
        .iter()
        .filter(|flag| !flag.takes_args())
        .filter_map(|flag| flag.short)
        .collect();
    cluster.sort_unstable();
    cluster.dedup();

    let mut groups = Vec::new();
    if !cluster.is_empty() {
        groups.push(format!("[-{}]", cluster.iter().collect::<String>()));
    }

    for flag in flags {
        let name = match (&flag.long, flag.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) if flag.takes_args() => format!("-{short}"),
            _ => continue,
        };
        groups.push(format!("[{}]", join_words(&[&name, &render_args(&flag.args)])));
    }

    groups.join(" ")
}

fn render_args(args: &[ArgDef]) -> String {
    args.iter()
        .map(|arg| {
            let (open, close) = if arg.required { ('<', '>') } else { ('[', ']') };
            format!("{open}{}: {}{close}", arg.display_name(), arg.type_ref.name())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_words(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{grammar::TypeRef, token::Token, types::Parsed};

    fn home_grammar() -> SubDef {
        SubDef::new("home", "home")
            .sub(SubDef::new("set", "set").arg(ArgDef::new("name", "string").required()))
            .sub(
                SubDef::new("delete", "delete")
                    .alias("del")
                    .flag(FlagDef::new("force").short('f'))
                    .arg(ArgDef::new("name", "string").required()),
            )
    }

    #[test]
    fn test_format_help_leaf_paths_with_aliases() {
        assert_eq!(
            format_help(&home_grammar()),
            vec![
                "home set <name: string>",
                "home delete [-f] <name: string>",
                "home del [-f] <name: string>",
            ]
        );
    }

    #[test]
    fn test_format_help_flags() {
        let grammar = SubDef::new("ls", "ls")
            .flag(FlagDef::new("long").short('l'))
            .flag(FlagDef::new("all").short('a').long("all"))
            .flag(FlagDef::new("depth").long("depth").arg(ArgDef::new("depth_value", "int").name("n").required()))
            .flag(FlagDef::new("sort").short('s').arg(ArgDef::new("key", "string")))
            .arg(ArgDef::new("path", "string"));

        assert_eq!(
            format_help(&grammar),
            vec!["ls [-al] [--all] [--depth <n: int>] [-s [key: string]] [path: string]"]
        );
    }

    #[test]
    fn test_format_help_unnamed_subs() {
        let grammar = SubDef::new("help", "")
            .sub(SubDef::unnamed("pg").arg(ArgDef::new("page", "int")))
            .sub(SubDef::unnamed("cmd").arg(ArgDef::new("name", "string").name("command").required()));

        assert_eq!(
            format_help(&grammar),
            vec!["help [page: int]", "help <command: string>"]
        );
    }

    #[test]
    fn test_format_help_deduplicates() {
        let grammar = SubDef::new("msg", "msg")
            .sub(SubDef::unnamed("a").arg(ArgDef::new("text", "string")))
            .sub(SubDef::unnamed("b").arg(ArgDef::new("other", "string").name("text")));

        assert_eq!(format_help(&grammar), vec!["msg [text: string]"]);
    }

    #[test]
    fn test_format_help_is_stable() {
        let grammar = home_grammar();
        assert_eq!(format_help(&grammar), format_help(&grammar));
    }

    #[test]
    fn test_format_help_inline_type_name() {
        let grammar = SubDef::new("say", "say").arg(
            ArgDef::new(
                "text",
                TypeRef::inline("message", |tokens: &[Token], _: &ArgDef| {
                    Ok(Parsed::new(tokens[0].text.clone()))
                }),
            )
            .required(),
        );

        assert_eq!(format_help(&grammar), vec!["say <text: message>"]);
    }

    #[test]
    fn test_format_help_nested() {
        let grammar = SubDef::new("perm", "perm").alias("p").sub(
            SubDef::new("group", "group").sub(SubDef::new("list", "list")),
        );

        assert_eq!(
            format_help(&grammar),
            vec!["perm group list", "p group list"]
        );
    }
}
