use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_until, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::opt,
    sequence::{delimited, preceded},
    IResult,
};
use uuid::Uuid;

#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    List,
    Get { id: Uuid },
    Add {
        url: String,
        title: String,
        date: String,
        description: Option<String>,
        location: Option<String>,
    },
    Delete { id: Uuid },
    Help,
    Exit,
}

// --- BASIC PARSERS ---

fn parse_quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let (input, content) = take_until("\"")(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, content.to_string()))
}

fn parse_uuid(input: &str) -> IResult<&str, Uuid> {
    let (rest, uuid_str) = take_while1(|c: char| c.is_ascii_hexdigit() || c == '-')(input)?;
    match Uuid::parse_str(uuid_str) {
        Ok(uuid) => Ok((rest, uuid)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))),
    }
}

// Accepts 'uuid' as well as a bare uuid
fn parse_id_arg(input: &str) -> IResult<&str, Uuid> {
    let (input, _) = opt(char('\''))(input)?;
    let (input, id) = parse_uuid(input)?;
    let (input, _) = opt(char('\''))(input)?;
    Ok((input, id))
}

// --- HELPERS ---
fn ws<'a, F, O, E: nom::error::ParseError<&'a str>>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where F: FnMut(&'a str) -> IResult<&'a str, O, E> {
    delimited(multispace0, inner, multispace0)
}

fn tag_ci(t: &'static str) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input| tag_no_case(t)(input)
}

// --- COMMAND PARSERS ---

fn parse_list(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("LIST"), tag_ci("LS")))(input)?;
    let (input, _) = opt(preceded(multispace1, tag_ci("PHOTOS")))(input)?;
    Ok((input, Command::List))
}

fn parse_get(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("GET")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, id) = parse_id_arg(input)?;
    Ok((input, Command::Get { id }))
}

fn parse_add(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("ADD")(input)?;
    let (input, url) = ws(parse_quoted_string)(input)?;
    let (input, title) = ws(parse_quoted_string)(input)?;
    let (input, date) = ws(parse_quoted_string)(input)?;

    let (input, description) = opt(preceded(ws(tag_ci("DESCRIPTION")), ws(parse_quoted_string)))(input)?;
    let (input, location) = opt(preceded(ws(tag_ci("LOCATION")), ws(parse_quoted_string)))(input)?;

    Ok((input, Command::Add { url, title, date, description, location }))
}

fn parse_delete(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("DELETE"), tag_ci("RM")))(input)?;
    let (input, _) = multispace1(input)?;
    let (input, id) = parse_id_arg(input)?;
    Ok((input, Command::Delete { id }))
}

fn parse_help(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("HELP")(input)?;
    Ok((input, Command::Help))
}

fn parse_exit(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("EXIT"), tag_ci("QUIT")))(input)?;
    Ok((input, Command::Exit))
}

pub fn parse_command(input: &str) -> Result<Command, String> {
    let input = input.trim();
    let result = alt((
        parse_list,
        parse_get,
        parse_add,
        parse_delete,
        parse_help,
        parse_exit,
    ))(input);

    match result {
        Ok((remainder, cmd)) => {
            if !remainder.trim().is_empty() {
                return Err(format!("Unexpected tokens at end: '{}'", remainder));
            }
            Ok(cmd)
        },
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let context: String = e.input.chars().take(20).collect();
            let context = if context.len() < e.input.len() {
                format!("{}...", context)
            } else {
                context
            };
            Err(format!("Invalid syntax near: '{}'", context))
        },
        Err(nom::Err::Incomplete(_)) => Err("Incomplete command.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    #[test]
    fn parses_list_case_insensitively() {
        assert_eq!(parse_command("list"), Ok(Command::List));
        assert_eq!(parse_command("  LIST PHOTOS "), Ok(Command::List));
    }

    #[test]
    fn parses_ids_quoted_or_bare() {
        let id = Uuid::parse_str(ID).unwrap();
        assert_eq!(parse_command(&format!("GET '{}'", ID)), Ok(Command::Get { id }));
        assert_eq!(parse_command(&format!("delete {}", ID)), Ok(Command::Delete { id }));
    }

    #[test]
    fn parses_add_with_optionals() {
        let cmd = parse_command(
            r#"ADD "https://example.com/a.jpg" "Beach Day" "2024-07-01" DESCRIPTION "sunset" LOCATION "Nazaré""#,
        );

        assert_eq!(
            cmd,
            Ok(Command::Add {
                url: "https://example.com/a.jpg".into(),
                title: "Beach Day".into(),
                date: "2024-07-01".into(),
                description: Some("sunset".into()),
                location: Some("Nazaré".into()),
            })
        );
    }

    #[test]
    fn parses_add_without_optionals() {
        let cmd = parse_command(r#"add "https://x.io/p.png" "Hike" "2023-05-02""#).unwrap();
        assert!(matches!(cmd, Command::Add { description: None, location: None, .. }));
    }

    #[test]
    fn rejects_trailing_tokens() {
        let err = parse_command("HELP me").unwrap_err();
        assert!(err.contains("Unexpected tokens"));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(parse_command("GET 'not-an-id'").is_err());
        assert!(parse_command("DELETE").is_err());
    }

    #[test]
    fn exit_aliases() {
        assert_eq!(parse_command("quit"), Ok(Command::Exit));
        assert_eq!(parse_command("EXIT"), Ok(Command::Exit));
    }
}
