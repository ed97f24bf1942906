use anyhow::Result;
use bridger::services::{build_connection_service, parse_connection_link, LinkBuilder};
use bridger::utils::{init_logging, Config};
use bridger::Uuid;
use clap::builder::NonEmptyStringValueParser;
use clap::{Arg, ArgMatches, Command};
use serde::Serialize;
use tracing::error;

fn cli() -> Command {
    Command::new("connections")
        .about("Inspect and drive friend connections from the command line")
        .subcommand_required(true)
        .subcommand(
            Command::new("link")
                .about("Print a shareable connection link for a user")
                .arg(user_arg().long("user").help("Sharer's user id"))
                .arg(Arg::new("name").long("name").help("Display name to embed in the link")),
        )
        .subcommand(
            Command::new("parse")
                .about("Decode a connection link")
                .arg(Arg::new("link").required(true)),
        )
        .subcommand(
            Command::new("resolve")
                .about("Open a connection link as the given viewer")
                .arg(Arg::new("link").required(true))
                .arg(Arg::new("viewer").long("viewer").required(true).help("Viewer's user id")),
        )
        .subcommand(
            Command::new("send")
                .about("Send a friend request")
                .arg(Arg::new("from").long("from").required(true))
                .arg(Arg::new("to").long("to").required(true)),
        )
        .subcommand(
            Command::new("accept")
                .about("Accept a pending request")
                .arg(Arg::new("id").required(true).value_parser(clap::value_parser!(Uuid))),
        )
        .subcommand(
            Command::new("decline")
                .about("Decline a pending request")
                .arg(Arg::new("id").required(true).value_parser(clap::value_parser!(Uuid))),
        )
        .subcommand(
            Command::new("pending")
                .about("List pending requests addressed to a user")
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("friends")
                .about("List accepted connections of a user")
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("sent")
                .about("List requests a user sent that are still pending")
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("history")
                .about("List every connection of a user, declined ones included")
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("suggestions")
                .about("List known users with no connection to a user")
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("stats")
                .about("Show connection counts and success rate for a user")
                .arg(user_arg()),
        )
}

fn user_arg() -> Arg {
    Arg::new("user")
        .required(true)
        .value_parser(NonEmptyStringValueParser::new())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn arg<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = cli().get_matches();
    let config = Config::from_env()?;

    // Link commands never touch the store.
    match matches.subcommand() {
        Some(("link", sub)) => {
            let links = LinkBuilder::new(&config.public_origin)?;
            let name = sub.get_one::<String>("name").map(String::as_str);
            println!("{}", links.create_shareable_link(arg(sub, "user"), name));
            return Ok(());
        }
        Some(("parse", sub)) => {
            return print_json(&parse_connection_link(arg(sub, "link")));
        }
        _ => {}
    }

    let service = build_connection_service(&config).await?;

    let outcome = match matches.subcommand() {
        Some(("resolve", sub)) => service
            .resolve_connection_link(arg(sub, "link"), arg(sub, "viewer"))
            .await
            .map(|landing| print_json(&landing)),
        Some(("send", sub)) => service
            .send_friend_request(arg(sub, "from"), arg(sub, "to"))
            .await
            .map(|connection| print_json(&connection)),
        Some(("accept", sub)) => {
            let id = *sub.get_one::<Uuid>("id").unwrap_or(&Uuid::nil());
            service
                .accept_friend_request(id)
                .await
                .map(|connection| print_json(&connection))
        }
        Some(("decline", sub)) => {
            let id = *sub.get_one::<Uuid>("id").unwrap_or(&Uuid::nil());
            service
                .decline_friend_request(id)
                .await
                .map(|connection| print_json(&connection))
        }
        Some(("pending", sub)) => service
            .list_pending_requests(arg(sub, "user"))
            .await
            .map(|views| print_json(&views)),
        Some(("friends", sub)) => service
            .list_accepted_connections(arg(sub, "user"))
            .await
            .map(|views| print_json(&views)),
        Some(("sent", sub)) => service
            .list_sent_requests(arg(sub, "user"))
            .await
            .map(|views| print_json(&views)),
        Some(("history", sub)) => service
            .list_connection_history(arg(sub, "user"))
            .await
            .map(|views| print_json(&views)),
        Some(("suggestions", sub)) => service
            .suggest_friends(arg(sub, "user"))
            .await
            .map(|suggestions| print_json(&suggestions)),
        Some(("stats", sub)) => service
            .connection_stats(arg(sub, "user"))
            .await
            .map(|stats| print_json(&stats)),
        _ => unreachable!("subcommand_required is set"),
    };

    match outcome {
        Ok(printed) => printed,
        Err(e) => {
            error!("❌ {}", e);
            Err(e.into())
        }
    }
}
