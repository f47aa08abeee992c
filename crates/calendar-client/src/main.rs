use anyhow::{bail, Context, Result};
use calendar_client::{
    api::{ApiClient, CurrentUser, CurrentUserStore},
    holidays::{holiday_on, is_past_date},
    search::search_events,
    templates::{default_start, find_template, TEMPLATES},
    views::{self, ViewKind},
};
use calendar_shared::{
    api::{CreateEventRequest, EventListParams, UpdateEventRequest},
    time::parse_date_or_datetime,
    Event,
};
use chrono::{Datelike, Local, NaiveDate, NaiveTime, SecondsFormat};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const USAGE: &str = "\
Usage: calendar <COMMAND>

Commands:
  users                        List known users
  login <NAME> <EMAIL>         Sign up or sign in, and remember the user
  logout                       Forget the current user
  whoami                       Show the current user
  month|week|day [YYYY-MM-DD]  Show events around a date (default today)
  add <TITLE> <START> <END>    Create an event (RFC 3339 or YYYY-MM-DD)
  quick <TEMPLATE> [DATE] [HH:MM]
                               Create an event from a template (default 09:00)
  edit <ID> [OPTIONS]          Change an event
  done <ID>                    Mark an event completed
  undo <ID>                    Mark an event not completed
  rm <ID>                      Delete an event
  search <QUERY>               Find events by title, description or location

Edit options:
  --title <TEXT>  --description <TEXT>  --location <TEXT>  --color <#RRGGBB>
  --start <WHEN>  --end <WHEN>  --all-day <true|false>
  An empty description or location clears it.

Templates: Meeting, Team Lunch, Personal Break, Conference Call

Environment:
  CALENDAR_SERVER_URL          Backend address (default http://localhost:3001)";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calendar=warn,calendar_client=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let server_url = std::env::var("CALENDAR_SERVER_URL")
        .unwrap_or_else(|_| "http://localhost:3001".to_string());
    let api = ApiClient::new(&server_url);
    let store = CurrentUserStore::new()?;

    match (command.as_str(), &args[1..]) {
        ("--help" | "-h" | "help", _) => println!("{}", USAGE),
        ("users", []) => {
            for user in api.list_users().await? {
                println!("{}  {} <{}>", user.id, user.name, user.email);
            }
        }
        ("login", [name, email]) => {
            let (user, created) = api.create_user(name, email).await?;
            let user = CurrentUser::from(user);
            store.save(&user)?;
            if created {
                println!("Signed up as {} <{}>", user.name, user.email);
            } else {
                println!("Welcome back, {}", user.name);
            }
        }
        ("logout", []) => {
            store.clear()?;
            println!("Signed out");
        }
        ("whoami", []) => match store.load()? {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.id),
            None => println!("Not signed in"),
        },
        (view @ ("month" | "week" | "day"), rest) if rest.len() <= 1 => {
            let user = signed_in(&store)?;
            let kind = ViewKind::parse(view).context("unknown view")?;
            let date = match rest.first() {
                Some(raw) => date_arg(raw)?,
                None => Local::now().date_naive(),
            };
            show_view(&api, &user, kind, date).await?;
        }
        ("add", [title, start, end]) => {
            let user = signed_in(&store)?;
            let event = api
                .create_event(
                    user.id,
                    CreateEventRequest {
                        title: Some(title.clone()),
                        start_date: Some(timestamp_arg(start)?),
                        end_date: Some(timestamp_arg(end)?),
                        ..Default::default()
                    },
                )
                .await?;
            println!("Created {}", event.id);
        }
        ("quick", [name, rest @ ..]) if rest.len() <= 2 => {
            let user = signed_in(&store)?;
            let template = find_template(name).with_context(|| {
                let names: Vec<_> = TEMPLATES.iter().map(|t| t.name).collect();
                format!("Unknown template: {} (one of {})", name, names.join(", "))
            })?;
            let today = Local::now().date_naive();
            let date = match rest.first() {
                Some(raw) => date_arg(raw)?,
                None => today,
            };
            if is_past_date(date, today) {
                bail!("Cannot create events in the past");
            }
            let time = match rest.get(1) {
                Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M")
                    .with_context(|| format!("Invalid time: {}", raw))?,
                None => default_start(),
            };

            let event = api
                .create_event(user.id, template.request(date, time))
                .await?;
            println!("{} event created ({})", template.name, event.id);
        }
        ("edit", [id, flags @ ..]) if !flags.is_empty() => {
            let user = signed_in(&store)?;
            let changes = edit_request(flags)?;
            let event = api.update_event(user.id, event_id(id)?, changes).await?;
            println!("Updated \"{}\"", event.title);
        }
        ("undo", [id]) => {
            let user = signed_in(&store)?;
            let event = api
                .update_event(
                    user.id,
                    event_id(id)?,
                    UpdateEventRequest {
                        completed: Some(false),
                        ..Default::default()
                    },
                )
                .await?;
            println!("Reopened \"{}\"", event.title);
        }
        ("search", words) if !words.is_empty() => {
            let user = signed_in(&store)?;
            let page = api
                .list_events(user.id, &EventListParams::default())
                .await?;
            let found = search_events(&page.events, &words.join(" "));
            if found.is_empty() {
                println!("No events found");
            }
            for event in found {
                println!(
                    "{}  {}  {}",
                    event.start_date.format("%Y-%m-%d %H:%M"),
                    event.title,
                    event.id
                );
            }
        }
        ("done", [id]) => {
            let user = signed_in(&store)?;
            let event = api
                .update_event(
                    user.id,
                    event_id(id)?,
                    UpdateEventRequest {
                        completed: Some(true),
                        ..Default::default()
                    },
                )
                .await?;
            println!("Completed \"{}\"", event.title);
        }
        ("rm", [id]) => {
            let user = signed_in(&store)?;
            api.delete_event(user.id, event_id(id)?).await?;
            println!("Deleted {}", id);
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn signed_in(store: &CurrentUserStore) -> Result<CurrentUser> {
    match store.load()? {
        Some(user) => Ok(user),
        None => bail!("Not signed in. Run `calendar login <name> <email>` first."),
    }
}

fn event_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("Invalid event id: {}", raw))
}

fn date_arg(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("Invalid date: {}", raw))
}

/// Build an update from `--flag value` pairs.
fn edit_request(flags: &[String]) -> Result<UpdateEventRequest> {
    let mut req = UpdateEventRequest::default();

    for pair in flags.chunks(2) {
        let [flag, value] = pair else {
            bail!("Missing value for {}", pair[0]);
        };
        let cleared = || Some(value.clone()).filter(|v| !v.is_empty());

        match flag.as_str() {
            "--title" => req.title = Some(value.clone()),
            "--description" => req.description = Some(cleared()),
            "--location" => req.location = Some(cleared()),
            "--color" => req.color = Some(value.clone()),
            "--start" => req.start_date = Some(timestamp_arg(value)?),
            "--end" => req.end_date = Some(timestamp_arg(value)?),
            "--all-day" => {
                req.all_day = Some(
                    value
                        .parse::<bool>()
                        .with_context(|| format!("Expected true or false, got {}", value))?,
                )
            }
            other => bail!("Unknown option: {}", other),
        }
    }

    Ok(req)
}

fn timestamp_arg(raw: &str) -> Result<String> {
    let parsed =
        parse_date_or_datetime(raw).with_context(|| format!("Invalid date or time: {}", raw))?;
    Ok(parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
}

async fn show_view(
    api: &ApiClient,
    user: &CurrentUser,
    kind: ViewKind,
    date: NaiveDate,
) -> Result<()> {
    let (from, to) = views::view_range(kind, date);
    let page = api
        .list_events(
            user.id,
            &EventListParams {
                start_date: Some(from.to_rfc3339_opts(SecondsFormat::Millis, true)),
                end_date: Some(to.to_rfc3339_opts(SecondsFormat::Millis, true)),
                sort_by: Some("startDate".to_string()),
                ..Default::default()
            },
        )
        .await?;
    tracing::debug!(total = page.meta.total, "Loaded events");

    match kind {
        ViewKind::Month => {
            println!("{} {}", views::month_name(date.month()), date.year());
            print_month(date, &page.events);
            println!();
            let mut day = from.date_naive();
            while day <= to.date_naive() {
                if day.month() == date.month() {
                    print_day(day, &page.events);
                }
                day = views::navigate(ViewKind::Day, day, 1);
            }
        }
        ViewKind::Week => {
            let start = views::week_start(date);
            for offset in 0..7 {
                print_day(views::navigate(ViewKind::Day, start, offset), &page.events);
            }
        }
        ViewKind::Day => print_day(date, &page.events),
    }

    Ok(())
}

/// Grid with a `*` on days that have events and a `!` on holidays.
fn print_month(date: NaiveDate, events: &[Event]) {
    let Some(grid) = views::month_grid(date.year(), date.month()) else {
        return;
    };

    println!("Su  Mo  Tu  We  Th  Fr  Sa");
    for week in grid {
        let row: Vec<String> = week
            .iter()
            .map(|day| {
                if day.month() != date.month() {
                    "   ".to_string()
                } else if !views::events_on(events, *day).is_empty() {
                    format!("{:2}*", day.day())
                } else if holiday_on(*day).is_some() {
                    format!("{:2}!", day.day())
                } else {
                    format!("{:2} ", day.day())
                }
            })
            .collect();
        println!("{}", row.join(" ").trim_end());
    }
}

fn print_day(day: NaiveDate, events: &[Event]) {
    let todays = views::events_on(events, day);
    let holiday = holiday_on(day);
    if todays.is_empty() && holiday.is_none() {
        return;
    }

    match holiday {
        Some(h) => println!("{}  ({})", day.format("%a %Y-%m-%d"), h.name),
        None => println!("{}", day.format("%a %Y-%m-%d")),
    }
    for event in todays {
        let mark = if event.completed { "x" } else { " " };
        let when = if event.all_day {
            "all day".to_string()
        } else {
            format!(
                "{}-{}",
                event.start_date.format("%H:%M"),
                event.end_date.format("%H:%M")
            )
        };
        println!("  [{}] {}  {}  {}", mark, when, event.title, event.id);
    }
}
