//! A terminal front-end for the StoryBuddy conversation loop.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use storybuddy_core::{ChatBuilder, ChatSnapshot, Persona};
use storybuddy_model::Role;
use storybuddy_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::time::sleep;

const GREETING: &str = "Hey there! Let's start our amazing story \
    together. Type something below to kick things off!";

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(api_key) = env::var("OPENAI_API_KEY") else {
        eprintln!("OPENAI_API_KEY environment variable is not set");
        return;
    };
    let mut config = OpenAIConfigBuilder::with_api_key(api_key);
    if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    if let Ok(model) = env::var("OPENAI_MODEL") {
        config = config.with_model(model);
    }
    let provider = OpenAIProvider::new(config.build());

    let chat = ChatBuilder::with_completion_provider(provider)
        .with_persona(Persona::default())
        .with_greeting(GREETING)
        .build();
    let mut snapshots = chat.subscribe();

    // The seed message is persona plumbing; never render it.
    let mut printed = 1;
    print_new_entries(&snapshots.borrow().clone(), &mut printed);

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/reset" {
            chat.reset();
            if snapshots
                .wait_for(|s| s.transcript.len() == 1)
                .await
                .is_err()
            {
                break;
            }
            printed = 1;
            println!("{}", "(story reset)".dimmed());
            continue;
        }
        chat.send_message(line);

        let mut progress_bar = None;

        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🪄 Spinning the story...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break 'outer;
                    }
                    let done = {
                        let snapshot = snapshots.borrow_and_update();
                        snapshot.error.is_some()
                            || snapshot.transcript.len() >= printed + 2
                    };
                    if done {
                        break;
                    }
                }
                _ = sleep => {
                    continue;
                }
            }
        }

        if let Some(progress_bar) = &progress_bar {
            progress_bar.finish_and_clear();
        }

        let snapshot = snapshots.borrow().clone();
        if let Some(error) = &snapshot.error {
            println!(
                "{}{} {}",
                BAR_CHAR.bright_red(),
                "Bummer!".bright_red().bold(),
                error
            );
        }
        print_new_entries(&snapshot, &mut printed);
    }
}

fn print_new_entries(snapshot: &ChatSnapshot, printed: &mut usize) {
    for entry in &snapshot.transcript[*printed..] {
        match entry.role {
            Role::Assistant | Role::System => {
                println!(
                    "{}🐱 {}",
                    BAR_CHAR.bright_cyan(),
                    entry.content.bright_white()
                );
            }
            // The user just typed it; don't echo it back.
            Role::User => {}
        }
    }
    *printed = snapshot.transcript.len();
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
